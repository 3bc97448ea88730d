use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use step_flow::Outcome;
use thiserror::Error;

use crate::lookup::ApplicationRecord;
use crate::notify::{Notifier, Severity};

const APPROVED_AMOUNT: u64 = 500_000;
const APPROVED_RATE: f64 = 10.5;
const APPROVED_TENURE_MONTHS: u32 = 36;

const REJECTION_REASONS: [&str; 3] = [
    "Insufficient income for requested loan amount",
    "Recent credit history shows multiple late payments",
    "Current debt-to-income ratio exceeds our threshold",
];

const REQUIRED_DOCUMENTS: [&str; 3] = [
    "Last 6 months bank statements",
    "Additional proof of income",
    "Existing loan statements",
];

const PENDING_NOTE: &str = "We'll notify you when your application status changes.";

/// Follow-up the applicant can take from the result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityAction {
    ContinueToDisbursement,
    AppealDecision,
    ProvideAdditionalInformation,
}

impl EligibilityAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ContinueToDisbursement => "Continue to Disbursement",
            Self::AppealDecision => "Appeal Decision",
            Self::ProvideAdditionalInformation => "Provide Additional Information",
        }
    }

    /// Toast shown once the action is taken. The wizard's card words its
    /// follow-ups per outcome; the tracking page uses one generic message.
    pub fn acknowledgement(&self, origin: CardOrigin) -> (Severity, &'static str) {
        match (self, origin) {
            (Self::AppealDecision, _) => (Severity::Info, "Appeal submitted. We'll review your case."),
            (Self::ContinueToDisbursement, CardOrigin::Application) => {
                (Severity::Success, "Proceeding to loan disbursement")
            }
            (Self::ProvideAdditionalInformation, CardOrigin::Application) => {
                (Severity::Info, "Redirecting to document upload...")
            }
            (_, CardOrigin::Tracking) => (Severity::Success, "Proceeding to next steps..."),
        }
    }
}

/// Page the result card is shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOrigin {
    Application,
    Tracking,
}

#[derive(Debug, Error)]
#[error("{0} is not available for this application")]
pub struct ActionUnavailable(pub &'static str);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityDetails {
    Terms {
        loan_amount: u64,
        interest_rate: f64,
        tenure_months: u32,
    },
    Reasons { reasons: Vec<String> },
    RequiredDocuments { documents: Vec<String> },
    Note { note: String },
}

/// Display model for an eligibility outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityReport {
    pub status: Outcome,
    pub title: String,
    pub description: String,
    pub details: EligibilityDetails,
    pub action: Option<EligibilityAction>,
}

fn title(status: Outcome) -> &'static str {
    match status {
        Outcome::Approved => "Loan Approved! 🎉",
        Outcome::Rejected => "Loan Application Rejected",
        Outcome::Pending => "Application Under Review",
        Outcome::MoreInfo => "Additional Information Required",
    }
}

fn description(status: Outcome) -> &'static str {
    match status {
        Outcome::Approved => "Congratulations! Your loan application has been approved.",
        Outcome::Rejected => "We're sorry, but your loan application was not approved at this time.",
        Outcome::Pending => "Your loan application is currently being reviewed by our team.",
        Outcome::MoreInfo => "We need some additional information to process your application.",
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl EligibilityReport {
    fn build(status: Outcome, details: EligibilityDetails) -> Self {
        let action = match status {
            Outcome::Approved => Some(EligibilityAction::ContinueToDisbursement),
            Outcome::Rejected => Some(EligibilityAction::AppealDecision),
            Outcome::MoreInfo => Some(EligibilityAction::ProvideAdditionalInformation),
            Outcome::Pending => None,
        };
        Self {
            status,
            title: title(status).to_string(),
            description: description(status).to_string(),
            details,
            action,
        }
    }

    /// Report for a freshly submitted application, using the canned terms.
    pub fn for_outcome(status: Outcome) -> Self {
        let details = match status {
            Outcome::Approved => EligibilityDetails::Terms {
                loan_amount: APPROVED_AMOUNT,
                interest_rate: APPROVED_RATE,
                tenure_months: APPROVED_TENURE_MONTHS,
            },
            Outcome::Rejected => EligibilityDetails::Reasons {
                reasons: strings(&REJECTION_REASONS),
            },
            Outcome::MoreInfo => EligibilityDetails::RequiredDocuments {
                documents: strings(&REQUIRED_DOCUMENTS),
            },
            Outcome::Pending => EligibilityDetails::Note {
                note: PENDING_NOTE.to_string(),
            },
        };
        Self::build(status, details)
    }

    /// Report for a tracked application. Missing figures show as zero.
    pub fn for_record(record: &ApplicationRecord) -> Self {
        let details = match record.status {
            Outcome::Approved => EligibilityDetails::Terms {
                loan_amount: record.loan_amount.unwrap_or_default(),
                interest_rate: record.interest_rate.unwrap_or_default(),
                tenure_months: record.tenure_months.unwrap_or_default(),
            },
            Outcome::Rejected => EligibilityDetails::Reasons {
                reasons: record.reasons.clone(),
            },
            Outcome::MoreInfo => EligibilityDetails::RequiredDocuments {
                documents: record.required_documents.clone(),
            },
            Outcome::Pending => EligibilityDetails::Note {
                note: PENDING_NOTE.to_string(),
            },
        };
        Self::build(record.status, details)
    }

    /// Take the card's follow-up. Only the action the card offers is accepted.
    pub fn take_action(
        &self,
        action: EligibilityAction,
        origin: CardOrigin,
        notifier: &dyn Notifier,
    ) -> Result<(), ActionUnavailable> {
        if self.action != Some(action) {
            return Err(ActionUnavailable(action.label()));
        }
        let (severity, message) = action.acknowledgement(origin);
        notifier.notify(severity, message);
        Ok(())
    }

    /// Plain-text rendering of the result card.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{}", self.description);

        match &self.details {
            EligibilityDetails::Terms {
                loan_amount,
                interest_rate,
                tenure_months,
            } => {
                let _ = writeln!(out, "Loan Amount: ₹{}", group_thousands(*loan_amount));
                let _ = writeln!(out, "Interest Rate: {interest_rate}%");
                let _ = writeln!(out, "Tenure: {tenure_months} months");
            }
            EligibilityDetails::Reasons { reasons } if !reasons.is_empty() => {
                let _ = writeln!(out, "Reasons:");
                for reason in reasons {
                    let _ = writeln!(out, "  • {reason}");
                }
            }
            EligibilityDetails::RequiredDocuments { documents } if !documents.is_empty() => {
                let _ = writeln!(out, "Required Documents:");
                for document in documents {
                    let _ = writeln!(out, "  • {document}");
                }
            }
            EligibilityDetails::Note { note } => {
                let _ = writeln!(out, "{note}");
            }
            _ => {}
        }

        if let Some(action) = self.action {
            let _ = writeln!(out, "[{}]", action.label());
        }
        out
    }
}

/// 500000 -> "500,000"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
