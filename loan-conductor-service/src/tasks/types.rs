use serde::{Deserialize, Serialize};
use step_flow::{Response, WizardState};

/// Keys the service and the steps share through the session context.
pub mod session_keys {
    pub const SESSION_ID: &str = "session_id";
    pub const OWNER_ID: &str = "owner_id";
    pub const APPLICANT_EMAIL: &str = "applicant_email";
    pub const REVIEW_SUMMARY: &str = "review_summary";
}

/// One line of the application summary shown on the review step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub detail: String,
    pub complete: bool,
}

const SUMMARY_SECTIONS: [(&str, &str); 4] = [
    ("loan-amount", "Loan Details"),
    ("employment", "Employment Details"),
    ("id-verification", "Identity Verification"),
    ("income-proof", "Income Proof"),
];

/// Summary of what the applicant has handed in so far.
pub fn review_summary(state: &WizardState) -> Vec<SummaryLine> {
    SUMMARY_SECTIONS
        .iter()
        .map(|(step_id, label)| {
            let (detail, complete) = match state.response(step_id) {
                Some(Response::Video { .. }) => ("✅ Provided via video response", true),
                Some(Response::Document { .. }) => ("✅ Document verified", true),
                None => ("Not provided", false),
            };
            SummaryLine {
                label: label.to_string(),
                detail: detail.to_string(),
                complete,
            }
        })
        .collect()
}
