use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of document an applicant can hand in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentCategory {
    IdentityDocument,
    TaxIdentityDocument,
    IncomeProof,
    Other(String),
}

impl DocumentCategory {
    /// Human-facing label, e.g. "Aadhaar Card".
    pub fn label(&self) -> &str {
        match self {
            Self::IdentityDocument => "Aadhaar Card",
            Self::TaxIdentityDocument => "PAN Card",
            Self::IncomeProof => "Income Proof",
            Self::Other(label) => label,
        }
    }

    /// Lower-case, dash-separated label used in storage paths.
    pub fn slug(&self) -> String {
        self.label()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase()
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Aadhaar Card" => Self::IdentityDocument,
            "PAN Card" => Self::TaxIdentityDocument,
            "Income Proof" => Self::IncomeProof,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the applicant handed in for a step. Replaced wholesale when a step is redone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Video {
        timestamp: DateTime<Utc>,
    },
    Document {
        category: DocumentCategory,
        extracted_fields: BTreeMap<String, String>,
        timestamp: DateTime<Utc>,
    },
}

impl Response {
    pub fn video() -> Self {
        Self::Video {
            timestamp: Utc::now(),
        }
    }

    pub fn document(category: DocumentCategory, extracted_fields: BTreeMap<String, String>) -> Self {
        Self::Document {
            category,
            extracted_fields,
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Video { timestamp } | Self::Document { timestamp, .. } => *timestamp,
        }
    }
}

/// Terminal eligibility classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Approved,
    Rejected,
    MoreInfo,
    Pending,
}

/// Outcomes a submission can draw from. `Pending` is a display state only and is
/// never produced by a submission.
pub const SUBMISSION_OUTCOMES: [Outcome; 3] = [Outcome::Approved, Outcome::Rejected, Outcome::MoreInfo];

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::MoreInfo => "more-info",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
