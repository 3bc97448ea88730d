use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use step_flow::Outcome;
use thiserror::Error;
use tracing::{debug, info};

use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Please enter an application ID")]
    EmptyIdentifier,

    #[error("Application not found. Please check the ID and try again.")]
    NotFound(String),
}

/// A previously submitted application as the tracking page shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    pub id: String,
    pub status: Outcome,
    pub loan_amount: Option<u64>,
    pub interest_rate: Option<f64>,
    pub tenure_months: Option<u32>,
    pub application_date: NaiveDate,
    pub last_updated: NaiveDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_documents: Vec<String>,
}

impl ApplicationRecord {
    fn new(id: &str, status: Outcome, applied: NaiveDate, updated: NaiveDate) -> Self {
        Self {
            id: id.to_string(),
            status,
            loan_amount: None,
            interest_rate: None,
            tenure_months: None,
            application_date: applied,
            last_updated: updated,
            reasons: Vec::new(),
            required_documents: Vec::new(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.status)
    }
}

pub fn status_label(status: Outcome) -> &'static str {
    match status {
        Outcome::Approved => "Approved ✅",
        Outcome::Rejected => "Rejected ❌",
        Outcome::MoreInfo => "More Info Needed 🔄",
        Outcome::Pending => "Pending ⏳",
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Table entry for `id`, without the lookup delay.
pub fn find_record(id: &str) -> Option<ApplicationRecord> {
    let record = match id {
        "LOAN123456" => ApplicationRecord {
            loan_amount: Some(500_000),
            interest_rate: Some(10.5),
            tenure_months: Some(36),
            ..ApplicationRecord::new(id, Outcome::Approved, date(2023, 8, 15), date(2023, 8, 17))
        },
        "LOAN654321" => ApplicationRecord {
            reasons: vec![
                "Insufficient income for requested loan amount".to_string(),
                "Recent credit history shows multiple late payments".to_string(),
            ],
            ..ApplicationRecord::new(id, Outcome::Rejected, date(2023, 8, 10), date(2023, 8, 12))
        },
        "LOAN789012" => ApplicationRecord {
            required_documents: vec![
                "Last 6 months bank statements".to_string(),
                "Additional proof of income".to_string(),
            ],
            ..ApplicationRecord::new(id, Outcome::MoreInfo, date(2023, 8, 16), date(2023, 8, 16))
        },
        "LOAN345678" => {
            ApplicationRecord::new(id, Outcome::Pending, date(2023, 8, 17), date(2023, 8, 17))
        }
        _ => return None,
    };
    Some(record)
}

/// Status lookup for submitted applications, backed by a fixed table.
pub struct ApplicationLookup {
    lookup_delay: Duration,
    refresh_delay: Duration,
    notifier: Arc<dyn Notifier>,
}

impl ApplicationLookup {
    pub fn new(lookup_delay: Duration, refresh_delay: Duration, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            lookup_delay,
            refresh_delay,
            notifier,
        }
    }

    /// Blank identifiers fail immediately; anything else waits the lookup delay.
    /// Identifiers are matched exactly.
    pub async fn lookup(&self, identifier: &str) -> Result<ApplicationRecord, LookupError> {
        if identifier.trim().is_empty() {
            let err = LookupError::EmptyIdentifier;
            self.notifier.error(&err.to_string());
            return Err(err);
        }

        debug!(application_id = %identifier, "Looking up application");
        tokio::time::sleep(self.lookup_delay).await;

        match find_record(identifier) {
            Some(record) => {
                info!(application_id = %record.id, status = %record.status, "Application found");
                Ok(record)
            }
            None => {
                let err = LookupError::NotFound(identifier.to_string());
                self.notifier.error(&err.to_string());
                Err(err)
            }
        }
    }

    /// Simulated re-fetch. The record comes back unchanged.
    pub async fn refresh(&self, record: ApplicationRecord) -> ApplicationRecord {
        tokio::time::sleep(self.refresh_delay).await;
        self.notifier.success("Application status updated");
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastBuffer;

    fn lookup(toasts: &ToastBuffer) -> ApplicationLookup {
        ApplicationLookup::new(
            Duration::from_millis(1500),
            Duration::from_millis(1000),
            Arc::new(toasts.clone()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn approved_application_has_terms() {
        let toasts = ToastBuffer::new();
        let started = tokio::time::Instant::now();

        let record = lookup(&toasts).lookup("LOAN123456").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(record.status, Outcome::Approved);
        assert_eq!(record.loan_amount, Some(500_000));
        assert_eq!(record.interest_rate, Some(10.5));
        assert_eq!(record.tenure_months, Some(36));
        assert_eq!(record.last_updated, date(2023, 8, 17));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_application_is_not_found() {
        let toasts = ToastBuffer::new();

        let err = lookup(&toasts).lookup("LOAN000000").await.unwrap_err();

        assert_eq!(err, LookupError::NotFound("LOAN000000".into()));
        assert_eq!(
            toasts.drain()[0].message,
            "Application not found. Please check the ID and try again."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn blank_identifier_fails_without_waiting() {
        let toasts = ToastBuffer::new();
        let started = tokio::time::Instant::now();

        let err = lookup(&toasts).lookup("   ").await.unwrap_err();

        assert_eq!(err, LookupError::EmptyIdentifier);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn more_info_lists_two_documents() {
        let toasts = ToastBuffer::new();
        let record = lookup(&toasts).lookup("LOAN789012").await.unwrap();

        assert_eq!(record.status, Outcome::MoreInfo);
        assert_eq!(record.required_documents.len(), 2);
        assert_eq!(record.status_label(), "More Info Needed 🔄");
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_returns_record_unchanged() {
        let toasts = ToastBuffer::new();
        let lookup = lookup(&toasts);
        let record = lookup.lookup("LOAN345678").await.unwrap();

        let refreshed = lookup.refresh(record.clone()).await;

        assert_eq!(refreshed, record);
        assert_eq!(toasts.drain()[0].message, "Application status updated");
    }
}
