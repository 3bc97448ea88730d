use chrono::NaiveDate;
use serde::Serialize;
use step_flow::Outcome;

use crate::lookup::date;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub applicant: String,
    pub amount: u64,
    pub status: Outcome,
    pub status_text: &'static str,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total: usize,
    pub approved: usize,
    /// Pending plus more-info.
    pub pending: usize,
    pub rejected: usize,
}

pub fn status_text(status: Outcome) -> &'static str {
    match status {
        Outcome::Approved => "Approved",
        Outcome::Rejected => "Rejected",
        Outcome::Pending => "Pending",
        Outcome::MoreInfo => "More Info Needed",
    }
}

/// Applicant-facing overview of their applications.
#[derive(Debug, Clone)]
pub struct Dashboard {
    applications: Vec<ApplicationSummary>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::mock()
    }
}

impl Dashboard {
    pub fn new(applications: Vec<ApplicationSummary>) -> Self {
        Self { applications }
    }

    pub fn mock() -> Self {
        let entry = |id: &str, applicant: &str, amount: u64, status: Outcome, date: NaiveDate| {
            ApplicationSummary {
                id: id.to_string(),
                applicant: applicant.to_string(),
                amount,
                status,
                status_text: status_text(status),
                date,
            }
        };
        Self::new(vec![
            entry("LOAN123456", "John Doe", 500_000, Outcome::Approved, date(2023, 8, 15)),
            entry("LOAN654321", "Jane Smith", 750_000, Outcome::Rejected, date(2023, 8, 10)),
            entry("LOAN789012", "Robert Johnson", 300_000, Outcome::MoreInfo, date(2023, 8, 16)),
            entry("LOAN345678", "Sarah Williams", 1_000_000, Outcome::Pending, date(2023, 8, 17)),
        ])
    }

    pub fn applications(&self) -> &[ApplicationSummary] {
        &self.applications
    }

    pub fn by_status(&self, status: Outcome) -> Vec<&ApplicationSummary> {
        self.applications.iter().filter(|a| a.status == status).collect()
    }

    /// First `n` applications in listing order.
    pub fn recent(&self, n: usize) -> &[ApplicationSummary] {
        &self.applications[..n.min(self.applications.len())]
    }

    pub fn counts(&self) -> DashboardCounts {
        let count = |status| self.by_status(status).len();
        DashboardCounts {
            total: self.applications.len(),
            approved: count(Outcome::Approved),
            pending: count(Outcome::Pending) + count(Outcome::MoreInfo),
            rejected: count(Outcome::Rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_fold_more_info_into_pending() {
        let counts = Dashboard::mock().counts();

        assert_eq!(
            counts,
            DashboardCounts {
                total: 4,
                approved: 1,
                pending: 2,
                rejected: 1,
            }
        );
    }

    #[test]
    fn recent_is_clamped() {
        let dashboard = Dashboard::mock();

        assert_eq!(dashboard.recent(2)[1].applicant, "Jane Smith");
        assert_eq!(dashboard.recent(10).len(), 4);
        assert!(Dashboard::new(Vec::new()).recent(3).is_empty());
    }

    #[test]
    fn status_text_for_more_info() {
        let dashboard = Dashboard::mock();
        let more_info = dashboard.by_status(Outcome::MoreInfo);

        assert_eq!(more_info.len(), 1);
        assert_eq!(more_info[0].status_text, "More Info Needed");
    }
}
