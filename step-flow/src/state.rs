use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::response::{Outcome, Response};

/// Progress of one applicant through a wizard.
///
/// Only [`crate::Wizard`] mutates this; callers get read access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub(crate) current_index: usize,
    pub(crate) percentage: f64,
    pub(crate) responses: BTreeMap<String, Response>,
    pub(crate) submitted: bool,
    pub(crate) outcome: Option<Outcome>,
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            percentage: 0.0,
            responses: BTreeMap::new(),
            submitted: false,
            outcome: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Completion in the range 0–100.
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn responses(&self) -> &BTreeMap<String, Response> {
        &self.responses
    }

    pub fn response(&self, step_id: &str) -> Option<&Response> {
        self.responses.get(step_id)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

/// `index / (count - 1) * 100`. The last step already reads 100 even though
/// submission has not happened yet; a single-step wizard is always at 100.
pub fn percentage_for(index: usize, step_count: usize) -> f64 {
    if step_count <= 1 {
        return 100.0;
    }
    index as f64 / (step_count - 1) as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_matches_six_step_layout() {
        assert_eq!(percentage_for(0, 6), 0.0);
        assert_eq!(percentage_for(4, 6), 80.0);
        assert_eq!(percentage_for(5, 6), 100.0);
        assert_eq!(percentage_for(0, 1), 100.0);
    }
}
