use async_trait::async_trait;
use step_flow::{Context, NextAction, Requirement, Result, Step, StepResult, WizardState};
use tracing::info;

use crate::tasks::session_keys;

/// A step answered by recording a short video.
pub struct VideoResponseStep {
    id: &'static str,
    title: &'static str,
    prompt: &'static str,
    question: &'static str,
}

impl VideoResponseStep {
    pub fn loan_amount() -> Self {
        Self {
            id: "loan-amount",
            title: "Loan Amount",
            prompt: "First, let me know how much you'd like to borrow. Please record a short video telling me the loan amount and the purpose of the loan.",
            question: "What is the loan amount you're requesting and what will you use it for?",
        }
    }

    pub fn employment() -> Self {
        Self {
            id: "employment",
            title: "Employment Details",
            prompt: "Thank you. Now, I need to know about your employment. Please record a video telling me your current job, how long you've been employed there, and your monthly income.",
            question: "What is your current job, how long have you been employed there, and what is your monthly income?",
        }
    }
}

#[async_trait]
impl Step for VideoResponseStep {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn assistant_prompt(&self) -> Option<&str> {
        Some(self.prompt)
    }

    fn question(&self) -> Option<&str> {
        Some(self.question)
    }

    fn requirement(&self) -> Requirement {
        Requirement::Video
    }

    async fn run(&self, context: Context, state: &WizardState) -> Result<StepResult> {
        let session_id = context
            .get::<String>(session_keys::SESSION_ID)
            .await
            .unwrap_or_else(|| "unknown".to_string());
        let recorded_at = state.response(self.id).map(|r| r.timestamp());
        info!(%session_id, step_id = %self.id, ?recorded_at, "Video response accepted");

        Ok(StepResult::new(None, NextAction::Continue))
    }
}
