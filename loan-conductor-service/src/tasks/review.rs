use async_trait::async_trait;
use step_flow::{Context, NextAction, Result, Step, StepResult, WizardState};
use tracing::info;

use crate::tasks::{review_summary, session_keys};

const PROMPT: &str = "Thank you for providing all the required information. I'm now going to review your application and determine your loan eligibility. This will just take a moment.";

/// Last step. Leaving it submits the application.
pub struct ReviewStep;

#[async_trait]
impl Step for ReviewStep {
    fn id(&self) -> &str {
        "review"
    }

    fn title(&self) -> &str {
        "Application Review"
    }

    fn assistant_prompt(&self) -> Option<&str> {
        Some(PROMPT)
    }

    async fn run(&self, context: Context, state: &WizardState) -> Result<StepResult> {
        let owner_id = context
            .get::<String>(session_keys::OWNER_ID)
            .await
            .unwrap_or_else(|| "anonymous".to_string());

        let summary = review_summary(state);
        let complete = summary.iter().filter(|line| line.complete).count();
        info!(%owner_id, complete, sections = summary.len(), "Reviewing application");
        context.set(session_keys::REVIEW_SUMMARY, &summary).await;

        Ok(StepResult::new_with_status(
            Some("Processing your application...".to_string()),
            NextAction::Continue,
            Some("Application under review".to_string()),
        ))
    }
}
