use async_trait::async_trait;
use step_flow::{Context, NextAction, Result, Step, StepResult, WizardState};
use tracing::info;

use crate::tasks::session_keys;

const PROMPT: &str = "Welcome to the AI Branch Manager. I'll be guiding you through your loan application process today. You can speak directly to me via video, and I'll help assess your loan eligibility. Let's get started!";

pub struct WelcomeStep;

#[async_trait]
impl Step for WelcomeStep {
    fn id(&self) -> &str {
        "welcome"
    }

    fn title(&self) -> &str {
        "Welcome"
    }

    fn assistant_prompt(&self) -> Option<&str> {
        Some(PROMPT)
    }

    async fn run(&self, context: Context, _state: &WizardState) -> Result<StepResult> {
        let session_id = context
            .get::<String>(session_keys::SESSION_ID)
            .await
            .unwrap_or_else(|| "unknown".to_string());
        info!(%session_id, "Applicant started the loan application");

        Ok(StepResult::new(None, NextAction::Continue))
    }
}
