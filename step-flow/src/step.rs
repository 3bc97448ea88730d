use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    context::Context,
    error::Result,
    response::{DocumentCategory, Response},
    state::WizardState,
};

/// What must be recorded for a step before the wizard may move past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum Requirement {
    None,
    Video,
    Document(DocumentCategory),
}

impl Requirement {
    /// Only the response kind is checked here; steps that care about the
    /// document category veto from their `run` hook.
    pub fn is_satisfied_by(&self, response: Option<&Response>) -> bool {
        match (self, response) {
            (Requirement::None, _) => true,
            (Requirement::Video, Some(Response::Video { .. })) => true,
            (Requirement::Document(_), Some(Response::Document { .. })) => true,
            _ => false,
        }
    }
}

/// Result of running a step's hook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Message for the applicant
    pub response: Option<String>,
    /// What the wizard should do next
    pub next_action: NextAction,
    /// Short description of where the session stands
    pub status_message: Option<String>,
    /// Filled in by the wizard
    #[serde(default)]
    pub step_id: String,
}

impl StepResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            response,
            next_action,
            status_message: None,
            step_id: String::new(),
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            response,
            next_action,
            status_message,
            step_id: String::new(),
        }
    }
}

/// Decision returned by a step when the applicant asks to move on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Move to the following step, or submit when this is the last one
    Continue,
    /// Stay on this step
    WaitForInput,
    /// Submit the application right away
    Submit,
}

/// One stage of the wizard.
#[async_trait]
pub trait Step: Send + Sync {
    /// Identifier, unique within a wizard
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn assistant_prompt(&self) -> Option<&str> {
        None
    }

    fn question(&self) -> Option<&str> {
        None
    }

    fn requirement(&self) -> Requirement {
        Requirement::None
    }

    /// Runs when the applicant asks to advance and the requirement is met.
    async fn run(&self, _context: Context, _state: &WizardState) -> Result<StepResult> {
        Ok(StepResult::new(None, NextAction::Continue))
    }
}

/// Serializable description of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub id: String,
    pub title: String,
    pub assistant_prompt: Option<String>,
    pub question: Option<String>,
    pub requirement: Requirement,
}

impl StepInfo {
    pub fn of(step: &dyn Step) -> Self {
        Self {
            id: step.id().to_string(),
            title: step.title().to_string(),
            assistant_prompt: step.assistant_prompt().map(str::to_string),
            question: step.question().map(str::to_string),
            requirement: step.requirement(),
        }
    }
}
