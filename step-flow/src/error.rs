use thiserror::Error;

/// Errors produced by the wizard engine.
///
/// Blocked advancement is not an error: a step whose
/// requirement is unmet simply reports [`crate::ExecutionStatus::Blocked`].
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Wizard must contain at least one step")]
    EmptyWizard,

    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
