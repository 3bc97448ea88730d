pub mod context;
pub mod error;
pub mod response;
pub mod runner;
pub mod state;
pub mod step;
pub mod storage;
pub mod wizard;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use response::{DocumentCategory, Outcome, Response, SUBMISSION_OUTCOMES};
pub use runner::FlowRunner;
pub use state::{WizardState, percentage_for};
pub use step::{NextAction, Requirement, Step, StepInfo, StepResult};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use wizard::{ExecutionResult, ExecutionStatus, Wizard, WizardBuilder};
