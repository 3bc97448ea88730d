use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    error::{FlowError, Result},
    response::{Outcome, Response, SUBMISSION_OUTCOMES},
    state::percentage_for,
    step::{NextAction, Requirement, Step, StepInfo, StepResult},
    storage::Session,
};

/// A fixed, ordered sequence of steps.
pub struct Wizard {
    pub id: String,
    steps: Vec<Arc<dyn Step>>,
}

/// What `advance` decided before any state was touched.
enum Decision {
    Frozen,
    Blocked {
        step_id: String,
        requirement: Requirement,
    },
    Stay(StepResult),
    Move(StepResult),
    Submit(StepResult),
}

impl Wizard {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Arc<dyn Step>> {
        self.steps.iter()
    }

    pub fn step_infos(&self) -> Vec<StepInfo> {
        self.steps.iter().map(|s| StepInfo::of(s.as_ref())).collect()
    }

    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }

    /// The step the session currently sits on. The index is kept in range by
    /// every transition, so this never fails for sessions built on this wizard.
    pub fn current_step(&self, session: &Session) -> Result<Arc<dyn Step>> {
        self.steps
            .get(session.state.current_index)
            .cloned()
            .ok_or_else(|| FlowError::StepNotFound(format!("index {}", session.state.current_index)))
    }

    /// Fresh session on the first step, with the progress that step reports.
    pub fn start_session(&self, session_id: impl Into<String>) -> Session {
        let mut session = Session::new(session_id, self.id.clone());
        session.state.percentage = percentage_for(0, self.steps.len());
        session
    }

    fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Try to leave the current step forwards. Unmet requirements leave the
    /// session untouched and report [`ExecutionStatus::Blocked`]; leaving the
    /// last step submits.
    pub async fn advance(&self, session: &mut Session) -> Result<ExecutionResult> {
        let decision = self.decide(session).await?;
        Ok(self.apply(session, decision, &mut rand::rng()))
    }

    /// Same as [`Wizard::advance`] with a caller-supplied random source for the outcome draw.
    pub async fn advance_with<R: Rng>(
        &self,
        session: &mut Session,
        rng: &mut R,
    ) -> Result<ExecutionResult> {
        let decision = self.decide(session).await?;
        Ok(self.apply(session, decision, rng))
    }

    async fn decide(&self, session: &Session) -> Result<Decision> {
        if session.state.submitted {
            return Ok(Decision::Frozen);
        }

        let step = self.current_step(session)?;
        let requirement = step.requirement();
        if !requirement.is_satisfied_by(session.state.response(step.id())) {
            return Ok(Decision::Blocked {
                step_id: step.id().to_string(),
                requirement,
            });
        }

        let mut result = step.run(session.context.clone(), &session.state).await?;
        result.step_id = step.id().to_string();

        Ok(match result.next_action {
            NextAction::WaitForInput => Decision::Stay(result),
            NextAction::Submit => Decision::Submit(result),
            NextAction::Continue if session.state.current_index == self.last_index() => {
                Decision::Submit(result)
            }
            NextAction::Continue => Decision::Move(result),
        })
    }

    fn apply<R: Rng>(
        &self,
        session: &mut Session,
        decision: Decision,
        rng: &mut R,
    ) -> ExecutionResult {
        match decision {
            Decision::Frozen => {
                debug!(session_id = %session.id, "Advance ignored, application already submitted");
                ExecutionResult {
                    response: None,
                    status: self.terminal_status(session),
                }
            }
            Decision::Blocked {
                step_id,
                requirement,
            } => {
                debug!(
                    session_id = %session.id,
                    step_id = %step_id,
                    requirement = ?requirement,
                    "Advance blocked, step requirement not met"
                );
                ExecutionResult {
                    response: None,
                    status: ExecutionStatus::Blocked {
                        step_id,
                        requirement,
                    },
                }
            }
            Decision::Stay(result) => {
                session.status_message = result.status_message.clone();
                ExecutionResult {
                    response: result.response,
                    status: ExecutionStatus::WaitingForInput,
                }
            }
            Decision::Move(result) => {
                session.status_message = result.status_message.clone();
                let next_index = session.state.current_index + 1;
                self.move_to(session, next_index);
                let response = result.response.or_else(|| {
                    self.steps[next_index]
                        .assistant_prompt()
                        .map(str::to_string)
                });
                ExecutionResult {
                    response,
                    status: ExecutionStatus::WaitingForInput,
                }
            }
            Decision::Submit(result) => {
                session.status_message = result.status_message.clone();
                let outcome = self.submit_with(session, rng);
                ExecutionResult {
                    response: result.response,
                    status: ExecutionStatus::Completed(outcome),
                }
            }
        }
    }

    /// Step back one. No-op on the first step and after submission.
    pub fn retreat(&self, session: &mut Session) -> ExecutionResult {
        if session.state.submitted {
            return ExecutionResult {
                response: None,
                status: self.terminal_status(session),
            };
        }

        if session.state.current_index > 0 {
            let previous = session.state.current_index - 1;
            self.move_to(session, previous);
        }

        ExecutionResult {
            response: self
                .steps
                .get(session.state.current_index)
                .and_then(|step| step.assistant_prompt())
                .map(str::to_string),
            status: ExecutionStatus::WaitingForInput,
        }
    }

    /// Insert or replace the response for `step_id`. Last write wins.
    pub fn record_response(&self, session: &mut Session, step_id: &str, response: Response) {
        if self.position(step_id).is_none() {
            warn!(session_id = %session.id, step_id = %step_id, "Recording response for unknown step");
        }
        let replaced = session
            .state
            .responses
            .insert(step_id.to_string(), response)
            .is_some();
        info!(session_id = %session.id, step_id = %step_id, replaced, "Response recorded");
    }

    /// Terminal submission with an outcome drawn from the thread-local generator.
    pub fn submit(&self, session: &mut Session) -> Outcome {
        self.submit_with(session, &mut rand::rng())
    }

    /// Terminal submission. Draws uniformly from [`SUBMISSION_OUTCOMES`] the first
    /// time; later calls return the outcome already set.
    pub fn submit_with<R: Rng>(&self, session: &mut Session, rng: &mut R) -> Outcome {
        if let (true, Some(outcome)) = (session.state.submitted, session.state.outcome) {
            return outcome;
        }

        let outcome = SUBMISSION_OUTCOMES[rng.random_range(0..SUBMISSION_OUTCOMES.len())];
        session.state.submitted = true;
        session.state.outcome = Some(outcome);
        session.state.percentage = 100.0;
        session.status_message = Some(format!("Application submitted - outcome: {}", outcome));

        info!(session_id = %session.id, outcome = %outcome, "Application submitted");
        outcome
    }

    fn move_to(&self, session: &mut Session, index: usize) {
        session.state.current_index = index;
        session.state.percentage = percentage_for(index, self.steps.len());
        debug!(
            session_id = %session.id,
            step_id = %self.steps[index].id(),
            percentage = session.state.percentage,
            "Moved to step"
        );
    }

    fn terminal_status(&self, session: &Session) -> ExecutionStatus {
        session
            .state
            .outcome
            .map(ExecutionStatus::Completed)
            .unwrap_or(ExecutionStatus::WaitingForInput)
    }
}

/// Builder for creating wizards
pub struct WizardBuilder {
    id: String,
    steps: Vec<Arc<dyn Step>>,
}

impl WizardBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> Result<Wizard> {
        if self.steps.is_empty() {
            return Err(FlowError::EmptyWizard);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id().to_string()) {
                return Err(FlowError::DuplicateStep(step.id().to_string()));
            }
        }

        Ok(Wizard {
            id: self.id,
            steps: self.steps,
        })
    }
}

/// Outcome of a single wizard operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Sitting on a step, waiting for the applicant
    WaitingForInput,
    /// The current step still needs a response
    Blocked {
        step_id: String,
        requirement: Requirement,
    },
    /// Submitted with this outcome
    Completed(Outcome),
}
