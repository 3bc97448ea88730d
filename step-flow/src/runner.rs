//! FlowRunner – loads a session, applies exactly **one** wizard operation, and persists the
//! updated session back to storage.
//!
//! Use it from request handlers and background callbacks alike: operations on the same
//! session id are serialized, so a document verification landing while the applicant
//! presses "continue" cannot overwrite one another's changes.
//!
//! ```rust,ignore
//! let runner = FlowRunner::new(wizard.clone(), storage.clone());
//! runner.start("session-1").await?;
//! runner.record_response("session-1", "loan-amount", Response::video()).await?;
//! let result = runner.advance("session-1").await?;
//! ```
//!
//! For batch use or custom persistence, call the [`Wizard`] methods on a [`Session`] directly.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    error::{FlowError, Result},
    response::{Outcome, Response},
    storage::{Session, SessionStorage},
    wizard::{ExecutionResult, Wizard},
};

/// High-level helper that orchestrates the common _load → apply → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    wizard: Arc<Wizard>,
    storage: Arc<dyn SessionStorage>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl FlowRunner {
    pub fn new(wizard: Arc<Wizard>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            wizard,
            storage,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn wizard(&self) -> &Arc<Wizard> {
        &self.wizard
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Create and persist a session sitting on the first step.
    pub async fn start(&self, session_id: &str) -> Result<Session> {
        let session = self.wizard.start_session(session_id);
        self.storage.save(session.clone()).await?;
        Ok(session)
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    pub async fn advance(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.lock(session_id).await;
        let mut session = self.load_locked(session_id).await?;
        let result = self.wizard.advance(&mut session).await?;
        self.storage.save(session).await?;
        Ok(result)
    }

    pub async fn retreat(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.lock(session_id).await;
        let mut session = self.load_locked(session_id).await?;
        let result = self.wizard.retreat(&mut session);
        self.storage.save(session).await?;
        Ok(result)
    }

    pub async fn record_response(
        &self,
        session_id: &str,
        step_id: &str,
        response: Response,
    ) -> Result<()> {
        let _guard = self.lock(session_id).await;
        let mut session = self.load_locked(session_id).await?;
        self.wizard.record_response(&mut session, step_id, response);
        self.storage.save(session).await
    }

    pub async fn submit(&self, session_id: &str) -> Result<Outcome> {
        let _guard = self.lock(session_id).await;
        let mut session = self.load_locked(session_id).await?;
        let outcome = self.wizard.submit(&mut session);
        self.storage.save(session).await?;
        Ok(outcome)
    }

    /// Delete the session and forget its lock.
    pub async fn discard(&self, session_id: &str) -> Result<()> {
        {
            let _guard = self.lock(session_id).await;
            self.storage.delete(session_id).await?;
        }
        self.locks.remove(session_id);
        Ok(())
    }

    /// Load under the session lock. A session that no longer exists (a late
    /// callback after `discard`) must not leave its lock entry behind.
    async fn load_locked(&self, session_id: &str) -> Result<Session> {
        match self.load(session_id).await {
            Err(e @ FlowError::SessionNotFound(_)) => {
                self.locks.remove(session_id);
                Err(e)
            }
            other => other,
        }
    }

    async fn lock(&self, session_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(session_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }
}
