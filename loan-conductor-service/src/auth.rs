use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::info;

use crate::config::UserConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
}

/// Source of the signed-in applicant.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;

    /// True while the provider is still resolving the session.
    fn is_loading(&self) -> bool;

    async fn sign_out(&self);
}

/// Result of checking a protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Loading,
    RedirectToSignIn,
    Granted(User),
}

pub fn check_access(provider: &dyn AuthProvider) -> Access {
    if provider.is_loading() {
        return Access::Loading;
    }
    match provider.current_user() {
        Some(user) => Access::Granted(user),
        None => Access::RedirectToSignIn,
    }
}

/// Provider holding at most one user, fixed at startup and cleared by sign-out.
#[derive(Default)]
pub struct StaticAuthProvider {
    user: RwLock<Option<User>>,
}

impl StaticAuthProvider {
    pub fn new(user: Option<User>) -> Self {
        Self {
            user: RwLock::new(user),
        }
    }

    pub fn from_config(user: Option<&UserConfig>) -> Self {
        Self::new(user.map(|u| User {
            id: u.id.clone(),
            email: u.email.clone(),
        }))
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<User> {
        self.user.read().ok().and_then(|user| user.clone())
    }

    fn is_loading(&self) -> bool {
        false
    }

    async fn sign_out(&self) {
        if let Ok(mut user) = self.user.write() {
            if let Some(previous) = user.take() {
                info!(user_id = %previous.id, "User signed out");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Resolving;

    #[async_trait]
    impl AuthProvider for Resolving {
        fn current_user(&self) -> Option<User> {
            None
        }

        fn is_loading(&self) -> bool {
            true
        }

        async fn sign_out(&self) {}
    }

    #[tokio::test]
    async fn sign_out_revokes_access() {
        let provider = StaticAuthProvider::new(Some(User {
            id: "user-1".into(),
            email: None,
        }));
        assert!(matches!(check_access(&provider), Access::Granted(u) if u.id == "user-1"));

        provider.sign_out().await;

        assert_eq!(check_access(&provider), Access::RedirectToSignIn);
    }

    #[test]
    fn loading_wins_over_missing_user() {
        assert_eq!(check_access(&Resolving), Access::Loading);
    }
}
