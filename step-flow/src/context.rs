use dashmap::DashMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Free-form data attached to a wizard session (applicant id, display name, notes
/// left by step hooks). Responses do not live here; they belong to [`crate::WizardState`].
///
/// Cloning is cheap and clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`. Values that fail to serialize are dropped with a warning.
    pub async fn set(&self, key: impl Into<String>, value: impl Serialize) {
        self.set_sync(key, value);
    }

    pub fn set_sync(&self, key: impl Into<String>, value: impl Serialize) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.data.insert(key, value);
            }
            Err(e) => warn!(key = %key, error = %e, "Dropping context value that failed to serialize"),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    /// Synchronous read, usable from closures that cannot await.
    pub fn get_sync<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub async fn clear(&self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let context = Context::new();
        let other = context.clone();

        context.set("applicant_name", "John Doe").await;

        let name: Option<String> = other.get("applicant_name").await;
        assert_eq!(name.as_deref(), Some("John Doe"));
        assert!(other.contains("applicant_name"));
    }

    #[tokio::test]
    async fn wrong_type_reads_as_none() {
        let context = Context::new();
        context.set("loan_amount", 500_000u64).await;

        let as_text: Option<String> = context.get("loan_amount").await;
        assert!(as_text.is_none());
        assert_eq!(context.get_sync::<u64>("loan_amount"), Some(500_000));
    }
}
