//! Theme preference shared between every running instance of the application.
//!
//! The preference lives in a [`PreferenceStorage`] that instances are handed at
//! construction time. Writes broadcast a [`StorageChange`]; an instance started with
//! [`ThemePreferences::spawn_sync`] follows writes made by the others.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ThemeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

/// Concrete appearance once `system` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub new_value: String,
}

/// Key/value store visible to every instance that holds a clone.
#[derive(Clone)]
pub struct PreferenceStorage {
    values: Arc<DashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for PreferenceStorage {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            values: Arc::new(DashMap::new()),
            changes,
        }
    }
}

impl PreferenceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        // No subscribers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
            new_value: value.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

/// One instance's view of the theme preference.
pub struct ThemePreferences {
    storage: PreferenceStorage,
    key: String,
    current: Arc<watch::Sender<Theme>>,
}

impl ThemePreferences {
    /// Starts from the stored value, falling back to the configured default when
    /// nothing (or something unreadable) is stored.
    pub fn new(storage: PreferenceStorage, config: &ThemeConfig) -> Self {
        let initial = match storage.get(&config.storage_key) {
            Some(stored) => Theme::parse(&stored).unwrap_or_else(|| {
                warn!(key = %config.storage_key, value = %stored, "Ignoring unreadable stored theme");
                config.default_theme
            }),
            None => config.default_theme,
        };
        let (current, _) = watch::channel(initial);

        Self {
            storage,
            key: config.storage_key.clone(),
            current: Arc::new(current),
        }
    }

    pub fn theme(&self) -> Theme {
        *self.current.borrow()
    }

    /// Persist and publish a new theme.
    pub fn set_theme(&self, theme: Theme) {
        self.storage.set(&self.key, theme.as_str());
        self.current.send_replace(theme);
        debug!(theme = theme.as_str(), "Theme preference updated");
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }

    /// Follow writes made through other instances sharing the same storage.
    /// The task ends once this instance is dropped or the storage goes away.
    pub fn spawn_sync(&self) -> JoinHandle<()> {
        let mut changes = self.storage.subscribe();
        let key = self.key.clone();
        let current: Weak<watch::Sender<Theme>> = Arc::downgrade(&self.current);

        tokio::spawn(async move {
            loop {
                let change = match changes.recv().await {
                    Ok(change) => change,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Theme sync lagged behind storage changes");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(sender) = current.upgrade() else {
                    break;
                };
                if change.key != key {
                    continue;
                }
                if let Some(theme) = Theme::parse(&change.new_value) {
                    sender.send_if_modified(|value| {
                        let modified = *value != theme;
                        *value = theme;
                        modified
                    });
                }
            }
        })
    }

    /// Map the preference to a concrete appearance.
    pub fn resolve(&self, system_prefers_dark: bool) -> Appearance {
        match self.theme() {
            Theme::Light => Appearance::Light,
            Theme::Dark => Appearance::Dark,
            Theme::System if system_prefers_dark => Appearance::Dark,
            Theme::System => Appearance::Light,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn initial_theme_prefers_stored_value() {
        let storage = PreferenceStorage::new();
        let config = ThemeConfig::default();
        assert_eq!(ThemePreferences::new(storage.clone(), &config).theme(), Theme::System);

        storage.set(&config.storage_key, "dark");
        assert_eq!(ThemePreferences::new(storage.clone(), &config).theme(), Theme::Dark);

        storage.set(&config.storage_key, "sepia");
        assert_eq!(ThemePreferences::new(storage, &config).theme(), Theme::System);
    }

    #[test]
    fn system_theme_resolves_from_host_preference() {
        let prefs = ThemePreferences::new(PreferenceStorage::new(), &ThemeConfig::default());
        assert_eq!(prefs.resolve(true), Appearance::Dark);
        assert_eq!(prefs.resolve(false), Appearance::Light);

        prefs.set_theme(Theme::Light);
        assert_eq!(prefs.resolve(true), Appearance::Light);
    }

    #[tokio::test]
    async fn writes_reach_other_instances() {
        let storage = PreferenceStorage::new();
        let config = ThemeConfig::default();
        let first = ThemePreferences::new(storage.clone(), &config);
        let second = ThemePreferences::new(storage.clone(), &config);
        let _sync = second.spawn_sync();
        let mut updates = second.subscribe();

        first.set_theme(Theme::Dark);

        tokio::time::timeout(Duration::from_secs(1), updates.changed())
            .await
            .expect("theme change not propagated")
            .unwrap();
        assert_eq!(second.theme(), Theme::Dark);
        assert_eq!(storage.get(&config.storage_key).as_deref(), Some("dark"));
    }

    #[tokio::test]
    async fn other_keys_are_ignored() {
        let storage = PreferenceStorage::new();
        let config = ThemeConfig::default();
        let prefs = ThemePreferences::new(storage.clone(), &config);
        let _sync = prefs.spawn_sync();

        storage.set("another-key", "dark");
        tokio::task::yield_now().await;

        assert_eq!(prefs.theme(), Theme::System);
    }
}
