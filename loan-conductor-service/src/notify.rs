use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub severity: Severity,
    pub message: String,
}

/// Fire-and-forget sink for applicant-facing feedback.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// Writes toasts to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!(toast = %message, "Applicant notified"),
            _ => info!(toast = %message, severity = ?severity, "Applicant notified"),
        }
    }
}

/// Keeps toasts until someone drains them, so HTTP responses can carry them.
/// Every toast is also logged.
#[derive(Clone, Default)]
pub struct ToastBuffer {
    toasts: Arc<Mutex<Vec<Toast>>>,
}

impl ToastBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .map(|mut toasts| std::mem::take(&mut *toasts))
            .unwrap_or_default()
    }
}

impl Notifier for ToastBuffer {
    fn notify(&self, severity: Severity, message: &str) {
        TracingNotifier.notify(severity, message);
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(Toast {
                severity,
                message: message.to_string(),
            });
        }
    }
}
