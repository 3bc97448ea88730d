//! Per-session capture adapters.
//!
//! Each wizard session gets its own recorder, document intake and toast buffer.
//! Recordings that stop on their own are picked up by a listener task and stored
//! as the video response of the step that started them.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use step_flow::{FlowError, FlowRunner, Response};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::documents::{DocumentIntake, DocumentStore};
use crate::media::{MediaDevices, VideoBlob, VideoRecorder};
use crate::notify::{Notifier, ToastBuffer};

pub const VIDEO_RECORDED: &str = "Video response recorded successfully";

pub struct SessionAdapters {
    pub recorder: VideoRecorder,
    pub intake: DocumentIntake,
    pub toasts: ToastBuffer,
    recording_step: Arc<Mutex<Option<String>>>,
    listener: JoinHandle<()>,
}

impl SessionAdapters {
    /// Remember which step the next recording answers.
    pub fn set_recording_step(&self, step_id: &str) {
        *self.recording_step.lock().unwrap_or_else(PoisonError::into_inner) = Some(step_id.to_string());
    }

    pub fn recording_step(&self) -> Option<String> {
        self.recording_step
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for SessionAdapters {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Settings shared by every session's adapters.
#[derive(Clone)]
pub struct AdapterSettings {
    pub devices: Arc<dyn MediaDevices>,
    pub store: Arc<dyn DocumentStore>,
    pub max_recording_secs: u32,
    pub document_processing: Duration,
}

#[derive(Clone)]
pub struct AdapterRegistry {
    settings: AdapterSettings,
    sessions: Arc<DashMap<String, Arc<SessionAdapters>>>,
}

impl AdapterRegistry {
    pub fn new(settings: AdapterSettings) -> Self {
        Self {
            settings,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn devices(&self) -> &Arc<dyn MediaDevices> {
        &self.settings.devices
    }

    pub fn max_recording_secs(&self) -> u32 {
        self.settings.max_recording_secs
    }

    /// Adapters for `session_id`, created on first use.
    pub fn get_or_create(&self, session_id: &str, runner: &FlowRunner) -> Arc<SessionAdapters> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(self.create(session_id, runner)))
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<SessionAdapters>> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    /// Drop the session's adapters, releasing any device they hold.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            debug!(%session_id, "Session adapters released");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn create(&self, session_id: &str, runner: &FlowRunner) -> SessionAdapters {
        let toasts = ToastBuffer::new();
        let (recorder, recordings) =
            VideoRecorder::new(self.settings.devices.clone(), self.settings.max_recording_secs);
        let intake = DocumentIntake::new(
            self.settings.document_processing,
            self.settings.store.clone(),
            Arc::new(toasts.clone()),
        );
        let recording_step = Arc::new(Mutex::new(None));

        let listener = tokio::spawn(store_auto_stopped_recordings(
            session_id.to_string(),
            runner.clone(),
            recording_step.clone(),
            toasts.clone(),
            recordings,
        ));

        SessionAdapters {
            recorder,
            intake,
            toasts,
            recording_step,
            listener,
        }
    }
}

async fn store_auto_stopped_recordings(
    session_id: String,
    runner: FlowRunner,
    recording_step: Arc<Mutex<Option<String>>>,
    toasts: ToastBuffer,
    mut recordings: mpsc::UnboundedReceiver<VideoBlob>,
) {
    while let Some(blob) = recordings.recv().await {
        let step_id = recording_step
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(step_id) = step_id else {
            debug!(%session_id, "Recording finished with no step to attach it to");
            continue;
        };

        match runner.record_response(&session_id, &step_id, Response::video()).await {
            Ok(()) => {
                info!(%session_id, %step_id, duration_secs = blob.duration_secs, "Auto-stopped recording stored");
                toasts.success(VIDEO_RECORDED);
            }
            Err(FlowError::SessionNotFound(_)) => {
                debug!(%session_id, "Session gone, recording discarded");
                break;
            }
            Err(e) => error!(%session_id, %step_id, error = %e, "Failed to store recording"),
        }
    }
}
