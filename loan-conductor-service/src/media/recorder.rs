use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use super::devices::{MediaConstraints, MediaDevices};
use super::lease::StreamLease;

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoBlob {
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub size_bytes: usize,
    pub duration_secs: u32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderPhase {
    Idle,
    Starting,
    Recording,
    Recorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStart {
    Started,
    /// Camera or microphone missing or refused; see [`VideoRecorder::is_available`]
    Unavailable,
    /// A recording is already running
    Busy,
    /// Reset while the device was being opened
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    pub phase: RecorderPhase,
    pub available: bool,
    pub countdown_secs: u32,
    pub max_duration_secs: u32,
    pub recorded: Option<VideoBlob>,
}

struct Shared {
    available: bool,
    phase: RecorderPhase,
    max_duration: u32,
    countdown: u32,
    elapsed: u32,
    chunks: Vec<Vec<u8>>,
    lease: Option<StreamLease>,
    recorded: Option<VideoBlob>,
    ticker: Option<JoinHandle<()>>,
    // Bumped on every start/reset so stale tickers and openers back off.
    generation: u64,
}

impl Shared {
    fn pull_chunk(&mut self) {
        if let Some(chunk) = self.lease.as_mut().and_then(|l| l.read_chunk()) {
            if !chunk.is_empty() {
                self.chunks.push(chunk);
            }
        }
    }

    /// Flush the last chunk, release the device and assemble the blob.
    fn finalize(&mut self) -> Option<VideoBlob> {
        if self.phase != RecorderPhase::Recording {
            return None;
        }
        self.pull_chunk();
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
        self.ticker = None;

        let data = std::mem::take(&mut self.chunks).concat();
        let blob = VideoBlob {
            mime_type: "video/webm".to_string(),
            size_bytes: data.len(),
            data,
            duration_secs: self.elapsed,
            recorded_at: Utc::now(),
        };
        self.phase = RecorderPhase::Recorded;
        self.recorded = Some(blob.clone());
        Some(blob)
    }

    fn abort_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records one video response at a time from the camera and microphone.
///
/// Recordings that stop on their own when the countdown runs out are delivered
/// on the receiver returned by [`VideoRecorder::new`]; an explicit
/// [`VideoRecorder::stop_recording`] hands the blob straight back instead.
/// Dropping the recorder releases any device it holds.
pub struct VideoRecorder {
    devices: Arc<dyn MediaDevices>,
    shared: Arc<Mutex<Shared>>,
    output: mpsc::UnboundedSender<VideoBlob>,
}

impl VideoRecorder {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        max_duration_secs: u32,
    ) -> (Self, mpsc::UnboundedReceiver<VideoBlob>) {
        let (output, recordings) = mpsc::unbounded_channel();
        let recorder = Self {
            devices,
            shared: Arc::new(Mutex::new(Shared {
                available: true,
                phase: RecorderPhase::Idle,
                max_duration: max_duration_secs,
                countdown: max_duration_secs,
                elapsed: 0,
                chunks: Vec::new(),
                lease: None,
                recorded: None,
                ticker: None,
                generation: 0,
            })),
            output,
        };
        (recorder, recordings)
    }

    /// Try the devices without keeping them open.
    pub async fn check_availability(&self) -> bool {
        let available = match StreamLease::acquire(
            self.devices.as_ref(),
            &MediaConstraints::camera_and_microphone(),
        )
        .await
        {
            Ok(trial) => {
                trial.release();
                true
            }
            Err(e) => {
                warn!(error = %e, "Camera not available");
                false
            }
        };
        lock(&self.shared).available = available;
        available
    }

    pub fn is_available(&self) -> bool {
        lock(&self.shared).available
    }

    pub fn status(&self) -> RecorderStatus {
        let shared = lock(&self.shared);
        RecorderStatus {
            phase: shared.phase,
            available: shared.available,
            countdown_secs: shared.countdown,
            max_duration_secs: shared.max_duration,
            recorded: shared.recorded.clone(),
        }
    }

    pub fn recorded(&self) -> Option<VideoBlob> {
        lock(&self.shared).recorded.clone()
    }

    /// Open the devices and start a recording that stops by itself after
    /// `max_duration_secs`. A previous finished recording is discarded.
    pub async fn start_recording(&self, max_duration_secs: u32) -> RecordingStart {
        let generation = {
            let mut shared = lock(&self.shared);
            if !shared.available {
                return RecordingStart::Unavailable;
            }
            if matches!(shared.phase, RecorderPhase::Starting | RecorderPhase::Recording) {
                return RecordingStart::Busy;
            }
            shared.generation += 1;
            shared.phase = RecorderPhase::Starting;
            shared.recorded = None;
            shared.chunks.clear();
            shared.max_duration = max_duration_secs;
            shared.countdown = max_duration_secs;
            shared.elapsed = 0;
            shared.generation
        };

        let acquired = StreamLease::acquire(
            self.devices.as_ref(),
            &MediaConstraints::camera_and_microphone(),
        )
        .await;

        let mut shared = lock(&self.shared);
        let lease = match acquired {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "Error starting recording");
                if shared.generation == generation {
                    shared.available = false;
                    shared.phase = RecorderPhase::Idle;
                }
                return RecordingStart::Unavailable;
            }
        };
        if shared.generation != generation || shared.phase != RecorderPhase::Starting {
            // The lease is dropped here, which releases the device.
            return RecordingStart::Cancelled;
        }

        shared.lease = Some(lease);
        shared.phase = RecorderPhase::Recording;
        info!(max_duration_secs, "Recording started");

        if shared.countdown == 0 {
            if let Some(blob) = shared.finalize() {
                let _ = self.output.send(blob);
            }
            return RecordingStart::Started;
        }

        shared.ticker = Some(tokio::spawn(run_countdown(
            Arc::downgrade(&self.shared),
            generation,
            self.output.clone(),
        )));
        RecordingStart::Started
    }

    /// Finish the running recording and return it. `None` when nothing is recording.
    pub fn stop_recording(&self) -> Option<VideoBlob> {
        let mut shared = lock(&self.shared);
        if shared.phase != RecorderPhase::Recording {
            return None;
        }
        shared.abort_ticker();
        let blob = shared.finalize();
        if let Some(blob) = &blob {
            info!(duration_secs = blob.duration_secs, size_bytes = blob.size_bytes, "Recording stopped");
        }
        blob
    }

    /// Back to the initial state: no blob, no device, full countdown.
    pub fn reset_recording(&self) {
        let mut shared = lock(&self.shared);
        shared.abort_ticker();
        shared.generation += 1;
        if let Some(lease) = shared.lease.take() {
            lease.release();
        }
        shared.chunks.clear();
        shared.recorded = None;
        shared.elapsed = 0;
        shared.countdown = shared.max_duration;
        shared.phase = RecorderPhase::Idle;
        debug!("Recorder reset");
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        let mut shared = lock(&self.shared);
        shared.abort_ticker();
        shared.generation += 1;
        shared.lease = None;
    }
}

/// One-second countdown. Pulls a chunk per tick and stops the recording at zero.
async fn run_countdown(
    shared: Weak<Mutex<Shared>>,
    generation: u64,
    output: mpsc::UnboundedSender<VideoBlob>,
) {
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;

        let Some(shared) = shared.upgrade() else {
            break;
        };
        let mut state = lock(&shared);
        if state.generation != generation || state.phase != RecorderPhase::Recording {
            break;
        }

        state.pull_chunk();
        state.countdown = state.countdown.saturating_sub(1);
        state.elapsed += 1;

        if state.countdown == 0 {
            if let Some(blob) = state.finalize() {
                info!(duration_secs = blob.duration_secs, "Recording reached its time limit");
                let _ = output.send(blob);
            }
            break;
        }
    }
}
