use async_trait::async_trait;
use image::{ImageBuffer, Rgb, RgbImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use super::devices::{DeviceError, FacingMode, MediaConstraints, MediaDevices, MediaStream};

/// In-process camera and microphone. Produces numbered chunks and a gradient
/// frame, and counts open handles so leaks are observable.
#[derive(Clone)]
pub struct SyntheticDevices {
    inner: Arc<Inner>,
}

struct Inner {
    available: AtomicBool,
    open_handles: AtomicUsize,
    opened_total: AtomicUsize,
    frame_size: (u32, u32),
}

impl SyntheticDevices {
    pub fn new(available: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                available: AtomicBool::new(available),
                open_handles: AtomicUsize::new(0),
                opened_total: AtomicUsize::new(0),
                frame_size: (64, 48),
            }),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Streams opened and not yet stopped.
    pub fn open_handles(&self) -> usize {
        self.inner.open_handles.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.inner.opened_total.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn open(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, DeviceError> {
        if !self.inner.available.load(Ordering::SeqCst) {
            return Err(DeviceError::PermissionDenied);
        }
        if !constraints.video && !constraints.audio {
            return Err(DeviceError::Failed("no tracks requested".to_string()));
        }

        self.inner.open_handles.fetch_add(1, Ordering::SeqCst);
        self.inner.opened_total.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(SyntheticStream {
            id: Uuid::new_v4().to_string(),
            devices: self.inner.clone(),
            facing: constraints.facing,
            sequence: 0,
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    id: String,
    devices: Arc<Inner>,
    facing: FacingMode,
    sequence: u32,
    stopped: bool,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_chunk(&mut self) -> Option<Vec<u8>> {
        if self.stopped {
            return None;
        }
        self.sequence += 1;
        Some(format!("webm-chunk-{:04};", self.sequence).into_bytes())
    }

    fn grab_frame(&mut self) -> Option<RgbImage> {
        if self.stopped {
            return None;
        }
        let (width, height) = self.devices.frame_size;
        let blue = match self.facing {
            FacingMode::User => 64,
            FacingMode::Environment => 192,
        };
        Some(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, blue])
        }))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.devices.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
