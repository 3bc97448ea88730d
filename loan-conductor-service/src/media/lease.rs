use image::RgbImage;
use tracing::debug;

use super::devices::{DeviceError, MediaConstraints, MediaDevices, MediaStream};

/// Exclusive ownership of an open stream. The stream is stopped when the lease
/// is released or dropped, whichever comes first.
pub struct StreamLease {
    stream: Option<Box<dyn MediaStream>>,
}

impl StreamLease {
    pub async fn acquire(
        devices: &dyn MediaDevices,
        constraints: &MediaConstraints,
    ) -> Result<Self, DeviceError> {
        let stream = devices.open(constraints).await?;
        debug!(stream_id = %stream.id(), "Media stream acquired");
        Ok(Self {
            stream: Some(stream),
        })
    }

    pub fn read_chunk(&mut self) -> Option<Vec<u8>> {
        self.stream.as_mut().and_then(|s| s.read_chunk())
    }

    pub fn grab_frame(&mut self) -> Option<RgbImage> {
        self.stream.as_mut().and_then(|s| s.grab_frame())
    }

    pub fn release(mut self) {
        self.stop_stream();
    }

    fn stop_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!(stream_id = %stream.id(), "Media stream released");
        }
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.stop_stream();
    }
}
