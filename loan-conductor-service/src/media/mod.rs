//! Camera and microphone access for video responses and document photos.

pub mod devices;
pub mod lease;
pub mod recorder;
pub mod still;
pub mod synthetic;

pub use devices::{DeviceError, FacingMode, MediaConstraints, MediaDevices, MediaStream};
pub use lease::StreamLease;
pub use recorder::{RecorderPhase, RecorderStatus, RecordingStart, VideoBlob, VideoRecorder};
pub use still::{CapturedImage, StillCaptureError, capture_still};
pub use synthetic::SyntheticDevices;
