use async_trait::async_trait;
use image::RgbImage;
use thiserror::Error;

/// Which camera to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Front camera, pointed at the applicant
    User,
    /// Rear camera, pointed at a document
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
    pub facing: FacingMode,
}

impl MediaConstraints {
    /// Camera plus microphone, for video responses.
    pub fn camera_and_microphone() -> Self {
        Self {
            video: true,
            audio: true,
            facing: FacingMode::User,
        }
    }

    /// Rear camera without audio, for photographing documents.
    pub fn document_camera() -> Self {
        Self {
            video: true,
            audio: false,
            facing: FacingMode::Environment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("no camera or microphone found")]
    NotFound,

    #[error("camera or microphone permission denied")]
    PermissionDenied,

    #[error("device is in use")]
    Busy,

    #[error("device failure: {0}")]
    Failed(String),
}

/// A live camera/microphone stream.
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    /// Encoded media produced since the previous call, if any.
    fn read_chunk(&mut self) -> Option<Vec<u8>>;

    /// Current video frame.
    fn grab_frame(&mut self) -> Option<RgbImage>;

    /// Stop every track and give the hardware back. Idempotent.
    fn stop(&mut self);
}

/// Entry point to the platform's capture devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open(&self, constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, DeviceError>;
}
