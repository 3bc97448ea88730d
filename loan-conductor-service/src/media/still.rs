use image::ImageError;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::debug;

use super::devices::{DeviceError, MediaConstraints, MediaDevices};
use super::lease::StreamLease;

const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum StillCaptureError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("camera produced no frame")]
    NoFrame,

    #[error("failed to encode photo: {0}")]
    Encode(#[from] ImageError),
}

/// A photo taken with the document camera, encoded as JPEG.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub file_name: String,
    pub media_type: String,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Take a single frame from the rear camera. The stream is released before
/// returning, on success or failure.
pub async fn capture_still(
    devices: &dyn MediaDevices,
    file_stem: &str,
) -> Result<CapturedImage, StillCaptureError> {
    let mut lease = StreamLease::acquire(devices, &MediaConstraints::document_camera()).await?;
    let frame = lease.grab_frame().ok_or(StillCaptureError::NoFrame)?;
    lease.release();

    let (width, height) = frame.dimensions();
    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
    frame.write_with_encoder(encoder)?;

    let file_name = format!("{}.jpg", file_stem.replace(' ', "-"));
    debug!(%file_name, width, height, bytes = data.len(), "Captured still image");

    Ok(CapturedImage {
        file_name,
        media_type: "image/jpeg".to_string(),
        data,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SyntheticDevices;

    #[tokio::test]
    async fn captures_a_decodable_jpeg() {
        let devices = SyntheticDevices::new(true);

        let image = capture_still(&devices, "Aadhaar Card").await.unwrap();

        assert_eq!(image.file_name, "Aadhaar-Card.jpg");
        assert_eq!(image.media_type, "image/jpeg");
        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (image.width, image.height));
        assert_eq!(devices.open_handles(), 0);
    }

    #[tokio::test]
    async fn missing_camera_is_a_device_error() {
        let devices = SyntheticDevices::new(false);

        let err = capture_still(&devices, "PAN Card").await.unwrap_err();

        assert!(matches!(err, StillCaptureError::Device(DeviceError::PermissionDenied)));
    }
}
