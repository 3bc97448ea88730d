use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use step_flow::{DocumentCategory, Response};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::fields::mock_fields;
use super::store::DocumentStore;
use crate::media::{MediaDevices, capture_still};
use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Please upload an image file (JPEG, PNG)")]
    InvalidType,

    #[error("User not authenticated")]
    Unauthenticated,

    #[error("Could not access camera. Please check permissions.")]
    CameraUnavailable,

    #[error("Error uploading document: {0}")]
    Upload(String),

    #[error("Document verification failed: {0}")]
    Internal(String),
}

/// A file handed in by the applicant.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Extension from the file name, falling back to the media subtype.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => match self.media_type.split_once('/') {
                Some((_, "jpeg")) => "jpg".to_string(),
                Some((_, subtype)) if !subtype.is_empty() => subtype.to_lowercase(),
                _ => "bin".to_string(),
            },
        }
    }
}

/// Inline preview of the current file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewHandle {
    pub id: Uuid,
    pub data_url: String,
}

impl PreviewHandle {
    fn for_file(file: &DocumentFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_url: format!("data:{};base64,{}", file.media_type, STANDARD.encode(&file.data)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedDocument {
    pub category: DocumentCategory,
    pub extracted_fields: BTreeMap<String, String>,
}

impl VerifiedDocument {
    pub fn into_response(self) -> Response {
        Response::document(self.category, self.extracted_fields)
    }
}

/// Verification scheduled by [`DocumentIntake::submit`].
pub struct PendingVerification {
    handle: JoinHandle<VerifiedDocument>,
}

impl PendingVerification {
    pub async fn wait(self) -> Result<VerifiedDocument, IntakeError> {
        self.handle.await.map_err(|e| {
            error!(error = %e, "Document verification task failed");
            IntakeError::Internal(e.to_string())
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub struct Submission {
    pub preview: PreviewHandle,
    pub storage_path: String,
    pub verification: PendingVerification,
}

struct Current {
    file: DocumentFile,
    preview: PreviewHandle,
}

/// Accepts document images, uploads them and runs the (simulated) verification.
pub struct DocumentIntake {
    processing_delay: Duration,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    current: Mutex<Option<Current>>,
}

impl DocumentIntake {
    pub fn new(
        processing_delay: Duration,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            processing_delay,
            store,
            notifier,
            current: Mutex::new(None),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<Current>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn submit(
        &self,
        owner_id: Option<&str>,
        category: DocumentCategory,
        file: DocumentFile,
    ) -> Result<Submission, IntakeError> {
        match self.try_submit(owner_id, category, file).await {
            Ok(submission) => Ok(submission),
            Err(e) => {
                self.notifier.error(&e.to_string());
                Err(e)
            }
        }
    }

    async fn try_submit(
        &self,
        owner_id: Option<&str>,
        category: DocumentCategory,
        file: DocumentFile,
    ) -> Result<Submission, IntakeError> {
        if !file.is_image() {
            warn!(file_name = %file.name, media_type = %file.media_type, "Rejected non-image document");
            return Err(IntakeError::InvalidType);
        }

        let preview = PreviewHandle::for_file(&file);
        *self.current() = Some(Current {
            file: file.clone(),
            preview: preview.clone(),
        });

        let owner_id = owner_id.ok_or(IntakeError::Unauthenticated)?;
        let path = format!("{}/{}/{}.{}", owner_id, category.slug(), Uuid::new_v4(), file.extension());
        let storage_path = self
            .store
            .store(&path, &file.media_type, &file.data)
            .await
            .map_err(|e| {
                error!(error = %e, %path, "Document upload failed");
                IntakeError::Upload(e.to_string())
            })?;

        info!(%storage_path, category = %category, "Document uploaded, verification scheduled");
        let verification = self.schedule_verification(category);

        Ok(Submission {
            preview,
            storage_path,
            verification,
        })
    }

    fn schedule_verification(&self, category: DocumentCategory) -> PendingVerification {
        let delay = self.processing_delay;
        let notifier = self.notifier.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let extracted_fields = mock_fields(&category);
            notifier.success(&format!("{} verified successfully", category.label()));
            VerifiedDocument {
                category,
                extracted_fields,
            }
        });
        PendingVerification { handle }
    }

    /// Photograph the document with the rear camera and submit the photo.
    pub async fn capture_from_camera(
        &self,
        devices: &dyn MediaDevices,
        owner_id: Option<&str>,
        category: DocumentCategory,
    ) -> Result<Submission, IntakeError> {
        let image = match capture_still(devices, category.label()).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Error accessing camera");
                let err = IntakeError::CameraUnavailable;
                self.notifier.error(&err.to_string());
                return Err(err);
            }
        };
        let file = DocumentFile::new(image.file_name, image.media_type, image.data);
        self.submit(owner_id, category, file).await
    }

    /// Forget the current file and preview. Verification already in flight keeps going.
    pub fn clear(&self) {
        *self.current() = None;
    }

    pub fn current_preview(&self) -> Option<PreviewHandle> {
        self.current().as_ref().map(|c| c.preview.clone())
    }

    pub fn current_file_name(&self) -> Option<String> {
        self.current().as_ref().map(|c| c.file.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DisabledDocumentStore;
    use crate::media::SyntheticDevices;
    use crate::notify::{Severity, ToastBuffer};

    struct FailingStore;

    #[async_trait::async_trait]
    impl DocumentStore for FailingStore {
        async fn store(&self, _path: &str, _media_type: &str, _data: &[u8]) -> anyhow::Result<String> {
            anyhow::bail!("bucket unavailable")
        }
    }

    fn intake(toasts: &ToastBuffer) -> DocumentIntake {
        DocumentIntake::new(
            Duration::from_millis(2000),
            Arc::new(DisabledDocumentStore),
            Arc::new(toasts.clone()),
        )
    }

    fn png(name: &str) -> DocumentFile {
        DocumentFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[tokio::test(start_paused = true)]
    async fn verification_resolves_after_delay() {
        let toasts = ToastBuffer::new();
        let intake = intake(&toasts);

        let submission = intake
            .submit(Some("user-1"), DocumentCategory::IdentityDocument, png("aadhaar.png"))
            .await
            .unwrap();

        assert!(submission.preview.data_url.starts_with("data:image/png;base64,"));
        assert!(submission.storage_path.starts_with("user-1/aadhaar-card/"));
        assert!(submission.storage_path.ends_with(".png"));
        assert_eq!(intake.current_preview(), Some(submission.preview.clone()));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(!submission.verification.is_finished());

        let verified = submission.verification.wait().await.unwrap();
        assert_eq!(verified.extracted_fields["aadhaarNumber"], "XXXX XXXX 1234");
        let toast = toasts.drain().pop().unwrap();
        assert_eq!(toast.severity, Severity::Success);
        assert_eq!(toast.message, "Aadhaar Card verified successfully");
    }

    #[tokio::test]
    async fn non_image_is_rejected_without_scheduling() {
        let toasts = ToastBuffer::new();
        let intake = intake(&toasts);
        let pdf = DocumentFile::new("payslip.pdf", "application/pdf", vec![1, 2, 3]);

        let err = intake
            .submit(Some("user-1"), DocumentCategory::IncomeProof, pdf)
            .await
            .err()
            .unwrap();

        assert_eq!(err, IntakeError::InvalidType);
        assert!(intake.current_preview().is_none());
        assert_eq!(toasts.drain()[0].message, "Please upload an image file (JPEG, PNG)");
    }

    #[tokio::test]
    async fn missing_owner_is_unauthenticated() {
        let toasts = ToastBuffer::new();
        let intake = intake(&toasts);

        let err = intake
            .submit(None, DocumentCategory::TaxIdentityDocument, png("pan.png"))
            .await
            .err()
            .unwrap();

        assert_eq!(err, IntakeError::Unauthenticated);
        assert_eq!(toasts.drain()[0].message, "User not authenticated");
    }

    #[tokio::test]
    async fn store_failure_is_an_upload_error() {
        let toasts = ToastBuffer::new();
        let intake = DocumentIntake::new(Duration::ZERO, Arc::new(FailingStore), Arc::new(toasts.clone()));

        let err = intake
            .submit(Some("user-1"), DocumentCategory::IncomeProof, png("slip.png"))
            .await
            .err()
            .unwrap();

        assert_eq!(err, IntakeError::Upload("bucket unavailable".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_does_not_cancel_verification() {
        let toasts = ToastBuffer::new();
        let intake = intake(&toasts);

        let submission = intake
            .submit(Some("user-1"), DocumentCategory::IncomeProof, png("slip.png"))
            .await
            .unwrap();
        intake.clear();

        assert!(intake.current_preview().is_none());
        let verified = submission.verification.wait().await.unwrap();
        assert_eq!(verified.extracted_fields["employerName"], "ABC Company");
    }

    #[tokio::test]
    async fn camera_capture_submits_a_jpeg() {
        let toasts = ToastBuffer::new();
        let intake = DocumentIntake::new(Duration::ZERO, Arc::new(DisabledDocumentStore), Arc::new(toasts.clone()));
        let devices = SyntheticDevices::new(true);

        let submission = intake
            .capture_from_camera(&devices, Some("user-1"), DocumentCategory::TaxIdentityDocument)
            .await
            .unwrap();

        assert_eq!(intake.current_file_name().as_deref(), Some("PAN-Card.jpg"));
        assert!(submission.storage_path.ends_with(".jpg"));
        assert!(submission.preview.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn camera_failure_is_reported() {
        let toasts = ToastBuffer::new();
        let intake = intake(&toasts);
        let devices = SyntheticDevices::new(false);

        let err = intake
            .capture_from_camera(&devices, Some("user-1"), DocumentCategory::IdentityDocument)
            .await
            .err()
            .unwrap();

        assert_eq!(err, IntakeError::CameraUnavailable);
        assert_eq!(toasts.drain()[0].severity, Severity::Error);
    }

    #[test]
    fn extension_falls_back_to_media_type() {
        assert_eq!(DocumentFile::new("scan", "image/jpeg", vec![]).extension(), "jpg");
        assert_eq!(DocumentFile::new("Scan.PNG", "image/png", vec![]).extension(), "png");
    }
}
