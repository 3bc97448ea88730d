// Loan application wizard steps
pub mod document_upload;
pub mod review;
pub mod video_response;
pub mod welcome;

// Shared modules
pub mod types;

pub use document_upload::DocumentUploadStep;
pub use review::ReviewStep;
pub use video_response::VideoResponseStep;
pub use welcome::WelcomeStep;

pub use types::{SummaryLine, review_summary, session_keys};
