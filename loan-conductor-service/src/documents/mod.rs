pub mod fields;
pub mod intake;
pub mod store;

pub use fields::mock_fields;
pub use intake::{
    DocumentFile, DocumentIntake, IntakeError, PendingVerification, PreviewHandle, Submission,
    VerifiedDocument,
};
pub use store::{DisabledDocumentStore, DocumentStore};
