use async_trait::async_trait;
use step_flow::{
    Context, DocumentCategory, NextAction, Requirement, Response, Result, Step, StepResult,
    WizardState,
};
use tracing::{info, warn};

use crate::tasks::session_keys;

/// A step answered by uploading or photographing a document of one category.
pub struct DocumentUploadStep {
    id: &'static str,
    title: &'static str,
    prompt: &'static str,
    category: DocumentCategory,
}

impl DocumentUploadStep {
    pub fn id_verification() -> Self {
        Self {
            id: "id-verification",
            title: "ID Verification",
            prompt: "Thank you for sharing that information. Now I need to verify your identity. Please upload a photo of your Aadhaar card or other government ID.",
            category: DocumentCategory::IdentityDocument,
        }
    }

    pub fn income_proof() -> Self {
        Self {
            id: "income-proof",
            title: "Income Proof",
            prompt: "Great! Now, I need proof of your income. Please upload your salary slip, bank statement, or any other income proof document.",
            category: DocumentCategory::IncomeProof,
        }
    }
}

#[async_trait]
impl Step for DocumentUploadStep {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    fn assistant_prompt(&self) -> Option<&str> {
        Some(self.prompt)
    }

    fn requirement(&self) -> Requirement {
        Requirement::Document(self.category.clone())
    }

    async fn run(&self, context: Context, state: &WizardState) -> Result<StepResult> {
        let session_id = context
            .get::<String>(session_keys::SESSION_ID)
            .await
            .unwrap_or_else(|| "unknown".to_string());

        match state.response(self.id) {
            Some(Response::Document { category, .. }) if *category != self.category => {
                warn!(
                    %session_id,
                    step_id = %self.id,
                    expected = %self.category,
                    received = %category,
                    "Document of the wrong category"
                );
                Ok(StepResult::new_with_status(
                    Some(format!("Please upload your {}", self.category.label())),
                    NextAction::WaitForInput,
                    Some(format!("Waiting for {}", self.category.label())),
                ))
            }
            _ => {
                info!(%session_id, step_id = %self.id, category = %self.category, "Document accepted");
                Ok(StepResult::new(None, NextAction::Continue))
            }
        }
    }
}
