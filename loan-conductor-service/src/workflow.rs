use crate::auth::User;
use crate::tasks::*;
use std::sync::Arc;
use step_flow::{FlowRunner, Session, SessionStorage, Wizard, WizardBuilder};
use uuid::Uuid;

pub const LOAN_WIZARD_ID: &str = "loan_application";

/// welcome → loan-amount → employment → id-verification → income-proof → review
pub fn build_loan_wizard() -> step_flow::Result<Wizard> {
    WizardBuilder::new(LOAN_WIZARD_ID)
        .add_step(Arc::new(WelcomeStep))
        .add_step(Arc::new(VideoResponseStep::loan_amount()))
        .add_step(Arc::new(VideoResponseStep::employment()))
        .add_step(Arc::new(DocumentUploadStep::id_verification()))
        .add_step(Arc::new(DocumentUploadStep::income_proof()))
        .add_step(Arc::new(ReviewStep))
        .build()
}

/// Fresh session for `owner`, sitting on the welcome step.
pub async fn create_loan_session(wizard: &Wizard, owner: &User) -> Session {
    let session_id = Uuid::new_v4().to_string();
    let session = wizard.start_session(session_id.clone());
    session.context.set(session_keys::SESSION_ID, session_id).await;
    session.context.set(session_keys::OWNER_ID, owner.id.clone()).await;
    if let Some(email) = &owner.email {
        session.context.set(session_keys::APPLICANT_EMAIL, email.clone()).await;
    }
    session
}

pub fn create_flow_runner(session_storage: Arc<dyn SessionStorage>) -> step_flow::Result<FlowRunner> {
    let wizard = Arc::new(build_loan_wizard()?);
    Ok(FlowRunner::new(wizard, session_storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::BTreeMap;
    use step_flow::{
        DocumentCategory, ExecutionStatus, InMemorySessionStorage, Requirement, Response,
        SUBMISSION_OUTCOMES,
    };

    fn applicant() -> User {
        User {
            id: "user-1".into(),
            email: Some("applicant@example.com".into()),
        }
    }

    fn document(category: DocumentCategory) -> Response {
        Response::document(category, BTreeMap::new())
    }

    #[tokio::test]
    async fn six_step_progression() {
        let wizard = build_loan_wizard().unwrap();
        let mut session = create_loan_session(&wizard, &applicant()).await;

        wizard.advance(&mut session).await.unwrap();
        wizard.record_response(&mut session, "loan-amount", Response::video());
        wizard.advance(&mut session).await.unwrap();
        wizard.record_response(&mut session, "employment", Response::video());
        wizard.advance(&mut session).await.unwrap();
        wizard.record_response(&mut session, "id-verification", document(DocumentCategory::IdentityDocument));
        wizard.advance(&mut session).await.unwrap();

        assert_eq!(session.state.current_index(), 4);
        assert_eq!(session.state.percentage(), 80.0);

        wizard.record_response(&mut session, "income-proof", document(DocumentCategory::IncomeProof));
        wizard.advance(&mut session).await.unwrap();

        assert_eq!(session.state.current_index(), 5);
        assert_eq!(session.state.percentage(), 100.0);
        assert!(!session.state.is_submitted());

        let mut rng = StdRng::seed_from_u64(7);
        let result = wizard.advance_with(&mut session, &mut rng).await.unwrap();

        let ExecutionStatus::Completed(outcome) = result.status.clone() else {
            panic!("expected submission");
        };
        assert!(SUBMISSION_OUTCOMES.contains(&outcome));
        assert_eq!(result.response.as_deref(), Some("Processing your application..."));
        let summary: Vec<SummaryLine> = session.context.get(session_keys::REVIEW_SUMMARY).await.unwrap();
        assert!(summary.iter().all(|line| line.complete));
    }

    #[tokio::test]
    async fn video_step_blocks_without_recording() {
        let wizard = build_loan_wizard().unwrap();
        let mut session = create_loan_session(&wizard, &applicant()).await;
        wizard.advance(&mut session).await.unwrap();

        let result = wizard.advance(&mut session).await.unwrap();

        assert_eq!(
            result.status,
            ExecutionStatus::Blocked {
                step_id: "loan-amount".into(),
                requirement: Requirement::Video,
            }
        );
        assert_eq!(session.state.current_index(), 1);
    }

    #[tokio::test]
    async fn wrong_document_category_is_vetoed() {
        let wizard = build_loan_wizard().unwrap();
        let mut session = create_loan_session(&wizard, &applicant()).await;
        for step in ["loan-amount", "employment"] {
            wizard.record_response(&mut session, step, Response::video());
        }
        for _ in 0..3 {
            wizard.advance(&mut session).await.unwrap();
        }
        wizard.record_response(&mut session, "id-verification", document(DocumentCategory::IncomeProof));

        let result = wizard.advance(&mut session).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::WaitingForInput);
        assert_eq!(result.response.as_deref(), Some("Please upload your Aadhaar Card"));
        assert_eq!(session.state.current_index(), 3);
    }

    #[tokio::test]
    async fn session_context_carries_owner() {
        let wizard = build_loan_wizard().unwrap();
        let session = create_loan_session(&wizard, &applicant()).await;

        let owner: Option<String> = session.context.get(session_keys::OWNER_ID).await;
        let email: Option<String> = session.context.get(session_keys::APPLICANT_EMAIL).await;
        assert_eq!(owner.as_deref(), Some("user-1"));
        assert_eq!(email.as_deref(), Some("applicant@example.com"));
    }

    #[tokio::test]
    async fn runner_uses_loan_wizard() {
        let runner = create_flow_runner(Arc::new(InMemorySessionStorage::new())).unwrap();

        assert_eq!(runner.wizard().step_count(), 6);
        assert_eq!(runner.wizard().id, LOAN_WIZARD_ID);
    }
}
