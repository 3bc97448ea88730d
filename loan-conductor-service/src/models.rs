use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use step_flow::{DocumentCategory, ExecutionStatus, Outcome, Response, Session, StepInfo, Wizard};

use crate::dashboard::{ApplicationSummary, DashboardCounts};
use crate::documents::PreviewHandle;
use crate::eligibility::{EligibilityAction, EligibilityReport};
use crate::lookup::ApplicationRecord;
use crate::media::{RecorderStatus, RecordingStart};
use crate::notify::Toast;
use crate::preferences::{Appearance, Theme};
use crate::tasks::SummaryLine;

/// Snapshot of a wizard session as the applicant sees it.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub session_id: String,
    pub step: StepInfo,
    pub step_index: usize,
    pub step_count: usize,
    pub percentage: f64,
    pub submitted: bool,
    pub outcome: Option<Outcome>,
    pub responses: BTreeMap<String, Response>,
    pub status_message: Option<String>,
    pub summary: Vec<SummaryLine>,
}

impl ApplicationView {
    pub fn new(wizard: &Wizard, session: &Session, step: StepInfo, summary: Vec<SummaryLine>) -> Self {
        Self {
            session_id: session.id.clone(),
            step,
            step_index: session.state.current_index(),
            step_count: wizard.step_count(),
            percentage: session.state.percentage(),
            submitted: session.state.is_submitted(),
            outcome: session.state.outcome(),
            responses: session.state.responses().clone(),
            status_message: session.status_message.clone(),
            summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application: ApplicationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub session_id: String,
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<RecordingStart>,
    pub recorder: RecorderStatus,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    pub file_name: String,
    pub media_type: String,
    /// File contents, base64 encoded
    pub data: String,
    /// Defaults to the category the current step asks for
    pub category: Option<DocumentCategory>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptureDocumentRequest {
    pub category: Option<DocumentCategory>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub session_id: String,
    pub step_id: String,
    pub category: DocumentCategory,
    pub preview: PreviewHandle,
    pub storage_path: String,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub session_id: String,
    pub report: EligibilityReport,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EligibilityActionRequest {
    pub action: EligibilityAction,
}

#[derive(Debug, Serialize)]
pub struct EligibilityActionResponse {
    pub action: EligibilityAction,
    pub label: &'static str,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub record: ApplicationRecord,
    pub status_label: &'static str,
    pub report: EligibilityReport,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub counts: DashboardCounts,
    pub recent: Vec<ApplicationSummary>,
    pub applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct ThemeQuery {
    #[serde(default)]
    pub system_prefers_dark: bool,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub appearance: Appearance,
}
