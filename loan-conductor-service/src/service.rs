use axum::{
    Extension, Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::sync::Arc;
use step_flow::{
    DocumentCategory, FlowError, FlowRunner, InMemorySessionStorage, Requirement, Session,
    SessionStorage, StepInfo,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    adapters::{AdapterRegistry, AdapterSettings, SessionAdapters, VIDEO_RECORDED},
    auth::{Access, AuthProvider, StaticAuthProvider, User, check_access},
    config::AppConfig,
    dashboard::Dashboard,
    documents::{DisabledDocumentStore, DocumentFile, DocumentStore, IntakeError, Submission},
    eligibility::{CardOrigin, EligibilityReport},
    lookup::{ApplicationLookup, LookupError, find_record},
    media::{MediaDevices, SyntheticDevices},
    models::*,
    notify::{Notifier, ToastBuffer},
    preferences::{PreferenceStorage, ThemePreferences},
    tasks::{review_summary, session_keys},
    workflow::{create_flow_runner, create_loan_session},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

const PROCESSING_APPLICATION: &str = "Processing your application...";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn unauthorized_error(message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "redirect": "/auth"
        })),
    )
}

fn flow_error(e: FlowError, session_id: &str) -> ApiError {
    match e {
        FlowError::SessionNotFound(_) => not_found_error("Application not found", session_id),
        other => {
            error!(%session_id, error = %other, "Wizard operation failed");
            internal_error("Wizard operation failed", &other.to_string())
        }
    }
}

/// Collaborators the service is built from. Swap any of them for tests or demos.
pub struct AppDependencies {
    pub devices: Arc<dyn MediaDevices>,
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub session_storage: Arc<dyn SessionStorage>,
    pub preferences: PreferenceStorage,
}

impl AppDependencies {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            devices: Arc::new(SyntheticDevices::new(config.capture.camera_available)),
            store: Arc::new(DisabledDocumentStore),
            auth: Arc::new(StaticAuthProvider::from_config(config.user.as_ref())),
            session_storage: Arc::new(InMemorySessionStorage::new()),
            preferences: PreferenceStorage::new(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub adapters: AdapterRegistry,
    pub auth: Arc<dyn AuthProvider>,
    pub dashboard: Arc<Dashboard>,
    pub theme: Arc<ThemePreferences>,
}

impl AppState {
    pub fn new(config: AppConfig, deps: AppDependencies) -> anyhow::Result<Self> {
        let flow_runner = create_flow_runner(deps.session_storage.clone())?;
        let adapters = AdapterRegistry::new(AdapterSettings {
            devices: deps.devices,
            store: deps.store,
            max_recording_secs: config.capture.max_recording_secs,
            document_processing: config.timings.document_processing,
        });
        let theme = Arc::new(ThemePreferences::new(deps.preferences, &config.theme));

        Ok(Self {
            config: Arc::new(config),
            session_storage: deps.session_storage,
            flow_runner,
            adapters,
            auth: deps.auth,
            dashboard: Arc::new(Dashboard::mock()),
            theme,
        })
    }
}

pub async fn create_app(config: AppConfig) -> anyhow::Result<Router> {
    let deps = AppDependencies::from_config(&config);
    let state = AppState::new(config, deps)?;
    state.theme.spawn_sync();
    Ok(build_router(state))
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/applications", post(create_application))
        .route(
            "/applications/{id}",
            get(get_application).delete(delete_application),
        )
        .route("/applications/{id}/advance", post(advance_application))
        .route("/applications/{id}/retreat", post(retreat_application))
        .route("/applications/{id}/submit", post(submit_application))
        .route("/applications/{id}/eligibility", get(get_eligibility))
        .route("/applications/{id}/eligibility/action", post(eligibility_action))
        .route("/applications/{id}/recording", get(get_recording))
        .route("/applications/{id}/recording/start", post(start_recording))
        .route("/applications/{id}/recording/stop", post(stop_recording))
        .route("/applications/{id}/recording/reset", post(reset_recording))
        .route(
            "/applications/{id}/documents",
            post(upload_document).delete(clear_document),
        )
        .route("/applications/{id}/documents/capture", post(capture_document))
        .route("/track/{application_id}", get(track_application))
        .route("/track/{application_id}/refresh", post(refresh_application))
        .route("/track/{application_id}/action", post(track_action))
        .route("/dashboard", get(get_dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/preferences/theme", get(get_theme).put(set_theme))
        .route("/auth/sign-out", post(sign_out))
        .merge(protected)
        .layer(middleware::from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(mut request: Request, next: Next) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

/// Gate for applicant-only routes. The signed-in user is handed on as an extension.
async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> axum::response::Response {
    match check_access(state.auth.as_ref()) {
        Access::Granted(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Access::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Authentication is still loading" })),
        )
            .into_response(),
        Access::RedirectToSignIn => {
            warn!(path = %request.uri().path(), "Rejected request without a signed-in user");
            unauthorized_error("User not authenticated").into_response()
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Loan Conductor Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Guided loan application with video responses and document verification",
        "endpoints": {
            "POST /applications": "Start a new loan application",
            "GET /applications/{id}": "Current step, progress and responses",
            "POST /applications/{id}/advance": "Move to the next step (submits from the last step)",
            "POST /applications/{id}/retreat": "Go back one step",
            "POST /applications/{id}/submit": "Submit the application",
            "GET /applications/{id}/eligibility": "Eligibility result after submission",
            "POST /applications/{id}/eligibility/action": "Take the follow-up offered on the result",
            "POST /applications/{id}/recording/start": "Start recording the video response",
            "POST /applications/{id}/recording/stop": "Stop recording and keep the response",
            "POST /applications/{id}/documents": "Upload a document image (base64)",
            "POST /applications/{id}/documents/capture": "Photograph a document with the camera",
            "GET /track/{application_id}": "Look up a submitted application",
            "POST /track/{application_id}/action": "Take the follow-up offered for a tracked application",
            "GET /dashboard": "Overview of your applications",
            "GET /preferences/theme": "Current theme preference",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn load_owned_session(state: &AppState, session_id: &str, user: &User) -> Result<Session, ApiError> {
    let session = state
        .flow_runner
        .load(session_id)
        .await
        .map_err(|e| flow_error(e, session_id))?;

    let owner: Option<String> = session.context.get(session_keys::OWNER_ID).await;
    if owner.as_deref() != Some(user.id.as_str()) {
        warn!(%session_id, user_id = %user.id, "Application belongs to another user");
        return Err(not_found_error("Application not found", session_id));
    }
    Ok(session)
}

fn current_step_info(state: &AppState, session: &Session) -> Result<StepInfo, ApiError> {
    state
        .flow_runner
        .wizard()
        .current_step(session)
        .map(|step| StepInfo::of(step.as_ref()))
        .map_err(|e| flow_error(e, &session.id))
}

fn application_view(state: &AppState, session: &Session) -> Result<ApplicationView, ApiError> {
    let step = current_step_info(state, session)?;
    Ok(ApplicationView::new(
        state.flow_runner.wizard(),
        session,
        step,
        review_summary(&session.state),
    ))
}

async fn application_response(
    state: &AppState,
    session_id: &str,
    adapters: &SessionAdapters,
    status: Option<step_flow::ExecutionStatus>,
    message: Option<String>,
) -> ApiResult<ApplicationResponse> {
    let session = state
        .flow_runner
        .load(session_id)
        .await
        .map_err(|e| flow_error(e, session_id))?;

    Ok(Json(ApplicationResponse {
        application: application_view(state, &session)?,
        status,
        message,
        toasts: adapters.toasts.drain(),
    }))
}

async fn create_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let session = create_loan_session(state.flow_runner.wizard(), &user).await;
    let session_id = session.id.clone();

    state.session_storage.save(session.clone()).await.map_err(|e| {
        error!(%session_id, error = %e, "Failed to create session");
        internal_error("Failed to create application", &e.to_string())
    })?;

    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    let camera_available = adapters.recorder.check_availability().await;
    info!(%session_id, user_id = %user.id, camera_available, "Loan application started");

    let step = current_step_info(&state, &session)?;
    let message = step.assistant_prompt.clone();
    let response = ApplicationResponse {
        application: application_view(&state, &session)?,
        status: None,
        message,
        toasts: adapters.toasts.drain(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<ApplicationResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);

    Ok(Json(ApplicationResponse {
        application: application_view(&state, &session)?,
        status: None,
        message: None,
        toasts: adapters.toasts.drain(),
    }))
}

async fn delete_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    load_owned_session(&state, &session_id, &user).await?;

    state.adapters.remove(&session_id);
    state
        .flow_runner
        .discard(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    info!(%session_id, "Loan application discarded");
    Ok(Json(json!({
        "session_id": session_id,
        "status": "discarded"
    })))
}

/// Simulated processing time before an application is submitted.
async fn processing_delay(state: &AppState, adapters: &SessionAdapters) {
    adapters.toasts.info(PROCESSING_APPLICATION);
    tokio::time::sleep(state.config.timings.submission).await;
}

async fn advance_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<ApplicationResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    let wizard = state.flow_runner.wizard();

    let on_last_step = session.state.current_index() + 1 == wizard.step_count();
    if on_last_step && !session.state.is_submitted() {
        processing_delay(&state, &adapters).await;
    }

    let before = session.state.current_index();
    let result = state
        .flow_runner
        .advance(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;
    info!(%session_id, status = ?result.status, "Advance processed");

    let after = state
        .flow_runner
        .load(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;
    if after.state.current_index() != before {
        adapters.recorder.reset_recording();
        adapters.intake.clear();
    }

    application_response(&state, &session_id, &adapters, Some(result.status), result.response).await
}

async fn retreat_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<ApplicationResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);

    let result = state
        .flow_runner
        .retreat(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;

    if session.state.current_index() > 0 && !session.state.is_submitted() {
        adapters.recorder.reset_recording();
        adapters.intake.clear();
    }

    application_response(&state, &session_id, &adapters, Some(result.status), result.response).await
}

async fn submit_application(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<ApplicationResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);

    if !session.state.is_submitted() {
        processing_delay(&state, &adapters).await;
    }
    let outcome = state
        .flow_runner
        .submit(&session_id)
        .await
        .map_err(|e| flow_error(e, &session_id))?;
    info!(%session_id, %outcome, "Submission processed");

    application_response(
        &state,
        &session_id,
        &adapters,
        Some(step_flow::ExecutionStatus::Completed(outcome)),
        None,
    )
    .await
}

async fn get_eligibility(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<EligibilityResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;

    let Some(outcome) = session.state.outcome() else {
        return Err(bad_request_error("Application has not been submitted yet"));
    };
    let report = EligibilityReport::for_outcome(outcome);

    Ok(Json(EligibilityResponse {
        session_id,
        text: report.render(),
        report,
    }))
}

async fn eligibility_action(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
    Json(request): Json<EligibilityActionRequest>,
) -> ApiResult<EligibilityActionResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let Some(outcome) = session.state.outcome() else {
        return Err(bad_request_error("Application has not been submitted yet"));
    };

    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    EligibilityReport::for_outcome(outcome)
        .take_action(request.action, CardOrigin::Application, &adapters.toasts)
        .map_err(|e| bad_request_error(&e.to_string()))?;
    info!(%session_id, action = ?request.action, "Eligibility follow-up taken");

    Ok(Json(EligibilityActionResponse {
        action: request.action,
        label: request.action.label(),
        toasts: adapters.toasts.drain(),
    }))
}

fn recording_response(
    session_id: String,
    adapters: &SessionAdapters,
    start: Option<crate::media::RecordingStart>,
) -> RecordingResponse {
    RecordingResponse {
        session_id,
        step_id: adapters.recording_step(),
        start,
        recorder: adapters.recorder.status(),
        toasts: adapters.toasts.drain(),
    }
}

async fn get_recording(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<RecordingResponse> {
    load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    Ok(Json(recording_response(session_id, &adapters, None)))
}

async fn start_recording(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<RecordingResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let step = current_step_info(&state, &session)?;
    if session.state.is_submitted() || step.requirement != Requirement::Video {
        return Err(bad_request_error("The current step does not take a video response"));
    }

    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    adapters.set_recording_step(&step.id);
    let start = adapters
        .recorder
        .start_recording(state.adapters.max_recording_secs())
        .await;
    info!(%session_id, step_id = %step.id, ?start, "Recording requested");

    Ok(Json(recording_response(session_id, &adapters, Some(start))))
}

async fn stop_recording(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<RecordingResponse> {
    load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);

    if let (Some(blob), Some(step_id)) = (adapters.recorder.stop_recording(), adapters.recording_step()) {
        state
            .flow_runner
            .record_response(&session_id, &step_id, step_flow::Response::video())
            .await
            .map_err(|e| flow_error(e, &session_id))?;
        info!(%session_id, %step_id, duration_secs = blob.duration_secs, size_bytes = blob.size_bytes, "Video response stored");
        adapters.toasts.success(VIDEO_RECORDED);
    }

    Ok(Json(recording_response(session_id, &adapters, None)))
}

async fn reset_recording(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<RecordingResponse> {
    load_owned_session(&state, &session_id, &user).await?;
    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    adapters.recorder.reset_recording();
    Ok(Json(recording_response(session_id, &adapters, None)))
}

/// Category the current step asks for, unless the caller names one.
fn document_target(
    state: &AppState,
    session: &Session,
    requested: Option<DocumentCategory>,
) -> Result<(String, DocumentCategory), ApiError> {
    let step = current_step_info(state, session)?;
    match (session.state.is_submitted(), step.requirement) {
        (false, Requirement::Document(expected)) => Ok((step.id, requested.unwrap_or(expected))),
        _ => Err(bad_request_error("The current step does not take a document")),
    }
}

fn intake_error(e: IntakeError) -> ApiError {
    match e {
        IntakeError::Unauthenticated => unauthorized_error(&e.to_string()),
        IntakeError::InvalidType | IntakeError::CameraUnavailable => bad_request_error(&e.to_string()),
        IntakeError::Upload(_) | IntakeError::Internal(_) => {
            internal_error("Error processing document", &e.to_string())
        }
    }
}

/// Store the extracted fields as the step's response once verification finishes.
/// Results for sessions discarded in the meantime are dropped.
fn record_when_verified(state: &AppState, session_id: &str, step_id: &str, submission: Submission) -> DocumentSummary {
    let runner = state.flow_runner.clone();
    let session_id = session_id.to_string();
    let step_id = step_id.to_string();
    let summary = DocumentSummary {
        preview: submission.preview,
        storage_path: submission.storage_path,
    };

    tokio::spawn(async move {
        let verified = match submission.verification.wait().await {
            Ok(verified) => verified,
            Err(e) => {
                error!(%session_id, %step_id, error = %e, "Document verification failed");
                return;
            }
        };
        match runner
            .record_response(&session_id, &step_id, verified.into_response())
            .await
        {
            Ok(()) => info!(%session_id, %step_id, "Verified document stored"),
            Err(FlowError::SessionNotFound(_)) => {
                info!(%session_id, "Session gone, verification result discarded")
            }
            Err(e) => error!(%session_id, %step_id, error = %e, "Failed to store verified document"),
        }
    }
    .in_current_span());

    summary
}

struct DocumentSummary {
    preview: crate::documents::PreviewHandle,
    storage_path: String,
}

async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
    Json(request): Json<UploadDocumentRequest>,
) -> ApiResult<DocumentResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let (step_id, category) = document_target(&state, &session, request.category)?;
    let data = STANDARD
        .decode(request.data.as_bytes())
        .map_err(|_| bad_request_error("Document data must be base64 encoded"))?;

    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    let file = DocumentFile::new(request.file_name, request.media_type, data);
    let submission = adapters
        .intake
        .submit(Some(&user.id), category.clone(), file)
        .await
        .map_err(intake_error)?;

    let summary = record_when_verified(&state, &session_id, &step_id, submission);
    Ok(Json(DocumentResponse {
        session_id,
        step_id,
        category,
        preview: summary.preview,
        storage_path: summary.storage_path,
        toasts: adapters.toasts.drain(),
    }))
}

async fn capture_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> ApiResult<DocumentResponse> {
    let session = load_owned_session(&state, &session_id, &user).await?;
    let request: CaptureDocumentRequest = if body.is_empty() {
        CaptureDocumentRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| bad_request_error(&e.to_string()))?
    };
    let (step_id, category) = document_target(&state, &session, request.category)?;

    let adapters = state.adapters.get_or_create(&session_id, &state.flow_runner);
    let submission = adapters
        .intake
        .capture_from_camera(state.adapters.devices().as_ref(), Some(&user.id), category.clone())
        .await
        .map_err(intake_error)?;

    let summary = record_when_verified(&state, &session_id, &step_id, submission);
    Ok(Json(DocumentResponse {
        session_id,
        step_id,
        category,
        preview: summary.preview,
        storage_path: summary.storage_path,
        toasts: adapters.toasts.drain(),
    }))
}

async fn clear_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    load_owned_session(&state, &session_id, &user).await?;
    if let Some(adapters) = state.adapters.get(&session_id) {
        adapters.intake.clear();
    }
    Ok(Json(json!({
        "session_id": session_id,
        "status": "cleared"
    })))
}

fn lookup_for_request(state: &AppState, toasts: &ToastBuffer) -> ApplicationLookup {
    ApplicationLookup::new(
        state.config.timings.lookup,
        state.config.timings.refresh,
        Arc::new(toasts.clone()),
    )
}

async fn track_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> ApiResult<TrackResponse> {
    let toasts = ToastBuffer::new();
    let lookup = lookup_for_request(&state, &toasts);

    match lookup.lookup(&application_id).await {
        Ok(record) => Ok(Json(TrackResponse {
            status_label: record.status_label(),
            report: EligibilityReport::for_record(&record),
            record,
            toasts: toasts.drain(),
        })),
        Err(e @ LookupError::EmptyIdentifier) => Err(bad_request_error(&e.to_string())),
        Err(e @ LookupError::NotFound(_)) => Err(not_found_error(&e.to_string(), &application_id)),
    }
}

async fn refresh_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> ApiResult<TrackResponse> {
    let Some(record) = find_record(&application_id) else {
        return Err(not_found_error(
            &LookupError::NotFound(application_id.clone()).to_string(),
            &application_id,
        ));
    };

    let toasts = ToastBuffer::new();
    let record = lookup_for_request(&state, &toasts).refresh(record).await;
    Ok(Json(TrackResponse {
        status_label: record.status_label(),
        report: EligibilityReport::for_record(&record),
        record,
        toasts: toasts.drain(),
    }))
}

async fn track_action(
    Path(application_id): Path<String>,
    Json(request): Json<EligibilityActionRequest>,
) -> ApiResult<EligibilityActionResponse> {
    let Some(record) = find_record(&application_id) else {
        return Err(not_found_error(
            &LookupError::NotFound(application_id.clone()).to_string(),
            &application_id,
        ));
    };

    let toasts = ToastBuffer::new();
    EligibilityReport::for_record(&record)
        .take_action(request.action, CardOrigin::Tracking, &toasts)
        .map_err(|e| bad_request_error(&e.to_string()))?;
    info!(%application_id, action = ?request.action, "Tracked application follow-up taken");

    Ok(Json(EligibilityActionResponse {
        action: request.action,
        label: request.action.label(),
        toasts: toasts.drain(),
    }))
}

async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        counts: state.dashboard.counts(),
        recent: state.dashboard.recent(3).to_vec(),
        applications: state.dashboard.applications().to_vec(),
    })
}

async fn get_theme(
    State(state): State<AppState>,
    Query(query): Query<ThemeQuery>,
) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        theme: state.theme.theme(),
        appearance: state.theme.resolve(query.system_prefers_dark),
    })
}

async fn set_theme(
    State(state): State<AppState>,
    Query(query): Query<ThemeQuery>,
    Json(request): Json<ThemeRequest>,
) -> Json<ThemeResponse> {
    state.theme.set_theme(request.theme);
    Json(ThemeResponse {
        theme: request.theme,
        appearance: state.theme.resolve(query.system_prefers_dark),
    })
}

async fn sign_out(State(state): State<AppState>) -> Json<Value> {
    state.auth.sign_out().await;
    Json(json!({ "status": "signed_out" }))
}
