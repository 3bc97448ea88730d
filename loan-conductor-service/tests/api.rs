use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use loan_conductor_service::{
    AppConfig, AppDependencies, AppState, build_router,
    auth::{StaticAuthProvider, User},
    config::Timings,
    media::SyntheticDevices,
};

fn app_with_user(user: Option<&str>) -> Router {
    let config = AppConfig {
        timings: Timings::instant(),
        ..AppConfig::default()
    };
    let mut deps = AppDependencies::from_config(&config);
    deps.devices = Arc::new(SyntheticDevices::new(true));
    deps.auth = Arc::new(StaticAuthProvider::new(user.map(|id| User {
        id: id.to_string(),
        email: None,
    })));
    build_router(AppState::new(config, deps).unwrap())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Verification lands from a background task; poll until the response shows up.
async fn wait_for_response(app: &Router, session_id: &str, step_id: &str) -> Value {
    for _ in 0..100 {
        let (_, body) = call(app, Method::GET, &format!("/applications/{session_id}"), None).await;
        let response = &body["application"]["responses"][step_id];
        if !response.is_null() {
            return response.clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no response recorded for {step_id}");
}

fn png_upload() -> Value {
    json!({
        "file_name": "document.png",
        "media_type": "image/png",
        "data": STANDARD.encode([0x89, b'P', b'N', b'G'])
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = app_with_user(None);

    let (status, body) = call(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn applications_require_sign_in() {
    let app = app_with_user(None);

    let (status, body) = call(&app, Method::POST, "/applications", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not authenticated");
}

#[tokio::test]
async fn sign_out_closes_protected_routes() {
    let app = app_with_user(Some("user-1"));
    let (status, _) = call(&app, Method::GET, "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);

    call(&app, Method::POST, "/auth/sign-out", None).await;

    let (status, _) = call(&app, Method::GET, "/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_application_flow() {
    let app = app_with_user(Some("user-1"));

    let (status, body) = call(&app, Method::POST, "/applications", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["application"]["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["application"]["step"]["id"], "welcome");

    let (_, body) = call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    assert_eq!(body["application"]["step"]["id"], "loan-amount");

    // Blocked until a video is recorded.
    let (_, body) = call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    assert_eq!(body["status"]["state"], "blocked");
    assert_eq!(body["application"]["step_index"], 1);

    for _ in 0..2 {
        let (_, body) = call(&app, Method::POST, &format!("/applications/{id}/recording/start"), None).await;
        assert_eq!(body["start"], "started");
        let (_, body) = call(&app, Method::POST, &format!("/applications/{id}/recording/stop"), None).await;
        assert_eq!(body["toasts"][0]["message"], "Video response recorded successfully");
        call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    }

    for step in ["id-verification", "income-proof"] {
        let (status, body) = call(&app, Method::POST, &format!("/applications/{id}/documents"), Some(png_upload())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step_id"], step);
        wait_for_response(&app, &id, step).await;
        call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    }

    let (_, body) = call(&app, Method::GET, &format!("/applications/{id}"), None).await;
    assert_eq!(body["application"]["step"]["id"], "review");
    assert_eq!(body["application"]["percentage"], 100.0);
    assert_eq!(body["application"]["submitted"], false);

    let (_, body) = call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    assert_eq!(body["application"]["submitted"], true);
    let outcome = body["application"]["outcome"].as_str().unwrap().to_string();
    assert!(["approved", "rejected", "more-info"].contains(&outcome.as_str()));

    let (status, body) = call(&app, Method::GET, &format!("/applications/{id}/eligibility"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["status"], outcome);

    let action = body["report"]["action"].clone();
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/applications/{id}/eligibility/action"),
        Some(json!({ "action": action })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let expected = match outcome.as_str() {
        "approved" => "Proceeding to loan disbursement",
        "rejected" => "Appeal submitted. We'll review your case.",
        _ => "Redirecting to document upload...",
    };
    assert_eq!(body["toasts"][0]["message"], expected);
}

#[tokio::test]
async fn eligibility_action_needs_a_submitted_application() {
    let app = app_with_user(Some("user-1"));
    let (_, body) = call(&app, Method::POST, "/applications", None).await;
    let id = body["application"]["session_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/applications/{id}/eligibility/action"),
        Some(json!({ "action": "appeal_decision" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Application has not been submitted yet");
}

#[tokio::test]
async fn documents_only_on_document_steps() {
    let app = app_with_user(Some("user-1"));
    let (_, body) = call(&app, Method::POST, "/applications", None).await;
    let id = body["application"]["session_id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::POST, &format!("/applications/{id}/documents"), Some(png_upload())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The current step does not take a document");
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = app_with_user(Some("user-1"));
    let (_, body) = call(&app, Method::POST, "/applications", None).await;
    let id = body["application"]["session_id"].as_str().unwrap().to_string();
    call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    for _ in 0..2 {
        call(&app, Method::POST, &format!("/applications/{id}/recording/start"), None).await;
        call(&app, Method::POST, &format!("/applications/{id}/recording/stop"), None).await;
        call(&app, Method::POST, &format!("/applications/{id}/advance"), None).await;
    }

    let upload = json!({
        "file_name": "aadhaar.pdf",
        "media_type": "application/pdf",
        "data": STANDARD.encode(b"%PDF")
    });
    let (status, body) = call(&app, Method::POST, &format!("/applications/{id}/documents"), Some(upload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please upload an image file (JPEG, PNG)");
    let (_, body) = call(&app, Method::GET, &format!("/applications/{id}"), None).await;
    assert_eq!(body["application"]["step"]["id"], "id-verification");
    assert!(body["application"]["responses"]["id-verification"].is_null());
}

#[tokio::test]
async fn discarded_application_is_gone() {
    let app = app_with_user(Some("user-1"));
    let (_, body) = call(&app, Method::POST, "/applications", None).await;
    let id = body["application"]["session_id"].as_str().unwrap().to_string();

    let (status, _) = call(&app, Method::DELETE, &format!("/applications/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, &format!("/applications/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tracking_known_and_unknown_applications() {
    let app = app_with_user(Some("user-1"));

    let (status, body) = call(&app, Method::GET, "/track/LOAN123456", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["status"], "approved");
    assert_eq!(body["record"]["loan_amount"], 500000);
    assert_eq!(body["report"]["action"], "continue_to_disbursement");

    let (status, body) = call(&app, Method::GET, "/track/LOAN000000", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Application not found. Please check the ID and try again.");

    let (_, body) = call(&app, Method::POST, "/track/LOAN345678/refresh", None).await;
    assert_eq!(body["toasts"][0]["message"], "Application status updated");
}

#[tokio::test]
async fn tracked_application_actions() {
    let app = app_with_user(Some("user-1"));

    let continue_action = json!({ "action": "continue_to_disbursement" });
    let (status, body) = call(&app, Method::POST, "/track/LOAN123456/action", Some(continue_action)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "Continue to Disbursement");
    assert_eq!(body["toasts"][0]["severity"], "success");
    assert_eq!(body["toasts"][0]["message"], "Proceeding to next steps...");

    let appeal = json!({ "action": "appeal_decision" });
    let (_, body) = call(&app, Method::POST, "/track/LOAN654321/action", Some(appeal.clone())).await;
    assert_eq!(body["toasts"][0]["severity"], "info");
    assert_eq!(body["toasts"][0]["message"], "Appeal submitted. We'll review your case.");

    let (status, body) = call(&app, Method::POST, "/track/LOAN345678/action", Some(appeal.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Appeal Decision is not available for this application");

    let (status, _) = call(&app, Method::POST, "/track/LOAN000000/action", Some(appeal)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_counts() {
    let app = app_with_user(Some("user-1"));

    let (_, body) = call(&app, Method::GET, "/dashboard", None).await;

    assert_eq!(body["counts"]["total"], 4);
    assert_eq!(body["counts"]["pending"], 2);
    assert_eq!(body["recent"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn theme_preference_round_trip() {
    let app = app_with_user(None);

    let (_, body) = call(&app, Method::GET, "/preferences/theme?system_prefers_dark=true", None).await;
    assert_eq!(body["theme"], "system");
    assert_eq!(body["appearance"], "dark");

    let (status, _) = call(&app, Method::PUT, "/preferences/theme", Some(json!({ "theme": "light" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, "/preferences/theme", None).await;
    assert_eq!(body["theme"], "light");
    assert_eq!(body["appearance"], "light");
}

#[tokio::test]
async fn setting_system_theme_honours_dark_preference() {
    let app = app_with_user(None);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/preferences/theme?system_prefers_dark=true",
        Some(json!({ "theme": "system" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["theme"], "system");
    assert_eq!(body["appearance"], "dark");
}
