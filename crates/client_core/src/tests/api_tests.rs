use super::*;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    generate_bodies: Arc<Mutex<Vec<Value>>>,
    save_bodies: Arc<Mutex<Vec<Value>>>,
}

async fn list_styles() -> Json<Value> {
    Json(json!([
        { "_id": "s1", "name": "Casual", "overall_tone": "Informal" },
        { "_id": "s2", "name": "Formal" }
    ]))
}

async fn delete_style(Path(id): Path<String>) -> impl IntoResponse {
    if id == "s1" {
        (StatusCode::OK, Json(json!({ "message": "Style deleted successfully" })))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "Style not found" })))
    }
}

async fn list_drafts() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn save_draft(State(state): State<ServerState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.save_bodies.lock().await.push(body);
    (StatusCode::CREATED, Json(json!({ "draft_id": "d9", "message": "Draft saved successfully!" })))
}

async fn generate(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.generate_bodies.lock().await.push(body);
    Json(json!({ "generated_posts": ["first", "second"] }))
}

async fn slow_analyze() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({ "analysis": {}, "message": "late" }))
}

async fn spawn_backend() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/styles", get(list_styles))
        .route("/api/styles/:id", delete(delete_style))
        .route("/api/drafts", get(list_drafts).post(save_draft))
        .route("/api/generate-post", post(generate))
        .route("/api/analyze-style", post(slow_analyze))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn client_for(base_url: &str) -> HttpStudioApi {
    HttpStudioApi::new(&ClientSettings {
        api_base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(1),
    })
    .expect("client")
}

#[tokio::test]
async fn lists_styles_with_analysis_fields() {
    let (base_url, _) = spawn_backend().await.expect("spawn server");
    let api = client_for(&base_url);

    let styles = api.list_styles().await.expect("styles");

    assert_eq!(styles.len(), 2);
    assert_eq!(styles[0].id, StyleId::from("s1"));
    assert_eq!(
        styles[0].analysis.display_items(),
        vec![("Overall Tone", "Informal".to_string())]
    );
}

#[tokio::test]
async fn delete_surfaces_server_error_message() {
    let (base_url, _) = spawn_backend().await.expect("spawn server");
    let api = client_for(&base_url);

    api.delete_style(&StyleId::from("s1"))
        .await
        .expect("known style deletes");
    let err = api
        .delete_style(&StyleId::from("missing"))
        .await
        .expect_err("unknown style");

    assert_eq!(
        err,
        ClientError::Server {
            status: 404,
            message: "Style not found".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_status_message() {
    let (base_url, _) = spawn_backend().await.expect("spawn server");
    let api = client_for(&base_url);

    let err = api.list_drafts().await.expect_err("server error");

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn generate_sends_only_present_optionals() {
    let (base_url, state) = spawn_backend().await.expect("spawn server");
    let api = client_for(&base_url);

    let response = api
        .generate_posts(GeneratePostRequest {
            style_id: StyleId::from("s1"),
            topic: "Launch".to_string(),
            key_points: "point A".to_string(),
            cta: None,
            subjects_or_angles: Some(vec!["a".to_string(), "b".to_string()]),
        })
        .await
        .expect("generate");

    assert_eq!(
        response.generated_posts,
        Some(vec!["first".to_string(), "second".to_string()])
    );
    let bodies = state.generate_bodies.lock().await;
    assert_eq!(
        bodies.as_slice(),
        &[json!({
            "style_id": "s1",
            "topic": "Launch",
            "key_points": "point A",
            "subjects_or_angles": ["a", "b"]
        })]
    );
}

#[tokio::test]
async fn save_draft_returns_created_id() {
    let (base_url, state) = spawn_backend().await.expect("spawn server");
    let api = client_for(&format!("{base_url}/"));

    let saved = api
        .save_draft(SaveDraftRequest {
            draft_text: "Draft one text".to_string(),
            style_id: Some(StyleId::from("s1")),
            topic: Some("Launch".to_string()),
        })
        .await
        .expect("save");

    assert_eq!(saved.draft_id, DraftId::from("d9"));
    assert_eq!(
        state.save_bodies.lock().await.as_slice(),
        &[json!({ "draft_text": "Draft one text", "style_id": "s1", "topic": "Launch" })]
    );
}

#[tokio::test]
async fn hung_request_times_out_as_network_error() {
    let (base_url, _) = spawn_backend().await.expect("spawn server");
    let api = client_for(&base_url);

    let err = api
        .analyze_style(AnalyzeStyleRequest {
            posts_text: "x".repeat(120),
        })
        .await
        .expect_err("timeout");

    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = client_for(&format!("http://{addr}"));

    let err = api.list_styles().await.expect_err("connection refused");

    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new().route(
        "/api/generate-post",
        post(|| async { Json(json!({ "generated_posts": 5 })) }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    let api = client_for(&format!("http://{addr}"));

    let err = api
        .generate_posts(GeneratePostRequest {
            style_id: StyleId::from("s1"),
            topic: "Launch".to_string(),
            key_points: "point A".to_string(),
            cta: None,
            subjects_or_angles: None,
        })
        .await
        .expect_err("bad body");

    assert!(matches!(err, ClientError::Decode(_)), "unexpected error: {err:?}");
}
