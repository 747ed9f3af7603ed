use super::*;
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use shared::error::ErrorCode;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Captured {
    Text(String),
    Upload {
        filename: String,
        mime_type: String,
        body: Vec<u8>,
    },
    Update {
        id: String,
        summary: String,
    },
    Delete(String),
}

#[derive(Clone, Default)]
struct ServerState {
    captured: Arc<Mutex<Vec<Captured>>>,
    auth_headers: Arc<Mutex<Vec<String>>>,
    list_success: bool,
}

impl ServerState {
    async fn record_auth(&self, headers: &HeaderMap) {
        if let Some(value) = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            self.auth_headers.lock().await.push(value.to_string());
        }
    }
}

fn stored_summary() -> Summary {
    Summary {
        id: SummaryId::from("65f0aa"),
        original_file_name: Some("lecture.pdf".to_string()),
        summary_text: Some("cells divide".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 45, 0).unwrap(),
    }
}

async fn handle_list(State(state): State<ServerState>, headers: HeaderMap) -> AxumResponse {
    state.record_auth(&headers).await;
    if !state.list_success {
        return Json(ListSummariesResponse {
            success: false,
            summaries: Vec::new(),
            message: Some("database unavailable".to_string()),
        })
        .into_response();
    }
    Json(ListSummariesResponse {
        success: true,
        summaries: vec![stored_summary()],
        message: None,
    })
    .into_response()
}

async fn handle_text(
    State(state): State<ServerState>,
    Json(payload): Json<CreateFromTextRequest>,
) -> Json<AckResponse> {
    state.captured.lock().await.push(Captured::Text(payload.text));
    Json(AckResponse::ok())
}

async fn handle_upload(
    State(state): State<ServerState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Json<AckResponse> {
    state.captured.lock().await.push(Captured::Upload {
        filename: query.filename,
        mime_type: query.mime_type,
        body: body.to_vec(),
    });
    Json(AckResponse::ok())
}

async fn handle_update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateSummaryRequest>,
) -> AxumResponse {
    if id == "locked" {
        return (
            StatusCode::CONFLICT,
            Json(AckResponse::failed("summary is being regenerated")),
        )
            .into_response();
    }
    state.captured.lock().await.push(Captured::Update {
        id,
        summary: payload.summary,
    });
    Json(AckResponse::ok()).into_response()
}

async fn handle_delete(State(state): State<ServerState>, Path(id): Path<String>) -> AxumResponse {
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, "summary not found")),
        )
            .into_response(),
        "refused" => Json(AckResponse::failed("cannot delete right now")).into_response(),
        _ => {
            state.captured.lock().await.push(Captured::Delete(id));
            Json(AckResponse::ok()).into_response()
        }
    }
}

async fn spawn_summary_server(list_success: bool) -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        list_success,
        ..ServerState::default()
    };
    let app = Router::new()
        .route("/api/summaries", get(handle_list))
        .route("/api/summaries/text", post(handle_text))
        .route("/api/summaries/upload", post(handle_upload))
        .route(
            "/api/summaries/:id",
            delete(handle_delete).put(handle_update),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api/"), state))
}

#[tokio::test]
async fn lists_summaries_with_bearer_token() {
    let (base_url, state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::with_options(
        &base_url,
        HttpStoreOptions {
            auth_token: Some("secret-token".to_string()),
            request_timeout: Some(Duration::from_secs(5)),
        },
    )
    .expect("store");

    let summaries = store.list_summaries().await.expect("list");

    assert_eq!(summaries, vec![stored_summary()]);
    assert_eq!(
        state.auth_headers.lock().await.as_slice(),
        ["Bearer secret-token".to_string()]
    );
}

#[tokio::test]
async fn unsuccessful_list_is_an_error() {
    let (base_url, _state) = spawn_summary_server(false).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    let err = store.list_summaries().await.expect_err("must fail");
    assert!(
        matches!(&err, StoreError::Unsuccessful { message, .. } if message == "database unavailable"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn create_from_text_posts_text_body() {
    let (base_url, state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    store.create_from_text("pasted notes").await.expect("create");

    assert_eq!(
        state.captured.lock().await.as_slice(),
        [Captured::Text("pasted notes".to_string())]
    );
}

#[tokio::test]
async fn create_from_file_sends_raw_bytes_with_metadata() {
    let (base_url, state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    store
        .create_from_file(FileUpload {
            filename: "My Paper.pdf".to_string(),
            mime_type: None,
            bytes: b"%PDF-1.7".to_vec(),
        })
        .await
        .expect("upload");

    assert_eq!(
        state.captured.lock().await.as_slice(),
        [Captured::Upload {
            filename: "My Paper.pdf".to_string(),
            mime_type: "application/octet-stream".to_string(),
            body: b"%PDF-1.7".to_vec(),
        }]
    );
}

#[tokio::test]
async fn update_puts_summary_text() {
    let (base_url, state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    store
        .update_summary(&SummaryId::from("65f0aa"), "<p>edited</p>")
        .await
        .expect("update");

    assert_eq!(
        state.captured.lock().await.as_slice(),
        [Captured::Update {
            id: "65f0aa".to_string(),
            summary: "<p>edited</p>".to_string(),
        }]
    );
}

#[tokio::test]
async fn rejected_update_carries_server_message() {
    let (base_url, _state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    let err = store
        .update_summary(&SummaryId::from("locked"), "text")
        .await
        .expect_err("must fail");

    assert!(
        matches!(&err, StoreError::Rejected { status: 409, message } if message == "summary is being regenerated"),
        "unexpected error: {err}"
    );
    assert!(!err.is_transport());
}

#[tokio::test]
async fn delete_maps_not_found_and_unsuccessful_responses() {
    let (base_url, state) = spawn_summary_server(true).await.expect("spawn server");
    let store = HttpSummaryStore::new(&base_url).expect("store");

    store
        .delete_summary(&SummaryId::from("65f0aa"))
        .await
        .expect("delete");
    assert_eq!(
        state.captured.lock().await.as_slice(),
        [Captured::Delete("65f0aa".to_string())]
    );

    let missing = store
        .delete_summary(&SummaryId::from("missing"))
        .await
        .expect_err("not found");
    assert!(missing.is_not_found());

    let refused = store
        .delete_summary(&SummaryId::from("refused"))
        .await
        .expect_err("unsuccessful");
    assert!(matches!(refused, StoreError::Unsuccessful { operation: "delete", .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = HttpSummaryStore::new(&format!("http://{addr}")).expect("store");
    let err = store.list_summaries().await.expect_err("refused");
    assert!(err.is_transport(), "unexpected error: {err}");
}

#[test]
fn base_url_must_be_http() {
    assert!(matches!(
        HttpSummaryStore::new("ftp://example.com"),
        Err(StoreError::InvalidBaseUrl { .. })
    ));
    assert!(HttpSummaryStore::new("not a url").is_err());

    let store = HttpSummaryStore::new(" https://api.example.com/v1/ ").expect("store");
    assert_eq!(store.base_url(), "https://api.example.com/v1");
}

#[test]
fn summary_ids_are_path_escaped() {
    let store = HttpSummaryStore::new("https://api.example.com/v1").expect("store");
    let url = store
        .summary_url(&SummaryId::from("a/b c"))
        .expect("url");
    assert_eq!(url, "https://api.example.com/v1/summaries/a%2Fb%20c");
}
