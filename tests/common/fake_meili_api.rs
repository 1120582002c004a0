//! Fake Meilisearch search API for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Serves `POST /indexes/{uid}/search` with whatever answer was
//! configured last, and records every request body and `Authorization`
//! header so tests can assert on the wire format.
//!
//! # Example
//!
//! ```rust,no_run
//! use common::fake_meili_api::FakeMeiliApi;
//!
//! let api = FakeMeiliApi::start().await.unwrap();
//! api.respond(200, meili_answer(&[1, 2])).await;
//!
//! // Point MeiliIndex at api.base_url()
//! let url = api.base_url();
//! ```

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A request the fake server received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub uid: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

struct ApiState {
    status: u16,
    /// Raw response text so tests can also serve malformed JSON.
    answer: String,
    requests: Vec<RecordedRequest>,
}

/// Handle to the running fake search API.
pub struct FakeMeiliApi {
    addr: SocketAddr,
    state: Arc<Mutex<ApiState>>,
}

impl FakeMeiliApi {
    /// Start on a random port; answers `{"hits": []}` until told otherwise.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ApiState {
            status: 200,
            answer: r#"{"hits":[],"processingTimeMs":0}"#.to_string(),
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/indexes/{uid}/search", post(search))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self { addr, state })
    }

    /// Base URL for the API (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer every following search with `status` and a JSON body.
    pub async fn respond(&self, status: u16, body: serde_json::Value) {
        self.respond_raw(status, body.to_string()).await;
    }

    /// Answer every following search with `status` and a raw body.
    pub async fn respond_raw(&self, status: u16, body: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.status = status;
        state.answer = body.into();
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn search(
    Path(uid): Path<String>,
    State(state): State<Arc<Mutex<ApiState>>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<serde_json::Value>,
) -> impl IntoResponse {
    let mut state = state.lock().await;
    state.requests.push(RecordedRequest {
        uid,
        authorization: headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let status = StatusCode::from_u16(state.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.answer.clone(),
    )
}
