//! Isolated environment for support desk integration tests.
//!
//! Provides a file-backed database in a temp directory, a scripted mail
//! source, and a local stand-in for the generation API.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;

use supportdesk::config::IdentifierFallback;
use supportdesk::email::{EmailError, FetchedMessage, MailSource};
use supportdesk::{Database, DraftGenerator, SupportDesk};

/// Mail source returning a fixed batch, or failing, on every call.
pub struct FakeMailSource {
    messages: Mutex<Vec<FetchedMessage>>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeMailSource {
    pub fn new(messages: Vec<FetchedMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the mailbox contents for subsequent fetches.
    pub fn set_messages(&self, messages: Vec<FetchedMessage>) {
        *self.messages.lock().unwrap() = messages;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailSource for FakeMailSource {
    async fn fetch_all(&self) -> Result<Vec<FetchedMessage>, EmailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent cycles a chance to interleave.
        tokio::task::yield_now().await;
        if self.fail {
            return Err(EmailError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(self.messages.lock().unwrap().clone())
    }
}

/// A request the stub API received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub call: String,
    pub query: Option<String>,
    pub body: Value,
}

struct StubState {
    status: StatusCode,
    response: Value,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local HTTP server answering every `generateContent` call with a fixed
/// status and JSON body.
pub struct StubGenerationApi {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubGenerationApi {
    pub async fn start(status: StatusCode, response: Value) -> Self {
        let state = Arc::new(StubState {
            status,
            response,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/models/{call}", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub API");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Answers with a well-formed response carrying `text`.
    pub async fn replying(text: &str) -> Self {
        Self::start(
            StatusCode::OK,
            serde_json::json!({
                "candidates": [
                    { "content": { "role": "model", "parts": [ { "text": text } ] } }
                ]
            }),
        )
        .await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle_generate(
    State(state): State<Arc<StubState>>,
    Path(call): Path<String>,
    RawQuery(query): RawQuery,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { call, query, body });
    (state.status, Json(state.response.clone()))
}

/// Temp directory plus a file-backed database inside it.
pub struct TestHarness {
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("supportdesk.db");
        let db = Database::open(&db_path).expect("Failed to open database");
        Self {
            temp_dir,
            db_path,
            db,
        }
    }

    /// Opens a second handle on the same database file.
    pub fn reopen(&self) -> Database {
        Database::open(&self.db_path).expect("Failed to reopen database")
    }

    /// A desk with draft generation disabled.
    pub fn desk(&self) -> SupportDesk {
        let drafts = DraftGenerator::new("http://127.0.0.1:9", "test-model", None, Duration::from_secs(2))
            .expect("draft generator");
        SupportDesk::new(self.db.clone(), drafts)
    }

    pub fn desk_with_source(&self, source: Arc<FakeMailSource>) -> SupportDesk {
        self.desk()
            .with_mail_source(source, IdentifierFallback::Derived)
    }

    /// A desk whose drafts go to `api`.
    pub fn desk_with_api(&self, api: &StubGenerationApi) -> SupportDesk {
        let drafts = DraftGenerator::new(
            api.base_url.clone(),
            "test-model",
            Some(SecretString::from("test-key".to_string())),
            Duration::from_secs(5),
        )
        .expect("draft generator");
        SupportDesk::new(self.db.clone(), drafts)
    }
}
