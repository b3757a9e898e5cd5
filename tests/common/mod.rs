#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use checkin_client::{
    adapters::http::HttpBackend,
    domain::{errors::DeviceError, models::ALREADY_REGISTERED, ports::CodeSource},
    telemetry,
};
use serde_json::{Value, json};

pub const SPREADSHEET: &[u8] = b"PK\x03\x04attendance-sheet";
pub const SLOW_TOKEN: &str = "slow";

/// What the mock backend has received so far.
#[derive(Clone)]
pub struct MockBackend {
    verified: Arc<Mutex<Vec<String>>>,
    registered: Arc<Mutex<Vec<Value>>>,
    deleted: Arc<Mutex<Vec<Value>>>,
    export_available: Arc<AtomicBool>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            verified: Arc::default(),
            registered: Arc::default(),
            deleted: Arc::default(),
            export_available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn verify_calls(&self) -> Vec<String> {
        self.verified.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> Vec<Value> {
        self.registered.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<Value> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn set_export_available(&self, available: bool) {
        self.export_available.store(available, Ordering::SeqCst);
    }
}

fn ada() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@x.com",
        "eventName": "Conf2024",
        "phoneNumber": "+234 800 000 0000",
        "ticketType": "VIP",
    })
}

async fn verify(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let token = params.get("token").cloned().unwrap_or_default();
    backend.verified.lock().unwrap().push(token.clone());

    match token.as_str() {
        "expired" => Json(json!({"success": false, "error": "Token expired"})).into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        "unknown" => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "Attendee not found"})),
        )
            .into_response(),
        token => {
            if token == SLOW_TOKEN {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            Json(json!({
                "success": true,
                "message": "Ticket confirmed. Welcome!",
                "attendee": ada(),
            }))
            .into_response()
        }
    }
}

async fn generate_qr(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    backend.registered.lock().unwrap().push(body.clone());

    if body["phoneNumber"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "Phone number is required"})),
        )
            .into_response();
    }

    let message = (body["name"] == "Existing Attendee").then_some(ALREADY_REGISTERED);
    Json(json!({
        "success": true,
        "data": {
            "qrCode": "data:image/png;base64,iVBORw0KGgo=",
            "attendeeDetails": {
                "name": body["name"],
                "email": body["email"],
                "phoneNumber": body["phoneNumber"],
            },
            "verificationUrl": "https://tickets.example.org/verify?token=abc123",
            "message": message,
        }
    }))
    .into_response()
}

async fn export_attendance(State(backend): State<MockBackend>) -> Response {
    if !backend.export_available.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again later").into_response();
    }
    (
        [(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )],
        SPREADSHEET,
    )
        .into_response()
}

async fn delete_attendee(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    backend.deleted.lock().unwrap().push(body.clone());

    match body["name"].as_str() {
        Some("Ghost") => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "error": "Attendee not found"})),
        )
            .into_response(),
        Some("Quiet") => Json(json!({"success": true})).into_response(),
        _ => Json(json!({"success": true, "message": "Attendee removed"})).into_response(),
    }
}

// Helper function to spawn a mock backend on a random port
pub async fn spawn_backend() -> (String, MockBackend) {
    telemetry::init_tracing();

    let backend = MockBackend::new();
    let app = Router::new()
        .route("/api/verify", get(verify))
        .route("/api/generate-qr", post(generate_qr))
        .route("/api/export-attendance", get(export_attendance))
        .route("/api/delete-attendee", delete(delete_attendee))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("failed to run backend");
    });

    (format!("http://{addr}"), backend)
}

/// A base URL nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn client(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(5)).unwrap()
}

/// Replays a fixed list of decode passes.
pub struct ScriptedSource(VecDeque<Result<Vec<String>, DeviceError>>);

impl ScriptedSource {
    pub fn new(batches: &[&[&str]]) -> Self {
        Self(
            batches
                .iter()
                .map(|batch| Ok(batch.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    pub fn remaining(&self) -> usize {
        self.0.len()
    }
}

#[async_trait]
impl CodeSource for ScriptedSource {
    async fn next_batch(&mut self) -> Option<Result<Vec<String>, DeviceError>> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.0.pop_front()
    }
}
