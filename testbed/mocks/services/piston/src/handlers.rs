use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::fixtures::{ExecutionFixture, ProgramOutcome};

const LIMIT_KEYS: [&str; 6] = [
    "compile_timeout",
    "run_timeout",
    "compile_cpu_time",
    "run_cpu_time",
    "compile_memory_limit",
    "run_memory_limit",
];

/// A request as the mock received it
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

pub struct MockState {
    fixture: ExecutionFixture,
    rate_limited: AtomicU32,
    raw_next: Mutex<Option<String>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    pub fn new(fixture: ExecutionFixture) -> Self {
        Self {
            fixture,
            rate_limited: AtomicU32::new(0),
            raw_next: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer the next `count` API requests with 429
    pub fn rate_limit_next(&self, count: u32) {
        self.rate_limited.store(count, Ordering::SeqCst);
    }

    /// Answer the next API request with 200 and `body` as plain text
    pub fn respond_raw_next(&self, body: &str) {
        *self
            .raw_next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, method: &str, path: &str, body: Option<Value>) {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedRequest {
                method: method.to_string(),
                path: path.to_string(),
                body,
            });
    }

    /// Response overriding the normal handler, if one is queued
    fn take_override(&self) -> Option<Response> {
        if self.take_rate_limit() {
            return Some(too_many_requests());
        }
        self.raw_next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .map(|body| (StatusCode::OK, body).into_response())
    }

    fn take_rate_limit(&self) -> bool {
        self.rate_limited
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok()
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
}

fn too_many_requests() -> Response {
    tracing::info!("Rate limiting request");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "message": "Requests exceeded" })),
    )
        .into_response()
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "piston-mock"
    }))
}

pub async fn list_runtimes(State(state): State<Arc<MockState>>) -> Response {
    state.record("GET", "/runtimes", None);
    if let Some(response) = state.take_override() {
        return response;
    }

    let runtimes: Vec<Value> = state
        .fixture
        .runtimes
        .iter()
        .map(|runtime| runtime.to_json())
        .collect();
    Json(Value::Array(runtimes)).into_response()
}

pub async fn execute(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record("POST", "/execute", Some(body.clone()));
    if let Some(response) = state.take_override() {
        return response;
    }

    let Some(language) = body["language"].as_str() else {
        return bad_request("language is required as a string".to_string());
    };
    let Some(version) = body["version"].as_str() else {
        return bad_request("version is required as a string".to_string());
    };
    let Some(files) = body["files"].as_array() else {
        return bad_request("files is required as an array".to_string());
    };
    for (i, file) in files.iter().enumerate() {
        if !file["content"].is_string() {
            return bad_request(format!("files[{}].content is required as a string", i));
        }
    }

    let Some(runtime) = state.fixture.find_runtime(language, version) else {
        return bad_request(format!("{}-{} runtime is unknown", language, version));
    };

    let utf8_files = files
        .iter()
        .filter(|file| matches!(file["encoding"].as_str(), None | Some("utf8")))
        .count();
    if utf8_files == 0 {
        return bad_request("files must include at least one utf8 encoded file".to_string());
    }

    for key in LIMIT_KEYS {
        if !body[key].is_null() && !body[key].is_i64() {
            return bad_request(format!("{} must be a number", key));
        }
    }

    let source = entry_source(&files[0]);
    let stdin = body["stdin"].as_str().unwrap_or_default();
    let outcome = state.fixture.outcome_for(&source, stdin);
    tracing::info!("Executing {}-{}", runtime.language, runtime.version);

    let mut response = json!({
        "language": runtime.language,
        "version": runtime.version,
    });

    if runtime.compiled {
        if let Some(diagnostics) = &outcome.compile_error {
            response["compile"] = step_json("", diagnostics, Some(1), None);
            response["run"] = step_json("", "", None, None);
            return Json(response).into_response();
        }
        response["compile"] = step_json("", "", Some(0), None);
    }

    response["run"] = run_step(&outcome);
    Json(response).into_response()
}

fn entry_source(file: &Value) -> String {
    let content = file["content"].as_str().unwrap_or_default();
    match file["encoding"].as_str() {
        Some("base64") => base64::engine::general_purpose::STANDARD
            .decode(content)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| content.to_string()),
        _ => content.to_string(),
    }
}

fn run_step(outcome: &ProgramOutcome) -> Value {
    match &outcome.signal {
        Some(signal) => step_json(&outcome.stdout, &outcome.stderr, None, Some(signal)),
        None => step_json(&outcome.stdout, &outcome.stderr, Some(outcome.code), None),
    }
}

/// Step details; `message` and `status` only appear on abnormal exits
fn step_json(stdout: &str, stderr: &str, code: Option<i64>, signal: Option<&str>) -> Value {
    let mut step = json!({
        "stdout": stdout,
        "stderr": stderr,
        "output": format!("{}{}", stdout, stderr),
        "code": code,
        "signal": signal,
        "cpu_time": 8,
        "wall_time": 24,
        "memory": 8_192_000,
    });

    if signal.is_some() {
        step["status"] = json!("SG");
    } else if let Some(code) = code.filter(|code| *code != 0) {
        step["status"] = json!("RE");
        step["message"] = json!(format!("Exited with error status {}", code));
    }

    step
}
