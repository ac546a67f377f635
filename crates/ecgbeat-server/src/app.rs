use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ecgbeat_lib::{
    io::EcgSource, pipeline::analyze_traced, record::ResultRecord, trace::TraceSink, EcgError,
    SignalAnalyzer,
};
use log::{error, info};
use serde_json::json;
use std::{path::PathBuf, sync::Arc};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<dyn SignalAnalyzer>,
    pub trace: Arc<dyn TraceSink>,
    pub sample_file: PathBuf,
}

impl AppState {
    pub fn new(
        analyzer: Arc<dyn SignalAnalyzer>,
        trace: Arc<dyn TraceSink>,
        sample_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            analyzer,
            trace,
            sample_file: sample_file.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ecg_process", post(ecg_process))
        .route("/ecg_sample", post(ecg_sample))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn ecg_process(State(state): State<AppState>, body: Bytes) -> Result<Json<ResultRecord>, ApiError> {
    info!("POST /ecg_process ({} bytes)", body.len());
    run(state, EcgSource::Json(body.to_vec())).await
}

async fn ecg_sample(State(state): State<AppState>) -> Result<Json<ResultRecord>, ApiError> {
    info!("POST /ecg_sample ({})", state.sample_file.display());
    let source = EcgSource::TsvFile(state.sample_file.clone());
    run(state, source).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Load and analyze off the async runtime; the pipeline is CPU bound.
async fn run(state: AppState, source: EcgSource) -> Result<Json<ResultRecord>, ApiError> {
    let result = tokio::task::spawn_blocking(move || {
        let samples = source.load()?;
        analyze_traced(state.analyzer.as_ref(), samples, state.trace.as_ref())
    })
    .await
    .map_err(|err| EcgError::Analysis(format!("analysis task aborted: {}", err)))??;
    Ok(Json(result))
}

/// Error body `{"error": message}`; 404 for a missing recording, 500 otherwise.
#[derive(Debug)]
pub struct ApiError(pub EcgError);

impl From<EcgError> for ApiError {
    fn from(err: EcgError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error!("request failed ({}): {}", status.as_u16(), self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Permissive CORS for browser front ends; preflights are answered directly.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    allow_any_origin(response.headers_mut());
    response
}

fn allow_any_origin(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
}
