//! Drone Telemetry API Server
//!
//! HTTP/JSON transport for the telemetry session protocol: start a session,
//! push samples, end the session.

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use sample_validator::RawSample;
use serde::de::DeserializeOwned;
use serde::Serialize;
use session::{
    ChannelObserver, EventBus, LogObserver, ServiceFault, ServiceResponse, SessionController,
    SessionEvent, SessionStatus,
};
use std::sync::Arc;
use storage::{CsvSink, MemorySink, PersistenceSink};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
pub mod events;
pub mod settings;

pub use error::ApiError;
pub use events::{EventLog, EventQuery, EventResponse};
pub use settings::{ServiceConfig, StorageBackend};

/// Application state shared across handlers
pub struct AppState {
    /// Session controller
    pub controller: Arc<SessionController>,
    /// Recent session events
    pub events: Arc<EventLog>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(controller: Arc<SessionController>, events: Arc<EventLog>) -> Self {
        Self {
            controller,
            events,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Build the controller described by `config`
    ///
    /// The returned receiver carries the controller's events and should be
    /// handed to [`EventLog::drain`].
    pub fn from_config(config: &ServiceConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let sink: Arc<dyn PersistenceSink> = match config.storage.backend {
            StorageBackend::Csv => Arc::new(CsvSink::new(
                config.storage.session_path.clone(),
                config.storage.rejects_path.clone(),
            )),
            StorageBackend::Memory => Arc::new(MemorySink::new()),
        };
        let capacity = config.server.event_buffer.max(1);
        let (observer, rx) = ChannelObserver::channel(capacity);
        let bus = EventBus::new()
            .with(Arc::new(LogObserver))
            .with(Arc::new(observer));
        let controller = SessionController::new(config.session.clone(), sink, bus);
        let state = Self::new(Arc::new(controller), Arc::new(EventLog::new(capacity)));
        (state, rx)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub session: SessionHealth,
}

/// Session summary
#[derive(Debug, Serialize)]
pub struct SessionHealth {
    pub status: SessionStatus,
    pub accepted_samples: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/session/start", post(start_handler))
        .route("/api/v1/session/samples", post(push_handler))
        .route("/api/v1/session/end", post(end_handler))
        .route("/api/v1/session/events", get(events_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Decode an optional JSON body; an empty body or `null` means "nothing sent"
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(body).map_err(|e| e.to_string())
}

/// Run a session operation on the blocking pool; sinks write files under
/// the session lock
async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&SessionController) -> T + Send + 'static,
    T: Send + 'static,
{
    let controller = state.controller.clone();
    tokio::task::spawn_blocking(move || op(&controller))
        .await
        .map_err(|e| ApiError::Internal(format!("Session task failed: {}", e)))
}

async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ServiceResponse>, ApiError> {
    let meta: Option<RawSample> =
        decode_body(&body).map_err(|reason| ServiceFault::DataFormat {
            field: None,
            message: format!("Malformed request body: {}", reason),
        })?;
    let response = run_blocking(&state, move |c| c.start_session(meta.as_ref())).await??;
    Ok(Json(response))
}

async fn push_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ServiceResponse>, ApiError> {
    let decoded = decode_body::<RawSample>(&body);
    let response = run_blocking(&state, move |c| match decoded {
        Ok(sample) => c.push_sample(sample.as_ref()),
        Err(reason) => c.push_undecodable(&reason),
    })
    .await??;
    Ok(Json(response))
}

async fn end_handler(State(state): State<Arc<AppState>>) -> Result<Json<ServiceResponse>, ApiError> {
    let response = run_blocking(&state, |c| c.end_session()).await?;
    Ok(Json(response))
}

async fn events_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventQuery>,
) -> Json<EventResponse> {
    let data = state.events.recent(params.limit).await;
    Json(EventResponse {
        count: data.len(),
        data,
    })
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        session: SessionHealth {
            status: state.controller.status(),
            accepted_samples: state.controller.accepted_count(),
        },
    })
}

/// Initialize logging
pub fn init_logging(level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run the server
pub async fn run_server(config: &ServiceConfig) -> anyhow::Result<()> {
    let (state, rx) = AppState::from_config(config);
    let state = Arc::new(state);
    tokio::spawn(state.events.clone().drain(rx));
    let app = create_router(state);

    info!("Starting telemetry service on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use session::SessionConfig;
    use tower::ServiceExt;

    fn router() -> (Router, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let controller = SessionController::new(SessionConfig::default(), sink.clone(), EventBus::new());
        let state = Arc::new(AppState::new(Arc::new(controller), Arc::new(EventLog::new(16))));
        (create_router(state), sink)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn meta() -> String {
        json!({
            "linear_acceleration_x": 0.0,
            "linear_acceleration_y": 0.0,
            "linear_acceleration_z": 9.8,
            "wind_speed": 5.0,
            "wind_angle": 200.0,
            "time": 0.0
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_session_over_http() {
        let (app, sink) = router();

        let (status, body) = post(&app, "/api/v1/session/start", &meta()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "ACK");
        assert_eq!(body["status"], "IN_PROGRESS");

        let (status, body) = post(&app, "/api/v1/session/samples", &meta()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "ACK");

        let (status, body) = post(&app, "/api/v1/session/end", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(sink.last_session().map(|s| s.len()), Some(1));
    }

    #[tokio::test]
    async fn test_push_without_session() {
        let (app, _) = router();
        let (status, body) = post(&app, "/api/v1/session/samples", "null").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "NACK");
        assert_eq!(body["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn test_faults_map_to_status_codes() {
        let (app, sink) = router();
        post(&app, "/api/v1/session/start", &meta()).await;

        let (status, body) = post(&app, "/api/v1/session/samples", "null").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fault"], "DATA_FORMAT");

        let (status, body) = post(&app, "/api/v1/session/samples", r#"{"wind_speed": "fast"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fault"], "DATA_FORMAT");

        let mut sample: Value = serde_json::from_str(&meta()).unwrap();
        sample["linear_acceleration_y"] = json!(4.0);
        let (status, body) = post(&app, "/api/v1/session/samples", &sample.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fault"], "VALIDATION");
        assert_eq!(body["field"], "linear_acceleration_y");

        // every rejected body reaches the reject log
        assert_eq!(sink.reject_count(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_sample_while_idle_is_nack() {
        let (app, sink) = router();
        let (status, body) =
            post(&app, "/api/v1/session/samples", r#"{"wind_speed":"fast"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "NACK");
        assert_eq!(body["status"], "COMPLETED");
        assert_eq!(sink.reject_count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_sample_is_logged() {
        let (app, sink) = router();
        post(&app, "/api/v1/session/start", &meta()).await;

        let (status, body) = post(&app, "/api/v1/session/samples", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fault"], "DATA_FORMAT");

        let rejects = sink.rejects();
        assert_eq!(rejects.len(), 1);
        assert!(rejects[0].sample.is_none());
        assert!(rejects[0].reason.starts_with("Malformed sample"));
    }

    #[tokio::test]
    async fn test_malformed_meta_is_data_format() {
        let (app, _) = router();
        let (status, body) = post(&app, "/api/v1/session/start", "[1, 2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fault"], "DATA_FORMAT");
    }

    #[tokio::test]
    async fn test_events_endpoint_reports_session() {
        let config = ServiceConfig {
            storage: settings::StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        };
        let (state, rx) = AppState::from_config(&config);
        let state = Arc::new(state);
        let drain = tokio::spawn(state.events.clone().drain(rx));
        let app = create_router(state.clone());

        post(&app, "/api/v1/session/start", &meta()).await;
        post(&app, "/api/v1/session/samples", &meta()).await;
        post(&app, "/api/v1/session/end", "").await;

        for _ in 0..100 {
            if state.events.recent(10).await.len() >= 3 {
                break;
            }
            tokio::task::yield_now().await;
        }

        let (status, body) = get_json(&app, "/api/v1/session/events?limit=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
        assert_eq!(body["data"][0]["event"], "transfer_started");
        assert_eq!(body["data"][1]["event"], "sample_received");
        assert_eq!(body["data"][2]["event"], "transfer_completed");

        let (_, body) = get_json(&app, "/api/v1/session/events?limit=1").await;
        assert_eq!(body["data"][0]["event"], "transfer_completed");
        drain.abort();
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router();
        let (status, body) = get_json(&app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["status"], "NOT_STARTED");
    }
}
