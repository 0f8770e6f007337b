//! HTTP surface
//!
//! Every subject-scoped route is forwarded to the subject's shard; the JSON
//! bodies use the same camelCase property names as the core types.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use pawtrack_core::{ActivityEvent, AnomalyAlert, DailyTotals, EventId, StoreError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics;
use crate::shard::{PoolError, ShardPool};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub pool: ShardPool,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
            Self::NotFound(e) => (StatusCode::NOT_FOUND, e),
            Self::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<PoolError> for ApiError {
    fn from(e: PoolError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownEvent(_) => Self::NotFound(e.to_string()),
            StoreError::SubjectMismatch { .. } => Self::BadRequest(e.to_string()),
        }
    }
}

// ============================================================================
// SIMD-JSON EXTRACTOR
// ============================================================================

/// JSON body parsed with simd-json
pub struct SimdJson<T>(pub T);

impl<T, S> FromRequest<S> for SimdJson<T>
where
    T: for<'de> Deserialize<'de> + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| e.into_response())?;
        let mut buf = bytes.to_vec();

        let val = simd_json::from_slice::<T>(&mut buf)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)).into_response())?;

        Ok(SimdJson(val))
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAccepted {
    pub event_id: EventId,
    pub alerts: Vec<AnomalyAlert>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evicted {
    pub evicted: bool,
}

/// Fill a missing subject from the path, reject a conflicting one
fn bind_subject(subject_id: &str, mut event: ActivityEvent) -> Result<ActivityEvent, ApiError> {
    if subject_id.is_empty() {
        return Err(ApiError::BadRequest("Subject id must not be empty".into()));
    }
    if event.subject_id.is_empty() {
        event.subject_id = subject_id.to_string();
    } else if event.subject_id != subject_id {
        return Err(ApiError::BadRequest(format!(
            "Body subjectId '{}' does not match path '{}'",
            event.subject_id, subject_id
        )));
    }
    Ok(event)
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn add_event(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
    SimdJson(event): SimdJson<ActivityEvent>,
) -> Result<(StatusCode, Json<EventAccepted>), ApiError> {
    let event = bind_subject(&subject_id, event)?;
    let (event_id, alerts) = state.pool.add_event(event).await?;
    Ok((StatusCode::CREATED, Json(EventAccepted { event_id, alerts })))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path((subject_id, event_id)): Path<(String, Uuid)>,
    SimdJson(event): SimdJson<ActivityEvent>,
) -> Result<Json<Vec<AnomalyAlert>>, ApiError> {
    let event = bind_subject(&subject_id, event)?;
    let alerts = state.pool.update_event(EventId(event_id), event).await??;
    Ok(Json(alerts))
}

pub async fn remove_event(
    State(state): State<AppState>,
    Path((subject_id, event_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<AnomalyAlert>>, ApiError> {
    let alerts = state
        .pool
        .remove_event(&subject_id, EventId(event_id))
        .await??;
    Ok(Json(alerts))
}

pub async fn recompute(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<AnomalyAlert>>, ApiError> {
    Ok(Json(state.pool.recompute(&subject_id).await?))
}

pub async fn get_anomalies(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<AnomalyAlert>>, ApiError> {
    Ok(Json(state.pool.anomalies(&subject_id).await?))
}

pub async fn evict_anomalies(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Evicted>, ApiError> {
    let evicted = state.pool.evict(&subject_id).await?;
    Ok(Json(Evicted { evicted }))
}

pub async fn daily_totals(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<DailyTotals>>, ApiError> {
    Ok(Json(state.pool.daily_totals(&subject_id).await?))
}

async fn metrics_handler() -> String {
    metrics::render()
}

async fn health_handler() -> &'static str {
    "OK"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/subjects/{id}/events", post(add_event))
        .route(
            "/subjects/{id}/events/{event_id}",
            put(update_event).delete(remove_event),
        )
        .route("/subjects/{id}/anomalies:recompute", post(recompute))
        .route(
            "/subjects/{id}/anomalies",
            get(get_anomalies).delete(evict_anomalies),
        )
        .route("/subjects/{id}/daily", get(daily_totals))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Route table for startup logging
pub fn routes() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("POST", "/subjects/{id}/events", "Add an activity event"),
        ("PUT", "/subjects/{id}/events/{event_id}", "Edit an event"),
        ("DELETE", "/subjects/{id}/events/{event_id}", "Remove an event"),
        ("POST", "/subjects/{id}/anomalies:recompute", "Recompute alerts"),
        ("GET", "/subjects/{id}/anomalies", "Last computed alerts"),
        ("DELETE", "/subjects/{id}/anomalies", "Evict cached alerts"),
        ("GET", "/subjects/{id}/daily", "Daily totals window"),
        ("GET", "/metrics", "Prometheus metrics"),
        ("GET", "/health", "Health check"),
    ]
}
