//! HTTP request handlers
//!
//! Every response carries an RFC 3339 UTC `timestamp`. Announcement requests
//! only enqueue; the handler answers before anything is played.

use crate::api::server::AppContext;
use crate::playback::QueueStatus;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use qcall_common::api::{AnnouncementRequest, ApiResponse, ERROR_INVALID_REQUEST, ERROR_VALIDATION};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body that parsed but is missing required data
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the queue is not running
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub queue: QueueStatus,
}

type ApiResult = (StatusCode, Json<ApiResponse>);

/// Required fields must be non-blank.
pub fn validate_request(req: &AnnouncementRequest) -> Result<(), ValidationError> {
    let required = [
        ("queue_number", &req.queue_number),
        ("room_number", &req.room_number),
        ("ticket_id", &req.ticket_id),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
    }
    Ok(())
}

// ============================================================================
// Endpoints
// ============================================================================

/// GET / - liveness
pub async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "success" }))
}

/// POST /api/audio/announcement - queue an announcement
///
/// Answers 200 even when the queue drops the task; `queue_position` is the
/// pending count after the attempt.
pub async fn enqueue_announcement(
    State(ctx): State<AppContext>,
    payload: Result<Json<AnnouncementRequest>, JsonRejection>,
) -> ApiResult {
    let started = Instant::now();
    let _active = ctx.metrics.begin_request();
    let request_id = Uuid::new_v4();

    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            ctx.metrics.record_failure();
            warn!("[{}] Rejected announcement body: {}", request_id, rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    ERROR_INVALID_REQUEST,
                    format!("Invalid JSON: {}", rejection.body_text()),
                )),
            );
        }
    };

    if let Err(e) = validate_request(&req) {
        ctx.metrics.record_failure();
        warn!("[{}] Invalid announcement request: {}", request_id, e);
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(ERROR_VALIDATION, e.to_string())),
        );
    }

    ctx.queue.add_task(&req.queue_number, &req.room_number);
    let status = ctx.queue.get_status().await;
    ctx.metrics.record_success();

    info!(
        "[{}] Queued ticket {} for room {} (pending: {})",
        request_id, req.queue_number, req.room_number, status.pending_count
    );

    let data = json!({
        "request_id": request_id,
        "ticket_id": req.ticket_id,
        "queue_number": req.queue_number,
        "room_number": req.room_number,
        "department_name": req.department_name,
        "doctor_id": req.doctor_id,
        "response_time_ms": started.elapsed().as_millis() as u64,
        "queue_position": status.pending_count,
        "active_workers": status.worker_count,
        "total_requests": ctx.metrics.total_requests(),
    });

    (
        StatusCode::OK,
        Json(ApiResponse::success("Announcement accepted", data)),
    )
}

/// GET /api/audio/queue/status - queue snapshot, counters, request metrics
pub async fn queue_status(State(ctx): State<AppContext>) -> Json<ApiResponse> {
    let status = ctx.queue.get_status().await;

    Json(ApiResponse::success(
        "Queue status",
        json!({
            "queue": status,
            "stats": ctx.queue.stats(),
            "metrics": ctx.metrics.snapshot(),
        }),
    ))
}

/// POST /api/audio/queue/clear - discard pending announcements
pub async fn clear_queue(State(ctx): State<AppContext>) -> Json<ApiResponse> {
    let cleared = ctx.queue.clear().await;

    Json(ApiResponse::success(
        format!("Queue cleared, {} task(s) removed", cleared),
        json!({ "cleared_count": cleared }),
    ))
}

/// GET /api/audio/health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    let queue = ctx.queue.get_status().await;

    Json(HealthResponse {
        status: if queue.is_running { "healthy" } else { "degraded" },
        service: "qcall-ap",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: qcall_common::time::rfc3339_now(),
        uptime_seconds: ctx.metrics.uptime_seconds(),
        queue,
    })
}
