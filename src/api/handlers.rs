use crate::activity::{DEFAULT_ACTIVITY_LIMIT, recent_activity};
use crate::analytics::AnalyticsSession;
use crate::api::ApiContext;
use crate::api::responses::{
    ActivityItemResponse, ActivitySuccessResponse, AdviceSuccessResponse,
    AnalyticsSuccessResponse, ChartResponse, ChartsSuccessResponse, DetectionCreatedResponse,
    DetectionRemovedResponse, ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse,
    SelectionRequest, ViewStatus,
};
use crate::chart::{ChartSlice, health_slices, pie_shapes, species_slices};
use crate::event::DetectionEvent;
use crate::feed::memory::MemoryFeed;
use crate::labels::{LabelKind, advice_for, kind_of};
use crate::state::{AnalyticsView, AppState};
use crate::window::Period;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const DEFAULT_CHART_SIZE: f64 = 180.0;
const MAX_ACTIVITY_LIMIT: usize = 200;

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

fn ok<T>(body: T) -> ApiResponse<T> {
    ApiResponse::Success {
        status: StatusCode::OK,
        body,
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartsQuery {
    pub size: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
    pub kind: Option<LabelKind>,
}

pub async fn get_health(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_health_response(&ctx.state, OffsetDateTime::now_utc())
}

pub async fn get_analytics(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_analytics_response(&ctx.state)
}

pub async fn get_charts(
    State(ctx): State<ApiContext>,
    Query(query): Query<ChartsQuery>,
) -> impl IntoResponse {
    build_charts_response(&ctx.state, query.size, OffsetDateTime::now_utc())
}

pub async fn put_selection(
    State(ctx): State<ApiContext>,
    Json(request): Json<SelectionRequest>,
) -> impl IntoResponse {
    build_selection_response(&ctx.session, &ctx.state, request, OffsetDateTime::now_utc())
}

pub async fn post_detection(
    State(ctx): State<ApiContext>,
    Json(document): Json<Value>,
) -> impl IntoResponse {
    build_create_detection_response(&ctx.feed, &document, OffsetDateTime::now_utc())
}

pub async fn delete_detection(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    build_delete_detection_response(&ctx.feed, &id, OffsetDateTime::now_utc())
}

pub async fn get_activity(
    State(ctx): State<ApiContext>,
    Query(query): Query<ActivityQuery>,
) -> impl IntoResponse {
    build_activity_response(&ctx.state, &ctx.feed, query, OffsetDateTime::now_utc())
}

pub async fn get_label_advice(Path(label): Path<String>) -> impl IntoResponse {
    build_advice_response(label)
}

fn build_health_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<HealthSuccessResponse> {
    let device_linked = match state.read() {
        Ok(guard) => guard.selection().device_id.is_some(),
        Err(_) => return internal_error("/api/health", "state lock poisoned while reading selection"),
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure"),
    };

    let status = if device_linked {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    ok(HealthSuccessResponse {
        status,
        device_linked,
        timestamp,
    })
}

fn build_analytics_response(
    state: &Arc<RwLock<AppState>>,
) -> ApiResponse<AnalyticsSuccessResponse> {
    let (selection, update) = match state.read() {
        Ok(guard) => (guard.selection().clone(), guard.view().clone()),
        Err(_) => {
            return internal_error("/api/analytics", "state lock poisoned while reading view");
        }
    };

    let timestamp = match format_timestamp(update.updated_at) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/analytics", "timestamp formatting failure"),
    };

    let (status, result) = match update.view {
        AnalyticsView::Loading => (ViewStatus::Loading, None),
        AnalyticsView::NoDeviceLinked => (ViewStatus::NoDeviceLinked, None),
        AnalyticsView::Empty(result) => (ViewStatus::Empty, Some(result)),
        AnalyticsView::Ready(result) => (ViewStatus::Ready, Some(result)),
    };

    ok(AnalyticsSuccessResponse {
        status,
        device_id: selection.device_id,
        period: selection.period,
        result,
        timestamp,
    })
}

fn build_charts_response(
    state: &Arc<RwLock<AppState>>,
    size: Option<f64>,
    now: OffsetDateTime,
) -> ApiResponse<ChartsSuccessResponse> {
    let size = size.unwrap_or(DEFAULT_CHART_SIZE);
    if !size.is_finite() || size <= 0.0 {
        return error_response(
            "/api/analytics/charts",
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRequest,
            "Chart size must be a positive number",
            now,
        );
    }

    let view = match state.read() {
        Ok(guard) => guard.view().view.clone(),
        Err(_) => {
            return internal_error("/api/analytics/charts", "state lock poisoned while reading view");
        }
    };

    let result = match view {
        AnalyticsView::Empty(result) | AnalyticsView::Ready(result) => result,
        AnalyticsView::NoDeviceLinked => {
            return error_response(
                "/api/analytics/charts",
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::NoDeviceLinked,
                "No device is linked",
                now,
            );
        }
        AnalyticsView::Loading => {
            return error_response(
                "/api/analytics/charts",
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::NoData,
                "Analytics are still loading",
                now,
            );
        }
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/analytics/charts", "timestamp formatting failure"),
    };

    ok(ChartsSuccessResponse {
        size,
        health: chart(health_slices(&result), size),
        species: chart(species_slices(&result), size),
        timestamp,
    })
}

fn chart(slices: Vec<ChartSlice>, size: f64) -> ChartResponse {
    let shapes = pie_shapes(&slices, size);
    ChartResponse { slices, shapes }
}

fn build_selection_response(
    session: &Arc<Mutex<AnalyticsSession>>,
    state: &Arc<RwLock<AppState>>,
    request: SelectionRequest,
    now: OffsetDateTime,
) -> ApiResponse<AnalyticsSuccessResponse> {
    let period: Period = match request.period.parse() {
        Ok(period) => period,
        Err(err) => {
            return error_response(
                "/api/selection",
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidPeriod,
                &err.to_string(),
                now,
            );
        }
    };
    let device_id = request
        .device_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    {
        let mut guard = match session.lock() {
            Ok(guard) => guard,
            Err(_) => return internal_error("/api/selection", "session lock poisoned"),
        };
        if let Err(err) = guard.select(device_id.clone(), period) {
            error!(error = %err, "Failed to switch analytics selection");
            return internal_error("/api/selection", "selection failed");
        }
    }
    info!(device_id = ?device_id, %period, "Analytics selection changed");

    build_analytics_response(state)
}

fn build_create_detection_response(
    feed: &MemoryFeed,
    document: &Value,
    now: OffsetDateTime,
) -> ApiResponse<DetectionCreatedResponse> {
    if !document.is_object() {
        return error_response(
            "/api/detections",
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidRequest,
            "Detection must be a JSON object",
            now,
        );
    }

    let stored = match document.get("id").and_then(Value::as_str) {
        Some(id) => {
            let id = id.to_string();
            feed.upsert(DetectionEvent::from_document(id.clone(), document))
                .map(|()| id)
        }
        None => feed.insert_document(document),
    };
    let id = match stored {
        Ok(id) => id,
        Err(err) => {
            error!(error = %err, "Failed to store detection");
            return internal_error("/api/detections", "feed write failed");
        }
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/detections", "timestamp formatting failure"),
    };

    ApiResponse::Success {
        status: StatusCode::CREATED,
        body: DetectionCreatedResponse { id, timestamp },
    }
}

fn build_delete_detection_response(
    feed: &MemoryFeed,
    id: &str,
    now: OffsetDateTime,
) -> ApiResponse<DetectionRemovedResponse> {
    match feed.remove(id) {
        Ok(true) => match format_timestamp(now) {
            Ok(timestamp) => ok(DetectionRemovedResponse {
                id: id.to_string(),
                removed: true,
                timestamp,
            }),
            Err(_) => internal_error("/api/detections", "timestamp formatting failure"),
        },
        Ok(false) => error_response(
            "/api/detections",
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            &format!("No detection with id {id}"),
            now,
        ),
        Err(err) => {
            error!(error = %err, "Failed to remove detection");
            internal_error("/api/detections", "feed write failed")
        }
    }
}

fn build_activity_response(
    state: &Arc<RwLock<AppState>>,
    feed: &MemoryFeed,
    query: ActivityQuery,
    now: OffsetDateTime,
) -> ApiResponse<ActivitySuccessResponse> {
    let device_id = match state.read() {
        Ok(guard) => guard.selection().device_id.clone(),
        Err(_) => return internal_error("/api/activity", "state lock poisoned while reading selection"),
    };
    let Some(device_id) = device_id else {
        return error_response(
            "/api/activity",
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::NoDeviceLinked,
            "No device is linked",
            now,
        );
    };

    let events = match feed.snapshot() {
        Ok(events) => events,
        Err(_) => return internal_error("/api/activity", "feed lock poisoned"),
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .min(MAX_ACTIVITY_LIMIT);

    let mut items = Vec::new();
    for item in recent_activity(&events, &device_id, query.kind, limit) {
        let detected_at = match format_timestamp(item.timestamp) {
            Ok(formatted) => formatted,
            Err(_) => return internal_error("/api/activity", "timestamp formatting failure"),
        };
        items.push(ActivityItemResponse {
            id: item.id,
            label: item.label,
            kind: item.kind,
            confidence_percent: item.confidence_percent,
            risk: item.risk,
            image_url: item.image_url,
            detected_at,
        });
    }

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/activity", "timestamp formatting failure"),
    };

    ok(ActivitySuccessResponse {
        device_id,
        items,
        timestamp,
    })
}

fn build_advice_response(label: String) -> ApiResponse<AdviceSuccessResponse> {
    ok(AdviceSuccessResponse {
        kind: kind_of(&label),
        advice: advice_for(&label),
        label,
    })
}

fn error_response<T>(
    route: &str,
    status: StatusCode,
    error_code: ErrorCode,
    message: &str,
    now: OffsetDateTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => {
            info!(route, status = status.as_u16(), message, "Request rejected");
            ApiResponse::Error {
                status,
                body: ErrorResponse {
                    error_code,
                    error_message: message.to_string(),
                    timestamp,
                },
            }
        }
        Err(_) => internal_error(route, "timestamp formatting failure"),
    }
}

fn internal_error<T>(route: &str, message: &str) -> ApiResponse<T> {
    error!(route, message, "Internal error while handling request");
    let formatted = format_timestamp(OffsetDateTime::now_utc()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, TimestampError> {
    timestamp.format(&Rfc3339).map_err(TimestampError::Format)
}
