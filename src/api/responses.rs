use crate::activity::RiskLevel;
use crate::aggregate::AggregateResult;
use crate::chart::{ChartSlice, PieShape};
use crate::labels::{LabelAdvice, LabelKind};
use crate::window::Period;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub device_linked: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Loading,
    NoDeviceLinked,
    Empty,
    Ready,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyticsSuccessResponse {
    pub status: ViewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregateResult>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub slices: Vec<ChartSlice>,
    pub shapes: Vec<PieShape>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChartsSuccessResponse {
    pub size: f64,
    pub health: ChartResponse,
    pub species: ChartResponse,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityItemResponse {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<LabelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_percent: Option<u8>,
    pub risk: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub detected_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivitySuccessResponse {
    pub device_id: String,
    pub items: Vec<ActivityItemResponse>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdviceSuccessResponse {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<LabelKind>,
    pub advice: LabelAdvice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionCreatedResponse {
    pub id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionRemovedResponse {
    pub id: String,
    pub removed: bool,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub device_id: Option<String>,
    pub period: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoData,
    NoDeviceLinked,
    InvalidPeriod,
    InvalidRequest,
    NotFound,
    InternalError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ErrorResponse {
            error_code: ErrorCode::NoDeviceLinked,
            error_message: "no device".to_string(),
            timestamp: "2026-01-11T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "NO_DEVICE_LINKED",
                "error_message": "no device",
                "timestamp": "2026-01-11T12:32:00Z"
            })
        );
    }

    #[test]
    fn analytics_response_omits_result_while_loading() {
        let response = AnalyticsSuccessResponse {
            status: ViewStatus::Loading,
            device_id: Some("pi-01".to_string()),
            period: Period::Month,
            result: None,
            timestamp: "2026-01-11T12:30:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize analytics response");
        assert_eq!(
            value,
            json!({
                "status": "loading",
                "device_id": "pi-01",
                "period": "month",
                "timestamp": "2026-01-11T12:30:00Z"
            })
        );
    }

    #[test]
    fn health_response_serializes_status() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Degraded,
            device_linked: false,
            timestamp: "2026-01-11T12:33:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "degraded",
                "device_linked": false,
                "timestamp": "2026-01-11T12:33:00Z"
            })
        );
    }

    #[test]
    fn activity_item_omits_missing_optional_fields() {
        let item = ActivityItemResponse {
            id: "doc-1".to_string(),
            label: "Unknown".to_string(),
            kind: None,
            confidence_percent: None,
            risk: RiskLevel::MediumRisk,
            image_url: None,
            detected_at: "2026-01-11T12:00:00Z".to_string(),
        };

        let value = serde_json::to_value(item).expect("serialize activity item");
        assert_eq!(
            value,
            json!({
                "id": "doc-1",
                "label": "Unknown",
                "risk": "MEDIUM_RISK",
                "detected_at": "2026-01-11T12:00:00Z"
            })
        );
    }
}
