use crate::event::DetectionEvent;
use crate::labels::{self, LabelKind};
use serde::Serialize;
use std::cmp::Reverse;
use time::OffsetDateTime;

pub const DEFAULT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Good,
    MediumRisk,
    HighRisk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub id: String,
    pub label: String,
    pub kind: Option<LabelKind>,
    pub confidence_percent: Option<u8>,
    pub timestamp: OffsetDateTime,
    pub image_url: Option<String>,
    pub risk: RiskLevel,
}

pub fn risk_of(label: &str) -> RiskLevel {
    if label == labels::HEALTHY || labels::is_beneficial(label) {
        RiskLevel::Good
    } else if labels::is_pest(label) {
        RiskLevel::HighRisk
    } else {
        RiskLevel::MediumRisk
    }
}

/// Latest detections of one device, newest first. Independent of any analytics
/// window; events without a timestamp are left out.
pub fn recent_activity(
    events: &[DetectionEvent],
    device_id: &str,
    kind: Option<LabelKind>,
    limit: usize,
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = events
        .iter()
        .filter(|event| event.device_id.as_deref() == Some(device_id))
        .filter_map(|event| {
            let timestamp = event.timestamp?;
            let label = event.label.clone().unwrap_or_default();
            Some(ActivityItem {
                id: event.id.clone(),
                kind: labels::kind_of(&label),
                risk: risk_of(&label),
                confidence_percent: event.confidence_percent(),
                timestamp,
                image_url: event.image_url.clone(),
                label,
            })
        })
        .filter(|item| kind.is_none() || item.kind == kind)
        .collect();

    items.sort_by_key(|item| Reverse(item.timestamp));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn event(id: &str, label: &str, minutes: i64, device: &str) -> DetectionEvent {
        DetectionEvent {
            id: id.to_string(),
            label: Some(label.to_string()),
            confidence: Some(0.654),
            timestamp: Some(datetime!(2025-03-10 12:00:00 UTC) + Duration::minutes(minutes)),
            device_id: Some(device.to_string()),
            image_url: None,
        }
    }

    #[test]
    fn risk_badges_follow_label_family() {
        assert_eq!(risk_of("Healthy"), RiskLevel::Good);
        assert_eq!(risk_of("Beneficial Bee"), RiskLevel::Good);
        assert_eq!(risk_of("Infected Aphid"), RiskLevel::HighRisk);
        assert_eq!(risk_of("Wilting"), RiskLevel::MediumRisk);
        assert_eq!(risk_of("Something else"), RiskLevel::MediumRisk);
    }

    #[test]
    fn newest_first_and_limited() {
        let events = vec![
            event("a", "Healthy", 1, "pi-01"),
            event("b", "Wilting", 3, "pi-01"),
            event("c", "Infected Aphid", 2, "pi-01"),
            event("d", "Healthy", 9, "pi-02"),
        ];

        let items = recent_activity(&events, "pi-01", None, 2);

        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(items[0].confidence_percent, Some(65));
    }

    #[test]
    fn kind_filter_splits_crop_and_insect_lists() {
        let events = vec![
            event("a", "Healthy", 1, "pi-01"),
            event("b", "Beneficial Ladybug", 2, "pi-01"),
            event("c", "Unknown", 3, "pi-01"),
        ];

        let insects = recent_activity(&events, "pi-01", Some(LabelKind::Insect), 10);
        let crops = recent_activity(&events, "pi-01", Some(LabelKind::Crop), 10);
        let all = recent_activity(&events, "pi-01", None, 10);

        assert_eq!(insects.len(), 1);
        assert_eq!(insects[0].id, "b");
        assert_eq!(crops.len(), 1);
        assert_eq!(crops[0].id, "a");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn events_without_timestamp_are_skipped() {
        let mut undated = event("a", "Healthy", 1, "pi-01");
        undated.timestamp = None;
        assert!(recent_activity(&[undated], "pi-01", None, 10).is_empty());
    }
}
