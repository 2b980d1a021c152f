//! Window-scoped tally of detection events.
//!
//! `aggregate_in` is a pure fold: the same events and window always produce the
//! same result. The live pipeline calls it again on every snapshot the feed
//! delivers instead of patching a previous result.

use crate::event::DetectionEvent;
use crate::insight::{Insight, generate_insights};
use crate::labels::{Bucket, classify};
use crate::window::{AggregationWindow, Period};
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSplit {
    pub healthy: u32,
    pub unhealthy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeciesCount {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub period: Period,
    pub total_count: u32,
    pub healthy_split: HealthSplit,
    pub health_score_percent: u8,
    /// Non-zero species counts, in the order each species was first seen.
    pub species_distribution: Vec<SpeciesCount>,
    pub most_frequent_species: Option<String>,
    pub insights: Vec<Insight>,
}

impl AggregateResult {
    pub fn species_count(&self, label: &str) -> u32 {
        self.species_distribution
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// `round(100 * healthy / (healthy + unhealthy))`, or 0 when nothing was
/// classified as a crop condition. Halves round up.
pub fn health_score_percent(healthy: u32, unhealthy: u32) -> u8 {
    let total = u64::from(healthy) + u64::from(unhealthy);
    if total == 0 {
        return 0;
    }
    let score = (200 * u64::from(healthy) + total) / (2 * total);
    score.min(100) as u8
}

/// Highest count wins; on a tie the species seen first keeps the lead.
pub fn most_frequent(distribution: &[SpeciesCount]) -> Option<&SpeciesCount> {
    distribution.iter().fold(None, |best, entry| match best {
        Some(current) if current.count >= entry.count => Some(current),
        _ => Some(entry),
    })
}

/// Aggregate the events of `device_id` over `period`, ending now.
pub fn aggregate(events: &[DetectionEvent], period: Period, device_id: &str) -> AggregateResult {
    let window = AggregationWindow::resolve(period, OffsetDateTime::now_utc());
    aggregate_in(events, &window, device_id)
}

pub fn aggregate_in(
    events: &[DetectionEvent],
    window: &AggregationWindow,
    device_id: &str,
) -> AggregateResult {
    let mut total_count = 0u32;
    let mut split = HealthSplit::default();
    let mut species: Vec<SpeciesCount> = Vec::new();

    for event in events.iter().filter(|event| in_scope(event, window, device_id)) {
        total_count += 1;
        match event.label().map(classify).unwrap_or(Bucket::Unclassified) {
            Bucket::CropHealthy => split.healthy += 1,
            Bucket::CropUnhealthy => split.unhealthy += 1,
            Bucket::InsectSpecies(label) => {
                match species.iter_mut().find(|entry| entry.label == label) {
                    Some(entry) => entry.count += 1,
                    None => species.push(SpeciesCount {
                        label: label.to_string(),
                        count: 1,
                    }),
                }
            }
            Bucket::Unclassified => {}
        }
    }

    let health_score_percent = health_score_percent(split.healthy, split.unhealthy);
    let leader = most_frequent(&species).cloned();
    let insights = generate_insights(
        health_score_percent,
        leader.as_ref().map(|entry| entry.label.as_str()),
        leader.as_ref().map(|entry| entry.count).unwrap_or(0),
        window.period,
    );

    AggregateResult {
        period: window.period,
        total_count,
        healthy_split: split,
        health_score_percent,
        species_distribution: species,
        most_frequent_species: leader.map(|entry| entry.label),
        insights,
    }
}

// Events without a timestamp or device cannot be placed in any scope.
fn in_scope(event: &DetectionEvent, window: &AggregationWindow, device_id: &str) -> bool {
    event.device_id.as_deref() == Some(device_id)
        && event.timestamp.is_some_and(|ts| window.contains(ts))
}
