use crate::window::Period;
use serde::Serialize;

pub const GROWTH_MONITORING_TITLE: &str = "Growth Monitoring";
pub const KEY_PEST_ALERT_TITLE: &str = "Key Pest Alert";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
}

/// Short statements shown under the analytics charts, most general first.
pub fn generate_insights(
    health_score_percent: u8,
    most_frequent_species: Option<&str>,
    count: u32,
    period: Period,
) -> Vec<Insight> {
    let mut insights = vec![Insight {
        title: GROWTH_MONITORING_TITLE.to_string(),
        description: format!("Overall crop health is stable at {health_score_percent}%."),
    }];

    if let Some(species) = most_frequent_species {
        insights.push(Insight {
            title: KEY_PEST_ALERT_TITLE.to_string(),
            description: format!("{species} detected {count} times this {period}."),
        });
    }

    insights
}
