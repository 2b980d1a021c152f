//! Renderer-agnostic donut data.
//!
//! Slices carry label, value and colour. `pie_shapes` turns them into circles
//! and SVG arc paths laid out clockwise from 12 o'clock.

use crate::aggregate::AggregateResult;
use crate::labels;
use serde::Serialize;

pub const HEALTHY_COLOR: &str = "#2ecc71";
pub const AFFECTED_COLOR: &str = "#e74c3c";
pub const NEUTRAL_COLOR: &str = "#bdc3c7";
pub const FALLBACK_COLOR: &str = "#95a5a6";

pub const AFFECTED_LABEL: &str = "Affected";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PieShape {
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        color: &'static str,
    },
    Arc {
        path: String,
        color: &'static str,
    },
}

pub fn species_color(label: &str) -> &'static str {
    match label {
        labels::BENEFICIAL_BEE => "#f1c40f",
        labels::BENEFICIAL_LACEWING_LARVAE => "#16a085",
        labels::BENEFICIAL_LADYBUG => "#c0392b",
        labels::BENEFICIAL_LARVAE => "#1abc9c",
        labels::INFECTED_APHID => "#8e44ad",
        labels::INFECTED_FLEA_BEETLE => "#2980b9",
        labels::INFECTED_PUMPKIN_BEETLE => "#e67e22",
        _ => FALLBACK_COLOR,
    }
}

pub fn health_slices(result: &AggregateResult) -> Vec<ChartSlice> {
    vec![
        ChartSlice {
            label: labels::HEALTHY.to_string(),
            value: result.healthy_split.healthy,
            color: HEALTHY_COLOR,
        },
        ChartSlice {
            label: AFFECTED_LABEL.to_string(),
            value: result.healthy_split.unhealthy,
            color: AFFECTED_COLOR,
        },
    ]
}

pub fn species_slices(result: &AggregateResult) -> Vec<ChartSlice> {
    result
        .species_distribution
        .iter()
        .filter(|entry| entry.count > 0)
        .map(|entry| ChartSlice {
            label: entry.label.clone(),
            value: entry.count,
            color: species_color(&entry.label),
        })
        .collect()
}

pub fn pie_shapes(slices: &[ChartSlice], size: f64) -> Vec<PieShape> {
    let radius = size / 2.0;
    let (cx, cy) = (radius, radius);
    let total: u64 = slices.iter().map(|slice| u64::from(slice.value)).sum();

    if total == 0 {
        return vec![PieShape::Circle {
            cx,
            cy,
            r: radius,
            color: NEUTRAL_COLOR,
        }];
    }

    let mut shapes = Vec::with_capacity(slices.len());
    let mut angle = 0.0;
    for slice in slices.iter().filter(|slice| slice.value > 0) {
        if u64::from(slice.value) == total {
            // A full sweep has coincident arc endpoints.
            shapes.push(PieShape::Circle {
                cx,
                cy,
                r: radius,
                color: slice.color,
            });
            continue;
        }
        let sweep = f64::from(slice.value) / total as f64 * 360.0;
        shapes.push(PieShape::Arc {
            path: describe_arc(cx, cy, radius, angle, angle + sweep),
            color: slice.color,
        });
        angle += sweep;
    }
    shapes
}

fn polar_to_cartesian(cx: f64, cy: f64, r: f64, angle_degrees: f64) -> (f64, f64) {
    let radians = (angle_degrees - 90.0).to_radians();
    (cx + r * radians.cos(), cy + r * radians.sin())
}

/// Closed wedge path from the centre, `start_angle`..`end_angle` in degrees.
pub fn describe_arc(cx: f64, cy: f64, r: f64, start_angle: f64, end_angle: f64) -> String {
    let (start_x, start_y) = polar_to_cartesian(cx, cy, r, end_angle);
    let (end_x, end_y) = polar_to_cartesian(cx, cy, r, start_angle);
    let large_arc = if end_angle - start_angle <= 180.0 { 0 } else { 1 };
    format!(
        "M {cx} {cy} L {} {} A {r} {r} 0 {large_arc} 0 {} {} Z",
        round3(start_x),
        round3(start_y),
        round3(end_x),
        round3(end_y)
    )
}

fn round3(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoids printing "-0".
    if rounded == 0.0 { 0.0 } else { rounded }
}
