//! Summary statistics over sunshine series
//!
//! Durations in the series are minutes; insights report hours.

use serde::Serialize;

use crate::data::{DailyPoint, HourlyPoint};

/// Average hourly sunshine (minutes) above which the day counts as trending up
const HOURLY_TREND_THRESHOLD: f64 = 35.0;

/// Days in the comparison windows of the daily insights
const WEEK: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Stable => write!(f, "stable"),
            Trend::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// Insights over the hourly series of a day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyInsights {
    pub peak_hours: f64,
    pub average_hours: f64,
    /// Standard deviation of the hourly durations
    pub variability_hours: f64,
    pub trend: Trend,
}

/// Insights over the rolling daily window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyInsights {
    pub peak_hours: f64,
    /// Average over the most recent week
    pub recent_average_hours: f64,
    /// Recent week against the week before, in percent
    pub weekly_change_pct: f64,
    /// Recent week against the whole window, in percent
    pub monthly_comparison_pct: f64,
    pub trend: Trend,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

/// Computes hourly insights; `None` for an empty series
pub fn hourly_insights(points: &[HourlyPoint]) -> Option<HourlyInsights> {
    let average = mean(points.iter().map(|p| p.duration))?;
    let peak = points.iter().map(|p| p.duration).fold(f64::MIN, f64::max);
    let variance = mean(points.iter().map(|p| (p.duration - average).powi(2)))?;

    Some(HourlyInsights {
        peak_hours: peak / 60.0,
        average_hours: average / 60.0,
        variability_hours: variance.sqrt() / 60.0,
        trend: if average > HOURLY_TREND_THRESHOLD {
            Trend::Increasing
        } else {
            Trend::Stable
        },
    })
}

/// Computes daily insights; `None` for an empty series
pub fn daily_insights(points: &[DailyPoint]) -> Option<DailyInsights> {
    let len = points.len();
    let recent = &points[len.saturating_sub(WEEK)..];
    let previous = &points[len.saturating_sub(2 * WEEK)..len.saturating_sub(WEEK)];

    let recent_avg = mean(recent.iter().map(|p| p.duration))?;
    let previous_avg = mean(previous.iter().map(|p| p.duration)).unwrap_or(recent_avg);
    let window_avg = mean(points.iter().map(|p| p.duration))?;
    let peak = points.iter().map(|p| p.duration).fold(f64::MIN, f64::max);

    let trend = if recent_avg > previous_avg {
        Trend::Increasing
    } else if recent_avg < previous_avg {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    Some(DailyInsights {
        peak_hours: peak / 60.0,
        recent_average_hours: recent_avg / 60.0,
        weekly_change_pct: percent_change(previous_avg, recent_avg),
        monthly_comparison_pct: percent_change(window_avg, recent_avg),
        trend,
    })
}
