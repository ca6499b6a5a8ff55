//! Text and JSON rendering of orchestrator snapshots for the CLI

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{HourlyPoint, LocationInfo};
use crate::insights::{daily_insights, hourly_insights, DailyInsights, HourlyInsights};
use crate::orchestrator::OrchestratorState;

/// A snapshot together with derived insights
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub state: OrchestratorState,
    /// True when the series are synthetic because nothing has been fetched
    pub synthetic: bool,
    pub hourly_insights: Option<HourlyInsights>,
    pub daily_insights: Option<DailyInsights>,
}

impl Report {
    /// Builds a report from one raw snapshot, substituting synthetic series
    /// for `today` when it holds no data
    pub fn new(raw: OrchestratorState, today: NaiveDate) -> Self {
        let synthetic = !raw.has_data();
        let state = raw.with_fallback(today);
        Self {
            synthetic,
            hourly_insights: hourly_insights(&state.hourly_data),
            daily_insights: daily_insights(&state.daily_data),
            state,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Multi-line human readable summary
    pub fn to_text(&self) -> String {
        let state = &self.state;
        let mut lines = Vec::new();

        lines.push(match &state.location_info {
            Some(info) => location_line(info),
            None => "Location: (not yet loaded)".to_string(),
        });

        let status = if state.loading {
            "loading".to_string()
        } else if let Some(error) = &state.error {
            format!("error: {}", error)
        } else {
            "ok".to_string()
        };
        lines.push(format!("Status: {}", status));

        if let Some(updated) = state.last_updated {
            lines.push(format!("Last updated: {}", updated.to_rfc3339()));
        }
        if let Some(metadata) = &state.metadata {
            lines.push(format!(
                "Source: {} ({}, accuracy {:.1}%, completeness {:.1}%)",
                metadata.source, metadata.status, metadata.accuracy, metadata.completeness
            ));
        }
        if self.synthetic {
            lines.push("Showing synthetic data until a fetch succeeds".to_string());
        }

        if let (Some(peak), Some(insights)) = (peak_hour(&state.hourly_data), &self.hourly_insights) {
            lines.push(format!(
                "Today: peak at {} ({:.0} min), avg {:.2} h/hour, trend {}",
                peak.time,
                peak.duration,
                insights.average_hours,
                insights.trend
            ));
        }
        if let Some(insights) = &self.daily_insights {
            lines.push(format!(
                "Last 30 days: peak {:.1} h, recent week avg {:.1} h ({:+.1}% vs previous week), trend {}",
                insights.peak_hours,
                insights.recent_average_hours,
                insights.weekly_change_pct,
                insights.trend
            ));
        }

        lines.join("\n")
    }
}

fn location_line(info: &LocationInfo) -> String {
    format!(
        "Location: {} [{}] {}, {}, {}",
        info.name, info.id, info.coordinates, info.elevation, info.timezone
    )
}

fn peak_hour(points: &[HourlyPoint]) -> Option<&HourlyPoint> {
    points
        .iter()
        .max_by(|a, b| a.duration.total_cmp(&b.duration))
}
