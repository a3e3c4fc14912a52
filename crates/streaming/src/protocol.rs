//! Wire types for the aggregated stats collaborator.
//!
//! Request: `GET {endpoint}?type={TYPE_CODE}&window={hours}h`
//! Response: `{ stats: {...}, recentEvents: [...] }`, most recent event first.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRequest {
    /// Category-derived type code, e.g. `ASTEROID`.
    pub type_code: String,
    /// Aggregation window, in hours.
    pub window_hours: u32,
}

impl StatsRequest {
    pub fn new(type_code: impl Into<String>, window_hours: u32) -> Self {
        Self {
            type_code: type_code.into(),
            window_hours,
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{endpoint}{sep}type={}&window={}h",
            self.type_code, self.window_hours
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_events: u64,
    pub total_value: f64,
    pub unique_actors: u64,
    pub avg_value: f64,
    pub max_value: f64,
    pub min_value: f64,
    pub high_value_event_count: u64,
}

/// Event time as sent by the collaborator: epoch millis or an ISO string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEvent {
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub is_highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(default)]
    pub stats: Option<StatsSummary>,
    #[serde(default)]
    pub recent_events: Vec<RecentEvent>,
}

/// A response that actually carries data.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsData {
    pub summary: StatsSummary,
    pub recent_events: Vec<RecentEvent>,
}

impl StatsResponse {
    /// `None` when `stats` is missing or reports zero events.
    pub fn into_data(self) -> Option<StatsData> {
        let summary = self.stats?;
        if summary.total_events == 0 {
            return None;
        }
        Some(StatsData {
            summary,
            recent_events: self.recent_events,
        })
    }
}
