//! Stats overlay state machine for the selected POI.
//!
//! ```text
//! Idle -> Loading -> Loaded(data) | Empty
//!  ^                                  |
//!  +------ selection cleared ---------+
//! ```
//!
//! Requests are fire-and-forget. Each carries a `Generation`; a response is
//! applied only if it matches the newest request, otherwise it is dropped.

use foundation::format::format_grouped;
use foundation::time::Time;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::StatsCache;
use crate::protocol::{RecentEvent, StatsData, StatsRequest, StatsResponse, Timestamp};
use crate::request::{Generation, GenerationCounter};

/// Recent events shown in the overlay.
pub const MAX_RECENT_EVENTS: usize = 5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("stats request failed: {0}")]
    Transport(String),
    #[error("stats endpoint answered HTTP {0}")]
    Status(u16),
    #[error("stats response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayState {
    Idle,
    Loading { type_code: String },
    Loaded { type_code: String, data: StatsData },
    /// No data, including failed requests.
    Empty { type_code: String },
}

impl OverlayState {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayState::Idle => "idle",
            OverlayState::Loading { .. } => "loading",
            OverlayState::Loaded { .. } => "loaded",
            OverlayState::Empty { .. } => "empty",
        }
    }

    pub fn type_code(&self) -> Option<&str> {
        match self {
            OverlayState::Idle => None,
            OverlayState::Loading { type_code }
            | OverlayState::Loaded { type_code, .. }
            | OverlayState::Empty { type_code } => Some(type_code),
        }
    }
}

/// A request the host should send; hand the outcome back to `resolve`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub request: StatsRequest,
}

#[derive(Debug, Clone)]
pub struct StatsOverlay {
    state: OverlayState,
    generations: GenerationCounter,
    pending: Option<Generation>,
    cache: StatsCache,
    window_hours: u32,
    requests_issued: u64,
}

impl StatsOverlay {
    pub fn new(ttl_s: f64, window_hours: u32) -> Self {
        Self {
            state: OverlayState::Idle,
            generations: GenerationCounter::new(),
            pending: None,
            cache: StatsCache::new(ttl_s),
            window_hours,
            requests_issued: 0,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    /// React to a selection change. `type_code` is `None` when nothing is
    /// selected or the selected category has no stats.
    ///
    /// Returns a ticket when a network request is needed.
    pub fn select(&mut self, type_code: Option<&str>, now: Time) -> Option<FetchTicket> {
        let Some(code) = type_code else {
            self.pending = None;
            self.state = OverlayState::Idle;
            return None;
        };

        self.cache.purge_expired(now);
        if let Some(cached) = self.cache.fresh(code, now) {
            debug!(type_code = code, "stats cache hit");
            self.pending = None;
            self.state = match cached {
                Some(data) => OverlayState::Loaded {
                    type_code: code.to_string(),
                    data,
                },
                None => OverlayState::Empty {
                    type_code: code.to_string(),
                },
            };
            return None;
        }

        let generation = self.generations.next();
        self.pending = Some(generation);
        self.requests_issued += 1;
        self.state = OverlayState::Loading {
            type_code: code.to_string(),
        };
        debug!(type_code = code, generation = generation.0, "stats request issued");
        Some(FetchTicket {
            generation,
            request: StatsRequest::new(code, self.window_hours),
        })
    }

    /// Apply a response. Returns `false` when it was stale and dropped.
    pub fn resolve(
        &mut self,
        generation: Generation,
        outcome: Result<StatsResponse, StatsError>,
        now: Time,
    ) -> bool {
        if self.pending != Some(generation) || !self.generations.is_current(generation) {
            debug!(generation = generation.0, "stale stats response dropped");
            return false;
        }
        self.pending = None;
        let OverlayState::Loading { type_code } = &self.state else {
            return false;
        };
        let type_code = type_code.clone();

        self.state = match outcome {
            Ok(response) => {
                let data = response.into_data();
                self.cache.insert(type_code.clone(), data.clone(), now);
                match data {
                    Some(data) => OverlayState::Loaded { type_code, data },
                    None => OverlayState::Empty { type_code },
                }
            }
            Err(e) => {
                warn!(type_code = %type_code, error = %e, "stats unavailable");
                OverlayState::Empty { type_code }
            }
        };
        true
    }

    pub fn view(&self) -> OverlayView {
        let mut view = OverlayView {
            state: self.state.name(),
            type_code: self.state.type_code().map(str::to_string),
            totals: None,
            recent_events: Vec::new(),
        };
        if let OverlayState::Loaded { data, .. } = &self.state {
            let s = &data.summary;
            view.totals = Some(TotalsView {
                total_events: format_grouped(s.total_events as f64),
                total_value: format_grouped(s.total_value),
                unique_actors: format_grouped(s.unique_actors as f64),
                avg_value: format_grouped(s.avg_value),
                max_value: format_grouped(s.max_value),
                min_value: format_grouped(s.min_value),
                high_value_events: format_grouped(s.high_value_event_count as f64),
            });
            view.recent_events = data
                .recent_events
                .iter()
                .take(MAX_RECENT_EVENTS)
                .map(RecentEventView::from)
                .collect();
        }
        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    pub total_events: String,
    pub total_value: String,
    pub unique_actors: String,
    pub avg_value: String,
    pub max_value: String,
    pub min_value: String,
    pub high_value_events: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEventView {
    pub actor: String,
    pub value: String,
    pub timestamp: Option<Timestamp>,
    pub highlighted: bool,
}

impl From<&RecentEvent> for RecentEventView {
    fn from(e: &RecentEvent) -> Self {
        Self {
            actor: e.actor.clone(),
            value: format_grouped(e.value),
            timestamp: e.timestamp.clone(),
            highlighted: e.is_highlighted,
        }
    }
}

/// Display-ready overlay contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub state: &'static str,
    pub type_code: Option<String>,
    pub totals: Option<TotalsView>,
    pub recent_events: Vec<RecentEventView>,
}

#[cfg(test)]
mod tests {
    use super::{OverlayState, StatsError, StatsOverlay};
    use crate::protocol::{RecentEvent, StatsResponse, StatsSummary};
    use foundation::time::Time;
    use pretty_assertions::assert_eq;

    fn event(i: u32) -> RecentEvent {
        RecentEvent {
            actor: format!("pilot{i}"),
            value: 1_000.0 * i as f64,
            timestamp: None,
            is_highlighted: i == 0,
        }
    }

    fn response(total: u64) -> StatsResponse {
        StatsResponse {
            stats: Some(StatsSummary {
                total_events: total,
                total_value: 12_345.0,
                ..StatsSummary::default()
            }),
            recent_events: (0..8).map(event).collect(),
        }
    }

    #[test]
    fn non_recognized_selection_stays_idle_without_request() {
        let mut o = StatsOverlay::new(60.0, 24);
        assert!(o.select(None, Time(0.0)).is_none());
        assert_eq!(o.state(), &OverlayState::Idle);
        assert_eq!(o.requests_issued(), 0);
    }

    #[test]
    fn loading_then_loaded() {
        let mut o = StatsOverlay::new(60.0, 24);
        let ticket = o.select(Some("ASTEROID"), Time(0.0)).expect("ticket");
        assert_eq!(ticket.request.type_code, "ASTEROID");
        assert_eq!(ticket.request.window_hours, 24);
        assert_eq!(o.state().name(), "loading");

        assert!(o.resolve(ticket.generation, Ok(response(5)), Time(0.5)));
        assert_eq!(o.state().name(), "loaded");
        let view = o.view();
        assert_eq!(view.recent_events.len(), 5);
        assert_eq!(view.totals.expect("totals").total_value, "12,345");
    }

    #[test]
    fn superseded_response_is_dropped() {
        let mut o = StatsOverlay::new(60.0, 24);
        let first = o.select(Some("ASTEROID"), Time(0.0)).expect("ticket");
        let second = o.select(Some("GAS"), Time(1.0)).expect("ticket");

        assert!(!o.resolve(first.generation, Ok(response(9)), Time(2.0)));
        assert_eq!(
            o.state(),
            &OverlayState::Loading {
                type_code: "GAS".into()
            }
        );
        assert!(o.cache().fresh("ASTEROID", Time(2.0)).is_none());

        assert!(o.resolve(second.generation, Ok(response(1)), Time(3.0)));
        assert_eq!(o.state().type_code(), Some("GAS"));
    }

    #[test]
    fn response_after_deselect_is_dropped() {
        let mut o = StatsOverlay::new(60.0, 24);
        let t = o.select(Some("SALVAGE"), Time(0.0)).expect("ticket");
        o.select(None, Time(0.1));
        assert!(!o.resolve(t.generation, Ok(response(2)), Time(0.2)));
        assert_eq!(o.state(), &OverlayState::Idle);
    }

    #[test]
    fn cache_hit_within_ttl_and_refetch_after() {
        let mut o = StatsOverlay::new(60.0, 24);
        let t = o.select(Some("ASTEROID"), Time(0.0)).expect("ticket");
        o.resolve(t.generation, Ok(response(3)), Time(1.0));
        o.select(None, Time(2.0));

        assert!(o.select(Some("ASTEROID"), Time(30.0)).is_none());
        assert_eq!(o.state().name(), "loaded");
        assert_eq!(o.requests_issued(), 1);

        assert!(o.select(Some("ASTEROID"), Time(61.5)).is_some());
        assert_eq!(o.requests_issued(), 2);
    }

    #[test]
    fn failure_is_empty_and_not_cached() {
        let mut o = StatsOverlay::new(60.0, 24);
        let t = o.select(Some("GAS"), Time(0.0)).expect("ticket");
        assert!(o.resolve(t.generation, Err(StatsError::Status(503)), Time(0.1)));
        assert_eq!(o.state(), &OverlayState::Empty { type_code: "GAS".into() });
        assert_eq!(o.view().state, "empty");
        assert!(o.cache().is_empty());

        assert!(o.select(Some("GAS"), Time(1.0)).is_some());
    }

    #[test]
    fn zero_events_is_empty() {
        let mut o = StatsOverlay::new(60.0, 24);
        let t = o.select(Some("GAS"), Time(0.0)).expect("ticket");
        o.resolve(t.generation, Ok(response(0)), Time(0.1));
        assert_eq!(o.state().name(), "empty");
        assert!(o.view().totals.is_none());
    }

    #[test]
    fn duplicate_resolution_is_ignored() {
        let mut o = StatsOverlay::new(60.0, 24);
        let t = o.select(Some("GAS"), Time(0.0)).expect("ticket");
        assert!(o.resolve(t.generation, Ok(response(4)), Time(0.1)));
        assert!(!o.resolve(t.generation, Err(StatsError::Transport("late".into())), Time(0.2)));
        assert_eq!(o.state().name(), "loaded");
    }
}
