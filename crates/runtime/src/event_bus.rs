use crate::frame::Frame;

/// Externally observable map events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    /// The selected POI id changed (`None` = selection cleared).
    SelectionChanged { id: Option<String> },
    /// The hovered POI id changed.
    HoverChanged { id: Option<String> },
    /// The active category filter changed.
    FilterChanged { active: Vec<String> },
    /// The stats overlay moved to a new state.
    StatsChanged,
}

impl MapEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::SelectionChanged { .. } => "selection",
            MapEvent::HoverChanged { .. } => "hover",
            MapEvent::FilterChanged { .. } => "filter",
            MapEvent::StatsChanged => "stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub event: MapEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    frame_index: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp subsequent events with this frame.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame_index = frame.index;
    }

    pub fn emit(&mut self, event: MapEvent) {
        tracing::trace!(kind = event.kind(), frame = self.frame_index, "map event");
        self.events.push(Event {
            frame_index: self.frame_index,
            event,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, MapEvent};
    use crate::frame::FrameClock;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        let mut clock = FrameClock::new();
        clock.tick(0.0);
        clock.tick(16.0);
        bus.begin_frame(clock.tick(32.0));
        bus.emit(MapEvent::SelectionChanged {
            id: Some("alpha".into()),
        });
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
        assert_eq!(bus.events()[0].event.kind(), "selection");
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(MapEvent::StatsChanged);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
