//! One mounted map instance.
//!
//! Everything a mount needs lives here and nowhere else: the scene world,
//! marker registry, label cache, controllers and the stats overlay. A host
//! (the wasm shell, or a test) feeds it timestamps and pointer events and
//! draws whatever `frame` returns.

use foundation::math::{Mat4, Vec2};
use foundation::time::Time;
use runtime::event_bus::{Event, EventBus, MapEvent};
use runtime::frame::FrameClock;
use scene::World;
use scene::camera::OrbitCamera;
use scene::components::LabelTextureId;
use scene::render::{DrawList, extract_draw_list};
use scene::selection::SelectionChange;
use streaming::{FetchTicket, Generation, OverlayView, StatsError, StatsOverlay, StatsResponse};
use tracing::{debug, info};

use crate::animation::AnimationLoop;
use crate::builder::{BuildReport, MarkerRegistry, SceneBuilder};
use crate::config::MapConfig;
use crate::copy::{Axis, coordinate_text, waypoint_text};
use crate::filter::FilterController;
use crate::interaction::{CursorHint, InteractionController, PickTarget};
use crate::labels::{LabelBitmap, LabelCanvas, LabelFactory, LabelStyle};
use crate::poi::{Category, Poi, PoiError, PoiSet, parse_poi_list};

pub struct MapSession<C: LabelCanvas> {
    config: MapConfig,
    world: World,
    registry: MarkerRegistry,
    labels: LabelFactory<C>,
    builder: SceneBuilder,
    filter: FilterController,
    interaction: InteractionController,
    animation: AnimationLoop,
    camera: OrbitCamera,
    clock: FrameClock,
    bus: EventBus,
    stats: StatsOverlay,
    pois: Vec<Poi>,
    now: Time,
    mounted: bool,
}

impl<C: LabelCanvas> MapSession<C> {
    pub fn new(config: MapConfig, canvas: C) -> Self {
        let labels = LabelFactory::new(
            canvas,
            LabelStyle::default(),
            config.label_width_px,
            config.label_height_px,
        );
        Self {
            builder: SceneBuilder::new(&config),
            camera: OrbitCamera::new(config.orbit_settings()),
            stats: StatsOverlay::new(config.stats_ttl_seconds, config.stats_window_hours),
            world: World::new(),
            registry: MarkerRegistry::new(),
            labels,
            filter: FilterController::new(),
            interaction: InteractionController::new(),
            animation: AnimationLoop::new(),
            clock: FrameClock::new(),
            bus: EventBus::new(),
            pois: Vec::new(),
            now: Time::ZERO,
            mounted: true,
            config,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    /// Parse a JSON POI list and apply it.
    pub fn load_json(&mut self, json: &str) -> Result<PoiSet, PoiError> {
        let set = parse_poi_list(json)?;
        self.set_pois(set.pois.clone());
        Ok(set)
    }

    /// Replace the POI list. Markers are diffed by id; the filter is
    /// re-applied and a selection whose POI vanished is cleared.
    pub fn set_pois(&mut self, pois: Vec<Poi>) -> BuildReport {
        if !self.mounted {
            return BuildReport::default();
        }
        let report = self
            .builder
            .rebuild(&pois, &mut self.world, &mut self.registry, &mut self.labels);
        self.pois = pois;
        self.filter.apply(&self.registry, &mut self.world);
        let change = self.interaction.retain_existing(&self.registry);
        self.on_selection(change);
        info!(
            pois = self.pois.len(),
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            hazard = report.hazard.is_some(),
            "poi list applied"
        );
        report
    }

    /// Resize the viewport. Geometry is untouched.
    pub fn resize(&mut self, width: f64, height: f64) {
        if !self.mounted {
            return;
        }
        self.camera.set_viewport(width, height);
        debug!(width, height, "viewport resized");
    }

    /// Advance one frame at host time `timestamp_ms`.
    ///
    /// Returns `None` after unmount or while the viewport has no area.
    pub fn frame(&mut self, timestamp_ms: f64) -> Option<DrawList> {
        if !self.mounted {
            return None;
        }
        if timestamp_ms.is_finite() {
            self.now = Time::from_millis(timestamp_ms);
        }
        let frame = self.clock.tick(timestamp_ms);
        self.bus.begin_frame(frame);
        self.animation.step(
            &frame,
            &mut self.camera,
            &mut self.world,
            &self.registry,
            self.interaction.selected(),
        );
        self.camera.aspect()?;
        Some(extract_draw_list(&self.world, self.camera.eye()))
    }

    pub fn view_proj(&self) -> Option<Mat4> {
        self.camera.view_proj()
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.mounted {
            self.interaction.pointer_down(pos);
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if !self.mounted {
            return;
        }
        let target = PickTarget {
            world: &self.world,
            registry: &self.registry,
        };
        if let Some(id) = self.interaction.pointer_move(target, &mut self.camera, pos) {
            self.bus.emit(MapEvent::HoverChanged { id });
        }
    }

    /// End a press. Returns a stats request to send when the click selected
    /// a POI with uncached stats.
    pub fn pointer_up(&mut self, pos: Vec2) -> Option<FetchTicket> {
        if !self.mounted {
            return None;
        }
        let target = PickTarget {
            world: &self.world,
            registry: &self.registry,
        };
        let change = self.interaction.pointer_up(target, &self.camera, pos);
        self.on_selection(change)
    }

    pub fn pointer_leave(&mut self) {
        if !self.mounted {
            return;
        }
        if let Some(id) = self.interaction.pointer_leave() {
            self.bus.emit(MapEvent::HoverChanged { id });
        }
    }

    pub fn wheel(&mut self, delta: f64) {
        if self.mounted {
            self.interaction.wheel(&mut self.camera, delta);
        }
    }

    pub fn escape(&mut self) {
        if self.mounted {
            let change = self.interaction.escape();
            self.on_selection(change);
        }
    }

    pub fn cursor(&self) -> CursorHint {
        self.interaction.cursor()
    }

    /// Flip one category in the filter. Unknown keys map to the fallback
    /// category.
    pub fn toggle_category(&mut self, key: &str) {
        if !self.mounted {
            return;
        }
        self.filter.toggle(Category::from_key(key));
        self.refresh_filter();
    }

    pub fn clear_filter(&mut self) {
        if !self.mounted {
            return;
        }
        self.filter.clear();
        self.refresh_filter();
    }

    pub fn active_categories(&self) -> Vec<String> {
        self.filter.active_keys()
    }

    fn refresh_filter(&mut self) {
        let shown = self.filter.apply(&self.registry, &mut self.world);
        let active = self.filter.active_keys();
        debug!(shown, active = ?active, "filter applied");
        self.bus.emit(MapEvent::FilterChanged { active });
    }

    pub fn reset_view(&mut self) {
        if self.mounted {
            self.camera.reset();
        }
    }

    pub fn selected_poi(&self) -> Option<&Poi> {
        let id = self.interaction.selected()?;
        self.pois.iter().find(|p| p.id == id)
    }

    pub fn coordinate_text(&self, axis: Axis) -> Option<String> {
        self.selected_poi().map(|p| coordinate_text(p, axis))
    }

    pub fn waypoint_text(&self) -> Option<String> {
        self.selected_poi().map(waypoint_text)
    }

    /// Hand back the outcome of a `FetchTicket`. Stale outcomes are dropped.
    pub fn stats_resolve(
        &mut self,
        generation: Generation,
        outcome: Result<StatsResponse, StatsError>,
    ) -> bool {
        if !self.mounted {
            return false;
        }
        let applied = self.stats.resolve(generation, outcome, self.now);
        if applied {
            self.bus.emit(MapEvent::StatsChanged);
        }
        applied
    }

    pub fn stats_view(&self) -> OverlayView {
        self.stats.view()
    }

    pub fn stats_endpoint(&self) -> &str {
        &self.config.stats_endpoint
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    pub fn take_label_uploads(&mut self) -> Vec<(LabelTextureId, LabelBitmap)> {
        self.labels.take_uploads()
    }

    pub fn take_label_releases(&mut self) -> Vec<LabelTextureId> {
        self.labels.take_releases()
    }

    fn on_selection(&mut self, change: SelectionChange) -> Option<FetchTicket> {
        if change == SelectionChange::Unchanged {
            return None;
        }
        let id = self.interaction.selected().map(str::to_string);
        let type_code = self.selected_poi().and_then(|p| p.category.type_code());
        let ticket = self.stats.select(type_code, self.now);
        debug!(selected = ?id, "selection changed");
        self.bus.emit(MapEvent::SelectionChanged { id });
        self.bus.emit(MapEvent::StatsChanged);
        ticket
    }

    /// Stop animating, ignore further input and drop every scene object.
    ///
    /// Label textures end up in the release queue; the host frees them
    /// together with the rest of its GPU state.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.animation.stop();
        self.interaction.detach();
        self.registry.clear(&mut self.world, &mut self.labels);
        self.labels.release_all();
        self.world.clear();
        self.pois.clear();
        self.stats.select(None, self.now);
        self.mounted = false;
        info!(frames = self.clock.frames(), "map unmounted");
    }
}

#[cfg(test)]
mod tests {
    use super::MapSession;
    use crate::config::MapConfig;
    use crate::copy::Axis;
    use crate::labels::RecordingCanvas;
    use crate::poi::{Category, Poi};
    use foundation::math::{Vec2, mat4_transform_point};
    use pretty_assertions::assert_eq;
    use runtime::event_bus::MapEvent;
    use streaming::{StatsResponse, StatsSummary};

    fn session() -> MapSession<RecordingCanvas> {
        let mut s = MapSession::new(MapConfig::default(), RecordingCanvas::default());
        s.resize(800.0, 600.0);
        s.set_pois(vec![
            Poi::new("alpha", "Alpha", Category::AsteroidBelt, [79228.7, 57341.9, 25.2]),
            Poi::new("hub", "Hub", Category::Station, [-20000.0, 10000.0, 0.0]),
            Poi::new("wreck", "Wreck", Category::Derelict, [40000.0, -30000.0, 500.0]),
        ]);
        s
    }

    fn screen_of(s: &MapSession<RecordingCanvas>, id: &str) -> Vec2 {
        let p = s.registry().get(id).expect("marker").position;
        let clip = mat4_transform_point(s.view_proj().expect("vp"), p);
        let (w, h) = s.camera().viewport();
        let nx = (clip[0] / clip[3]) as f64;
        let ny = (clip[1] / clip[3]) as f64;
        Vec2::new((nx + 1.0) * 0.5 * w, (1.0 - ny) * 0.5 * h)
    }

    fn click(s: &mut MapSession<RecordingCanvas>, pos: Vec2) -> Option<streaming::FetchTicket> {
        s.pointer_down(pos);
        s.pointer_up(pos)
    }

    #[test]
    fn click_selects_and_issues_stats_request() {
        let mut s = session();
        s.frame(0.0);
        let at = screen_of(&s, "alpha");
        let ticket = click(&mut s, at).expect("minable selection fetches stats");
        assert_eq!(ticket.request.type_code, "ASTEROID");
        assert_eq!(s.selected_poi().map(|p| p.id.as_str()), Some("alpha"));
        assert_eq!(s.stats_view().state, "loading");

        let events: Vec<_> = s.drain_events().into_iter().map(|e| e.event).collect();
        assert!(events.contains(&MapEvent::SelectionChanged {
            id: Some("alpha".into())
        }));
    }

    #[test]
    fn copy_texts_follow_selection() {
        let mut s = session();
        s.frame(0.0);
        assert_eq!(s.waypoint_text(), None);
        let at = screen_of(&s, "alpha");
        click(&mut s, at);
        assert_eq!(s.waypoint_text().as_deref(), Some("/wp [Alpha, 79228, 57341, 25]"));
        assert_eq!(s.coordinate_text(Axis::X).as_deref(), Some("79,228"));
    }

    #[test]
    fn non_minable_selection_does_not_fetch() {
        let mut s = session();
        s.frame(0.0);
        let at = screen_of(&s, "hub");
        assert!(click(&mut s, at).is_none());
        assert_eq!(s.selected_poi().map(|p| p.id.as_str()), Some("hub"));
        assert_eq!(s.stats_view().state, "idle");
    }

    #[test]
    fn stats_response_lands_and_escape_clears() {
        let mut s = session();
        s.frame(1000.0);
        let at = screen_of(&s, "alpha");
        let ticket = click(&mut s, at).expect("ticket");
        let response = StatsResponse {
            stats: Some(StatsSummary {
                total_events: 4,
                ..StatsSummary::default()
            }),
            recent_events: Vec::new(),
        };
        assert!(s.stats_resolve(ticket.generation, Ok(response)));
        assert_eq!(s.stats_view().state, "loaded");

        s.escape();
        assert!(s.selected_poi().is_none());
        assert_eq!(s.stats_view().state, "idle");
    }

    #[test]
    fn filter_hides_without_rebuilding() {
        let mut s = session();
        let entities = s.world().len();
        s.toggle_category("station");
        let list = s.frame(0.0).expect("draw list");
        assert_eq!(s.world().len(), entities);
        assert_eq!(s.active_categories(), vec!["station".to_string()]);
        let hub = s.registry().get("hub").expect("hub").core;
        let alpha = s.registry().get("alpha").expect("alpha").core;
        assert!(s.world().is_visible(hub));
        assert!(!s.world().is_visible(alpha));
        assert!(list.opaque.iter().all(|d| d.entity != alpha));

        s.clear_filter();
        assert!(s.world().is_visible(alpha));
    }

    #[test]
    fn filter_survives_poi_list_change() {
        let mut s = session();
        s.toggle_category("station");

        let mut pois = s.pois().to_vec();
        pois.retain(|p| p.id != "wreck");
        pois.push(Poi::new("gas", "Gas", Category::GasCloud, [0.0, 0.0, 900.0]));
        pois.push(Poi::new("dock", "Dock", Category::Station, [100.0, 0.0, 0.0]));
        s.set_pois(pois);

        for id in ["alpha", "gas"] {
            let marker = s.registry().get(id).expect("marker");
            assert!(marker.parts().all(|e| !s.world().is_visible(e)), "{id} shown");
        }
        for id in ["hub", "dock"] {
            let core = s.registry().get(id).expect("marker").core;
            assert!(s.world().is_visible(core), "{id} hidden");
        }
    }

    #[test]
    fn late_stats_answer_is_announced_once() {
        let mut s = session();
        s.frame(0.0);
        let at = screen_of(&s, "alpha");
        let ticket = click(&mut s, at).expect("ticket");
        s.drain_events();

        let response = StatsResponse {
            stats: Some(StatsSummary {
                total_events: 2,
                ..StatsSummary::default()
            }),
            recent_events: Vec::new(),
        };
        assert!(s.stats_resolve(ticket.generation, Ok(response.clone())));
        let events: Vec<_> = s.drain_events().into_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![MapEvent::StatsChanged]);

        assert!(!s.stats_resolve(ticket.generation, Ok(response)));
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn removing_selected_poi_clears_selection() {
        let mut s = session();
        s.frame(0.0);
        let at = screen_of(&s, "wreck");
        click(&mut s, at);
        assert!(s.selected_poi().is_some());

        let kept: Vec<Poi> = s.pois().iter().filter(|p| p.id != "wreck").cloned().collect();
        let report = s.set_pois(kept);
        assert_eq!(report.removed, 1);
        assert!(s.selected_poi().is_none());
    }

    #[test]
    fn zero_sized_viewport_skips_drawing() {
        let mut s = session();
        s.resize(0.0, 0.0);
        assert!(s.frame(0.0).is_none());
        s.resize(640.0, 480.0);
        assert!(s.frame(16.0).is_some());
    }

    #[test]
    fn unmount_stops_frames_and_input() {
        let mut s = session();
        s.frame(0.0);
        let at = screen_of(&s, "alpha");
        assert!(s.is_mounted());
        s.unmount();
        assert!(!s.is_mounted());

        assert!(s.frame(16.0).is_none());
        assert!(click(&mut s, at).is_none());
        s.pointer_move(at);
        s.toggle_category("station");
        assert!(s.selected_poi().is_none());
        assert!(s.world().is_empty());
        assert!(s.registry().is_empty());
        assert!(!s.take_label_releases().is_empty());
        assert!(s.drain_events().is_empty());
    }
}
