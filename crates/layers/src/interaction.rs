//! Pointer input: hover picking, drag-to-orbit, click-to-select.

use foundation::math::Vec2;
use scene::World;
use scene::camera::OrbitCamera;
use scene::picking::{PickOptions, pick_screen};
use scene::selection::{SelectionChange, SelectionState};
use tracing::debug;

use crate::builder::MarkerRegistry;

/// Pointer travel (CSS px) beyond which a press becomes a drag.
pub const CLICK_SLOP_PX: f64 = 5.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CursorHint {
    Grab,
    Pointer,
    Grabbing,
}

impl CursorHint {
    pub fn css(self) -> &'static str {
        match self {
            CursorHint::Grab => "grab",
            CursorHint::Pointer => "pointer",
            CursorHint::Grabbing => "grabbing",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Press {
    start: Vec2,
    last: Vec2,
    dragging: bool,
}

/// What the scene looks like to the picker.
#[derive(Clone, Copy)]
pub struct PickTarget<'a> {
    pub world: &'a World,
    pub registry: &'a MarkerRegistry,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    selection: SelectionState,
    hovered: Option<String>,
    press: Option<Press>,
    detached: bool,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.selected()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn cursor(&self) -> CursorHint {
        match (self.press, &self.hovered) {
            (Some(p), _) if p.dragging => CursorHint::Grabbing,
            (_, Some(_)) => CursorHint::Pointer,
            _ => CursorHint::Grab,
        }
    }

    /// Stop reacting to input; every later call is a no-op.
    pub fn detach(&mut self) {
        self.detached = true;
        self.press = None;
        self.hovered = None;
    }

    /// POI id under a viewport pixel. Only core shapes carry pick bounds, so
    /// rings, labels, hazard dots and the hazard zone are never hit.
    pub fn pick(&self, target: PickTarget<'_>, camera: &OrbitCamera, pos: Vec2) -> Option<String> {
        let hit = pick_screen(
            target.world,
            pos.x,
            pos.y,
            |x, y| camera.ray_from_screen(x, y),
            PickOptions::default(),
        )?;
        target.registry.poi_for_core(hit.entity).map(str::to_string)
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.detached {
            return;
        }
        self.press = Some(Press {
            start: pos,
            last: pos,
            dragging: false,
        });
    }

    /// Hover picking, or orbiting while a press is dragging.
    ///
    /// Returns the new hovered id when it changed.
    pub fn pointer_move(
        &mut self,
        target: PickTarget<'_>,
        camera: &mut OrbitCamera,
        pos: Vec2,
    ) -> Option<Option<String>> {
        if self.detached {
            return None;
        }

        if let Some(press) = self.press.as_mut() {
            if !press.dragging && (pos - press.start).length() > CLICK_SLOP_PX {
                press.dragging = true;
            }
            if press.dragging {
                let delta = pos - press.last;
                camera.orbit_by(delta.x, delta.y);
                press.last = pos;
                return None;
            }
            press.last = pos;
        }

        let hovered = self.pick(target, camera, pos);
        if hovered != self.hovered {
            self.hovered = hovered.clone();
            return Some(hovered);
        }
        None
    }

    /// End a press; a press that never became a drag counts as a click.
    pub fn pointer_up(
        &mut self,
        target: PickTarget<'_>,
        camera: &OrbitCamera,
        pos: Vec2,
    ) -> SelectionChange {
        if self.detached {
            return SelectionChange::Unchanged;
        }
        match self.press.take() {
            Some(press) if !press.dragging => self.click(target, camera, pos),
            _ => SelectionChange::Unchanged,
        }
    }

    pub fn pointer_leave(&mut self) -> Option<Option<String>> {
        if self.detached {
            return None;
        }
        self.press = None;
        self.hovered.take().map(|_| None)
    }

    /// Toggle selection from a click at `pos`.
    pub fn click(
        &mut self,
        target: PickTarget<'_>,
        camera: &OrbitCamera,
        pos: Vec2,
    ) -> SelectionChange {
        if self.detached {
            return SelectionChange::Unchanged;
        }
        let hit = self.pick(target, camera, pos);
        let change = self.selection.click(hit.as_deref());
        debug!(hit = ?hit, change = ?change, "click");
        change
    }

    pub fn wheel(&mut self, camera: &mut OrbitCamera, delta: f64) {
        if self.detached {
            return;
        }
        camera.zoom_by(delta);
    }

    /// Keyboard dismiss; same effect as clicking empty space.
    pub fn escape(&mut self) -> SelectionChange {
        if self.detached {
            return SelectionChange::Unchanged;
        }
        self.selection.clear()
    }

    /// Drop the selection if its POI no longer exists.
    pub fn retain_existing(&mut self, registry: &MarkerRegistry) -> SelectionChange {
        match self.selection.selected() {
            Some(id) if registry.get(id).is_none() => self.selection.clear(),
            _ => SelectionChange::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorHint, InteractionController, PickTarget};
    use crate::builder::{MarkerRegistry, SceneBuilder};
    use crate::config::MapConfig;
    use crate::labels::{LabelFactory, LabelStyle, RecordingCanvas};
    use crate::poi::{Category, Poi};
    use foundation::math::{Vec2, Vec3};
    use scene::World;
    use scene::camera::OrbitCamera;
    use scene::selection::SelectionChange;

    struct Fx {
        world: World,
        registry: MarkerRegistry,
        camera: OrbitCamera,
    }

    impl Fx {
        fn new() -> Self {
            let pois = vec![
                Poi::new("a", "A", Category::Outpost, [-100.0, 0.0, 0.0]),
                Poi::new("b", "B", Category::Outpost, [100.0, 0.0, 0.0]),
            ];
            let mut world = World::new();
            let mut registry = MarkerRegistry::new();
            let mut labels =
                LabelFactory::new(RecordingCanvas::default(), LabelStyle::default(), 8, 8);
            SceneBuilder::new(&MapConfig::default())
                .rebuild(&pois, &mut world, &mut registry, &mut labels);
            let mut camera = OrbitCamera::default();
            camera.set_viewport(800.0, 600.0);
            Self {
                world,
                registry,
                camera,
            }
        }

        fn target(&self) -> PickTarget<'_> {
            PickTarget {
                world: &self.world,
                registry: &self.registry,
            }
        }

        /// Pixel position of a marker's core.
        fn screen_of(&self, id: &str) -> Vec2 {
            let p: Vec3 = self.registry.get(id).expect("marker").position;
            let vp = self.camera.view_proj().expect("vp");
            let clip = foundation::math::mat4_transform_point(vp, p);
            let (w, h) = self.camera.viewport();
            let nx = (clip[0] / clip[3]) as f64;
            let ny = (clip[1] / clip[3]) as f64;
            Vec2::new((nx + 1.0) * 0.5 * w, (1.0 - ny) * 0.5 * h)
        }
    }

    #[test]
    fn pick_hits_core_and_misses_empty_space() {
        let fx = Fx::new();
        let ctl = InteractionController::new();
        let at_a = fx.screen_of("a");
        assert_eq!(ctl.pick(fx.target(), &fx.camera, at_a).as_deref(), Some("a"));
        assert_eq!(ctl.pick(fx.target(), &fx.camera, Vec2::new(2.0, 2.0)), None);
    }

    #[test]
    fn click_select_switch_toggle_and_miss() {
        let fx = Fx::new();
        let mut ctl = InteractionController::new();
        let (a, b) = (fx.screen_of("a"), fx.screen_of("b"));

        assert_eq!(ctl.click(fx.target(), &fx.camera, a), SelectionChange::Selected("a".into()));
        assert_eq!(ctl.click(fx.target(), &fx.camera, b), SelectionChange::Selected("b".into()));
        assert_eq!(ctl.selected(), Some("b"));
        assert_eq!(ctl.click(fx.target(), &fx.camera, b), SelectionChange::Cleared);
        assert_eq!(ctl.selected(), None);

        ctl.click(fx.target(), &fx.camera, a);
        assert_eq!(
            ctl.click(fx.target(), &fx.camera, Vec2::new(1.0, 1.0)),
            SelectionChange::Cleared
        );
    }

    #[test]
    fn hover_updates_cursor_without_selecting() {
        let mut fx = Fx::new();
        let mut ctl = InteractionController::new();
        let a = fx.screen_of("a");
        let target = PickTarget {
            world: &fx.world,
            registry: &fx.registry,
        };
        assert_eq!(ctl.pointer_move(target, &mut fx.camera, a), Some(Some("a".into())));
        assert_eq!(ctl.cursor(), CursorHint::Pointer);
        assert_eq!(ctl.selected(), None);
        assert_eq!(ctl.pointer_move(target, &mut fx.camera, a), None);
        assert_eq!(ctl.pointer_leave(), Some(None));
        assert_eq!(ctl.cursor(), CursorHint::Grab);
    }

    #[test]
    fn drag_orbits_and_suppresses_click() {
        let mut fx = Fx::new();
        let mut ctl = InteractionController::new();
        let a = fx.screen_of("a");
        let target = PickTarget {
            world: &fx.world,
            registry: &fx.registry,
        };
        let yaw = fx.camera.yaw_rad();

        ctl.pointer_down(a);
        ctl.pointer_move(target, &mut fx.camera, a + Vec2::new(40.0, 0.0));
        assert_eq!(ctl.cursor(), CursorHint::Grabbing);
        assert_eq!(ctl.pointer_up(target, &fx.camera, a), SelectionChange::Unchanged);
        assert_eq!(ctl.selected(), None);

        fx.camera.update(1.0);
        assert!(fx.camera.yaw_rad() < yaw);
    }

    #[test]
    fn small_jitter_still_clicks() {
        let mut fx = Fx::new();
        let mut ctl = InteractionController::new();
        let a = fx.screen_of("a");
        let target = PickTarget {
            world: &fx.world,
            registry: &fx.registry,
        };
        ctl.pointer_down(a);
        ctl.pointer_move(target, &mut fx.camera, a + Vec2::new(2.0, 1.0));
        assert_eq!(
            ctl.pointer_up(target, &fx.camera, a),
            SelectionChange::Selected("a".into())
        );
    }

    #[test]
    fn escape_clears_and_detach_ignores_input() {
        let mut fx = Fx::new();
        let mut ctl = InteractionController::new();
        let a = fx.screen_of("a");
        ctl.click(fx.target(), &fx.camera, a);
        assert_eq!(ctl.escape(), SelectionChange::Cleared);

        ctl.detach();
        let target = PickTarget {
            world: &fx.world,
            registry: &fx.registry,
        };
        assert_eq!(ctl.click(target, &fx.camera, a), SelectionChange::Unchanged);
        assert_eq!(ctl.pointer_move(target, &mut fx.camera, a), None);
        assert_eq!(ctl.selected(), None);
    }
}
