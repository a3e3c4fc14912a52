//! Per-frame animation.
//!
//! Each step runs, in order:
//! 1. camera damping
//! 2. halo ring billboarding
//! 3. selected-marker pulse
//! 4. idle glow on landmark markers, skipped for the selected one

use std::f64::consts::TAU;

use foundation::math::Quat;
use runtime::frame::Frame;
use scene::World;
use scene::camera::OrbitCamera;

use crate::builder::{MarkerRegistry, SceneMarker};

/// Relative core scale swing while selected.
pub const PULSE_AMPLITUDE: f64 = 0.15;
pub const PULSE_PERIOD_S: f64 = 2.4;

/// Ring opacity multiplier oscillates in `[RING_OPACITY_MIN, 1]`.
pub const RING_OPACITY_MIN: f32 = 0.35;
pub const RING_PULSE_PERIOD_S: f64 = 1.6;

pub const SELECTED_EMISSIVE: f32 = 0.9;

pub const IDLE_GLOW_SWING: f32 = 0.25;
pub const IDLE_GLOW_PERIOD_S: f64 = 4.0;

/// Rotation that turns a local +Z facing shape toward the camera.
pub fn billboard_rotation(camera: &OrbitCamera) -> Quat {
    camera.orientation()
}

pub fn pulse_scale(t: f64) -> f64 {
    1.0 + PULSE_AMPLITUDE * (TAU * t / PULSE_PERIOD_S).sin()
}

pub fn ring_pulse_opacity(t: f64) -> f32 {
    let s = 0.5 + 0.5 * (TAU * t / RING_PULSE_PERIOD_S).sin();
    RING_OPACITY_MIN + (1.0 - RING_OPACITY_MIN) * s as f32
}

pub fn idle_glow(base: f32, t: f64, phase: f64) -> f32 {
    (base + IDLE_GLOW_SWING * (TAU * t / IDLE_GLOW_PERIOD_S + phase).sin() as f32).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub camera_moving: bool,
    pub rings_oriented: usize,
    pub pulsed: bool,
    pub glowing: usize,
}

#[derive(Debug, Default)]
pub struct AnimationLoop {
    /// Marker last given the pulse, so it can be put back at rest.
    pulsing: Option<String>,
    stopped: bool,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn step(
        &mut self,
        frame: &Frame,
        camera: &mut OrbitCamera,
        world: &mut World,
        registry: &MarkerRegistry,
        selected: Option<&str>,
    ) -> StepReport {
        let mut report = StepReport::default();
        if self.stopped {
            return report;
        }
        let t = frame.time.seconds();

        report.camera_moving = camera.update(frame.dt_s);

        let facing = billboard_rotation(camera);
        for marker in registry.markers() {
            if let Some(tr) = world.transform_mut(marker.ring) {
                tr.rotation = facing;
                report.rings_oriented += 1;
            }
        }

        if self.pulsing.as_deref() != selected {
            if let Some(prev) = self.pulsing.take()
                && let Some(marker) = registry.get(&prev)
            {
                rest(world, marker);
            }
            self.pulsing = selected.map(str::to_string);
        }
        if let Some(marker) = selected.and_then(|id| registry.get(id)) {
            if let Some(tr) = world.transform_mut(marker.core) {
                tr.scale = pulse_scale(t);
            }
            if let Some(m) = world.material_mut(marker.core) {
                m.emissive = SELECTED_EMISSIVE;
            }
            if let Some(m) = world.material_mut(marker.ring) {
                m.opacity = ring_pulse_opacity(t);
            }
            report.pulsed = true;
        }

        for marker in registry.markers() {
            if !marker.category.is_landmark() || selected == Some(marker.poi_id.as_str()) {
                continue;
            }
            if let Some(m) = world.material_mut(marker.core) {
                m.emissive = idle_glow(marker.base_emissive, t, marker.position.x * 0.1);
                report.glowing += 1;
            }
        }

        report
    }
}

/// Put a marker back to its resting scale, opacity and glow.
fn rest(world: &mut World, marker: &SceneMarker) {
    if let Some(tr) = world.transform_mut(marker.core) {
        tr.scale = 1.0;
    }
    if let Some(m) = world.material_mut(marker.core) {
        m.emissive = marker.base_emissive;
    }
    if let Some(m) = world.material_mut(marker.ring) {
        m.opacity = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::labels::{LabelFactory, LabelStyle, RecordingCanvas};
    use crate::builder::SceneBuilder;
    use crate::poi::{Category, Poi};
    use foundation::math::Vec3;

    struct Fx {
        world: World,
        registry: MarkerRegistry,
        camera: OrbitCamera,
        anim: AnimationLoop,
    }

    fn fixture() -> Fx {
        let pois = vec![
            Poi::new("st", "Station", Category::Station, [0.0, 0.0, 0.0]),
            Poi::new("st2", "Station 2", Category::Station, [40.0, 0.0, 0.0]),
            Poi::new("ob", "Outpost", Category::Outpost, [80.0, 0.0, 0.0]),
        ];
        let mut world = World::new();
        let mut registry = MarkerRegistry::new();
        let mut labels = LabelFactory::new(RecordingCanvas::default(), LabelStyle::default(), 8, 8);
        SceneBuilder::new(&MapConfig::default()).rebuild(&pois, &mut world, &mut registry, &mut labels);
        let mut camera = OrbitCamera::default();
        camera.set_viewport(640.0, 480.0);
        Fx {
            world,
            registry,
            camera,
            anim: AnimationLoop::new(),
        }
    }

    fn frame_at(t: f64) -> Frame {
        Frame {
            index: 0,
            dt_s: 1.0 / 60.0,
            time: foundation::time::Time(t),
        }
    }

    fn step(fx: &mut Fx, t: f64, selected: Option<&str>) -> StepReport {
        fx.anim
            .step(&frame_at(t), &mut fx.camera, &mut fx.world, &fx.registry, selected)
    }

    #[test]
    fn rings_face_the_camera() {
        let mut fx = fixture();
        fx.camera.orbit_by(120.0, 30.0);
        let report = step(&mut fx, 0.0, None);
        assert_eq!(report.rings_oriented, 3);

        let ring = fx.registry.get("ob").expect("marker").ring;
        let rot = fx.world.transform(ring).expect("transform").rotation;
        let normal = rot.rotate(Vec3::new(0.0, 0.0, 1.0));
        let to_eye = (fx.camera.eye() - fx.camera.target).normalize().expect("dir");
        assert!(normal.distance(to_eye) < 1e-9);
    }

    #[test]
    fn selected_marker_pulses_and_skips_idle_glow() {
        let mut fx = fixture();
        let t = PULSE_PERIOD_S / 4.0;
        let report = step(&mut fx, t, Some("st"));
        assert!(report.pulsed);
        assert_eq!(report.glowing, 1);

        let st = fx.registry.get("st").expect("marker").clone();
        let scale = fx.world.transform(st.core).expect("t").scale;
        assert!((scale - (1.0 + PULSE_AMPLITUDE)).abs() < 1e-9);
        let core = fx.world.material(st.core).expect("m");
        assert_eq!(core.emissive, SELECTED_EMISSIVE);
        let ring = fx.world.material(st.ring).expect("m");
        assert_eq!(ring.opacity, ring_pulse_opacity(t));
    }

    #[test]
    fn pulse_stays_within_amplitude() {
        for i in 0..200 {
            let s = pulse_scale(i as f64 * 0.037);
            assert!((1.0 - PULSE_AMPLITUDE - 1e-12..=1.0 + PULSE_AMPLITUDE + 1e-12).contains(&s));
            let o = ring_pulse_opacity(i as f64 * 0.037);
            assert!((RING_OPACITY_MIN..=1.0).contains(&o));
        }
    }

    #[test]
    fn deselected_marker_returns_to_rest() {
        let mut fx = fixture();
        step(&mut fx, 0.6, Some("ob"));
        step(&mut fx, 0.7, Some("st2"));

        let ob = fx.registry.get("ob").expect("marker").clone();
        assert_eq!(fx.world.transform(ob.core).expect("t").scale, 1.0);
        assert_eq!(fx.world.material(ob.ring).expect("m").opacity, 1.0);
        assert_eq!(fx.world.material(ob.core).expect("m").emissive, ob.base_emissive);
    }

    #[test]
    fn only_landmarks_glow_when_idle() {
        let mut fx = fixture();
        let report = step(&mut fx, 1.3, None);
        assert_eq!(report.glowing, 2);
        let ob = fx.registry.get("ob").expect("marker").clone();
        assert_eq!(fx.world.material(ob.core).expect("m").emissive, ob.base_emissive);
    }

    #[test]
    fn stopped_loop_does_nothing() {
        let mut fx = fixture();
        fx.anim.stop();
        let report = step(&mut fx, 1.0, Some("st"));
        assert_eq!(report, StepReport::default());
        let st = fx.registry.get("st").expect("marker").clone();
        assert_eq!(fx.world.transform(st.core).expect("t").scale, 1.0);
    }
}
