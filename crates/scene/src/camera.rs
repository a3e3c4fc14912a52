//! Damped orbit camera around a fixed target.
//!
//! Pointer drags and wheel steps only move the *goal* angles/distance; the
//! visible camera eases toward them in `update`, which the frame loop calls
//! once per frame. There is no automatic rotation.

use foundation::math::{
    Mat4, Quat, Vec3, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0,
};

use crate::picking::Ray;

/// Elevation clamp (radians); keeps the view off the poles.
const MAX_ELEVATION: f64 = 1.55;

/// Radians of orbit per pixel dragged.
const ROTATE_SPEED: f64 = 0.005;

/// Exponential zoom factor per wheel delta unit.
const ZOOM_SPEED: f64 = 0.0015;

/// Damping rate (per second) for angle and distance easing.
const DAMPING: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSettings {
    /// Vertical field of view (radians).
    pub fov_y_rad: f64,
    /// Distance from target on mount and after `reset`.
    pub initial_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Initial heading around +Y (radians).
    pub initial_yaw_rad: f64,
    /// Initial angle above the horizontal plane (radians).
    pub initial_elevation_rad: f64,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            fov_y_rad: 55f64.to_radians(),
            initial_distance: 120.0,
            min_distance: 15.0,
            max_distance: 300.0,
            initial_yaw_rad: 0.0,
            initial_elevation_rad: 35f64.to_radians(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    settings: OrbitSettings,

    /// Point the camera orbits and looks at.
    pub target: Vec3,

    yaw: f64,
    elevation: f64,
    distance: f64,

    goal_yaw: f64,
    goal_elevation: f64,
    goal_distance: f64,

    /// Viewport size in CSS pixels.
    width: f64,
    height: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

impl OrbitCamera {
    pub fn new(settings: OrbitSettings) -> Self {
        let distance = settings
            .initial_distance
            .clamp(settings.min_distance, settings.max_distance);
        let elevation = settings
            .initial_elevation_rad
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);
        Self {
            settings,
            target: Vec3::ZERO,
            yaw: settings.initial_yaw_rad,
            elevation,
            distance,
            goal_yaw: settings.initial_yaw_rad,
            goal_elevation: elevation,
            goal_distance: distance,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    /// Record the viewport size. Zero sizes are kept as-is so callers can
    /// detect and skip rendering.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// `None` when the viewport has no area.
    pub fn aspect(&self) -> Option<f64> {
        (self.width >= 1.0 && self.height >= 1.0).then(|| self.width / self.height)
    }

    /// Accumulate a drag of `(dx, dy)` pixels.
    pub fn orbit_by(&mut self, dx_px: f64, dy_px: f64) {
        self.goal_yaw -= dx_px * ROTATE_SPEED;
        self.goal_elevation =
            (self.goal_elevation + dy_px * ROTATE_SPEED).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Accumulate a wheel step (positive = zoom out).
    pub fn zoom_by(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.goal_distance = (self.goal_distance * (delta * ZOOM_SPEED).exp())
            .clamp(self.settings.min_distance, self.settings.max_distance);
    }

    /// Ease the visible camera toward the goal state.
    ///
    /// Returns `true` while the camera is still moving.
    pub fn update(&mut self, dt: f64) -> bool {
        let dt = dt.clamp(0.0, 0.1);
        let alpha = 1.0 - (-DAMPING * dt).exp();
        self.yaw += (self.goal_yaw - self.yaw) * alpha;
        self.elevation += (self.goal_elevation - self.elevation) * alpha;
        self.distance += (self.goal_distance - self.distance) * alpha;
        self.distance = self
            .distance
            .clamp(self.settings.min_distance, self.settings.max_distance);

        (self.goal_yaw - self.yaw).abs() > 1e-5
            || (self.goal_elevation - self.elevation).abs() > 1e-5
            || (self.goal_distance - self.distance).abs() > 1e-4
    }

    pub fn reset(&mut self) {
        let (w, h) = (self.width, self.height);
        let target = self.target;
        *self = Self::new(self.settings);
        self.target = target;
        self.set_viewport(w, h);
    }

    pub fn yaw_rad(&self) -> f64 {
        self.yaw
    }

    pub fn elevation_rad(&self) -> f64 {
        self.elevation
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Camera orientation; local -Z looks at the target, local +Y is up.
    pub fn orientation(&self) -> Quat {
        Quat::from_yaw_pitch(self.yaw, -self.elevation)
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.orientation().rotate(Vec3::new(0.0, 0.0, self.distance))
    }

    pub fn right(&self) -> Vec3 {
        self.orientation().rotate(Vec3::new(1.0, 0.0, 0.0))
    }

    pub fn up(&self) -> Vec3 {
        self.orientation().rotate(Vec3::UP)
    }

    pub fn near_far(&self) -> (f64, f64) {
        let near = (self.distance * 0.01).max(0.05);
        let far = (self.distance * 4.0 + 500.0).max(near + 1.0);
        (near, far)
    }

    pub fn view_matrix(&self) -> Mat4 {
        mat4_look_at_rh(self.eye(), self.target, self.up())
    }

    /// `None` for a zero-size viewport.
    pub fn view_proj(&self) -> Option<Mat4> {
        let aspect = self.aspect()?;
        let (near, far) = self.near_far();
        let proj = mat4_perspective_rh_z0(self.settings.fov_y_rad, aspect, near, far);
        Some(mat4_mul(proj, self.view_matrix()))
    }

    /// World-space ray through a viewport pixel.
    pub fn ray_from_screen(&self, x_px: f64, y_px: f64) -> Option<Ray> {
        let aspect = self.aspect()?;
        let ndc_x = (x_px / self.width) * 2.0 - 1.0;
        let ndc_y = -(y_px / self.height) * 2.0 + 1.0;
        let tan = (self.settings.fov_y_rad * 0.5).tan();
        let local = Vec3::new(ndc_x * tan * aspect, ndc_y * tan, -1.0);
        let dir = self.orientation().rotate(local).normalize()?;
        Some(Ray::new(self.eye(), dir))
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_ELEVATION, OrbitCamera, OrbitSettings};
    use foundation::math::Vec3;

    fn camera() -> OrbitCamera {
        let mut c = OrbitCamera::new(OrbitSettings::default());
        c.set_viewport(800.0, 600.0);
        c
    }

    #[test]
    fn eye_sits_at_distance_above_plane() {
        let c = camera();
        assert!((c.eye().distance(c.target) - c.distance()).abs() < 1e-9);
        assert!(c.eye().y > 0.0);
    }

    #[test]
    fn center_ray_points_at_target() {
        let c = camera();
        let ray = c.ray_from_screen(400.0, 300.0).expect("ray");
        let to_target = (c.target - ray.origin).normalize().expect("dir");
        assert!(ray.dir.distance(to_target) < 1e-9);
    }

    #[test]
    fn zero_viewport_has_no_projection_or_ray() {
        let mut c = OrbitCamera::default();
        c.set_viewport(0.0, 600.0);
        assert!(c.aspect().is_none());
        assert!(c.view_proj().is_none());
        assert!(c.ray_from_screen(1.0, 1.0).is_none());
    }

    #[test]
    fn drag_moves_goal_and_update_eases_toward_it() {
        let mut c = camera();
        let start_yaw = c.yaw_rad();
        c.orbit_by(100.0, 0.0);
        assert_eq!(c.yaw_rad(), start_yaw);

        assert!(c.update(1.0 / 60.0));
        let after_one = c.yaw_rad();
        assert!(after_one < start_yaw);

        for _ in 0..600 {
            c.update(1.0 / 60.0);
        }
        assert!((c.yaw_rad() - (start_yaw - 0.5)).abs() < 1e-4);
        assert!(!c.update(1.0 / 60.0));
    }

    #[test]
    fn elevation_and_zoom_are_clamped() {
        let mut c = camera();
        c.orbit_by(0.0, 1.0e6);
        c.zoom_by(1.0e6);
        for _ in 0..600 {
            c.update(0.1);
        }
        assert!(c.elevation_rad() <= MAX_ELEVATION);
        assert!((c.distance() - c.settings().max_distance).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_initial_view() {
        let mut c = camera();
        c.orbit_by(250.0, -40.0);
        c.zoom_by(-300.0);
        for _ in 0..100 {
            c.update(0.1);
        }
        c.reset();
        let fresh = camera();
        assert_eq!(c.eye(), fresh.eye());
        assert_eq!(c.viewport(), (800.0, 600.0));
        assert_eq!(c.target, Vec3::ZERO);
    }
}
