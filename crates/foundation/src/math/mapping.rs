//! Domain-to-scene coordinate normalization.
//!
//! Points are authored in a large, arbitrary-range domain frame where +Z is
//! altitude. The scene frame is Y-up and fits inside a fixed radius:
//!
//! - `x' = (x - cx) * scale`
//! - `y' = (z - cz) * scale`
//! - `z' = -(y - cy) * scale`

use super::Vec3;

/// Default extent (scene units) that the widest domain axis is fitted to.
pub const DEFAULT_TARGET_RADIUS: f64 = 50.0;

/// Default floor for the domain range (domain units). A single point maps
/// with `scale = target / floor`.
pub const DEFAULT_MIN_RANGE: f64 = 1.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoordinateMapper {
    center: Vec3,
    range: f64,
    scale: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::fit(std::iter::empty(), DEFAULT_TARGET_RADIUS, DEFAULT_MIN_RANGE)
    }
}

impl CoordinateMapper {
    /// Fit a mapper to the given domain points.
    ///
    /// An empty input yields a mapper centered on the domain origin.
    pub fn fit<I>(points: I, target_radius: f64, min_range: f64) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let target_radius = positive_or(target_radius, DEFAULT_TARGET_RADIUS);
        let min_range = positive_or(min_range, DEFAULT_MIN_RANGE);

        let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;
        for p in points {
            if !p.is_finite() {
                continue;
            }
            any = true;
            min = Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }

        if !any {
            return Self {
                center: Vec3::ZERO,
                range: min_range,
                scale: target_radius / min_range,
            };
        }

        let center = Vec3::new(
            (min.x + max.x) * 0.5,
            (min.y + max.y) * 0.5,
            (min.z + max.z) * 0.5,
        );
        let extent = max - min;
        let range = extent.x.max(extent.y).max(extent.z).max(min_range);

        Self {
            center,
            range,
            scale: target_radius / range,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn to_scene(&self, p: Vec3) -> Vec3 {
        let d = p - self.center;
        Vec3::new(d.x * self.scale, d.z * self.scale, -d.y * self.scale)
    }
}

fn positive_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateMapper, DEFAULT_MIN_RANGE};
    use crate::math::Vec3;

    fn spread(points: &[Vec3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for axis in 0..3 {
            let vals: Vec<f64> = points.iter().map(|p| p.to_array()[axis]).collect();
            let lo = vals.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            out[axis] = hi - lo;
        }
        out
    }

    #[test]
    fn single_point_maps_to_origin() {
        let p = Vec3::new(79_228.4, 57_341.9, 25.0);
        let m = CoordinateMapper::fit([p], 50.0, DEFAULT_MIN_RANGE);
        assert_eq!(m.to_scene(p), Vec3::ZERO);
        assert_eq!(m.range(), DEFAULT_MIN_RANGE);
    }

    #[test]
    fn spread_stays_within_target_radius() {
        let pts = vec![
            Vec3::new(-120_000.0, 4_000.0, 10.0),
            Vec3::new(310_000.0, -90_000.0, 2_500.0),
            Vec3::new(12.0, 250_000.0, -800.0),
            Vec3::new(5_000.0, 5_000.0, 5_000.0),
        ];
        let m = CoordinateMapper::fit(pts.iter().copied(), 50.0, 1.0);
        let mapped: Vec<Vec3> = pts.iter().map(|p| m.to_scene(*p)).collect();
        for s in spread(&mapped) {
            assert!(s <= 50.0 + 1e-9, "spread {s} exceeds radius");
        }
    }

    #[test]
    fn altitude_becomes_vertical_and_north_recedes() {
        let pts = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 100.0, 0.0), Vec3::new(0.0, 0.0, 100.0)];
        let m = CoordinateMapper::fit(pts, 10.0, 1.0);
        let north = m.to_scene(pts[1]);
        let up = m.to_scene(pts[2]);
        let origin = m.to_scene(pts[0]);
        assert!(north.z < origin.z);
        assert!(up.y > origin.y);
        assert_eq!(north.x, origin.x);
    }

    #[test]
    fn degenerate_inputs_fall_back_to_floor() {
        let m = CoordinateMapper::fit(std::iter::empty(), 50.0, 1.0);
        assert_eq!(m.center(), Vec3::ZERO);
        assert_eq!(m.scale(), 50.0);

        let bad = CoordinateMapper::fit([Vec3::new(1.0, 1.0, 1.0)], f64::NAN, -4.0);
        assert_eq!(bad.range(), DEFAULT_MIN_RANGE);
        assert!(bad.scale().is_finite());
    }
}
