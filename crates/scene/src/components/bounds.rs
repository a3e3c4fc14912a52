use foundation::math::Vec3;

/// Bounding sphere used for ray picking, in local (unscaled) units.
///
/// Only entities carrying this component can be picked.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickBounds {
    pub radius: f64,
}

impl PickBounds {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn contains(&self, center: Vec3, scale: f64, point: Vec3) -> bool {
        point.distance(center) <= self.radius * scale
    }
}
