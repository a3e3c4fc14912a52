//! Clipboard text for the selected POI.

use foundation::format::group_thousands;

use crate::poi::Poi;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn parse(raw: &str) -> Option<Axis> {
        match raw.trim() {
            "x" | "X" => Some(Axis::X),
            "y" | "Y" => Some(Axis::Y),
            "z" | "Z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn of(self, poi: &Poi) -> f64 {
        match self {
            Axis::X => poi.x,
            Axis::Y => poi.y,
            Axis::Z => poi.z,
        }
    }
}

/// Whole domain units, dropping the fractional part.
fn whole(v: f64) -> i64 {
    if v.is_finite() { v.trunc() as i64 } else { 0 }
}

/// One coordinate, grouped for display and copy (`79,228`).
pub fn coordinate_text(poi: &Poi, axis: Axis) -> String {
    group_thousands(whole(axis.of(poi)))
}

/// In-game waypoint command: `/wp [name, x, y, z]`.
///
/// Grouping separators would collide with the argument separators, so the
/// numbers are written without them.
pub fn waypoint_text(poi: &Poi) -> String {
    format!(
        "/wp [{}, {}, {}, {}]",
        poi.name,
        whole(poi.x),
        whole(poi.y),
        whole(poi.z)
    )
}

#[cfg(test)]
mod tests {
    use super::{Axis, coordinate_text, waypoint_text};
    use crate::poi::{Category, Poi};

    fn alpha() -> Poi {
        Poi::new("alpha", "Alpha", Category::Station, [79_228.4, 57_341.9, 25.0])
    }

    #[test]
    fn waypoint_format_is_exact() {
        assert_eq!(waypoint_text(&alpha()), "/wp [Alpha, 79228, 57341, 25]");
    }

    #[test]
    fn negative_waypoint_truncates_toward_zero() {
        let p = Poi::new("n", "Neg", Category::Outpost, [-1_500.7, 0.2, -0.9]);
        assert_eq!(waypoint_text(&p), "/wp [Neg, -1500, 0, 0]");
    }

    #[test]
    fn coordinate_is_grouped() {
        assert_eq!(coordinate_text(&alpha(), Axis::X), "79,228");
        assert_eq!(Axis::parse("Y"), Some(Axis::Y));
        assert_eq!(Axis::parse("w"), None);
    }
}
