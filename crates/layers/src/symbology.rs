//! Category to visual attribute tables.

use crate::poi::Category;

/// Core radius (scene units) for ordinary markers.
pub const CORE_RADIUS: f64 = 1.0;

/// Core radius for landmark markers.
pub const LANDMARK_CORE_RADIUS: f64 = 1.8;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoreShape {
    Octahedron,
    Sphere,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CategoryStyle {
    pub color: [f32; 3],
    pub core_shape: CoreShape,
    pub core_radius: f64,
    /// Resting emissive level.
    pub emissive: f32,
}

/// Hazard dot and zone color.
pub const HAZARD_COLOR: [f32; 3] = [1.0, 0.18, 0.22];

pub fn category_color(category: Category) -> [f32; 3] {
    match category {
        Category::Station => [0.30, 0.85, 1.00],
        Category::Outpost => [0.55, 0.95, 0.55],
        Category::AsteroidBelt => [0.95, 0.70, 0.30],
        Category::GasCloud => [0.75, 0.45, 1.00],
        Category::Salvage => [0.85, 0.85, 0.60],
        Category::Derelict => [0.60, 0.62, 0.70],
        Category::Anomaly => [1.00, 0.40, 0.85],
        Category::Contested => [1.00, 0.30, 0.25],
        Category::Unknown => [0.80, 0.80, 0.80],
    }
}

pub fn category_style(category: Category) -> CategoryStyle {
    let color = category_color(category);
    match category {
        Category::Station => CategoryStyle {
            color,
            core_shape: CoreShape::Sphere,
            core_radius: LANDMARK_CORE_RADIUS,
            emissive: 0.35,
        },
        Category::Outpost
        | Category::AsteroidBelt
        | Category::GasCloud
        | Category::Salvage
        | Category::Derelict
        | Category::Anomaly
        | Category::Contested
        | Category::Unknown => CategoryStyle {
            color,
            core_shape: CoreShape::Octahedron,
            core_radius: CORE_RADIUS,
            emissive: 0.15,
        },
    }
}

/// CSS color string for label text.
pub fn css_color(rgb: [f32; 3]) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", c(rgb[0]), c(rgb[1]), c(rgb[2]))
}
