//! Offline inspection of authored POI files.

use std::fmt::Write as _;

use foundation::format::format_grouped;
use layers::copy::waypoint_text;
use layers::labels::{LabelFactory, LabelStyle, RecordingCanvas};
use layers::{MapConfig, MarkerRegistry, PoiError, SceneBuilder, parse_poi_list};
use scene::World;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub center: [f64; 3],
    pub range: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerReport {
    pub id: String,
    pub name: String,
    pub category: String,
    pub category_name: String,
    pub domain: [f64; 3],
    pub scene: [f64; 3],
    pub waypoint: String,
    pub pvp_lootable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    pub category: String,
    pub centroid: [f64; 3],
    pub radius: f64,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub diagnostics: Vec<String>,
    pub mapping: MappingReport,
    pub markers: Vec<MarkerReport>,
    pub hazard: Option<HazardReport>,
}

/// Run the scene builder over `json` the way a mounted map would and
/// summarize the result.
pub fn inspect(json: &str, config: &MapConfig) -> Result<InspectReport, PoiError> {
    let set = parse_poi_list(json)?;
    let builder = SceneBuilder::new(config);
    let mut world = World::new();
    let mut registry = MarkerRegistry::new();
    let mut labels = LabelFactory::new(
        RecordingCanvas::default(),
        LabelStyle::default(),
        config.label_width_px,
        config.label_height_px,
    );
    let build = builder.rebuild(&set.pois, &mut world, &mut registry, &mut labels);

    let mapper = registry.mapper();
    let markers = set
        .pois
        .iter()
        .map(|poi| MarkerReport {
            id: poi.id.clone(),
            name: poi.name.clone(),
            category: poi.category.key().to_string(),
            category_name: poi.category.display_name().to_string(),
            domain: poi.position().to_array(),
            scene: mapper.to_scene(poi.position()).to_array(),
            waypoint: waypoint_text(poi),
            pvp_lootable: poi.pvp_lootable,
        })
        .collect();

    Ok(InspectReport {
        diagnostics: set.diagnostics.iter().map(ToString::to_string).collect(),
        mapping: MappingReport {
            center: mapper.center().to_array(),
            range: mapper.range(),
            scale: mapper.scale(),
        },
        markers,
        hazard: build.hazard.map(|h| HazardReport {
            category: builder.hazard_category().key().to_string(),
            centroid: h.centroid.to_array(),
            radius: h.radius,
            members: h.members,
        }),
    })
}

/// Waypoint string for one POI id, if present.
pub fn waypoint(json: &str, id: &str) -> Result<Option<String>, PoiError> {
    let set = parse_poi_list(json)?;
    Ok(set.pois.iter().find(|p| p.id == id).map(waypoint_text))
}

fn fmt3(v: [f64; 3]) -> String {
    format!("({:.2}, {:.2}, {:.2})", v[0], v[1], v[2])
}

pub fn render_text(report: &InspectReport) -> String {
    let mut out = String::new();
    let m = &report.mapping;
    let _ = writeln!(
        out,
        "mapping: center {} range {} scale {:.6}",
        fmt3(m.center),
        format_grouped(m.range),
        m.scale
    );
    let _ = writeln!(out, "markers: {}", report.markers.len());
    for marker in &report.markers {
        let _ = writeln!(
            out,
            "  {:<16} {:<14} scene {}  {}{}",
            marker.id,
            marker.category_name,
            fmt3(marker.scene),
            marker.waypoint,
            if marker.pvp_lootable { "  [pvp]" } else { "" }
        );
    }
    match &report.hazard {
        Some(h) => {
            let _ = writeln!(
                out,
                "hazard: {} members of {} around {} radius {:.2}",
                h.members,
                h.category,
                fmt3(h.centroid),
                h.radius
            );
        }
        None => {
            let _ = writeln!(out, "hazard: none");
        }
    }
    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "diagnostics:");
        for d in &report.diagnostics {
            let _ = writeln!(out, "  {d}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{inspect, render_text, waypoint};
    use layers::MapConfig;
    use pretty_assertions::assert_eq;

    const FILE: &str = r#"[
        {"id": "alpha", "name": "Alpha", "category": "asteroid_belt", "x": 79228.7, "y": 57341.9, "z": 25.2},
        {"id": "c1", "name": "Redline", "category": "contested", "x": 0, "y": 0, "z": 0, "pvpLootable": true},
        {"id": "c2", "name": "Blackout", "category": "contested", "x": 1000, "y": 0, "z": 0},
        {"id": "broken", "name": "Nowhere", "category": "outpost", "x": "far", "y": 0, "z": 0}
    ]"#;

    #[test]
    fn inspect_reports_markers_hazard_and_diagnostics() {
        let report = inspect(FILE, &MapConfig::default()).expect("inspect");
        assert_eq!(report.markers.len(), 3);
        assert_eq!(report.markers[0].waypoint, "/wp [Alpha, 79228, 57341, 25]");
        let hazard = report.hazard.as_ref().expect("two contested members");
        assert_eq!(hazard.members, 2);
        assert_eq!(hazard.category, "contested");
        assert_eq!(report.diagnostics.len(), 1);

        let text = render_text(&report);
        assert!(text.contains("markers: 3"));
        assert!(text.contains("[pvp]"));
        assert!(text.contains("Asteroid Belt"));
    }

    #[test]
    fn waypoint_lookup() {
        assert_eq!(
            waypoint(FILE, "alpha").expect("parse").as_deref(),
            Some("/wp [Alpha, 79228, 57341, 25]")
        );
        assert_eq!(waypoint(FILE, "missing").expect("parse"), None);
    }

    #[test]
    fn widest_axis_spans_target_radius() {
        let report = inspect(FILE, &MapConfig::default()).expect("inspect");
        let xs: Vec<f64> = report.markers.iter().map(|m| m.scene[0]).collect();
        let lo = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((hi - lo - 50.0).abs() < 1e-6, "got {}", hi - lo);
    }
}
