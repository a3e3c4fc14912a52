use foundation::math::{DEFAULT_MIN_RANGE, DEFAULT_TARGET_RADIUS};
use scene::camera::OrbitSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::poi::Category;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("map config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map config field `{field}` {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for one mounted map. Every field has a default, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Extent (scene units) the widest domain axis is fitted to.
    pub target_scene_radius: f64,
    /// Floor for the domain range (domain units).
    pub min_range: f64,
    /// Added to the hazard zone radius (scene units).
    pub hazard_margin: f64,
    /// Category whose members form the hazard zone.
    pub hazard_category: Category,
    pub stats_endpoint: String,
    pub stats_window_hours: u32,
    pub stats_ttl_seconds: f64,
    pub fov_y_deg: f64,
    pub initial_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub label_width_px: u32,
    pub label_height_px: u32,
    /// `tracing` level for the browser console.
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            target_scene_radius: DEFAULT_TARGET_RADIUS,
            min_range: DEFAULT_MIN_RANGE,
            hazard_margin: 4.0,
            hazard_category: Category::Contested,
            stats_endpoint: "/api/mining/stats".to_string(),
            stats_window_hours: 24,
            stats_ttl_seconds: 60.0,
            fov_y_deg: 55.0,
            initial_distance: 120.0,
            min_distance: 15.0,
            max_distance: 300.0,
            label_width_px: 512,
            label_height_px: 128,
            log_level: "info".to_string(),
        }
    }
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = if json.trim().is_empty() {
            MapConfig::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("targetSceneRadius", self.target_scene_radius)?;
        positive("minRange", self.min_range)?;
        positive("statsTtlSeconds", self.stats_ttl_seconds)?;
        positive("minDistance", self.min_distance)?;
        positive("maxDistance", self.max_distance)?;
        if !self.hazard_margin.is_finite() || self.hazard_margin < 0.0 {
            return Err(invalid("hazardMargin", "must be a finite, non-negative number"));
        }
        if !(self.fov_y_deg > 1.0 && self.fov_y_deg < 179.0) {
            return Err(invalid("fovYDeg", "must be between 1 and 179 degrees"));
        }
        if self.min_distance > self.max_distance {
            return Err(invalid("minDistance", "must not exceed maxDistance"));
        }
        if self.label_width_px == 0 || self.label_height_px == 0 {
            return Err(invalid("labelWidthPx", "label bitmap must have an area"));
        }
        Ok(())
    }

    pub fn orbit_settings(&self) -> OrbitSettings {
        OrbitSettings {
            fov_y_rad: self.fov_y_deg.to_radians(),
            initial_distance: self.initial_distance,
            min_distance: self.min_distance,
            max_distance: self.max_distance,
            ..OrbitSettings::default()
        }
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite, positive number"))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MapConfig};
    use crate::poi::Category;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(MapConfig::from_json("{}").expect("config"), MapConfig::default());
        assert_eq!(MapConfig::from_json("").expect("config"), MapConfig::default());
    }

    #[test]
    fn camel_case_overrides() {
        let c = MapConfig::from_json(
            r#"{"targetSceneRadius": 80, "hazardCategory": "anomaly", "statsTtlSeconds": 30}"#,
        )
        .expect("config");
        assert_eq!(c.target_scene_radius, 80.0);
        assert_eq!(c.hazard_category, Category::Anomaly);
        assert_eq!(c.stats_ttl_seconds, 30.0);
        assert_eq!(c.stats_window_hours, 24);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = MapConfig::from_json(r#"{"minRange": 0}"#).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { field: "minRange", .. }));
        let err = MapConfig::from_json(r#"{"minDistance": 500}"#).expect_err("invalid");
        assert!(matches!(err, ConfigError::Invalid { field: "minDistance", .. }));
    }
}
