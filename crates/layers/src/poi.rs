//! Point-of-interest model and tolerant ingestion of authored POI lists.

use std::collections::HashSet;
use std::fmt;

use foundation::math::precision::{MAX_DOMAIN_COORDINATE, Sanitized, sanitize_coordinate};
use foundation::math::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Closed set of POI categories. Unrecognized keys become `Unknown`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Category {
    Station,
    Outpost,
    AsteroidBelt,
    GasCloud,
    Salvage,
    Derelict,
    Anomaly,
    Contested,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Station,
        Category::Outpost,
        Category::AsteroidBelt,
        Category::GasCloud,
        Category::Salvage,
        Category::Derelict,
        Category::Anomaly,
        Category::Contested,
        Category::Unknown,
    ];

    /// Stable lowercase key used in filters and wire formats.
    pub fn key(self) -> &'static str {
        match self {
            Category::Station => "station",
            Category::Outpost => "outpost",
            Category::AsteroidBelt => "asteroid_belt",
            Category::GasCloud => "gas_cloud",
            Category::Salvage => "salvage",
            Category::Derelict => "derelict",
            Category::Anomaly => "anomaly",
            Category::Contested => "contested",
            Category::Unknown => "unknown",
        }
    }

    /// Parse a category key; case, hyphens and spaces are ignored.
    pub fn from_key(raw: &str) -> Category {
        let key: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "station" => Category::Station,
            "outpost" => Category::Outpost,
            "asteroid_belt" | "asteroid" | "asteroids" => Category::AsteroidBelt,
            "gas_cloud" | "gas" => Category::GasCloud,
            "salvage" => Category::Salvage,
            "derelict" => Category::Derelict,
            "anomaly" => Category::Anomaly,
            "contested" => Category::Contested,
            _ => Category::Unknown,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Category::Station => "Station",
            Category::Outpost => "Outpost",
            Category::AsteroidBelt => "Asteroid Belt",
            Category::GasCloud => "Gas Cloud",
            Category::Salvage => "Salvage Field",
            Category::Derelict => "Derelict",
            Category::Anomaly => "Anomaly",
            Category::Contested => "Contested Zone",
            Category::Unknown => "Point of Interest",
        }
    }

    /// Stats type code for minable categories.
    pub fn type_code(self) -> Option<&'static str> {
        match self {
            Category::AsteroidBelt => Some("ASTEROID"),
            Category::GasCloud => Some("GAS"),
            Category::Salvage => Some("SALVAGE"),
            Category::Station
            | Category::Outpost
            | Category::Derelict
            | Category::Anomaly
            | Category::Contested
            | Category::Unknown => None,
        }
    }

    /// Landmark categories get a larger core and an idle glow.
    pub fn is_landmark(self) -> bool {
        matches!(self, Category::Station)
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Category::from_key(&raw)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pvp_lootable: bool,
    pub visible: bool,
}

impl Poi {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        position: [f64; 3],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            x: position[0],
            y: position[1],
            z: position[2],
            icon: None,
            description: None,
            pvp_lootable: false,
            visible: true,
        }
    }

    /// Domain-space position.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Debug, Error)]
pub enum PoiError {
    #[error("POI list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("POI list must be a JSON array or an object with a `pois` array")]
    NotAList,
}

/// Why a record was skipped or altered during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// Record is not an object or lacks an id.
    Unreadable(String),
    /// Coordinate axis missing, non-numeric or non-finite.
    InvalidCoordinate(char),
    /// Coordinate beyond the accepted magnitude, clamped.
    ClampedCoordinate(char),
    /// Id already used by an earlier record.
    DuplicateId,
    /// Blank name replaced by the id.
    EmptyName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiDiagnostic {
    /// Index of the record in the input list.
    pub index: usize,
    pub id: Option<String>,
    pub kind: DiagnosticKind,
}

impl PoiDiagnostic {
    /// Whether the record was dropped from the set.
    pub fn skipped(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::Unreadable(_)
                | DiagnosticKind::InvalidCoordinate(_)
                | DiagnosticKind::DuplicateId
        )
    }
}

impl fmt::Display for PoiDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_deref().unwrap_or("?");
        match &self.kind {
            DiagnosticKind::Unreadable(why) => {
                write!(f, "record #{} skipped: {why}", self.index)
            }
            DiagnosticKind::InvalidCoordinate(axis) => {
                write!(f, "poi `{id}` skipped: invalid {axis} coordinate")
            }
            DiagnosticKind::ClampedCoordinate(axis) => {
                write!(f, "poi `{id}`: {axis} coordinate clamped")
            }
            DiagnosticKind::DuplicateId => write!(f, "poi `{id}` skipped: duplicate id"),
            DiagnosticKind::EmptyName => write!(f, "poi `{id}`: empty name, using id"),
        }
    }
}

/// Accepted POIs plus what was dropped or fixed on the way in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiSet {
    pub pois: Vec<Poi>,
    pub diagnostics: Vec<PoiDiagnostic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoi {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    x: Value,
    #[serde(default)]
    y: Value,
    #[serde(default)]
    z: Value,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    pvp_lootable: Option<bool>,
    #[serde(default)]
    visible: Option<bool>,
}

/// Parse an authored POI list.
///
/// Only a syntactically invalid document is an error; individual malformed
/// records are skipped or clamped and reported in `PoiSet::diagnostics`.
pub fn parse_poi_list(json: &str) -> Result<PoiSet, PoiError> {
    let doc: Value = serde_json::from_str(json)?;
    let records = match doc {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("pois") {
            Some(Value::Array(items)) => items,
            _ => return Err(PoiError::NotAList),
        },
        _ => return Err(PoiError::NotAList),
    };
    Ok(ingest_records(records))
}

pub fn ingest_records(records: Vec<Value>) -> PoiSet {
    let mut set = PoiSet::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        let raw: RawPoi = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                report(&mut set, index, None, DiagnosticKind::Unreadable(e.to_string()));
                continue;
            }
        };

        let id = match raw.id {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                report(&mut set, index, None, DiagnosticKind::Unreadable("missing id".into()));
                continue;
            }
        };

        if seen.contains(&id) {
            report(&mut set, index, Some(&id), DiagnosticKind::DuplicateId);
            continue;
        }

        let mut coords = [0.0f64; 3];
        let mut invalid = None;
        for (slot, (axis, value)) in coords
            .iter_mut()
            .zip([('x', &raw.x), ('y', &raw.y), ('z', &raw.z)])
        {
            match sanitize_coordinate(coordinate_value(value), MAX_DOMAIN_COORDINATE) {
                Sanitized::Exact(v) => *slot = v,
                Sanitized::Clamped(v) => {
                    *slot = v;
                    report(&mut set, index, Some(&id), DiagnosticKind::ClampedCoordinate(axis));
                }
                Sanitized::Invalid => {
                    invalid = Some(axis);
                    break;
                }
            }
        }
        if let Some(axis) = invalid {
            report(&mut set, index, Some(&id), DiagnosticKind::InvalidCoordinate(axis));
            continue;
        }

        let name = match raw.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                report(&mut set, index, Some(&id), DiagnosticKind::EmptyName);
                id.clone()
            }
        };

        seen.insert(id.clone());
        set.pois.push(Poi {
            id,
            name,
            category: raw
                .category
                .as_deref()
                .map(Category::from_key)
                .unwrap_or(Category::Unknown),
            x: coords[0],
            y: coords[1],
            z: coords[2],
            icon: raw.icon,
            description: raw.description,
            pvp_lootable: raw.pvp_lootable.unwrap_or(false),
            visible: raw.visible.unwrap_or(true),
        });
    }

    set
}

fn coordinate_value(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn report(set: &mut PoiSet, index: usize, id: Option<&str>, kind: DiagnosticKind) {
    let diagnostic = PoiDiagnostic {
        index,
        id: id.map(str::to_string),
        kind,
    };
    warn!(index, poi_id = id.unwrap_or("?"), "{diagnostic}");
    set.diagnostics.push(diagnostic);
}
