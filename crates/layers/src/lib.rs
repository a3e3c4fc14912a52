pub mod animation;
pub mod builder;
pub mod config;
pub mod copy;
pub mod filter;
pub mod hazard;
pub mod interaction;
pub mod labels;
pub mod poi;
pub mod session;
pub mod symbology;

pub use builder::{BuildReport, MarkerRegistry, SceneBuilder, SceneMarker};
pub use config::{ConfigError, MapConfig};
pub use poi::{Category, Poi, PoiError, PoiSet, parse_poi_list};
pub use session::MapSession;
