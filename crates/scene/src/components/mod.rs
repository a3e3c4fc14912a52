pub mod bounds;
pub mod drawable3d;
pub mod material;
pub mod transform;
pub mod visibility;

pub use bounds::*;
pub use drawable3d::*;
pub use material::*;
pub use transform::*;
pub use visibility::*;
