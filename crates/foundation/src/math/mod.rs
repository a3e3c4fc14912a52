pub mod mapping;
pub mod mat4;
pub mod precision;
pub mod quat;
pub mod vec;

pub use mapping::*;
pub use mat4::*;
pub use precision::*;
pub use quat::*;
pub use vec::*;
