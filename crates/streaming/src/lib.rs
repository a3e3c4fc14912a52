pub mod cache;
pub mod overlay;
pub mod protocol;
pub mod request;

pub use cache::*;
pub use overlay::*;
pub use protocol::*;
pub use request::*;
