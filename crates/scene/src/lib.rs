pub mod camera;
pub mod components;
pub mod entity;
pub mod picking;
pub mod render;
pub mod selection;
pub mod world;

pub use world::*;
