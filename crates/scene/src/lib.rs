//! Scene math: object transforms and the perspective camera.

pub mod camera;
pub mod transform;

pub use camera::{Camera, aspect_ratio};
pub use transform::Transform;
