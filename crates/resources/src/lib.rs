//! Asset side of the renderer.
//!
//! - Decoding texture files into RGBA8 pixels
//! - The quad mesh every drawable uses
//! - Mesh descriptors naming a position and a material texture triple

mod error;

pub mod material;
pub mod mesh;
pub mod texture;

pub use error::{ResourceError, ResourceResult};
pub use material::{MaterialPaths, MaterialTextures, MeshDescriptor, default_scene};
pub use mesh::MeshData;
pub use texture::TextureData;
