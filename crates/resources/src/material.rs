//! Material texture triples and the default scene's mesh list.

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::texture::TextureData;

/// File names of the three textures a mesh samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialPaths {
    pub base_color: PathBuf,
    pub roughness: PathBuf,
    pub metallic: PathBuf,
}

impl MaterialPaths {
    pub fn new(
        base_color: impl Into<PathBuf>,
        roughness: impl Into<PathBuf>,
        metallic: impl Into<PathBuf>,
    ) -> Self {
        Self {
            base_color: base_color.into(),
            roughness: roughness.into(),
            metallic: metallic.into(),
        }
    }

    /// Paths joined onto `texture_dir`, in binding order.
    pub fn resolve(&self, texture_dir: &Path) -> [PathBuf; 3] {
        [
            texture_dir.join(&self.base_color),
            texture_dir.join(&self.roughness),
            texture_dir.join(&self.metallic),
        ]
    }

    /// Decodes all three textures, substituting placeholders for failures.
    pub fn load(&self, texture_dir: &Path) -> MaterialTextures {
        let [base_color, roughness, metallic] = self.resolve(texture_dir);
        MaterialTextures {
            base_color: TextureData::load_or_placeholder(&base_color),
            roughness: TextureData::load_or_placeholder(&roughness),
            metallic: TextureData::load_or_placeholder(&metallic),
        }
    }
}

/// Decoded texture triple.
#[derive(Clone, Debug)]
pub struct MaterialTextures {
    pub base_color: TextureData,
    pub roughness: TextureData,
    pub metallic: TextureData,
}

impl MaterialTextures {
    /// Textures in descriptor binding order (1, 2, 3).
    pub fn in_binding_order(&self) -> [&TextureData; 3] {
        [&self.base_color, &self.roughness, &self.metallic]
    }
}

/// A quad to place in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshDescriptor {
    pub name: String,
    pub position: Vec3,
    pub material: MaterialPaths,
}

/// The three textured quads shown at startup.
pub fn default_scene() -> Vec<MeshDescriptor> {
    vec![
        MeshDescriptor {
            name: "brown rock".to_string(),
            position: Vec3::new(-1.0, 0.0, -2.0),
            material: MaterialPaths::new(
                "BrownRock09_2K_BaseColor.png",
                "BrownRock09_2K_Roughness.png",
                "BrownRock09_2K_Metallic.png",
            ),
        },
        MeshDescriptor {
            name: "red rock".to_string(),
            position: Vec3::new(1.0, 0.0, -2.0),
            material: MaterialPaths::new(
                "RedRock05_2K_BaseColor.png",
                "RedRock05_2K_Roughness.png",
                "RedRock05_2K_Metallic.png",
            ),
        },
        MeshDescriptor {
            name: "vintage glass".to_string(),
            position: Vec3::new(0.0, 0.0, -3.5),
            material: MaterialPaths::new(
                "Glass_Vintage_001_basecolor.png",
                "Glass_Vintage_001_roughness.jpg",
                "Glass_Vintage_001_metallic.png",
            ),
        },
    ]
}
