//! Texture file decoding.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use inflight_resources::TextureData;
//!
//! let texture = TextureData::load_or_placeholder(Path::new("assets/textures/RedRock05_2K_BaseColor.png"));
//! assert_eq!(texture.pixels.len(), (texture.width * texture.height * 4) as usize);
//! ```

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ResourceError, ResourceResult};

/// Opaque magenta, easy to spot on screen.
pub const PLACEHOLDER_PIXEL: [u8; 4] = [255, 0, 255, 255];

/// Decoded image: tightly packed RGBA8 rows, bottom row first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decodes `path` into RGBA8 and flips it vertically.
    ///
    /// The flip puts the first stored row at `v = 1`, matching the quad's
    /// texture coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::FileNotFound`] if `path` does not exist, or
    /// [`ResourceError::Image`] if it cannot be decoded.
    pub fn load(path: &Path) -> ResourceResult<Self> {
        if !path.exists() {
            return Err(ResourceError::FileNotFound(path.to_path_buf()));
        }

        let image = image::open(path)?.flipv().into_rgba8();
        let (width, height) = image.dimensions();

        debug!("Decoded {:?}: {}x{}", path, width, height);

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    /// Like [`TextureData::load`], substituting [`TextureData::placeholder`]
    /// and logging a warning when the file cannot be decoded.
    pub fn load_or_placeholder(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Using placeholder texture for {:?}: {}", path, e);
            Self::placeholder()
        })
    }

    /// 1x1 opaque magenta.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: PLACEHOLDER_PIXEL.to_vec(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.width == 1 && self.height == 1 && self.pixels == PLACEHOLDER_PIXEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let texture = TextureData::placeholder();
        assert_eq!((texture.width, texture.height), (1, 1));
        assert_eq!(texture.pixels, vec![255, 0, 255, 255]);
        assert!(texture.is_placeholder());
    }

    #[test]
    fn test_missing_file() {
        let result = TextureData::load(Path::new("does/not/exist.png"));
        assert!(matches!(result, Err(ResourceError::FileNotFound(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let texture = TextureData::load_or_placeholder(Path::new("does/not/exist.png"));
        assert!(texture.is_placeholder());
    }
}
