//! Renderer configuration loaded from `config.toml`.
//!
//! The configuration is an immutable value: it is built once at startup,
//! validated, and then passed by reference to whatever needs it. Every
//! field has a default, so a missing file or a partial file is fine.
//!
//! ```toml
//! [window]
//! title = "inflight"
//! width = 1280
//! height = 720
//!
//! [graphics]
//! frames_in_flight = 2
//! prefer_mailbox = true
//! clear_color = [0.0, 0.0, 0.0, 1.0]
//!
//! [debug]
//! validation_layers = true
//! log_filter = "info,inflight=debug"
//!
//! [assets]
//! shader_dir = "shaders"
//! texture_dir = "assets/textures"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::logging::DEFAULT_LOG_FILTER;

/// Largest number of frames the CPU may run ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 3;

/// Root configuration structure.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
    pub assets: AssetConfig,
}

/// Window settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "inflight".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Frame pacing and presentation settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Number of frame slots (N).
    pub frames_in_flight: usize,
    /// Use MAILBOX when the surface offers it, FIFO otherwise.
    pub prefer_mailbox: bool,
    pub clear_color: [f32; 4],
    /// Upper bound for the per-slot fence wait, in nanoseconds.
    pub fence_timeout_ns: u64,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            prefer_mailbox: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fence_timeout_ns: u64::MAX,
        }
    }
}

/// Debug settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    /// Used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: cfg!(debug_assertions),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Asset locations.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub shader_dir: PathBuf,
    pub texture_dir: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            texture_dir: PathBuf::from("assets/textures"),
        }
    }
}

impl RendererConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults. The loaded value is validated
    /// before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file exists but cannot be read, and
    /// [`Error::Config`] if it does not parse or fails [`validate`](Self::validate).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;

        info!("Loaded configuration from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RendererConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the renderer relies on.
    pub fn validate(&self) -> Result<()> {
        let n = self.graphics.frames_in_flight;
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&n) {
            return Err(Error::Config(format!(
                "graphics.frames_in_flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, n
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if self.graphics.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(Error::Config(format!(
                "graphics.clear_color must be finite, got {:?}",
                self.graphics.clear_color
            )));
        }

        Ok(())
    }

    /// Full path of a shader file inside the configured shader directory.
    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.assets.shader_dir.join(file_name)
    }
}
