//! Core utilities shared by the renderer crates.
//!
//! - Error types and result aliases
//! - Logging initialization
//! - Immutable renderer configuration
//! - Frame timing

mod config;
mod error;
mod logging;
mod timer;

pub use config::{
    AssetConfig, DebugConfig, GraphicsConfig, MAX_FRAMES_IN_FLIGHT, RendererConfig, WindowConfig,
};
pub use error::{Error, Result};
pub use logging::{DEFAULT_LOG_FILTER, init_logging};
pub use timer::FrameTimer;
