//! Frame lifecycle and scene drawing.
//!
//! This crate orchestrates the rendering process:
//! - Per-slot fences and semaphores ([`FrameSyncSet`])
//! - Swapchain, depth attachment and framebuffers ([`PresentationSurface`])
//! - Per-slot uniform blocks and descriptor sets ([`FrameResourceSet`])
//! - The acquire / record / submit / present state machine ([`FrameLoop`])
//! - The textured-quad scene and its pipeline ([`Renderer`])

pub mod frame_loop;
pub mod frame_resources;
pub mod frame_sync;
pub mod mesh;
pub mod mesh_pipeline;
pub mod overlay;
pub mod presentation;
pub mod recorder;
pub mod renderer;
pub mod scene;
pub mod ubo;

#[cfg(test)]
mod testing;

pub use frame_loop::{
    FrameLoop, FrameRecorder, FrameState, FrameTarget, Presenter, SlotSync, SubmitQueue,
    SurfaceStatus, TickOutcome,
};
pub use frame_resources::{FrameResourceSet, UniformBlock};
pub use frame_sync::{FrameSyncSet, GraphicsQueue};
pub use overlay::Overlay;
pub use presentation::PresentationSurface;
pub use renderer::Renderer;
pub use scene::{CameraObject, Mesh, Scene};
pub use ubo::{CameraUbo, MeshUbo};
