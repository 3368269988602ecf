//! inflight - Main Entry Point
//!
//! Opens a window, draws three textured quads with a frames-in-flight
//! Vulkan renderer and lets the keyboard move the camera and the quads.
//!
//! Usage: `inflight [config.toml]`

mod controls;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use inflight_core::{FrameTimer, RendererConfig};
use inflight_platform::{InputState, KeyCode, Window};
use inflight_renderer::{Renderer, TickOutcome};

use crate::controls::SceneControls;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

struct App {
    config: RendererConfig,
    // Declared before the window so it is dropped first.
    renderer: Option<Renderer>,
    window: Option<Window>,
    input: InputState,
    controls: SceneControls,
    timer: FrameTimer,
    /// Initialization failure, reported by `main` after the loop exits.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            input: InputState::new(),
            controls: SceneControls::new(),
            timer: FrameTimer::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut window =
            Window::new(event_loop, &self.config.window).context("Failed to create window")?;
        let renderer =
            Renderer::new(&mut window, &self.config).context("Failed to create renderer")?;

        self.renderer = Some(renderer);
        self.window = Some(window);
        self.timer.reset();
        Ok(())
    }

    fn redraw(&mut self) {
        let delta = self.timer.tick();

        let (Some(window), Some(renderer)) = (self.window.as_mut(), self.renderer.as_mut()) else {
            return;
        };

        // Nothing can be presented to a zero-sized surface.
        if window.is_minimized() {
            return;
        }

        self.controls
            .update(&self.input, renderer.scene_mut(), delta);
        self.input.begin_frame();

        match renderer.render_frame(window) {
            Ok(TickOutcome::Skipped(result)) => debug!("Frame skipped: {:?}", result),
            Ok(_) => {}
            Err(e) => error!("Render error: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(()) => info!("Initialization complete, entering main loop"),
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(window) = self.window.as_mut() {
                    window.notify_resized();
                }
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        if key == KeyCode::Escape {
                            info!("Escape pressed, shutting down");
                            event_loop.exit();
                        }
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // The renderer waits for the GPU and must go before the window.
        self.renderer = None;
        self.window = None;
    }
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = RendererConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    inflight_core::init_logging(&config.debug.log_filter);
    info!("Starting inflight ({} frames in flight)", config.graphics.frames_in_flight);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
