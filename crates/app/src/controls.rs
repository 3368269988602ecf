//! Keyboard editing of the camera and the scene's meshes.
//!
//! | Key | Effect |
//! |-----|--------|
//! | Tab | select the next object (camera, then each mesh) |
//! | W / S | move forward / back |
//! | A / D | move left / right |
//! | Q / E | move down / up |
//! | Arrows | yaw (left/right) and pitch (up/down) |
//! | + / - | grow / shrink a mesh, narrow / widen the camera's field of view |

use glam::Vec3;
use inflight_platform::{InputState, KeyCode};
use inflight_renderer::{Scene, UniformBlock};
use inflight_scene::{Camera, Transform};
use tracing::info;

/// Units per second.
const MOVE_SPEED: f32 = 2.0;
/// Degrees per second.
const TURN_SPEED: f32 = 90.0;
/// Scale grows by `e^SCALE_RATE` per second held.
const SCALE_RATE: f32 = 1.0;
/// Field-of-view degrees per second.
const FOV_SPEED: f32 = 30.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Camera,
    Mesh(usize),
}

impl Selection {
    /// The object after this one, wrapping back to the camera.
    pub fn next(self, mesh_count: usize) -> Self {
        match self {
            Selection::Camera if mesh_count > 0 => Selection::Mesh(0),
            Selection::Mesh(i) if i + 1 < mesh_count => Selection::Mesh(i + 1),
            _ => Selection::Camera,
        }
    }
}

/// What the held keys ask for during one frame of `dt` seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    /// In the selected object's own frame; `-Z` is forward.
    pub translation: Vec3,
    /// Euler angles to add, in degrees.
    pub rotation_degrees: Vec3,
    /// Positive grows, negative shrinks.
    pub zoom: f32,
}

impl Motion {
    pub fn from_input(input: &InputState, dt: f32) -> Self {
        let translation = Vec3::new(
            input.axis(KeyCode::KeyA, KeyCode::KeyD),
            input.axis(KeyCode::KeyQ, KeyCode::KeyE),
            input.axis(KeyCode::KeyW, KeyCode::KeyS),
        ) * MOVE_SPEED
            * dt;

        let rotation_degrees = Vec3::new(
            input.axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
            input.axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
            0.0,
        ) * TURN_SPEED
            * dt;

        let grow = input.is_key_pressed(KeyCode::Equal) || input.is_key_pressed(KeyCode::NumpadAdd);
        let shrink =
            input.is_key_pressed(KeyCode::Minus) || input.is_key_pressed(KeyCode::NumpadSubtract);
        let zoom = (grow as i32 - shrink as i32) as f32 * dt;

        Self {
            translation,
            rotation_degrees,
            zoom,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.translation == Vec3::ZERO && self.rotation_degrees == Vec3::ZERO && self.zoom == 0.0
    }

    /// Moves along the camera's own axes; zoom narrows the field of view.
    pub fn apply_to_camera(&self, camera: &mut Camera) {
        let delta = camera.transform.rotation * self.translation;
        camera.transform.translate(delta);
        camera.transform.rotate_euler_degrees(self.rotation_degrees);
        camera.set_fov(camera.fov_degrees() - self.zoom * FOV_SPEED);
    }

    /// Moves along world axes; zoom scales uniformly.
    pub fn apply_to_mesh(&self, transform: &mut Transform) {
        transform.translate(self.translation);
        transform.rotate_euler_degrees(self.rotation_degrees);
        transform.scale *= (self.zoom * SCALE_RATE).exp();
    }
}

/// Tracks the selected object and edits it from keyboard state.
#[derive(Debug, Default)]
pub struct SceneControls {
    selection: Selection,
}

impl SceneControls {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Applies one frame of input to `scene`.
    pub fn update<B: UniformBlock>(&mut self, input: &InputState, scene: &mut Scene<B>, dt: f32) {
        let mesh_count = scene.meshes().len();

        if input.is_key_just_pressed(KeyCode::Tab) {
            self.selection = self.selection.next(mesh_count);
            match self.selection {
                Selection::Camera => info!("Selected camera"),
                Selection::Mesh(i) => info!("Selected mesh {}", scene.meshes()[i].name()),
            }
        }

        let motion = Motion::from_input(input, dt);
        if motion.is_idle() {
            return;
        }

        match self.selection {
            Selection::Camera => motion.apply_to_camera(scene.camera_mut()),
            Selection::Mesh(i) => {
                if let Some(mesh) = scene.meshes_mut().get_mut(i) {
                    motion.apply_to_mesh(&mut mesh.transform);
                }
            }
        }
    }
}
