//! Perspective camera.

use glam::{Mat4, Vec3};

use crate::transform::Transform;

pub const DEFAULT_FOV_DEGREES: f32 = 70.0;
pub const MIN_FOV_DEGREES: f32 = 1.0;
pub const MAX_FOV_DEGREES: f32 = 179.0;
pub const DEFAULT_NEAR: f32 = 0.01;
pub const DEFAULT_FAR: f32 = 100.0;

/// A camera positioned by a [`Transform`] whose scale is ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: DEFAULT_FOV_DEGREES,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    #[inline]
    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Sets the vertical field of view, clamped to `1..=179` degrees.
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov_degrees = degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
    }

    /// `inverse(translate(position) * rotate(rotation))`.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.rigid_matrix().inverse()
    }

    /// Right-handed, zero-to-one depth perspective with Y flipped for Vulkan.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let mut proj =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far);
        proj.y_axis.y *= -1.0;
        proj
    }

    pub fn view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Width over height, or 1 when the height is zero.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
