//! Position, orientation and scale of a scene object.
//!
//! # Example
//!
//! ```
//! use inflight_scene::Transform;
//! use glam::{Mat4, Vec3};
//!
//! let t = Transform::new().with_position(Vec3::new(-1.0, 0.0, -2.0));
//! assert_eq!(t.model_matrix(), Mat4::from_translation(Vec3::new(-1.0, 0.0, -2.0)));
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

// Rz * Ry * Rx: X is applied first, then Y, then Z.
const EULER_ORDER: EulerRot = EulerRot::ZYX;

/// Rigid transform plus non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// `translate(position) * rotate(rotation) * scale(scale)`.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Rigid part only: `translate(position) * rotate(rotation)`.
    pub fn rigid_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Rotation as X/Y/Z angles in degrees.
    pub fn euler_degrees(&self) -> Vec3 {
        let (z, y, x) = self.rotation.to_euler(EULER_ORDER);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    /// Replaces the rotation with X/Y/Z angles given in degrees.
    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.rotation = Quat::from_euler(
            EULER_ORDER,
            degrees.z.to_radians(),
            degrees.y.to_radians(),
            degrees.x.to_radians(),
        )
        .normalize();
    }

    /// Adds `degrees` to the current X/Y/Z angles.
    pub fn rotate_euler_degrees(&mut self, degrees: Vec3) {
        let current = self.euler_degrees();
        self.set_euler_degrees(current + degrees);
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
