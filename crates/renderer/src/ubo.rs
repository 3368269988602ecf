//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the GLSL uniform blocks in `shaders/mesh.vert`
//! exactly. All structures use `#[repr(C)]` for predictable memory layout and
//! implement `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use inflight_scene::{Camera, Transform};

/// Camera uniform buffer data (set 0, binding 0).
///
/// # Memory Layout
///
/// - Offset 0: view matrix (64 bytes)
/// - Offset 64: projection matrix (64 bytes)
/// - Total size: 128 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraUbo {
    /// World to view space.
    pub view: Mat4,
    /// View to clip space, Y already flipped for Vulkan.
    pub proj: Mat4,
}

impl CameraUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(view: Mat4, proj: Mat4) -> Self {
        Self { view, proj }
    }

    /// Matrices for `camera` rendering into a target of the given aspect ratio.
    pub fn from_camera(camera: &Camera, aspect: f32) -> Self {
        Self {
            view: camera.view_matrix(),
            proj: camera.projection_matrix(aspect),
        }
    }
}

/// Per-mesh uniform buffer data (set 1, binding 0).
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Total size: 64 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshUbo {
    /// Object to world space.
    pub model: Mat4,
}

impl MeshUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(model: Mat4) -> Self {
        Self { model }
    }

    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            model: transform.model_matrix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    #[test]
    fn test_camera_ubo_size() {
        // 2 Mat4 (2 * 64) = 128 bytes
        assert_eq!(CameraUbo::SIZE, 128);
    }

    #[test]
    fn test_mesh_ubo_size() {
        assert_eq!(MeshUbo::SIZE, 64);
    }

    #[test]
    fn test_ubo_alignment() {
        // Mat4 requires 16-byte alignment
        assert_eq!(std::mem::align_of::<CameraUbo>(), 16);
        assert_eq!(std::mem::align_of::<MeshUbo>(), 16);
    }

    #[test]
    fn test_camera_ubo_from_camera() {
        let camera = Camera::new().with_position(Vec3::new(0.0, 1.0, 3.0));
        let ubo = CameraUbo::from_camera(&camera, 16.0 / 9.0);

        assert_eq!(ubo.view, camera.view_matrix());
        assert_eq!(ubo.proj, camera.projection_matrix(16.0 / 9.0));
        assert!(ubo.proj.y_axis.y < 0.0);
    }

    #[test]
    fn test_mesh_ubo_from_transform() {
        let transform = Transform::new()
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_rotation(Quat::from_rotation_y(0.5))
            .with_scale(Vec3::splat(2.0));

        let ubo = MeshUbo::from_transform(&transform);
        assert_eq!(ubo.model, transform.model_matrix());
    }

    #[test]
    fn test_ubo_bytes() {
        let camera = CameraUbo::new(Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(bytemuck::bytes_of(&camera).len(), CameraUbo::SIZE);

        let mesh = MeshUbo::new(Mat4::from_translation(Vec3::X));
        let bytes = bytemuck::bytes_of(&mesh);
        assert_eq!(bytes.len(), MeshUbo::SIZE);
        // Translation lives in the fourth column
        let floats: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(floats[12], 1.0);
    }
}
