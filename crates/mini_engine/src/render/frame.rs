//! Per-frame context passed through a draw traversal

use crate::foundation::math::Mat4;
use crate::scene::CameraDesc;

/// View and projection state of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Monotonic frame counter
    pub index: u64,
    /// World-to-view matrix
    pub view: Mat4,
    /// View-to-clip matrix
    pub projection: Mat4,
}

impl Frame {
    /// Frame with explicit matrices
    #[must_use]
    pub const fn new(index: u64, view: Mat4, projection: Mat4) -> Self {
        Self {
            index,
            view,
            projection,
        }
    }

    /// Frame seen through `camera` placed at `camera_to_world`
    ///
    /// Returns `None` when the camera transform cannot be inverted.
    #[must_use]
    pub fn for_camera(index: u64, camera: &CameraDesc, camera_to_world: &Mat4) -> Option<Self> {
        let view = camera_to_world.try_inverse()?;
        Some(Self::new(index, view, camera.projection()))
    }

    /// Combined world-to-clip matrix
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    fn camera() -> CameraDesc {
        CameraDesc {
            fov_degrees: 60.0,
            near_clip: 0.1,
            far_clip: 100.0,
            width: 1280,
            height: 720,
        }
    }

    #[test]
    fn test_view_is_inverse_of_camera_transform() {
        let camera_to_world = Mat4::translation_by(Vec3::new(0.0, 2.0, 5.0));
        let frame = Frame::for_camera(3, &camera(), &camera_to_world).unwrap();

        assert_eq!(frame.index, 3);
        assert_relative_eq!(frame.view * camera_to_world, Mat4::identity(), epsilon = 1e-6);
        assert_relative_eq!(frame.view_projection(), frame.projection * frame.view);
    }

    #[test]
    fn test_singular_camera_transform() {
        let flat = Mat4::scaling_by(Vec3::new(1.0, 0.0, 1.0));
        assert!(Frame::for_camera(0, &camera(), &flat).is_none());
    }
}
