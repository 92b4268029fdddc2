//! Math utilities and types
//!
//! Thin aliases over `nalgebra` plus the handful of matrix constructors the
//! scene description needs (transform property composition and camera setup).

use nalgebra::{Matrix4, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    #[must_use]
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Translation by `offset`
    fn translation_by(offset: Vec3) -> Mat4;

    /// Non-uniform scale
    fn scaling_by(factors: Vec3) -> Mat4;

    /// Rotation of `angle_degrees` around an arbitrary (not necessarily unit) axis.
    ///
    /// Returns `None` for a zero-length axis.
    fn rotation_degrees(axis: Vec3, angle_degrees: f32) -> Option<Mat4>;

    /// Camera-to-world matrix for a camera at `origin` looking at `target`.
    ///
    /// The camera looks down its local +Z axis with +Y as up. Returns `None`
    /// when `origin == target` or `up` is parallel to the viewing direction.
    fn look_at_to_world(origin: Vec3, target: Vec3, up: Vec3) -> Option<Mat4>;

    /// Create a perspective projection matrix (Vulkan depth range `[0, 1]`)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn translation_by(offset: Vec3) -> Mat4 {
        Mat4::new_translation(&offset)
    }

    fn scaling_by(factors: Vec3) -> Mat4 {
        Mat4::new_nonuniform_scaling(&factors)
    }

    fn rotation_degrees(axis: Vec3, angle_degrees: f32) -> Option<Mat4> {
        let axis = Unit::try_new(axis, f32::EPSILON)?;
        Some(Mat4::from_axis_angle(&axis, utils::deg_to_rad(angle_degrees)))
    }

    fn look_at_to_world(origin: Vec3, target: Vec3, up: Vec3) -> Option<Mat4> {
        let dir = (target - origin).try_normalize(f32::EPSILON)?;
        let up = up.try_normalize(f32::EPSILON)?;
        let left = up.cross(&dir).try_normalize(f32::EPSILON)?;
        let new_up = dir.cross(&left);

        Some(Mat4::new(
            left.x, new_up.x, dir.x, origin.x,
            left.y, new_up.y, dir.y, origin.y,
            left.z, new_up.z, dir.z, origin.z,
            0.0, 0.0, 0.0, 1.0,
        ))
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [a⁻¹/tan(φ/2)    0              0          0         ]
        //     [0               1/tan(φ/2)     0          0         ]
        //     [0               0              f/(f-n)    -nf/(f-n) ]
        //     [0               0              1          0         ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_about_z_axis() {
        let rotation = Mat4::rotation_degrees(Vec3::new(0.0, 0.0, 2.0), 90.0).unwrap();
        let rotated = rotation.transform_vector(&Vec3::x());
        assert_relative_eq!(rotated, Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_rejects_zero_axis() {
        assert!(Mat4::rotation_degrees(Vec3::zeros(), 45.0).is_none());
    }

    #[test]
    fn test_look_at_places_camera_at_origin() {
        let origin = Vec3::new(0.0, 1.0, -5.0);
        let m = Mat4::look_at_to_world(origin, Vec3::new(0.0, 1.0, 0.0), Vec3::y()).unwrap();

        let eye = m.transform_point(&Point3::origin());
        assert_relative_eq!(eye.coords, origin, epsilon = 1e-6);

        let forward = m.transform_vector(&Vec3::z());
        assert_relative_eq!(forward, Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_look_at_degenerate_inputs() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(Mat4::look_at_to_world(p, p, Vec3::y()).is_none());
        assert!(Mat4::look_at_to_world(Vec3::zeros(), Vec3::y(), Vec3::y()).is_none());
    }
}
