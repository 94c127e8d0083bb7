//! 4x4 matrix type (column-major)

use crate::vector::{Vec3, Vec4};
use core::ops::Mul;

/// 4x4 transformation matrix, column-major
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C, align(16))]
pub struct Mat4 {
    pub cols: [Vec4; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_cols(Vec4::X, Vec4::Y, Vec4::Z, translation.extend(1.0))
    }

    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::new(scale.x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, scale.y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, scale.z, 0.0),
            Vec4::W,
        )
    }

    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_cols(
            Vec4::X,
            Vec4::new(0.0, cos, sin, 0.0),
            Vec4::new(0.0, -sin, cos, 0.0),
            Vec4::W,
        )
    }

    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::from_cols(
            Vec4::new(cos, 0.0, -sin, 0.0),
            Vec4::Y,
            Vec4::new(sin, 0.0, cos, 0.0),
            Vec4::W,
        )
    }

    /// Create a right-handed look-at view matrix
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - eye).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        Self::from_cols(
            Vec4::new(right.x, up.x, -forward.x, 0.0),
            Vec4::new(right.y, up.y, -forward.y, 0.0),
            Vec4::new(right.z, up.z, -forward.z, 0.0),
            Vec4::new(-right.dot(eye), -up.dot(eye), forward.dot(eye), 1.0),
        )
    }

    /// Create a right-handed perspective projection matrix
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y / 2.0).tan();
        let nf = 1.0 / (near - far);

        Self::from_cols(
            Vec4::new(f / aspect, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (far + near) * nf, -1.0),
            Vec4::new(0.0, 0.0, 2.0 * far * near * nf, 0.0),
        )
    }

    /// Create a right-handed orthographic projection with depth range [0, 1]
    pub fn orthographic_rh_zo(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let rml = right - left;
        let tmb = top - bottom;
        let fmn = far - near;

        Self::from_cols(
            Vec4::new(2.0 / rml, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / tmb, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0 / fmn, 0.0),
            Vec4::new(
                -(right + left) / rml,
                -(top + bottom) / tmb,
                -near / fmn,
                1.0,
            ),
        )
    }

    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            Vec4::new(self.cols[0].x, self.cols[1].x, self.cols[2].x, self.cols[3].x),
            Vec4::new(self.cols[0].y, self.cols[1].y, self.cols[2].y, self.cols[3].y),
            Vec4::new(self.cols[0].z, self.cols[1].z, self.cols[2].z, self.cols[3].z),
            Vec4::new(self.cols[0].w, self.cols[1].w, self.cols[2].w, self.cols[3].w),
        )
    }

    /// Transform a point (w = 1, perspective divide applied)
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let v = *self * point.extend(1.0);
        v.truncate() / v.w
    }

    /// Transform a direction (w = 0, no translation)
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        (*self * vector.extend(0.0)).truncate()
    }

    /// Compute the inverse of this matrix
    pub fn inverse(&self) -> Self {
        let a = self.cols[0];
        let b = self.cols[1];
        let c = self.cols[2];
        let d = self.cols[3];

        let s0 = a.x * b.y - b.x * a.y;
        let s1 = a.x * b.z - b.x * a.z;
        let s2 = a.x * b.w - b.x * a.w;
        let s3 = a.y * b.z - b.y * a.z;
        let s4 = a.y * b.w - b.y * a.w;
        let s5 = a.z * b.w - b.z * a.w;

        let c5 = c.z * d.w - d.z * c.w;
        let c4 = c.y * d.w - d.y * c.w;
        let c3 = c.y * d.z - d.y * c.z;
        let c2 = c.x * d.w - d.x * c.w;
        let c1 = c.x * d.z - d.x * c.z;
        let c0 = c.x * d.y - d.x * c.y;

        let det = s0 * c5 - s1 * c4 + s2 * c3 + s3 * c2 - s4 * c1 + s5 * c0;
        let inv_det = 1.0 / det;

        Self::from_cols(
            Vec4::new(
                (b.y * c5 - b.z * c4 + b.w * c3) * inv_det,
                (-a.y * c5 + a.z * c4 - a.w * c3) * inv_det,
                (d.y * s5 - d.z * s4 + d.w * s3) * inv_det,
                (-c.y * s5 + c.z * s4 - c.w * s3) * inv_det,
            ),
            Vec4::new(
                (-b.x * c5 + b.z * c2 - b.w * c1) * inv_det,
                (a.x * c5 - a.z * c2 + a.w * c1) * inv_det,
                (-d.x * s5 + d.z * s2 - d.w * s1) * inv_det,
                (c.x * s5 - c.z * s2 + c.w * s1) * inv_det,
            ),
            Vec4::new(
                (b.x * c4 - b.y * c2 + b.w * c0) * inv_det,
                (-a.x * c4 + a.y * c2 - a.w * c0) * inv_det,
                (d.x * s4 - d.y * s2 + d.w * s0) * inv_det,
                (-c.x * s4 + c.y * s2 - c.w * s0) * inv_det,
            ),
            Vec4::new(
                (-b.x * c3 + b.y * c1 - b.z * c0) * inv_det,
                (a.x * c3 - a.y * c1 + a.z * c0) * inv_det,
                (-d.x * s3 + d.y * s1 - d.z * s0) * inv_det,
                (c.x * s3 - c.y * s1 + c.z * s0) * inv_det,
            ),
        )
    }

    /// Check that every element is finite
    pub fn is_finite(&self) -> bool {
        self.cols
            .iter()
            .all(|c| c.x.is_finite() && c.y.is_finite() && c.z.is_finite() && c.w.is_finite())
    }

    /// Convert to 2D array (column-major), for GPU uniforms
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        [
            self.cols[0].to_array(),
            self.cols[1].to_array(),
            self.cols[2].to_array(),
            self.cols[3].to_array(),
        ]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_eq(a: &Mat4, b: &Mat4, tol: f32) {
        for i in 0..4 {
            let ca = a.cols[i].to_array();
            let cb = b.cols[i].to_array();
            for j in 0..4 {
                assert!(
                    (ca[j] - cb[j]).abs() < tol,
                    "col {} row {}: {} vs {}",
                    i,
                    j,
                    ca[j],
                    cb[j]
                );
            }
        }
    }

    #[test]
    fn test_identity() {
        let v = Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert_eq!(Mat4::IDENTITY * v, v);
    }

    #[test]
    fn test_translation() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_point(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);

        // Directions are unaffected by translation
        let d = m.transform_vector(Vec3::X);
        assert!((d - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_scale_translation_composition() {
        // Column-major composition applies the rightmost factor first
        let m = Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))
            * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let p = m.transform_point(Vec3::ZERO);
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_rotation_y_axes() {
        let m = Mat4::from_rotation_y(core::f32::consts::FRAC_PI_2);
        let v = m.transform_vector(Vec3::X);
        assert!((v - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_look_at_centers_target() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let p = view.transform_point(Vec3::ZERO);
        // Target lands on the -Z axis in view space
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        assert!((p.z + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = Mat4::look_at(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert_mat_eq(&(m * m.inverse()), &Mat4::IDENTITY, 1e-5);
    }

    #[test]
    fn test_orthographic_depth_range() {
        let m = Mat4::orthographic_rh_zo(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        // Near plane maps to depth 0, far plane to depth 1
        let near = m.transform_point(Vec3::new(0.0, 0.0, 0.0));
        let far = m.transform_point(Vec3::new(0.0, 0.0, -10.0));
        assert!(near.z.abs() < 1e-6);
        assert!((far.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_perspective_is_finite() {
        let m = Mat4::perspective(1.0, 16.0 / 9.0, 0.1, 100.0);
        assert!(m.is_finite());
    }
}
