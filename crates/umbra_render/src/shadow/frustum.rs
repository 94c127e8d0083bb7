//! Split-Frustum Geometry
//!
//! Corner and bounding-sphere extraction for an arbitrary near/far slice of
//! the camera frustum, computed directly from the camera basis. The sphere is
//! intentionally conservative rather than minimal: a cheap, stable formula
//! whose center depends only on the camera ray keeps the cascade bounds
//! rotation-invariant.

use crate::camera::CameraView;
use umbra_math::{Sphere, Vec3};

/// Corner points of the frustum slice between `near` and `far`
///
/// Order: near plane top-left, top-right, bottom-right, bottom-left, then the
/// same four on the far plane.
pub fn frustum_corners(camera: &CameraView, near: f32, far: f32) -> [Vec3; 8] {
    let (tan_x, tan_y) = camera.tan_half_fov();
    let right = camera.right * tan_x;
    let up = camera.up * tan_y;

    let corner = |dist: f32, sx: f32, sy: f32| {
        camera.position + (right * sx + up * sy + camera.forward) * dist
    };

    [
        corner(near, -1.0, 1.0),
        corner(near, 1.0, 1.0),
        corner(near, 1.0, -1.0),
        corner(near, -1.0, -1.0),
        corner(far, -1.0, 1.0),
        corner(far, 1.0, 1.0),
        corner(far, 1.0, -1.0),
        corner(far, -1.0, -1.0),
    ]
}

/// Conservative bounding sphere of the frustum slice between `near` and `far`
///
/// The center sits on the view ray halfway through the slice; the radius is
/// the distance to a far corner, which dominates every other corner.
pub fn frustum_bound_sphere(camera: &CameraView, near: f32, far: f32) -> Sphere {
    let (tan_x, tan_y) = camera.tan_half_fov();

    let center = camera.position + camera.forward * (near + 0.5 * (far - near));
    let far_corner =
        camera.position + (camera.right * -tan_x + camera.up * tan_y + camera.forward) * far;

    Sphere::new(center, (far_corner - center).length())
}
