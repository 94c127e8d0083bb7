//! Camera view input
//!
//! The shadow subsystem consumes the active camera as a plain value: position,
//! orthonormal basis, clip planes and horizontal field of view. It is queried
//! once per computation and never mutated here.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use umbra_math::{consts, Vec3};

/// Read-only camera state consumed by the shadow geometry code
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CameraView {
    /// World position
    pub position: Vec3,
    /// Right basis vector (unit)
    pub right: Vec3,
    /// Up basis vector (unit)
    pub up: Vec3,
    /// Viewing direction (unit)
    pub forward: Vec3,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Full horizontal field of view in radians
    pub fov_x: f32,
    /// Width over height
    pub aspect: f32,
}

impl CameraView {
    /// Build a camera looking from `position` toward `target`
    ///
    /// The basis is orthonormalized from the view direction and a world-up
    /// hint of +Y (+Z when the view direction is nearly vertical).
    pub fn look_at(position: Vec3, target: Vec3, near: f32, far: f32, fov_x: f32, aspect: f32) -> Self {
        let forward = (target - position).normalize();
        let hint = if forward.y.abs() > 0.95 { Vec3::Z } else { Vec3::Y };
        let right = forward.cross(hint).normalize();
        let up = right.cross(forward);

        Self {
            position,
            right,
            up,
            forward,
            near,
            far,
            fov_x,
            aspect,
        }
    }

    /// Tangents of the half field of view, horizontal and vertical
    #[inline]
    pub fn tan_half_fov(&self) -> (f32, f32) {
        let tan_x = (self.fov_x * 0.5).tan();
        (tan_x, tan_x / self.aspect)
    }

    /// Validate the camera for use by the shadow subsystem
    ///
    /// A camera that fails here is fatal to the subsystem; callers must not
    /// enter the render loop with it.
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite()
            || !self.right.is_finite()
            || !self.up.is_finite()
            || !self.forward.is_finite()
        {
            return Err(Error::InvalidCamera("non-finite position or basis"));
        }
        for basis in [self.right, self.up, self.forward] {
            if (basis.length() - 1.0).abs() > 1e-3 {
                return Err(Error::InvalidCamera("basis vectors must be unit length"));
            }
        }
        // Orthonormal basis of either handedness
        if (self.right.cross(self.up).dot(self.forward).abs() - 1.0).abs() > 1e-3 {
            return Err(Error::InvalidCamera("basis vectors must be orthonormal"));
        }
        if !self.near.is_finite() || self.near <= 0.0 {
            return Err(Error::InvalidCamera("near plane must be positive"));
        }
        if !self.far.is_finite() || self.far <= self.near {
            return Err(Error::InvalidCamera("far plane must exceed near plane"));
        }
        if !self.fov_x.is_finite() || self.fov_x <= 0.0 || self.fov_x >= consts::PI {
            return Err(Error::InvalidCamera("horizontal fov must be in (0, pi)"));
        }
        if !self.aspect.is_finite() || self.aspect <= 0.0 {
            return Err(Error::InvalidCamera("aspect ratio must be positive"));
        }
        Ok(())
    }
}
