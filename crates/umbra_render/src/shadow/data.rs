//! GPU Shadow Data
//!
//! GPU-compatible constant blocks for the shadow generation and lighting
//! passes. All structures are bytemuck Pod/Zeroable for direct upload and
//! sized to 16-byte multiples.

use serde::{Deserialize, Serialize};

use super::cascade::{
    CascadeStabilizer, TOTAL_CASCADES, UNUSED_SLOT_OFFSET, UNUSED_SLOT_SCALE,
};
use super::schedule::{CascadeShadowPass, PointShadowPass, ShadowTarget, SpotShadowPass};

/// Directional shadow data consumed by the deferred lighting shader
#[repr(C)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCascadeShadow {
    /// World to shadow projection space (column-major)
    pub world_to_shadow: [[f32; 4]; 4],

    /// Shadow-to-cascade X translation per slot
    pub to_cascade_offset_x: [f32; 4],

    /// Shadow-to-cascade Y translation per slot
    pub to_cascade_offset_y: [f32; 4],

    /// Shadow-to-cascade scale per slot
    pub to_cascade_scale: [f32; 4],

    /// Far distance of each cascade, last lane repeats the total range
    pub cascade_far: [f32; 4],
}

impl GpuCascadeShadow {
    /// Capture the stabilizer's current frame outputs
    pub fn from_stabilizer(stabilizer: &CascadeStabilizer) -> Self {
        let ladder = stabilizer.split_ladder();
        let mut cascade_far = [ladder[TOTAL_CASCADES]; 4];
        for (dst, far) in cascade_far.iter_mut().zip(ladder[1..].iter()) {
            *dst = *far;
        }

        Self {
            world_to_shadow: stabilizer.world_to_shadow().to_cols_array_2d(),
            to_cascade_offset_x: stabilizer.to_cascade_offsets_x(),
            to_cascade_offset_y: stabilizer.to_cascade_offsets_y(),
            to_cascade_scale: stabilizer.to_cascade_scales(),
            cascade_far,
        }
    }

    /// Block with every slot parked on the sentinel values
    pub fn disabled() -> Self {
        Self {
            world_to_shadow: [[0.0; 4]; 4],
            to_cascade_offset_x: [UNUSED_SLOT_OFFSET; 4],
            to_cascade_offset_y: [UNUSED_SLOT_OFFSET; 4],
            to_cascade_scale: [UNUSED_SLOT_SCALE; 4],
            cascade_far: [0.0; 4],
        }
    }
}

impl Default for GpuCascadeShadow {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Cascade generation matrices, one block for the multi-viewport pass
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCascadeGenMatrices {
    /// World-to-cascade transform per active cascade (column-major)
    pub world_to_cascade: [[[f32; 4]; 4]; TOTAL_CASCADES],
}

impl GpuCascadeGenMatrices {
    pub fn from_pass(pass: &CascadeShadowPass) -> Self {
        let mut world_to_cascade = [[[0.0; 4]; 4]; TOTAL_CASCADES];
        for (dst, matrix) in world_to_cascade.iter_mut().zip(pass.world_to_cascade.iter()) {
            *dst = matrix.to_cols_array_2d();
        }
        Self { world_to_cascade }
    }
}

/// Six cube-face matrices for a point light, one block for the
/// geometry-amplification pass
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPointShadowFaces {
    /// Face transforms in +X, -X, +Y, -Y, +Z, -Z order (column-major)
    pub faces: [[[f32; 4]; 4]; 6],
}

impl GpuPointShadowFaces {
    pub fn from_pass(pass: &PointShadowPass) -> Self {
        let mut faces = [[[0.0; 4]; 4]; 6];
        for (dst, matrix) in faces.iter_mut().zip(pass.faces.iter()) {
            *dst = matrix.to_cols_array_2d();
        }
        Self { faces }
    }
}

/// Spot light shadow transform plus its slot, for the lighting shader
#[repr(C)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSpotShadow {
    /// World to light projection space (column-major)
    pub world_to_light: [[f32; 4]; 4],

    /// Shadow slot index, -1 when the light casts no shadow
    pub slot: i32,

    pub _pad: [f32; 3],
}

impl GpuSpotShadow {
    pub fn from_pass(pass: &SpotShadowPass) -> Self {
        let slot = match pass.target {
            ShadowTarget::SpotSlot(slot) => slot as i32,
            _ => -1,
        };
        Self {
            world_to_light: pass.world_to_light.to_cols_array_2d(),
            slot,
            _pad: [0.0; 3],
        }
    }

    /// Entry for a light without a shadow map
    pub fn disabled() -> Self {
        Self {
            world_to_light: [[0.0; 4]; 4],
            slot: -1,
            _pad: [0.0; 3],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.slot >= 0
    }
}

impl Default for GpuSpotShadow {
    fn default() -> Self {
        Self::disabled()
    }
}
