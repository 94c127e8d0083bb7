//! Light Registration
//!
//! Per-frame registry of shadow-casting lights. The list is cleared and
//! rebuilt every frame together with the shadow slot pools; registration
//! order decides who gets a shadow map when the pools run out.
//!
//! Only the shadow-relevant half of a light manager lives here: the deferred
//! lighting dispatch that consumes these lights is an external collaborator.

use crate::camera::CameraView;
use crate::shadow::atlas::ShadowAtlas;
use crate::shadow::cascade::CascadeStabilizer;
use crate::shadow::schedule::ShadowPassSchedule;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use umbra_math::{radians, Vec3};

/// Upper bound on registered lights per frame
pub const MAX_LIGHTS: usize = 256;

/// Shadow-casting light type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Point,
    Spot,
}

/// A registered point or spot light
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShadowCasterLight {
    pub kind: LightKind,

    /// World position
    pub position: Vec3,

    /// Direction (unit); unused for point lights
    pub direction: Vec3,

    /// Influence range in world units
    pub range: f32,

    /// Outer cone half-angle in radians; spot only
    pub outer_angle: f32,

    /// Inner cone half-angle in radians; spot only
    pub inner_angle: f32,

    /// Linear RGB color
    pub color: [f32; 3],

    /// Assigned shadow slot, `None` when the pool was exhausted or the light
    /// does not cast shadows
    pub shadow_slot: Option<u32>,
}

/// The directional light; at most one per frame
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels (unit)
    pub direction: Vec3,

    /// Linear RGB color
    pub color: [f32; 3],

    /// Whether the cascade pass runs for this light
    pub cast_shadows: bool,
}

/// Per-frame light registry
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LightFrame {
    lights: Vec<ShadowCasterLight>,
    directional: Option<DirectionalLight>,
    ambient_lower: [f32; 3],
    ambient_upper: [f32; 3],
    atlas: ShadowAtlas,
}

impl LightFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the light list and reset the shadow slot pools
    pub fn begin_frame(&mut self) {
        self.lights.clear();
        self.atlas.begin_frame();
    }

    /// Set the hemispheric ambient colors
    pub fn set_ambient(&mut self, lower: [f32; 3], upper: [f32; 3]) {
        self.ambient_lower = lower;
        self.ambient_upper = upper;
    }

    /// Set the directional light for this frame
    pub fn set_directional(&mut self, direction: Vec3, color: [f32; 3], cast_shadows: bool) {
        self.directional = Some(DirectionalLight {
            direction: direction.normalize_or_zero(),
            color,
            cast_shadows,
        });
    }

    /// Register a point light; returns false when the frame is full
    pub fn add_point_light(
        &mut self,
        position: Vec3,
        range: f32,
        color: [f32; 3],
        cast_shadow: bool,
    ) -> bool {
        if self.lights.len() >= MAX_LIGHTS {
            return false;
        }

        let shadow_slot = if cast_shadow {
            self.atlas.allocate(LightKind::Point)
        } else {
            None
        };

        self.lights.push(ShadowCasterLight {
            kind: LightKind::Point,
            position,
            direction: Vec3::ZERO,
            range,
            outer_angle: 0.0,
            inner_angle: 0.0,
            color,
            shadow_slot,
        });
        true
    }

    /// Register a spot light; cone angles are in degrees, returns false when
    /// the frame is full
    #[allow(clippy::too_many_arguments)]
    pub fn add_spot_light(
        &mut self,
        position: Vec3,
        direction: Vec3,
        range: f32,
        outer_angle_deg: f32,
        inner_angle_deg: f32,
        color: [f32; 3],
        cast_shadow: bool,
    ) -> bool {
        if self.lights.len() >= MAX_LIGHTS {
            return false;
        }

        let shadow_slot = if cast_shadow {
            self.atlas.allocate(LightKind::Spot)
        } else {
            None
        };

        self.lights.push(ShadowCasterLight {
            kind: LightKind::Spot,
            position,
            direction: direction.normalize_or_zero(),
            range,
            outer_angle: radians(outer_angle_deg),
            inner_angle: radians(inner_angle_deg),
            color,
            shadow_slot,
        });
        true
    }

    /// All lights registered this frame, in registration order
    pub fn lights(&self) -> &[ShadowCasterLight] {
        &self.lights
    }

    /// The directional light, if one was set
    pub fn directional(&self) -> Option<&DirectionalLight> {
        self.directional.as_ref()
    }

    /// Ambient colors as (lower, upper)
    pub fn ambient(&self) -> ([f32; 3], [f32; 3]) {
        (self.ambient_lower, self.ambient_upper)
    }

    /// The shadow slot allocator
    pub fn atlas(&self) -> &ShadowAtlas {
        &self.atlas
    }

    /// Build this frame's shadow pass sequence
    ///
    /// The schedule borrows the stabilizer mutably because the cascade pass
    /// triggers its per-frame update. Dropping the schedule mid-frame and
    /// rebuilding it next frame is the idempotent reset.
    pub fn schedule<'a>(
        &'a self,
        stabilizer: &'a mut CascadeStabilizer,
        camera: &'a CameraView,
    ) -> ShadowPassSchedule<'a> {
        ShadowPassSchedule::new(&self.lights, self.directional, stabilizer, camera)
    }
}
