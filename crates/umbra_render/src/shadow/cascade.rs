//! Cascaded Shadow Transforms
//!
//! Derives, once per frame, the world-to-cascade transforms for the
//! directional light. The stabilizer owns the only state in the subsystem
//! that survives across frames: one bounding sphere per cascade.
//!
//! # Stabilization
//!
//! Fitting each cascade tightly to its frustum slice makes the shadow-map
//! sampling grid move with every sub-pixel camera change, which shows up as
//! shimmer along shadow edges. The anti-flicker path avoids that two ways:
//!
//! - each slice is bounded by a sphere whose center sits on the view ray, so
//!   the bound is invariant to camera rotation;
//! - the sphere center is only moved in whole shadow-map texels, so the bound
//!   is invariant to sub-texel camera translation.
//!
//! The sphere radii never shrink, trading a slightly looser fit for the
//! guarantee that a cascade's footprint never pops smaller mid-flight.

use crate::camera::CameraView;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use umbra_math::{Mat4, Vec3};

use super::config::ShadowConfig;
use super::frustum::{frustum_bound_sphere, frustum_corners};

/// Number of cascades rendered for the directional light
pub const TOTAL_CASCADES: usize = 3;

/// Cascade slots in the GPU constant block; slots beyond [`TOTAL_CASCADES`]
/// carry sentinel values
pub const MAX_CASCADE_SLOTS: usize = 4;

/// Sentinel offset reported for unused cascade slots; far outside the valid
/// shadow-space footprint so lookups always miss
pub const UNUSED_SLOT_OFFSET: f32 = 250.0;

/// Sentinel scale reported for unused cascade slots
pub const UNUSED_SLOT_SCALE: f32 = 0.1;

/// Lower clamp for bound radii, keeps the texel-size math away from zero
const MIN_BOUND_RADIUS: f32 = 1e-3;

/// Per-cascade state; the bounds persist across frames
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CascadeState {
    /// Bounding sphere center, world space
    pub bound_center: Vec3,

    /// Bounding sphere radius; never shrinks while anti-flicker is on
    pub bound_radius: f32,

    /// Shadow-space to cascade-space translation, X
    pub offset_x: f32,

    /// Shadow-space to cascade-space translation, Y
    pub offset_y: f32,

    /// Shadow-space to cascade-space scale
    pub scale: f32,

    /// Combined world-to-cascade-projection transform
    pub world_to_cascade: Mat4,
}

/// Snapshot of the persistent stabilizer state for hot-reload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CascadeStabilizerState {
    /// Whole-range shadow-space bound radius
    pub scene_bound_radius: f32,

    /// Persisted per-cascade bounds
    pub cascades: [CascadeState; TOTAL_CASCADES],
}

/// Derives stabilized cascade transforms from the camera and light direction
#[derive(Clone, Debug)]
pub struct CascadeStabilizer {
    /// Shadow map size in pixels (square)
    resolution: u32,

    /// Stabilized sphere bounds vs tight frustum fit
    anti_flicker: bool,

    /// Far end of the cascaded range, world units from the camera
    total_range: f32,

    /// Split ladder: `[camera_near, split0, split1, total_range]`
    ranges: [f32; TOTAL_CASCADES + 1],

    /// Whole-range bound radius, monotonically non-decreasing
    scene_bound_radius: f32,

    /// World to shadow view (rotation + translation only)
    shadow_view: Mat4,

    /// World to shadow projection space
    world_to_shadow: Mat4,

    /// Per-cascade persistent state
    cascades: [CascadeState; TOTAL_CASCADES],
}

impl CascadeStabilizer {
    /// Create a stabilizer for the given configuration and camera
    ///
    /// Fails when the camera is unusable or the split ladder is not strictly
    /// increasing from the camera near plane; either failure is fatal to the
    /// subsystem.
    pub fn new(config: &ShadowConfig, camera: &CameraView) -> Result<Self> {
        camera.validate()?;

        if config.resolution == 0 {
            return Err(Error::InvalidConfig("resolution must be non-zero"));
        }

        let ranges = config.split_ladder(camera.near);
        for pair in ranges.windows(2) {
            if !(pair[0] < pair[1]) || !pair[0].is_finite() || !pair[1].is_finite() {
                return Err(Error::InvalidConfig(
                    "split ladder must be strictly increasing from the camera near plane",
                ));
            }
        }

        Ok(Self {
            resolution: config.resolution,
            anti_flicker: config.anti_flicker,
            total_range: config.cascade_total_range,
            ranges,
            scene_bound_radius: 0.0,
            shadow_view: Mat4::IDENTITY,
            world_to_shadow: Mat4::IDENTITY,
            cascades: [CascadeState::default(); TOTAL_CASCADES],
        })
    }

    /// Recompute all cascade transforms for this frame
    ///
    /// Must be called exactly once per frame, after the camera has settled;
    /// the scheduler drives this from the cascade pass.
    pub fn update(&mut self, camera: &CameraView, light_dir: Vec3) {
        let mut light_dir = light_dir.normalize_or_zero();
        if light_dir == Vec3::ZERO {
            log::warn!("zero-length light direction, substituting straight down");
            light_dir = -Vec3::Y;
        }

        // Shadow view: centered on the cascaded range, looking along the light
        let eye = camera.position + camera.forward * (self.total_range * 0.5);
        let up = light_up_axis(light_dir);
        self.shadow_view = Mat4::look_at(eye, eye + light_dir * camera.far, up);

        // Orthographic bounds from the whole-range sphere; the radius only
        // ever grows so the projection does not breathe frame to frame
        let whole = frustum_bound_sphere(camera, self.ranges[0], self.ranges[TOTAL_CASCADES]);
        self.scene_bound_radius = self
            .scene_bound_radius
            .max(whole.radius)
            .max(MIN_BOUND_RADIUS);
        let r = self.scene_bound_radius;
        let shadow_proj = Mat4::orthographic_rh_zo(-0.5 * r, 0.5 * r, -0.5 * r, 0.5 * r, -r, r);

        self.world_to_shadow = shadow_proj * self.shadow_view;

        for idx in 0..TOTAL_CASCADES {
            if self.anti_flicker {
                self.update_stabilized_cascade(camera, idx);
            } else {
                self.update_tight_cascade(camera, idx);
            }

            let state = &mut self.cascades[idx];
            let translate =
                Mat4::from_translation(Vec3::new(state.offset_x, state.offset_y, 0.0));
            let scale = Mat4::from_scale(Vec3::new(state.scale, state.scale, 1.0));
            state.world_to_cascade = scale * translate * self.world_to_shadow;
        }
    }

    /// Sphere-bound cascade with whole-texel center motion
    fn update_stabilized_cascade(&mut self, camera: &CameraView, idx: usize) {
        let sphere = frustum_bound_sphere(camera, self.ranges[idx], self.ranges[idx + 1]);
        let state = &mut self.cascades[idx];

        state.bound_radius = state
            .bound_radius
            .max(sphere.radius)
            .max(MIN_BOUND_RADIUS);

        // Offset of the candidate center against the persisted one, measured
        // in shadow-map pixels. The view has no scaling, so view units are
        // world units.
        let old_center = self.shadow_view.transform_point(state.bound_center);
        let new_center = self.shadow_view.transform_point(sphere.center);
        let diff = new_center - old_center;

        let pixel_size = self.resolution as f32 / (2.0 * state.bound_radius);
        let pixel_off_x = diff.x * pixel_size;
        let pixel_off_y = diff.y * pixel_size;

        // Move the persisted center only once the drift passes half a texel,
        // and then only in whole-texel steps
        if pixel_off_x.abs() > 0.5 || pixel_off_y.abs() > 0.5 {
            let snapped = Vec3::new(
                (0.5 + pixel_off_x).floor() / pixel_size,
                (0.5 + pixel_off_y).floor() / pixel_size,
                diff.z,
            );
            // Rotation-only view: the transpose is the inverse rotation
            let world_offset = self.shadow_view.transpose().transform_vector(snapped);
            state.bound_center += world_offset;
        }

        let center = self.world_to_shadow.transform_point(state.bound_center);
        state.offset_x = -center.x;
        state.offset_y = -center.y;
        state.scale = self.scene_bound_radius / state.bound_radius;
    }

    /// Tight box fit around the slice corners; shimmers under camera motion
    fn update_tight_cascade(&mut self, camera: &CameraView, idx: usize) {
        let corners = frustum_corners(camera, self.ranges[idx], self.ranges[idx + 1]);

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in corners {
            let p = self.world_to_shadow.transform_point(corner);
            min = min.min(p);
            max = max.max(p);
        }

        let center = (min + max) * 0.5;
        let state = &mut self.cascades[idx];
        state.offset_x = -center.x;
        state.offset_y = -center.y;
        state.scale = 2.0 / (max.x - min.x).max(max.y - min.y);
    }

    /// Shadow map resolution in pixels
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Whether the stabilized path is active
    #[inline]
    pub fn anti_flicker(&self) -> bool {
        self.anti_flicker
    }

    /// Switch between the stabilized and tight-fit paths
    pub fn set_anti_flicker(&mut self, on: bool) {
        self.anti_flicker = on;
    }

    /// The split ladder `[near, split0, split1, total_range]`
    #[inline]
    pub fn split_ladder(&self) -> [f32; TOTAL_CASCADES + 1] {
        self.ranges
    }

    /// World to shadow projection space transform
    #[inline]
    pub fn world_to_shadow(&self) -> Mat4 {
        self.world_to_shadow
    }

    /// Per-cascade state for the active cascades
    #[inline]
    pub fn cascades(&self) -> &[CascadeState; TOTAL_CASCADES] {
        &self.cascades
    }

    /// Shadow-to-cascade X translations, sentinel-filled past the last cascade
    pub fn to_cascade_offsets_x(&self) -> [f32; MAX_CASCADE_SLOTS] {
        let mut offsets = [UNUSED_SLOT_OFFSET; MAX_CASCADE_SLOTS];
        for (slot, state) in offsets.iter_mut().zip(self.cascades.iter()) {
            *slot = state.offset_x;
        }
        offsets
    }

    /// Shadow-to-cascade Y translations, sentinel-filled past the last cascade
    pub fn to_cascade_offsets_y(&self) -> [f32; MAX_CASCADE_SLOTS] {
        let mut offsets = [UNUSED_SLOT_OFFSET; MAX_CASCADE_SLOTS];
        for (slot, state) in offsets.iter_mut().zip(self.cascades.iter()) {
            *slot = state.offset_y;
        }
        offsets
    }

    /// Shadow-to-cascade scales, sentinel-filled past the last cascade
    pub fn to_cascade_scales(&self) -> [f32; MAX_CASCADE_SLOTS] {
        let mut scales = [UNUSED_SLOT_SCALE; MAX_CASCADE_SLOTS];
        for (slot, state) in scales.iter_mut().zip(self.cascades.iter()) {
            *slot = state.scale;
        }
        scales
    }

    /// Snapshot the persistent bounds for hot-reload
    pub fn save_state(&self) -> CascadeStabilizerState {
        CascadeStabilizerState {
            scene_bound_radius: self.scene_bound_radius,
            cascades: self.cascades,
        }
    }

    /// Restore persistent bounds from a snapshot
    pub fn restore_state(&mut self, state: CascadeStabilizerState) {
        self.scene_bound_radius = state.scene_bound_radius.max(0.0);
        self.cascades = state.cascades;
        for cascade in self.cascades.iter_mut() {
            cascade.bound_radius = cascade.bound_radius.max(0.0);
        }
    }
}

/// Up axis for the shadow-space view
///
/// Crossing the light direction with world right fails when the two are
/// nearly parallel; substitute the world up axis before the cross product so
/// no NaN reaches the transforms.
fn light_up_axis(light_dir: Vec3) -> Vec3 {
    let up = light_dir.cross(Vec3::X);
    if up.length_squared() > 1e-6 {
        return up.normalize();
    }
    log::warn!("light direction parallel to world right, using fallback up axis");
    light_dir.cross(Vec3::Y).normalize()
}
