//! Shadow Pass Scheduling
//!
//! Yields, one at a time, the rendering configuration for every shadow map
//! that needs generating this frame: one pass per slotted spot light, one
//! six-face pass per slotted point light, then a single multi-viewport pass
//! for the directional cascades. The schedule is a plain iterator rebuilt
//! from the light registry each frame; it computes transforms and descriptors
//! but never touches the GPU.
//!
//! Point lights get all six cube-face matrices in one constant block: a
//! geometry-amplification stage fans each caster primitive out to every face
//! in a single submission. Six times the primitive throughput, but shadow
//! casters are cheap relative to the main scene and it saves five draw
//! submissions per light.

use crate::camera::CameraView;
use crate::lights::{DirectionalLight, LightKind, ShadowCasterLight};
use serde::{Deserialize, Serialize};
use umbra_math::{consts, Mat4, Vec3};

use super::cascade::{CascadeStabilizer, MAX_CASCADE_SLOTS, TOTAL_CASCADES};

/// Near plane distance for spot and point shadow projections
pub const SHADOW_NEAR: f32 = 5.0;

/// Render target viewport
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-size square viewport for a shadow map of the given resolution
    pub fn square(resolution: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: resolution as f32,
            height: resolution as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Which depth target a shadow pass renders into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowTarget {
    /// One of the spot shadow maps
    SpotSlot(u32),
    /// One of the point shadow cube maps
    PointSlot(u32),
    /// The cascade texture array, all slices at once
    CascadeArray,
}

/// Descriptor for one spot light shadow pass
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpotShadowPass {
    /// Index into the frame's light list
    pub light_index: usize,
    pub target: ShadowTarget,
    pub world_to_light: Mat4,
    pub viewport: Viewport,
}

/// Descriptor for one point light shadow pass (all six faces)
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PointShadowPass {
    /// Index into the frame's light list
    pub light_index: usize,
    pub target: ShadowTarget,
    /// Face transforms in +X, -X, +Y, -Y, +Z, -Z order
    pub faces: [Mat4; 6],
    pub viewports: [Viewport; 6],
}

/// Descriptor for the directional cascade pass
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CascadeShadowPass {
    pub target: ShadowTarget,
    /// World-to-cascade transform per active cascade
    pub world_to_cascade: [Mat4; TOTAL_CASCADES],
    /// Shadow-to-cascade translations, sentinel-filled past the last cascade
    pub offsets_x: [f32; MAX_CASCADE_SLOTS],
    pub offsets_y: [f32; MAX_CASCADE_SLOTS],
    /// Shadow-to-cascade scales, sentinel-filled past the last cascade
    pub scales: [f32; MAX_CASCADE_SLOTS],
    /// Split ladder for cascade selection in the lighting stage
    pub split_ladder: [f32; TOTAL_CASCADES + 1],
    pub viewports: [Viewport; TOTAL_CASCADES],
}

/// One shadow pass to render
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum ShadowPass {
    Spot(SpotShadowPass),
    Point(PointShadowPass),
    Cascades(CascadeShadowPass),
}

/// Lazy per-frame sequence of shadow passes
///
/// Walks the registered lights in order, skipping casters without a slot,
/// then finishes with the cascade pass when the directional light casts
/// shadows. Non-reentrant by construction (it borrows the stabilizer
/// mutably); recreate it from the light frame to restart.
pub struct ShadowPassSchedule<'a> {
    lights: &'a [ShadowCasterLight],
    directional: Option<DirectionalLight>,
    stabilizer: &'a mut CascadeStabilizer,
    camera: &'a CameraView,
    cursor: usize,
    cascade_emitted: bool,
}

impl<'a> ShadowPassSchedule<'a> {
    pub(crate) fn new(
        lights: &'a [ShadowCasterLight],
        directional: Option<DirectionalLight>,
        stabilizer: &'a mut CascadeStabilizer,
        camera: &'a CameraView,
    ) -> Self {
        Self {
            lights,
            directional,
            stabilizer,
            camera,
            cursor: 0,
            cascade_emitted: false,
        }
    }

    fn cascade_pass(&mut self, direction: Vec3) -> CascadeShadowPass {
        self.stabilizer.update(self.camera, direction);

        let mut world_to_cascade = [Mat4::IDENTITY; TOTAL_CASCADES];
        for (dst, state) in world_to_cascade.iter_mut().zip(self.stabilizer.cascades()) {
            *dst = state.world_to_cascade;
        }

        CascadeShadowPass {
            target: ShadowTarget::CascadeArray,
            world_to_cascade,
            offsets_x: self.stabilizer.to_cascade_offsets_x(),
            offsets_y: self.stabilizer.to_cascade_offsets_y(),
            scales: self.stabilizer.to_cascade_scales(),
            split_ladder: self.stabilizer.split_ladder(),
            viewports: [Viewport::square(self.stabilizer.resolution()); TOTAL_CASCADES],
        }
    }
}

impl Iterator for ShadowPassSchedule<'_> {
    type Item = ShadowPass;

    fn next(&mut self) -> Option<ShadowPass> {
        // Next shadow-casting light with a slot
        while self.cursor < self.lights.len() {
            let index = self.cursor;
            self.cursor += 1;

            let light = &self.lights[index];
            let Some(slot) = light.shadow_slot else {
                continue;
            };

            let resolution = self.stabilizer.resolution();
            let pass = match light.kind {
                LightKind::Spot => ShadowPass::Spot(SpotShadowPass {
                    light_index: index,
                    target: ShadowTarget::SpotSlot(slot),
                    world_to_light: spot_shadow_transform(light),
                    viewport: Viewport::square(resolution),
                }),
                LightKind::Point => ShadowPass::Point(PointShadowPass {
                    light_index: index,
                    target: ShadowTarget::PointSlot(slot),
                    faces: point_shadow_faces(light),
                    viewports: [Viewport::square(resolution); 6],
                }),
            };
            return Some(pass);
        }

        // The directional cascades render last, at most once
        if !self.cascade_emitted {
            self.cascade_emitted = true;
            if let Some(directional) = self.directional {
                if directional.cast_shadows {
                    return Some(ShadowPass::Cascades(self.cascade_pass(directional.direction)));
                }
            }
        }

        None
    }
}

/// Up-axis hint for a spot light view
///
/// Near-vertical directions would be parallel to the default +Y hint and
/// collapse the look-at cross products; swap in a Z-axis hint first.
fn spot_up_axis(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.9 {
        Vec3::new(0.0, 0.0, direction.y)
    } else {
        Vec3::Y
    }
}

/// Spot light view-projection: a perspective cone along the light direction
fn spot_shadow_transform(light: &ShadowCasterLight) -> Mat4 {
    let target = light.position + light.direction * light.range;
    let view = Mat4::look_at(light.position, target, spot_up_axis(light.direction));

    // The cone must stay in front of the fixed shadow near plane
    let far = light.range.max(SHADOW_NEAR + 0.1);
    let proj = Mat4::perspective(2.0 * light.outer_angle, 1.0, SHADOW_NEAR, far);

    proj * view
}

/// Six cube-face view-projections sharing one 90 degree projection
fn point_shadow_faces(light: &ShadowCasterLight) -> [Mat4; 6] {
    let far = light.range.max(SHADOW_NEAR + 0.1);
    let proj = Mat4::perspective(consts::FRAC_PI_2, 1.0, SHADOW_NEAR, far);
    let to_light = Mat4::from_translation(-light.position);

    let face_rotations = [
        Mat4::from_rotation_y(consts::FRAC_PI_2),  // +X
        Mat4::from_rotation_y(-consts::FRAC_PI_2), // -X
        Mat4::from_rotation_x(-consts::FRAC_PI_2), // +Y
        Mat4::from_rotation_x(consts::FRAC_PI_2),  // -Y
        Mat4::from_rotation_y(consts::PI),         // +Z
        Mat4::IDENTITY,                            // -Z
    ];

    face_rotations.map(|rotation| proj * rotation * to_light)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::LightFrame;
    use crate::shadow::config::ShadowConfig;
    use umbra_math::radians;

    fn test_camera() -> CameraView {
        CameraView::look_at(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 10.0),
            1.0,
            500.0,
            radians(70.0),
            16.0 / 9.0,
        )
    }

    fn make_stabilizer(camera: &CameraView) -> CascadeStabilizer {
        CascadeStabilizer::new(&ShadowConfig::default(), camera).unwrap()
    }

    fn populated_frame() -> LightFrame {
        let mut frame = LightFrame::new();
        frame.begin_frame();
        frame.set_directional(Vec3::new(0.3, -0.8, 0.25), [1.0; 3], true);
        frame.add_spot_light(
            Vec3::new(5.0, 8.0, 0.0),
            Vec3::new(0.0, -1.0, 0.1),
            30.0,
            35.0,
            30.0,
            [1.0; 3],
            true,
        );
        frame.add_point_light(Vec3::new(-3.0, 4.0, 2.0), 25.0, [1.0; 3], true);
        frame.add_spot_light(
            Vec3::new(0.0, 6.0, -4.0),
            Vec3::new(0.2, -0.9, 0.0),
            20.0,
            40.0,
            35.0,
            [1.0; 3],
            false, // No shadow: must be skipped
        );
        frame
    }

    #[test]
    fn test_schedule_order_and_targets() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);
        let frame = populated_frame();

        let passes: Vec<ShadowPass> = frame.schedule(&mut stab, &cam).collect();
        assert_eq!(passes.len(), 3);

        match &passes[0] {
            ShadowPass::Spot(spot) => {
                assert_eq!(spot.light_index, 0);
                assert_eq!(spot.target, ShadowTarget::SpotSlot(0));
                assert!(spot.world_to_light.is_finite());
            }
            other => panic!("expected spot pass, got {:?}", other),
        }
        match &passes[1] {
            ShadowPass::Point(point) => {
                assert_eq!(point.light_index, 1);
                assert_eq!(point.target, ShadowTarget::PointSlot(0));
                for face in &point.faces {
                    assert!(face.is_finite());
                }
            }
            other => panic!("expected point pass, got {:?}", other),
        }
        match &passes[2] {
            ShadowPass::Cascades(cascades) => {
                assert_eq!(cascades.target, ShadowTarget::CascadeArray);
                assert_eq!(cascades.viewports.len(), TOTAL_CASCADES);
            }
            other => panic!("expected cascade pass, got {:?}", other),
        }
    }

    #[test]
    fn test_no_cascade_pass_without_directional_shadows() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);

        let mut frame = LightFrame::new();
        frame.begin_frame();
        frame.set_directional(Vec3::new(0.0, -1.0, 0.2), [1.0; 3], false);
        frame.add_point_light(Vec3::ZERO, 10.0, [1.0; 3], true);

        let passes: Vec<ShadowPass> = frame.schedule(&mut stab, &cam).collect();
        assert_eq!(passes.len(), 1);
        assert!(matches!(passes[0], ShadowPass::Point(_)));
    }

    #[test]
    fn test_empty_frame_yields_nothing() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);
        let mut frame = LightFrame::new();
        frame.begin_frame();

        assert_eq!(frame.schedule(&mut stab, &cam).count(), 0);
    }

    #[test]
    fn test_schedule_is_restartable() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);
        let frame = populated_frame();

        // Abandon a schedule partway through
        {
            let mut schedule = frame.schedule(&mut stab, &cam);
            let _ = schedule.next();
        }

        // A fresh schedule starts over from the first light
        let passes: Vec<ShadowPass> = frame.schedule(&mut stab, &cam).collect();
        assert_eq!(passes.len(), 3);
        assert!(matches!(passes[0], ShadowPass::Spot(_)));
    }

    #[test]
    fn test_schedule_exhausts_after_cascades() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);
        let frame = populated_frame();

        let mut schedule = frame.schedule(&mut stab, &cam);
        while schedule.next().is_some() {}
        assert!(schedule.next().is_none());
        assert!(schedule.next().is_none());
    }

    #[test]
    fn test_spot_transform_projects_target_to_center() {
        let light = ShadowCasterLight {
            kind: LightKind::Spot,
            position: Vec3::new(2.0, 10.0, -1.0),
            direction: Vec3::new(0.0, -1.0, 0.05).normalize(),
            range: 30.0,
            outer_angle: radians(35.0),
            inner_angle: radians(30.0),
            color: [1.0; 3],
            shadow_slot: Some(0),
        };

        let m = spot_shadow_transform(&light);
        // A point down the beam axis lands on the projection center
        let probe = light.position + light.direction * (light.range * 0.5);
        let projected = m.transform_point(probe);
        assert!(projected.x.abs() < 1e-4);
        assert!(projected.y.abs() < 1e-4);
    }

    #[test]
    fn test_point_faces_look_along_their_axes() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let light = ShadowCasterLight {
            kind: LightKind::Point,
            position,
            direction: Vec3::ZERO,
            range: 40.0,
            outer_angle: 0.0,
            inner_angle: 0.0,
            color: [1.0; 3],
            shadow_slot: Some(0),
        };

        let faces = point_shadow_faces(&light);
        let axes = [
            Vec3::X,
            -Vec3::X,
            Vec3::Y,
            -Vec3::Y,
            Vec3::Z,
            -Vec3::Z,
        ];

        for (face, axis) in faces.iter().zip(axes.iter()) {
            // A point along the face axis projects to the face center with
            // depth inside (0, 1)
            let probe = position + *axis * 20.0;
            let projected = face.transform_point(probe);
            assert!(projected.x.abs() < 1e-4, "axis {:?}", axis);
            assert!(projected.y.abs() < 1e-4, "axis {:?}", axis);
            assert!(projected.z > 0.0 && projected.z < 1.0, "axis {:?}", axis);
        }
    }

    #[test]
    fn test_vertical_spot_light_has_finite_transform() {
        let light = ShadowCasterLight {
            kind: LightKind::Spot,
            position: Vec3::new(0.0, 20.0, 0.0),
            direction: -Vec3::Y, // Straight down: degenerate with a +Y up hint
            range: 25.0,
            outer_angle: radians(30.0),
            inner_angle: radians(25.0),
            color: [1.0; 3],
            shadow_slot: Some(0),
        };

        assert!(spot_shadow_transform(&light).is_finite());
    }

    #[test]
    fn test_short_range_spot_does_not_invert_projection() {
        let light = ShadowCasterLight {
            kind: LightKind::Spot,
            position: Vec3::ZERO,
            direction: Vec3::Z,
            range: 2.0, // Below the fixed shadow near plane
            outer_angle: radians(30.0),
            inner_angle: radians(25.0),
            color: [1.0; 3],
            shadow_slot: Some(0),
        };

        assert!(spot_shadow_transform(&light).is_finite());
    }

    #[test]
    fn test_viewports_match_resolution() {
        let cam = test_camera();
        let mut stab = make_stabilizer(&cam);
        let frame = populated_frame();

        for pass in frame.schedule(&mut stab, &cam) {
            let expected = Viewport::square(1024);
            match pass {
                ShadowPass::Spot(spot) => assert_eq!(spot.viewport, expected),
                ShadowPass::Point(point) => {
                    assert!(point.viewports.iter().all(|v| *v == expected))
                }
                ShadowPass::Cascades(cascades) => {
                    assert!(cascades.viewports.iter().all(|v| *v == expected))
                }
            }
        }
    }
}
