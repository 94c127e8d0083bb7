//! Shadow Mapping System
//!
//! Backend-agnostic shadow pass setup for directional, spot and point lights.
//!
//! # Architecture
//!
//! The system is split into:
//!
//! - **Config**: global shadow settings with validation and presets
//! - **Frustum**: split-frustum corner and bound-sphere extraction
//! - **Cascade**: temporally-stabilized cascade transform derivation
//! - **Atlas**: fixed-capacity shadow slot allocation per light type
//! - **Schedule**: the per-frame lazy sequence of shadow pass descriptors
//! - **Data**: GPU-ready constant-block structures
//!
//! # Frame flow
//!
//! ```ignore
//! frame.begin_frame();                       // clears lights, resets slots
//! frame.set_directional(dir, color, true);
//! frame.add_point_light(pos, 20.0, color, true);
//!
//! for pass in frame.schedule(&mut stabilizer, &camera) {
//!     // bind pass target/viewport, upload transforms, draw casters once
//! }
//! ```
//!
//! The cascade pass runs last and triggers the stabilizer update; everything
//! is rebuilt from the live camera and light registrations every frame, so a
//! frame that aborts mid-schedule simply restarts cleanly on the next one.

pub mod atlas;
pub mod cascade;
pub mod config;
pub mod data;
pub mod frustum;
pub mod schedule;

pub use atlas::{AtlasStats, ShadowAtlas, MAX_POINT_SHADOWS, MAX_SPOT_SHADOWS};
pub use cascade::{
    CascadeStabilizer, CascadeStabilizerState, CascadeState, MAX_CASCADE_SLOTS, TOTAL_CASCADES,
    UNUSED_SLOT_OFFSET, UNUSED_SLOT_SCALE,
};
pub use config::ShadowConfig;
pub use data::{GpuCascadeGenMatrices, GpuCascadeShadow, GpuPointShadowFaces, GpuSpotShadow};
pub use frustum::{frustum_bound_sphere, frustum_corners};
pub use schedule::{
    CascadeShadowPass, PointShadowPass, ShadowPass, ShadowPassSchedule, ShadowTarget,
    SpotShadowPass, Viewport, SHADOW_NEAR,
};
