//! # umbra_render - Shadow Pass Setup
//!
//! Backend-agnostic shadow mapping infrastructure for deferred renderers:
//!
//! - **Camera**: read-only view input consumed by the geometry code
//! - **Lights**: per-frame registration of shadow-casting lights
//! - **Shadow**: cascade stabilization, slot allocation and pass scheduling
//!
//! The crate computes transforms and pass descriptors only. It never creates
//! GPU resources or issues draw calls; the render loop binds each descriptor's
//! target, submits the scene casters once, then asks for the next descriptor.
//!
//! ## Example
//!
//! ```ignore
//! use umbra_render::prelude::*;
//!
//! let config = ShadowConfig::default();
//! let mut stabilizer = CascadeStabilizer::new(&config, &camera)?;
//! let mut frame = LightFrame::new();
//!
//! // Each frame
//! frame.begin_frame();
//! frame.set_directional(sun_dir, sun_color, true);
//! frame.add_spot_light(pos, dir, 30.0, 35.0, 30.0, color, true);
//!
//! for pass in frame.schedule(&mut stabilizer, &camera) {
//!     match pass {
//!         ShadowPass::Spot(spot) => { /* bind spot slot, draw casters */ }
//!         ShadowPass::Point(point) => { /* upload six faces, draw once */ }
//!         ShadowPass::Cascades(cascades) => { /* multi-viewport draw */ }
//!     }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod camera;
pub mod lights;
pub mod shadow;

pub use camera::CameraView;
pub use lights::{DirectionalLight, LightFrame, LightKind, ShadowCasterLight, MAX_LIGHTS};
pub use shadow::{
    CascadeShadowPass, CascadeStabilizer, CascadeStabilizerState, CascadeState, PointShadowPass,
    ShadowAtlas, ShadowConfig, ShadowPass, ShadowPassSchedule, ShadowTarget, SpotShadowPass,
    Viewport, MAX_CASCADE_SLOTS, MAX_POINT_SHADOWS, MAX_SPOT_SHADOWS, TOTAL_CASCADES,
};

use core::fmt;

/// Errors that make the shadow subsystem unusable
///
/// Everything else (exhausted slot pools, degenerate light directions)
/// degrades locally and never aborts the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The camera input failed validation at construction
    InvalidCamera(&'static str),
    /// The shadow configuration is unusable
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCamera(msg) => write!(f, "Invalid camera: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid shadow config: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// Convenience re-exports
pub mod prelude {
    pub use crate::camera::CameraView;
    pub use crate::lights::{DirectionalLight, LightFrame, LightKind, ShadowCasterLight};
    pub use crate::shadow::{
        CascadeStabilizer, ShadowConfig, ShadowPass, ShadowPassSchedule, ShadowTarget,
    };
    pub use crate::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidCamera("near plane must be positive");
        assert!(format!("{}", err).contains("near plane"));
    }
}
