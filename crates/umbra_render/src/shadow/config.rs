//! Shadow Configuration
//!
//! Global shadow settings with serde support for hot-reload.

use super::cascade::TOTAL_CASCADES;
use serde::{Deserialize, Serialize};

/// Minimum spacing between consecutive split distances
const MIN_SPLIT_SPACING: f32 = 0.5;

/// Global shadow configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Shadow map resolution in pixels (square, power of 2)
    pub resolution: u32,

    /// Far end of the cascade range, in world units from the camera
    pub cascade_total_range: f32,

    /// Inner split distances; the ladder is
    /// `[camera_near, split[0], split[1], cascade_total_range]`
    pub split_distances: [f32; TOTAL_CASCADES - 1],

    /// Trade tight cascade fit for temporal stability
    pub anti_flicker: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            cascade_total_range: 80.0,
            split_distances: [10.0, 25.0],
            anti_flicker: true,
        }
    }
}

impl ShadowConfig {
    /// Larger maps and a longer shadowed range
    pub fn high_quality() -> Self {
        Self {
            resolution: 2048,
            cascade_total_range: 150.0,
            split_distances: [15.0, 45.0],
            ..Default::default()
        }
    }

    /// Smaller maps and a shorter range for performance
    pub fn low_quality() -> Self {
        Self {
            resolution: 512,
            cascade_total_range: 50.0,
            split_distances: [8.0, 20.0],
            ..Default::default()
        }
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.resolution = self.resolution.clamp(256, 8192);
        self.resolution = self.resolution.next_power_of_two();

        let mut prev = 0.0;
        for split in self.split_distances.iter_mut() {
            if !split.is_finite() || *split < prev + MIN_SPLIT_SPACING {
                *split = prev + MIN_SPLIT_SPACING;
            }
            prev = *split;
        }
        if !self.cascade_total_range.is_finite()
            || self.cascade_total_range < prev + MIN_SPLIT_SPACING
        {
            self.cascade_total_range = prev + MIN_SPLIT_SPACING;
        }
    }

    /// Build the full split ladder for a given camera near plane
    pub fn split_ladder(&self, camera_near: f32) -> [f32; TOTAL_CASCADES + 1] {
        [
            camera_near,
            self.split_distances[0],
            self.split_distances[1],
            self.cascade_total_range,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShadowConfig::default();
        assert_eq!(config.resolution, 1024);
        assert_eq!(config.cascade_total_range, 80.0);
        assert!(config.anti_flicker);
    }

    #[test]
    fn test_validate_clamps_resolution() {
        let mut config = ShadowConfig {
            resolution: 1000, // Not a power of 2
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.resolution, 1024);

        config.resolution = 100_000;
        config.validate();
        assert_eq!(config.resolution, 8192);
    }

    #[test]
    fn test_validate_repairs_split_ladder() {
        let mut config = ShadowConfig {
            split_distances: [25.0, 10.0], // Out of order
            cascade_total_range: 5.0,      // Below the last split
            ..Default::default()
        };
        config.validate();

        assert!(config.split_distances[0] < config.split_distances[1]);
        assert!(config.split_distances[1] < config.cascade_total_range);
    }

    #[test]
    fn test_split_ladder() {
        let config = ShadowConfig::default();
        let ladder = config.split_ladder(1.0);
        assert_eq!(ladder, [1.0, 10.0, 25.0, 80.0]);
    }

    #[test]
    fn test_config_serialization() {
        let config = ShadowConfig::high_quality();
        let json = serde_json::to_string(&config).unwrap();
        let restored: ShadowConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
