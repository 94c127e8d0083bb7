//! Shadow Slot Allocation
//!
//! Tracks which shadow-casting lights own a shadow map this frame. Each light
//! type has a fixed pool of pre-allocated maps; the pools hand slots out
//! first-come-first-served in registration order and reset every frame. A
//! caster that misses out simply renders unshadowed - exhaustion is a
//! steady-state degradation, never an error.

use crate::lights::LightKind;
use serde::{Deserialize, Serialize};

/// Spot light shadow maps available per frame
pub const MAX_SPOT_SHADOWS: u32 = 3;

/// Point light shadow cube maps available per frame
pub const MAX_POINT_SHADOWS: u32 = 3;

/// Fixed-capacity slot pool with a first-come-first-served cursor
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct SlotPool {
    capacity: u32,
    next_free: u32,
}

impl SlotPool {
    const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            next_free: 0,
        }
    }

    fn reset(&mut self) {
        self.next_free = 0;
    }

    fn allocate(&mut self) -> Option<u32> {
        if self.next_free < self.capacity {
            let slot = self.next_free;
            self.next_free += 1;
            Some(slot)
        } else {
            None
        }
    }

    fn allocated(&self) -> u32 {
        self.next_free
    }

    fn is_full(&self) -> bool {
        self.next_free >= self.capacity
    }
}

/// Per-frame allocation statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasStats {
    /// Spot slots handed out this frame
    pub spot_allocated: u32,

    /// Point slots handed out this frame
    pub point_allocated: u32,

    /// Casters that requested a slot after the pools ran dry
    pub rejected: u32,
}

/// Shadow slot allocator for spot and point lights
///
/// Directional-light cascades render into their own target array and never
/// contend with these pools.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShadowAtlas {
    spot: SlotPool,
    point: SlotPool,
    stats: AtlasStats,
}

impl ShadowAtlas {
    /// Create an atlas with the built-in pool capacities
    pub const fn new() -> Self {
        Self {
            spot: SlotPool::new(MAX_SPOT_SHADOWS),
            point: SlotPool::new(MAX_POINT_SHADOWS),
            stats: AtlasStats {
                spot_allocated: 0,
                point_allocated: 0,
                rejected: 0,
            },
        }
    }

    /// Reset both pools for a new frame
    pub fn begin_frame(&mut self) {
        self.spot.reset();
        self.point.reset();
        self.stats = AtlasStats::default();
    }

    /// Allocate the next free slot for a light of the given kind
    ///
    /// Returns `None` once the pool for that kind is exhausted.
    pub fn allocate(&mut self, kind: LightKind) -> Option<u32> {
        let pool = match kind {
            LightKind::Spot => &mut self.spot,
            LightKind::Point => &mut self.point,
        };

        match pool.allocate() {
            Some(slot) => {
                match kind {
                    LightKind::Spot => self.stats.spot_allocated += 1,
                    LightKind::Point => self.stats.point_allocated += 1,
                }
                Some(slot)
            }
            None => {
                self.stats.rejected += 1;
                log::debug!("{:?} shadow pool exhausted, caster renders unshadowed", kind);
                None
            }
        }
    }

    /// Spot slots handed out so far this frame
    pub fn spot_allocated(&self) -> u32 {
        self.spot.allocated()
    }

    /// Point slots handed out so far this frame
    pub fn point_allocated(&self) -> u32 {
        self.point.allocated()
    }

    /// Whether a kind's pool has no slots left
    pub fn is_full(&self, kind: LightKind) -> bool {
        match kind {
            LightKind::Spot => self.spot.is_full(),
            LightKind::Point => self.point.is_full(),
        }
    }

    /// Allocation statistics for this frame
    pub fn stats(&self) -> &AtlasStats {
        &self.stats
    }
}

impl Default for ShadowAtlas {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_handed_out_in_order() {
        let mut atlas = ShadowAtlas::new();

        for expected in 0..MAX_SPOT_SHADOWS {
            assert_eq!(atlas.allocate(LightKind::Spot), Some(expected));
        }
        for expected in 0..MAX_POINT_SHADOWS {
            assert_eq!(atlas.allocate(LightKind::Point), Some(expected));
        }
    }

    #[test]
    fn test_exhausted_pool_returns_none() {
        let mut atlas = ShadowAtlas::new();

        for _ in 0..MAX_SPOT_SHADOWS {
            assert!(atlas.allocate(LightKind::Spot).is_some());
        }
        assert_eq!(atlas.allocate(LightKind::Spot), None);
        assert!(atlas.is_full(LightKind::Spot));

        // The point pool is independent
        assert_eq!(atlas.allocate(LightKind::Point), Some(0));
        assert!(!atlas.is_full(LightKind::Point));
    }

    #[test]
    fn test_begin_frame_resets_pools() {
        let mut atlas = ShadowAtlas::new();

        for _ in 0..MAX_SPOT_SHADOWS {
            atlas.allocate(LightKind::Spot);
        }
        atlas.allocate(LightKind::Spot);
        assert_eq!(atlas.stats().rejected, 1);

        atlas.begin_frame();
        assert_eq!(atlas.allocate(LightKind::Spot), Some(0));
        assert_eq!(atlas.stats(), &AtlasStats {
            spot_allocated: 1,
            point_allocated: 0,
            rejected: 0,
        });
    }

    #[test]
    fn test_stats_track_both_pools() {
        let mut atlas = ShadowAtlas::new();
        atlas.allocate(LightKind::Spot);
        atlas.allocate(LightKind::Point);
        atlas.allocate(LightKind::Point);

        assert_eq!(atlas.spot_allocated(), 1);
        assert_eq!(atlas.point_allocated(), 2);
        assert_eq!(atlas.stats().rejected, 0);
    }

    #[test]
    fn test_atlas_serialization() {
        let mut atlas = ShadowAtlas::new();
        atlas.allocate(LightKind::Spot);

        let json = serde_json::to_string(&atlas).unwrap();
        let restored: ShadowAtlas = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.spot_allocated(), 1);
    }
}
