//! Construction parameters for the slot arrays and trees.

use crate::error::{ConfigError, Result};
use crate::tree::NodeId;

/// Configuration for [`StableIndexSlotArray`](crate::StableIndexSlotArray) and
/// [`IntrusiveHoleStackArray`](crate::IntrusiveHoleStackArray).
#[derive(Debug, Clone)]
pub struct SlotArrayConfig {
    /// Number of slots allocated up front.
    pub initial_capacity: usize,
}

impl Default for SlotArrayConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
        }
    }
}

impl SlotArrayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

/// Configuration for [`TrinaryStableIndexSlotArray`](crate::TrinaryStableIndexSlotArray).
#[derive(Debug, Clone)]
pub struct TrinaryConfig {
    /// Number of slots allocated up front. Raised to the trinary minimum of 6.
    pub initial_capacity: usize,
    /// Fraction by which the right bound must shrink, relative to its value at
    /// the previous resort, before free indices are re-bucketed. `None`
    /// disables resorting entirely.
    pub resort_threshold: Option<f64>,
}

impl Default for TrinaryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            resort_threshold: None,
        }
    }
}

impl TrinaryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let Some(t) = self.resort_threshold {
            if !(t > 0.0 && t <= 1.0) {
                return Err(ConfigError::InvalidResortThreshold(t));
            }
        }
        Ok(())
    }
}

/// Configuration for the flat-array trees.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Number of node slots allocated up front, root included.
    pub initial_capacity: usize,
    /// Compact automatically once more than this many holes accumulate.
    /// `0` disables automatic compaction. Only the ancestrally-ordered tree
    /// compacts; the sibling-chain tree ignores this field.
    pub compact_after_removals: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 8,
            compact_after_removals: 0,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.initial_capacity > NodeId::MAX_NODES {
            return Err(ConfigError::CapacityExceedsNodeRange(self.initial_capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SlotArrayConfig::default().validate().is_ok());
        assert!(TrinaryConfig::default().validate().is_ok());
        assert!(TreeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let cfg = SlotArrayConfig {
            initial_capacity: 0,
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_resort_threshold_range() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let cfg = TrinaryConfig {
                resort_threshold: Some(bad),
                ..TrinaryConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidResortThreshold(_))
            ));
        }
        let cfg = TrinaryConfig {
            resort_threshold: Some(0.5),
            ..TrinaryConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
