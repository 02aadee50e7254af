//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables of an [`Engine`](crate::engine::Engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Animated inputs resample only when local time moved at least this
    /// far (seconds) since their last sample
    pub animation_time_epsilon: f64,
    /// Maximum number of undo snapshots kept
    pub undo_depth: usize,
    /// Send `SlotRecomputed` for every operator recompute
    pub emit_recompute_events: bool,
    /// Invalidate downstream slots on every write, even when the value is
    /// unchanged
    pub propagate_unchanged_writes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            animation_time_epsilon: 0.001,
            undo_depth: 100,
            emit_recompute_events: false,
            propagate_unchanged_writes: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.animation_time_epsilon, 0.001);
        assert_eq!(config.undo_depth, 100);
        assert!(!config.emit_recompute_events);
        assert!(!config.propagate_unchanged_writes);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = EngineConfig::from_json(r#"{"undoDepth": 5, "emitRecomputeEvents": true}"#)
            .unwrap();
        assert_eq!(config.undo_depth, 5);
        assert!(config.emit_recompute_events);
        assert_eq!(config.animation_time_epsilon, 0.001);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
