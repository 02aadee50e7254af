//! Dirty-flag cell primitive
//!
//! Every slot owns a `DirtyFlag`. The flag answers one question on each
//! pull: may the cached value be returned as-is, or must the slot's source
//! be recomputed first? The answer depends on the flag's state and on the
//! trigger policy declared by the node author.

use serde::{Deserialize, Serialize};

/// When a slot recomputes
///
/// The engine never infers context sensitivity: a slot whose value depends
/// on context fields that are not modelled as connections (time, camera,
/// resolution, named variables) must declare `AlwaysPerPull`, or it will
/// return its first cached value to every later pull until invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Memoized: recompute only when invalidated, directly or through
    /// upstream propagation. Never volatile at frame start.
    Never,
    /// Recompute on every pull
    AlwaysPerPull,
    /// Clean until invalidated, directly or through upstream propagation
    #[default]
    ExplicitInvalidate,
}

/// Dirty state of one slot
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyFlag {
    dirty: bool,
    trigger: TriggerPolicy,
    recompute_count: u64,
    /// Context time of the last animated recompute
    last_time: Option<f64>,
}

impl DirtyFlag {
    /// New flags start dirty so the first pull computes a value
    pub fn new(trigger: TriggerPolicy) -> Self {
        Self {
            dirty: true,
            trigger,
            recompute_count: 0,
            last_time: None,
        }
    }

    pub fn trigger(&self) -> TriggerPolicy {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: TriggerPolicy) {
        self.trigger = trigger;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the next pull must recompute
    pub fn needs_update(&self) -> bool {
        self.dirty || self.trigger == TriggerPolicy::AlwaysPerPull
    }

    /// Mark dirty, directly or from upstream propagation, whatever the policy
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Clear after a recompute
    pub fn clear(&mut self) {
        self.dirty = false;
    }

    pub fn record_recompute(&mut self) {
        self.recompute_count += 1;
    }

    /// Number of times the slot's source has been recomputed
    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    pub fn set_last_time(&mut self, time: f64) {
        self.last_time = Some(time);
    }

    pub fn reset_last_time(&mut self) {
        self.last_time = None;
    }
}

impl Default for DirtyFlag {
    fn default() -> Self {
        Self::new(TriggerPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flag_is_dirty() {
        let flag = DirtyFlag::default();
        assert!(flag.is_dirty());
        assert!(flag.needs_update());
        assert_eq!(flag.trigger(), TriggerPolicy::ExplicitInvalidate);
    }

    #[test]
    fn test_clear_and_invalidate() {
        let mut flag = DirtyFlag::new(TriggerPolicy::ExplicitInvalidate);
        flag.clear();
        assert!(!flag.needs_update());
        flag.invalidate();
        assert!(flag.needs_update());
    }

    #[test]
    fn test_always_per_pull_never_settles() {
        let mut flag = DirtyFlag::new(TriggerPolicy::AlwaysPerPull);
        flag.clear();
        assert!(!flag.is_dirty());
        assert!(flag.needs_update());
    }

    #[test]
    fn test_never_settles_until_invalidated() {
        let mut flag = DirtyFlag::new(TriggerPolicy::Never);
        flag.clear();
        assert!(!flag.needs_update());
        flag.invalidate();
        assert!(flag.needs_update());
        flag.clear();
        assert!(!flag.needs_update());
    }
}
