//! Out-of-band engine events
//!
//! Failures never travel through the pull call chain. The engine reports
//! them, together with frame and structure notifications, to an
//! `EventSink` supplied by the host (status badges, logs, tests). A sink
//! that cannot deliver an event only costs a warning in the log.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Receiver of [`EngineEvent`]s, whatever the transport
pub trait EventSink: Send + Sync {
    fn send(&self, event: EngineEvent) -> Result<(), EventError>;
}

/// Why a sink dropped an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event receiver is gone")]
    Disconnected,

    #[error("event sink failed: {0}")]
    Delivery(String),
}

/// Engine notifications.
///
/// Instances and slots are identified by their arena index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    /// A requested slot finished evaluating for a frame
    #[serde(rename_all = "camelCase")]
    FrameEvaluated {
        slot: u32,
        time: f64,
        /// Operator recomputes during the whole frame
        recomputed: usize,
    },

    /// An operator started failing; its last good value stays cached
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        instance: u32,
        operator_type: String,
        error: String,
    },

    #[serde(rename_all = "camelCase")]
    NodeRecovered { instance: u32, operator_type: String },

    /// Sent per operator recompute when `EngineConfig::emit_recompute_events` is set
    #[serde(rename_all = "camelCase")]
    SlotRecomputed { slot: u32, instance: u32, port: String },

    /// An edit reached every live instance of `symbol` (empty after undo/redo)
    #[serde(rename_all = "camelCase")]
    StructureChanged { symbol: String, dirty_slots: usize },
}

impl EngineEvent {
    /// Instance the event is about, if any
    pub fn instance(&self) -> Option<u32> {
        match self {
            EngineEvent::NodeFailed { instance, .. }
            | EngineEvent::NodeRecovered { instance, .. }
            | EngineEvent::SlotRecomputed { instance, .. } => Some(*instance),
            EngineEvent::FrameEvaluated { .. } | EngineEvent::StructureChanged { .. } => None,
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EngineEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Collects events in memory, mostly for tests and inspection panels
#[derive(Debug, Default)]
pub struct VecEventSink {
    received: Mutex<Vec<EngineEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far
    pub fn events(&self) -> Vec<EngineEvent> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EngineEvent) -> Result<(), EventError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}
