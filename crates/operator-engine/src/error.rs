//! Error types for the operator engine

use thiserror::Error;

use crate::types::{ChildId, InstanceId, SlotId, SymbolId, ValueType};

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the operator engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operator failed to compute one of its outputs
    #[error("Operator compute failed: {0}")]
    ComputeFailed(String),

    /// Missing required input
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Invalid input type
    #[error("Invalid input type for '{input}': expected {expected}")]
    InvalidInputType { input: String, expected: ValueType },

    /// An upstream resource (device, file, texture) is not available yet
    #[error("Resource unavailable: {0}")]
    Unavailable(String),

    /// Symbol not present in the library
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    /// Instance not present in the runtime graph
    #[error("Unknown instance: {0:?}")]
    UnknownInstance(InstanceId),

    /// Slot not present in the runtime graph
    #[error("Unknown slot: {0:?}")]
    UnknownSlot(SlotId),

    /// An authoring operation was rejected
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl EngineError {
    /// Create a compute failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ComputeFailed(msg.into())
    }

    /// Create an unavailable-resource error with a message
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Rejections of authoring edits. These never reach the live graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralError {
    /// Placing the child would make a symbol contain itself
    #[error("Symbol {child} cannot be placed inside {parent}: it already contains it")]
    CyclicContainment { parent: SymbolId, child: SymbolId },

    /// The connection would feed a child's output back into its own input
    #[error("Connecting '{source_port}' to '{target_port}' would create a feedback loop")]
    CyclicConnection {
        source_port: String,
        target_port: String,
    },

    /// Source and target value types are not convertible
    #[error("Cannot connect {source_type} to {target_type}")]
    TypeMismatch {
        source_type: ValueType,
        target_type: ValueType,
    },

    /// A multi-input already holds a connection at this ordinal
    #[error("Input '{input}' already has a connection at ordinal {ordinal}")]
    DuplicateOrdinal { input: String, ordinal: usize },

    /// Ordinal would leave a gap (or does not exist when disconnecting)
    #[error("Ordinal {ordinal} is out of range for input '{input}' ({len} connections)")]
    InvalidOrdinal {
        input: String,
        ordinal: usize,
        len: usize,
    },

    /// A simple input already has its single upstream connection
    #[error("Input '{0}' already has a connection")]
    InputAlreadyConnected(String),

    /// Symbol not present in the library
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(SymbolId),

    /// Placement not present in the symbol
    #[error("Unknown child placement: {0}")]
    UnknownChild(ChildId),

    /// A builder referenced a placement name it never declared
    #[error("Unknown child name '{0}'")]
    UnknownChildName(String),

    /// Input port not defined on the symbol
    #[error("Unknown input '{0}'")]
    UnknownInput(String),

    /// Output port not defined on the symbol
    #[error("Unknown output '{0}'")]
    UnknownOutput(String),

    /// No operator registered for a primitive symbol's type
    #[error("No operator registered for type '{0}'")]
    UnknownOperator(String),

    /// Children can only be placed inside composite symbols
    #[error("Symbol {0} is a primitive operator and cannot hold children")]
    NotComposite(SymbolId),

    /// No keyframe at the requested time
    #[error("No keyframe on '{input}' at time {time}")]
    MissingKeyframe { input: String, time: f64 },

    /// Disconnect requested for a connection that does not exist
    #[error("No connection into '{0}'")]
    MissingConnection(String),
}
