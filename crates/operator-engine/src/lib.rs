//! Operator Engine - pull-based dataflow evaluation for procedural graphics
//!
//! This crate defines reusable node templates (symbols), instantiates them
//! into a live graph, propagates invalidation through it and lazily
//! recomputes only what a frame asks for. It supports:
//!
//! - Recursive composition of symbols with literal overrides
//! - Typed, cached slots with per-output trigger policies
//! - Ordered multi-input aggregation
//! - A scoped evaluation context (time, camera, resolution, named
//!   variables) restored on every exit path
//! - Keyframed animation curves driving placement inputs
//! - Compressed snapshot-based undo/redo of the symbol library
//!
//! # Architecture
//!
//! - `SymbolLibrary`: authoring-side definitions, validated on every edit
//! - `InstanceGraph`: arena of live instances and slots
//! - `Evaluator`: the pull algorithm over one graph for one frame
//! - `Engine`: facade tying the above together with the operator registry,
//!   extensions and an `EventSink`
//!
//! # Example
//!
//! ```ignore
//! use operator_engine::{Engine, EvaluationContext, OperatorRegistry, SymbolBuilder};
//!
//! let mut engine = Engine::new(library, OperatorRegistry::with_builtins());
//! let root = engine.instantiate(scene)?;
//! let value = engine.evaluate_output(root, "out", &mut EvaluationContext::at_time(0.5))?;
//! ```

pub mod animator;
pub mod builder;
pub mod config;
pub mod context;
pub mod curve;
pub mod descriptor;
pub mod dirty;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod extensions;
pub mod graph;
pub mod library;
pub mod operator;
pub mod port_options;
pub mod registry;
pub mod slot;
pub mod symbol;
pub mod types;
pub mod undo;
pub mod validation;
pub mod value;

#[cfg(test)]
mod testing;

// Re-export key types
pub use animator::Animator;
pub use builder::{BuiltSymbol, SymbolBuilder};
pub use config::EngineConfig;
pub use context::{ContextScope, EvaluationContext, ObjectVariables};
pub use curve::{Curve, Easing, EasingDirection, EasingFunction, Interpolation, Keyframe};
pub use descriptor::{InputMetadata, OperatorDescriptor, OperatorFn, OperatorMetadata, OutputMetadata};
pub use dirty::{DirtyFlag, TriggerPolicy};
pub use engine::{CacheStats, Engine};
pub use error::{EngineError, Result, StructuralError};
pub use events::{EngineEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use extensions::{extension_keys, Extensions};
pub use graph::{Instance, InstanceGraph};
pub use library::SymbolLibrary;
pub use operator::{
    DropdownProvider, Inputs, NodeStatus, Operator, StatusReporting, TransformInputs, Transformable,
};
pub use port_options::{PortOption, PortOptionsQuery, PortOptionsResult};
pub use registry::OperatorRegistry;
pub use slot::{SlotCell, SlotKind, SlotSource};
pub use symbol::{Connection, Endpoint, InputDefinition, OutputDefinition, Symbol, SymbolChild};
pub use types::{ChildId, InputId, InstanceId, OperatorCategory, OutputId, SlotId, SymbolId, ValueType};
pub use validation::{validate_library, ValidationError};
pub use value::Value;
