//! Core identifier and type definitions
//!
//! Symbols and placements carry stable UUIDs so authoring tools can refer to
//! them across edits. Runtime instances and slots use dense arena indices
//! that are only meaningful inside one `InstanceGraph`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an input port on a symbol
pub type InputId = String;

/// Identifier of an output port on a symbol
pub type OutputId = String;

/// Stable identifier of a symbol (template)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub Uuid);

impl SymbolId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a placement, unique within its owning symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChildId(pub Uuid);

impl ChildId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arena index of a live instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl InstanceId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena index of a live slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The value type carried by a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Accepts any type
    Any,
    /// 32-bit float scalar
    Float,
    /// Integer scalar
    Int,
    /// Boolean value
    Bool,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// 4x4 transform matrix
    Matrix,
    /// Text string
    Text,
    /// Ordered list of values
    List,
}

impl ValueType {
    /// Check if a value of this type can feed an input of `target` type.
    ///
    /// The conversion table is closed: exact match, `Any` on either side,
    /// `Int`/`Bool` widening to `Float`, `Bool` to `Int`, a `Float` splatting
    /// into any vector, and any value wrapping into a `List`.
    pub fn is_compatible_with(&self, target: &ValueType) -> bool {
        use ValueType::*;

        if matches!(self, Any) || matches!(target, Any) {
            return true;
        }

        match (self, target) {
            (a, b) if a == b => true,
            (Int, Float) | (Bool, Float) | (Bool, Int) => true,
            (Float, Vec2) | (Float, Vec3) | (Float, Vec4) => true,
            (_, List) => true,
            _ => false,
        }
    }

    /// Number of float components for vector-like types (curve count)
    pub fn component_count(&self) -> usize {
        match self {
            ValueType::Float | ValueType::Int | ValueType::Bool => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
            _ => 0,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Any => "any",
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
            ValueType::Vec4 => "vec4",
            ValueType::Matrix => "matrix",
            ValueType::Text => "text",
            ValueType::List => "list",
        };
        f.write_str(name)
    }
}

/// Category of an operator, used for palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorCategory {
    /// Literal value sources
    Value,
    /// Arithmetic on values
    Math,
    /// Reads from the evaluation context
    Context,
    /// Named-variable channel producers/consumers
    Variable,
    /// Nodes that re-pull subgraphs (repeat, time remap)
    Flow,
    /// Transform participation
    Transform,
    /// Curve and keyframe driven nodes
    Animation,
    /// Values supplied by collaborators (devices, files)
    External,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_compatibility() {
        assert!(ValueType::Any.is_compatible_with(&ValueType::Text));
        assert!(ValueType::Text.is_compatible_with(&ValueType::Any));
        assert!(ValueType::Int.is_compatible_with(&ValueType::Float));
        assert!(ValueType::Float.is_compatible_with(&ValueType::Vec3));
        assert!(ValueType::Vec2.is_compatible_with(&ValueType::List));
        assert!(!ValueType::Float.is_compatible_with(&ValueType::Int));
        assert!(!ValueType::Text.is_compatible_with(&ValueType::Float));
        assert!(!ValueType::Vec3.is_compatible_with(&ValueType::Vec2));
    }

    #[test]
    fn test_component_count() {
        assert_eq!(ValueType::Float.component_count(), 1);
        assert_eq!(ValueType::Vec3.component_count(), 3);
        assert_eq!(ValueType::Text.component_count(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(SymbolId::new(), SymbolId::new());
        assert_ne!(ChildId::new(), ChildId::new());
    }
}
