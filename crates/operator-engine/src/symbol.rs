//! Symbol (template) definitions
//!
//! A symbol is either primitive, backed by a registered operator, or
//! composite, holding child placements wired together by connections. Both
//! kinds expose the same boundary of input and output definitions, so a
//! composite can be placed anywhere a primitive can.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::animator::Animator;
use crate::dirty::TriggerPolicy;
use crate::types::{ChildId, InputId, OutputId, SymbolId, ValueType};
use crate::value::Value;

/// An exposed input of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
    pub id: InputId,
    pub name: String,
    pub value_type: ValueType,
    /// Literal used when neither a connection nor an override exists
    pub default_value: Value,
    /// Accepts an ordered list of connections
    #[serde(default)]
    pub multi_input: bool,
}

impl InputDefinition {
    pub fn new(id: impl Into<String>, value_type: ValueType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            value_type,
            default_value: Value::default_for(value_type),
            multi_input: false,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi_input = true;
        self.default_value = Value::List(Vec::new());
        self
    }
}

/// An exposed output of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
    pub id: OutputId,
    pub name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub trigger: TriggerPolicy,
}

impl OutputDefinition {
    pub fn new(id: impl Into<String>, value_type: ValueType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            value_type,
            trigger: TriggerPolicy::default(),
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerPolicy) -> Self {
        self.trigger = trigger;
        self
    }
}

/// One placement of a symbol inside a composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolChild {
    pub id: ChildId,
    pub symbol_id: SymbolId,
    pub name: String,
    /// Literal overrides for the placed symbol's inputs
    #[serde(default)]
    pub input_overrides: IndexMap<InputId, Value>,
}

impl SymbolChild {
    pub fn new(symbol_id: SymbolId, name: impl Into<String>) -> Self {
        Self {
            id: ChildId::new(),
            symbol_id,
            name: name.into(),
            input_overrides: IndexMap::new(),
        }
    }
}

/// One end of a connection. `child == None` is the owning symbol's boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub child: Option<ChildId>,
    pub port: String,
}

impl Endpoint {
    /// A port on a child placement
    pub fn child(child: ChildId, port: impl Into<String>) -> Self {
        Self {
            child: Some(child),
            port: port.into(),
        }
    }

    /// A port on the owning symbol's own boundary
    pub fn boundary(port: impl Into<String>) -> Self {
        Self {
            child: None,
            port: port.into(),
        }
    }
}

/// A wire inside a composite symbol.
///
/// Sources are child outputs or the symbol's own inputs; targets are child
/// inputs or the symbol's own outputs. The ordinal of a connection is its
/// position among the connections sharing its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub target: Endpoint,
}

impl Connection {
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self { source, target }
    }

    pub fn touches(&self, child: ChildId) -> bool {
        self.source.child == Some(child) || self.target.child == Some(child)
    }
}

/// A reusable graph template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    /// Registered operator type for primitive symbols
    #[serde(default)]
    pub operator_type: Option<String>,
    pub inputs: Vec<InputDefinition>,
    pub outputs: Vec<OutputDefinition>,
    #[serde(default)]
    pub children: Vec<SymbolChild>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub animator: Animator,
}

impl Symbol {
    /// An empty composite symbol
    pub fn composite(name: impl Into<String>) -> Self {
        Self {
            id: SymbolId::new(),
            name: name.into(),
            operator_type: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            children: Vec::new(),
            connections: Vec::new(),
            animator: Animator::new(),
        }
    }

    /// A primitive symbol backed by `operator_type`
    pub fn primitive(name: impl Into<String>, operator_type: impl Into<String>) -> Self {
        Self {
            operator_type: Some(operator_type.into()),
            ..Self::composite(name)
        }
    }

    pub fn is_composite(&self) -> bool {
        self.operator_type.is_none()
    }

    pub fn input(&self, id: &str) -> Option<&InputDefinition> {
        self.inputs.iter().find(|i| i.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&OutputDefinition> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub fn child(&self, id: ChildId) -> Option<&SymbolChild> {
        self.children.iter().find(|c| c.id == id)
    }

    pub fn child_mut(&mut self, id: ChildId) -> Option<&mut SymbolChild> {
        self.children.iter_mut().find(|c| c.id == id)
    }

    /// Connections into `target`, in ordinal order
    pub fn connections_into(&self, target: &Endpoint) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| &c.target == target)
            .collect()
    }

    /// Connections leaving `source`
    pub fn connections_from(&self, source: &Endpoint) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| &c.source == source)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_vs_composite() {
        let primitive = Symbol::primitive("Add", "add");
        assert!(!primitive.is_composite());
        assert!(Symbol::composite("Scene").is_composite());
    }

    #[test]
    fn test_connections_into_keeps_order() {
        let mut symbol = Symbol::composite("s");
        let (a, b, sink) = (ChildId::new(), ChildId::new(), ChildId::new());
        let target = Endpoint::child(sink, "values");
        symbol
            .connections
            .push(Connection::new(Endpoint::child(b, "out"), target.clone()));
        symbol
            .connections
            .push(Connection::new(Endpoint::child(a, "out"), Endpoint::boundary("result")));
        symbol
            .connections
            .push(Connection::new(Endpoint::child(a, "out"), target.clone()));

        let sources: Vec<_> = symbol
            .connections_into(&target)
            .iter()
            .map(|c| c.source.child)
            .collect();
        assert_eq!(sources, vec![Some(b), Some(a)]);
        assert_eq!(symbol.connections_from(&Endpoint::child(a, "out")).len(), 2);
    }

    #[test]
    fn test_multi_input_default_is_empty_list() {
        let input = InputDefinition::new("values", ValueType::Float).multi();
        assert!(input.multi_input);
        assert_eq!(input.default_value, Value::List(Vec::new()));
    }
}
