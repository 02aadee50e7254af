//! Fluent builder for symbols
//!
//! Lets hosts and tests declare a composite by child names instead of
//! juggling placement ids.

use indexmap::IndexMap;

use crate::error::StructuralError;
use crate::library::SymbolLibrary;
use crate::symbol::{Endpoint, InputDefinition, OutputDefinition, Symbol};
use crate::types::{ChildId, SymbolId};
use crate::value::Value;

/// Port reference by child name; `None` is the symbol's boundary
type NamedEndpoint = (Option<String>, String);

struct PendingChild {
    name: String,
    symbol_id: SymbolId,
    overrides: IndexMap<String, Value>,
}

/// Fluent builder for constructing symbols
///
/// # Example
///
/// ```ignore
/// let built = SymbolBuilder::composite("Scene")
///     .output(OutputDefinition::new("out", ValueType::Float))
///     .child("a", float_value)
///     .with_override("value", 2.0f32)
///     .child("sum", add)
///     .connect(("a", "result"), ("sum", "values"))
///     .connect_output(("sum", "result"), "out")
///     .register(&mut library)?;
/// let sum = built.child("sum");
/// ```
pub struct SymbolBuilder {
    symbol: Symbol,
    children: Vec<PendingChild>,
    connections: Vec<(NamedEndpoint, NamedEndpoint)>,
}

/// Result of registering a builder
#[derive(Debug, Clone)]
pub struct BuiltSymbol {
    pub id: SymbolId,
    /// Placement ids by the names given to the builder
    pub children: IndexMap<String, ChildId>,
}

impl BuiltSymbol {
    pub fn child(&self, name: &str) -> Option<ChildId> {
        self.children.get(name).copied()
    }
}

impl SymbolBuilder {
    pub fn composite(name: impl Into<String>) -> Self {
        Self::from_symbol(Symbol::composite(name))
    }

    pub fn primitive(name: impl Into<String>, operator_type: impl Into<String>) -> Self {
        Self::from_symbol(Symbol::primitive(name, operator_type))
    }

    fn from_symbol(symbol: Symbol) -> Self {
        Self {
            symbol,
            children: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn input(mut self, input: InputDefinition) -> Self {
        self.symbol.inputs.push(input);
        self
    }

    pub fn output(mut self, output: OutputDefinition) -> Self {
        self.symbol.outputs.push(output);
        self
    }

    /// Place `symbol_id` under `name`
    pub fn child(mut self, name: impl Into<String>, symbol_id: SymbolId) -> Self {
        self.children.push(PendingChild {
            name: name.into(),
            symbol_id,
            overrides: IndexMap::new(),
        });
        self
    }

    /// Override an input of the most recently placed child
    ///
    /// Must be called after `child`.
    pub fn with_override(mut self, input: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(child) = self.children.last_mut() {
            child.overrides.insert(input.into(), value.into());
        }
        self
    }

    /// Wire a child output to a child input. Multi-inputs take the next
    /// ordinal in call order.
    pub fn connect(mut self, source: (&str, &str), target: (&str, &str)) -> Self {
        self.connections.push((named(Some(source.0), source.1), named(Some(target.0), target.1)));
        self
    }

    /// Wire one of the symbol's own inputs to a child input
    pub fn connect_input(mut self, input: &str, target: (&str, &str)) -> Self {
        self.connections
            .push((named(None, input), named(Some(target.0), target.1)));
        self
    }

    /// Expose a child output as one of the symbol's own outputs
    pub fn connect_output(mut self, source: (&str, &str), output: &str) -> Self {
        self.connections
            .push((named(Some(source.0), source.1), named(None, output)));
        self
    }

    /// Add the symbol to `library`, validating every placement and
    /// connection. On error the library is left untouched.
    pub fn register(self, library: &mut SymbolLibrary) -> Result<BuiltSymbol, StructuralError> {
        let mut staged = library.clone();
        let mut shell = self.symbol;
        shell.children.clear();
        shell.connections.clear();
        let id = staged.add_symbol(shell);

        let mut children = IndexMap::new();
        for pending in self.children {
            let child = staged.add_child(id, pending.symbol_id, pending.name.clone())?;
            for (input, value) in pending.overrides {
                staged.set_input_override(id, child, &input, value)?;
            }
            children.insert(pending.name, child);
        }

        for (source, target) in self.connections {
            let source = resolve(&children, source)?;
            let target = resolve(&children, target)?;
            let ordinal = staged.connections_into(id, &target)?.len();
            staged.connect(id, source, target, ordinal)?;
        }

        *library = staged;
        log::debug!("Registered symbol {} with {} children", id, children.len());
        Ok(BuiltSymbol { id, children })
    }
}

fn named(child: Option<&str>, port: &str) -> NamedEndpoint {
    (child.map(str::to_string), port.to_string())
}

fn resolve(
    children: &IndexMap<String, ChildId>,
    (child, port): NamedEndpoint,
) -> Result<Endpoint, StructuralError> {
    match child {
        Some(name) => children
            .get(&name)
            .map(|id| Endpoint::child(*id, port))
            .ok_or(StructuralError::UnknownChildName(name)),
        None => Ok(Endpoint::boundary(port)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirty::TriggerPolicy;
    use crate::testing::float_symbol;
    use crate::types::ValueType;

    #[test]
    fn test_register_composite() {
        let mut library = SymbolLibrary::new();
        let leaf = library.add_symbol(float_symbol(TriggerPolicy::ExplicitInvalidate));

        let built = SymbolBuilder::composite("scene")
            .input(InputDefinition::new("x", ValueType::Float))
            .output(OutputDefinition::new("out", ValueType::Float))
            .child("a", leaf)
            .with_override("value", 2.0f32)
            .child("b", leaf)
            .connect_input("x", ("a", "value"))
            .connect(("a", "result"), ("b", "value"))
            .connect_output(("b", "result"), "out")
            .register(&mut library)
            .unwrap();

        let symbol = library.symbol(built.id).unwrap();
        assert_eq!(symbol.children.len(), 2);
        assert_eq!(symbol.connections.len(), 3);
        let a = symbol.child(built.child("a").unwrap()).unwrap();
        assert_eq!(a.input_overrides.get("value"), Some(&Value::Float(2.0)));
    }

    #[test]
    fn test_register_is_atomic() {
        let mut library = SymbolLibrary::new();
        let leaf = library.add_symbol(float_symbol(TriggerPolicy::ExplicitInvalidate));

        let result = SymbolBuilder::composite("broken")
            .child("a", leaf)
            .connect(("a", "result"), ("missing", "value"))
            .register(&mut library);

        assert_eq!(
            result.unwrap_err(),
            StructuralError::UnknownChildName("missing".into())
        );
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_register_rejects_type_mismatch() {
        let mut library = SymbolLibrary::new();
        let leaf = library.add_symbol(float_symbol(TriggerPolicy::ExplicitInvalidate));

        let result = SymbolBuilder::composite("scene")
            .output(OutputDefinition::new("label", ValueType::Text))
            .child("a", leaf)
            .connect_output(("a", "result"), "label")
            .register(&mut library);

        assert!(matches!(result, Err(StructuralError::TypeMismatch { .. })));
    }
}
