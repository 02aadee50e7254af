//! Symbol library and authoring operations
//!
//! The library is the explicit registry of every symbol a composition can
//! use. All structural edits go through it and are checked before anything
//! changes: a rejected edit leaves the library untouched and never reaches
//! the live graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::curve::Keyframe;
use crate::error::StructuralError;
use crate::symbol::{Connection, Endpoint, Symbol, SymbolChild};
use crate::types::{ChildId, SymbolId, ValueType};
use crate::validation::{contains_transitively, would_create_feedback};
use crate::value::Value;

type EditResult<T> = std::result::Result<T, StructuralError>;

/// Resolved type information of a connection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortInfo {
    pub value_type: ValueType,
    pub multi_input: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolLibrary {
    symbols: IndexMap<SymbolId, Symbol>,
}

impl SymbolLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a symbol
    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = symbol.id;
        log::debug!("Adding symbol '{}' ({})", symbol.name, id);
        self.symbols.insert(id, symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(&id)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn symbol_mut(&mut self, id: SymbolId) -> EditResult<&mut Symbol> {
        self.symbols
            .get_mut(&id)
            .ok_or(StructuralError::UnknownSymbol(id))
    }

    fn existing(&self, id: SymbolId) -> EditResult<&Symbol> {
        self.symbol(id).ok_or(StructuralError::UnknownSymbol(id))
    }

    /// Symbol placed by `child` inside `parent`
    pub fn child_symbol(&self, parent: SymbolId, child: ChildId) -> EditResult<&Symbol> {
        let placement = self
            .existing(parent)?
            .child(child)
            .ok_or(StructuralError::UnknownChild(child))?;
        self.existing(placement.symbol_id)
    }

    /// Symbols that place `id` as a child
    pub fn parents_of(&self, id: SymbolId) -> Vec<SymbolId> {
        self.symbols
            .values()
            .filter(|s| s.children.iter().any(|c| c.symbol_id == id))
            .map(|s| s.id)
            .collect()
    }

    /// Check whether `container` places `target`, directly or transitively
    pub fn contains_transitively(&self, container: SymbolId, target: SymbolId) -> bool {
        contains_transitively(self, container, target)
    }

    /// Type of a connection source inside `symbol`
    pub fn source_port(&self, symbol: &Symbol, endpoint: &Endpoint) -> Option<PortInfo> {
        match endpoint.child {
            Some(child) => {
                let placed = self.symbol(symbol.child(child)?.symbol_id)?;
                let output = placed.output(&endpoint.port)?;
                Some(PortInfo {
                    value_type: output.value_type,
                    multi_input: false,
                })
            }
            None => {
                let input = symbol.input(&endpoint.port)?;
                let value_type = if input.multi_input {
                    ValueType::List
                } else {
                    input.value_type
                };
                Some(PortInfo {
                    value_type,
                    multi_input: false,
                })
            }
        }
    }

    /// Type of a connection target inside `symbol`
    pub fn target_port(&self, symbol: &Symbol, endpoint: &Endpoint) -> Option<PortInfo> {
        match endpoint.child {
            Some(child) => {
                let placed = self.symbol(symbol.child(child)?.symbol_id)?;
                let input = placed.input(&endpoint.port)?;
                Some(PortInfo {
                    value_type: input.value_type,
                    multi_input: input.multi_input,
                })
            }
            None => {
                let output = symbol.output(&endpoint.port)?;
                Some(PortInfo {
                    value_type: output.value_type,
                    multi_input: false,
                })
            }
        }
    }

    /// Place `child_symbol` inside `parent`.
    ///
    /// Fails with `CyclicContainment` if `child_symbol` already contains
    /// `parent` (or is `parent`).
    pub fn add_child(
        &mut self,
        parent: SymbolId,
        child_symbol: SymbolId,
        name: impl Into<String>,
    ) -> EditResult<ChildId> {
        let parent_def = self.existing(parent)?;
        if !parent_def.is_composite() {
            return Err(StructuralError::NotComposite(parent));
        }
        self.existing(child_symbol)?;
        if self.contains_transitively(child_symbol, parent) {
            return Err(StructuralError::CyclicContainment {
                parent,
                child: child_symbol,
            });
        }

        let placement = SymbolChild::new(child_symbol, name);
        let id = placement.id;
        log::debug!("Placing symbol {} in {} as {}", child_symbol, parent, id);
        self.symbol_mut(parent)?.children.push(placement);
        Ok(id)
    }

    /// Remove a placement together with its connections and curves
    pub fn remove_child(&mut self, parent: SymbolId, child: ChildId) -> EditResult<SymbolChild> {
        let symbol = self.symbol_mut(parent)?;
        let index = symbol
            .children
            .iter()
            .position(|c| c.id == child)
            .ok_or(StructuralError::UnknownChild(child))?;
        let removed = symbol.children.remove(index);
        symbol.connections.retain(|c| !c.touches(child));
        symbol.animator.remove_child(child);
        log::debug!("Removed placement {} from {}", child, parent);
        Ok(removed)
    }

    /// Set a literal override on a placement's input.
    ///
    /// The value is converted to the input's type; returns the stored value.
    pub fn set_input_override(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
        value: Value,
    ) -> EditResult<Value> {
        let definition = self
            .child_symbol(parent, child)?
            .input(input)
            .ok_or_else(|| StructuralError::UnknownInput(input.to_string()))?;
        let target_type = if definition.multi_input {
            ValueType::List
        } else {
            definition.value_type
        };
        let converted = value
            .convert_to(target_type)
            .ok_or(StructuralError::TypeMismatch {
                source_type: value.value_type(),
                target_type,
            })?;

        let placement = self
            .symbol_mut(parent)?
            .child_mut(child)
            .ok_or(StructuralError::UnknownChild(child))?;
        placement
            .input_overrides
            .insert(input.to_string(), converted.clone());
        Ok(converted)
    }

    /// Remove a literal override, returning to the input's default
    pub fn clear_input_override(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
    ) -> EditResult<Option<Value>> {
        let placement = self
            .symbol_mut(parent)?
            .child_mut(child)
            .ok_or(StructuralError::UnknownChild(child))?;
        Ok(placement.input_overrides.shift_remove(input))
    }

    /// Wire `source` to `target` inside `symbol` at `ordinal`.
    ///
    /// Simple inputs accept one connection at ordinal 0. Multi-inputs
    /// accept the next free ordinal; an occupied ordinal is a
    /// `DuplicateOrdinal`, one past the end or further is an
    /// `InvalidOrdinal`.
    pub fn connect(
        &mut self,
        symbol_id: SymbolId,
        source: Endpoint,
        target: Endpoint,
        ordinal: usize,
    ) -> EditResult<usize> {
        let symbol = self.existing(symbol_id)?;
        let source_port = self
            .source_port(symbol, &source)
            .ok_or_else(|| unknown_endpoint(symbol, &source, true))?;
        let target_port = self
            .target_port(symbol, &target)
            .ok_or_else(|| unknown_endpoint(symbol, &target, false))?;

        if !source_port
            .value_type
            .is_compatible_with(&target_port.value_type)
        {
            return Err(StructuralError::TypeMismatch {
                source_type: source_port.value_type,
                target_type: target_port.value_type,
            });
        }

        let existing = symbol.connections_into(&target).len();
        if target_port.multi_input {
            if ordinal < existing {
                return Err(StructuralError::DuplicateOrdinal {
                    input: target.port.clone(),
                    ordinal,
                });
            }
            if ordinal > existing {
                return Err(StructuralError::InvalidOrdinal {
                    input: target.port.clone(),
                    ordinal,
                    len: existing,
                });
            }
        } else {
            if existing > 0 {
                return Err(StructuralError::InputAlreadyConnected(target.port.clone()));
            }
            if ordinal != 0 {
                return Err(StructuralError::InvalidOrdinal {
                    input: target.port.clone(),
                    ordinal,
                    len: 0,
                });
            }
        }

        if let (Some(from), Some(to)) = (source.child, target.child) {
            if would_create_feedback(symbol, from, to) {
                return Err(StructuralError::CyclicConnection {
                    source_port: source.port.clone(),
                    target_port: target.port.clone(),
                });
            }
        }

        log::debug!(
            "Connecting {:?}.{} -> {:?}.{} [{}] in {}",
            source.child,
            source.port,
            target.child,
            target.port,
            ordinal,
            symbol_id
        );
        self.symbol_mut(symbol_id)?
            .connections
            .push(Connection::new(source, target));
        Ok(ordinal)
    }

    /// Remove the connection at `ordinal` into `target`.
    ///
    /// Later connections into the same target shift down by one.
    pub fn disconnect(
        &mut self,
        symbol_id: SymbolId,
        target: &Endpoint,
        ordinal: usize,
    ) -> EditResult<Connection> {
        let symbol = self.symbol_mut(symbol_id)?;
        let positions: Vec<usize> = symbol
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.target == target)
            .map(|(i, _)| i)
            .collect();

        if positions.is_empty() {
            return Err(StructuralError::MissingConnection(target.port.clone()));
        }
        let index = *positions
            .get(ordinal)
            .ok_or_else(|| StructuralError::InvalidOrdinal {
                input: target.port.clone(),
                ordinal,
                len: positions.len(),
            })?;

        log::debug!("Disconnecting {}[{}] in {}", target.port, ordinal, symbol_id);
        Ok(symbol.connections.remove(index))
    }

    /// Connections into `target` inside `symbol`, in ordinal order
    pub fn connections_into(&self, symbol: SymbolId, target: &Endpoint) -> EditResult<Vec<Connection>> {
        Ok(self
            .existing(symbol)?
            .connections_into(target)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Add a key to one component curve of a placement's input
    pub fn add_keyframe(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
        component: usize,
        key: Keyframe,
    ) -> EditResult<()> {
        let definition = self
            .child_symbol(parent, child)?
            .input(input)
            .ok_or_else(|| StructuralError::UnknownInput(input.to_string()))?;
        let component_count = definition.value_type.component_count();
        if component_count == 0 || definition.multi_input {
            return Err(StructuralError::TypeMismatch {
                source_type: ValueType::Float,
                target_type: definition.value_type,
            });
        }
        if component >= component_count {
            return Err(StructuralError::InvalidOrdinal {
                input: input.to_string(),
                ordinal: component,
                len: component_count,
            });
        }

        self.symbol_mut(parent)?
            .animator
            .add_keyframe(child, input, component_count, component, key);
        Ok(())
    }

    /// Remove the key at `time` from one component curve
    pub fn remove_keyframe(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
        component: usize,
        time: f64,
    ) -> EditResult<Keyframe> {
        self.symbol_mut(parent)?
            .animator
            .remove_keyframe(child, input, component, time)
            .ok_or_else(|| StructuralError::MissingKeyframe {
                input: input.to_string(),
                time,
            })
    }
}

fn unknown_endpoint(symbol: &Symbol, endpoint: &Endpoint, is_source: bool) -> StructuralError {
    match endpoint.child {
        Some(child) if symbol.child(child).is_none() => StructuralError::UnknownChild(child),
        Some(_) if is_source => StructuralError::UnknownOutput(endpoint.port.clone()),
        Some(_) => StructuralError::UnknownInput(endpoint.port.clone()),
        None if is_source => StructuralError::UnknownInput(endpoint.port.clone()),
        None => StructuralError::UnknownOutput(endpoint.port.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{InputDefinition, OutputDefinition};

    struct Fixture {
        library: SymbolLibrary,
        scene: SymbolId,
        value: SymbolId,
        add: SymbolId,
    }

    fn fixture() -> Fixture {
        let mut library = SymbolLibrary::new();

        let mut value = Symbol::primitive("Value", "float-value");
        value.inputs.push(InputDefinition::new("value", ValueType::Float));
        value.outputs.push(OutputDefinition::new("result", ValueType::Float));
        let value = library.add_symbol(value);

        let mut add = Symbol::primitive("Add", "add");
        add.inputs
            .push(InputDefinition::new("values", ValueType::Float).multi());
        add.inputs.push(InputDefinition::new("offset", ValueType::Float));
        add.outputs.push(OutputDefinition::new("result", ValueType::Float));
        let add = library.add_symbol(add);

        let mut scene = Symbol::composite("Scene");
        scene.outputs.push(OutputDefinition::new("out", ValueType::Float));
        let scene = library.add_symbol(scene);

        Fixture {
            library,
            scene,
            value,
            add,
        }
    }

    #[test]
    fn test_cyclic_containment_rejected() {
        let mut f = fixture();
        let inner = f.library.add_symbol(Symbol::composite("Inner"));
        f.library.add_child(f.scene, inner, "inner").unwrap();

        assert!(matches!(
            f.library.add_child(inner, f.scene, "scene"),
            Err(StructuralError::CyclicContainment { .. })
        ));
        assert!(matches!(
            f.library.add_child(f.scene, f.scene, "self"),
            Err(StructuralError::CyclicContainment { .. })
        ));
        assert!(f.library.symbol(inner).unwrap().children.is_empty());
    }

    #[test]
    fn test_primitive_cannot_hold_children() {
        let mut f = fixture();
        assert_eq!(
            f.library.add_child(f.add, f.value, "v"),
            Err(StructuralError::NotComposite(f.add))
        );
    }

    #[test]
    fn test_multi_input_ordinals() {
        let mut f = fixture();
        let sum = f.library.add_child(f.scene, f.add, "sum").unwrap();
        let children: Vec<ChildId> = (0..3)
            .map(|i| f.library.add_child(f.scene, f.value, format!("v{i}")).unwrap())
            .collect();
        let target = Endpoint::child(sum, "values");

        for (i, child) in children.iter().enumerate() {
            let ordinal = f
                .library
                .connect(f.scene, Endpoint::child(*child, "result"), target.clone(), i)
                .unwrap();
            assert_eq!(ordinal, i);
        }

        assert!(matches!(
            f.library
                .connect(f.scene, Endpoint::child(children[0], "result"), target.clone(), 1),
            Err(StructuralError::DuplicateOrdinal { ordinal: 1, .. })
        ));
        assert!(matches!(
            f.library
                .connect(f.scene, Endpoint::child(children[0], "result"), target.clone(), 7),
            Err(StructuralError::InvalidOrdinal { ordinal: 7, len: 3, .. })
        ));

        let removed = f.library.disconnect(f.scene, &target, 1).unwrap();
        assert_eq!(removed.source.child, Some(children[1]));

        let sources: Vec<_> = f
            .library
            .connections_into(f.scene, &target)
            .unwrap()
            .into_iter()
            .map(|c| c.source.child)
            .collect();
        assert_eq!(sources, vec![Some(children[0]), Some(children[2])]);
    }

    #[test]
    fn test_simple_input_accepts_one_connection() {
        let mut f = fixture();
        let sum = f.library.add_child(f.scene, f.add, "sum").unwrap();
        let a = f.library.add_child(f.scene, f.value, "a").unwrap();
        let b = f.library.add_child(f.scene, f.value, "b").unwrap();
        let target = Endpoint::child(sum, "offset");

        f.library
            .connect(f.scene, Endpoint::child(a, "result"), target.clone(), 0)
            .unwrap();
        assert_eq!(
            f.library
                .connect(f.scene, Endpoint::child(b, "result"), target, 0),
            Err(StructuralError::InputAlreadyConnected("offset".into()))
        );
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut f = fixture();
        let mut text = Symbol::primitive("Text", "text");
        text.outputs.push(OutputDefinition::new("result", ValueType::Text));
        let text = f.library.add_symbol(text);
        let t = f.library.add_child(f.scene, text, "t").unwrap();
        let v = f.library.add_child(f.scene, f.value, "v").unwrap();

        assert!(matches!(
            f.library.connect(
                f.scene,
                Endpoint::child(t, "result"),
                Endpoint::child(v, "value"),
                0
            ),
            Err(StructuralError::TypeMismatch { .. })
        ));
        assert!(f.library.symbol(f.scene).unwrap().connections.is_empty());
    }

    #[test]
    fn test_feedback_connection_rejected() {
        let mut f = fixture();
        let a = f.library.add_child(f.scene, f.add, "a").unwrap();
        let b = f.library.add_child(f.scene, f.add, "b").unwrap();
        f.library
            .connect(f.scene, Endpoint::child(a, "result"), Endpoint::child(b, "offset"), 0)
            .unwrap();
        assert!(matches!(
            f.library.connect(
                f.scene,
                Endpoint::child(b, "result"),
                Endpoint::child(a, "offset"),
                0
            ),
            Err(StructuralError::CyclicConnection { .. })
        ));
    }

    #[test]
    fn test_remove_child_drops_connections_and_curves() {
        let mut f = fixture();
        let v = f.library.add_child(f.scene, f.value, "v").unwrap();
        f.library
            .connect(f.scene, Endpoint::child(v, "result"), Endpoint::boundary("out"), 0)
            .unwrap();
        f.library
            .add_keyframe(f.scene, v, "value", 0, Keyframe::linear(0.0, 1.0))
            .unwrap();

        f.library.remove_child(f.scene, v).unwrap();
        let scene = f.library.symbol(f.scene).unwrap();
        assert!(scene.connections.is_empty());
        assert!(scene.animator.is_empty());
    }

    #[test]
    fn test_input_override_converts() {
        let mut f = fixture();
        let v = f.library.add_child(f.scene, f.value, "v").unwrap();
        let stored = f
            .library
            .set_input_override(f.scene, v, "value", Value::Int(4))
            .unwrap();
        assert_eq!(stored, Value::Float(4.0));
        assert!(matches!(
            f.library
                .set_input_override(f.scene, v, "value", Value::Text("x".into())),
            Err(StructuralError::TypeMismatch { .. })
        ));
        assert!(matches!(
            f.library
                .set_input_override(f.scene, v, "nope", Value::Float(1.0)),
            Err(StructuralError::UnknownInput(_))
        ));
    }

    #[test]
    fn test_keyframe_component_range() {
        let mut f = fixture();
        let v = f.library.add_child(f.scene, f.value, "v").unwrap();
        assert!(matches!(
            f.library
                .add_keyframe(f.scene, v, "value", 1, Keyframe::linear(0.0, 1.0)),
            Err(StructuralError::InvalidOrdinal { .. })
        ));
        assert!(matches!(
            f.library.remove_keyframe(f.scene, v, "value", 0, 0.0),
            Err(StructuralError::MissingKeyframe { .. })
        ));
    }
}
