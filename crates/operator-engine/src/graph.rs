//! Live instance graph
//!
//! Instantiating a symbol realizes its whole placement tree as a flat arena
//! of [`Instance`]s and [`SlotCell`]s addressed by dense ids. Structural
//! edits made in the [`SymbolLibrary`] are mirrored here by the engine,
//! one target slot at a time, so unrelated cached values survive an edit.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{EngineError, Result, StructuralError};
use crate::library::SymbolLibrary;
use crate::operator::{NodeStatus, Operator};
use crate::registry::OperatorRegistry;
use crate::slot::{SlotCell, SlotSource};
use crate::symbol::{Endpoint, SymbolChild};
use crate::types::{ChildId, InputId, InstanceId, OutputId, SlotId, SymbolId};
use crate::value::Value;

/// Runtime realization of one placement
pub struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) symbol_id: SymbolId,
    /// Placement this instance realizes; `None` for roots
    pub(crate) child_id: Option<ChildId>,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: IndexMap<ChildId, InstanceId>,
    pub(crate) inputs: IndexMap<InputId, SlotId>,
    pub(crate) outputs: IndexMap<OutputId, SlotId>,
    /// Taken out while the operator computes
    pub(crate) operator: Option<Box<dyn Operator>>,
    pub(crate) operator_type: Option<String>,
    pub(crate) status: NodeStatus,
}

impl Instance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn symbol_id(&self) -> SymbolId {
        self.symbol_id
    }

    pub fn child_id(&self) -> Option<ChildId> {
        self.child_id
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &IndexMap<ChildId, InstanceId> {
        &self.children
    }

    pub fn inputs(&self) -> &IndexMap<InputId, SlotId> {
        &self.inputs
    }

    pub fn outputs(&self) -> &IndexMap<OutputId, SlotId> {
        &self.outputs
    }

    pub fn operator_type(&self) -> Option<&str> {
        self.operator_type.as_deref()
    }

    pub fn operator(&self) -> Option<&dyn Operator> {
        self.operator.as_deref()
    }

    /// Status recorded by the engine from the last compute
    pub fn status(&self) -> &NodeStatus {
        &self.status
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("symbol_id", &self.symbol_id)
            .field("child_id", &self.child_id)
            .field("parent", &self.parent)
            .field("operator_type", &self.operator_type)
            .field("status", &self.status)
            .finish()
    }
}

/// Arena of live instances and slots.
///
/// Destroyed entries leave a tombstone whose index is reused by the next
/// allocation, so ids of destroyed instances and slots may come back.
#[derive(Default)]
pub struct InstanceGraph {
    instances: Vec<Option<Instance>>,
    slots: Vec<Option<SlotCell>>,
    roots: Vec<InstanceId>,
    free_instances: Vec<InstanceId>,
    free_slots: Vec<SlotId>,
}

impl InstanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn slot(&self, id: SlotId) -> Option<&SlotCell> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Option<&mut SlotCell> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Root instances in creation order
    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().flatten()
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &SlotCell)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SlotId(i as u32), s)))
    }

    /// Every live instance of `symbol`, wherever it is placed
    pub fn instances_of(&self, symbol: SymbolId) -> Vec<InstanceId> {
        self.instances()
            .filter(|i| i.symbol_id == symbol)
            .map(|i| i.id)
            .collect()
    }

    pub fn slot_of_input(&self, instance: InstanceId, input: &str) -> Option<SlotId> {
        self.instance(instance)?.inputs.get(input).copied()
    }

    pub fn slot_of_output(&self, instance: InstanceId, output: &str) -> Option<SlotId> {
        self.instance(instance)?.outputs.get(output).copied()
    }

    pub fn child_instance(&self, instance: InstanceId, child: ChildId) -> Option<InstanceId> {
        self.instance(instance)?.children.get(&child).copied()
    }

    /// Number of live instances
    pub fn instance_count(&self) -> usize {
        self.instances().count()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn dirty_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.dirty.needs_update())
            .count()
    }

    /// Instantiate `symbol` as a new root composition
    pub fn instantiate(
        &mut self,
        library: &SymbolLibrary,
        registry: &OperatorRegistry,
        symbol: SymbolId,
    ) -> Result<InstanceId> {
        check_instantiable(library, registry, symbol)?;
        let id = self.build(library, registry, symbol, None, None)?;
        self.roots.push(id);
        log::info!("Instantiated root {:?} for symbol {}", id, symbol);
        Ok(id)
    }

    /// Realize a new placement inside an existing composite instance.
    ///
    /// The new child is unconnected; the caller rewires any targets.
    pub(crate) fn instantiate_child(
        &mut self,
        library: &SymbolLibrary,
        registry: &OperatorRegistry,
        parent: InstanceId,
        placement: &SymbolChild,
    ) -> Result<InstanceId> {
        check_instantiable(library, registry, placement.symbol_id)?;
        let id = self.build(library, registry, placement.symbol_id, Some(parent), Some(placement))?;
        self.instance_mut(parent)
            .ok_or(EngineError::UnknownInstance(parent))?
            .children
            .insert(placement.id, id);
        Ok(id)
    }

    fn alloc_slot(&mut self, cell: SlotCell) -> SlotId {
        if let Some(id) = self.free_slots.pop() {
            self.slots[id.index()] = Some(cell);
            return id;
        }
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Some(cell));
        id
    }

    /// Reserve an instance index before its children are built
    fn alloc_instance(&mut self) -> InstanceId {
        if let Some(id) = self.free_instances.pop() {
            return id;
        }
        self.instances.push(None);
        InstanceId(self.instances.len() as u32 - 1)
    }

    fn build(
        &mut self,
        library: &SymbolLibrary,
        registry: &OperatorRegistry,
        symbol_id: SymbolId,
        parent: Option<InstanceId>,
        placement: Option<&SymbolChild>,
    ) -> Result<InstanceId> {
        let symbol = library
            .symbol(symbol_id)
            .ok_or(EngineError::UnknownSymbol(symbol_id))?;
        let id = self.alloc_instance();

        let operator = match &symbol.operator_type {
            Some(operator_type) => Some(
                registry
                    .create(operator_type)
                    .ok_or_else(|| StructuralError::UnknownOperator(operator_type.clone()))?,
            ),
            None => None,
        };

        let animator = parent
            .and_then(|p| self.instance(p))
            .and_then(|p| library.symbol(p.symbol_id))
            .map(|s| &s.animator);

        let mut inputs = IndexMap::new();
        for def in &symbol.inputs {
            let literal = placement
                .and_then(|p| p.input_overrides.get(&def.id))
                .cloned()
                .unwrap_or_else(|| def.default_value.clone());
            let mut cell = SlotCell::input(id, &def.id, def.value_type, def.multi_input, literal);
            if let (Some(animator), Some(placement)) = (animator, placement) {
                cell.animated = animator.is_animated(placement.id, &def.id);
            }
            inputs.insert(def.id.clone(), self.alloc_slot(cell));
        }

        let mut outputs = IndexMap::new();
        for def in &symbol.outputs {
            let cell = if symbol.is_composite() {
                SlotCell::output(id, &def.id, def.value_type, def.trigger, SlotSource::Literal)
            } else {
                SlotCell::output(
                    id,
                    &def.id,
                    def.value_type,
                    def.trigger,
                    SlotSource::Operator {
                        output: def.id.clone(),
                    },
                )
            };
            outputs.insert(def.id.clone(), self.alloc_slot(cell));
        }

        if !symbol.is_composite() {
            let output_slots: Vec<SlotId> = outputs.values().copied().collect();
            for input in inputs.values() {
                if let Some(cell) = self.slot_mut(*input) {
                    cell.targets.extend(output_slots.iter().copied());
                }
            }
        }

        self.instances[id.index()] = Some(Instance {
            id,
            symbol_id,
            child_id: placement.map(|p| p.id),
            parent,
            children: IndexMap::new(),
            inputs,
            outputs,
            operator,
            operator_type: symbol.operator_type.clone(),
            status: NodeStatus::Ok,
        });

        if symbol.is_composite() {
            for child in &symbol.children {
                let child_instance = self.build(library, registry, child.symbol_id, Some(id), Some(child))?;
                if let Some(instance) = self.instance_mut(id) {
                    instance.children.insert(child.id, child_instance);
                }
            }
            self.wire_all(library, id)?;
        }

        log::debug!("Built instance {:?} of symbol '{}'", id, symbol.name);
        Ok(id)
    }

    fn wire_all(&mut self, library: &SymbolLibrary, instance: InstanceId) -> Result<()> {
        let symbol_id = self
            .instance(instance)
            .ok_or(EngineError::UnknownInstance(instance))?
            .symbol_id;
        let symbol = library
            .symbol(symbol_id)
            .ok_or(EngineError::UnknownSymbol(symbol_id))?;

        let mut targets: Vec<&Endpoint> = Vec::new();
        for connection in &symbol.connections {
            if !targets.contains(&&connection.target) {
                targets.push(&connection.target);
            }
        }
        for target in targets {
            self.rewire_input(library, instance, target)?;
        }
        Ok(())
    }

    /// Recompute the source of one connection target inside a composite
    /// instance from its symbol's current connections, then invalidate it.
    ///
    /// Returns the number of slots dirtied.
    pub fn rewire_input(
        &mut self,
        library: &SymbolLibrary,
        instance: InstanceId,
        target: &Endpoint,
    ) -> Result<usize> {
        let inst = self
            .instance(instance)
            .ok_or(EngineError::UnknownInstance(instance))?;
        let symbol = library
            .symbol(inst.symbol_id)
            .ok_or(EngineError::UnknownSymbol(inst.symbol_id))?;

        let target_slot = match target.child {
            Some(child) => {
                let child_instance = inst
                    .children
                    .get(&child)
                    .ok_or(StructuralError::UnknownChild(child))?;
                self.slot_of_input(*child_instance, &target.port)
                    .ok_or_else(|| StructuralError::UnknownInput(target.port.clone()))?
            }
            None => inst
                .outputs
                .get(&target.port)
                .copied()
                .ok_or_else(|| StructuralError::UnknownOutput(target.port.clone()))?,
        };

        let mut sources = Vec::new();
        for connection in symbol.connections_into(target) {
            let source_slot = match connection.source.child {
                Some(child) => inst
                    .children
                    .get(&child)
                    .and_then(|c| self.slot_of_output(*c, &connection.source.port)),
                None => inst.inputs.get(&connection.source.port).copied(),
            };
            match source_slot {
                Some(slot) => sources.push(slot),
                None => log::warn!(
                    "Skipping connection from unknown port '{}' in symbol '{}'",
                    connection.source.port,
                    symbol.name
                ),
            }
        }

        let multi_input = self.slot(target_slot).is_some_and(|s| s.multi_input);
        let source = match (target.child, sources.as_slice()) {
            (_, []) => SlotSource::Literal,
            (None, [first, ..]) => SlotSource::PassThrough(*first),
            (Some(_), _) if multi_input => SlotSource::MultiInput(sources),
            (Some(_), [first, ..]) => SlotSource::Connection(*first),
        };

        self.set_source(target_slot, source);
        Ok(self.invalidate(target_slot))
    }

    fn set_source(&mut self, slot: SlotId, source: SlotSource) {
        let Some(cell) = self.slot(slot) else {
            return;
        };
        let old_upstream = cell.source.upstream();
        let new_upstream = source.upstream();

        for upstream in old_upstream {
            if let Some(up) = self.slot_mut(upstream) {
                up.targets.retain(|t| *t != slot);
            }
        }
        for upstream in new_upstream {
            if let Some(up) = self.slot_mut(upstream) {
                if !up.targets.contains(&slot) {
                    up.targets.push(slot);
                }
            }
        }
        if let Some(cell) = self.slot_mut(slot) {
            if source == SlotSource::Literal {
                cell.value = cell.literal.clone();
            }
            cell.source = source;
        }
    }

    /// Remove an instance and its whole subtree.
    ///
    /// Slots that read from the destroyed outputs fall back to their
    /// literals and are invalidated.
    pub fn destroy(&mut self, instance: InstanceId) -> Result<()> {
        let inst = self
            .instances
            .get_mut(instance.index())
            .and_then(Option::take)
            .ok_or(EngineError::UnknownInstance(instance))?;

        for child in inst.children.values() {
            self.destroy(*child)?;
        }
        for slot in inst.inputs.values().chain(inst.outputs.values()) {
            self.remove_slot(*slot);
        }
        if let Some(parent) = inst.parent.and_then(|p| self.instance_mut(p)) {
            parent.children.retain(|_, c| *c != instance);
        }
        self.roots.retain(|r| *r != instance);
        self.free_instances.push(instance);
        log::debug!("Destroyed instance {:?}", instance);
        Ok(())
    }

    fn remove_slot(&mut self, slot: SlotId) {
        let Some(cell) = self.slots.get_mut(slot.index()).and_then(Option::take) else {
            return;
        };
        self.free_slots.push(slot);
        for upstream in cell.source.upstream() {
            if let Some(up) = self.slot_mut(upstream) {
                up.targets.retain(|t| *t != slot);
            }
        }
        for target in cell.targets {
            let Some(consumer) = self.slot(target) else {
                continue;
            };
            let source = match &consumer.source {
                SlotSource::Connection(s) | SlotSource::PassThrough(s) if *s == slot => {
                    SlotSource::Literal
                }
                SlotSource::MultiInput(ids) if ids.contains(&slot) => {
                    let rest: Vec<SlotId> = ids.iter().copied().filter(|s| *s != slot).collect();
                    if rest.is_empty() {
                        SlotSource::Literal
                    } else {
                        SlotSource::MultiInput(rest)
                    }
                }
                _ => continue,
            };
            self.set_source(target, source);
            self.invalidate(target);
        }
    }

    /// Mark a slot dirty regardless of its policy and propagate downstream.
    ///
    /// Returns the number of slots dirtied, including `slot`.
    pub fn invalidate(&mut self, slot: SlotId) -> usize {
        let Some(cell) = self.slot_mut(slot) else {
            return 0;
        };
        cell.dirty.invalidate();
        cell.dirty.reset_last_time();
        1 + self.mark_downstream_dirty(slot)
    }

    /// Mark every output of an instance dirty
    pub fn invalidate_instance(&mut self, instance: InstanceId) -> usize {
        let outputs: Vec<SlotId> = self
            .instance(instance)
            .map(|i| i.outputs.values().copied().collect())
            .unwrap_or_default();
        outputs.into_iter().map(|s| self.invalidate(s)).sum()
    }

    /// Transitively dirty every slot reading from `slot`.
    ///
    /// Each slot is visited at most once per pass, whatever its policy.
    pub fn mark_downstream_dirty(&mut self, slot: SlotId) -> usize {
        let mut visited = HashSet::new();
        visited.insert(slot);
        self.propagate_from(slot, &mut visited)
    }

    fn propagate_from(&mut self, start: SlotId, visited: &mut HashSet<SlotId>) -> usize {
        let mut stack: Vec<SlotId> = self
            .slot(start)
            .map(|s| s.targets.clone())
            .unwrap_or_default();
        let mut dirtied = 0;

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(cell) = self.slot_mut(current) else {
                continue;
            };
            cell.dirty.invalidate();
            dirtied += 1;
            stack.extend(cell.targets.iter().copied());
        }
        dirtied
    }

    /// Start a frame: everything downstream of a volatile slot (animated or
    /// recomputed per pull) becomes dirty once.
    ///
    /// Animated slots themselves keep their flag; they resample whenever
    /// the local time moves.
    pub(crate) fn begin_frame(&mut self) -> usize {
        let volatile: Vec<SlotId> = self
            .slots()
            .filter(|(_, s)| s.is_volatile())
            .map(|(id, _)| id)
            .collect();

        let mut visited = HashSet::new();
        let mut dirtied = 0;
        for slot in volatile {
            visited.insert(slot);
            dirtied += self.propagate_from(slot, &mut visited);
        }
        dirtied
    }

    /// Write a literal into an input slot (leaf injection) and invalidate it.
    ///
    /// Connected inputs keep reading their connection. Returns whether the
    /// visible value changed.
    pub fn set_literal(&mut self, slot: SlotId, value: Value) -> Result<bool> {
        let cell = self.slot_mut(slot).ok_or(EngineError::UnknownSlot(slot))?;
        let value = cell.coerce(value);
        cell.literal = value.clone();
        let changed = if cell.source == SlotSource::Literal && !cell.animated {
            cell.store(value)
        } else {
            false
        };
        self.invalidate(slot);
        Ok(changed)
    }

    /// Re-read the animation binding of one placement input
    pub(crate) fn refresh_animation(
        &mut self,
        library: &SymbolLibrary,
        instance: InstanceId,
        input: &str,
    ) -> Result<()> {
        let inst = self
            .instance(instance)
            .ok_or(EngineError::UnknownInstance(instance))?;
        let animated = match (inst.parent.and_then(|p| self.instance(p)), inst.child_id) {
            (Some(parent), Some(child)) => library
                .symbol(parent.symbol_id)
                .is_some_and(|s| s.animator.is_animated(child, input)),
            _ => false,
        };
        let slot = inst
            .inputs
            .get(input)
            .copied()
            .ok_or_else(|| StructuralError::UnknownInput(input.to_string()))?;

        if let Some(cell) = self.slot_mut(slot) {
            if cell.animated && !animated && cell.source == SlotSource::Literal {
                cell.value = cell.literal.clone();
            }
            cell.animated = animated;
        }
        self.invalidate(slot);
        Ok(())
    }

    /// Drop every instance
    pub fn clear(&mut self) {
        self.instances.clear();
        self.slots.clear();
        self.roots.clear();
        self.free_instances.clear();
        self.free_slots.clear();
    }
}

/// Fail early if any primitive reachable from `symbol` has no operator
pub(crate) fn check_instantiable(
    library: &SymbolLibrary,
    registry: &OperatorRegistry,
    symbol: SymbolId,
) -> std::result::Result<(), StructuralError> {
    let mut visited = HashSet::new();
    let mut stack = vec![symbol];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        let def = library
            .symbol(current)
            .ok_or(StructuralError::UnknownSymbol(current))?;
        if let Some(operator_type) = &def.operator_type {
            if !registry.has_operator_type(operator_type) {
                return Err(StructuralError::UnknownOperator(operator_type.clone()));
            }
        }
        stack.extend(def.children.iter().map(|c| c.symbol_id));
    }
    Ok(())
}
