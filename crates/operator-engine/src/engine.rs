//! Engine facade
//!
//! `Engine` owns the symbol library, the operator registry, the live
//! instance graph and the host-supplied collaborators (extensions and
//! event sink). Hosts drive it with one `evaluate` call per frame, inject
//! leaf values with `set_literal`, and apply authoring edits through the
//! methods below, each of which updates the library first and then patches
//! every live instance of the edited symbol.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::new(library, OperatorRegistry::with_builtins());
//! let root = engine.instantiate(scene)?;
//! let out = engine.graph().slot_of_output(root, "out").unwrap();
//!
//! let mut ctx = EvaluationContext::at_time(1.5);
//! let value = engine.evaluate(out, &mut ctx)?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::curve::{Curve, Keyframe};
use crate::error::{EngineError, Result, StructuralError};
use crate::evaluator::Evaluator;
use crate::events::{EngineEvent, EventSink, NullEventSink};
use crate::extensions::Extensions;
use crate::graph::{check_instantiable, InstanceGraph};
use crate::library::SymbolLibrary;
use crate::operator::NodeStatus;
use crate::port_options::{PortOptionsQuery, PortOptionsResult};
use crate::registry::OperatorRegistry;
use crate::builder::{BuiltSymbol, SymbolBuilder};
use crate::symbol::{Connection, Endpoint, Symbol, SymbolChild};
use crate::types::{ChildId, InstanceId, SlotId, SymbolId};
use crate::undo::UndoStack;
use crate::value::Value;

type EditResult<T> = std::result::Result<T, StructuralError>;

/// Snapshot of the live graph's cache state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub instances: usize,
    pub slots: usize,
    /// Slots whose next pull recomputes
    pub dirty_slots: usize,
    /// Sum of recomputes over all live slots
    pub total_recomputes: u64,
    pub failed_nodes: usize,
}

/// Operator graph engine
pub struct Engine {
    config: EngineConfig,
    library: SymbolLibrary,
    registry: OperatorRegistry,
    graph: InstanceGraph,
    extensions: Extensions,
    events: Arc<dyn EventSink>,
    undo: UndoStack,
    /// Symbols instantiated as roots, in order
    root_symbols: Vec<SymbolId>,
}

impl Engine {
    pub fn new(library: SymbolLibrary, registry: OperatorRegistry) -> Self {
        Self::with_config(library, registry, EngineConfig::default())
    }

    pub fn with_config(
        library: SymbolLibrary,
        registry: OperatorRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            undo: UndoStack::new(config.undo_depth),
            config,
            library,
            registry,
            graph: InstanceGraph::new(),
            extensions: Extensions::new(),
            events: Arc::new(NullEventSink),
            root_symbols: Vec::new(),
        }
    }

    /// Route engine events to `sink`
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn library(&self) -> &SymbolLibrary {
        &self.library
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &InstanceGraph {
        &self.graph
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access for hosts registering runtime objects
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Root instances in instantiation order
    pub fn roots(&self) -> &[InstanceId] {
        self.graph.roots()
    }

    /// Instantiate `symbol` as a new root composition
    pub fn instantiate(&mut self, symbol: SymbolId) -> Result<InstanceId> {
        let root = self.graph.instantiate(&self.library, &self.registry, symbol)?;
        self.root_symbols.push(symbol);
        Ok(root)
    }

    // --- Frame tick ---

    /// Evaluate one slot for a frame
    pub fn evaluate(&mut self, slot: SlotId, ctx: &mut EvaluationContext) -> Result<Value> {
        let mut values = self.evaluate_all(&[slot], ctx)?;
        values.pop().ok_or(EngineError::UnknownSlot(slot))
    }

    /// Evaluate several slots within one frame
    pub fn evaluate_all(
        &mut self,
        slots: &[SlotId],
        ctx: &mut EvaluationContext,
    ) -> Result<Vec<Value>> {
        let volatile = self.graph.begin_frame();
        log::debug!("Frame at t={} dirtied {} volatile dependents", ctx.time, volatile);

        let mut evaluator = Evaluator::new(
            &self.library,
            &mut self.graph,
            &self.extensions,
            self.events.as_ref(),
            &self.config,
        );
        let mut values = Vec::with_capacity(slots.len());
        for slot in slots {
            values.push(evaluator.pull(*slot, ctx)?);
        }
        let recomputed = evaluator.recomputed();

        for slot in slots {
            evaluator.emit(EngineEvent::FrameEvaluated {
                slot: slot.0,
                time: ctx.time,
                recomputed,
            });
        }
        Ok(values)
    }

    /// Evaluate an output of an instance by port id
    pub fn evaluate_output(
        &mut self,
        instance: InstanceId,
        output: &str,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let slot = self
            .graph
            .slot_of_output(instance, output)
            .ok_or_else(|| StructuralError::UnknownOutput(output.to_string()))?;
        self.evaluate(slot, ctx)
    }

    // --- Invalidation and leaf injection ---

    /// Force the next pull of `slot` to recompute; returns slots dirtied
    pub fn invalidate(&mut self, slot: SlotId) -> usize {
        self.graph.invalidate(slot)
    }

    pub fn invalidate_instance(&mut self, instance: InstanceId) -> usize {
        self.graph.invalidate_instance(instance)
    }

    /// Dirty everything reading from `slot`, leaving `slot` itself alone
    pub fn invalidate_downstream_of(&mut self, slot: SlotId) -> usize {
        self.graph.mark_downstream_dirty(slot)
    }

    /// Write a literal into an input slot and invalidate it
    pub fn set_literal(&mut self, slot: SlotId, value: impl Into<Value>) -> Result<bool> {
        self.graph.set_literal(slot, value.into())
    }

    // --- Authoring ---

    /// Add a new symbol; nothing live refers to it yet
    pub fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        self.library.add_symbol(symbol)
    }

    /// Register a built symbol in the library
    pub fn register(&mut self, builder: SymbolBuilder) -> EditResult<BuiltSymbol> {
        builder.register(&mut self.library)
    }

    /// Add the primitive symbol of a registered operator type
    pub fn add_operator_symbol(&mut self, operator_type: &str) -> EditResult<SymbolId> {
        let symbol = self
            .registry
            .symbol_for(operator_type)
            .ok_or_else(|| StructuralError::UnknownOperator(operator_type.to_string()))?;
        Ok(self.library.add_symbol(symbol))
    }

    /// Place `child_symbol` inside `parent` and instantiate it everywhere
    /// `parent` is live
    pub fn add_child(
        &mut self,
        parent: SymbolId,
        child_symbol: SymbolId,
        name: impl Into<String>,
    ) -> EditResult<ChildId> {
        check_instantiable(&self.library, &self.registry, child_symbol)?;
        let child = self.library.add_child(parent, child_symbol, name)?;
        let placement = self
            .library
            .symbol(parent)
            .and_then(|s| s.child(child))
            .cloned()
            .ok_or(StructuralError::UnknownChild(child))?;

        let mut dirtied = 0;
        for instance in self.graph.instances_of(parent) {
            match self
                .graph
                .instantiate_child(&self.library, &self.registry, instance, &placement)
            {
                Ok(created) => dirtied += self.graph.invalidate_instance(created),
                Err(err) => log::warn!("Could not instantiate {} in {:?}: {}", child, instance, err),
            }
        }
        self.structure_changed(parent, dirtied);
        Ok(child)
    }

    /// Remove a placement, its connections and its animation
    pub fn remove_child(&mut self, parent: SymbolId, child: ChildId) -> EditResult<SymbolChild> {
        let mut affected: Vec<Endpoint> = Vec::new();
        if let Some(symbol) = self.library.symbol(parent) {
            for connection in &symbol.connections {
                if connection.source.child == Some(child)
                    && connection.target.child != Some(child)
                    && !affected.contains(&connection.target)
                {
                    affected.push(connection.target.clone());
                }
            }
        }
        let removed = self.library.remove_child(parent, child)?;

        let mut dirtied = 0;
        for instance in self.graph.instances_of(parent) {
            if let Some(child_instance) = self.graph.child_instance(instance, child) {
                if let Err(err) = self.graph.destroy(child_instance) {
                    log::warn!("Could not destroy {:?}: {}", child_instance, err);
                }
            }
            dirtied += self.rewire(instance, &affected);
        }
        self.structure_changed(parent, dirtied);
        Ok(removed)
    }

    /// Override a placement's input literal; returns the stored value
    pub fn set_input_override(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
        value: impl Into<Value>,
    ) -> EditResult<Value> {
        let stored = self
            .library
            .set_input_override(parent, child, input, value.into())?;
        self.push_literal(parent, child, input, &stored);
        Ok(stored)
    }

    /// Drop a placement's override so the input falls back to its default
    pub fn clear_input_override(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
    ) -> EditResult<Option<Value>> {
        let previous = self.library.clear_input_override(parent, child, input)?;
        let default = self
            .library
            .child_symbol(parent, child)?
            .input(input)
            .map(|i| i.default_value.clone())
            .ok_or_else(|| StructuralError::UnknownInput(input.to_string()))?;
        self.push_literal(parent, child, input, &default);
        Ok(previous)
    }

    fn push_literal(&mut self, parent: SymbolId, child: ChildId, input: &str, value: &Value) {
        for instance in self.graph.instances_of(parent) {
            let slot = self
                .graph
                .child_instance(instance, child)
                .and_then(|c| self.graph.slot_of_input(c, input));
            if let Some(slot) = slot {
                if let Err(err) = self.graph.set_literal(slot, value.clone()) {
                    log::warn!("Could not write literal into {:?}: {}", slot, err);
                }
            }
        }
    }

    /// Connect `source` to `target` inside `symbol` at `ordinal`
    pub fn connect(
        &mut self,
        symbol: SymbolId,
        source: Endpoint,
        target: Endpoint,
        ordinal: usize,
    ) -> EditResult<usize> {
        let ordinal = self
            .library
            .connect(symbol, source, target.clone(), ordinal)?;
        self.rewire_everywhere(symbol, &target);
        Ok(ordinal)
    }

    /// Remove the connection at `ordinal` into `target`
    pub fn disconnect(
        &mut self,
        symbol: SymbolId,
        target: &Endpoint,
        ordinal: usize,
    ) -> EditResult<Connection> {
        let removed = self.library.disconnect(symbol, target, ordinal)?;
        self.rewire_everywhere(symbol, target);
        Ok(removed)
    }

    fn rewire_everywhere(&mut self, symbol: SymbolId, target: &Endpoint) {
        let targets = [target.clone()];
        let mut dirtied = 0;
        for instance in self.graph.instances_of(symbol) {
            dirtied += self.rewire(instance, &targets);
        }
        self.structure_changed(symbol, dirtied);
    }

    fn rewire(&mut self, instance: InstanceId, targets: &[Endpoint]) -> usize {
        let mut dirtied = 0;
        for target in targets {
            match self.graph.rewire_input(&self.library, instance, target) {
                Ok(count) => dirtied += count,
                Err(err) => log::warn!("Could not rewire '{}' in {:?}: {}", target.port, instance, err),
            }
        }
        dirtied
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
        self.library
            .add_keyframe(parent, child, input, component, key)?;
        self.refresh_animation(parent, child, input);
        Ok(())
    }

    /// Remove the key at `time`; the input stops being animated once its
    /// last key is gone
    pub fn remove_keyframe(
        &mut self,
        parent: SymbolId,
        child: ChildId,
        input: &str,
        component: usize,
        time: f64,
    ) -> EditResult<Keyframe> {
        let removed = self
            .library
            .remove_keyframe(parent, child, input, component, time)?;
        self.refresh_animation(parent, child, input);
        Ok(removed)
    }

    fn refresh_animation(&mut self, parent: SymbolId, child: ChildId, input: &str) {
        for instance in self.graph.instances_of(parent) {
            if let Some(child_instance) = self.graph.child_instance(instance, child) {
                if let Err(err) = self
                    .graph
                    .refresh_animation(&self.library, child_instance, input)
                {
                    log::warn!("Could not refresh animation of '{}': {}", input, err);
                }
            }
        }
    }

    fn structure_changed(&self, symbol: SymbolId, dirty_slots: usize) {
        log::debug!("Structure of {} changed; {} slots dirtied", symbol, dirty_slots);
        if let Err(err) = self.events.send(EngineEvent::StructureChanged {
            symbol: symbol.to_string(),
            dirty_slots,
        }) {
            log::warn!("Dropping engine event: {}", err);
        }
    }

    // --- Inspection ---

    pub fn is_animated(&self, parent: SymbolId, child: ChildId, input: &str) -> bool {
        self.library
            .symbol(parent)
            .is_some_and(|s| s.animator.is_animated(child, input))
    }

    pub fn curves_for_input(&self, parent: SymbolId, child: ChildId, input: &str) -> Option<&[Curve]> {
        self.library
            .symbol(parent)?
            .animator
            .curves_for_input(child, input)
    }

    /// Health of an instance: a recorded compute failure wins over the
    /// operator's own report
    pub fn node_status(&self, instance: InstanceId) -> Option<NodeStatus> {
        let inst = self.graph.instance(instance)?;
        if inst.status().is_failed() {
            return Some(inst.status().clone());
        }
        Some(
            inst.operator()
                .and_then(|op| op.as_status_reporting())
                .map(|reporter| reporter.status())
                .unwrap_or_default(),
        )
    }

    /// Options an operator offers for one of its inputs
    pub fn dropdown_options(
        &self,
        instance: InstanceId,
        input: &str,
        query: &PortOptionsQuery,
    ) -> Option<PortOptionsResult> {
        let provider = self.graph.instance(instance)?.operator()?.as_dropdown_provider()?;
        Some(PortOptionsResult::from_options(provider.options(input), query))
    }

    pub fn cache_stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            instances: self.graph.instance_count(),
            ..CacheStats::default()
        };
        for (_, slot) in self.graph.slots() {
            stats.slots += 1;
            stats.total_recomputes += slot.dirty_flag().recompute_count();
            if slot.dirty_flag().needs_update() {
                stats.dirty_slots += 1;
            }
        }
        stats.failed_nodes = self
            .graph
            .instances()
            .filter(|i| i.status().is_failed())
            .count();
        stats
    }

    pub fn slot_of_input(&self, instance: InstanceId, input: &str) -> Option<SlotId> {
        self.graph.slot_of_input(instance, input)
    }

    pub fn slot_of_output(&self, instance: InstanceId, output: &str) -> Option<SlotId> {
        self.graph.slot_of_output(instance, output)
    }

    pub fn child_instance(&self, instance: InstanceId, child: ChildId) -> Option<InstanceId> {
        self.graph.child_instance(instance, child)
    }

    /// Cached value of a slot without evaluating
    pub fn cached_value(&self, slot: SlotId) -> Option<&Value> {
        self.graph.slot(slot).map(|s| s.value())
    }

    // --- Undo/redo ---

    /// Record the current library as an undo step
    pub fn checkpoint(&mut self) -> Result<()> {
        self.undo.push(&self.library)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Restore the previous checkpoint. Root instances are rebuilt, so ids
    /// obtained before the call are stale; re-query them from `roots()`.
    pub fn undo(&mut self) -> Result<bool> {
        match self.undo.undo() {
            Some(library) => {
                self.restore(library?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        match self.undo.redo() {
            Some(library) => {
                self.restore(library?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn restore(&mut self, library: SymbolLibrary) -> Result<()> {
        self.library = library;
        self.graph.clear();
        let roots = std::mem::take(&mut self.root_symbols);
        let mut failed = Vec::new();
        for symbol in roots {
            if self.library.symbol(symbol).is_none() {
                log::warn!("Root symbol {} is gone after restore", symbol);
                continue;
            }
            if let Err(err) = self.instantiate(symbol) {
                log::warn!("Could not rebuild root symbol {} after restore: {}", symbol, err);
                failed.push(symbol);
            }
        }
        // Retried on the next restore
        self.root_symbols.extend(failed);
        log::info!(
            "Restored library with {} symbols and {} roots",
            self.library.len(),
            self.graph.roots().len()
        );
        if let Err(err) = self.events.send(EngineEvent::StructureChanged {
            symbol: String::new(),
            dirty_slots: self.graph.dirty_count(),
        }) {
            log::warn!("Dropping engine event: {}", err);
        }
        Ok(())
    }
}
