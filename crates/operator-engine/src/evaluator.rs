//! Pull evaluation
//!
//! `Evaluator` borrows everything a pull needs for the duration of one
//! frame tick. Pulling a slot dispatches on its [`SlotSource`]:
//!
//! - `Literal` returns the cached value, or resamples the placement's
//!   animation curves when the input is animated.
//! - `Connection`, `MultiInput` and `PassThrough` re-pull their upstream
//!   slots and store the (converted) result. An animated connected input
//!   samples its curves and falls back to the connection value.
//! - `Operator` returns the cached value unless the flag needs an update,
//!   in which case the owning instance's operator computes it.
//!
//! Whenever a stored value changes, every slot reading from it is marked
//! dirty before the pull returns.

use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventSink};
use crate::extensions::Extensions;
use crate::graph::InstanceGraph;
use crate::library::SymbolLibrary;
use crate::operator::{Inputs, NodeStatus};
use crate::slot::SlotSource;
use crate::types::SlotId;
use crate::value::Value;

/// Borrowed view of an engine for one frame tick
pub struct Evaluator<'g> {
    pub(crate) library: &'g SymbolLibrary,
    pub(crate) graph: &'g mut InstanceGraph,
    pub(crate) extensions: &'g Extensions,
    pub(crate) events: &'g dyn EventSink,
    pub(crate) config: &'g EngineConfig,
    recomputed: usize,
}

impl<'g> Evaluator<'g> {
    pub fn new(
        library: &'g SymbolLibrary,
        graph: &'g mut InstanceGraph,
        extensions: &'g Extensions,
        events: &'g dyn EventSink,
        config: &'g EngineConfig,
    ) -> Self {
        Self {
            library,
            graph,
            extensions,
            events,
            config,
            recomputed: 0,
        }
    }

    /// Operator recomputes performed so far
    pub fn recomputed(&self) -> usize {
        self.recomputed
    }

    /// Current value of `slot` under `ctx`
    pub fn pull(&mut self, slot: SlotId, ctx: &mut EvaluationContext) -> Result<Value> {
        let cell = self.graph.slot(slot).ok_or(EngineError::UnknownSlot(slot))?;
        match cell.source().clone() {
            SlotSource::Literal if cell.is_animated() => {
                let fallback = cell.literal().clone();
                self.pull_animated(slot, fallback, ctx)
            }
            SlotSource::Literal => {
                let value = cell.value().clone();
                if let Some(cell) = self.graph.slot_mut(slot) {
                    cell.dirty.clear();
                }
                Ok(value)
            }
            SlotSource::Connection(upstream) if cell.is_animated() => {
                // Upstream changes dirty this slot before the freshness check
                let fallback = self.pull(upstream, ctx)?;
                self.pull_animated(slot, fallback, ctx)
            }
            SlotSource::Connection(upstream) | SlotSource::PassThrough(upstream) => {
                let value = self.pull(upstream, ctx)?;
                Ok(self.store(slot, value))
            }
            SlotSource::MultiInput(upstream) => {
                let mut items = Vec::with_capacity(upstream.len());
                for source in upstream {
                    items.push(self.pull(source, ctx)?);
                }
                let element_type = self
                    .graph
                    .slot(slot)
                    .ok_or(EngineError::UnknownSlot(slot))?
                    .value_type();
                let items = items
                    .into_iter()
                    .map(|item| {
                        item.convert_to(element_type)
                            .unwrap_or_else(|| Value::default_for(element_type))
                    })
                    .collect();
                Ok(self.store(slot, Value::List(items)))
            }
            SlotSource::Operator { output } => self.pull_operator(slot, &output, ctx),
        }
    }

    /// Coerce, cache and clear; propagate downstream when the value changed
    fn store(&mut self, slot: SlotId, value: Value) -> Value {
        let Some(cell) = self.graph.slot_mut(slot) else {
            return value;
        };
        let value = cell.coerce(value);
        let changed = cell.store(value.clone());
        cell.dirty.clear();
        if changed || self.config.propagate_unchanged_writes {
            self.graph.mark_downstream_dirty(slot);
        }
        value
    }

    /// Sample the placement's curves at the local time; components without
    /// usable keys take `fallback`
    fn pull_animated(
        &mut self,
        slot: SlotId,
        fallback: Value,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let cell = self.graph.slot(slot).ok_or(EngineError::UnknownSlot(slot))?;
        let time = ctx.local_time;
        let fresh = !cell.dirty.is_dirty()
            && cell
                .dirty
                .last_time()
                .is_some_and(|last| (last - time).abs() < self.config.animation_time_epsilon);
        if fresh {
            return Ok(cell.value().clone());
        }

        let owner = self
            .graph
            .instance(cell.owner())
            .ok_or(EngineError::UnknownInstance(cell.owner()))?;
        let animator = owner
            .parent()
            .and_then(|p| self.graph.instance(p))
            .and_then(|p| self.library.symbol(p.symbol_id()))
            .map(|s| &s.animator);

        let fallback = cell.coerce(fallback);
        let value = match (animator, owner.child_id()) {
            (Some(animator), Some(child)) => animator.evaluate(child, cell.port(), time, &fallback),
            _ => fallback,
        };

        let value = self.store(slot, value);
        if let Some(cell) = self.graph.slot_mut(slot) {
            cell.dirty.set_last_time(time);
            cell.dirty.record_recompute();
        }
        Ok(value)
    }

    fn pull_operator(
        &mut self,
        slot: SlotId,
        output: &str,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let cell = self.graph.slot(slot).ok_or(EngineError::UnknownSlot(slot))?;
        if !cell.dirty.needs_update() {
            return Ok(cell.value().clone());
        }
        let cached = cell.value().clone();
        let owner = cell.owner();

        let instance = self
            .graph
            .instance_mut(owner)
            .ok_or(EngineError::UnknownInstance(owner))?;
        let operator_type = instance.operator_type.clone().unwrap_or_default();
        let Some(mut operator) = instance.operator.take() else {
            log::warn!(
                "'{}' on {:?} pulled while it is computing; returning cached value",
                output,
                owner
            );
            return Ok(cached);
        };

        log::debug!("Computing '{}' of {} ({:?})", output, operator_type, owner);
        let result = {
            let mut inputs = Inputs {
                evaluator: self,
                instance: owner,
            };
            operator.compute(output, &mut inputs, ctx)
        };
        if let Some(instance) = self.graph.instance_mut(owner) {
            instance.operator = Some(operator);
        }

        match result {
            Ok(value) => {
                let value = self.store(slot, value);
                if let Some(cell) = self.graph.slot_mut(slot) {
                    cell.dirty.record_recompute();
                }
                self.recomputed += 1;

                let recovered = self
                    .graph
                    .instance_mut(owner)
                    .map(|i| std::mem::take(&mut i.status))
                    .is_some_and(|previous| previous.is_failed());
                if recovered {
                    log::info!("{} ({:?}) recovered", operator_type, owner);
                    self.emit(EngineEvent::NodeRecovered {
                        instance: owner.0,
                        operator_type: operator_type.clone(),
                    });
                }
                if self.config.emit_recompute_events {
                    self.emit(EngineEvent::SlotRecomputed {
                        slot: slot.0,
                        instance: owner.0,
                        port: output.to_string(),
                    });
                }
                Ok(value)
            }
            Err(err) => {
                log::warn!(
                    "{} ({:?}) failed computing '{}': {}; keeping last value",
                    operator_type,
                    owner,
                    output,
                    err
                );
                if let Some(cell) = self.graph.slot_mut(slot) {
                    cell.dirty.clear();
                }
                let message = err.to_string();
                let first_report = self.graph.instance_mut(owner).is_some_and(|instance| {
                    let status = NodeStatus::Failed(message.clone());
                    let changed = instance.status != status;
                    instance.status = status;
                    changed
                });
                if first_report {
                    self.emit(EngineEvent::NodeFailed {
                        instance: owner.0,
                        operator_type,
                        error: message,
                    });
                }
                Ok(cached)
            }
        }
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        if let Err(err) = self.events.send(event) {
            log::warn!("Dropping engine event: {}", err);
        }
    }
}
