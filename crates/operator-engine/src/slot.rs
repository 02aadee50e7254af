//! Typed slot cells
//!
//! A slot pairs a cached [`Value`] with a [`DirtyFlag`] and says where a
//! fresh value comes from. Input slots and composite boundary outputs are
//! wiring: they forward whatever their source yields on every pull. Operator
//! outputs are the memoizing cells whose trigger policy decides whether a
//! pull recomputes.

use crate::dirty::{DirtyFlag, TriggerPolicy};
use crate::types::{InstanceId, SlotId, ValueType};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Input,
    Output,
}

/// Where a slot's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum SlotSource {
    /// Terminal: the literal (override or default). Pulling is a no-op.
    Literal,
    /// A single upstream output
    Connection(SlotId),
    /// Ordered upstream outputs aggregated into a list
    MultiInput(Vec<SlotId>),
    /// Computed by the owning instance's operator
    Operator { output: String },
    /// Composite boundary output forwarding an inner slot
    PassThrough(SlotId),
}

impl SlotSource {
    /// Upstream slots, in ordinal order
    pub fn upstream(&self) -> Vec<SlotId> {
        match self {
            SlotSource::Connection(id) | SlotSource::PassThrough(id) => vec![*id],
            SlotSource::MultiInput(ids) => ids.clone(),
            SlotSource::Literal | SlotSource::Operator { .. } => Vec::new(),
        }
    }

    /// Whether the slot re-reads its source on every pull
    pub fn is_wiring(&self) -> bool {
        matches!(
            self,
            SlotSource::Connection(_) | SlotSource::MultiInput(_) | SlotSource::PassThrough(_)
        )
    }
}

/// A live value cell
#[derive(Debug, Clone)]
pub struct SlotCell {
    pub(crate) owner: InstanceId,
    pub(crate) kind: SlotKind,
    pub(crate) port: String,
    /// Element type; multi-inputs hold a `List` of these
    pub(crate) value_type: ValueType,
    pub(crate) multi_input: bool,
    pub(crate) value: Value,
    /// Non-animated literal (override or default)
    pub(crate) literal: Value,
    pub(crate) dirty: DirtyFlag,
    pub(crate) source: SlotSource,
    /// Slots that read this one
    pub(crate) targets: Vec<SlotId>,
    /// Driven by an animator curve
    pub(crate) animated: bool,
}

impl SlotCell {
    pub(crate) fn input(
        owner: InstanceId,
        port: &str,
        value_type: ValueType,
        multi_input: bool,
        literal: Value,
    ) -> Self {
        Self {
            owner,
            kind: SlotKind::Input,
            port: port.to_string(),
            value_type,
            multi_input,
            value: literal.clone(),
            literal,
            dirty: DirtyFlag::new(TriggerPolicy::ExplicitInvalidate),
            source: SlotSource::Literal,
            targets: Vec::new(),
            animated: false,
        }
    }

    pub(crate) fn output(
        owner: InstanceId,
        port: &str,
        value_type: ValueType,
        trigger: TriggerPolicy,
        source: SlotSource,
    ) -> Self {
        let default = Value::default_for(value_type);
        Self {
            owner,
            kind: SlotKind::Output,
            port: port.to_string(),
            value_type,
            multi_input: false,
            value: default.clone(),
            literal: default,
            dirty: DirtyFlag::new(trigger),
            source,
            targets: Vec::new(),
            animated: false,
        }
    }

    pub fn owner(&self) -> InstanceId {
        self.owner
    }

    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Type of the cached value
    pub fn stored_type(&self) -> ValueType {
        if self.multi_input {
            ValueType::List
        } else {
            self.value_type
        }
    }

    pub fn is_multi_input(&self) -> bool {
        self.multi_input
    }

    /// The last cached value, without recomputing
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn literal(&self) -> &Value {
        &self.literal
    }

    pub fn dirty_flag(&self) -> &DirtyFlag {
        &self.dirty
    }

    pub fn trigger(&self) -> TriggerPolicy {
        self.dirty.trigger()
    }

    pub fn source(&self) -> &SlotSource {
        &self.source
    }

    pub fn targets(&self) -> &[SlotId] {
        &self.targets
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Volatile slots must be revisited every frame
    pub(crate) fn is_volatile(&self) -> bool {
        self.animated || self.dirty.trigger() == TriggerPolicy::AlwaysPerPull
    }

    /// Convert a value to what this slot stores.
    ///
    /// Falls back to the type default when no conversion exists.
    pub(crate) fn coerce(&self, value: Value) -> Value {
        let target = self.stored_type();
        match value.convert_to(target) {
            Some(converted) => converted,
            None => {
                log::warn!(
                    "Slot '{}' cannot hold a {} value; using default",
                    self.port,
                    value.value_type()
                );
                Value::default_for(target)
            }
        }
    }

    /// Store a new value, returning whether it differs from the old one
    pub(crate) fn store(&mut self, value: Value) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }
}
