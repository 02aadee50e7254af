//! Operator trait and optional capabilities
//!
//! An operator is the compute body of a primitive symbol. The engine owns
//! one boxed operator per live instance and asks it for one output at a
//! time. Operators read inputs lazily through [`Inputs`], so an input
//! that is never pulled is never evaluated.
//!
//! Capabilities (status reporting, dropdown options, gizmo transforms) are
//! separate traits exposed through `as_*` accessors on [`Operator`], so the
//! engine can ask "does this operator support X" without downcasting.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::error::{EngineError, Result};
use crate::evaluator::Evaluator;
use crate::extensions::Extensions;
use crate::port_options::PortOption;
use crate::slot::SlotSource;
use crate::types::{InstanceId, ValueType};
use crate::value::Value;

/// Health of a node, shown as a badge by editors
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Ok,
    Warning(String),
    Failed(String),
}

impl NodeStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, NodeStatus::Ok)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, NodeStatus::Failed(_))
    }
}

/// Compute body of a primitive symbol
pub trait Operator: 'static {
    /// Produce the value of `output`.
    ///
    /// Returning `Err` keeps the slot's last value and marks the node
    /// failed; the error does not propagate to downstream pulls.
    fn compute(
        &mut self,
        output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value>;

    fn as_status_reporting(&self) -> Option<&dyn StatusReporting> {
        None
    }

    fn as_dropdown_provider(&self) -> Option<&dyn DropdownProvider> {
        None
    }

    fn as_transformable(&self) -> Option<&dyn Transformable> {
        None
    }
}

/// Operators that track their own health (e.g. a device that went offline)
pub trait StatusReporting {
    fn status(&self) -> NodeStatus;
}

/// Operators that offer a fixed set of choices for some inputs
pub trait DropdownProvider {
    /// Options for `input`, empty if the input has none
    fn options(&self, input: &str) -> Vec<PortOption>;
}

/// Operators that an editor can drive with a transform gizmo
pub trait Transformable {
    /// Input ids receiving translation, rotation and scale
    fn transform_input_ids(&self) -> TransformInputs;
}

/// Input ids driven by a transform gizmo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformInputs {
    pub translation: Option<String>,
    pub rotation: Option<String>,
    pub scale: Option<String>,
}

/// Lazy view of one instance's inputs during `compute`
pub struct Inputs<'e, 'g> {
    pub(crate) evaluator: &'e mut Evaluator<'g>,
    pub(crate) instance: InstanceId,
}

impl<'e, 'g> Inputs<'e, 'g> {
    /// The instance being computed
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Host-supplied runtime objects
    pub fn extensions(&self) -> &Extensions {
        self.evaluator.extensions
    }

    /// Whether `input` reads from a connection rather than its literal
    pub fn has_connection(&self, input: &str) -> bool {
        self.evaluator
            .graph
            .slot_of_input(self.instance, input)
            .and_then(|slot| self.evaluator.graph.slot(slot))
            .is_some_and(|cell| cell.source() != &SlotSource::Literal)
    }

    /// Number of connections feeding a multi-input
    pub fn connection_count(&self, input: &str) -> usize {
        self.evaluator
            .graph
            .slot_of_input(self.instance, input)
            .and_then(|slot| self.evaluator.graph.slot(slot))
            .map_or(0, |cell| cell.source().upstream().len())
    }

    /// Pull the current value of `input` under `ctx`
    pub fn pull(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<Value> {
        let slot = self
            .evaluator
            .graph
            .slot_of_input(self.instance, input)
            .ok_or_else(|| EngineError::MissingInput(input.to_string()))?;
        self.evaluator.pull(slot, ctx)
    }

    /// Pull a multi-input as its ordered element list
    pub fn pull_multi(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<Vec<Value>> {
        match self.pull(input, ctx)? {
            Value::List(items) => Ok(items),
            other => Ok(vec![other]),
        }
    }

    pub fn pull_float(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<f32> {
        self.pull(input, ctx)?
            .as_float()
            .ok_or_else(|| invalid(input, ValueType::Float))
    }

    pub fn pull_int(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<i64> {
        self.pull(input, ctx)?
            .as_int()
            .ok_or_else(|| invalid(input, ValueType::Int))
    }

    pub fn pull_bool(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<bool> {
        self.pull(input, ctx)?
            .as_bool()
            .ok_or_else(|| invalid(input, ValueType::Bool))
    }

    pub fn pull_vec2(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<Vec2> {
        self.pull(input, ctx)?
            .as_vec2()
            .ok_or_else(|| invalid(input, ValueType::Vec2))
    }

    pub fn pull_vec3(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<Vec3> {
        self.pull(input, ctx)?
            .as_vec3()
            .ok_or_else(|| invalid(input, ValueType::Vec3))
    }

    pub fn pull_text(&mut self, input: &str, ctx: &mut EvaluationContext) -> Result<String> {
        match self.pull(input, ctx)? {
            Value::Text(text) => Ok(text),
            _ => Err(invalid(input, ValueType::Text)),
        }
    }
}

fn invalid(input: &str, expected: ValueType) -> EngineError {
    EngineError::InvalidInputType {
        input: input.to_string(),
        expected,
    }
}
