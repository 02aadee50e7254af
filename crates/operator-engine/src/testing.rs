//! Shared fixtures for unit tests

use crate::context::EvaluationContext;
use crate::descriptor::{InputMetadata, OperatorMetadata, OutputMetadata};
use crate::dirty::TriggerPolicy;
use crate::error::Result;
use crate::operator::{Inputs, Operator};
use crate::registry::OperatorRegistry;
use crate::symbol::{InputDefinition, OutputDefinition, Symbol};
use crate::types::{OperatorCategory, ValueType};
use crate::value::Value;

pub(crate) const PASS_TYPE: &str = "test-pass";

/// Forwards its `value` input to `result`
struct Pass;

impl Operator for Pass {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        inputs.pull("value", ctx)
    }
}

/// Primitive symbol backed by [`Pass`]
pub(crate) fn float_symbol(trigger: TriggerPolicy) -> Symbol {
    let mut symbol = Symbol::primitive("pass", PASS_TYPE);
    symbol
        .inputs
        .push(InputDefinition::new("value", ValueType::Float).with_default(0.0f32));
    symbol
        .outputs
        .push(OutputDefinition::new("result", ValueType::Float).with_trigger(trigger));
    symbol
}

pub(crate) fn constant_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();
    registry.register_fn(
        OperatorMetadata {
            operator_type: PASS_TYPE.to_string(),
            category: OperatorCategory::Value,
            label: "Pass".to_string(),
            description: "Forwards its input".to_string(),
            inputs: vec![InputMetadata::new("value", "Value", ValueType::Float)],
            outputs: vec![OutputMetadata::new("result", "Result", ValueType::Float)],
        },
        || Box::new(Pass),
    );
    registry
}
