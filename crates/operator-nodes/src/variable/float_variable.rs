//! Float variable operators
//!
//! `set-float-variable` binds a named float for the duration of the pull
//! of its `command` input; `get-float-variable` reads it anywhere inside
//! that subgraph. Bindings nest: an inner set shadows an outer one with
//! the same key and the outer value is visible again once the inner pull
//! returns.

use operator_engine::{
    DropdownProvider, EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory,
    OperatorDescriptor, OperatorMetadata, OutputMetadata, PortOption, Result, Value, ValueType,
};

pub const PORT_KEY: &str = "key";
pub const PORT_VALUE: &str = "value";
pub const PORT_COMMAND: &str = "command";
pub const PORT_FALLBACK: &str = "fallback";
pub const PORT_RESULT: &str = "result";

const DEFAULT_KEY: &str = "var";

/// Set Float Variable Operator
///
/// # Inputs
/// - `key` - Variable name (default "var")
/// - `value` - Float bound to the name
/// - `command` - Subgraph pulled with the binding in place
///
/// # Outputs
/// - `result` - Whatever `command` produced
#[derive(Debug, Default)]
pub struct SetFloatVariableOp;

impl OperatorDescriptor for SetFloatVariableOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "set-float-variable".to_string(),
            category: OperatorCategory::Variable,
            label: "Set Float Variable".to_string(),
            description: "Binds a named float while evaluating its command".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_KEY, "Key", ValueType::Text).with_default(DEFAULT_KEY),
                InputMetadata::new(PORT_VALUE, "Value", ValueType::Float),
                InputMetadata::new(PORT_COMMAND, "Command", ValueType::Any),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: SetFloatVariableOp::descriptor,
    factory: || Box::new(SetFloatVariableOp),
});

impl Operator for SetFloatVariableOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text(PORT_KEY, ctx)?;
        let value = inputs.pull_float(PORT_VALUE, ctx)?;
        let mut scope = ctx.scoped();
        scope.set_float_variable(key, value);
        inputs.pull(PORT_COMMAND, &mut scope)
    }
}

/// Get Float Variable Operator
///
/// Offers the keys bound at its most recent pull as dropdown options for
/// `key`.
///
/// # Inputs
/// - `key` - Variable name (default "var")
/// - `fallback` - Returned when nothing binds `key`
///
/// # Outputs
/// - `result` - The bound float or the fallback
#[derive(Debug, Default)]
pub struct GetFloatVariableOp {
    seen_keys: Vec<String>,
}

impl OperatorDescriptor for GetFloatVariableOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "get-float-variable".to_string(),
            category: OperatorCategory::Variable,
            label: "Get Float Variable".to_string(),
            description: "Reads a named float bound by an enclosing setter".to_string(),
            inputs: vec![
                InputMetadata::new(PORT_KEY, "Key", ValueType::Text).with_default(DEFAULT_KEY),
                InputMetadata::new(PORT_FALLBACK, "Fallback", ValueType::Float),
            ],
            outputs: vec![OutputMetadata::new(PORT_RESULT, "Result", ValueType::Float).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: GetFloatVariableOp::descriptor,
    factory: || Box::new(GetFloatVariableOp::default()),
});

impl Operator for GetFloatVariableOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text(PORT_KEY, ctx)?;
        let fallback = inputs.pull_float(PORT_FALLBACK, ctx)?;
        self.seen_keys = ctx.float_variable_keys();

        let value = ctx.float_variable(&key).unwrap_or_else(|| {
            log::debug!("Float variable '{}' is not bound; using fallback", key);
            fallback
        });
        Ok(Value::Float(value))
    }

    fn as_dropdown_provider(&self) -> Option<&dyn DropdownProvider> {
        Some(self)
    }
}

impl DropdownProvider for GetFloatVariableOp {
    fn options(&self, input: &str) -> Vec<PortOption> {
        if input != PORT_KEY {
            return Vec::new();
        }
        self.seen_keys.iter().map(PortOption::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_only_for_key() {
        let op = GetFloatVariableOp {
            seen_keys: vec!["speed".to_string(), "phase".to_string()],
        };
        let labels: Vec<_> = op.options(PORT_KEY).into_iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["speed", "phase"]);
        assert!(op.options(PORT_FALLBACK).is_empty());
    }

    #[test]
    fn test_no_options_before_first_pull() {
        assert!(GetFloatVariableOp::default().options(PORT_KEY).is_empty());
    }

    #[test]
    fn test_descriptors() {
        let set = SetFloatVariableOp::descriptor();
        assert_eq!(set.operator_type, "set-float-variable");
        assert_eq!(set.inputs[0].default_value, Value::Text("var".to_string()));

        let get = GetFloatVariableOp::descriptor();
        assert_eq!(get.category, OperatorCategory::Variable);
    }
}
