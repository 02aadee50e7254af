//! Operator descriptor trait and metadata types
//!
//! An operator describes its own ports, category and label, so the
//! implementation is the single source of truth for both behaviour and the
//! primitive symbol the registry derives from it.

use serde::{Deserialize, Serialize};

use crate::dirty::TriggerPolicy;
use crate::operator::Operator;
use crate::symbol::{InputDefinition, OutputDefinition, Symbol};
use crate::types::{OperatorCategory, ValueType};
use crate::value::Value;

/// Trait for operators that can describe their metadata
///
/// # Example
///
/// ```ignore
/// impl OperatorDescriptor for AddOp {
///     fn descriptor() -> OperatorMetadata {
///         OperatorMetadata {
///             operator_type: "add".to_string(),
///             category: OperatorCategory::Math,
///             label: "Add".to_string(),
///             description: "Sums its inputs".to_string(),
///             inputs: vec![InputMetadata::new("values", "Values", ValueType::Float).multiple()],
///             outputs: vec![OutputMetadata::new("result", "Result", ValueType::Float)],
///         }
///     }
/// }
/// ```
pub trait OperatorDescriptor {
    /// Get the static metadata for this operator type
    fn descriptor() -> OperatorMetadata
    where
        Self: Sized;
}

/// Complete metadata for an operator type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorMetadata {
    /// Unique type identifier (e.g., "add")
    pub operator_type: String,
    /// Category for palette grouping
    pub category: OperatorCategory,
    /// Human-readable label
    pub label: String,
    pub description: String,
    pub inputs: Vec<InputMetadata>,
    pub outputs: Vec<OutputMetadata>,
}

impl OperatorMetadata {
    /// Derive the primitive symbol placed for this operator type.
    ///
    /// The symbol id is fresh; register the symbol once and place it many
    /// times.
    pub fn to_symbol(&self) -> Symbol {
        let mut symbol = Symbol::primitive(self.label.clone(), self.operator_type.clone());
        symbol.inputs = self
            .inputs
            .iter()
            .map(|input| InputDefinition {
                id: input.id.clone(),
                name: input.label.clone(),
                value_type: input.value_type,
                default_value: input.default_value.clone(),
                multi_input: input.multiple,
            })
            .collect();
        symbol.outputs = self
            .outputs
            .iter()
            .map(|output| OutputDefinition {
                id: output.id.clone(),
                name: output.label.clone(),
                value_type: output.value_type,
                trigger: output.trigger,
            })
            .collect();
        symbol
    }
}

/// Metadata for an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMetadata {
    pub id: String,
    pub label: String,
    pub value_type: ValueType,
    /// Literal used when the input is neither connected nor overridden
    pub default_value: Value,
    /// Whether multiple ordered connections are allowed
    pub multiple: bool,
}

impl InputMetadata {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value_type,
            default_value: Value::default_for(value_type),
            multiple: false,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Set this port to accept multiple connections
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self.default_value = Value::List(Vec::new());
        self
    }
}

/// Metadata for an output port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMetadata {
    pub id: String,
    pub label: String,
    pub value_type: ValueType,
    pub trigger: TriggerPolicy,
}

impl OutputMetadata {
    pub fn new(id: impl Into<String>, label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            value_type,
            trigger: TriggerPolicy::default(),
        }
    }

    /// Recompute on every pull (context-dependent outputs)
    pub fn always(mut self) -> Self {
        self.trigger = TriggerPolicy::AlwaysPerPull;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerPolicy) -> Self {
        self.trigger = trigger;
        self
    }
}

/// Link-time registration of an operator type.
///
/// `descriptor` yields the metadata, `factory` creates a fresh operator
/// for every instance.
///
/// ```ignore
/// inventory::submit!(operator_engine::OperatorFn {
///     descriptor: AddOp::descriptor,
///     factory: || Box::new(AddOp::default()),
/// });
/// ```
pub struct OperatorFn {
    pub descriptor: fn() -> OperatorMetadata,
    pub factory: fn() -> Box<dyn Operator>,
}

inventory::collect!(OperatorFn);

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "add".to_string(),
            category: OperatorCategory::Math,
            label: "Add".to_string(),
            description: "Sums values".to_string(),
            inputs: vec![
                InputMetadata::new("values", "Values", ValueType::Float).multiple(),
                InputMetadata::new("offset", "Offset", ValueType::Float).with_default(1.0f32),
            ],
            outputs: vec![OutputMetadata::new("result", "Result", ValueType::Float)],
        }
    }

    #[test]
    fn test_input_metadata_builders() {
        let port = InputMetadata::new("values", "Values", ValueType::Float).multiple();
        assert!(port.multiple);
        assert_eq!(port.default_value, Value::List(Vec::new()));

        let port = InputMetadata::new("x", "X", ValueType::Float).with_default(2.0f32);
        assert_eq!(port.default_value, Value::Float(2.0));
    }

    #[test]
    fn test_output_metadata_trigger() {
        let port = OutputMetadata::new("time", "Time", ValueType::Float).always();
        assert_eq!(port.trigger, TriggerPolicy::AlwaysPerPull);
    }

    #[test]
    fn test_to_symbol() {
        let symbol = metadata().to_symbol();
        assert_eq!(symbol.operator_type.as_deref(), Some("add"));
        assert!(symbol.input("values").is_some_and(|i| i.multi_input));
        assert_eq!(
            symbol.input("offset").map(|i| i.default_value.clone()),
            Some(Value::Float(1.0))
        );
        assert_eq!(symbol.outputs.len(), 1);
    }

    #[test]
    fn test_metadata_serialization() {
        let json = serde_json::to_string(&metadata()).unwrap();
        assert!(json.contains("operatorType"));
        assert!(json.contains("\"add\""));
    }
}
