//! External Value Operator
//!
//! Polls a named source in the host's [`ExternalSources`] on every pull.
//! A missing or offline source fails the compute, so the engine keeps the
//! last good value and marks the node failed. A stale reading is returned
//! with a warning status.

use std::sync::Arc;

use operator_engine::{
    extension_keys, DropdownProvider, EngineError, EvaluationContext, InputMetadata, Inputs,
    NodeStatus, Operator, OperatorCategory, OperatorDescriptor, OperatorMetadata, OutputMetadata,
    PortOption, Result, StatusReporting, Value, ValueType,
};

use super::sources::{ExternalSources, SourceState};

/// External Value Operator
///
/// # Inputs
/// - `source` - Name of the source to read
///
/// # Outputs
/// - `value` - The source's reading
#[derive(Debug, Default)]
pub struct ExternalValueOp {
    status: NodeStatus,
    known_sources: Vec<String>,
}

impl ExternalValueOp {
    pub const PORT_SOURCE: &'static str = "source";
    pub const PORT_VALUE: &'static str = "value";

    fn read(&mut self, sources: Option<&Arc<ExternalSources>>, name: &str) -> Result<Value> {
        let sources = sources
            .ok_or_else(|| EngineError::unavailable("no external sources registered"))?;
        self.known_sources = sources.names();

        match sources.read(name) {
            Some(SourceState::Live(value)) => {
                self.status = NodeStatus::Ok;
                Ok(value)
            }
            Some(SourceState::Stale(value)) => {
                self.status = NodeStatus::Warning(format!("source '{}' is stale", name));
                Ok(value)
            }
            Some(SourceState::Offline(reason)) => Err(EngineError::unavailable(format!(
                "source '{}' is offline: {}",
                name, reason
            ))),
            None => Err(EngineError::unavailable(format!("unknown source '{}'", name))),
        }
    }
}

impl OperatorDescriptor for ExternalValueOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "external-value".to_string(),
            category: OperatorCategory::External,
            label: "External Value".to_string(),
            description: "Reads a value published by the host".to_string(),
            inputs: vec![InputMetadata::new(Self::PORT_SOURCE, "Source", ValueType::Text)],
            outputs: vec![OutputMetadata::new(Self::PORT_VALUE, "Value", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: ExternalValueOp::descriptor,
    factory: || Box::new(ExternalValueOp::default()),
});

impl Operator for ExternalValueOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let name = inputs.pull_text(Self::PORT_SOURCE, ctx)?;
        let sources = inputs
            .extensions()
            .get::<Arc<ExternalSources>>(extension_keys::EXTERNAL_SOURCES)
            .cloned();

        let result = self.read(sources.as_ref(), &name);
        if let Err(err) = &result {
            self.status = NodeStatus::Failed(err.to_string());
        }
        result
    }

    fn as_status_reporting(&self) -> Option<&dyn StatusReporting> {
        Some(self)
    }

    fn as_dropdown_provider(&self) -> Option<&dyn DropdownProvider> {
        Some(self)
    }
}

impl StatusReporting for ExternalValueOp {
    fn status(&self) -> NodeStatus {
        self.status.clone()
    }
}

impl DropdownProvider for ExternalValueOp {
    fn options(&self, input: &str) -> Vec<PortOption> {
        if input != Self::PORT_SOURCE {
            return Vec::new();
        }
        self.known_sources.iter().map(PortOption::text).collect()
    }
}
