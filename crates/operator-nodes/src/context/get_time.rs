//! Get Time Operator
//!
//! Reads playback time from the evaluation context. Both outputs recompute
//! on every pull since time never arrives through a connection.

use operator_engine::{
    EvaluationContext, Inputs, Operator, OperatorCategory, OperatorDescriptor, OperatorMetadata,
    OutputMetadata, Result, Value, ValueType,
};

/// Get Time Operator
///
/// # Outputs
/// - `local` - Time as seen by this subgraph (after any `time-remap`)
/// - `global` - Root playback time
#[derive(Debug, Default)]
pub struct GetTimeOp;

impl GetTimeOp {
    pub const PORT_LOCAL: &'static str = "local";
    pub const PORT_GLOBAL: &'static str = "global";
}

impl OperatorDescriptor for GetTimeOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "get-time".to_string(),
            category: OperatorCategory::Context,
            label: "Time".to_string(),
            description: "Current local and global playback time".to_string(),
            inputs: Vec::new(),
            outputs: vec![
                OutputMetadata::new(Self::PORT_LOCAL, "Local", ValueType::Float).always(),
                OutputMetadata::new(Self::PORT_GLOBAL, "Global", ValueType::Float).always(),
            ],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: GetTimeOp::descriptor,
    factory: || Box::new(GetTimeOp),
});

impl Operator for GetTimeOp {
    fn compute(
        &mut self,
        output: &str,
        _inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let time = match output {
            Self::PORT_GLOBAL => ctx.time,
            _ => ctx.local_time,
        };
        Ok(Value::Float(time as f32))
    }
}
