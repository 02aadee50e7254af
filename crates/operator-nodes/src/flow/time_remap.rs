//! Time Remap Operator
//!
//! Evaluates its `command` subgraph at `local_time * speed + offset`.
//! Global time is left alone, so `get-time` inside the subgraph can still
//! see the root clock.

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Time Remap Operator
///
/// # Inputs
/// - `command` - Subgraph evaluated at the remapped time
/// - `speed` - Time scale (default 1.0)
/// - `offset` - Seconds added after scaling (default 0.0)
///
/// # Outputs
/// - `result` - Whatever `command` produced
#[derive(Debug, Default)]
pub struct TimeRemapOp;

impl TimeRemapOp {
    pub const PORT_COMMAND: &'static str = "command";
    pub const PORT_SPEED: &'static str = "speed";
    pub const PORT_OFFSET: &'static str = "offset";
    pub const PORT_RESULT: &'static str = "result";
}

/// Local time seen by the remapped subgraph
pub fn remap_time(local_time: f64, speed: f32, offset: f32) -> f64 {
    local_time * f64::from(speed) + f64::from(offset)
}

impl OperatorDescriptor for TimeRemapOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "time-remap".to_string(),
            category: OperatorCategory::Flow,
            label: "Time Remap".to_string(),
            description: "Evaluates a subgraph at scaled and shifted time".to_string(),
            inputs: vec![
                InputMetadata::new(Self::PORT_COMMAND, "Command", ValueType::Any),
                InputMetadata::new(Self::PORT_SPEED, "Speed", ValueType::Float).with_default(1.0f32),
                InputMetadata::new(Self::PORT_OFFSET, "Offset", ValueType::Float),
            ],
            outputs: vec![OutputMetadata::new(Self::PORT_RESULT, "Result", ValueType::Any).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: TimeRemapOp::descriptor,
    factory: || Box::new(TimeRemapOp),
});

impl Operator for TimeRemapOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let speed = inputs.pull_float(Self::PORT_SPEED, ctx)?;
        let offset = inputs.pull_float(Self::PORT_OFFSET, ctx)?;

        let mut scope = ctx.scoped();
        scope.local_time = remap_time(scope.local_time, speed, offset);
        inputs.pull(Self::PORT_COMMAND, &mut scope)
    }
}
