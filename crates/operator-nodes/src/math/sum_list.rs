//! Sum List Operator
//!
//! Sums a list value, such as the cells collected by `repeat-grid`.

use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Sum List Operator
///
/// # Inputs
/// - `list` - A list; nested lists are summed recursively, non-numeric
///   items are skipped
///
/// # Outputs
/// - `sum` - Sum of the numeric items
/// - `count` - Number of numeric items
#[derive(Debug, Default)]
pub struct SumListOp;

impl SumListOp {
    pub const PORT_LIST: &'static str = "list";
    pub const PORT_SUM: &'static str = "sum";
    pub const PORT_COUNT: &'static str = "count";
}

impl OperatorDescriptor for SumListOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "sum-list".to_string(),
            category: OperatorCategory::Math,
            label: "Sum List".to_string(),
            description: "Sums the numbers in a list".to_string(),
            inputs: vec![InputMetadata::new(Self::PORT_LIST, "List", ValueType::List)],
            outputs: vec![
                OutputMetadata::new(Self::PORT_SUM, "Sum", ValueType::Float),
                OutputMetadata::new(Self::PORT_COUNT, "Count", ValueType::Int),
            ],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: SumListOp::descriptor,
    factory: || Box::new(SumListOp),
});

/// Sum and count of the numeric leaves of `value`
fn accumulate(value: &Value) -> (f32, i64) {
    match value {
        Value::List(items) => items.iter().map(accumulate).fold((0.0, 0), |(s, n), (a, b)| {
            (s + a, n + b)
        }),
        other => other.as_float().map_or((0.0, 0), |f| (f, 1)),
    }
}

impl Operator for SumListOp {
    fn compute(
        &mut self,
        output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let list = inputs.pull(Self::PORT_LIST, ctx)?;
        let (sum, count) = accumulate(&list);
        match output {
            Self::PORT_COUNT => Ok(Value::Int(count)),
            _ => Ok(Value::Float(sum)),
        }
    }
}
