//! Test operators and fixtures shared by the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use glam::{Mat4, Vec3};
use operator_engine::{
    Engine, EngineError, EvaluationContext, InputMetadata, Inputs, InstanceId, Operator,
    OperatorCategory, OperatorMetadata, OperatorRegistry, OutputMetadata, Result, SymbolId,
    SymbolLibrary, TriggerPolicy, Value, ValueType,
};

pub const SUM: &str = "test-sum";
pub const SUM_MEMO: &str = "test-sum-memo";
pub const COLLECT: &str = "test-collect";
pub const PROBE: &str = "test-probe";
pub const PROBE_ALWAYS: &str = "test-probe-always";
pub const GRID: &str = "test-grid";
pub const SET_VAR: &str = "test-set-var";
pub const GET_VAR: &str = "test-get-var";
pub const PAIR: &str = "test-pair";
pub const FLAKY: &str = "test-flaky";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Instances in the order their operators finished computing
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<InstanceId>>>);

impl Recorder {
    fn record(&self, instance: InstanceId) {
        self.0.lock().unwrap().push(instance);
    }

    pub fn calls(&self) -> Vec<InstanceId> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, instance: InstanceId) -> usize {
        self.calls().iter().filter(|i| **i == instance).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Sums its multi-input plus an offset
struct SumOp {
    recorder: Recorder,
}

impl Operator for SumOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let values = inputs.pull_multi("values", ctx)?;
        let offset = inputs.pull_float("offset", ctx)?;
        let total = values.iter().filter_map(Value::as_float).sum::<f32>() + offset;
        self.recorder.record(inputs.instance());
        Ok(Value::Float(total))
    }
}

/// Returns its multi-input as a list
struct CollectOp;

impl Operator for CollectOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        Ok(Value::List(inputs.pull_multi("values", ctx)?))
    }
}

/// Reports the camera's x translation
struct ProbeOp {
    recorder: Recorder,
}

impl Operator for ProbeOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        self.recorder.record(inputs.instance());
        Ok(Value::Float(ctx.world_to_camera.w_axis.x))
    }
}

/// Pulls `command` once per cell with a narrowed resolution and offset camera
struct GridOp;

impl Operator for GridOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let count = inputs.pull_int("count", ctx)?.max(0);
        let mut cells = Vec::new();
        for i in 0..count {
            let mut scope = ctx.scoped();
            scope.requested_resolution /= 3;
            scope.world_to_camera =
                Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)) * scope.world_to_camera;
            cells.push(inputs.pull("command", &mut scope)?);
        }
        Ok(Value::List(cells))
    }
}

/// Sets a float variable around pulling `command`
struct SetVarOp;

impl Operator for SetVarOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text("key", ctx)?;
        let value = inputs.pull_float("value", ctx)?;
        let mut scope = ctx.scoped();
        scope.set_float_variable(key, value);
        inputs.pull("command", &mut scope)
    }
}

/// Reads a float variable, falling back to `fallback`
struct GetVarOp;

impl Operator for GetVarOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let key = inputs.pull_text("key", ctx)?;
        let fallback = inputs.pull_float("fallback", ctx)?;
        Ok(Value::Float(ctx.float_variable(&key).unwrap_or(fallback)))
    }
}

/// Pulls `first` then `second`
struct PairOp;

impl Operator for PairOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let first = inputs.pull("first", ctx)?;
        let second = inputs.pull("second", ctx)?;
        Ok(Value::List(vec![first, second]))
    }
}

/// Fails while `fail` is set, after narrowing the context
struct FlakyOp {
    recorder: Recorder,
}

impl Operator for FlakyOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        self.recorder.record(inputs.instance());
        let value = inputs.pull_float("value", ctx)?;
        let mut scope = ctx.scoped();
        scope.requested_resolution /= 2;
        scope.set_float_variable("flaky", value);
        if inputs.pull_bool("fail", &mut scope)? {
            return Err(EngineError::unavailable("source offline"));
        }
        Ok(Value::Float(value))
    }
}

fn metadata(
    operator_type: &str,
    inputs: Vec<InputMetadata>,
    outputs: Vec<OutputMetadata>,
) -> OperatorMetadata {
    OperatorMetadata {
        operator_type: operator_type.to_string(),
        category: OperatorCategory::Math,
        label: operator_type.to_string(),
        description: String::new(),
        inputs,
        outputs,
    }
}

fn sum_inputs() -> Vec<InputMetadata> {
    vec![
        InputMetadata::new("values", "Values", ValueType::Float).multiple(),
        InputMetadata::new("offset", "Offset", ValueType::Float).with_default(0.0f32),
    ]
}

pub fn registry(recorder: &Recorder) -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();

    let r = recorder.clone();
    registry.register_fn(
        metadata(SUM, sum_inputs(), vec![OutputMetadata::new("result", "Result", ValueType::Float)]),
        move || Box::new(SumOp { recorder: r.clone() }),
    );
    let r = recorder.clone();
    registry.register_fn(
        metadata(
            SUM_MEMO,
            sum_inputs(),
            vec![OutputMetadata::new("result", "Result", ValueType::Float)
                .with_trigger(TriggerPolicy::Never)],
        ),
        move || Box::new(SumOp { recorder: r.clone() }),
    );
    registry.register_fn(
        metadata(
            COLLECT,
            vec![InputMetadata::new("values", "Values", ValueType::Float).multiple()],
            vec![OutputMetadata::new("result", "Result", ValueType::List)],
        ),
        || Box::new(CollectOp),
    );
    let r = recorder.clone();
    registry.register_fn(
        metadata(PROBE, Vec::new(), vec![OutputMetadata::new("result", "Result", ValueType::Float)]),
        move || Box::new(ProbeOp { recorder: r.clone() }),
    );
    let r = recorder.clone();
    registry.register_fn(
        metadata(
            PROBE_ALWAYS,
            Vec::new(),
            vec![OutputMetadata::new("result", "Result", ValueType::Float).always()],
        ),
        move || Box::new(ProbeOp { recorder: r.clone() }),
    );
    registry.register_fn(
        metadata(
            GRID,
            vec![
                InputMetadata::new("command", "Command", ValueType::Any),
                InputMetadata::new("count", "Count", ValueType::Int).with_default(9i64),
            ],
            vec![OutputMetadata::new("cells", "Cells", ValueType::List).always()],
        ),
        || Box::new(GridOp),
    );
    registry.register_fn(
        metadata(
            SET_VAR,
            vec![
                InputMetadata::new("key", "Key", ValueType::Text).with_default("k"),
                InputMetadata::new("value", "Value", ValueType::Float),
                InputMetadata::new("command", "Command", ValueType::Any),
            ],
            vec![OutputMetadata::new("result", "Result", ValueType::Any)],
        ),
        || Box::new(SetVarOp),
    );
    registry.register_fn(
        metadata(
            GET_VAR,
            vec![
                InputMetadata::new("key", "Key", ValueType::Text).with_default("k"),
                InputMetadata::new("fallback", "Fallback", ValueType::Float),
            ],
            vec![OutputMetadata::new("result", "Result", ValueType::Float).always()],
        ),
        || Box::new(GetVarOp),
    );
    registry.register_fn(
        metadata(
            PAIR,
            vec![
                InputMetadata::new("first", "First", ValueType::Any),
                InputMetadata::new("second", "Second", ValueType::Any),
            ],
            vec![OutputMetadata::new("result", "Result", ValueType::List)],
        ),
        || Box::new(PairOp),
    );
    let r = recorder.clone();
    registry.register_fn(
        metadata(
            FLAKY,
            vec![
                InputMetadata::new("value", "Value", ValueType::Float),
                InputMetadata::new("fail", "Fail", ValueType::Bool),
            ],
            vec![OutputMetadata::new("result", "Result", ValueType::Float)],
        ),
        move || Box::new(FlakyOp { recorder: r.clone() }),
    );

    registry
}

/// Primitive symbol ids of the test operators
pub struct Ops {
    pub sum: SymbolId,
    pub sum_memo: SymbolId,
    pub collect: SymbolId,
    pub probe: SymbolId,
    pub probe_always: SymbolId,
    pub grid: SymbolId,
    pub set_var: SymbolId,
    pub get_var: SymbolId,
    pub pair: SymbolId,
    pub flaky: SymbolId,
}

pub struct Fixture {
    pub engine: Engine,
    pub recorder: Recorder,
    pub ops: Ops,
}

pub fn fixture() -> Fixture {
    init_logging();
    let recorder = Recorder::default();
    let mut engine = Engine::new(SymbolLibrary::new(), registry(&recorder));
    let mut add = |operator_type: &str| engine.add_operator_symbol(operator_type).unwrap();
    let ops = Ops {
        sum: add(SUM),
        sum_memo: add(SUM_MEMO),
        collect: add(COLLECT),
        probe: add(PROBE),
        probe_always: add(PROBE_ALWAYS),
        grid: add(GRID),
        set_var: add(SET_VAR),
        get_var: add(GET_VAR),
        pair: add(PAIR),
        flaky: add(FLAKY),
    };
    Fixture {
        engine,
        recorder,
        ops,
    }
}

pub fn floats(value: &Value) -> Vec<f32> {
    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect()
}
