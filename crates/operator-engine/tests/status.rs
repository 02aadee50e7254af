mod common;

use std::sync::Arc;

use common::{fixture, registry, Fixture, Recorder, SUM};
use glam::UVec2;
use operator_engine::{
    Engine, EngineConfig, EngineEvent, EvaluationContext, InstanceId, NodeStatus,
    OutputDefinition, SlotId, SymbolBuilder, SymbolLibrary, Value, ValueType, VecEventSink,
};

struct FlakyScene {
    engine: Engine,
    sink: Arc<VecEventSink>,
    recorder: Recorder,
    root: InstanceId,
    flaky: InstanceId,
    fail: SlotId,
    value: SlotId,
}

fn flaky_scene() -> FlakyScene {
    let Fixture {
        engine,
        recorder,
        ops,
    } = fixture();
    let sink = Arc::new(VecEventSink::new());
    let mut engine = engine.with_event_sink(sink.clone());
    let built = engine
        .register(
            SymbolBuilder::composite("flaky")
                .output(OutputDefinition::new("out", ValueType::Float))
                .child("flaky", ops.flaky)
                .with_override("value", 3.0f32)
                .connect_output(("flaky", "result"), "out"),
        )
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();
    let flaky = engine
        .child_instance(root, built.child("flaky").unwrap())
        .unwrap();
    let fail = engine.slot_of_input(flaky, "fail").unwrap();
    let value = engine.slot_of_input(flaky, "value").unwrap();
    FlakyScene {
        engine,
        sink,
        recorder,
        root,
        flaky,
        fail,
        value,
    }
}

impl FlakyScene {
    fn eval(&mut self, ctx: &mut EvaluationContext) -> Value {
        self.engine.evaluate_output(self.root, "out", ctx).unwrap()
    }

    fn failures(&self) -> usize {
        self.sink
            .events()
            .iter()
            .filter(|e| matches!(e, EngineEvent::NodeFailed { .. }))
            .count()
    }

    fn recoveries(&self) -> usize {
        self.sink
            .events()
            .iter()
            .filter(|e| matches!(e, EngineEvent::NodeRecovered { .. }))
            .count()
    }
}

#[test]
fn test_failed_compute_keeps_last_good_value() {
    let mut s = flaky_scene();
    let mut ctx = EvaluationContext::new();
    assert_eq!(s.eval(&mut ctx), Value::Float(3.0));
    assert_eq!(s.engine.node_status(s.flaky), Some(NodeStatus::Ok));

    s.engine.set_literal(s.fail, true).unwrap();
    s.engine.set_literal(s.value, 8.0f32).unwrap();

    assert_eq!(s.eval(&mut ctx), Value::Float(3.0));
    assert!(matches!(
        s.engine.node_status(s.flaky),
        Some(NodeStatus::Failed(ref message)) if message.contains("source offline")
    ));
    assert_eq!(s.engine.cache_stats().failed_nodes, 1);
}

#[test]
fn test_failure_restores_context() {
    let mut s = flaky_scene();
    s.engine.set_literal(s.fail, true).unwrap();
    let mut ctx = EvaluationContext::new().with_resolution(UVec2::new(640, 480));

    s.eval(&mut ctx);

    assert_eq!(ctx.requested_resolution, UVec2::new(640, 480));
    assert_eq!(ctx.float_variable("flaky"), None);
}

#[test]
fn test_repeated_failure_reports_once() {
    let mut s = flaky_scene();
    let mut ctx = EvaluationContext::new();
    s.engine.set_literal(s.fail, true).unwrap();

    s.eval(&mut ctx);
    assert_eq!(s.failures(), 1);

    // Failures are sticky until something upstream changes
    s.eval(&mut ctx);
    assert_eq!(s.recorder.count(s.flaky), 1);

    let out = s.engine.slot_of_output(s.flaky, "result").unwrap();
    s.engine.invalidate(out);
    s.eval(&mut ctx);
    assert_eq!(s.recorder.count(s.flaky), 2);
    assert_eq!(s.failures(), 1);
}

#[test]
fn test_recovery_is_reported() {
    let mut s = flaky_scene();
    let mut ctx = EvaluationContext::new();
    s.engine.set_literal(s.fail, true).unwrap();
    s.eval(&mut ctx);

    s.engine.set_literal(s.value, 5.0f32).unwrap();
    s.engine.set_literal(s.fail, false).unwrap();

    assert_eq!(s.eval(&mut ctx), Value::Float(5.0));
    assert_eq!(s.recoveries(), 1);
    assert_eq!(s.engine.node_status(s.flaky), Some(NodeStatus::Ok));
    assert_eq!(s.engine.cache_stats().failed_nodes, 0);
}

#[test]
fn test_frame_event_counts_recomputes() {
    let mut s = flaky_scene();
    s.eval(&mut EvaluationContext::at_time(2.0));

    let frames: Vec<_> = s
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::FrameEvaluated {
                time, recomputed, ..
            } => Some((time, recomputed)),
            _ => None,
        })
        .collect();
    assert_eq!(frames, vec![(2.0, 1)]);
}

#[test]
fn test_recompute_events_follow_config() {
    let recorder = Recorder::default();
    let config = EngineConfig {
        emit_recompute_events: true,
        ..EngineConfig::default()
    };
    let sink = Arc::new(VecEventSink::new());
    let mut engine = Engine::with_config(SymbolLibrary::new(), registry(&recorder), config)
        .with_event_sink(sink.clone());
    let sum = engine.add_operator_symbol(SUM).unwrap();
    let built = engine
        .register(
            SymbolBuilder::composite("scene")
                .output(OutputDefinition::new("out", ValueType::Float))
                .child("a", sum)
                .connect_output(("a", "result"), "out"),
        )
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();

    engine
        .evaluate_output(root, "out", &mut EvaluationContext::new())
        .unwrap();

    let ports: Vec<String> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::SlotRecomputed { port, .. } => Some(port),
            _ => None,
        })
        .collect();
    assert_eq!(ports, vec!["result".to_string()]);
}
