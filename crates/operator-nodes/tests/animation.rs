mod common;

use common::{engine, op};
use glam::Vec2;
use operator_engine::{
    EvaluationContext, Keyframe, OutputDefinition, SymbolBuilder, Value, ValueType,
};

fn keys(pairs: &[(f32, f32)]) -> Value {
    Value::List(pairs.iter().map(|(t, v)| Value::Vec2(Vec2::new(*t, *v))).collect())
}

#[test]
fn test_curve_sample_follows_local_time() {
    let mut engine = engine();
    let curve = op(&mut engine, "curve-sample");
    let built = engine
        .register(
            SymbolBuilder::composite("curve")
                .output(OutputDefinition::new("out", ValueType::Float))
                .child("curve", curve)
                .with_override("keys", keys(&[(0.0, 0.0), (2.0, 10.0)]))
                .connect_output(("curve", "value"), "out"),
        )
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();

    let mut at = |t: f64| {
        engine
            .evaluate_output(root, "out", &mut EvaluationContext::at_time(t))
            .unwrap()
    };
    assert_eq!(at(1.0), Value::Float(5.0));
    // Holds the end values outside the keyed range
    assert_eq!(at(-3.0), Value::Float(0.0));
    assert_eq!(at(7.0), Value::Float(10.0));
}

#[test]
fn test_stepped_curve_holds_previous_key() {
    let mut engine = engine();
    let curve = op(&mut engine, "curve-sample");
    let built = engine
        .register(
            SymbolBuilder::composite("stepped")
                .output(OutputDefinition::new("out", ValueType::Float))
                .child("curve", curve)
                .with_override("keys", keys(&[(0.0, 1.0), (2.0, 3.0)]))
                .with_override("stepped", true)
                .connect_output(("curve", "value"), "out"),
        )
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();

    let value = engine
        .evaluate_output(root, "out", &mut EvaluationContext::at_time(1.5))
        .unwrap();
    assert_eq!(value, Value::Float(1.0));
}

#[test]
fn test_curve_sample_under_time_remap() {
    let mut engine = engine();
    let curve = op(&mut engine, "curve-sample");
    let remap = op(&mut engine, "time-remap");
    let built = engine
        .register(
            SymbolBuilder::composite("delayed")
                .output(OutputDefinition::new("out", ValueType::Any))
                .child("curve", curve)
                .with_override("keys", keys(&[(0.0, 0.0), (4.0, 8.0)]))
                .child("remap", remap)
                .with_override("offset", -1.0f32)
                .connect(("curve", "value"), ("remap", "command"))
                .connect_output(("remap", "result"), "out"),
        )
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();

    let value = engine
        .evaluate_output(root, "out", &mut EvaluationContext::at_time(3.0))
        .unwrap();
    assert_eq!(value, Value::Float(4.0));
}

#[test]
fn test_keyframed_float_value_animates() {
    let mut engine = engine();
    let float = op(&mut engine, "float-value");
    let built = engine
        .register(
            SymbolBuilder::composite("animated")
                .output(OutputDefinition::new("out", ValueType::Float))
                .child("float", float)
                .with_override("value", 100.0f32)
                .connect_output(("float", "result"), "out"),
        )
        .unwrap();
    let child = built.child("float").unwrap();
    engine
        .add_keyframe(built.id, child, "value", 0, Keyframe::linear(0.0, 0.0))
        .unwrap();
    engine
        .add_keyframe(built.id, child, "value", 0, Keyframe::linear(4.0, 8.0))
        .unwrap();
    let root = engine.instantiate(built.id).unwrap();

    let mut at = |t: f64| {
        engine
            .evaluate_output(root, "out", &mut EvaluationContext::at_time(t))
            .unwrap()
    };
    assert_eq!(at(1.0), Value::Float(2.0));
    assert_eq!(at(3.0), Value::Float(6.0));
    // Outside the keys the override applies again
    assert_eq!(at(9.0), Value::Float(100.0));
}
