mod common;

use std::sync::Arc;

use common::{init_logging, op};
use operator_engine::{
    Engine, EngineEvent, EvaluationContext, InstanceId, NodeStatus, OutputDefinition,
    PortOptionsQuery, SymbolBuilder, SymbolLibrary, Value, ValueType, VecEventSink,
};
use operator_nodes::{builtin_registry, setup_extensions, ExternalSources};

struct Device {
    engine: Engine,
    sources: Arc<ExternalSources>,
    events: Arc<VecEventSink>,
    root: InstanceId,
    reader: InstanceId,
}

impl Device {
    fn new() -> Self {
        init_logging();
        let events = Arc::new(VecEventSink::new());
        let sources = Arc::new(ExternalSources::new());
        let mut engine = Engine::new(SymbolLibrary::new(), builtin_registry())
            .with_event_sink(events.clone());
        setup_extensions(engine.extensions_mut(), sources.clone());

        let external = op(&mut engine, "external-value");
        let built = engine
            .register(
                SymbolBuilder::composite("device")
                    .output(OutputDefinition::new("out", ValueType::Any))
                    .child("reader", external)
                    .with_override("source", "knob")
                    .connect_output(("reader", "value"), "out"),
            )
            .unwrap();
        let root = engine.instantiate(built.id).unwrap();
        let reader = engine
            .child_instance(root, built.child("reader").unwrap())
            .unwrap();
        Self {
            engine,
            sources,
            events,
            root,
            reader,
        }
    }

    fn read(&mut self) -> Value {
        self.engine
            .evaluate_output(self.root, "out", &mut EvaluationContext::at_time(0.0))
            .unwrap()
    }

    fn status(&self) -> NodeStatus {
        self.engine.node_status(self.reader).unwrap()
    }

    fn failures(&self) -> usize {
        self.events
            .events()
            .iter()
            .filter(|e| matches!(e, EngineEvent::NodeFailed { .. }))
            .count()
    }

    fn recoveries(&self) -> usize {
        self.events
            .events()
            .iter()
            .filter(|e| matches!(e, EngineEvent::NodeRecovered { .. }))
            .count()
    }
}

#[test]
fn test_live_value_is_polled_every_frame() {
    let mut device = Device::new();
    device.sources.publish("knob", 0.25f32);
    assert_eq!(device.read(), Value::Float(0.25));

    device.sources.publish("knob", 0.75f32);
    assert_eq!(device.read(), Value::Float(0.75));
    assert_eq!(device.status(), NodeStatus::Ok);
}

#[test]
fn test_offline_source_keeps_last_value_until_recovery() {
    let mut device = Device::new();
    device.sources.publish("knob", 0.5f32);
    device.read();

    device.sources.mark_offline("knob", "unplugged");
    assert_eq!(device.read(), Value::Float(0.5));
    assert_eq!(device.read(), Value::Float(0.5));
    assert!(device.status().is_failed());
    assert_eq!(device.failures(), 1);
    assert_eq!(device.engine.cache_stats().failed_nodes, 1);

    device.sources.publish("knob", 0.9f32);
    assert_eq!(device.read(), Value::Float(0.9));
    assert_eq!(device.status(), NodeStatus::Ok);
    assert_eq!(device.recoveries(), 1);
}

#[test]
fn test_stale_source_reports_warning() {
    let mut device = Device::new();
    device.sources.publish("knob", 3i64);
    device.read();
    device.sources.mark_stale("knob");

    assert_eq!(device.read(), Value::Int(3));
    assert!(matches!(device.status(), NodeStatus::Warning(_)));
    assert_eq!(device.failures(), 0);
}

#[test]
fn test_unknown_source_fails() {
    let mut device = Device::new();
    device.read();
    assert!(device.status().is_failed());
    assert_eq!(device.failures(), 1);
}

#[test]
fn test_source_dropdown_lists_published_names() {
    let mut device = Device::new();
    device.sources.publish("knob", 1.0f32);
    device.sources.publish("fader", 2.0f32);
    device.read();

    let options = device
        .engine
        .dropdown_options(device.reader, "source", &PortOptionsQuery::default())
        .unwrap();
    let labels: Vec<&str> = options.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["fader", "knob"]);
}
