//! Shared setup for the built-in operator scenarios
#![allow(dead_code)]

use operator_engine::{Engine, SymbolId, SymbolLibrary, Value};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn engine() -> Engine {
    init_logging();
    Engine::new(SymbolLibrary::new(), operator_nodes::builtin_registry())
}

/// Library symbol wrapping one built-in operator
pub fn op(engine: &mut Engine, operator_type: &str) -> SymbolId {
    engine.add_operator_symbol(operator_type).unwrap()
}

pub fn floats(value: &Value) -> Vec<f32> {
    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect()
}
