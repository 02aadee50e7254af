//! Setup helpers for host applications.
//!
//! Hosts call [`builtin_registry`] once at startup and, if they feed
//! external values into the graph, [`setup_extensions`] on the engine's
//! extension map. Calling into this crate also guarantees its operators
//! are linked in, so `inventory` sees every registration.

use std::sync::Arc;

use operator_engine::{extension_keys, Extensions, OperatorRegistry};

use crate::external::ExternalSources;

/// Registry holding every built-in operator type.
///
/// # Example
///
/// ```ignore
/// let mut engine = Engine::new(library, operator_nodes::builtin_registry());
/// operator_nodes::setup_extensions(engine.extensions_mut(), sources.clone());
/// ```
pub fn builtin_registry() -> OperatorRegistry {
    let registry = OperatorRegistry::with_builtins();
    log::info!("Loaded {} built-in operator types", registry.operator_types().len());
    registry
}

/// Make `sources` readable by `external-value` operators
pub fn setup_extensions(extensions: &mut Extensions, sources: Arc<ExternalSources>) {
    extensions.set(extension_keys::EXTERNAL_SOURCES, sources);
    log::debug!("External sources registered");
}
