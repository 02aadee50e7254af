//! Operator type registry
//!
//! Maps operator type strings to their metadata and a factory producing a
//! fresh [`Operator`] per instance. The registry is an explicit value
//! handed to the engine; nothing is looked up through process-wide state.
//!
//! # Usage
//!
//! ```ignore
//! use operator_engine::OperatorRegistry;
//!
//! let mut registry = OperatorRegistry::with_builtins();
//! registry.register_fn(MyOp::descriptor(), || Box::new(MyOp::default()));
//! let symbol = registry.symbol_for("my-op").unwrap();
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{OperatorFn, OperatorMetadata};
use crate::operator::Operator;
use crate::symbol::Symbol;
use crate::types::OperatorCategory;

/// Creates a fresh operator for one instance
pub type OperatorFactory = Arc<dyn Fn() -> Box<dyn Operator> + Send + Sync>;

struct RegistryEntry {
    metadata: OperatorMetadata,
    factory: OperatorFactory,
}

/// Registry of operator types
///
/// # Composability
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = OperatorRegistry::with_builtins();
/// registry.merge(plugin_registry); // plugin entries win on conflicts
/// ```
pub struct OperatorRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl OperatorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry holding every operator submitted with `inventory::submit!`
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<OperatorFn> {
            let factory = entry.factory;
            registry.register_fn((entry.descriptor)(), factory);
        }
        log::debug!("Collected {} operator types", registry.entries.len());
        registry
    }

    /// Register an operator type, replacing any previous entry
    pub fn register(&mut self, metadata: OperatorMetadata, factory: OperatorFactory) {
        self.entries.insert(
            metadata.operator_type.clone(),
            RegistryEntry { metadata, factory },
        );
    }

    /// Register an operator type from a plain constructor
    pub fn register_fn<F>(&mut self, metadata: OperatorMetadata, factory: F)
    where
        F: Fn() -> Box<dyn Operator> + Send + Sync + 'static,
    {
        self.register(metadata, Arc::new(factory));
    }

    pub fn get_metadata(&self, operator_type: &str) -> Option<&OperatorMetadata> {
        self.entries.get(operator_type).map(|e| &e.metadata)
    }

    pub fn all_metadata(&self) -> Vec<&OperatorMetadata> {
        self.entries.values().map(|e| &e.metadata).collect()
    }

    /// Get metadata grouped by category
    pub fn metadata_by_category(&self) -> HashMap<OperatorCategory, Vec<&OperatorMetadata>> {
        let mut grouped: HashMap<OperatorCategory, Vec<&OperatorMetadata>> = HashMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.metadata.category)
                .or_default()
                .push(&entry.metadata);
        }
        grouped
    }

    /// Fresh operator for one instance
    pub fn create(&self, operator_type: &str) -> Option<Box<dyn Operator>> {
        self.entries.get(operator_type).map(|e| (e.factory)())
    }

    /// Primitive symbol for an operator type (fresh id)
    pub fn symbol_for(&self, operator_type: &str) -> Option<Symbol> {
        self.get_metadata(operator_type).map(OperatorMetadata::to_symbol)
    }

    pub fn has_operator_type(&self, operator_type: &str) -> bool {
        self.entries.contains_key(operator_type)
    }

    /// List all registered operator type strings
    pub fn operator_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` with the same type.
    pub fn merge(&mut self, other: OperatorRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
