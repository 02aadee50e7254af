//! Operator Nodes
//!
//! Built-in operators for the operator graph engine. Each operator
//! describes its ports through `OperatorDescriptor` and registers itself
//! at link time, so `OperatorRegistry::with_builtins()` (or
//! [`builtin_registry`]) picks up everything in this crate.
//!
//! # Categories
//!
//! - **Value**: literal scalars and vectors
//! - **Math**: arithmetic over floats and lists
//! - **Context**: time, resolution and transform probes
//! - **Variable**: scoped named float and object variables
//! - **Flow**: subgraphs re-pulled under a modified context
//! - **Transform**: object-space transforms with gizmo support
//! - **Animation**: inline curve sampling
//! - **External**: values polled from host-supplied sources

pub mod animation;
pub mod context;
pub mod external;
pub mod flow;
pub mod math;
pub mod setup;
pub mod transform;
pub mod value;
pub mod variable;

pub use animation::*;
pub use context::*;
pub use external::*;
pub use flow::*;
pub use math::*;
pub use setup::{builtin_registry, setup_extensions};
pub use transform::*;
pub use value::*;
pub use variable::*;

#[cfg(test)]
mod tests {
    use operator_engine::{OperatorCategory, OperatorRegistry};

    #[test]
    fn test_inventory_collects_all_builtins() {
        let registry = OperatorRegistry::with_builtins();
        assert_eq!(registry.all_metadata().len(), 20, "Expected 20 built-in operators");

        for operator_type in [
            "float-value",
            "add",
            "get-time",
            "camera-offset-probe",
            "set-float-variable",
            "get-object-variable",
            "repeat-grid",
            "time-remap",
            "transform",
            "curve-sample",
            "external-value",
        ] {
            assert!(registry.has_operator_type(operator_type), "missing {}", operator_type);
        }
    }

    #[test]
    fn test_every_category_is_populated() {
        let registry = OperatorRegistry::with_builtins();
        let grouped = registry.metadata_by_category();
        for category in [
            OperatorCategory::Value,
            OperatorCategory::Math,
            OperatorCategory::Context,
            OperatorCategory::Variable,
            OperatorCategory::Flow,
            OperatorCategory::Transform,
            OperatorCategory::Animation,
            OperatorCategory::External,
        ] {
            assert!(grouped.contains_key(&category), "no operators in {:?}", category);
        }
    }
}
