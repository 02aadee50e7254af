//! External operators
//!
//! Values supplied by host collaborators rather than by the graph.

mod external_value;
mod sources;

pub use external_value::ExternalValueOp;
pub use sources::{ExternalSources, SourceState};
