//! Structural validation of symbol libraries
//!
//! Two different cycle checks live here. Template containment (a symbol
//! placing itself, directly or through other symbols) is a depth-first
//! reachability walk over the symbol reference graph. Connection feedback
//! inside one composite is detected with Kahn's algorithm over its child
//! placements. Neither is related to the visited set used while
//! propagating dirty flags at runtime.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::library::SymbolLibrary;
use crate::registry::OperatorRegistry;
use crate::symbol::{Endpoint, Symbol};
use crate::types::{ChildId, SymbolId};

/// A problem found while validating a library
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A symbol contains itself through its placements
    CyclicContainment { symbol: SymbolId },
    /// A composite's connections form a feedback loop
    CyclicConnections { symbol: SymbolId },
    /// A placement references a symbol missing from the library
    UnknownChildSymbol { symbol: SymbolId, child: ChildId },
    /// A connection references a missing placement or port
    DanglingConnection { symbol: SymbolId, port: String },
    /// A connection joins incompatible value types
    IncompatibleConnection {
        symbol: SymbolId,
        source_port: String,
        target_port: String,
    },
    /// A simple input has more than one incoming connection
    DuplicateConnection { symbol: SymbolId, port: String },
    /// A primitive symbol names an operator the registry does not know
    UnknownOperatorType {
        symbol: SymbolId,
        operator_type: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclicContainment { symbol } => {
                write!(f, "Symbol '{}' contains itself", symbol)
            }
            Self::CyclicConnections { symbol } => {
                write!(f, "Connections in symbol '{}' form a cycle", symbol)
            }
            Self::UnknownChildSymbol { symbol, child } => {
                write!(
                    f,
                    "Placement '{}' in symbol '{}' references an unknown symbol",
                    child, symbol
                )
            }
            Self::DanglingConnection { symbol, port } => {
                write!(
                    f,
                    "Connection in symbol '{}' references unknown port '{}'",
                    symbol, port
                )
            }
            Self::IncompatibleConnection {
                symbol,
                source_port,
                target_port,
            } => write!(
                f,
                "Connection '{}' -> '{}' in symbol '{}' joins incompatible types",
                source_port, target_port, symbol
            ),
            Self::DuplicateConnection { symbol, port } => {
                write!(
                    f,
                    "Input '{}' in symbol '{}' has more than one connection",
                    port, symbol
                )
            }
            Self::UnknownOperatorType {
                symbol,
                operator_type,
            } => write!(
                f,
                "Symbol '{}' uses unknown operator type '{}'",
                symbol, operator_type
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate every symbol in a library.
///
/// Returns all errors found, not just the first. Pass a registry to also
/// check primitive operator types.
pub fn validate_library(
    library: &SymbolLibrary,
    registry: Option<&OperatorRegistry>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for symbol in library.symbols() {
        validate_symbol(library, symbol, registry, &mut errors);
    }
    errors
}

fn validate_symbol(
    library: &SymbolLibrary,
    symbol: &Symbol,
    registry: Option<&OperatorRegistry>,
    errors: &mut Vec<ValidationError>,
) {
    if let (Some(operator_type), Some(reg)) = (&symbol.operator_type, registry) {
        if !reg.has_operator_type(operator_type) {
            errors.push(ValidationError::UnknownOperatorType {
                symbol: symbol.id,
                operator_type: operator_type.clone(),
            });
        }
    }

    for child in &symbol.children {
        if library.symbol(child.symbol_id).is_none() {
            errors.push(ValidationError::UnknownChildSymbol {
                symbol: symbol.id,
                child: child.id,
            });
        }
    }

    if symbol
        .children
        .iter()
        .any(|c| contains_transitively(library, c.symbol_id, symbol.id))
    {
        errors.push(ValidationError::CyclicContainment { symbol: symbol.id });
    }

    validate_connections(library, symbol, errors);

    if has_connection_cycle(symbol) {
        errors.push(ValidationError::CyclicConnections { symbol: symbol.id });
    }
}

fn validate_connections(library: &SymbolLibrary, symbol: &Symbol, errors: &mut Vec<ValidationError>) {
    let mut simple_targets: HashSet<&Endpoint> = HashSet::new();

    for connection in &symbol.connections {
        let source = library.source_port(symbol, &connection.source);
        let target = library.target_port(symbol, &connection.target);
        let (Some(source), Some(target)) = (source, target) else {
            let port = if source.is_none() {
                &connection.source.port
            } else {
                &connection.target.port
            };
            errors.push(ValidationError::DanglingConnection {
                symbol: symbol.id,
                port: port.clone(),
            });
            continue;
        };

        if !source.value_type.is_compatible_with(&target.value_type) {
            errors.push(ValidationError::IncompatibleConnection {
                symbol: symbol.id,
                source_port: connection.source.port.clone(),
                target_port: connection.target.port.clone(),
            });
        }

        if !target.multi_input && !simple_targets.insert(&connection.target) {
            errors.push(ValidationError::DuplicateConnection {
                symbol: symbol.id,
                port: connection.target.port.clone(),
            });
        }
    }
}

/// True if `container` places `target`, directly or through nested symbols.
///
/// A symbol trivially contains itself.
pub fn contains_transitively(library: &SymbolLibrary, container: SymbolId, target: SymbolId) -> bool {
    let mut visited: HashSet<SymbolId> = HashSet::new();
    let mut stack = vec![container];

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(symbol) = library.symbol(current) {
            stack.extend(symbol.children.iter().map(|c| c.symbol_id));
        }
    }
    false
}

/// Detect feedback loops between child placements using Kahn's algorithm
pub fn has_connection_cycle(symbol: &Symbol) -> bool {
    let mut in_degree: HashMap<ChildId, usize> =
        symbol.children.iter().map(|c| (c.id, 0)).collect();
    let edges: Vec<(ChildId, ChildId)> = symbol
        .connections
        .iter()
        .filter_map(|c| Some((c.source.child?, c.target.child?)))
        .collect();

    for (_, target) in &edges {
        *in_degree.entry(*target).or_insert(0) += 1;
    }

    let mut queue: VecDeque<ChildId> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(child) = queue.pop_front() {
        visited += 1;
        for (source, target) in &edges {
            if *source == child {
                if let Some(deg) = in_degree.get_mut(target) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*target);
                    }
                }
            }
        }
    }

    visited < in_degree.len()
}

/// True if a wire from `source` to `target` would close a loop, i.e.
/// `source` is already reachable downstream of `target`.
pub fn would_create_feedback(symbol: &Symbol, source: ChildId, target: ChildId) -> bool {
    if source == target {
        return true;
    }
    let mut visited: HashSet<ChildId> = HashSet::new();
    let mut stack = vec![target];

    while let Some(current) = stack.pop() {
        if current == source {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        stack.extend(
            symbol
                .connections
                .iter()
                .filter(|c| c.source.child == Some(current))
                .filter_map(|c| c.target.child),
        );
    }
    false
}
