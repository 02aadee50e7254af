//! Flow operators
//!
//! Operators that pull a subgraph under a modified context, possibly more
//! than once per frame.

mod repeat_grid;
mod time_remap;

pub use repeat_grid::{grid_cells, GridCell, RepeatGridOp, CELL_INDEX_VARIABLE};
pub use time_remap::{remap_time, TimeRemapOp};
