//! Repeat Grid Operator
//!
//! Pulls the subgraph on its `command` input once per grid cell. Each pull
//! sees a narrowed resolution, a camera shifted to the cell and the cell's
//! index bound as a float variable. The results are collected in row-major
//! order.
//!
//! Only subgraph slots declared `AlwaysPerPull` observe the per-cell
//! context; memoized ones answer every cell with their first value.

use glam::{Mat4, UVec2, Vec3};
use operator_engine::{
    EvaluationContext, InputMetadata, Inputs, Operator, OperatorCategory, OperatorDescriptor,
    OperatorMetadata, OutputMetadata, Result, Value, ValueType,
};

/// Float variable holding the current cell index
pub const CELL_INDEX_VARIABLE: &str = "cell-index";

/// One grid cell as seen by the pulled subgraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub index: usize,
    /// Camera translation relative to the grid centre
    pub offset: Vec3,
    pub resolution: UVec2,
}

/// Lay out `columns` x `rows` cells centred on the origin.
///
/// Each cell gets an equal share of `resolution`, never less than 1x1.
pub fn grid_cells(columns: u32, rows: u32, spacing: f32, resolution: UVec2) -> Vec<GridCell> {
    if columns == 0 || rows == 0 {
        return Vec::new();
    }
    let cell_resolution = (resolution / UVec2::new(columns, rows)).max(UVec2::ONE);
    let centre_x = (columns - 1) as f32 / 2.0;
    let centre_y = (rows - 1) as f32 / 2.0;

    (0..rows)
        .flat_map(|row| (0..columns).map(move |column| (row, column)))
        .enumerate()
        .map(|(index, (row, column))| GridCell {
            index,
            offset: Vec3::new(
                (column as f32 - centre_x) * spacing,
                (centre_y - row as f32) * spacing,
                0.0,
            ),
            resolution: cell_resolution,
        })
        .collect()
}

/// Repeat Grid Operator
///
/// # Inputs
/// - `command` - Subgraph evaluated per cell
/// - `columns`, `rows` - Grid size (default 3x3; negative counts as 0)
/// - `spacing` - Distance between cell centres (default 1.0)
///
/// # Outputs
/// - `cells` - List of per-cell results
#[derive(Debug, Default)]
pub struct RepeatGridOp;

impl RepeatGridOp {
    pub const PORT_COMMAND: &'static str = "command";
    pub const PORT_COLUMNS: &'static str = "columns";
    pub const PORT_ROWS: &'static str = "rows";
    pub const PORT_SPACING: &'static str = "spacing";
    pub const PORT_CELLS: &'static str = "cells";
}

impl OperatorDescriptor for RepeatGridOp {
    fn descriptor() -> OperatorMetadata {
        OperatorMetadata {
            operator_type: "repeat-grid".to_string(),
            category: OperatorCategory::Flow,
            label: "Repeat Grid".to_string(),
            description: "Evaluates a subgraph once per grid cell".to_string(),
            inputs: vec![
                InputMetadata::new(Self::PORT_COMMAND, "Command", ValueType::Any),
                InputMetadata::new(Self::PORT_COLUMNS, "Columns", ValueType::Int).with_default(3i64),
                InputMetadata::new(Self::PORT_ROWS, "Rows", ValueType::Int).with_default(3i64),
                InputMetadata::new(Self::PORT_SPACING, "Spacing", ValueType::Float)
                    .with_default(1.0f32),
            ],
            outputs: vec![OutputMetadata::new(Self::PORT_CELLS, "Cells", ValueType::List).always()],
        }
    }
}

inventory::submit!(operator_engine::OperatorFn {
    descriptor: RepeatGridOp::descriptor,
    factory: || Box::new(RepeatGridOp),
});

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

impl Operator for RepeatGridOp {
    fn compute(
        &mut self,
        _output: &str,
        inputs: &mut Inputs<'_, '_>,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let columns = clamp_count(inputs.pull_int(Self::PORT_COLUMNS, ctx)?);
        let rows = clamp_count(inputs.pull_int(Self::PORT_ROWS, ctx)?);
        let spacing = inputs.pull_float(Self::PORT_SPACING, ctx)?;

        let cells = grid_cells(columns, rows, spacing, ctx.requested_resolution);
        log::debug!("RepeatGridOp: evaluating {} cells", cells.len());

        let mut results = Vec::with_capacity(cells.len());
        for cell in cells {
            let mut scope = ctx.scoped();
            scope.requested_resolution = cell.resolution;
            scope.world_to_camera = Mat4::from_translation(cell.offset) * scope.world_to_camera;
            scope.set_float_variable(CELL_INDEX_VARIABLE, cell.index as f32);
            results.push(inputs.pull(Self::PORT_COMMAND, &mut scope)?);
        }
        Ok(Value::List(results))
    }
}
