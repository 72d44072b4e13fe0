//! The table-column capability trait and its in-memory implementation.

use vistab_result::{Error, Result};

use crate::types::{RowId, Shape};

/// Capabilities of one storage-engine column, as consumed by the planner.
///
/// A column holds one cell per row; a cell is a scalar or an N-dimensional
/// array. Shapes are reported innermost dimension first and never include
/// the row dimension. Implementations are expected to answer these queries
/// synchronously from locally consistent state — the caller is responsible
/// for holding whatever read lock the engine requires.
pub trait TableColumn {
    fn name(&self) -> &str;

    /// Total number of rows in the column.
    fn nrow(&self) -> RowId;

    /// True if the column declares one cell shape for every row.
    fn is_fixed_shape(&self) -> bool;

    /// Number of cell dimensions, excluding the row dimension.
    fn ndim(&self) -> usize;

    /// The declared cell shape. `None` for variable-shape columns.
    fn column_shape(&self) -> Option<Shape>;

    /// Cell shape of one row. Fails for out-of-bounds or undefined rows.
    fn row_shape(&self, row: RowId) -> Result<Shape>;

    /// True if the row holds a cell. Fixed-shape columns define every row;
    /// variable-shape columns may leave rows unwritten.
    fn is_defined(&self, row: RowId) -> bool;
}

#[derive(Debug, Clone)]
enum CellLayout {
    Fixed { shape: Shape, nrow: RowId },
    Variable { ndim: usize, row_shapes: Vec<Option<Shape>> },
}

/// In-memory [`TableColumn`] carrying shape metadata only.
///
/// The planner never reads cell payloads, so a column is fully described
/// by its name and layout. Used by tests and benchmarks the way the
/// storage engine's real columns are used in production.
///
/// # Examples
///
/// ```
/// use vistab_storage::{MemColumn, TableColumn};
///
/// let fixed = MemColumn::fixed("DATA", 10, vec![2, 4]);
/// assert!(fixed.is_fixed_shape());
/// assert_eq!(fixed.row_shape(3).unwrap(), vec![2, 4]);
///
/// let var = MemColumn::variable("VAR_DATA", 2, vec![vec![3, 2], vec![4, 1]]);
/// assert!(!var.is_fixed_shape());
/// assert_eq!(var.row_shape(1).unwrap(), vec![4, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct MemColumn {
    name: String,
    layout: CellLayout,
}

impl MemColumn {
    /// A column with the same declared cell shape for every row.
    pub fn fixed(name: impl Into<String>, nrow: RowId, shape: Shape) -> Self {
        Self {
            name: name.into(),
            layout: CellLayout::Fixed { shape, nrow },
        }
    }

    /// A variable-shape column with one explicit shape per row.
    pub fn variable(name: impl Into<String>, ndim: usize, row_shapes: Vec<Shape>) -> Self {
        Self::variable_with_undefined(name, ndim, row_shapes.into_iter().map(Some).collect())
    }

    /// A variable-shape column where `None` entries are unwritten rows.
    pub fn variable_with_undefined(
        name: impl Into<String>,
        ndim: usize,
        row_shapes: Vec<Option<Shape>>,
    ) -> Self {
        Self {
            name: name.into(),
            layout: CellLayout::Variable { ndim, row_shapes },
        }
    }
}

impl TableColumn for MemColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn nrow(&self) -> RowId {
        match &self.layout {
            CellLayout::Fixed { nrow, .. } => *nrow,
            CellLayout::Variable { row_shapes, .. } => row_shapes.len() as RowId,
        }
    }

    fn is_fixed_shape(&self) -> bool {
        matches!(self.layout, CellLayout::Fixed { .. })
    }

    fn ndim(&self) -> usize {
        match &self.layout {
            CellLayout::Fixed { shape, .. } => shape.len(),
            CellLayout::Variable { ndim, .. } => *ndim,
        }
    }

    fn column_shape(&self) -> Option<Shape> {
        match &self.layout {
            CellLayout::Fixed { shape, .. } => Some(shape.clone()),
            CellLayout::Variable { .. } => None,
        }
    }

    fn row_shape(&self, row: RowId) -> Result<Shape> {
        match &self.layout {
            CellLayout::Fixed { shape, nrow } => {
                if row >= *nrow {
                    return Err(Error::InvalidArgumentError(format!(
                        "row {row} out of bounds in column {}",
                        self.name
                    )));
                }
                Ok(shape.clone())
            }
            CellLayout::Variable { row_shapes, .. } => match row_shapes.get(row as usize) {
                Some(Some(shape)) => Ok(shape.clone()),
                Some(None) => Err(Error::InvalidArgumentError(format!(
                    "row {row} in column {} is undefined",
                    self.name
                ))),
                None => Err(Error::InvalidArgumentError(format!(
                    "row {row} out of bounds in column {}",
                    self.name
                ))),
            },
        }
    }

    fn is_defined(&self, row: RowId) -> bool {
        match &self.layout {
            CellLayout::Fixed { nrow, .. } => row < *nrow,
            CellLayout::Variable { row_shapes, .. } => {
                matches!(row_shapes.get(row as usize), Some(Some(_)))
            }
        }
    }
}
