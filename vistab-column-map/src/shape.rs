//! Shape resolution for fixed and variable columns under a selection.

use vistab_result::{Error, Result};
use vistab_storage::TableColumn;
use vistab_storage::types::{ColumnSelection, RowId, RowIds, Shape};

/// Align a Fortran-ordered dimension with its selection entry.
///
/// Selections may cover fewer dimensions than the column has; they are
/// right-aligned against the dimension list, so dimension `dim` maps to
/// selection entry `dim + sdims - ndims`. `None` means the selection does
/// not constrain that dimension.
#[inline]
pub(crate) fn select_dim(dim: usize, sdims: usize, ndims: usize) -> Option<usize> {
    (dim + sdims).checked_sub(ndims)
}

/// Per-row shape data for a variable-shape column under a selection.
///
/// Collects the clipped shape of every selected row, rejects columns whose
/// per-row dimensionality varies, and precomputes the running products
/// used to address each row's cell in a flat output buffer. Detects the
/// case where a column declared variable carries the same shape in every
/// row, which re-enables multi-row rectangular reads.
#[derive(Debug)]
pub struct VariableShapeData {
    row_shapes: Vec<Shape>,
    // offsets[dim][row] is the inclusive running product
    // row_shapes[row][0] * .. * row_shapes[row][dim].
    offsets: Vec<Vec<u64>>,
    ndim: usize,
    shape: Option<Shape>,
}

impl VariableShapeData {
    /// Clip a row's shape to the selection.
    ///
    /// Every selected index must lie within the original extent of its
    /// dimension; the clipped extent becomes the selection's length. With
    /// no selection beyond the row dimension the shape passes through
    /// untouched.
    fn clip_shape(shape: Shape, selection: &[RowIds]) -> Result<Shape> {
        if selection.len() <= 1 {
            return Ok(shape);
        }

        let mut clipped = shape;

        for dim in 0..clipped.len() {
            if let Some(sdim) = select_dim(dim, selection.len(), clipped.len() + 1)
                && !selection[sdim].is_empty()
            {
                for &i in &selection[sdim] {
                    if i >= clipped[dim] {
                        return Err(Error::InvalidArgumentError(format!(
                            "Selection index {i} exceeds dimension {dim} of shape {clipped:?}"
                        )));
                    }
                }

                clipped[dim] = selection[sdim].len() as u64;
            }
        }

        Ok(clipped)
    }

    /// Gather and validate the shapes of all selected rows.
    pub(crate) fn make<C: TableColumn>(column: &C, selection: &[RowIds]) -> Result<Self> {
        debug_assert!(!column.is_fixed_shape());

        // The row dimension is last in Fortran ordering.
        let row_selection = selection.last().filter(|ids| !ids.is_empty());
        let target_rows: Vec<RowId> = match row_selection {
            Some(ids) => ids.clone(),
            None => (0..column.nrow()).collect(),
        };

        let mut row_shapes: Vec<Shape> = Vec::with_capacity(target_rows.len());
        let mut fixed_shape = true;
        let mut fixed_dims = true;

        for &row in &target_rows {
            if !column.is_defined(row) {
                return Err(Error::NotImplemented(format!(
                    "Row {row} in column {} is not defined",
                    column.name()
                )));
            }

            let shape = Self::clip_shape(column.row_shape(row)?, selection)?;
            if let Some(first) = row_shapes.first() {
                fixed_shape = fixed_shape && &shape == first;
                fixed_dims = fixed_dims && shape.len() == first.len();
            }
            row_shapes.push(shape);
        }

        // Flat output buffers cannot hold rows of differing dimensionality.
        if !fixed_dims {
            return Err(Error::NotImplemented(format!(
                "Column {} dimensions vary per row",
                column.name()
            )));
        }

        let nrow = row_shapes.len();
        let ndim = row_shapes
            .first()
            .map(|shape| shape.len())
            .unwrap_or_else(|| column.ndim());

        let mut offsets = vec![vec![0u64; nrow]; ndim];
        for (r, shape) in row_shapes.iter().enumerate() {
            let mut product = 1u64;
            for (dim, offsets_dim) in offsets.iter_mut().enumerate() {
                product *= shape[dim];
                offsets_dim[r] = product;
            }
        }

        let shape = if fixed_shape {
            row_shapes.first().cloned()
        } else {
            None
        };

        Ok(Self {
            row_shapes,
            offsets,
            ndim,
            shape,
        })
    }

    /// True if every selected row carries the same shape.
    #[inline]
    pub fn is_actually_fixed(&self) -> bool {
        self.shape.is_some()
    }

    /// Number of dimensions, excluding row.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    #[inline]
    pub fn row_shapes(&self) -> &[Shape] {
        &self.row_shapes
    }

    #[inline]
    pub(crate) fn offsets(&self) -> &[Vec<u64>] {
        &self.offsets
    }

    #[inline]
    pub(crate) fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }
}

#[derive(Debug)]
enum ShapeInfo {
    /// The column declares one shape for all rows.
    Fixed,
    /// Shapes were gathered per row; they may still agree in practice.
    Variable(VariableShapeData),
}

/// Uniform shape queries over fixed and variable columns.
///
/// Owns the (already Fortran-ordered) selection so every later query is
/// answered from immutable local state.
#[derive(Debug)]
pub struct ShapeProvider<'a, C: TableColumn> {
    column: &'a C,
    selection: ColumnSelection,
    info: ShapeInfo,
}

impl<'a, C: TableColumn> ShapeProvider<'a, C> {
    pub(crate) fn make(column: &'a C, selection: ColumnSelection) -> Result<Self> {
        let info = if column.is_fixed_shape() {
            ShapeInfo::Fixed
        } else {
            ShapeInfo::Variable(VariableShapeData::make(column, &selection)?)
        };

        Ok(Self {
            column,
            selection,
            info,
        })
    }

    /// True if the column is declared as having a fixed shape.
    #[inline]
    pub fn is_definitely_fixed(&self) -> bool {
        matches!(self.info, ShapeInfo::Fixed)
    }

    /// True if the column is declared as having a varying shape.
    #[inline]
    pub fn is_varying(&self) -> bool {
        !self.is_definitely_fixed()
    }

    /// True if the column has a fixed shape in practice.
    #[inline]
    pub fn is_actually_fixed(&self) -> bool {
        match &self.info {
            ShapeInfo::Fixed => true,
            ShapeInfo::Variable(var) => var.is_actually_fixed(),
        }
    }

    /// Number of dimensions, including row.
    pub fn ndim(&self) -> usize {
        let cell_dims = match &self.info {
            ShapeInfo::Fixed => self.column.ndim(),
            ShapeInfo::Variable(var) => var.ndim(),
        };
        cell_dims + 1
    }

    #[inline]
    pub fn row_dim(&self) -> usize {
        self.ndim() - 1
    }

    /// Size of the given dimension under the selection.
    ///
    /// A selected dimension takes its size from the selection length.
    /// Otherwise the size comes from the column shape information, which
    /// only exists for the row dimension, declared-fixed columns, and
    /// variable columns whose rows agree in practice.
    pub fn dim_size(&self, dim: usize) -> Result<u64> {
        if let Some(sdim) = select_dim(dim, self.selection.len(), self.ndim())
            && !self.selection[sdim].is_empty()
        {
            return Ok(self.selection[sdim].len() as u64);
        }

        debug_assert!(dim < self.ndim());

        if dim == self.row_dim() {
            return Ok(self.column.nrow());
        }

        match &self.info {
            ShapeInfo::Fixed => self
                .column
                .column_shape()
                .and_then(|shape| shape.get(dim).copied())
                .ok_or_else(|| {
                    Error::Internal(format!(
                        "fixed column {} reports no shape for dimension {dim}",
                        self.column.name()
                    ))
                }),
            ShapeInfo::Variable(var) => match var.shape() {
                // The column is marked variable but the row shapes agree.
                Some(shape) => Ok(shape[dim]),
                None => Err(Error::IndexError(format!(
                    "Dimension {dim} in column {} is not fixed",
                    self.column.name()
                ))),
            },
        }
    }

    /// Size of a non-row dimension for one selected row position.
    ///
    /// Only meaningful for varying columns; `row` indexes the gathered
    /// row shapes, not the table.
    pub fn row_dim_size(&self, row: RowId, dim: usize) -> u64 {
        debug_assert!(self.is_varying());
        debug_assert!(dim < self.row_dim());
        match &self.info {
            ShapeInfo::Variable(var) => var.row_shapes()[row as usize][dim],
            ShapeInfo::Fixed => unreachable!("row_dim_size queried on a fixed-shape column"),
        }
    }

    #[inline]
    pub(crate) fn selection(&self) -> &[RowIds] {
        &self.selection
    }

    #[inline]
    pub(crate) fn var_data(&self) -> Option<&VariableShapeData> {
        match &self.info {
            ShapeInfo::Variable(var) => Some(var),
            ShapeInfo::Fixed => None,
        }
    }

    #[inline]
    pub(crate) fn column_name(&self) -> &str {
        self.column.name()
    }
}
