//! Disk-to-memory range planning and iteration for one column selection.

use vistab_result::{Error, Result};
use vistab_storage::TableColumn;
use vistab_storage::types::{ColumnSelection, InputOrder, RowId, Shape, Slicer};

use crate::shape::{ShapeProvider, select_dim};

/// One disk index paired with its position in the user's selection.
///
/// After map construction the `disk` values are sorted ascending while
/// `mem` still records where each index originally appeared, so consumers
/// can restore user order when scattering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdMap {
    pub disk: RowId,
    pub mem: RowId,
}

/// Classification of a [`Range`] along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// `[start, end)` are positions into this dimension's [`ColumnMap`];
    /// the mapped disk indices are contiguous by construction.
    Map,
    /// `[start, end)` are direct disk indices.
    Free,
    /// Placeholder for a dimension whose extent is only knowable per row;
    /// resolved against the current row's shape during iteration.
    Unconstrained,
}

/// Half-open index range along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: RowId,
    pub end: RowId,
    pub kind: RangeKind,
}

impl Range {
    #[inline]
    pub fn is_map(&self) -> bool {
        self.kind == RangeKind::Map
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.kind == RangeKind::Free
    }

    #[inline]
    pub fn is_unconstrained(&self) -> bool {
        self.kind == RangeKind::Unconstrained
    }

    #[inline]
    pub fn n_rows(&self) -> u64 {
        self.end - self.start
    }

    #[inline]
    pub fn is_single_row(&self) -> bool {
        self.n_rows() == 1
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Sorted disk/memory id pairs for one dimension. Empty means the
/// dimension is unselected and spans its full extent.
pub type ColumnMap = Vec<IdMap>;
/// Ranges for one dimension.
pub type ColumnRange = Vec<Range>;
/// Id maps for every dimension, innermost first.
pub type ColumnMaps = Vec<ColumnMap>;
/// Ranges for every dimension, innermost first.
pub type ColumnRanges = Vec<ColumnRange>;

/// Coalesce a sorted id map into maximal runs of contiguous disk indices.
///
/// Emitted ranges hold positions into the map, not disk indices, so a
/// selection of `[5, 6, 7, 12, 13]` yields `[0, 3)` and `[3, 5)`.
fn coalesce_map_ranges(column_map: &[IdMap]) -> ColumnRange {
    let mut column_range = ColumnRange::new();
    let mut current = Range {
        start: 0,
        end: 1,
        kind: RangeKind::Map,
    };

    for (i, pair) in column_map.windows(2).enumerate() {
        if pair[1].disk - pair[0].disk == 1 {
            current.end += 1;
        } else {
            column_range.push(current);
            let next = (i + 1) as u64;
            current = Range {
                start: next,
                end: next + 1,
                kind: RangeKind::Map,
            };
        }
    }

    column_range.push(current);
    column_range
}

/// An optimized plan for reading one column under a selection.
///
/// Immutable after construction; any number of [`RangeIter`]s may walk it
/// concurrently. The mapping borrows the column for its whole lifetime so
/// no iterator can outlive the storage handle it plans against.
#[derive(Debug)]
pub struct ColumnMapping<'a, C: TableColumn> {
    column: &'a C,
    maps: ColumnMaps,
    ranges: ColumnRanges,
    shape: ShapeProvider<'a, C>,
    output_shape: Option<Shape>,
}

impl<'a, C: TableColumn> ColumnMapping<'a, C> {
    /// Plan the given selection against a column.
    ///
    /// The selection is supplied outermost-first for [`InputOrder::C`]
    /// (the default for external callers) and reversed on entry; storage
    /// internals are Fortran ordered with the row dimension last. An empty
    /// per-dimension list selects that dimension's full extent.
    pub fn try_new(
        column: &'a C,
        mut selection: ColumnSelection,
        order: InputOrder,
    ) -> Result<Self> {
        if order == InputOrder::C {
            selection.reverse();
        }

        let shape = ShapeProvider::make(column, selection)?;
        let maps = Self::make_maps(&shape);
        let ranges = Self::make_ranges(&shape, &maps)?;

        if ranges.is_empty() || ranges.iter().any(|dim_ranges| dim_ranges.is_empty()) {
            return Err(Error::Internal(format!(
                "Zero ranges generated for column {}",
                column.name()
            )));
        }

        let output_shape = Self::maybe_make_output_shape(&ranges);

        let mapping = Self {
            column,
            maps,
            ranges,
            shape,
            output_shape,
        };

        tracing::debug!(
            column = mapping.column.name(),
            n_ranges = mapping.n_ranges(),
            simple = mapping.is_simple(),
            "built column mapping"
        );

        Ok(mapping)
    }

    /// Zip each dimension's selected ids with their selection positions
    /// and sort by disk index.
    fn make_maps(shape_prov: &ShapeProvider<'a, C>) -> ColumnMaps {
        let ndim = shape_prov.ndim();
        let selection = shape_prov.selection();
        let mut column_maps = ColumnMaps::with_capacity(ndim);

        for dim in 0..ndim {
            let dim_ids = select_dim(dim, selection.len(), ndim)
                .map(|sdim| &selection[sdim])
                .filter(|ids| !ids.is_empty());

            let Some(dim_ids) = dim_ids else {
                column_maps.push(ColumnMap::new());
                continue;
            };

            let mut column_map: ColumnMap = dim_ids
                .iter()
                .enumerate()
                .map(|(mem, &disk)| IdMap {
                    disk,
                    mem: mem as RowId,
                })
                .collect();

            column_map.sort_by_key(|id_map| id_map.disk);
            column_maps.push(column_map);
        }

        column_maps
    }

    /// Ranges for columns whose rows share one shape: every dimension may
    /// span multiple rows, so unselected dimensions become a single free
    /// range over the full extent.
    fn make_fixed_ranges(
        shape_prov: &ShapeProvider<'a, C>,
        maps: &ColumnMaps,
    ) -> Result<ColumnRanges> {
        debug_assert!(shape_prov.is_actually_fixed());
        let ndim = shape_prov.ndim();
        let mut column_ranges = ColumnRanges::with_capacity(ndim);

        for dim in 0..ndim {
            if maps[dim].is_empty() {
                let dim_size = shape_prov.dim_size(dim)?;
                column_ranges.push(vec![Range {
                    start: 0,
                    end: dim_size,
                    kind: RangeKind::Free,
                }]);
                continue;
            }

            column_ranges.push(coalesce_map_ranges(&maps[dim]));
        }

        debug_assert_eq!(ndim, column_ranges.len());
        Ok(column_ranges)
    }

    /// Ranges for genuinely variable columns: rectangular reads can span
    /// at most one row, so the row dimension is enumerated row by row and
    /// unselected cell dimensions stay unconstrained until iteration.
    fn make_variable_ranges(
        shape_prov: &ShapeProvider<'a, C>,
        maps: &ColumnMaps,
    ) -> Result<ColumnRanges> {
        debug_assert!(!shape_prov.is_actually_fixed());
        let ndim = shape_prov.ndim();
        let row_dim = ndim - 1;
        let mut column_ranges = ColumnRanges::with_capacity(ndim);

        for dim in 0..row_dim {
            if maps[dim].is_empty() {
                column_ranges.push(vec![Range {
                    start: 0,
                    end: 0,
                    kind: RangeKind::Unconstrained,
                }]);
                continue;
            }

            column_ranges.push(coalesce_map_ranges(&maps[dim]));
        }

        let row_range: ColumnRange = if maps[row_dim].is_empty() {
            let dim_size = shape_prov.dim_size(row_dim)?;
            (0..dim_size)
                .map(|r| Range {
                    start: r,
                    end: r + 1,
                    kind: RangeKind::Free,
                })
                .collect()
        } else {
            (0..maps[row_dim].len() as u64)
                .map(|r| Range {
                    start: r,
                    end: r + 1,
                    kind: RangeKind::Map,
                })
                .collect()
        };

        column_ranges.push(row_range);

        debug_assert_eq!(ndim, column_ranges.len());
        Ok(column_ranges)
    }

    fn make_ranges(shape_prov: &ShapeProvider<'a, C>, maps: &ColumnMaps) -> Result<ColumnRanges> {
        if shape_prov.is_actually_fixed() {
            Self::make_fixed_ranges(shape_prov, maps)
        } else {
            Self::make_variable_ranges(shape_prov, maps)
        }
    }

    /// Total per-dimension extents of the output buffer, absent when any
    /// dimension's size is only knowable per row.
    fn maybe_make_output_shape(ranges: &ColumnRanges) -> Option<Shape> {
        debug_assert!(!ranges.is_empty());
        let mut shape = Shape::with_capacity(ranges.len());

        for dim_ranges in ranges {
            let mut size = 0u64;
            for range in dim_ranges {
                match range.kind {
                    RangeKind::Free | RangeKind::Map => {
                        debug_assert!(range.is_valid());
                        size += range.n_rows();
                    }
                    RangeKind::Unconstrained => return None,
                }
            }
            shape.push(size);
        }

        Some(shape)
    }

    /// Shape queries backing this mapping.
    #[inline]
    pub fn shape_provider(&self) -> &ShapeProvider<'a, C> {
        &self.shape
    }

    /// Number of dimensions, including row.
    #[inline]
    pub fn n_dim(&self) -> usize {
        self.shape.ndim()
    }

    #[inline]
    pub fn row_dim(&self) -> usize {
        self.n_dim() - 1
    }

    /// Sorted id map for one dimension.
    #[inline]
    pub fn dim_maps(&self, dim: usize) -> &ColumnMap {
        &self.maps[dim]
    }

    /// Ranges for one dimension.
    #[inline]
    pub fn dim_ranges(&self, dim: usize) -> &ColumnRange {
        &self.ranges[dim]
    }

    /// True if the column is declared fixed-shape or carries one shape in
    /// practice.
    #[inline]
    pub fn is_fixed_shape(&self) -> bool {
        self.shape.is_actually_fixed()
    }

    /// Size of a non-row dimension for one selected row position of a
    /// varying column.
    #[inline]
    pub fn row_dim_size(&self, row: RowId, dim: usize) -> u64 {
        self.shape.row_dim_size(row, dim)
    }

    /// The output buffer shape, if it is fixed.
    pub fn output_shape(&self) -> Result<&Shape> {
        self.output_shape.as_ref().ok_or_else(|| {
            Error::InvalidArgumentError(format!(
                "Column {} does not have a fixed shape",
                self.shape.column_name()
            ))
        })
    }

    /// Number of disjoint rectangles this plan reads.
    pub fn n_ranges(&self) -> u64 {
        self.ranges
            .iter()
            .map(|dim_ranges| dim_ranges.len() as u64)
            .product()
    }

    /// Total number of elements covered by the plan.
    pub fn n_elements(&self) -> u64 {
        debug_assert!(!self.ranges.is_empty());
        let row_dim = self.row_dim();
        let row_ranges = &self.ranges[row_dim];
        let mut elements = 0u64;

        for (rr_id, row_range) in row_ranges.iter().enumerate() {
            let mut row_elements = row_range.n_rows();
            for dim in 0..row_dim {
                let mut dim_elements = 0u64;
                for range in &self.ranges[dim] {
                    if range.is_unconstrained() {
                        debug_assert!(row_range.is_single_row());
                        dim_elements += self.shape.row_dim_size(rr_id as RowId, dim);
                    } else {
                        debug_assert!(range.is_valid());
                        dim_elements += range.n_rows();
                    }
                }
                row_elements *= dim_elements;
            }
            elements += row_elements;
        }

        elements
    }

    /// True if the whole selection collapses to one rectangular disk read
    /// and one contiguous memory write, letting consumers skip per-element
    /// scatter entirely.
    pub fn is_simple(&self) -> bool {
        for dim in 0..self.n_dim() {
            let column_map = self.dim_maps(dim);
            let column_range = self.dim_ranges(dim);

            // More than one range along any dimension forces multiple reads.
            if column_range.len() > 1 {
                return false;
            }

            for range in column_range {
                if !range.is_map() {
                    // Free and unconstrained ranges are trivially contiguous.
                    continue;
                }
                for i in (range.start + 1)..range.end {
                    let i = i as usize;
                    if column_map[i].mem != column_map[i - 1].mem + 1 {
                        return false;
                    }
                    if column_map[i].disk != column_map[i - 1].disk + 1 {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Flat output-buffer offset of a multi-dimensional memory index.
    ///
    /// Fixed-shape outputs flatten row-major with the innermost stride 1.
    /// Variable outputs lay each row's cell contiguously, back to back in
    /// selection row order, using the per-row running products.
    pub fn flat_offset(&self, index: &[u64]) -> u64 {
        let row_dim = self.row_dim();

        if let Some(shape) = &self.output_shape {
            let mut result = 0u64;
            let mut product = 1u64;

            for dim in 0..row_dim {
                result += index[dim] * product;
                product *= shape[dim];
            }

            return result + product * index[row_dim];
        }

        // Variably shaped output; per-row offsets are needed. There is no
        // offset array for the fastest changing dimension.
        let Some(var) = self.shape.var_data() else {
            unreachable!("unshaped output implies a variable-shape column");
        };
        let offsets = var.offsets();
        let row = index[row_dim] as usize;
        let mut result = index[0];

        for dim in 1..row_dim {
            result += index[dim] * offsets[dim - 1][row];
        }

        let row_offsets = &offsets[offsets.len() - 1];
        result + row_offsets[..row].iter().sum::<u64>()
    }

    /// Walk the Cartesian product of per-dimension ranges.
    pub fn iter(&self) -> RangeIter<'_, C> {
        RangeIter::new(self)
    }
}

/// Odometer over the disjoint rectangles of a [`ColumnMapping`].
///
/// The innermost dimension varies fastest; iteration ends exactly when the
/// row-dimension index would overflow. Each position yields a
/// [`RangeChunk`] describing one rectangular disk region and the matching
/// region of the output buffer.
#[derive(Debug)]
pub struct RangeIter<'a, C: TableColumn> {
    mapping: &'a ColumnMapping<'a, C>,
    index: Vec<usize>,
    disk_start: Vec<u64>,
    mem_start: Vec<u64>,
    range_length: Vec<u64>,
    done: bool,
}

impl<'a, C: TableColumn> RangeIter<'a, C> {
    fn new(mapping: &'a ColumnMapping<'a, C>) -> Self {
        let ndim = mapping.n_dim();
        let mut iter = Self {
            mapping,
            index: vec![0; ndim],
            disk_start: vec![0; ndim],
            mem_start: vec![0; ndim],
            range_length: vec![0; ndim],
            done: false,
        };
        iter.update_state();
        iter
    }

    /// Resolve the current range of every dimension into a concrete disk
    /// start and length.
    fn update_state(&mut self) {
        let ndim = self.mapping.n_dim();
        let row_dim = ndim - 1;

        for dim in 0..ndim {
            let range = &self.mapping.dim_ranges(dim)[self.index[dim]];
            match range.kind {
                RangeKind::Free => {
                    self.disk_start[dim] = range.start;
                    self.range_length[dim] = range.end - range.start;
                }
                RangeKind::Map => {
                    let dim_maps = self.mapping.dim_maps(dim);
                    let start = dim_maps[range.start as usize].disk;
                    self.disk_start[dim] = start;
                    self.range_length[dim] = dim_maps[(range.end - 1) as usize].disk - start + 1;
                }
                RangeKind::Unconstrained => {
                    // The extent varies by row, so the current row range
                    // spans exactly one row.
                    let row_range = &self.mapping.dim_ranges(row_dim)[self.index[row_dim]];
                    debug_assert!(row_range.is_single_row());
                    self.disk_start[dim] = 0;
                    self.range_length[dim] = self.mapping.row_dim_size(row_range.start, dim);
                }
            }
        }
    }

    fn advance(&mut self) {
        let row_dim = self.mapping.row_dim();

        // Fastest to slowest changing dimension.
        for dim in 0..self.mapping.n_dim() {
            self.index[dim] += 1;
            self.mem_start[dim] += self.range_length[dim];

            if self.index[dim] < self.mapping.dim_ranges(dim).len() {
                break;
            }
            if dim < row_dim {
                self.index[dim] = 0;
                self.mem_start[dim] = 0;
            } else {
                // Row is the slowest changing dimension.
                self.done = true;
                return;
            }
        }

        self.update_state();
    }
}

impl<'a, C: TableColumn> Iterator for RangeIter<'a, C> {
    type Item = RangeChunk<'a, C>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let chunk = RangeChunk {
            mapping: self.mapping,
            disk_start: self.disk_start.clone(),
            mem_start: self.mem_start.clone(),
            range_length: self.range_length.clone(),
        };

        self.advance();
        Some(chunk)
    }
}

impl<C: TableColumn> PartialEq for RangeIter<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        if !std::ptr::eq(self.mapping, other.mapping) || self.done != other.done {
            return false;
        }
        self.done || self.index == other.index
    }
}

/// One rectangular disk region and its destination in the output buffer.
#[derive(Debug)]
pub struct RangeChunk<'a, C: TableColumn> {
    mapping: &'a ColumnMapping<'a, C>,
    disk_start: Vec<u64>,
    mem_start: Vec<u64>,
    range_length: Vec<u64>,
}

impl<'a, C: TableColumn> RangeChunk<'a, C> {
    #[inline]
    pub fn n_dim(&self) -> usize {
        self.disk_start.len()
    }

    #[inline]
    pub fn row_dim(&self) -> usize {
        self.n_dim() - 1
    }

    /// First disk index along each dimension.
    #[inline]
    pub fn disk_start(&self) -> &[u64] {
        &self.disk_start
    }

    /// Write position along each dimension of the output buffer.
    #[inline]
    pub fn mem_start(&self) -> &[u64] {
        &self.mem_start
    }

    /// Extent along each dimension.
    #[inline]
    pub fn length(&self) -> &[u64] {
        &self.range_length
    }

    /// Elements in this rectangle.
    pub fn n_elements(&self) -> u64 {
        self.range_length.iter().product()
    }

    /// Inclusive one-dimensional slicer for the row dimension.
    pub fn row_slicer(&self) -> Slicer {
        let row_dim = self.row_dim();
        let start = self.disk_start[row_dim];
        let length = self.range_length[row_dim];
        Slicer::new(vec![start], vec![start + length - 1])
    }

    /// Inclusive slicer for the cell section read from each row.
    pub fn section_slicer(&self) -> Slicer {
        let row_dim = self.row_dim();
        debug_assert!(row_dim > 0);
        let lower = self.disk_start[..row_dim].to_vec();
        let upper = (0..row_dim)
            .map(|dim| self.disk_start[dim] + self.range_length[dim] - 1)
            .collect();
        Slicer::new(lower, upper)
    }

    /// Per-element scatter positions for this rectangle.
    ///
    /// Only needed when the mapping is not simple; simple plans copy the
    /// slab wholesale.
    pub fn maps(&self) -> MapIter<'_, C> {
        MapIter::new(self)
    }
}

/// Scatter coordinates of one element within a [`RangeChunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapPosition {
    /// Flat offset into the chunk's local buffer.
    pub chunk_offset: u64,
    /// Flat offset into the global output buffer.
    pub global_offset: u64,
}

/// Enumerates every element of one rectangle, fastest dimension first.
#[derive(Debug)]
pub struct MapIter<'a, C: TableColumn> {
    chunk: &'a RangeChunk<'a, C>,
    chunk_index: Vec<u64>,
    global_index: Vec<u64>,
    strides: Vec<u64>,
    done: bool,
}

impl<'a, C: TableColumn> MapIter<'a, C> {
    fn new(chunk: &'a RangeChunk<'a, C>) -> Self {
        let ndim = chunk.n_dim();
        let mut strides = vec![1u64; ndim];
        let mut product = 1u64;

        for dim in 1..ndim {
            product *= chunk.range_length[dim - 1];
            strides[dim] = product;
        }

        Self {
            chunk,
            chunk_index: vec![0; ndim],
            global_index: chunk.mem_start.clone(),
            strides,
            done: false,
        }
    }

    fn chunk_offset(&self) -> u64 {
        self.chunk_index
            .iter()
            .zip(&self.strides)
            .map(|(index, stride)| index * stride)
            .sum()
    }

    fn advance(&mut self) {
        let row_dim = self.chunk.row_dim();

        for dim in 0..self.chunk.n_dim() {
            self.chunk_index[dim] += 1;
            self.global_index[dim] += 1;

            if self.chunk_index[dim] < self.chunk.range_length[dim] {
                break;
            }
            if dim < row_dim {
                self.chunk_index[dim] = 0;
                self.global_index[dim] = self.chunk.mem_start[dim];
            } else {
                self.done = true;
                break;
            }
        }
    }
}

impl<C: TableColumn> Iterator for MapIter<'_, C> {
    type Item = MapPosition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let position = MapPosition {
            chunk_offset: self.chunk_offset(),
            global_offset: self.chunk.mapping.flat_offset(&self.global_index),
        };

        self.advance();
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_splits_on_gaps() {
        let map: ColumnMap = [5u64, 6, 7, 12, 13]
            .iter()
            .enumerate()
            .map(|(mem, &disk)| IdMap {
                disk,
                mem: mem as u64,
            })
            .collect();

        let ranges = coalesce_map_ranges(&map);
        assert_eq!(
            ranges,
            vec![
                Range {
                    start: 0,
                    end: 3,
                    kind: RangeKind::Map
                },
                Range {
                    start: 3,
                    end: 5,
                    kind: RangeKind::Map
                },
            ]
        );
    }

    #[test]
    fn coalesce_single_id() {
        let map = vec![IdMap { disk: 4, mem: 0 }];
        let ranges = coalesce_map_ranges(&map);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].n_rows(), 1);
    }

    #[test]
    fn range_predicates() {
        let range = Range {
            start: 2,
            end: 5,
            kind: RangeKind::Free,
        };
        assert!(range.is_free());
        assert!(!range.is_map());
        assert!(range.is_valid());
        assert_eq!(range.n_rows(), 3);
        assert!(!range.is_single_row());
    }
}
