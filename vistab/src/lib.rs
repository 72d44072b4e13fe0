//! Vistab: columnar read planning for scientific tabular storage.
//!
//! This crate is the single entry point for the vistab workspace. It
//! re-exports the column mapping planner, the group-sort/merge engine,
//! the storage contract, and the shared error types so downstream
//! applications see one surface.
//!
//! Scientific table columns hold one cell per row — a scalar or an
//! N-dimensional array — and cell shapes may be fixed across rows,
//! variable per row, or declared variable while fixed in practice. Given
//! a column and a multi-dimensional selection, [`ColumnMapping`] plans
//! the minimum set of contiguous rectangular reads against the storage
//! engine together with the matching write positions in a flat columnar
//! output buffer. [`GroupSortData`] covers the companion reshuffling
//! problem: ordering rows by integer group keys and merging sorted
//! shards.
//!
//! # Crate Topology
//!
//! - [`vistab_storage`] — the `TableColumn` contract, shared types, and
//!   the in-memory `MemColumn` implementation.
//! - [`vistab_column_map`] — the mapping planner and its range/map
//!   iterators.
//! - [`vistab_group_sort`] — lexicographic sort and k-way shard merge
//!   over Arrow arrays.
//! - [`vistab_result`] — the unified error enum and result alias.

pub use vistab_column_map::{
    ColumnMapping, IdMap, MapIter, MapPosition, Range, RangeChunk, RangeIter, RangeKind,
    ShapeProvider, VariableShapeData,
};
pub use vistab_group_sort::{GroupSortData, merge_groups};
pub use vistab_result::{Error, Result};
pub use vistab_storage::{
    ColumnSelection, InputOrder, MemColumn, RowId, RowIds, Shape, Slicer, TableColumn,
};
