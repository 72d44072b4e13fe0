//! Column mapping planner.
//!
//! Translates a user-supplied multi-dimensional selection over one table
//! column into an optimized read/write plan: per dimension, a sorted
//! disk-to-memory id map plus a list of contiguous ranges. Consumers walk
//! the Cartesian product of those ranges with [`ColumnMapping::iter`],
//! issue one rectangular storage read per [`RangeChunk`], and — when the
//! plan is not [`ColumnMapping::is_simple`] — scatter individual elements
//! into the output buffer through [`RangeChunk::maps`].
//!
//! The planner performs no I/O. It consults the storage engine only for
//! row counts, per-row shapes, and row definedness during construction;
//! iteration afterwards is pure in-memory computation and infallible.

pub mod mapping;
pub mod shape;

pub use mapping::{
    ColumnMap, ColumnMapping, ColumnMaps, ColumnRange, ColumnRanges, IdMap, MapIter, MapPosition,
    Range, RangeChunk, RangeIter, RangeKind,
};
pub use shape::{ShapeProvider, VariableShapeData};
