//! Contract between the tabular storage engine and the mapping planner.
//!
//! The planner never performs I/O itself; it consumes the capabilities
//! declared by [`TableColumn`] (row count, declared shape, per-row shapes,
//! row definedness) and hands back inclusive [`Slicer`]s describing the
//! rectangular slabs the storage engine should read. [`MemColumn`] is a
//! fully functional in-memory implementation of the contract used by tests
//! and benchmarks throughout the workspace.

pub mod column;
pub mod types;

pub use column::{MemColumn, TableColumn};
pub use types::{ColumnSelection, InputOrder, RowId, RowIds, Shape, Slicer};
