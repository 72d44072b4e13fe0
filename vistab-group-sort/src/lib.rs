//! Stable lexicographic sorting and k-way merging of grouped rows.
//!
//! A [`GroupSortData`] bundles N int32 group-key columns with the
//! time/ant1/ant2 tiebreak columns and an int64 row-number column, all of
//! equal length and free of nulls. [`GroupSortData::sort`] orders rows by
//! the group keys in declared order, then time, ant1, ant2;
//! [`merge_groups`] combines already-sorted shards into one sorted
//! instance with a heap-based k-way merge.

pub mod data;
pub mod merge;

pub use data::GroupSortData;
pub use merge::merge_groups;
