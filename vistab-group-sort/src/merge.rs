//! Heap-based k-way merge of sorted shards.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use arrow::array::{
    Float64Array, Float64Builder, Int32Array, Int32Builder, Int64Array, Int64Builder,
};
use vistab_result::{Error, Result};

use crate::data::GroupSortData;

struct MergeEntry<'a> {
    data: &'a GroupSortData,
    shard: usize,
    row: usize,
}

impl PartialEq for MergeEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeEntry<'_> {}

impl PartialOrd for MergeEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the row ordering so the max-heap pops ascending rows;
        // break ties by shard to keep the merge deterministic.
        other
            .data
            .cmp_rows(other.row, self.data, self.row)
            .then_with(|| other.shard.cmp(&self.shard))
    }
}

/// Merge already-sorted shards into one sorted instance.
///
/// Every shard must carry the same number of group columns. Rows with
/// equal keys are emitted in ascending shard order. An empty input yields
/// an empty instance with no group columns.
pub fn merge_groups(shards: &[GroupSortData]) -> Result<GroupSortData> {
    let Some(first) = shards.first() else {
        return Ok(GroupSortData {
            groups: Vec::new(),
            time: Float64Array::from(Vec::<f64>::new()),
            ant1: Int32Array::from(Vec::<i32>::new()),
            ant2: Int32Array::from(Vec::<i32>::new()),
            rows: Int64Array::from(Vec::<i64>::new()),
        });
    };

    let n_groups = first.n_groups();
    for shard in shards {
        if shard.n_groups() != n_groups {
            return Err(Error::InvalidArgumentError(format!(
                "GroupSortData group count mismatch: {} != {n_groups}",
                shard.n_groups()
            )));
        }
    }

    let nrows: usize = shards.iter().map(|shard| shard.n_rows()).sum();

    let mut group_builders: Vec<Int32Builder> = (0..n_groups)
        .map(|_| Int32Builder::with_capacity(nrows))
        .collect();
    let mut time_builder = Float64Builder::with_capacity(nrows);
    let mut ant1_builder = Int32Builder::with_capacity(nrows);
    let mut ant2_builder = Int32Builder::with_capacity(nrows);
    let mut rows_builder = Int64Builder::with_capacity(nrows);

    let mut heap: BinaryHeap<MergeEntry<'_>> = BinaryHeap::with_capacity(shards.len());
    for (shard, data) in shards.iter().enumerate() {
        if data.n_rows() > 0 {
            heap.push(MergeEntry {
                data,
                shard,
                row: 0,
            });
        }
    }

    while let Some(entry) = heap.pop() {
        let MergeEntry { data, shard, row } = entry;

        for (g, builder) in group_builders.iter_mut().enumerate() {
            builder.append_value(data.group(g).value(row));
        }
        time_builder.append_value(data.time().value(row));
        ant1_builder.append_value(data.ant1().value(row));
        ant2_builder.append_value(data.ant2().value(row));
        rows_builder.append_value(data.rows().value(row));

        if row + 1 < data.n_rows() {
            heap.push(MergeEntry {
                data,
                shard,
                row: row + 1,
            });
        }
    }

    tracing::debug!(shards = shards.len(), rows = nrows, "merged sorted shards");

    Ok(GroupSortData {
        groups: group_builders.iter_mut().map(|b| b.finish()).collect(),
        time: time_builder.finish(),
        ant1: ant1_builder.finish(),
        ant2: ant2_builder.finish(),
        rows: rows_builder.finish(),
    })
}
