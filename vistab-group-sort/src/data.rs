//! Validated column bundle and its permutation sort.

use std::cmp::Ordering;

use arrow::array::{Array, ArrayRef, Float64Array, Int32Array, Int64Array, UInt64Array};
use arrow::compute::take;
use arrow::datatypes::DataType;
use vistab_result::{Error, Result};

const LENGTH_MISMATCH: &str = "GroupSortData length mismatch";
const HAS_NULLS: &str = "GroupSortData has nulls";

/// Gather one column through a sort permutation, preserving its concrete
/// array type.
fn gather<A>(array: &A, indices: &UInt64Array) -> Result<A>
where
    A: Array + Clone + 'static,
{
    let taken = take(array, indices, None)?;
    taken
        .as_any()
        .downcast_ref::<A>()
        .cloned()
        .ok_or_else(|| Error::Internal("gather changed the array type".into()))
}

/// Grouping columns plus tiebreak and row-number columns.
///
/// Rows are ordered lexicographically: each group key in declared order,
/// then time, then ant1, then ant2. Equal-key rows are permitted; callers
/// needing a strict total order must include a disambiguating key.
#[derive(Debug, Clone)]
pub struct GroupSortData {
    pub(crate) groups: Vec<Int32Array>,
    pub(crate) time: Float64Array,
    pub(crate) ant1: Int32Array,
    pub(crate) ant2: Int32Array,
    pub(crate) rows: Int64Array,
}

impl GroupSortData {
    /// Validate and adopt the supplied columns.
    ///
    /// All columns must have the same length and carry no nulls; group,
    /// ant1 and ant2 columns must be int32, time float64, rows int64.
    pub fn try_new(
        groups: Vec<ArrayRef>,
        time: ArrayRef,
        ant1: ArrayRef,
        ant2: ArrayRef,
        rows: ArrayRef,
    ) -> Result<Self> {
        if time.len() != ant1.len() || time.len() != ant2.len() || time.len() != rows.len() {
            return Err(Error::InvalidArgumentError(LENGTH_MISMATCH.into()));
        }

        let time = downcast_column::<Float64Array>(&time, DataType::Float64, "time")?;
        let ant1 = downcast_column::<Int32Array>(&ant1, DataType::Int32, "ant1")?;
        let ant2 = downcast_column::<Int32Array>(&ant2, DataType::Int32, "ant2")?;
        let rows = downcast_column::<Int64Array>(&rows, DataType::Int64, "row")?;

        let mut groups_int32 = Vec::with_capacity(groups.len());
        for group in &groups {
            if time.len() != group.len() {
                return Err(Error::InvalidArgumentError(LENGTH_MISMATCH.into()));
            }
            groups_int32.push(downcast_column::<Int32Array>(
                group,
                DataType::Int32,
                "grouping",
            )?);
        }

        Ok(Self {
            groups: groups_int32,
            time,
            ant1,
            ant2,
            rows,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.time.len()
    }

    /// Number of group-key columns.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn group(&self, g: usize) -> &Int32Array {
        &self.groups[g]
    }

    #[inline]
    pub fn time(&self) -> &Float64Array {
        &self.time
    }

    #[inline]
    pub fn ant1(&self) -> &Int32Array {
        &self.ant1
    }

    #[inline]
    pub fn ant2(&self) -> &Int32Array {
        &self.ant2
    }

    #[inline]
    pub fn rows(&self) -> &Int64Array {
        &self.rows
    }

    /// Compare row `l` of `self` against row `r` of `other` under the
    /// lexicographic order. Both sides must carry the same group count.
    pub(crate) fn cmp_rows(&self, l: usize, other: &GroupSortData, r: usize) -> Ordering {
        for (lhs, rhs) in self.groups.iter().zip(&other.groups) {
            let ord = lhs.value(l).cmp(&rhs.value(r));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.time
            .value(l)
            .total_cmp(&other.time.value(r))
            .then_with(|| self.ant1.value(l).cmp(&other.ant1.value(r)))
            .then_with(|| self.ant2.value(l).cmp(&other.ant2.value(r)))
    }

    /// Return a new instance with rows in lexicographic order.
    ///
    /// Sorts an index permutation and gathers every column through it, so
    /// column buffers are rewritten exactly once.
    pub fn sort(&self) -> Result<GroupSortData> {
        let nrow = self.n_rows();
        let mut index: Vec<u64> = (0..nrow as u64).collect();
        index.sort_by(|&l, &r| self.cmp_rows(l as usize, self, r as usize));
        let indices = UInt64Array::from(index);

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            groups.push(gather(group, &indices)?);
        }

        Ok(Self {
            groups,
            time: gather(&self.time, &indices)?,
            ant1: gather(&self.ant1, &indices)?,
            ant2: gather(&self.ant2, &indices)?,
            rows: gather(&self.rows, &indices)?,
        })
    }
}

fn downcast_column<A>(array: &ArrayRef, expected: DataType, what: &str) -> Result<A>
where
    A: Array + Clone + 'static,
{
    if array.data_type() != &expected {
        return Err(Error::InvalidArgumentError(format!(
            "{what} column was not {expected}"
        )));
    }
    if array.null_count() > 0 {
        return Err(Error::InvalidArgumentError(HAS_NULLS.into()));
    }
    array
        .as_any()
        .downcast_ref::<A>()
        .cloned()
        .ok_or_else(|| Error::Internal(format!("{what} column failed to downcast")))
}
