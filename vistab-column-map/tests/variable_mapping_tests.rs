//! Plans over variable-shape columns: per-row ranges, rejection paths,
//! and the variable-declared-but-fixed promotion.

use vistab_column_map::{ColumnMapping, RangeKind};
use vistab_result::{Error, Result};
use vistab_storage::MemColumn;
use vistab_storage::types::{InputOrder, Shape, Slicer};

fn var_shapes() -> Vec<Shape> {
    vec![
        vec![3, 2],
        vec![4, 1],
        vec![4, 2],
        vec![2, 2],
        vec![2, 1],
        vec![3, 2],
        vec![4, 1],
        vec![4, 2],
        vec![2, 2],
        vec![2, 1],
    ]
}

fn var_column() -> MemColumn {
    MemColumn::variable("VAR_DATA", 2, var_shapes())
}

#[test]
fn no_selection_enumerates_one_range_per_row() -> Result<()> {
    let column = var_column();
    let mapping = ColumnMapping::try_new(&column, vec![vec![]], InputOrder::C)?;

    assert!(mapping.shape_provider().is_varying());
    assert!(!mapping.shape_provider().is_definitely_fixed());
    assert!(!mapping.shape_provider().is_actually_fixed());
    assert!(!mapping.is_fixed_shape());
    assert_eq!(mapping.n_dim(), 3);
    assert_eq!(mapping.n_ranges(), 10);
    assert_eq!(mapping.n_elements(), 48);

    // Cell dimensions stay unconstrained until iteration resolves them
    // against each row's shape.
    assert_eq!(mapping.dim_ranges(0).len(), 1);
    assert!(mapping.dim_ranges(0)[0].is_unconstrained());
    assert_eq!(mapping.dim_ranges(1).len(), 1);
    assert!(mapping.dim_ranges(1)[0].is_unconstrained());

    let shapes = var_shapes();
    for (r, chunk) in mapping.iter().enumerate() {
        let row = r as u64;
        assert_eq!(chunk.row_slicer(), Slicer::new(vec![row], vec![row]));
        assert_eq!(
            chunk.section_slicer(),
            Slicer::new(vec![0, 0], vec![shapes[r][0] - 1, shapes[r][1] - 1])
        );
        assert_eq!(chunk.n_elements(), shapes[r][0] * shapes[r][1]);
    }

    Ok(())
}

#[test]
fn row_id_selection_keeps_given_rows() -> Result<()> {
    let column = var_column();
    let row_ids = vec![0u64, 1, 2, 3, 6, 7, 8, 9];
    let mapping = ColumnMapping::try_new(&column, vec![row_ids.clone()], InputOrder::C)?;

    assert_eq!(mapping.n_ranges(), 8);
    assert_eq!(mapping.n_elements(), 6 + 4 + 8 + 4 + 4 + 8 + 4 + 2);

    let row_ranges = mapping.dim_ranges(2);
    assert_eq!(row_ranges.len(), 8);
    assert!(row_ranges.iter().all(|r| r.kind == RangeKind::Map));
    assert!(row_ranges.iter().all(|r| r.is_single_row()));

    for (r, chunk) in mapping.iter().enumerate() {
        let row = row_ids[r];
        assert_eq!(chunk.row_slicer(), Slicer::new(vec![row], vec![row]));
    }

    Ok(())
}

#[test]
fn fixed_in_practice_promotes_to_multi_row_ranges() -> Result<()> {
    let column = MemColumn::variable("VAR_FIXED_DATA", 2, vec![vec![2, 4]; 10]);
    let mapping = ColumnMapping::try_new(&column, vec![vec![]], InputOrder::C)?;

    assert!(mapping.shape_provider().is_varying());
    assert!(!mapping.shape_provider().is_definitely_fixed());
    assert!(mapping.shape_provider().is_actually_fixed());
    assert!(mapping.is_fixed_shape());
    assert_eq!(mapping.n_ranges(), 1);
    assert_eq!(mapping.n_elements(), 80);
    assert_eq!(mapping.output_shape()?, &vec![2, 4, 10]);
    assert!(mapping.is_simple());

    let chunks: Vec<_> = mapping.iter().collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].row_slicer(), Slicer::new(vec![0], vec![9]));
    assert_eq!(
        chunks[0].section_slicer(),
        Slicer::new(vec![0, 0], vec![1, 3])
    );

    Ok(())
}

#[test]
fn undefined_rows_are_rejected() {
    let column = MemColumn::variable_with_undefined(
        "HOLES",
        2,
        vec![Some(vec![3, 2]), None, Some(vec![4, 1])],
    );

    let err = ColumnMapping::try_new(&column, vec![vec![]], InputOrder::C).unwrap_err();
    assert!(matches!(err, Error::NotImplemented(_)));

    // Selecting around the hole succeeds.
    let mapping = ColumnMapping::try_new(&column, vec![vec![0, 2]], InputOrder::C).unwrap();
    assert_eq!(mapping.n_ranges(), 2);
    assert_eq!(mapping.n_elements(), 6 + 4);
}

#[test]
fn varying_dimensionality_is_rejected() {
    let column = MemColumn::variable("RAGGED", 2, vec![vec![3, 2], vec![4]]);
    let err = ColumnMapping::try_new(&column, vec![vec![]], InputOrder::C).unwrap_err();
    assert!(matches!(err, Error::NotImplemented(_)));
}

#[test]
fn selection_past_row_extent_is_rejected() {
    let column = MemColumn::variable("VAR_DATA", 2, vec![vec![3, 2], vec![4, 1]]);
    // C order: rows, chan, corr; corr index 3 exceeds row 0's extent of 3.
    let selection = vec![vec![0, 1], vec![], vec![0, 3]];
    let err = ColumnMapping::try_new(&column, selection, InputOrder::C).unwrap_err();
    assert!(matches!(err, Error::InvalidArgumentError(_)));
}

#[test]
fn cell_selection_clips_row_shapes() -> Result<()> {
    let column = MemColumn::variable("VAR_DATA", 2, vec![vec![3, 2], vec![4, 2]]);
    // C order: all rows, chan index 0, all corr.
    let selection = vec![vec![], vec![0], vec![]];
    let mapping = ColumnMapping::try_new(&column, selection, InputOrder::C)?;

    assert_eq!(mapping.n_ranges(), 2);
    assert_eq!(mapping.n_elements(), 3 + 4);
    assert!(!mapping.shape_provider().is_actually_fixed());

    let chunks: Vec<_> = mapping.iter().collect();
    assert_eq!(chunks[0].section_slicer(), Slicer::new(vec![0, 0], vec![2, 0]));
    assert_eq!(chunks[1].section_slicer(), Slicer::new(vec![0, 0], vec![3, 0]));

    Ok(())
}

#[test]
fn clipping_can_fix_a_varying_column() -> Result<()> {
    let column = MemColumn::variable("VAR_DATA", 2, vec![vec![3, 2], vec![3, 1]]);
    // Selecting chan 0 leaves every row at shape (3, 1).
    let selection = vec![vec![], vec![0], vec![]];
    let mapping = ColumnMapping::try_new(&column, selection, InputOrder::C)?;

    assert!(mapping.shape_provider().is_actually_fixed());
    assert_eq!(mapping.n_ranges(), 1);
    assert_eq!(mapping.n_elements(), 6);
    assert_eq!(mapping.output_shape()?, &vec![3, 1, 2]);

    Ok(())
}

#[test]
fn row_dim_size_reports_selected_row_shapes() -> Result<()> {
    let column = var_column();
    let mapping = ColumnMapping::try_new(&column, vec![vec![]], InputOrder::C)?;

    let shapes = var_shapes();
    for (r, shape) in shapes.iter().enumerate() {
        assert_eq!(mapping.row_dim_size(r as u64, 0), shape[0]);
        assert_eq!(mapping.row_dim_size(r as u64, 1), shape[1]);
    }

    Ok(())
}
