use matrix_util::common_io::{create_temp_dir_file, write_lines};
use matrix_util::traits::IoOps;
use nalgebra::DMatrix;

#[test]
fn dmatrix_named_io_test() -> anyhow::Result<()> {
    let xx = DMatrix::<f32>::from_row_slice(3, 2, &[0.5, 1.0, -2.0, 3.25, 4.0, 0.0]);
    let rows: Vec<Box<str>> = vec!["c1".into(), "c2".into(), "c3".into()];
    let cols: Vec<Box<str>> = vec!["UMAP_1".into(), "UMAP_2".into()];

    let tsv_file = create_temp_dir_file(".tsv.gz")?;
    let tsv_file = tsv_file.to_str().unwrap();
    xx.write_data(&rows, &cols, tsv_file, "\t")?;

    let yy = DMatrix::<f32>::from_tsv(tsv_file, Some(0))?;

    assert_eq!(yy.rows, rows);
    assert_eq!(yy.cols, cols);
    approx::assert_abs_diff_eq!(xx, yy.mat);
    Ok(())
}

#[test]
fn dmatrix_header_without_row_label() -> anyhow::Result<()> {
    let csv_file = create_temp_dir_file(".csv")?;
    let csv_file = csv_file.to_str().unwrap();
    let lines = vec!["CD3,CD19", "a,1.0,2.0", "b,3.0,4.0"];
    write_lines(&lines, csv_file)?;

    let yy = DMatrix::<f32>::read_data(csv_file, ",", Some(0))?;
    assert_eq!(yy.cols, vec![Box::from("CD3"), Box::from("CD19")]);
    assert_eq!(yy.rows, vec![Box::from("a"), Box::from("b")]);
    approx::assert_abs_diff_eq!(yy.mat[(1, 0)], 3.0);
    Ok(())
}

#[test]
fn dmatrix_ragged_rows_fail() -> anyhow::Result<()> {
    let tsv_file = create_temp_dir_file(".tsv")?;
    let tsv_file = tsv_file.to_str().unwrap();
    let lines = vec!["cell\tx\ty", "a\t1\t2", "b\t3"];
    write_lines(&lines, tsv_file)?;

    assert!(DMatrix::<f32>::read_data(tsv_file, "\t", Some(0)).is_err());
    Ok(())
}
