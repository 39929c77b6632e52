//! Reading cell tables and coordinate matrices, writing results

use crate::common::*;
use crate::dimension::DimType;
use crate::population::CellPopulation;
use matrix_util::common_io::{detect_delimiter, mkdir, read_lines_of_words_delim, write_lines, ReadLinesOut};
use matrix_util::traits::IoOps;

/// Columns of the pseudotime output, in order
pub const RESULT_COLUMNS: [&str; 10] = [
    "cell",
    "cluster",
    "downsample",
    "is_root",
    "is_leaf",
    "pseudotime",
    "seed_flag",
    "seed_cluster",
    "traj_value",
    "traj_value_log",
];

fn parse_flag(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Some(true),
        "0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

fn flag_str(x: bool) -> &'static str {
    if x {
        "1"
    } else {
        "0"
    }
}

///
/// Read the cell table: a header line with a `cell` column and optional
/// `cluster` and `downsample` columns. Missing columns mean cluster `0`
/// and every cell downsampled.
///
/// * `file` - `.csv`, `.tsv`, either gzipped or not
///
pub fn read_cells(file: &str) -> anyhow::Result<CellPopulation> {
    let ReadLinesOut { lines, header } = read_lines_of_words_delim(file, detect_delimiter(file), 0)?;

    let column = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));

    let cell_col = column("cell")
        .ok_or_else(|| anyhow::anyhow!("{}: no `cell` column in {:?}", file, header))?;
    let cluster_col = column("cluster");
    let downsample_col = column("downsample");

    let nn = lines.len();
    let mut cells = Vec::with_capacity(nn);
    let mut clusters = Vec::with_capacity(nn);
    let mut downsample = Vec::with_capacity(nn);

    for (i, words) in lines.into_iter().enumerate() {
        let word = |j: usize| {
            words
                .get(j)
                .ok_or_else(|| anyhow::anyhow!("{}: line {} is too short", file, i + 2))
        };

        cells.push(word(cell_col)?.clone());

        clusters.push(match cluster_col {
            Some(j) => {
                let w = word(j)?;
                w.parse::<u32>()
                    .map_err(|_| anyhow::anyhow!("{}: bad cluster id `{}` on line {}", file, w, i + 2))?
            }
            None => 0,
        });

        downsample.push(match downsample_col {
            Some(j) => {
                let w = word(j)?;
                parse_flag(w)
                    .ok_or_else(|| anyhow::anyhow!("{}: bad downsample flag `{}` on line {}", file, w, i + 2))?
            }
            None => true,
        });
    }

    info!("read {} cells from {}", nn, file);

    Ok(CellPopulation::new(cells)?
        .with_clusters(clusters)?
        .with_downsample(downsample)?)
}

///
/// Read a coordinate matrix whose first column holds cell identities
///
pub fn read_coordinates(file: &str) -> anyhow::Result<MatWithNames<Mat>> {
    let table = Mat::read_data(file, detect_delimiter(file), Some(0))?;
    info!(
        "read {} x {} matrix from {}",
        table.mat.nrows(),
        table.mat.ncols(),
        file
    );
    Ok(table)
}

///
/// Cell table plus its coordinate tables
///
/// * `cells_file` - see [`read_cells`]
/// * `markers_file` - marker expression, rows = cells
/// * `embedding` - an embedding file and its coordinate space
///
pub fn read_population(
    cells_file: &str,
    markers_file: Option<&str>,
    embedding: Option<(DimType, &str)>,
) -> anyhow::Result<CellPopulation> {
    let mut pop = read_cells(cells_file)?;

    if let Some(file) = markers_file {
        pop = pop.with_markers(read_coordinates(file)?)?;
    }

    if let Some((dim_type, file)) = embedding {
        pop = pop.with_embedding(dim_type, read_coordinates(file)?)?;
    }

    if pop.markers().is_none() && embedding.is_none() {
        warn!("neither markers nor an embedding given for {}", cells_file);
    }
    Ok(pop)
}

fn format_value(x: f32) -> String {
    if x.is_nan() {
        "NA".to_string()
    } else {
        x.to_string()
    }
}

///
/// Write one line per cell with the columns of [`RESULT_COLUMNS`].
/// Undefined pseudotime is written as `NA`.
///
pub fn write_population(pop: &CellPopulation, file: &str) -> anyhow::Result<()> {
    mkdir(file)?;

    let pseudotime = pop.require_pseudotime()?;
    let delim = detect_delimiter(file);

    let mut lines: Vec<Box<str>> = Vec::with_capacity(pop.len() + 1);
    lines.push(RESULT_COLUMNS.join(delim).into_boxed_str());

    for (i, cell) in pop.cells().iter().enumerate() {
        let words = [
            cell.to_string(),
            pop.cluster_ids()[i].to_string(),
            flag_str(pop.in_downsample()[i]).to_string(),
            flag_str(pop.is_root()[i]).to_string(),
            flag_str(pop.is_leaf()[i]).to_string(),
            format_value(pseudotime[i]),
            flag_str(pop.seed_flag()[i]).to_string(),
            pop.seed_cluster_id()[i].to_string(),
            format_value(pop.traj_value()[i]),
            format_value(pop.traj_value_log()[i]),
        ];
        lines.push(words.join(delim).into_boxed_str());
    }

    write_lines(&lines, file)?;
    info!("wrote {}", file);
    Ok(())
}

///
/// Write the seed-cluster mapping: `cell`, `seed_flag`, `seed_cluster`
/// for every downsampled cell, in population order
///
pub fn write_seed_mapping(
    pop: &CellPopulation,
    seed_rows: &[usize],
    assignment: &[usize],
    file: &str,
) -> anyhow::Result<()> {
    mkdir(file)?;

    let rows = pop.downsampled_indices();
    if rows.len() != assignment.len() {
        anyhow::bail!(
            "{} seed assignments for {} downsampled cells",
            assignment.len(),
            rows.len()
        );
    }

    let mut is_seed = vec![false; rows.len()];
    for &r in seed_rows {
        is_seed[r] = true;
    }

    let delim = detect_delimiter(file);
    let mut lines: Vec<Box<str>> = Vec::with_capacity(rows.len() + 1);
    lines.push(["cell", "seed_flag", "seed_cluster"].join(delim).into_boxed_str());

    for (r, &i) in rows.iter().enumerate() {
        lines.push(
            format!(
                "{}{}{}{}{}",
                pop.cells()[i],
                delim,
                flag_str(is_seed[r]),
                delim,
                assignment[r]
            )
            .into_boxed_str(),
        );
    }

    write_lines(&lines, file)?;
    info!("wrote {}", file);
    Ok(())
}
