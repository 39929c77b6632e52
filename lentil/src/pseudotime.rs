//! Pseudotime from graph distances to root cells
//!
//! 1. take coordinates of the downsampled cells (raw markers or an embedding)
//! 2. reduce to seed cells if there are too many
//! 3. build the kNN graph over the seeds
//! 4. hop counts from every root seed by BFS
//! 5. per seed, the mean hop count over the roots that reach it
//! 6. min-max scale to [0, 1] and copy each seed's value to its cluster

use crate::common::*;
use crate::dimension::DimType;
use crate::fitted::raise;
use crate::population::CellPopulation;
use crate::seed_sampler::{sample_seeds, SeedSampling};

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct PseudotimeArgs {
    pub dim_type: DimType,
    /// 1-based dimensions to use; empty = all columns of the table
    pub dim_use: Vec<usize>,
    pub mode: Connectivity,
    pub knn: usize,
    pub max_seeds: usize,
    pub verbose: bool,
}

impl Default for PseudotimeArgs {
    fn default() -> Self {
        Self {
            dim_type: DimType::Umap,
            dim_use: vec![1, 2],
            mode: Connectivity::Undirected,
            knn: DEFAULT_KNN,
            max_seeds: DEFAULT_MAX_SEEDS,
            verbose: false,
        }
    }
}

/// What happened during one estimation
#[derive(Clone, Debug, PartialEq)]
pub struct PseudotimeSummary {
    pub dim_type: DimType,
    pub n_cells: usize,
    pub n_seeds: usize,
    pub n_edges: usize,
    pub n_components: usize,
    pub n_roots_used: usize,
    pub n_unreachable: usize,
}

#[derive(Clone, Debug)]
pub struct PseudotimeFit {
    pub population: CellPopulation,
    pub summary: PseudotimeSummary,
}

/// Estimate pseudotime with exact kNN search
pub fn estimate_pseudotime(pop: CellPopulation, args: &PseudotimeArgs) -> Result<Fitted<PseudotimeFit>> {
    estimate_pseudotime_with(pop, args, &ExactSearch::default())
}

/// Estimate pseudotime with a given neighbour search
pub fn estimate_pseudotime_with(
    pop: CellPopulation,
    args: &PseudotimeArgs,
    search: &dyn NeighborSearch,
) -> Result<Fitted<PseudotimeFit>> {
    if pop.is_empty() {
        return Err(LentilError::MissingObject("cell population is empty".into()));
    }
    if pop.root_cells().is_empty() {
        return Err(LentilError::NoRootCells);
    }
    if args.knn == 0 {
        return Err(LentilError::InvalidArgument("knn must be positive".into()));
    }

    let mut notices = vec![];
    let verbose = args.verbose;

    ////////////////////////////////////////
    // step 1: coordinates and seed cells //
    ////////////////////////////////////////

    let rows = pop.downsampled_indices();
    let (coords, dim_type) = select_coordinates(&pop, args.dim_type, &args.dim_use, &mut notices)?;

    if verbose {
        info!(
            "{} coordinates: {} cells x {} dimensions",
            dim_type,
            coords.nrows(),
            coords.ncols()
        );
    }

    let sampling = sample_seeds(&coords, args.max_seeds)?;
    let seed_coords = sampling.seed_matrix(&coords);

    ///////////////////////////////
    // step 2: kNN graph on seeds //
    ///////////////////////////////

    let index = search.search_rows(&seed_coords, args.knn)?;
    if index.num_rows() != seed_coords.nrows() {
        return Err(LentilError::Other(anyhow::anyhow!(
            "neighbour search returned {} rows for {} seeds",
            index.num_rows(),
            seed_coords.nrows()
        )));
    }
    let graph = KnnGraph::from_knn_index(&index, args.mode)?;
    let n_components = graph.count_components();

    if verbose {
        info!(
            "kNN graph ({}, k={}): {} nodes, {} edges, {} component(s)",
            args.mode,
            args.knn,
            graph.num_nodes(),
            graph.num_edges(),
            n_components
        );
    }

    ////////////////////////////////
    // step 3: root seeds and BFS //
    ////////////////////////////////

    let root_nodes = root_seed_nodes(&pop, &rows, &sampling, &mut notices, verbose)?;
    let mean_hops = mean_root_hops(&graph, &root_nodes);
    let scaled = min_max_scale(&mean_hops);

    ////////////////////////////////////////
    // step 4: back to every original cell //
    ////////////////////////////////////////

    let nn = pop.len();
    let mut pseudotime = vec![0.0_f32; nn];
    let mut seed_flag = vec![false; nn];
    let mut seed_cluster_id = vec![0_usize; nn];

    for (r, &cell) in rows.iter().enumerate() {
        let node = sampling.seed_of(r);
        pseudotime[cell] = scaled[node].map(|x| x as f32).unwrap_or(f32::NAN);
        seed_cluster_id[cell] = sampling.assignment[r];
    }
    for &r in sampling.seed_rows.iter() {
        seed_flag[rows[r]] = true;
    }

    let n_unreachable = rows.iter().filter(|&&c| pseudotime[c].is_nan()).count();
    if n_unreachable > 0 {
        raise(
            &mut notices,
            Notice::UnreachableCells {
                count: n_unreachable,
            },
        );
    }

    if pop.has_pseudotime() {
        raise(&mut notices, Notice::PseudotimeReplaced);
    }

    let mut population = pop;
    population.set_pseudotime(pseudotime, seed_flag, seed_cluster_id);

    let summary = PseudotimeSummary {
        dim_type,
        n_cells: rows.len(),
        n_seeds: sampling.num_seeds(),
        n_edges: graph.num_edges(),
        n_components,
        n_roots_used: root_nodes.len(),
        n_unreachable,
    };

    if verbose {
        info!("pseudotime: {:?}", summary);
    }

    Ok(Fitted::new(
        PseudotimeFit {
            population,
            summary,
        },
        notices,
    ))
}

/// Coordinates of the downsampled cells (population order) in the
/// requested space, or raw markers if that space is not available.
pub fn select_coordinates(
    pop: &CellPopulation,
    dim_type: DimType,
    dim_use: &[usize],
    notices: &mut Vec<Notice>,
) -> Result<(Mat, DimType)> {
    let dim_type = if pop.embedding(dim_type).is_some() {
        dim_type
    } else if dim_type != DimType::Raw && pop.markers().is_some() {
        raise(notices, Notice::DimensionFallback { requested: dim_type });
        DimType::Raw
    } else {
        return Err(LentilError::MissingObject(format!(
            "no {} coordinates and no marker matrix",
            dim_type
        )));
    };

    let table = pop
        .embedding(dim_type)
        .ok_or_else(|| LentilError::MissingObject(format!("{} coordinates", dim_type)))?;

    // `dim_use` indexes embedding dimensions; raw always takes every marker
    let dim_use = if dim_type == DimType::Raw {
        &[][..]
    } else {
        dim_use
    };
    let columns = select_columns(table, dim_type, dim_use)?;

    let row_of: HashMap<&str, usize> = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.as_ref(), i))
        .collect();

    let cells = pop.cells();
    let rows = pop.downsampled_indices();
    let mut coords = Mat::zeros(rows.len(), columns.len());

    for (r, &cell) in rows.iter().enumerate() {
        let src = *row_of.get(cells[cell].as_ref()).ok_or_else(|| {
            LentilError::InvalidArgument(format!("no coordinates for cell {}", cells[cell]))
        })?;
        for (c, &col) in columns.iter().enumerate() {
            coords[(r, c)] = table.mat[(src, col)];
        }
    }

    Ok((coords, dim_type))
}

/// 0-based column indices for 1-based `dim_use`
fn select_columns(table: &MatWithNames<Mat>, dim_type: DimType, dim_use: &[usize]) -> Result<Vec<usize>> {
    let ncols = table.mat.ncols();
    if dim_use.is_empty() {
        return Ok((0..ncols).collect());
    }

    let by_name = dim_type.column_names(dim_use);

    dim_use
        .iter()
        .enumerate()
        .map(|(k, &d)| {
            // embeddings are looked up by name, falling back to position
            let named = by_name
                .as_ref()
                .and_then(|names| table.cols.iter().position(|c| *c == names[k]));
            match named {
                Some(j) => Ok(j),
                None if d >= 1 && d <= ncols => Ok(d - 1),
                None => Err(LentilError::InvalidArgument(format!(
                    "dimension {} is out of range for {} ({} columns)",
                    d, dim_type, ncols
                ))),
            }
        })
        .collect()
}

/// Graph nodes of the root cells that are seeds. When sampling removed
/// all of them, the seeds of their clusters stand in.
fn root_seed_nodes(
    pop: &CellPopulation,
    rows: &[usize],
    sampling: &SeedSampling,
    notices: &mut Vec<Notice>,
    verbose: bool,
) -> Result<Vec<usize>> {
    let is_root = pop.is_root();
    let row_to_seed = sampling.row_to_seed();

    let root_rows: Vec<usize> = (0..rows.len()).filter(|&r| is_root[rows[r]]).collect();
    if root_rows.is_empty() {
        return Err(LentilError::NoRootCells);
    }

    let mut nodes: Vec<usize> = root_rows.iter().filter_map(|&r| row_to_seed[r]).collect();

    if verbose && nodes.len() < root_rows.len() {
        info!(
            "{} of {} root cells are not seeds and were left out",
            root_rows.len() - nodes.len(),
            root_rows.len()
        );
    }

    if nodes.is_empty() {
        nodes = root_rows.iter().map(|&r| sampling.seed_of(r)).collect();
        nodes.sort_unstable();
        nodes.dedup();
        raise(notices, Notice::RootsMappedToSeeds { seeds: nodes.len() });
    }
    Ok(nodes)
}

/// Mean hop count from the roots to every node, over roots with a path;
/// `None` when no root reaches the node.
///
/// Hop counts are summed as integers, so the result does not depend on
/// how the roots are split across threads.
pub fn mean_root_hops(graph: &KnnGraph, roots: &[usize]) -> Vec<Option<f64>> {
    let nn = graph.num_nodes();

    let (sum, cnt) = roots
        .par_iter()
        .progress_count(roots.len() as u64)
        .fold(
            || (vec![0_u64; nn], vec![0_u32; nn]),
            |(mut sum, mut cnt), &root| {
                for (v, h) in graph.hop_distances(root).into_iter().enumerate() {
                    if h != UNREACHABLE {
                        sum[v] += h as u64;
                        cnt[v] += 1;
                    }
                }
                (sum, cnt)
            },
        )
        .reduce(
            || (vec![0_u64; nn], vec![0_u32; nn]),
            |(mut s1, mut c1), (s2, c2)| {
                for v in 0..nn {
                    s1[v] += s2[v];
                    c1[v] += c2[v];
                }
                (s1, c1)
            },
        );

    sum.into_iter()
        .zip(cnt)
        .map(|(s, c)| (c > 0).then(|| s as f64 / c as f64))
        .collect()
}

/// `(x - min) / (max - min)` over the defined values; all zeros when
/// every defined value is the same
pub fn min_max_scale(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let defined = values.iter().flatten();
    let lo = defined.clone().copied().fold(f64::INFINITY, f64::min);
    let hi = defined.copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;

    values
        .iter()
        .map(|x| {
            x.map(|x| {
                if range > 0.0 {
                    (x - lo) / range
                } else {
                    0.0
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(nn: usize) -> KnnGraph {
        let nbrs = (0..nn)
            .map(|i| if i + 1 < nn { vec![i + 1] } else { vec![] })
            .collect();
        KnnGraph::from_knn_index(&KnnIndex::from_neighbors(nbrs), Connectivity::Undirected).unwrap()
    }

    #[test]
    fn test_mean_hops_single_root() {
        let hops = mean_root_hops(&path_graph(5), &[0]);
        assert_eq!(
            hops,
            vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn test_mean_hops_two_roots() {
        let hops = mean_root_hops(&path_graph(5), &[0, 4]);
        assert_eq!(hops, vec![Some(2.0); 5]);
    }

    #[test]
    fn test_mean_hops_ignores_unreachable_roots() {
        // 0 - 1   2 - 3
        let index = KnnIndex::from_neighbors(vec![vec![1], vec![], vec![3], vec![]]);
        let graph = KnnGraph::from_knn_index(&index, Connectivity::Undirected).unwrap();
        let hops = mean_root_hops(&graph, &[0, 3]);
        assert_eq!(hops, vec![Some(0.0), Some(1.0), Some(1.0), Some(0.0)]);

        let hops = mean_root_hops(&graph, &[0]);
        assert_eq!(hops, vec![Some(0.0), Some(1.0), None, None]);
    }

    #[test]
    fn test_roots_outside_seeds_use_cluster_seeds() -> Result<()> {
        let cells = ["a", "b", "c", "d", "e"];
        let mut pop = CellPopulation::new(cells.iter().map(|&x| x.into()).collect())?;
        pop.set_roots(&[1, 4]);

        // seeds are rows 0 and 2; roots b and e are members only
        let sampling = SeedSampling::from_membership(&[0, 0, 1, 1, 1]);
        let rows = pop.downsampled_indices();
        let mut notices = vec![];
        let nodes = root_seed_nodes(&pop, &rows, &sampling, &mut notices, false)?;

        assert_eq!(nodes, vec![0, 1]);
        assert_eq!(notices, vec![Notice::RootsMappedToSeeds { seeds: 2 }]);

        // a root that is a seed wins; the others drop silently
        pop.set_roots(&[0, 4]);
        let mut notices = vec![];
        let nodes = root_seed_nodes(&pop, &rows, &sampling, &mut notices, false)?;
        assert_eq!(nodes, vec![0]);
        assert!(notices.is_empty());
        Ok(())
    }

    #[test]
    fn test_min_max_scale() {
        let scaled = min_max_scale(&[Some(2.0), None, Some(4.0), Some(3.0)]);
        assert_eq!(scaled, vec![Some(0.0), None, Some(1.0), Some(0.5)]);
    }

    #[test]
    fn test_min_max_scale_degenerate() {
        assert_eq!(min_max_scale(&[Some(3.0), None, Some(3.0)]), vec![Some(0.0), None, Some(0.0)]);
        assert_eq!(min_max_scale(&[None, None]), vec![None, None]);
    }
}
