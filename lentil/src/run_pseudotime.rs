use clap::Args;
use lentil::common::*;
use lentil::dimension::DimType;
use lentil::io::{read_population, write_population};
use lentil::pseudotime::{estimate_pseudotime_with, PseudotimeArgs};
use lentil::selector::{define_leaf_cells, define_root_cells, CellSelector};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(
        long,
        short = 'c',
        required = true,
        help = "Cell table",
        long_help = "Cell table with a header line.\n\
		     Columns: `cell` (required), `cluster` and `downsample` (optional).\n\
		     `.csv` files are comma-separated, others tab-separated."
    )]
    cells: Box<str>,

    #[arg(
        long,
        short = 'm',
        help = "Marker expression matrix",
        long_help = "Marker expression matrix (cells x markers).\n\
		     The first column holds cell names. Used for `--dim-type raw`\n\
		     and whenever the requested embedding is missing."
    )]
    markers: Option<Box<str>>,

    #[arg(
        long,
        short = 'e',
        help = "Embedding matrix",
        long_help = "Precomputed embedding (cells x dimensions) in the space\n\
		     given by `--dim-type`, e.g., columns `UMAP_1`, `UMAP_2`."
    )]
    embedding: Option<Box<str>>,

    #[arg(
        long,
        short = 't',
        default_value = "umap",
        help = "Coordinate space (raw, pca, tsne, dc, umap)"
    )]
    dim_type: DimType,

    #[arg(
        long,
        value_delimiter(','),
        default_value = "1,2",
        help = "Dimensions to use (1-based, comma-separated)",
        long_help = "Dimensions to use (1-based, comma-separated).\n\
		     Embedding columns are matched by name first (`UMAP_1`),\n\
		     then by position."
    )]
    dim_use: Vec<usize>,

    #[arg(
        long,
        default_value = "undirected",
        help = "Graph connectivity",
        long_help = "How kNN arcs become graph edges:\n\
		     directed, undirected, upper, lower, max, min, plus."
    )]
    mode: Connectivity,

    #[arg(long, short = 'k', default_value_t = DEFAULT_KNN, help = "#k-nearest neighbours")]
    knn: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_SEEDS,
        help = "Maximum number of seed cells",
        long_help = "Maximum number of seed cells.\n\
		     Above this, cells are grouped by k-means and every\n\
		     cell takes the pseudotime of its cluster's seed."
    )]
    max_seeds: usize,

    #[arg(
        long,
        short = 'r',
        required = true,
        help = "Root cells, `cells:A,B` or `clusters:1,2`"
    )]
    root: CellSelector,

    #[arg(long, short = 'l', help = "Leaf cells, `cells:A,B` or `clusters:1,2`")]
    leaf: Option<CellSelector>,

    #[arg(
        long,
        default_value_t = 0.0,
        help = "Minimum pseudotime of leaf cells"
    )]
    leaf_cutoff: f32,

    #[arg(
        long,
        default_value_t = false,
        help = "Approximate kNN search (HNSW)",
        long_help = "Use approximate nearest neighbour search (HNSW)\n\
		     instead of the exact search."
    )]
    hnsw: bool,

    #[arg(long, short, required = true, help = "Output header")]
    out: Box<str>,

    #[arg(
        long,
        short,
        help = "Verbosity",
        long_help = "Enable verbose output.\n\
		     Prints additional information during execution."
    )]
    verbose: bool,
}

pub fn run_pseudotime(args: &RunArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    //////////////////////
    // 1. Read the data //
    //////////////////////

    let pop = read_population(
        &args.cells,
        args.markers.as_deref(),
        args.embedding.as_deref().map(|f| (args.dim_type, f)),
    )?;

    info!("{:?}", pop.summary());

    /////////////////////////////////
    // 2. Roots and pseudotime     //
    /////////////////////////////////

    let pop = define_root_cells(pop, &args.root, args.verbose)?.into_value();

    let params = PseudotimeArgs {
        dim_type: args.dim_type,
        dim_use: args.dim_use.clone(),
        mode: args.mode,
        knn: args.knn,
        max_seeds: args.max_seeds,
        verbose: args.verbose,
    };

    let fit = if args.hnsw {
        estimate_pseudotime_with(pop, &params, &HnswSearch::default())?
    } else {
        estimate_pseudotime_with(pop, &params, &ExactSearch::default())?
    };

    let summary = fit.value.summary;
    let mut pop = fit.value.population;

    ///////////////////
    // 3. Leaf cells //
    ///////////////////

    if let Some(leaf) = args.leaf.as_ref() {
        pop = define_leaf_cells(pop, leaf, args.leaf_cutoff, args.verbose)?.into_value();
    }

    //////////////////
    // 4. Write out //
    //////////////////

    let out_file = format!("{}.pseudotime.tsv.gz", args.out);
    write_population(&pop, &out_file)?;

    info!(
        "{} cells, {} seeds, {} edges, {} component(s), {} unreachable",
        summary.n_cells, summary.n_seeds, summary.n_edges, summary.n_components, summary.n_unreachable
    );
    Ok(())
}
