use clap::Args;
use lentil::common::*;
use lentil::dimension::DimType;
use lentil::io::{read_population, write_seed_mapping};
use lentil::pseudotime::select_coordinates;
use lentil::seed_sampler::sample_seeds;

#[derive(Args, Debug)]
pub struct SeedsArgs {
    /// Cell table (`cell`, `cluster`, `downsample` columns)
    #[arg(long, short = 'c', required = true)]
    cells: Box<str>,

    /// Marker expression matrix (cells x markers)
    #[arg(long, short = 'm')]
    markers: Option<Box<str>>,

    /// Embedding matrix (cells x dimensions)
    #[arg(long, short = 'e')]
    embedding: Option<Box<str>>,

    /// Coordinate space (raw, pca, tsne, dc, umap)
    #[arg(long, short = 't', default_value = "umap")]
    dim_type: DimType,

    /// Dimensions to use (1-based, comma-separated)
    #[arg(long, value_delimiter(','), default_value = "1,2")]
    dim_use: Vec<usize>,

    /// Maximum number of seed cells
    #[arg(long, default_value_t = DEFAULT_MAX_SEEDS)]
    max_seeds: usize,

    /// Output header
    #[arg(long, short, required = true)]
    out: Box<str>,

    /// verbosity
    #[arg(long, short)]
    verbose: bool,
}

pub fn run_seeds(args: &SeedsArgs) -> anyhow::Result<()> {
    if args.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let pop = read_population(
        &args.cells,
        args.markers.as_deref(),
        args.embedding.as_deref().map(|f| (args.dim_type, f)),
    )?;

    let mut notices = vec![];
    let (coords, dim_type) = select_coordinates(&pop, args.dim_type, &args.dim_use, &mut notices)?;
    info!(
        "{} coordinates: {} cells x {} dimensions",
        dim_type,
        coords.nrows(),
        coords.ncols()
    );

    let sampling = sample_seeds(&coords, args.max_seeds)?;

    let out_file = format!("{}.seeds.tsv.gz", args.out);
    write_seed_mapping(&pop, &sampling.seed_rows, &sampling.assignment, &out_file)?;
    Ok(())
}
