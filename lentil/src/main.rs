mod run_pseudotime;
mod run_seeds;

use clap::{Parser, Subcommand};
use run_pseudotime::*;
use run_seeds::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Pseudotime ordering of cytometry cells\n\
		  Cells are connected by k-nearest neighbours in marker or\n\
		  embedding space; pseudotime is the mean graph distance\n\
		  from the root cells, scaled to [0, 1]."
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Estimate pseudotime from root cells",
        long_about = "Estimate pseudotime in the three stages: \n\
		      (1) Mark root cells among the downsampled cells\n\
		      (2) Build a kNN graph over seed cells\n\
		      (3) Average hop distances from the roots and scale to [0, 1].\n\
		      Leaf cells can be marked afterwards with a pseudotime cutoff.\n"
    )]
    Run(RunArgs),

    #[command(
        about = "Group cells into seed clusters",
        long_about = "Group downsampled cells by k-means when they exceed\n\
		      `--max-seeds` and report each cell's seed cluster.\n\
		      The first member of each cluster is its seed.\n"
    )]
    Seeds(SeedsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.commands {
        Commands::Run(args) => {
            run_pseudotime(args)?;
        }
        Commands::Seeds(args) => {
            run_seeds(args)?;
        }
    }

    log::info!("Done");
    Ok(())
}
