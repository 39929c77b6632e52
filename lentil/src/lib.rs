pub mod common;
pub mod dimension;
pub mod error;
pub mod fitted;
pub mod io;
pub mod population;
pub mod pseudotime;
pub mod seed_sampler;
pub mod selector;

pub use dimension::DimType;
pub use error::{LentilError, Result};
pub use fitted::{Fitted, Notice};
pub use population::CellPopulation;
pub use pseudotime::{estimate_pseudotime, estimate_pseudotime_with, PseudotimeArgs, PseudotimeFit};
pub use seed_sampler::{sample_seeds, SeedSampling};
pub use selector::{define_leaf_cells, define_root_cells, CellSelector};
