#![allow(dead_code)]

pub use log::{info, warn};

/// Number of nearest neighbours for the cell graph
pub const DEFAULT_KNN: usize = 30;

/// Above this many candidate cells, pseudotime is computed on k-means seeds
pub const DEFAULT_MAX_SEEDS: usize = 40_000;

pub type Mat = nalgebra::DMatrix<f32>;

pub use fnv::FnvHashMap as HashMap;
pub use fnv::FnvHashSet as HashSet;

pub use matrix_util::knn_graph::{Connectivity, KnnGraph, UNREACHABLE};
pub use matrix_util::knn_match::{ExactSearch, HnswSearch, KnnIndex, NeighborSearch};
pub use matrix_util::traits::MatWithNames;

pub use crate::error::{LentilError, Result};
pub use crate::fitted::{Fitted, Notice};
