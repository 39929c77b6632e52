use crate::utils::generate_minibatch_intervals;
use indicatif::ParallelProgressIterator;
use log::info;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::cmp::Ordering;

const DEFAULT_BLOCK_SIZE: usize = 1000;

/// For each row of a coordinate matrix, the row indices of its `k`
/// nearest neighbours (closest first) and the matching distances.
#[derive(Clone, Debug, Default)]
pub struct KnnIndex {
    pub neighbors: Vec<Vec<usize>>,
    pub distances: Vec<Vec<f32>>,
}

impl KnnIndex {
    /// Wrap a precomputed neighbour table; distances are left at zero
    pub fn from_neighbors(neighbors: Vec<Vec<usize>>) -> Self {
        let distances = neighbors.iter().map(|nn| vec![0.0; nn.len()]).collect();
        Self {
            neighbors,
            distances,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors_of(&self, row: usize) -> &[usize] {
        &self.neighbors[row]
    }

    /// Every neighbour index must point at an existing row
    pub fn validate(&self) -> anyhow::Result<()> {
        let nn = self.num_rows();
        for (i, nbrs) in self.neighbors.iter().enumerate() {
            if let Some(&j) = nbrs.iter().find(|&&j| j >= nn) {
                anyhow::bail!("row {} lists neighbour {} out of {} rows", i, j, nn);
            }
        }
        Ok(())
    }
}

/// Something that can find the `knn` nearest rows of each row
pub trait NeighborSearch {
    fn search_rows(&self, points: &DMatrix<f32>, knn: usize) -> anyhow::Result<KnnIndex>;
}

#[derive(Clone, Debug)]
/// a wrapper for Vec<f32>
pub struct VecPoint {
    pub data: Vec<f32>,
}

impl VecPoint {
    fn rows_of(points: &DMatrix<f32>) -> Vec<VecPoint> {
        points
            .row_iter()
            .map(|r| VecPoint {
                data: r.iter().cloned().collect(),
            })
            .collect()
    }

    fn euclidean(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }
}

impl instant_distance::Point for VecPoint {
    fn distance(&self, other: &Self) -> f32 {
        self.euclidean(other)
    }
}

/// Brute-force Euclidean search. Deterministic: equal distances are
/// broken by the smaller row index.
#[derive(Clone, Debug)]
pub struct ExactSearch {
    pub block_size: usize,
}

impl Default for ExactSearch {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl NeighborSearch for ExactSearch {
    fn search_rows(&self, points: &DMatrix<f32>, knn: usize) -> anyhow::Result<KnnIndex> {
        let nn = points.nrows();
        let nquery = knn.min(nn.saturating_sub(1));
        let pts = VecPoint::rows_of(points);

        let jobs = generate_minibatch_intervals(nn, self.block_size.max(1));
        let njobs = jobs.len() as u64;

        let blocks: Vec<Vec<(Vec<usize>, Vec<f32>)>> = jobs
            .into_par_iter()
            .progress_count(njobs)
            .map(|(lb, ub)| {
                (lb..ub)
                    .map(|i| {
                        let mut cand: Vec<(f32, usize)> = (0..nn)
                            .filter(|&j| j != i)
                            .map(|j| (pts[i].euclidean(&pts[j]), j))
                            .collect();

                        let by_dist = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
                            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
                        };

                        if nquery < cand.len() && nquery > 0 {
                            cand.select_nth_unstable_by(nquery - 1, by_dist);
                        }
                        cand.truncate(nquery);
                        cand.sort_by(by_dist);
                        cand.into_iter().map(|(d, j)| (j, d)).unzip()
                    })
                    .collect()
            })
            .collect();

        let (neighbors, distances): (Vec<_>, Vec<_>) = blocks.into_iter().flatten().unzip();

        info!("exact kNN: {} rows, {} neighbours each", nn, nquery);
        Ok(KnnIndex {
            neighbors,
            distances,
        })
    }
}

/// Approximate search over a HNSW dictionary (`instant-distance`)
#[derive(Clone, Debug, Default)]
pub struct HnswSearch {
    pub seed: Option<u64>,
}

impl NeighborSearch for HnswSearch {
    fn search_rows(&self, points: &DMatrix<f32>, knn: usize) -> anyhow::Result<KnnIndex> {
        use instant_distance::{Builder, Search};

        let nn = points.nrows();
        let pts = VecPoint::rows_of(points);
        let names = (0..nn).collect::<Vec<_>>();

        let mut builder = Builder::default();
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        let dict = builder.build(pts.clone(), names);

        // one extra to make room for the query itself
        let nquery = (knn + 1).min(nn);

        let (neighbors, distances): (Vec<Vec<usize>>, Vec<Vec<f32>>) = (0..nn)
            .into_par_iter()
            .progress_count(nn as u64)
            .map(|i| {
                let mut search = Search::default();
                dict.search(&pts[i], &mut search)
                    .take(nquery)
                    .filter(|item| *item.value != i)
                    .take(knn)
                    .map(|item| (*item.value, item.distance))
                    .unzip()
            })
            .unzip();

        info!("HNSW kNN: {} rows, up to {} neighbours each", nn, knn);
        Ok(KnnIndex {
            neighbors,
            distances,
        })
    }
}
