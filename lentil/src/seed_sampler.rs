//! Seed sampling for large populations
//!
//! Graph distances are computed on at most `max_size` seed cells. Above
//! that, k-means with `max_size` centres groups the cells and the first
//! member (in row order) of each cluster becomes its seed; every member
//! later inherits the seed's pseudotime. Fidelity drops for large,
//! heterogeneous clusters.

use crate::common::*;
use matrix_util::clustering::{cluster_sizes, Kmeans, KmeansArgs};
use matrix_util::utils::partition_by_membership;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedSampling {
    /// Row of each seed, in seed-cluster order (seed `k` has cluster `k + 1`)
    pub seed_rows: Vec<usize>,
    /// 1-based seed cluster of every row
    pub assignment: Vec<usize>,
    /// Whether k-means was needed
    pub subsampled: bool,
}

impl SeedSampling {
    /// Every row is its own seed
    pub fn identity(nrows: usize) -> Self {
        Self {
            seed_rows: (0..nrows).collect(),
            assignment: (1..=nrows).collect(),
            subsampled: false,
        }
    }

    /// Seeds from a 0-based cluster membership: the first row of each
    /// non-empty cluster. Clusters are renumbered `1..` following their
    /// original index, skipping empty ones.
    pub fn from_membership(membership: &[usize]) -> Self {
        let groups = partition_by_membership(membership);
        let mut clusters: Vec<usize> = groups.keys().copied().collect();
        clusters.sort_unstable();

        let mut relabel: HashMap<usize, usize> = HashMap::default();
        let mut seed_rows = Vec::with_capacity(clusters.len());
        for k in clusters {
            // members are listed in row order
            seed_rows.push(groups[&k][0]);
            relabel.insert(k, seed_rows.len());
        }

        Self {
            seed_rows,
            assignment: membership.iter().map(|k| relabel[k]).collect(),
            subsampled: true,
        }
    }

    pub fn num_seeds(&self) -> usize {
        self.seed_rows.len()
    }

    /// 0-based seed (graph node) of a row
    pub fn seed_of(&self, row: usize) -> usize {
        self.assignment[row] - 1
    }

    /// Seed node of each row, or `None` if the row is not itself a seed
    pub fn row_to_seed(&self) -> Vec<Option<usize>> {
        let mut ret = vec![None; self.assignment.len()];
        for (node, &row) in self.seed_rows.iter().enumerate() {
            ret[row] = Some(node);
        }
        ret
    }

    /// Rows of the seeds only, in seed order
    pub fn seed_matrix(&self, mat: &Mat) -> Mat {
        mat.select_rows(self.seed_rows.iter())
    }
}

/// Pick seed cells for `mat` (rows = cells)
pub fn sample_seeds(mat: &Mat, max_size: usize) -> Result<SeedSampling> {
    if max_size == 0 {
        return Err(LentilError::InvalidArgument(
            "maximum number of seeds must be positive".into(),
        ));
    }

    let nrows = mat.nrows();
    if nrows <= max_size {
        return Ok(SeedSampling::identity(nrows));
    }

    info!(
        "{} cells exceed {}; sampling seeds by k-means",
        nrows, max_size
    );

    let membership = mat.kmeans_rows(KmeansArgs::with_clusters(max_size));
    let sampling = SeedSampling::from_membership(&membership);
    let largest = cluster_sizes(&membership, max_size)
        .into_iter()
        .max()
        .unwrap_or(0);

    info!(
        "{} seeds represent {} cells ({} empty clusters skipped, largest has {} cells)",
        sampling.num_seeds(),
        nrows,
        max_size - sampling.num_seeds(),
        largest
    );
    Ok(sampling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_below_threshold() {
        let mat = Mat::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let s = sample_seeds(&mat, 4).unwrap();
        assert!(!s.subsampled);
        assert_eq!(s.seed_rows, vec![0, 1, 2, 3]);
        assert_eq!(s.assignment, vec![1, 2, 3, 4]);
        assert_eq!(s.seed_matrix(&mat), mat);
    }

    #[test]
    fn test_first_member_is_seed() {
        // cluster 2 is empty, cluster 0 first appears at row 1
        let s = SeedSampling::from_membership(&[1, 0, 3, 0, 1, 3]);
        assert_eq!(s.seed_rows, vec![1, 0, 2]);
        assert_eq!(s.assignment, vec![2, 1, 3, 1, 2, 3]);
        assert_eq!(s.seed_of(4), 1);
        assert_eq!(
            s.row_to_seed(),
            vec![Some(1), Some(0), Some(2), None, None, None]
        );
    }

    #[test]
    fn test_kmeans_above_threshold() {
        let mat = Mat::from_row_slice(
            6,
            2,
            &[
                0.0, 0.0, //
                10.0, 10.0, //
                0.1, 0.0, //
                10.1, 10.0, //
                0.0, 0.1, //
                10.0, 10.1, //
            ],
        );
        let s = sample_seeds(&mat, 2).unwrap();
        assert!(s.subsampled);
        assert_eq!(s.num_seeds(), 2);

        // each group shares a seed cluster; the first row of a group is the seed
        assert_eq!(s.assignment[0], s.assignment[2]);
        assert_eq!(s.assignment[0], s.assignment[4]);
        assert_eq!(s.assignment[1], s.assignment[3]);
        assert_ne!(s.assignment[0], s.assignment[1]);
        let mut seeds = s.seed_rows.clone();
        seeds.sort();
        assert_eq!(seeds, vec![0, 1]);

        let seed_mat = s.seed_matrix(&mat);
        assert_eq!(seed_mat.nrows(), 2);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mat = Mat::zeros(3, 1);
        assert!(matches!(
            sample_seeds(&mat, 0),
            Err(LentilError::InvalidArgument(_))
        ));
    }
}
