//! K-means clustering of matrix rows
//!
//! Thin wrapper over the `clustering` crate for cells × features data.

use log::info;
use nalgebra::DMatrix;

/// Arguments for k-means clustering
#[derive(Debug, Clone)]
pub struct KmeansArgs {
    /// Number of clusters
    pub num_clusters: usize,
    /// Maximum number of iterations
    pub max_iter: usize,
}

impl Default for KmeansArgs {
    fn default() -> Self {
        Self {
            num_clusters: 1,
            max_iter: 100,
        }
    }
}

impl KmeansArgs {
    /// Create args with specified number of clusters
    pub fn with_clusters(num_clusters: usize) -> Self {
        Self {
            num_clusters,
            ..Default::default()
        }
    }
}

/// Trait for k-means clustering on matrices
pub trait Kmeans {
    /// Cluster rows and return membership vector, one 0-based cluster
    /// index per row. Some of the `num_clusters` clusters may be empty.
    fn kmeans_rows(&self, args: KmeansArgs) -> Vec<usize>;
}

impl<T> Kmeans for DMatrix<T>
where
    T: Clone + Sync + Send + nalgebra::Scalar,
    Vec<T>: clustering::Elem,
{
    fn kmeans_rows(&self, args: KmeansArgs) -> Vec<usize> {
        if args.num_clusters <= 1 || self.nrows() == 0 {
            return vec![0; self.nrows()];
        }

        if args.num_clusters >= self.nrows() {
            return (0..self.nrows()).collect();
        }

        info!(
            "k-means: {} rows x {} columns, k={}, max_iter={}",
            self.nrows(),
            self.ncols(),
            args.num_clusters,
            args.max_iter
        );

        let data: Vec<Vec<T>> = self
            .row_iter()
            .map(|x| x.iter().cloned().collect())
            .collect();

        let clust = clustering::kmeans(args.num_clusters, &data, args.max_iter);
        clust.membership
    }
}

/// Number of members per cluster index
pub fn cluster_sizes(membership: &[usize], num_clusters: usize) -> Vec<usize> {
    let mut counts = vec![0; num_clusters];
    for &k in membership {
        if k < num_clusters {
            counts[k] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kmeans_rows_single_cluster() {
        let mat = DMatrix::from_row_slice(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let membership = mat.kmeans_rows(KmeansArgs::with_clusters(1));
        assert_eq!(membership, vec![0; 4]);
    }

    #[test]
    fn test_kmeans_rows_two_clusters() {
        let mat = DMatrix::from_row_slice(
            6,
            2,
            &[
                0.0, 0.0, // A
                0.1, 0.1, // A
                0.0, 0.1, // A
                10.0, 10.0, // B
                10.1, 10.1, // B
                10.2, 10.0, // B
            ],
        );

        let membership = mat.kmeans_rows(KmeansArgs::with_clusters(2));
        assert_eq!(membership.len(), 6);
        assert_eq!(membership[0], membership[1]);
        assert_eq!(membership[1], membership[2]);
        assert_eq!(membership[3], membership[4]);
        assert_eq!(membership[4], membership[5]);
        assert_ne!(membership[0], membership[3]);
    }

    #[test]
    fn test_kmeans_more_clusters_than_rows() {
        let mat = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        assert_eq!(mat.kmeans_rows(KmeansArgs::with_clusters(5)), vec![0, 1, 2]);
    }

    #[test]
    fn test_kmeans_empty_matrix() {
        let mat: DMatrix<f32> = DMatrix::zeros(0, 0);
        assert!(mat.kmeans_rows(KmeansArgs::with_clusters(2)).is_empty());
    }

    #[test]
    fn test_cluster_sizes() {
        assert_eq!(cluster_sizes(&[0, 2, 2, 5], 3), vec![1, 0, 2]);
    }
}
