use crate::knn_match::{KnnIndex, NeighborSearch};

use dashmap::DashSet;
use indicatif::ParallelProgressIterator;
use log::info;
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::str::FromStr;

/// Hop count of a node that cannot be reached from the source
pub const UNREACHABLE: u32 = u32::MAX;

/// How the directed "j is among i's k nearest" relation becomes edges
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// keep i → j as is
    Directed,
    /// i - j if i → j or j → i
    #[default]
    Undirected,
    /// use only i → j with i < j
    Upper,
    /// use only i → j with i > j
    Lower,
    /// same as `Undirected`
    Max,
    /// i - j only if i → j and j → i
    Min,
    /// same as `Undirected` (no weights)
    Plus,
}

impl FromStr for Connectivity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "directed" => Connectivity::Directed,
            "undirected" => Connectivity::Undirected,
            "upper" => Connectivity::Upper,
            "lower" => Connectivity::Lower,
            "max" => Connectivity::Max,
            "min" => Connectivity::Min,
            "plus" => Connectivity::Plus,
            other => anyhow::bail!("unknown connectivity mode: {}", other),
        })
    }
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Connectivity::Directed => "directed",
            Connectivity::Undirected => "undirected",
            Connectivity::Upper => "upper",
            Connectivity::Lower => "lower",
            Connectivity::Max => "max",
            Connectivity::Min => "min",
            Connectivity::Plus => "plus",
        };
        write!(f, "{}", name)
    }
}

pub struct KnnGraph {
    /// CSC adjacency (n_nodes x n_nodes); column `i` lists the nodes
    /// reachable in one hop from `i`
    pub adjacency: CscMatrix<f32>,
    /// Sorted edge list: `(i, j)` arcs if directed, else canonical `i < j`
    pub edges: Vec<(usize, usize)>,
    /// Number of nodes
    pub n_nodes: usize,
    pub directed: bool,
}

pub struct KnnGraphArgs {
    pub knn: usize,
    pub mode: Connectivity,
}

impl KnnGraph {
    /// Build a KNN graph from row vectors (cells × features).
    ///
    /// * `data` - matrix (n x d), where each row is a point
    /// * `args` - KNN graph construction parameters
    /// * `search` - neighbour search method
    pub fn from_rows(
        data: &DMatrix<f32>,
        args: KnnGraphArgs,
        search: &dyn NeighborSearch,
    ) -> anyhow::Result<KnnGraph> {
        let index = search.search_rows(data, args.knn)?;
        Self::from_knn_index(&index, args.mode)
    }

    /// Turn a neighbour table into an unweighted graph. Self-loops are
    /// dropped.
    pub fn from_knn_index(index: &KnnIndex, mode: Connectivity) -> anyhow::Result<KnnGraph> {
        index.validate()?;
        let nn = index.num_rows();

        /////////////////////////////////////////////
        // step 1: collect directed kNN relations  //
        /////////////////////////////////////////////

        let arcs: DashSet<(usize, usize)> = DashSet::new();
        let self_loops: usize = (0..nn)
            .into_par_iter()
            .progress_count(nn as u64)
            .map(|i| {
                let mut nself = 0;
                for &j in index.neighbors_of(i) {
                    if i == j {
                        nself += 1;
                    } else {
                        arcs.insert((i, j));
                    }
                }
                nself
            })
            .sum();

        info!(
            "{} kNN relations ({} self-loops removed)",
            arcs.len(),
            self_loops
        );

        ////////////////////////////////////////////
        // step 2: combine relations by the mode  //
        ////////////////////////////////////////////

        let mut edges: Vec<(usize, usize)> = match mode {
            Connectivity::Directed => arcs.iter().map(|e| *e.key()).collect(),
            Connectivity::Undirected | Connectivity::Max | Connectivity::Plus => arcs
                .iter()
                .map(|e| {
                    let (i, j) = *e.key();
                    (i.min(j), i.max(j))
                })
                .collect(),
            Connectivity::Min => arcs
                .iter()
                .filter_map(|e| {
                    let (i, j) = *e.key();
                    (i < j && arcs.contains(&(j, i))).then_some((i, j))
                })
                .collect(),
            Connectivity::Upper => arcs
                .iter()
                .filter_map(|e| {
                    let (i, j) = *e.key();
                    (i < j).then_some((i, j))
                })
                .collect(),
            Connectivity::Lower => arcs
                .iter()
                .filter_map(|e| {
                    let (i, j) = *e.key();
                    (i > j).then_some((j, i))
                })
                .collect(),
        };

        edges.par_sort();
        edges.dedup();

        info!("{} edges after {} matching", edges.len(), mode);

        ///////////////////////////////////////////////
        // step 3: construct sparse network backbone //
        ///////////////////////////////////////////////

        let directed = mode == Connectivity::Directed;
        let mut coo = CooMatrix::new(nn, nn);
        for &(i, j) in edges.iter() {
            coo.push(j, i, 1.0);
            if !directed {
                coo.push(i, j, 1.0);
            }
        }

        Ok(KnnGraph {
            adjacency: CscMatrix::from(&coo),
            edges,
            n_nodes: nn,
            directed,
        })
    }

    /// Get neighbors of a node from the CSC adjacency matrix
    pub fn neighbors(&self, node: usize) -> &[usize] {
        let offsets = self.adjacency.col_offsets();
        let start = offsets[node];
        let end = offsets[node + 1];
        &self.adjacency.row_indices()[start..end]
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Breadth-first hop counts from `source`; `UNREACHABLE` where no
    /// path exists
    pub fn hop_distances(&self, source: usize) -> Vec<u32> {
        let mut hops = vec![UNREACHABLE; self.n_nodes];
        let mut queue = VecDeque::new();
        hops[source] = 0;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            let next = hops[node] + 1;
            for &nb in self.neighbors(node) {
                if hops[nb] == UNREACHABLE {
                    hops[nb] = next;
                    queue.push_back(nb);
                }
            }
        }
        hops
    }

    /// Count (weakly) connected components
    pub fn count_components(&self) -> usize {
        let mut parent: Vec<usize> = (0..self.n_nodes).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut n_components = self.n_nodes;
        for &(i, j) in &self.edges {
            let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
            if ri != rj {
                parent[ri] = rj;
                n_components -= 1;
            }
        }
        n_components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knn_match::ExactSearch;

    /// 0 → 1, 1 → 0, 1 → 2, 2 → 3, 3 → 3 (self)
    fn chain_index() -> KnnIndex {
        KnnIndex::from_neighbors(vec![vec![1], vec![0, 2], vec![3], vec![3]])
    }

    /// Two tight clusters of 5 points each in 2D, well separated
    fn two_cluster_matrix() -> DMatrix<f32> {
        DMatrix::from_row_slice(
            10,
            2,
            &[
                // Cluster A near origin
                0.0, 0.0, //
                0.1, 0.0, //
                0.0, 0.1, //
                0.1, 0.1, //
                0.05, 0.05, //
                // Cluster B far away
                10.0, 10.0, //
                10.1, 10.0, //
                10.0, 10.1, //
                10.1, 10.1, //
                10.05, 10.05, //
            ],
        )
    }

    #[test]
    fn test_parse_connectivity() {
        assert_eq!("MIN".parse::<Connectivity>().unwrap(), Connectivity::Min);
        assert_eq!(
            "undirected".parse::<Connectivity>().unwrap(),
            Connectivity::Undirected
        );
        assert!("sideways".parse::<Connectivity>().is_err());
    }

    #[test]
    fn test_undirected_union_drops_self_loops() {
        let graph = KnnGraph::from_knn_index(&chain_index(), Connectivity::Undirected).unwrap();
        assert_eq!(graph.edges, vec![(0, 1), (1, 2), (2, 3)]);
        assert_eq!(graph.neighbors(3), &[2]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
    }

    #[test]
    fn test_min_keeps_reciprocal_only() {
        let graph = KnnGraph::from_knn_index(&chain_index(), Connectivity::Min).unwrap();
        assert_eq!(graph.edges, vec![(0, 1)]);
        assert!(graph.neighbors(2).is_empty());
    }

    #[test]
    fn test_upper_and_lower() {
        let index = KnnIndex::from_neighbors(vec![vec![2], vec![0], vec![]]);
        let upper = KnnGraph::from_knn_index(&index, Connectivity::Upper).unwrap();
        assert_eq!(upper.edges, vec![(0, 2)]);
        let lower = KnnGraph::from_knn_index(&index, Connectivity::Lower).unwrap();
        assert_eq!(lower.edges, vec![(0, 1)]);
        assert_eq!(lower.neighbors(0), &[1]);
    }

    #[test]
    fn test_directed_follows_arcs() {
        let graph = KnnGraph::from_knn_index(&chain_index(), Connectivity::Directed).unwrap();
        assert!(graph.directed);
        assert_eq!(graph.neighbors(2), &[3]);
        assert!(graph.neighbors(3).is_empty());
        assert_eq!(graph.hop_distances(0), vec![0, 1, 2, 3]);
        assert_eq!(graph.hop_distances(3), vec![UNREACHABLE, UNREACHABLE, UNREACHABLE, 0]);
    }

    #[test]
    fn test_hop_distances_and_components() {
        let index = KnnIndex::from_neighbors(vec![vec![1], vec![0], vec![3], vec![2]]);
        let graph = KnnGraph::from_knn_index(&index, Connectivity::Undirected).unwrap();
        assert_eq!(graph.count_components(), 2);
        assert_eq!(graph.hop_distances(0), vec![0, 1, UNREACHABLE, UNREACHABLE]);
    }

    #[test]
    fn test_from_rows_two_clusters() {
        let graph = KnnGraph::from_rows(
            &two_cluster_matrix(),
            KnnGraphArgs {
                knn: 4,
                mode: Connectivity::Undirected,
            },
            &ExactSearch::default(),
        )
        .unwrap();

        assert_eq!(graph.num_nodes(), 10);
        assert_eq!(graph.count_components(), 2);

        for &(i, j) in &graph.edges {
            assert!(i < j, "Edge ({}, {}) not canonical", i, j);
            let same_cluster = (i < 5 && j < 5) || (i >= 5 && j >= 5);
            assert!(same_cluster, "Cross-cluster edge ({}, {})", i, j);
        }

        // symmetric adjacency
        for node in 0..graph.num_nodes() {
            for &nb in graph.neighbors(node) {
                assert!(graph.neighbors(nb).contains(&node));
            }
        }
    }

    #[test]
    fn test_rejects_bad_index() {
        let index = KnnIndex::from_neighbors(vec![vec![3]]);
        assert!(KnnGraph::from_knn_index(&index, Connectivity::Undirected).is_err());
    }
}
