//! Cell population registry
//!
//! Per-cell columns (identity, cluster, downsample flag, root/leaf
//! flags, pseudotime, seed bookkeeping) and the coordinate tables the
//! pipeline reads from. Pipeline stages take a population by value and
//! return a new one; nothing here is shared mutably.

use crate::common::*;
use crate::dimension::DimType;

#[derive(Clone, Debug)]
pub struct CellPopulation {
    cells: Vec<Box<str>>,
    cell_index: HashMap<Box<str>, usize>,
    cluster_id: Vec<u32>,
    in_downsample: Vec<bool>,

    is_root: Vec<bool>,
    is_leaf: Vec<bool>,
    root_cells: Vec<Box<str>>,
    leaf_cells: Vec<Box<str>>,

    /// `None` until estimated; `NaN` for downsampled cells without a
    /// path from any root, `0` for cells outside the downsample
    pseudotime: Option<Vec<f32>>,
    seed_flag: Vec<bool>,
    /// 1-based seed cluster, `0` = not part of the computation
    seed_cluster_id: Vec<usize>,
    traj_value: Vec<f32>,
    traj_value_log: Vec<f32>,

    markers: Option<MatWithNames<Mat>>,
    embeddings: HashMap<DimType, MatWithNames<Mat>>,
}

/// Counts for logging and reports
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopulationSummary {
    pub n_cells: usize,
    pub n_downsampled: usize,
    pub n_root: usize,
    pub n_leaf: usize,
    pub n_seeds: usize,
    pub has_pseudotime: bool,
}

impl CellPopulation {
    /// All cells start in the downsample, with cluster `0`
    pub fn new(cells: Vec<Box<str>>) -> Result<Self> {
        let nn = cells.len();
        let mut cell_index = HashMap::default();
        for (i, c) in cells.iter().enumerate() {
            if cell_index.insert(c.clone(), i).is_some() {
                return Err(LentilError::InvalidArgument(format!(
                    "duplicate cell identity: {}",
                    c
                )));
            }
        }

        Ok(Self {
            cells,
            cell_index,
            cluster_id: vec![0; nn],
            in_downsample: vec![true; nn],
            is_root: vec![false; nn],
            is_leaf: vec![false; nn],
            root_cells: vec![],
            leaf_cells: vec![],
            pseudotime: None,
            seed_flag: vec![false; nn],
            seed_cluster_id: vec![0; nn],
            traj_value: vec![0.0; nn],
            traj_value_log: vec![0.0; nn],
            markers: None,
            embeddings: HashMap::default(),
        })
    }

    fn check_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(LentilError::InvalidArgument(format!(
                "{} has {} entries for {} cells",
                what,
                len,
                self.len()
            )));
        }
        Ok(())
    }

    /// Check that a coordinate table has a row for every downsampled cell
    fn check_table(&self, what: &str, table: &MatWithNames<Mat>) -> Result<()> {
        if table.rows.len() != table.mat.nrows() || table.cols.len() != table.mat.ncols() {
            return Err(LentilError::InvalidArgument(format!(
                "{}: names do not match the {} x {} matrix",
                what,
                table.mat.nrows(),
                table.mat.ncols()
            )));
        }
        let rows: HashSet<&str> = table.rows.iter().map(|r| r.as_ref()).collect();
        if let Some(missing) = self
            .downsampled_indices()
            .into_iter()
            .find(|&i| !rows.contains(self.cells[i].as_ref()))
        {
            return Err(LentilError::InvalidArgument(format!(
                "{} has no row for downsampled cell {}",
                what, self.cells[missing]
            )));
        }
        Ok(())
    }

    /// Cluster assignments from an external clustering step
    pub fn with_clusters(mut self, cluster_id: Vec<u32>) -> Result<Self> {
        self.check_len("cluster ids", cluster_id.len())?;
        self.cluster_id = cluster_id;
        Ok(self)
    }

    /// Roots and leaves outside the new downsample lose their flags
    pub fn with_downsample(mut self, in_downsample: Vec<bool>) -> Result<Self> {
        self.check_len("downsample flags", in_downsample.len())?;
        self.in_downsample = in_downsample;

        let keep = |flags: &[bool], ds: &[bool]| -> Vec<usize> {
            (0..flags.len()).filter(|&i| flags[i] && ds[i]).collect()
        };
        let roots = keep(&self.is_root, &self.in_downsample);
        let leaves = keep(&self.is_leaf, &self.in_downsample);
        self.set_roots(&roots);
        self.set_leaves(&leaves);
        Ok(self)
    }

    /// Marker expression, rows keyed by cell identity
    pub fn with_markers(mut self, markers: MatWithNames<Mat>) -> Result<Self> {
        self.check_table("marker matrix", &markers)?;
        self.markers = Some(markers);
        Ok(self)
    }

    /// Precomputed embedding, rows keyed by cell identity and columns
    /// named `{prefix}_{i}` (see [`DimType::column_prefix`])
    pub fn with_embedding(mut self, dim_type: DimType, table: MatWithNames<Mat>) -> Result<Self> {
        if dim_type == DimType::Raw {
            return self.with_markers(table);
        }
        self.check_table(&format!("{} embedding", dim_type), &table)?;
        self.embeddings.insert(dim_type, table);
        Ok(self)
    }

    /// Trajectory values from a downstream random-walk step
    pub fn with_trajectory_values(mut self, traj_value: Vec<f32>, traj_value_log: Vec<f32>) -> Result<Self> {
        self.check_len("trajectory values", traj_value.len())?;
        self.check_len("log trajectory values", traj_value_log.len())?;
        self.traj_value = traj_value;
        self.traj_value_log = traj_value_log;
        Ok(self)
    }

    ///////////////
    // lookups   //
    ///////////////

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Box<str>] {
        &self.cells
    }

    pub fn index_of(&self, cell: &str) -> Option<usize> {
        self.cell_index.get(cell).copied()
    }

    pub fn contains(&self, cell: &str) -> bool {
        self.cell_index.contains_key(cell)
    }

    pub fn cluster_ids(&self) -> &[u32] {
        &self.cluster_id
    }

    pub fn in_downsample(&self) -> &[bool] {
        &self.in_downsample
    }

    pub fn downsampled_indices(&self) -> Vec<usize> {
        (0..self.len()).filter(|&i| self.in_downsample[i]).collect()
    }

    /// Indices of cells whose cluster is listed in `clusters`
    pub fn cells_in_clusters(&self, clusters: &[u32]) -> Vec<usize> {
        let wanted: HashSet<u32> = clusters.iter().copied().collect();
        (0..self.len())
            .filter(|&i| wanted.contains(&self.cluster_id[i]))
            .collect()
    }

    pub fn is_root(&self) -> &[bool] {
        &self.is_root
    }

    pub fn is_leaf(&self) -> &[bool] {
        &self.is_leaf
    }

    pub fn root_cells(&self) -> &[Box<str>] {
        &self.root_cells
    }

    pub fn leaf_cells(&self) -> &[Box<str>] {
        &self.leaf_cells
    }

    pub fn has_pseudotime(&self) -> bool {
        self.pseudotime.is_some()
    }

    pub fn pseudotime(&self) -> Option<&[f32]> {
        self.pseudotime.as_deref()
    }

    /// Strict access for steps that cannot run without pseudotime
    pub fn require_pseudotime(&self) -> Result<&[f32]> {
        self.pseudotime().ok_or_else(|| {
            LentilError::MissingPrerequisite("pseudotime has not been estimated".into())
        })
    }

    /// `None` if unknown cell, no pseudotime yet, or no path from a root
    pub fn pseudotime_of(&self, cell: &str) -> Option<f32> {
        let i = self.index_of(cell)?;
        self.pseudotime()
            .map(|pt| pt[i])
            .filter(|x| x.is_finite())
    }

    pub fn seed_flag(&self) -> &[bool] {
        &self.seed_flag
    }

    pub fn seed_cluster_id(&self) -> &[usize] {
        &self.seed_cluster_id
    }

    pub fn traj_value(&self) -> &[f32] {
        &self.traj_value
    }

    pub fn traj_value_log(&self) -> &[f32] {
        &self.traj_value_log
    }

    pub fn markers(&self) -> Option<&MatWithNames<Mat>> {
        self.markers.as_ref()
    }

    pub fn embedding(&self, dim_type: DimType) -> Option<&MatWithNames<Mat>> {
        match dim_type {
            DimType::Raw => self.markers(),
            _ => self.embeddings.get(&dim_type),
        }
    }

    pub fn summary(&self) -> PopulationSummary {
        PopulationSummary {
            n_cells: self.len(),
            n_downsampled: self.in_downsample.iter().filter(|&&x| x).count(),
            n_root: self.root_cells.len(),
            n_leaf: self.leaf_cells.len(),
            n_seeds: self.seed_flag.iter().filter(|&&x| x).count(),
            has_pseudotime: self.has_pseudotime(),
        }
    }

    ///////////////////////////////////////
    // updates used by pipeline stages   //
    ///////////////////////////////////////

    /// Flag exactly `indices` as root cells
    pub(crate) fn set_roots(&mut self, indices: &[usize]) {
        self.is_root = vec![false; self.len()];
        for &i in indices {
            self.is_root[i] = true;
        }
        self.root_cells = self.flagged_cells(&self.is_root);
    }

    /// Flag exactly `indices` as leaf cells
    pub(crate) fn set_leaves(&mut self, indices: &[usize]) {
        self.is_leaf = vec![false; self.len()];
        for &i in indices {
            self.is_leaf[i] = true;
        }
        self.leaf_cells = self.flagged_cells(&self.is_leaf);
    }

    fn flagged_cells(&self, flags: &[bool]) -> Vec<Box<str>> {
        self.cells
            .iter()
            .zip(flags)
            .filter(|(_, &f)| f)
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Replace pseudotime and seed columns; trajectory values depend on
    /// pseudotime and go back to 0
    pub(crate) fn set_pseudotime(
        &mut self,
        pseudotime: Vec<f32>,
        seed_flag: Vec<bool>,
        seed_cluster_id: Vec<usize>,
    ) {
        debug_assert_eq!(pseudotime.len(), self.len());
        debug_assert_eq!(seed_flag.len(), self.len());
        debug_assert_eq!(seed_cluster_id.len(), self.len());

        self.pseudotime = Some(pseudotime);
        self.seed_flag = seed_flag;
        self.seed_cluster_id = seed_cluster_id;
        self.traj_value = vec![0.0; self.len()];
        self.traj_value_log = vec![0.0; self.len()];
    }
}
