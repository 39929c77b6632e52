//! Root and leaf cell selection
//!
//! A selector names cells either by identity or by cluster id; only
//! downsampled cells can become roots or leaves.

use crate::common::*;
use crate::fitted::raise;
use crate::population::CellPopulation;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum CellSelector {
    /// cell identities
    Cells(Vec<Box<str>>),
    /// cluster ids
    Clusters(Vec<u32>),
}

impl CellSelector {
    pub fn cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        CellSelector::Cells(cells.into_iter().map(Into::into).collect())
    }

    pub fn clusters(clusters: impl IntoIterator<Item = u32>) -> Self {
        CellSelector::Clusters(clusters.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellSelector::Cells(x) => x.is_empty(),
            CellSelector::Clusters(x) => x.is_empty(),
        }
    }

    /// Candidate cell indices in population order, before the downsample
    /// filter. Unknown identities are skipped.
    fn resolve(&self, pop: &CellPopulation) -> Vec<usize> {
        match self {
            CellSelector::Cells(cells) => {
                let mut idx: Vec<usize> = cells.iter().filter_map(|c| pop.index_of(c)).collect();
                idx.sort_unstable();
                idx.dedup();
                idx
            }
            CellSelector::Clusters(clusters) => pop.cells_in_clusters(clusters),
        }
    }

    /// Candidates restricted to downsampled cells
    fn resolve_downsampled(&self, pop: &CellPopulation) -> Result<Vec<usize>> {
        if self.is_empty() {
            return Err(LentilError::InvalidArgument("empty cell selector".into()));
        }
        let in_downsample = pop.in_downsample();
        Ok(self
            .resolve(pop)
            .into_iter()
            .filter(|&i| in_downsample[i])
            .collect())
    }
}

impl FromStr for CellSelector {
    type Err = LentilError;

    /// `cells:A,B,C` or `clusters:1,2`
    fn from_str(s: &str) -> Result<Self> {
        let (kind, body) = s.split_once(':').ok_or_else(|| {
            LentilError::InvalidArgument(format!(
                "selector `{}` should look like `cells:A,B` or `clusters:1,2`",
                s
            ))
        })?;

        let words = body
            .split(',')
            .map(|w| w.trim())
            .filter(|w| !w.is_empty());

        let selector = match kind.trim().to_ascii_lowercase().as_str() {
            "cell" | "cells" => CellSelector::cells(words),
            "cluster" | "clusters" => CellSelector::Clusters(
                words
                    .map(|w| {
                        w.parse::<u32>().map_err(|_| {
                            LentilError::InvalidArgument(format!("`{}` is not a cluster id", w))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            other => {
                return Err(LentilError::InvalidArgument(format!(
                    "unknown selector kind `{}`",
                    other
                )))
            }
        };

        if selector.is_empty() {
            return Err(LentilError::InvalidArgument(format!("empty selector `{}`", s)));
        }
        Ok(selector)
    }
}

/// Mark the selected downsampled cells as root cells, replacing any
/// previous roots.
pub fn define_root_cells(
    pop: CellPopulation,
    selector: &CellSelector,
    verbose: bool,
) -> Result<Fitted<CellPopulation>> {
    let roots = selector.resolve_downsampled(&pop)?;
    if roots.is_empty() {
        return Err(LentilError::EmptySelection("root".into()));
    }

    let mut notices = vec![];
    if !pop.root_cells().is_empty() {
        raise(
            &mut notices,
            Notice::RootCellsReplaced {
                previous: pop.root_cells().len(),
            },
        );
    }

    let mut pop = pop;
    pop.set_roots(&roots);

    if verbose {
        info!("{} root cells defined", pop.root_cells().len());
    }
    Ok(Fitted::new(pop, notices))
}

/// Mark the selected downsampled cells as leaf cells, replacing any
/// previous leaves. With `pseudotime_cutoff > 0`, only cells at or beyond
/// the cutoff qualify; without pseudotime the cutoff is dropped.
pub fn define_leaf_cells(
    pop: CellPopulation,
    selector: &CellSelector,
    pseudotime_cutoff: f32,
    verbose: bool,
) -> Result<Fitted<CellPopulation>> {
    if !pseudotime_cutoff.is_finite() {
        return Err(LentilError::InvalidArgument(format!(
            "pseudotime cutoff {} is not a number",
            pseudotime_cutoff
        )));
    }

    let mut notices = vec![];
    let mut leaves = selector.resolve_downsampled(&pop)?;

    let mut cutoff = pseudotime_cutoff;
    if cutoff > 0.0 && !pop.has_pseudotime() {
        raise(&mut notices, Notice::CutoffIgnored { requested: cutoff });
        cutoff = 0.0;
    }

    if cutoff > 0.0 {
        let pt = pop.require_pseudotime()?;
        // undefined pseudotime never passes a positive cutoff
        leaves.retain(|&i| pt[i] >= cutoff);
    }

    if leaves.is_empty() {
        return Err(LentilError::EmptySelection("leaf".into()));
    }

    if !pop.leaf_cells().is_empty() {
        raise(
            &mut notices,
            Notice::LeafCellsReplaced {
                previous: pop.leaf_cells().len(),
            },
        );
    }

    let mut pop = pop;
    pop.set_leaves(&leaves);

    if verbose {
        info!(
            "{} leaf cells defined (pseudotime cutoff {})",
            pop.leaf_cells().len(),
            cutoff
        );
    }
    Ok(Fitted::new(pop, notices))
}
