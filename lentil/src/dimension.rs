use crate::error::{LentilError, Result};
use std::fmt;
use std::str::FromStr;

/// Coordinate space used to build the cell graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DimType {
    /// marker expression
    Raw,
    Pca,
    Tsne,
    /// diffusion components
    DiffusionMap,
    #[default]
    Umap,
}

impl DimType {
    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            DimType::Raw => "raw",
            DimType::Pca => "pca",
            DimType::Tsne => "tsne",
            DimType::DiffusionMap => "dc",
            DimType::Umap => "umap",
        }
    }

    /// Column prefix of an embedding table, dimension `i` is `{prefix}_{i}`
    pub fn column_prefix(&self) -> Option<&'static str> {
        match self {
            DimType::Raw => None,
            DimType::Pca => Some("PC"),
            DimType::Tsne => Some("tSNE"),
            DimType::DiffusionMap => Some("DC"),
            DimType::Umap => Some("UMAP"),
        }
    }

    /// Column names for 1-based dimension indices
    pub fn column_names(&self, dim_use: &[usize]) -> Option<Vec<Box<str>>> {
        let prefix = self.column_prefix()?;
        Some(
            dim_use
                .iter()
                .map(|d| format!("{}_{}", prefix, d).into_boxed_str())
                .collect(),
        )
    }
}

impl FromStr for DimType {
    type Err = LentilError;

    /// Accepts the usual spellings, e.g. `PCA`, `t-SNE`, `diffusionmap`, `dm`
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Ok(match key.as_str() {
            "raw" | "marker" | "markers" | "expr" => DimType::Raw,
            "pca" | "pc" => DimType::Pca,
            "tsne" => DimType::Tsne,
            "dc" | "dm" | "diffusionmap" | "diffusion" | "destiny" => DimType::DiffusionMap,
            "umap" => DimType::Umap,
            _ => return Err(LentilError::UnknownDimensionType(s.to_string())),
        })
    }
}

impl fmt::Display for DimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
