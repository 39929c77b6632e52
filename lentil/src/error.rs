use thiserror::Error;

/// Failures of the pseudotime pipeline.
///
/// Usage errors (`InvalidArgument`, `EmptySelection`, `NoRootCells`,
/// `MissingObject`) are fatal. `MissingPrerequisite` and
/// `UnknownDimensionType` are raised by the strict lookups; the pipeline
/// itself recovers from them with a [`crate::fitted::Notice`].
#[derive(Debug, Error)]
pub enum LentilError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no downsampled cells match the {0} selection")]
    EmptySelection(String),

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("no root cells defined; define root cells before estimating pseudotime")]
    NoRootCells,

    #[error("unknown dimension type: {0}")]
    UnknownDimensionType(String),

    #[error("missing object: {0}")]
    MissingObject(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LentilError>;
