//! Results that carry the fallbacks taken on the way
//!
//! Replacing earlier results and degrading to defaults are allowed, but
//! the caller gets told: every stage returns its value together with the
//! notices it raised. Notices are also logged when they are raised.

use crate::dimension::DimType;
use log::{info, warn};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// earlier root cells were overwritten
    RootCellsReplaced { previous: usize },
    /// earlier leaf cells were overwritten
    LeafCellsReplaced { previous: usize },
    /// a positive leaf cutoff was requested before pseudotime existed
    CutoffIgnored { requested: f32 },
    /// the requested embedding is not available; raw markers were used
    DimensionFallback { requested: DimType },
    /// a previous pseudotime column (and trajectory values) were dropped
    PseudotimeReplaced,
    /// no root cell survived seed sampling; their clusters' seeds were used
    RootsMappedToSeeds { seeds: usize },
    /// cells with no path from any root cell
    UnreachableCells { count: usize },
}

impl Notice {
    /// Fallbacks are warnings, replacements are informational
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Notice::CutoffIgnored { .. }
                | Notice::DimensionFallback { .. }
                | Notice::RootsMappedToSeeds { .. }
                | Notice::UnreachableCells { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RootCellsReplaced { previous } => {
                write!(f, "replacing {} previously defined root cells", previous)
            }
            Notice::LeafCellsReplaced { previous } => {
                write!(f, "replacing {} previously defined leaf cells", previous)
            }
            Notice::CutoffIgnored { requested } => write!(
                f,
                "pseudotime not computed yet; ignoring cutoff {} (using 0)",
                requested
            ),
            Notice::DimensionFallback { requested } => write!(
                f,
                "no {} coordinates available; using raw marker expression",
                requested
            ),
            Notice::PseudotimeReplaced => write!(
                f,
                "replacing existing pseudotime; trajectory values reset to 0"
            ),
            Notice::RootsMappedToSeeds { seeds } => write!(
                f,
                "no root cell was kept as a seed; using {} seeds of their clusters",
                seeds
            ),
            Notice::UnreachableCells { count } => write!(
                f,
                "{} cells are not connected to any root cell; pseudotime left undefined",
                count
            ),
        }
    }
}

/// A value plus the notices raised while computing it
#[derive(Clone, Debug)]
pub struct Fitted<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Fitted<T> {
    pub fn new(value: T, notices: Vec<Notice>) -> Self {
        Self { value, notices }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn has_notice(&self, pred: impl Fn(&Notice) -> bool) -> bool {
        self.notices.iter().any(pred)
    }
}

/// Log a notice and keep it
pub(crate) fn raise(notices: &mut Vec<Notice>, notice: Notice) {
    if notice.is_warning() {
        warn!("{}", notice);
    } else {
        info!("{}", notice);
    }
    notices.push(notice);
}
