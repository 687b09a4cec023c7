use serde::{Deserialize, Serialize};
use std::fmt;

/// Which registry population a dataset covers.
///
/// Determined once per dataset from schema markers; `Unknown` is a valid
/// outcome for files that carry neither population's marker columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Adult,
    Pediatric,
    Unknown,
}

impl DatasetKind {
    pub fn is_known(&self) -> bool {
        !matches!(self, DatasetKind::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Adult => "Adult",
            DatasetKind::Pediatric => "Pediatric",
            DatasetKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
