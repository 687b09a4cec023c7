use std::fmt;
use std::path::PathBuf;

use crate::kind::DatasetKind;

// Display and Error are hand-written rather than derived: a derive would
// treat the `ValueConversion.source` field (a data-source label, not a
// cause) as the error's `source()`, which requires `std::error::Error`.
#[derive(Debug)]
pub enum NsqipError {
    SchemaConflict {
        column: String,
        string_sources: Vec<String>,
        boolean_sources: Vec<String>,
    },

    ValueConversion {
        column: String,
        source: String,
        value: String,
    },

    AmbiguousSchema { matches: Vec<(DatasetKind, String)> },

    UnknownColumn {
        column: String,
        nearest: Vec<String>,
    },

    Construction { argument: String, message: String },

    KindRequired { operation: String },

    NoSources { dir: Option<PathBuf> },

    UnsupportedFormat { path: PathBuf },

    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    Engine { context: String, message: String },
}

impl fmt::Display for NsqipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaConflict {
                column,
                string_sources,
                boolean_sources,
            } => write!(
                f,
                "column {column} cannot be unified: String in [{}], Boolean in [{}]",
                string_sources.join(", "),
                boolean_sources.join(", ")
            ),
            Self::ValueConversion {
                column,
                source,
                value,
            } => write!(
                f,
                "cannot convert value {value:?} in column {column} of source {source}"
            ),
            Self::AmbiguousSchema { matches } => write!(
                f,
                "schema matches more than one dataset kind: {}",
                matches
                    .iter()
                    .map(|(kind, marker)| format!("{kind} (via {marker})"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::UnknownColumn { column, nearest } => write!(
                f,
                "unknown column {column}{}",
                if nearest.is_empty() {
                    String::new()
                } else {
                    format!("; closest matches: {}", nearest.join(", "))
                }
            ),
            Self::Construction { argument, message } => {
                write!(f, "invalid {argument}: {message}")
            }
            Self::KindRequired { operation } => {
                write!(f, "{operation} requires a known dataset kind")
            }
            Self::NoSources { dir } => write!(
                f,
                "no parquet or csv sources found{}",
                dir.as_ref()
                    .map(|d| format!(" in {}", d.display()))
                    .unwrap_or_default()
            ),
            Self::UnsupportedFormat { path } => write!(
                f,
                "unsupported source format for {}: expected .parquet or .csv",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Engine { context, message } => {
                write!(f, "engine failure during {context}: {message}")
            }
        }
    }
}

impl std::error::Error for NsqipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl NsqipError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn construction(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn engine(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Engine {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NsqipError>;
