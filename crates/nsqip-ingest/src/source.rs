//! Source discovery over a dataset directory.
//!
//! A dataset is a flat directory of per-year registry extracts. Each file
//! becomes one source, identified by the 4-digit year embedded in its file
//! stem when there is one.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use nsqip_model::{NsqipError, Result, SourceId};

/// On-disk format of one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Parquet,
    Csv,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Parquet => "parquet",
            SourceFormat::Csv => "csv",
        }
    }

    /// Classify a path by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if extension.eq_ignore_ascii_case("parquet") {
            Ok(SourceFormat::Parquet)
        } else if extension.eq_ignore_ascii_case("csv") {
            Ok(SourceFormat::Csv)
        } else {
            Err(NsqipError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declared source file of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: SourceId,
    pub path: PathBuf,
    pub format: SourceFormat,
}

impl SourceSpec {
    /// Build a spec from a path, deriving the id from the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = SourceFormat::from_path(&path)?;
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| NsqipError::UnsupportedFormat { path: path.clone() })?;
        let id = match extract_year(stem) {
            Some(year) => SourceId::new(year)?,
            None => SourceId::new(stem)?,
        };
        Ok(Self { id, path, format })
    }
}

/// The last run of exactly four digits in `stem` that looks like a
/// registry year (`adult_nsqip_2019` -> `2019`).
fn extract_year(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut best: Option<&str> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                let run = &stem[start..i];
                if ("1900"..="2999").contains(&run) {
                    best = Some(run);
                }
            }
        } else {
            i += 1;
        }
    }
    best.map(str::to_string)
}

/// List the parquet and csv files of `dir` (non-recursive) as source specs,
/// sorted by file name.
pub fn discover_sources(dir: impl AsRef<Path>) -> Result<Vec<SourceSpec>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| NsqipError::io(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| NsqipError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_ok() {
            paths.push(path);
        }
    }

    paths.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));

    let specs = paths
        .into_iter()
        .map(SourceSpec::from_path)
        .collect::<Result<Vec<_>>>()?;

    if specs.is_empty() {
        return Err(NsqipError::NoSources {
            dir: Some(dir.to_path_buf()),
        });
    }

    tracing::debug!(
        dir = %dir.display(),
        sources = specs.len(),
        "Discovered dataset sources"
    );

    Ok(specs)
}
