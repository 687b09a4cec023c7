//! File-level and canonical schemas.
//!
//! A `FileSchema` is what one source file actually declares; a
//! `CanonicalSchema` is the harmonized result every handle in a dataset
//! shares. Canonical column order is first-seen order across sources and
//! is part of the contract: collected frames present columns in this order.

use std::collections::BTreeMap;

use rapidfuzz::distance::jaro_winkler;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnSpec, ColumnType};
use crate::error::{NsqipError, Result};
use crate::source::SourceId;

/// Ordered column declarations of a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSchema {
    pub source: SourceId,
    pub columns: Vec<(String, ColumnType)>,
}

impl FileSchema {
    pub fn new(source: SourceId, columns: Vec<(String, ColumnType)>) -> Self {
        Self { source, columns }
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, declared)| *declared)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }
}

/// Minimum similarity for a column name to appear as a suggestion.
const SUGGESTION_FLOOR: f64 = 0.6;

/// The harmonized schema of a whole dataset.
///
/// Immutable after construction; callers share it behind an `Arc`. Lookups
/// go through a name index, iteration follows first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnSpec>", into = "Vec<ColumnSpec>")]
pub struct CanonicalSchema {
    columns: Vec<ColumnSpec>,
    by_name: BTreeMap<String, usize>,
}

impl CanonicalSchema {
    /// Build a schema from ordered column specs. Names are expected to be
    /// unique; on duplicates the later spec wins lookups.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(index, spec)| (spec.name.clone(), index))
            .collect();
        Self { columns, by_name }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|spec| spec.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.by_name.get(name).map(|&index| &self.columns[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Restrict the schema to the named columns, in the requested order.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<CanonicalSchema> {
        let mut specs = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let spec = self
                .get(name)
                .ok_or_else(|| self.unknown_column(name))?;
            specs.push(spec.clone());
        }
        Ok(CanonicalSchema::new(specs))
    }

    /// The error for a name this schema does not contain, with ranked
    /// suggestions attached.
    pub fn unknown_column(&self, name: &str) -> NsqipError {
        NsqipError::UnknownColumn {
            column: name.to_string(),
            nearest: self.nearest(name, 3),
        }
    }

    /// Column names ranked by Jaro-Winkler similarity to `name`, best first.
    /// Names scoring below the suggestion floor are omitted.
    pub fn nearest(&self, name: &str, k: usize) -> Vec<String> {
        let wanted = normalize(name);
        let mut scored: Vec<(f64, &str)> = self
            .columns
            .iter()
            .map(|spec| {
                let score =
                    jaro_winkler::similarity(normalize(&spec.name).chars(), wanted.chars());
                (score, spec.name.as_str())
            })
            .filter(|(score, _)| *score >= SUGGESTION_FLOOR)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(k)
            .map(|(_, candidate)| candidate.to_string())
            .collect()
    }
}

impl From<Vec<ColumnSpec>> for CanonicalSchema {
    fn from(columns: Vec<ColumnSpec>) -> Self {
        CanonicalSchema::new(columns)
    }
}

impl From<CanonicalSchema> for Vec<ColumnSpec> {
    fn from(schema: CanonicalSchema) -> Self {
        schema.columns
    }
}

/// Normalize a name for similarity comparison: lowercase, separators
/// collapsed to single spaces.
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
