//! Opening a set of registry files as one harmonized table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use nsqip_ingest::{
    DEFAULT_CSV_INFER_ROWS, SourceSpec, decode_conversion_error, discover_sources,
    read_file_schema_with, source_plan_with,
};
use nsqip_model::{CanonicalSchema, ColumnSpec, ColumnType, NsqipError, Result};
use nsqip_schema::{cast_plan, detect, unify};

use crate::handle::{Mode, TableHandle};

/// Knobs for [`open_with`] and [`open_dir_with`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Canonical columns to re-type to a numeric target before casting.
    /// Sources that declared the column as text get a strict parse
    /// instead of a cast, so stray non-numeric values fail loudly.
    pub numeric_overrides: BTreeMap<String, ColumnType>,
    /// Rows inspected when inferring a CSV file schema.
    pub csv_infer_rows: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            numeric_overrides: BTreeMap::new(),
            csv_infer_rows: DEFAULT_CSV_INFER_ROWS,
        }
    }
}

impl OpenOptions {
    pub fn with_numeric_override(mut self, column: impl Into<String>, target: ColumnType) -> Self {
        self.numeric_overrides.insert(column.into(), target);
        self
    }

    pub fn with_csv_infer_rows(mut self, rows: usize) -> Self {
        self.csv_infer_rows = rows;
        self
    }
}

/// Open `sources` as one table with default options.
pub fn open(sources: &[SourceSpec], mode: Mode) -> Result<TableHandle> {
    open_with(sources, mode, &OpenOptions::default())
}

/// Open every supported file in `dir` as one table with default options.
pub fn open_dir(dir: impl AsRef<Path>, mode: Mode) -> Result<TableHandle> {
    open_dir_with(dir, mode, &OpenOptions::default())
}

/// Open every supported file in `dir` as one table.
pub fn open_dir_with(
    dir: impl AsRef<Path>,
    mode: Mode,
    options: &OpenOptions,
) -> Result<TableHandle> {
    let sources = discover_sources(dir.as_ref())?;
    open_with(&sources, mode, options)
}

/// Open `sources` as one table.
///
/// Every file schema is read up front, unified into the canonical schema,
/// and each source gets its own cast plan against that schema before the
/// per-source plans are concatenated. In [`Mode::Eager`] the combined plan
/// runs here; in [`Mode::Lazy`] nothing is read beyond the schemas until
/// the handle is collected.
pub fn open_with(sources: &[SourceSpec], mode: Mode, options: &OpenOptions) -> Result<TableHandle> {
    if sources.is_empty() {
        return Err(NsqipError::NoSources { dir: None });
    }

    let mut file_schemas = Vec::with_capacity(sources.len());
    for spec in sources {
        file_schemas.push(read_file_schema_with(spec, options.csv_infer_rows)?);
    }

    let unified = unify(&file_schemas)?;
    let canonical = apply_overrides(&unified, &options.numeric_overrides)?;
    let kind = detect(&canonical)?;

    let mut plans = Vec::with_capacity(sources.len());
    for (spec, file_schema) in sources.iter().zip(&file_schemas) {
        let plan = cast_plan(&canonical, file_schema);
        plans.push(source_plan_with(spec, &plan, options.csv_infer_rows)?);
    }

    let combined = concat(plans, UnionArgs::default())
        .map_err(|e| NsqipError::engine("concatenating sources", e.to_string()))?;

    tracing::info!(
        sources = sources.len(),
        columns = canonical.len(),
        kind = %kind,
        "Opened dataset"
    );

    let schema = Arc::new(canonical);
    match mode {
        Mode::Lazy => Ok(TableHandle::lazy(combined, schema, kind)),
        Mode::Eager => {
            let df = combined
                .collect()
                .map_err(|e| decode_conversion_error(e, "opening dataset"))?;
            Ok(TableHandle::eager(df, schema, kind))
        }
    }
}

/// Re-type overridden columns in the canonical schema.
///
/// Overridden columns become nullable: the strict parse turns blank
/// sentinel text into missing values.
fn apply_overrides(
    schema: &CanonicalSchema,
    overrides: &BTreeMap<String, ColumnType>,
) -> Result<CanonicalSchema> {
    if overrides.is_empty() {
        return Ok(schema.clone());
    }

    for (column, target) in overrides {
        if !target.is_numeric() {
            return Err(NsqipError::construction(
                "numeric override",
                format!("{column} must target a numeric type, got {target}"),
            ));
        }
        if !schema.contains(column) {
            return Err(schema.unknown_column(column));
        }
    }

    let specs = schema
        .columns()
        .iter()
        .map(|spec| match overrides.get(&spec.name) {
            Some(target) => ColumnSpec::new(spec.name.clone(), *target, true),
            None => spec.clone(),
        })
        .collect();
    Ok(CanonicalSchema::new(specs))
}
