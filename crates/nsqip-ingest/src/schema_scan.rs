//! Schema-only scans of source files.
//!
//! Discovery of what a file declares must never pay for its rows: parquet
//! answers from metadata, CSV from capped inference over the head of the
//! file.

use polars::prelude::*;

use nsqip_model::{ColumnType, FileSchema, NsqipError, Result};

use crate::source::{SourceFormat, SourceSpec};

/// Rows the CSV reader inspects when inferring a file schema.
pub const DEFAULT_CSV_INFER_ROWS: usize = 1000;

/// Lazily scan a source file. No rows are read until the plan is collected.
pub fn scan_source(spec: &SourceSpec, csv_infer_rows: usize) -> Result<LazyFrame> {
    if !spec.path.exists() {
        return Err(NsqipError::io(
            &spec.path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }

    let path_str = spec.path.to_string_lossy();
    let pl_path = PlPath::new(&path_str);
    match spec.format {
        SourceFormat::Parquet => LazyFrame::scan_parquet(pl_path, ScanArgsParquet::default())
            .map_err(|e| {
                NsqipError::engine(format!("scanning {}", spec.path.display()), e.to_string())
            }),
        SourceFormat::Csv => LazyCsvReader::new(pl_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(csv_infer_rows))
            .finish()
            .map_err(|e| {
                NsqipError::engine(format!("scanning {}", spec.path.display()), e.to_string())
            }),
    }
}

/// Read the declared schema of one source without materializing rows.
pub fn read_file_schema(spec: &SourceSpec) -> Result<FileSchema> {
    read_file_schema_with(spec, DEFAULT_CSV_INFER_ROWS)
}

/// Read the declared schema with an explicit CSV inference cap.
pub fn read_file_schema_with(spec: &SourceSpec, csv_infer_rows: usize) -> Result<FileSchema> {
    let mut lf = scan_source(spec, csv_infer_rows)?;
    let schema = lf.collect_schema().map_err(|e| {
        NsqipError::engine(
            format!("reading schema of {}", spec.path.display()),
            e.to_string(),
        )
    })?;

    let columns = schema
        .iter()
        .map(|(name, dtype)| (name.to_string(), column_type_of(dtype)))
        .collect();

    tracing::debug!(
        source = %spec.id,
        columns = schema.len(),
        "Read file schema"
    );

    Ok(FileSchema::new(spec.id.clone(), columns))
}

/// Map an engine dtype onto the four-type model. Anything outside the
/// integer, float, and boolean families, temporals included, is carried
/// as text.
pub fn column_type_of(dtype: &DataType) -> ColumnType {
    match dtype {
        DataType::Boolean => ColumnType::Boolean,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => ColumnType::Integer,
        DataType::Float32 | DataType::Float64 => ColumnType::Float64,
        _ => ColumnType::String,
    }
}

/// The engine dtype a canonical column materializes as.
pub fn engine_dtype(ty: ColumnType) -> DataType {
    match ty {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::String => DataType::String,
        ColumnType::Boolean => DataType::Boolean,
    }
}
