//! Dataset description and extract writing.
//!
//! The core crates never write files; everything that leaves the process
//! as CSV or parquet goes through here.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;

use nsqip_ingest::{SourceFormat, SourceSpec, discover_sources};
use nsqip_model::{ColumnSpec, DatasetKind, NsqipError, Result};
use nsqip_query::{Mode, OpenOptions, open_with};

/// Everything `describe` reports about a dataset directory.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeReport {
    pub dir: PathBuf,
    pub kind: DatasetKind,
    pub mode: Mode,
    pub rows: usize,
    pub sources: Vec<SourceSpec>,
    pub columns: Vec<ColumnSpec>,
}

/// A filtered extract request. Empty filter lists mean "keep everything";
/// an empty column list keeps the full canonical schema.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub years: Vec<i64>,
    pub cpt: Vec<String>,
    pub diagnosis: Vec<String>,
    pub columns: Vec<String>,
    pub options: OpenOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub format: SourceFormat,
    pub rows: usize,
    pub columns: usize,
}

/// Open a dataset directory and summarize it without exporting anything.
pub fn describe(dir: &Path, mode: Mode, options: &OpenOptions) -> Result<DescribeReport> {
    let sources = discover_sources(dir)?;
    let handle = open_with(&sources, mode, options)?;
    let rows = handle.row_count()?;
    Ok(DescribeReport {
        dir: dir.to_path_buf(),
        kind: handle.kind(),
        mode,
        rows,
        sources,
        columns: handle.schema().columns().to_vec(),
    })
}

/// Open a dataset lazily, apply the requested filters and projection, and
/// write the collected extract. The output format follows the file
/// extension: `.csv` or `.parquet`.
pub fn export(request: &ExportRequest) -> Result<ExportReport> {
    let format = SourceFormat::from_path(&request.output)?;

    let sources = discover_sources(&request.dir)?;
    let mut handle = open_with(&sources, Mode::Lazy, &request.options)?;
    if !request.years.is_empty() {
        handle = handle.filter_by_year(&request.years)?;
    }
    if !request.cpt.is_empty() {
        handle = handle.filter_by_cpt(&request.cpt)?;
    }
    if !request.diagnosis.is_empty() {
        handle = handle.filter_by_diagnosis(&request.diagnosis)?;
    }
    if !request.columns.is_empty() {
        handle = handle.select(&request.columns)?;
    }

    let mut df = handle.collect()?;
    let file =
        File::create(&request.output).map_err(|e| NsqipError::io(request.output.clone(), e))?;
    match format {
        SourceFormat::Csv => CsvWriter::new(file)
            .finish(&mut df)
            .map_err(|e| NsqipError::engine("writing csv extract", e.to_string()))?,
        SourceFormat::Parquet => {
            ParquetWriter::new(file)
                .finish(&mut df)
                .map_err(|e| NsqipError::engine("writing parquet extract", e.to_string()))?;
        }
    }

    tracing::info!(
        rows = df.height(),
        output = %request.output.display(),
        "Wrote extract"
    );
    Ok(ExportReport {
        output: request.output.clone(),
        format,
        rows: df.height(),
        columns: df.width(),
    })
}
