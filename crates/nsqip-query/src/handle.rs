//! The unified table handle.
//!
//! One interface over both execution styles: an eager handle owns a
//! materialized table, a lazy handle owns a deferred plan. Handles are
//! immutable; every transformation returns a new handle sharing the
//! canonical schema, so independent derivations never interfere.

use std::fmt;
use std::sync::Arc;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use nsqip_ingest::decode_conversion_error;
use nsqip_model::{
    CanonicalSchema, ColumnSpec, ColumnType, DatasetKind, NsqipError, Result, Scalar,
};

use crate::predicate::Predicate;

/// Execution style of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Eager,
    Lazy,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Eager => "eager",
            Mode::Lazy => "lazy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone)]
pub(crate) enum Backing {
    Eager(DataFrame),
    Lazy(LazyFrame),
}

/// Source-free description of a handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub kind: DatasetKind,
    pub mode: Mode,
    pub columns: usize,
    pub column_names: Vec<String>,
}

/// A harmonized table, eager or lazy.
#[derive(Clone)]
pub struct TableHandle {
    backing: Backing,
    schema: Arc<CanonicalSchema>,
    kind: DatasetKind,
}

impl TableHandle {
    pub(crate) fn eager(df: DataFrame, schema: Arc<CanonicalSchema>, kind: DatasetKind) -> Self {
        Self {
            backing: Backing::Eager(df),
            schema,
            kind,
        }
    }

    pub(crate) fn lazy(lf: LazyFrame, schema: Arc<CanonicalSchema>, kind: DatasetKind) -> Self {
        Self {
            backing: Backing::Lazy(lf),
            schema,
            kind,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.backing {
            Backing::Eager(_) => Mode::Eager,
            Backing::Lazy(_) => Mode::Lazy,
        }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Keep the rows the predicate holds for. Rows where the predicate
    /// evaluates to missing are excluded.
    ///
    /// The predicate tree is re-validated and every referenced column is
    /// checked against the schema before anything is applied, so a bad
    /// filter fails here rather than inside a later collect.
    pub fn filter(&self, predicate: &Predicate) -> Result<TableHandle> {
        predicate.validate()?;
        for column in predicate.columns() {
            if !self.schema.contains(column) {
                return Err(self.schema.unknown_column(column));
            }
        }

        let expr = predicate.to_expr();
        let backing = match &self.backing {
            Backing::Lazy(lf) => Backing::Lazy(lf.clone().filter(expr)),
            Backing::Eager(df) => {
                let filtered = df
                    .clone()
                    .lazy()
                    .filter(expr)
                    .collect()
                    .map_err(|e| NsqipError::engine("filtering table", e.to_string()))?;
                Backing::Eager(filtered)
            }
        };

        Ok(Self {
            backing,
            schema: Arc::clone(&self.schema),
            kind: self.kind,
        })
    }

    /// Project to the named columns, in the requested order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<TableHandle> {
        let projected = self.schema.project(names)?;

        let exprs: Vec<Expr> = names.iter().map(|name| col(name.as_ref())).collect();
        let backing = match &self.backing {
            Backing::Lazy(lf) => Backing::Lazy(lf.clone().select(exprs)),
            Backing::Eager(df) => {
                let selected = df
                    .clone()
                    .lazy()
                    .select(exprs)
                    .collect()
                    .map_err(|e| NsqipError::engine("projecting table", e.to_string()))?;
                Backing::Eager(selected)
            }
        };

        Ok(Self {
            backing,
            schema: Arc::new(projected),
            kind: self.kind,
        })
    }

    /// Materialize the table. Lazy handles run their plan here, which is
    /// where deferred conversion failures finally surface; eager handles
    /// clone out their table.
    pub fn collect(&self) -> Result<DataFrame> {
        match &self.backing {
            Backing::Eager(df) => Ok(df.clone()),
            Backing::Lazy(lf) => lf
                .clone()
                .collect()
                .map_err(|e| decode_conversion_error(e, "collecting dataset")),
        }
    }

    /// Number of rows. Lazy handles run a count-only aggregation, which
    /// lets the engine skip materializing any column values.
    pub fn row_count(&self) -> Result<usize> {
        match &self.backing {
            Backing::Eager(df) => Ok(df.height()),
            Backing::Lazy(lf) => {
                let counted = lf
                    .clone()
                    .select([len()])
                    .collect()
                    .map_err(|e| decode_conversion_error(e, "counting rows"))?;
                let column = counted
                    .column("len")
                    .map_err(|e| NsqipError::engine("counting rows", e.to_string()))?;
                let value = column
                    .get(0)
                    .map_err(|e| NsqipError::engine("counting rows", e.to_string()))?;
                let count = value
                    .try_extract::<u64>()
                    .map_err(|e| NsqipError::engine("counting rows", e.to_string()))?;
                Ok(count as usize)
            }
        }
    }

    /// Describe the handle without touching any source.
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            kind: self.kind,
            mode: self.mode(),
            columns: self.schema.len(),
            column_names: self.schema.names().map(str::to_string).collect(),
        }
    }

    /// Append a 0/1 integer indicator named `flag` that is 1 on rows where
    /// any listed column equals its listed value. Missing values count as
    /// not matching.
    pub fn flag_any<S: AsRef<str>>(
        &self,
        flag: &str,
        checks: &[(S, Scalar)],
    ) -> Result<TableHandle> {
        if flag.trim().is_empty() {
            return Err(NsqipError::construction("flag name", "must not be blank"));
        }
        if self.schema.contains(flag) {
            return Err(NsqipError::construction(
                "flag name",
                format!("column {flag} already exists"),
            ));
        }
        if checks.is_empty() {
            return Err(NsqipError::construction(
                "flag checks",
                "must not be empty",
            ));
        }

        let mut clauses: Vec<Predicate> = Vec::with_capacity(checks.len());
        for (column, value) in checks {
            let column = column.as_ref();
            if !self.schema.contains(column) {
                return Err(self.schema.unknown_column(column));
            }
            clauses.push(Predicate::equals(column, value.clone())?);
        }

        let expr = Predicate::or_any(clauses)
            .to_expr()
            .fill_null(lit(false))
            .cast(DataType::Int64)
            .alias(flag);

        let backing = match &self.backing {
            Backing::Lazy(lf) => Backing::Lazy(lf.clone().with_columns([expr])),
            Backing::Eager(df) => {
                let flagged = df
                    .clone()
                    .lazy()
                    .with_columns([expr])
                    .collect()
                    .map_err(|e| NsqipError::engine("appending flag column", e.to_string()))?;
                Backing::Eager(flagged)
            }
        };

        let mut specs = self.schema.columns().to_vec();
        specs.push(ColumnSpec::new(flag, ColumnType::Integer, false));

        Ok(Self {
            backing,
            schema: Arc::new(CanonicalSchema::new(specs)),
            kind: self.kind,
        })
    }
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("mode", &self.mode())
            .field("kind", &self.kind)
            .field("columns", &self.schema.len())
            .finish()
    }
}
