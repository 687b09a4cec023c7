//! Per-source view plans.
//!
//! A view plan lifts one raw file scan into the canonical schema: casts
//! and sentinel handling per column, absent columns materialized as typed
//! nulls, output projected in canonical order. Rows are never dropped
//! here; harmonization only rewrites representation.

use polars::prelude::*;

use nsqip_model::Result;
use nsqip_schema::{CastPlan, Conversion, SentinelRule};

use crate::normalize::{blank_to_null, parse_numeric_expr};
use crate::schema_scan::{DEFAULT_CSV_INFER_ROWS, engine_dtype, scan_source};
use crate::source::SourceSpec;

/// Build the lazy view of one source under its cast plan.
pub fn source_plan(spec: &SourceSpec, plan: &CastPlan) -> Result<LazyFrame> {
    source_plan_with(spec, plan, DEFAULT_CSV_INFER_ROWS)
}

/// Build the lazy view with an explicit CSV inference cap.
pub fn source_plan_with(
    spec: &SourceSpec,
    plan: &CastPlan,
    csv_infer_rows: usize,
) -> Result<LazyFrame> {
    let lf = scan_source(spec, csv_infer_rows)?;

    let mut exprs: Vec<Expr> = Vec::with_capacity(plan.actions.len());
    for action in &plan.actions {
        let expr = match (&action.conversion, &action.sentinel) {
            (Conversion::Fill, _) => lit(NULL)
                .cast(engine_dtype(action.target))
                .alias(action.column.as_str()),
            (Conversion::ParseNumeric { .. }, _) => {
                parse_numeric_expr(&action.column, &plan.source, action.target)?
            }
            (Conversion::Keep, SentinelRule::BlankToNull) => blank_to_null(&action.column),
            (Conversion::Keep, SentinelRule::None) => col(action.column.as_str()),
            (Conversion::Cast { .. }, _) => {
                col(action.column.as_str()).cast(engine_dtype(action.target))
            }
        };
        exprs.push(expr);
    }

    tracing::debug!(
        source = %spec.id,
        path = %spec.path.display(),
        columns = exprs.len(),
        "Built source view plan"
    );

    Ok(lf.select(exprs))
}
