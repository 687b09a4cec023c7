//! Per-source cast planning.
//!
//! A cast plan is the declarative bridge between one file's schema and the
//! canonical schema: which columns to keep, widen, parse, or fill, and
//! where blank sentinels must become missing values. Plans are plain data,
//! so they serialize for inspection; deriving one performs no I/O.

use serde::{Deserialize, Serialize};

use nsqip_model::{CanonicalSchema, ColumnType, FileSchema, SourceId};

/// How one source column becomes its canonical counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Conversion {
    /// Declared type already matches the canonical type.
    Keep,
    /// Lossless widen along the numeric chain, or stringification.
    Cast { from: ColumnType },
    /// Strict text-to-number parse; only reachable through numeric
    /// overrides, never through widening.
    ParseNumeric { from: ColumnType },
    /// Column absent from this source; materialize as all-missing.
    Fill,
}

/// Sentinel handling for one column of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelRule {
    /// Pure-whitespace text becomes a missing value.
    BlankToNull,
    None,
}

/// One canonical column's treatment for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAction {
    pub column: String,
    pub target: ColumnType,
    pub conversion: Conversion,
    pub sentinel: SentinelRule,
}

/// Everything needed to lift one source file into the canonical schema,
/// in canonical column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastPlan {
    pub source: SourceId,
    pub actions: Vec<ColumnAction>,
}

impl CastPlan {
    /// True when every action is a plain keep with no sentinel handling.
    pub fn is_identity(&self) -> bool {
        self.actions.iter().all(|action| {
            action.conversion == Conversion::Keep && action.sentinel == SentinelRule::None
        })
    }
}

/// Derive the cast plan lifting `file` into `canonical`.
pub fn cast_plan(canonical: &CanonicalSchema, file: &FileSchema) -> CastPlan {
    let actions = canonical
        .columns()
        .iter()
        .map(|spec| {
            let (conversion, sentinel) = match file.column_type(&spec.name) {
                None => (Conversion::Fill, SentinelRule::None),
                Some(declared) => {
                    let conversion = if declared == spec.declared_type {
                        Conversion::Keep
                    } else if spec.declared_type.is_numeric() && declared == ColumnType::String {
                        Conversion::ParseNumeric { from: declared }
                    } else {
                        Conversion::Cast { from: declared }
                    };
                    let sentinel = if declared == ColumnType::String
                        && spec.declared_type == ColumnType::String
                    {
                        SentinelRule::BlankToNull
                    } else {
                        SentinelRule::None
                    };
                    (conversion, sentinel)
                }
            };
            ColumnAction {
                column: spec.name.clone(),
                target: spec.declared_type,
                conversion,
                sentinel,
            }
        })
        .collect();

    CastPlan {
        source: file.source.clone(),
        actions,
    }
}
