//! Sentinel normalization.
//!
//! Registry extracts encode "missing" as blank or whitespace-only text.
//! One semantics, two layers: a scalar function for single values, and
//! expression builders that compile the same rules into a deferred plan so
//! lazy handles normalize inside the engine rather than in an eager pass.
//!
//! Strict numeric parsing inside a plan cannot return a typed error
//! directly; it embeds a tagged payload in the engine error, and
//! [`decode_conversion_error`] recovers the typed error at collect time.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use nsqip_model::{ColumnType, NsqipError, Result, Scalar, SourceId};

/// Normalize one raw text value against a target type.
///
/// Numeric targets parse strictly: whitespace-only is missing, anything
/// else must parse or the call fails with `ValueConversion` naming the
/// column, source, and value. String and boolean targets only rewrite
/// whitespace-only to missing; every other value passes through
/// byte-identical.
pub fn normalize_value(
    column: &str,
    source: &SourceId,
    raw: &str,
    target: ColumnType,
) -> Result<Option<Scalar>> {
    let trimmed = raw.trim();
    match target {
        ColumnType::Integer => {
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(|value| Some(Scalar::Int(value)))
                .map_err(|_| conversion_error(column, source.as_str(), raw))
        }
        ColumnType::Float64 => {
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(|value| Some(Scalar::Float(value)))
                .map_err(|_| conversion_error(column, source.as_str(), raw))
        }
        ColumnType::String | ColumnType::Boolean => {
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Scalar::Str(raw.to_string())))
            }
        }
    }
}

/// Expression rewriting whitespace-only text to null, leaving every other
/// value untouched.
pub fn blank_to_null(column: &str) -> Expr {
    when(col(column).str().strip_chars(lit(NULL)).eq(lit("")))
        .then(lit(NULL))
        .otherwise(col(column))
        .alias(column)
}

/// Strict text-to-number parse as a plan expression.
///
/// Whitespace-only values become null; anything unparseable fails the
/// collect with a payload carrying column, source, and offending value.
pub fn parse_numeric_expr(column: &str, source: &SourceId, target: ColumnType) -> Result<Expr> {
    let column_name = column.to_string();
    let source_name = source.as_str().to_string();

    let expr = match target {
        ColumnType::Integer => col(column)
            .map(
                move |c: Column| {
                    let ca = c.str()?;
                    let mut builder =
                        PrimitiveChunkedBuilder::<Int64Type>::new(ca.name().clone(), ca.len());
                    for opt_val in ca.into_iter() {
                        match opt_val {
                            None => builder.append_null(),
                            Some(raw) => {
                                let trimmed = raw.trim();
                                if trimmed.is_empty() {
                                    builder.append_null();
                                } else {
                                    match trimmed.parse::<i64>() {
                                        Ok(value) => builder.append_value(value),
                                        Err(_) => {
                                            return Err(conversion_compute_error(
                                                &column_name,
                                                &source_name,
                                                raw,
                                            ));
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Ok(builder.finish().into_column())
                },
                |_, field| Ok(Field::new(field.name().clone(), DataType::Int64)),
            )
            .alias(column),
        ColumnType::Float64 => col(column)
            .map(
                move |c: Column| {
                    let ca = c.str()?;
                    let mut builder =
                        PrimitiveChunkedBuilder::<Float64Type>::new(ca.name().clone(), ca.len());
                    for opt_val in ca.into_iter() {
                        match opt_val {
                            None => builder.append_null(),
                            Some(raw) => {
                                let trimmed = raw.trim();
                                if trimmed.is_empty() {
                                    builder.append_null();
                                } else {
                                    match trimmed.parse::<f64>() {
                                        Ok(value) => builder.append_value(value),
                                        Err(_) => {
                                            return Err(conversion_compute_error(
                                                &column_name,
                                                &source_name,
                                                raw,
                                            ));
                                        }
                                    }
                                }
                            }
                        }
                    }
                    Ok(builder.finish().into_column())
                },
                |_, field| Ok(Field::new(field.name().clone(), DataType::Float64)),
            )
            .alias(column),
        ColumnType::String | ColumnType::Boolean => {
            return Err(NsqipError::construction(
                "numeric parse target",
                format!("column {column} targets non-numeric type {target}"),
            ));
        }
    };

    Ok(expr)
}

/// Translate an engine failure into the typed error vocabulary, recovering
/// `ValueConversion` when the failure carries a conversion payload.
pub fn decode_conversion_error(err: PolarsError, context: &str) -> NsqipError {
    let text = err.to_string();
    if let Some(start) = text.find(CONVERSION_MARKER) {
        let rest = &text[start + CONVERSION_MARKER.len()..];
        let json = rest
            .rfind('}')
            .map(|end| &rest[..=end])
            .unwrap_or(rest);
        if let Ok(payload) = serde_json::from_str::<ConversionPayload>(json) {
            return NsqipError::ValueConversion {
                column: payload.column,
                source: payload.source,
                value: payload.value,
            };
        }
    }
    NsqipError::engine(context, text)
}

const CONVERSION_MARKER: &str = "value conversion failed: ";

#[derive(Debug, Serialize, Deserialize)]
struct ConversionPayload {
    column: String,
    source: String,
    value: String,
}

fn conversion_error(column: &str, source: &str, value: &str) -> NsqipError {
    NsqipError::ValueConversion {
        column: column.to_string(),
        source: source.to_string(),
        value: value.to_string(),
    }
}

fn conversion_compute_error(column: &str, source: &str, value: &str) -> PolarsError {
    let payload = serde_json::to_string(&ConversionPayload {
        column: column.to_string(),
        source: source.to_string(),
        value: value.to_string(),
    })
    .unwrap_or_default();
    PolarsError::ComputeError(format!("{CONVERSION_MARKER}{payload}").into())
}
