//! Serializable row predicates.
//!
//! A predicate is a description, never a closure: it can be logged,
//! stored, shipped across a process boundary, and compiled into the
//! engine's expression language on demand. Constructors validate at build
//! time so a bad filter fails before any source is touched; `validate`
//! re-checks the same invariants on trees that arrived by deserialization.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use nsqip_model::{NsqipError, Result, Scalar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Column value is one of the allowed values.
    Membership { column: String, allowed: Vec<Scalar> },
    /// Column value lies in the inclusive range `[low, high]`.
    Range {
        column: String,
        low: Scalar,
        high: Scalar,
    },
    /// Column value equals the given value.
    Equals { column: String, value: Scalar },
    /// Every child holds. Empty means always true.
    AndAll { predicates: Vec<Predicate> },
    /// At least one child holds. Empty means always false.
    OrAny { predicates: Vec<Predicate> },
}

impl Predicate {
    pub fn membership<C, I, V>(column: C, allowed: I) -> Result<Self>
    where
        C: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let predicate = Predicate::Membership {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        };
        predicate.validate()?;
        Ok(predicate)
    }

    pub fn range<C, L, H>(column: C, low: L, high: H) -> Result<Self>
    where
        C: Into<String>,
        L: Into<Scalar>,
        H: Into<Scalar>,
    {
        let predicate = Predicate::Range {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        };
        predicate.validate()?;
        Ok(predicate)
    }

    pub fn equals<C, V>(column: C, value: V) -> Result<Self>
    where
        C: Into<String>,
        V: Into<Scalar>,
    {
        let predicate = Predicate::Equals {
            column: column.into(),
            value: value.into(),
        };
        predicate.validate()?;
        Ok(predicate)
    }

    pub fn and_all(predicates: Vec<Predicate>) -> Self {
        Predicate::AndAll { predicates }
    }

    pub fn or_any(predicates: Vec<Predicate>) -> Self {
        Predicate::OrAny { predicates }
    }

    /// Every column name the tree references.
    pub fn columns(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Predicate::Membership { column, .. }
            | Predicate::Range { column, .. }
            | Predicate::Equals { column, .. } => {
                out.insert(column.as_str());
            }
            Predicate::AndAll { predicates } | Predicate::OrAny { predicates } => {
                for predicate in predicates {
                    predicate.collect_columns(out);
                }
            }
        }
    }

    /// Re-check the construction invariants over the whole tree. Trees built
    /// through the constructors always pass; deserialized trees may not.
    pub fn validate(&self) -> Result<()> {
        match self {
            Predicate::Membership { column, allowed } => {
                check_column(column)?;
                if allowed.is_empty() {
                    return Err(NsqipError::construction(
                        "membership list",
                        format!("column {column}: allowed values must not be empty"),
                    ));
                }
                Ok(())
            }
            Predicate::Range { column, low, high } => {
                check_column(column)?;
                match low.partial_cmp_value(high) {
                    None => Err(NsqipError::construction(
                        "range bounds",
                        format!("column {column}: {low} and {high} are not comparable"),
                    )),
                    Some(std::cmp::Ordering::Greater) => Err(NsqipError::construction(
                        "range bounds",
                        format!("column {column}: low {low} exceeds high {high}"),
                    )),
                    Some(_) => Ok(()),
                }
            }
            Predicate::Equals { column, .. } => check_column(column),
            Predicate::AndAll { predicates } | Predicate::OrAny { predicates } => {
                for predicate in predicates {
                    predicate.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Compile into an engine expression. Membership compiles to a chain of
    /// equality tests joined with OR.
    pub fn to_expr(&self) -> Expr {
        match self {
            Predicate::Membership { column, allowed } => allowed
                .iter()
                .map(|value| col(column.as_str()).eq(lit_scalar(value)))
                .reduce(Expr::or)
                .unwrap_or_else(|| lit(false)),
            Predicate::Range { column, low, high } => col(column.as_str())
                .gt_eq(lit_scalar(low))
                .and(col(column.as_str()).lt_eq(lit_scalar(high))),
            Predicate::Equals { column, value } => col(column.as_str()).eq(lit_scalar(value)),
            Predicate::AndAll { predicates } => predicates
                .iter()
                .map(Predicate::to_expr)
                .reduce(Expr::and)
                .unwrap_or_else(|| lit(true)),
            Predicate::OrAny { predicates } => predicates
                .iter()
                .map(Predicate::to_expr)
                .reduce(Expr::or)
                .unwrap_or_else(|| lit(false)),
        }
    }
}

fn check_column(column: &str) -> Result<()> {
    if column.trim().is_empty() {
        return Err(NsqipError::construction(
            "column name",
            "must not be blank",
        ));
    }
    Ok(())
}

fn lit_scalar(value: &Scalar) -> Expr {
    match value {
        Scalar::Bool(v) => lit(*v),
        Scalar::Int(v) => lit(*v),
        Scalar::Float(v) => lit(*v),
        Scalar::Str(v) => lit(v.clone()),
    }
}
