use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical column type of the harmonized model.
///
/// Registry files disagree on physical types across years; every source
/// column is mapped onto one of these four before unification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float64,
    String,
    Boolean,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float64)
    }

    /// Widen two declared types into the narrowest type that can carry both.
    ///
    /// String absorbs the numeric chain, Float64 absorbs Integer, and both
    /// numerics absorb Boolean. Boolean against String has no common carrier
    /// and returns None.
    pub fn widened_with(self, other: ColumnType) -> Option<ColumnType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (ColumnType::String, ColumnType::Boolean)
            | (ColumnType::Boolean, ColumnType::String) => None,
            (ColumnType::String, _) | (_, ColumnType::String) => Some(ColumnType::String),
            (ColumnType::Float64, _) | (_, ColumnType::Float64) => Some(ColumnType::Float64),
            (ColumnType::Integer, _) | (_, ColumnType::Integer) => Some(ColumnType::Integer),
            (ColumnType::Boolean, ColumnType::Boolean) => Some(ColumnType::Boolean),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float64 => "float64",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    /// Parse a type name, accepting the spellings engine schemas and
    /// configuration files use for the same four types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "i64" | "int64" => Ok(ColumnType::Integer),
            "float64" | "float" | "f64" | "double" => Ok(ColumnType::Float64),
            "string" | "str" | "utf8" | "text" => Ok(ColumnType::String),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            _ => Err(format!("Unknown column type: {}", s)),
        }
    }
}

/// One column of a canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: ColumnType,
    /// True when harmonization may introduce missing values for this column:
    /// it is absent from at least one source, or a string-typed source makes
    /// it subject to blank-sentinel rewriting.
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            declared_type,
            nullable,
        }
    }
}
