//! Schema unification across source files.
//!
//! Registry years drift: columns appear, disappear, and change physical
//! type. Unification folds every file schema into one canonical schema that
//! can carry all of them, or reports precisely why it cannot.

use std::collections::{BTreeMap, BTreeSet};

use nsqip_model::{CanonicalSchema, ColumnSpec, ColumnType, FileSchema, NsqipError, Result};

/// Unify file schemas into the canonical schema of the whole dataset.
///
/// Per column, the declared types widen along `String > Float64 > Integer >
/// Boolean`, with `String` absorbing everything numeric. A column declared
/// `Boolean` by one source and `String` by another has no common carrier and
/// fails with `SchemaConflict` naming both sides. Canonical column order is
/// first-seen order across the inputs; the resulting name-to-type mapping
/// does not depend on input order.
pub fn unify(schemas: &[FileSchema]) -> Result<CanonicalSchema> {
    if schemas.is_empty() {
        return Err(NsqipError::NoSources { dir: None });
    }

    let mut order: Vec<String> = Vec::new();
    let mut declarations: BTreeMap<String, Vec<(String, ColumnType)>> = BTreeMap::new();

    for schema in schemas {
        for (name, declared) in &schema.columns {
            if !declarations.contains_key(name) {
                order.push(name.clone());
            }
            declarations
                .entry(name.clone())
                .or_default()
                .push((schema.source.as_str().to_string(), *declared));
        }
    }

    let mut specs = Vec::with_capacity(order.len());
    for name in &order {
        let declared = &declarations[name];

        let string_sources: Vec<String> = declared
            .iter()
            .filter(|(_, ty)| *ty == ColumnType::String)
            .map(|(source, _)| source.clone())
            .collect();
        let boolean_sources: Vec<String> = declared
            .iter()
            .filter(|(_, ty)| *ty == ColumnType::Boolean)
            .map(|(source, _)| source.clone())
            .collect();
        if !string_sources.is_empty() && !boolean_sources.is_empty() {
            return Err(NsqipError::SchemaConflict {
                column: name.clone(),
                string_sources,
                boolean_sources,
            });
        }

        let mut widened = declared[0].1;
        for (_, ty) in &declared[1..] {
            // With the boolean/string conflict ruled out above, the
            // remaining types form a chain and always widen.
            widened = widened.widened_with(*ty).unwrap_or(ColumnType::String);
        }

        let declaring: BTreeSet<&str> = declared
            .iter()
            .map(|(source, _)| source.as_str())
            .collect();
        let absent_somewhere = declaring.len() < schemas.len();
        let nullable = absent_somewhere || !string_sources.is_empty();

        specs.push(ColumnSpec::new(name.clone(), widened, nullable));
    }

    tracing::debug!(
        sources = schemas.len(),
        columns = specs.len(),
        "Unified canonical schema"
    );

    Ok(CanonicalSchema::new(specs))
}
