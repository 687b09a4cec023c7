//! Dataset-kind detection from schema markers.
//!
//! The registry publishes adult and pediatric files with disjoint age
//! representations, so the age column doubles as a population marker.
//! Detection inspects column presence only and never reads data.

use nsqip_model::{CanonicalSchema, DatasetKind, NsqipError, Result};

/// Marker columns per kind. The adult files have carried several spellings
/// of the age-in-years column over the registry's lifetime; pediatric files
/// store age in days. Adding a kind means one table row here plus its enum
/// variant.
const MARKER_TABLE: &[(DatasetKind, &[&str])] = &[
    (DatasetKind::Adult, &["AGE_YEARS", "AGE_AS_INT", "AGE"]),
    (DatasetKind::Pediatric, &["AGE_DAYS"]),
];

/// Determine which population a canonical schema describes.
///
/// Every marker-table entry is evaluated: exactly one matching kind wins,
/// no match is `Unknown`, and several matches fail with `AmbiguousSchema`
/// naming each kind and the marker column that matched it.
pub fn detect(schema: &CanonicalSchema) -> Result<DatasetKind> {
    let mut matches: Vec<(DatasetKind, String)> = Vec::new();
    for (kind, markers) in MARKER_TABLE {
        if let Some(marker) = markers.iter().find(|marker| schema.contains(marker)) {
            matches.push((*kind, (*marker).to_string()));
        }
    }
    match matches.as_slice() {
        [] => Ok(DatasetKind::Unknown),
        [(kind, _)] => Ok(*kind),
        _ => Err(NsqipError::AmbiguousSchema { matches }),
    }
}

/// The marker column the given kind matched in this schema, if any. For
/// adult schemas this is whichever age-in-years spelling the dataset uses.
pub fn marker_column(schema: &CanonicalSchema, kind: DatasetKind) -> Option<&'static str> {
    MARKER_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .and_then(|(_, markers)| {
            markers
                .iter()
                .find(|marker| schema.contains(marker))
                .copied()
        })
}
