//! Registry-aware convenience filters.
//!
//! These helpers encode column knowledge that is specific to the surgical
//! registry: which column holds the year, how CPT and diagnosis codes are
//! stored, and how each population expresses patient age. They all reduce
//! to ordinary predicates over the handle.

use nsqip_model::{DatasetKind, NsqipError, Result, Scalar};
use nsqip_schema::marker_column;

use crate::handle::TableHandle;
use crate::predicate::Predicate;

/// Year of operation, the primary year column.
pub const SURGERY_YEAR: &str = "OPERYR";
/// Admission year, carried by some older files instead of [`SURGERY_YEAR`].
pub const ADMISSION_YEAR: &str = "ADMYR";
/// Principal procedure code.
pub const CPT_COLUMN: &str = "CPT";
/// Postoperative diagnosis columns, ICD-9 and ICD-10 respectively.
pub const DIAGNOSIS_COLUMNS: &[&str] = &["PODIAG", "PODIAG10"];
/// Conversion factor between the pediatric age-in-days column and years.
pub const DAYS_PER_YEAR: f64 = 365.25;

impl TableHandle {
    /// Keep rows whose year column matches one of `years`.
    ///
    /// Uses [`SURGERY_YEAR`] when present, falling back to
    /// [`ADMISSION_YEAR`]. Year values are compared numerically unless the
    /// dataset stores the year as text.
    pub fn filter_by_year(&self, years: &[i64]) -> Result<TableHandle> {
        let spec = [SURGERY_YEAR, ADMISSION_YEAR]
            .into_iter()
            .find_map(|column| self.schema().get(column))
            .ok_or_else(|| self.schema().unknown_column(SURGERY_YEAR))?;

        let predicate = if spec.declared_type.is_numeric() {
            Predicate::membership(spec.name.clone(), years.iter().copied())?
        } else {
            Predicate::membership(spec.name.clone(), years.iter().map(i64::to_string))?
        };
        self.filter(&predicate)
    }

    /// Keep rows whose procedure code matches one of `codes`.
    ///
    /// Codes are given as text; when the dataset stores CPT numerically
    /// each code must parse as an integer.
    pub fn filter_by_cpt<S: AsRef<str>>(&self, codes: &[S]) -> Result<TableHandle> {
        let spec = self
            .schema()
            .get(CPT_COLUMN)
            .ok_or_else(|| self.schema().unknown_column(CPT_COLUMN))?;

        let mut allowed: Vec<Scalar> = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.as_ref().trim();
            if spec.declared_type.is_numeric() {
                let parsed: i64 = code.parse().map_err(|_| {
                    NsqipError::construction(
                        "cpt code",
                        format!("{CPT_COLUMN} is numeric in this dataset, but {code:?} is not"),
                    )
                })?;
                allowed.push(Scalar::from(parsed));
            } else {
                allowed.push(Scalar::from(code));
            }
        }

        self.filter(&Predicate::membership(CPT_COLUMN, allowed)?)
    }

    /// Keep rows whose postoperative diagnosis matches one of `codes` in
    /// any diagnosis column the dataset carries. Datasets spanning the
    /// ICD-9 to ICD-10 transition have both columns; a row matches if
    /// either of them does.
    pub fn filter_by_diagnosis<S: AsRef<str>>(&self, codes: &[S]) -> Result<TableHandle> {
        let present: Vec<&str> = DIAGNOSIS_COLUMNS
            .iter()
            .copied()
            .filter(|column| self.schema().contains(column))
            .collect();
        if present.is_empty() {
            return Err(self.schema().unknown_column(DIAGNOSIS_COLUMNS[0]));
        }

        let mut clauses = Vec::with_capacity(present.len());
        for column in present {
            clauses.push(Predicate::membership(
                column,
                codes.iter().map(|code| code.as_ref().trim().to_string()),
            )?);
        }
        self.filter(&Predicate::or_any(clauses))
    }

    /// Keep rows whose patient age falls within `[min_years, max_years]`.
    ///
    /// The bounds are always in years. Adult datasets filter the
    /// age-in-years column directly, whichever spelling this dataset uses;
    /// pediatric datasets convert the bounds to days first. Datasets of
    /// unknown kind cannot be filtered by age.
    pub fn filter_by_age(&self, min_years: f64, max_years: f64) -> Result<TableHandle> {
        match self.kind() {
            DatasetKind::Adult => {
                let column = marker_column(self.schema(), DatasetKind::Adult)
                    .ok_or_else(|| self.schema().unknown_column("AGE"))?;
                self.numeric_range(column, min_years, max_years)
            }
            DatasetKind::Pediatric => {
                let column = marker_column(self.schema(), DatasetKind::Pediatric)
                    .ok_or_else(|| self.schema().unknown_column("AGE_DAYS"))?;
                self.numeric_range(column, min_years * DAYS_PER_YEAR, max_years * DAYS_PER_YEAR)
            }
            DatasetKind::Unknown => Err(NsqipError::KindRequired {
                operation: "filter_by_age".to_string(),
            }),
        }
    }

    fn numeric_range(&self, column: &str, low: f64, high: f64) -> Result<TableHandle> {
        let spec = self
            .schema()
            .get(column)
            .ok_or_else(|| self.schema().unknown_column(column))?;
        if !spec.declared_type.is_numeric() {
            return Err(NsqipError::construction(
                "age column",
                format!("{column} is typed {}, expected a numeric type", spec.declared_type),
            ));
        }
        self.filter(&Predicate::range(column, low, high)?)
    }
}
