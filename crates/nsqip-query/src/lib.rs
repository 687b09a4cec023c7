pub mod handle;
pub mod open;
pub mod predicate;
pub mod registry;

pub use handle::{DatasetSummary, Mode, TableHandle};
pub use open::{OpenOptions, open, open_dir, open_dir_with, open_with};
pub use predicate::Predicate;
pub use registry::{ADMISSION_YEAR, CPT_COLUMN, DAYS_PER_YEAR, DIAGNOSIS_COLUMNS, SURGERY_YEAR};
