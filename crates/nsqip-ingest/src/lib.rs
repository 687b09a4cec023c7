pub mod normalize;
pub mod plan;
pub mod schema_scan;
pub mod source;

pub use normalize::{blank_to_null, decode_conversion_error, normalize_value, parse_numeric_expr};
pub use plan::{source_plan, source_plan_with};
pub use schema_scan::{
    DEFAULT_CSV_INFER_ROWS, column_type_of, engine_dtype, read_file_schema, read_file_schema_with,
    scan_source,
};
pub use source::{SourceFormat, SourceSpec, discover_sources};
