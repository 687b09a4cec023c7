pub mod column;
pub mod error;
pub mod kind;
pub mod scalar;
pub mod schema;
pub mod source;

pub use column::{ColumnSpec, ColumnType};
pub use error::{NsqipError, Result};
pub use kind::DatasetKind;
pub use scalar::Scalar;
pub use schema::{CanonicalSchema, FileSchema};
pub use source::SourceId;
