pub mod cast;
pub mod detect;
pub mod unify;

pub use cast::{CastPlan, ColumnAction, Conversion, SentinelRule, cast_plan};
pub use detect::{detect, marker_column};
pub use unify::unify;
