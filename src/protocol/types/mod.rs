//! MySQL wire types for statement parameters and result columns.

mod column_type;
mod metadata;
mod param;

pub use column_type::{ColumnType, ValueKind, TEMPORAL_BUFFER_LEN};
pub use metadata::ColumnMetadata;
pub use param::ParamValue;
