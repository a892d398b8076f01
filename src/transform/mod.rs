//! Transform implementations for tabular datasets
//!
//! Each transformer handles one concern; [`Normalizer`] chains them into the
//! transform stage.

mod column_names;
mod normalizer;
mod nulls;
mod types;

pub use column_names::{ColumnNameNormalizer, normalize_column_name};
pub use normalizer::Normalizer;
pub use nulls::NullCanonicalizer;
pub use types::{ColumnType, TypeInferrer, describe, infer_column};
