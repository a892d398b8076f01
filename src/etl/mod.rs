//! Core ETL (Extract, Transform, Load) abstractions
//!
//! The stage traits describe what each stage does with a dataset;
//! [`Pipeline`] wires them to an intermediate store so each stage can be
//! invoked on its own for a given run, or all three in order.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::{IdentityTransformer, Transformer};
