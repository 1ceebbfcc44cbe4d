pub mod aggregate;
pub mod run;

pub use aggregate::aggregate;
pub use run::{DocumentReport, Pipeline, PipelineError};
