//! QFL/MIA sandstone provenance engine.
//!
//! Pipeline stages, leaf to root:
//!   schema → aggregate → maturity → ternary → render / export
//!
//! `batch::process_batch` runs them in order over one submitted table.

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod geocalc;
pub mod maturity;
pub mod render;
pub mod schema;
pub mod ternary;

pub use batch::{process_batch, BatchOptions, BatchResult, BatchSummary, Sample};
pub use config::PipelineConfig;
pub use error::{SchemaError, DegenerateSampleError};
pub use schema::{InputMode, RawRow};
pub use ternary::fields::{FieldScheme, FieldTable};
