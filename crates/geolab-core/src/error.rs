//! Error taxonomy for the batch pipeline.
//!
//! Only `SchemaError` rejects a batch. Row skips are plain data
//! (`schema::SkippedRow`) and degenerate samples are recorded, not raised.

use serde::Serialize;
use thiserror::Error;

use crate::schema::InputMode;

/// Fatal to the whole batch: nothing downstream runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("input table has no rows")]
    EmptyInput,

    #[error("cannot determine input mode: no row carries mineral (Qm, Qp, K, P, Lm, Ls, Lv) or Q/F/L columns")]
    UndeterminedMode,

    #[error(
        "batch mixes schemas: row {mineral_row} has full mineral data but row {direct_row} has only Q/F/L values"
    )]
    MixedSchemas { mineral_row: usize, direct_row: usize },

    #[error("declared input mode is {declared} but row {row} carries only {found} columns")]
    ModeMismatch {
        declared: InputMode,
        found: InputMode,
        row: usize,
    },

    #[error("no valid rows remain after filtering ({skipped} skipped)")]
    NoValidRows { skipped: usize },
}

/// Q + F + L = 0: the sample has no position on the ternary diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("sample {id} (row {row}) is degenerate: Q + F + L = 0")]
pub struct DegenerateSampleError {
    pub row: usize,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldTableError {
    #[error("field table {0:?} has no fields")]
    Empty(String),

    #[error("field {field:?} has {count} vertices, at least 3 required")]
    TooFewVertices { field: String, count: usize },

    #[error("field {field:?} vertex {index} is invalid: components must be finite, non-negative and not all zero")]
    InvalidVertex { field: String, index: usize },

    #[error("duplicate field name {0:?}")]
    DuplicateName(String),

    #[error("field name {0:?} is reserved")]
    ReservedName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    FieldTable(#[from] FieldTableError),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv output: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Out-of-domain input to one of the `geocalc` formulas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfDomain {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
}
