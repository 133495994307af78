//! Batch pipeline orchestrator and result aggregation.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, Qfl};
use crate::error::{DegenerateSampleError, SchemaError};
use crate::maturity::{maturity_index, MiaCategory};
use crate::schema::{normalize_rows, Composition, InputMode, MineralComposition, NormalizedRow, RawRow, SkippedRow};
use crate::ternary::classify::{classify_point, Classification, DEFAULT_TOLERANCE};
use crate::ternary::fields::FieldTable;
use crate::ternary::{project, Point2, Ternary};

// ── Public structs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Declared input schema; inferred from the columns when `None`.
    pub mode: Option<InputMode>,
    /// Edge distance (diagram units) at which a point counts as on a field boundary.
    pub boundary_tolerance: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: None,
            boundary_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// One rock specimen with every derived quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub row: usize,
    pub id: String,
    /// Present in full-mineral mode only.
    pub raw: Option<MineralComposition>,
    pub qfl: Qfl,
    pub mia: f64,
    pub mia_category: MiaCategory,
    /// `None` for degenerate samples.
    pub normalized: Option<Ternary>,
    /// Projected `normalized`; the classifier and the renderer both read this.
    pub position: Option<Point2>,
    pub classification: Classification,
    pub extra: Vec<(String, String)>,
}

impl Sample {
    pub fn is_degenerate(&self) -> bool {
        self.normalized.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub skipped: Vec<SkippedRow>,
    pub degenerate: Vec<DegenerateSampleError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub input_rows: usize,
    pub samples: usize,
    pub degenerate: usize,
    pub skipped: usize,
    /// Plain sums over all samples, for display; never renormalized.
    pub total_q: f64,
    pub total_f: f64,
    pub total_l: f64,
    /// Mean over non-degenerate samples; `None` when there are none.
    pub mean_mia: Option<f64>,
    pub mean_mia_category: Option<MiaCategory>,
    /// Table order, followed by `unclassified` when any sample missed every field.
    pub field_counts: Vec<FieldCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub mode: InputMode,
    pub field_table: String,
    /// Input order.
    pub samples: Vec<Sample>,
    pub diagnostics: Diagnostics,
    pub summary: BatchSummary,
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Aggregation → MIA → normalization → classification for one row.
/// Either every derived field is set or the sample is degenerate.
fn derive_sample(
    row: NormalizedRow,
    table: &FieldTable,
    tolerance: f64,
) -> Result<Sample, (Sample, DegenerateSampleError)> {
    let qfl = aggregate(&row.composition);
    let mia = maturity_index(&qfl);
    let raw = match row.composition {
        Composition::Mineral(m) => Some(m),
        Composition::Direct(_) => None,
    };

    let mut sample = Sample {
        row: row.row,
        id: row.id,
        raw,
        qfl,
        mia,
        mia_category: MiaCategory::from_mia(mia),
        normalized: None,
        position: None,
        classification: Classification::Undefined,
        extra: row.extra,
    };

    match Ternary::from_qfl(&qfl) {
        Some(t) => {
            let p = project(&t);
            sample.classification = classify_point(p, table, tolerance);
            sample.normalized = Some(t);
            sample.position = Some(p);
            Ok(sample)
        }
        None => {
            let err = DegenerateSampleError {
                row: sample.row,
                id: sample.id.clone(),
            };
            Err((sample, err))
        }
    }
}

pub fn summarize(samples: &[Sample], table: &FieldTable, input_rows: usize, skipped: usize) -> BatchSummary {
    let total_q: f64 = samples.iter().map(|s| s.qfl.q).sum();
    let total_f: f64 = samples.iter().map(|s| s.qfl.f).sum();
    let total_l: f64 = samples.iter().map(|s| s.qfl.l).sum();

    let valid: Vec<f64> = samples.iter().filter(|s| !s.is_degenerate()).map(|s| s.mia).collect();
    let mean_mia = if valid.is_empty() {
        None
    } else {
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    };

    let count = |c: &Classification| samples.iter().filter(|s| &s.classification == c).count();
    let mut field_counts: Vec<FieldCount> = table
        .names()
        .map(|name| FieldCount {
            name: name.to_string(),
            count: count(&Classification::Field(name.to_string())),
        })
        .collect();
    let unclassified = count(&Classification::Unclassified);
    if unclassified > 0 {
        field_counts.push(FieldCount {
            name: Classification::Unclassified.to_string(),
            count: unclassified,
        });
    }

    BatchSummary {
        input_rows,
        samples: samples.len(),
        degenerate: samples.len() - valid.len(),
        skipped,
        total_q,
        total_f,
        total_l,
        mean_mia,
        mean_mia_category: mean_mia.map(MiaCategory::from_mia),
        field_counts,
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Run one submitted table through the whole pipeline.
///
/// Pipeline order:
///   1. Schema normalization (may reject the batch)
///   2. Component aggregation
///   3. Maturity index
///   4. Ternary normalization + classification
///   5. Summary
pub fn process_batch(rows: &[RawRow], table: &FieldTable, options: &BatchOptions) -> Result<BatchResult, SchemaError> {
    let normalized = normalize_rows(rows, options.mode)?;
    debug!(
        rows = normalized.rows.len(),
        skipped = normalized.skipped.len(),
        "schema normalization done"
    );

    let mut samples = Vec::with_capacity(normalized.rows.len());
    let mut degenerate = Vec::new();
    for row in normalized.rows {
        match derive_sample(row, table, options.boundary_tolerance) {
            Ok(sample) => samples.push(sample),
            Err((sample, err)) => {
                warn!(row = err.row, id = %err.id, "degenerate sample: Q + F + L = 0");
                samples.push(sample);
                degenerate.push(err);
            }
        }
    }

    let summary = summarize(&samples, table, rows.len(), normalized.skipped.len());
    info!(
        mode = %normalized.mode,
        table = %table.name,
        samples = summary.samples,
        skipped = summary.skipped,
        degenerate = summary.degenerate,
        mean_mia = ?summary.mean_mia,
        "batch processed"
    );

    Ok(BatchResult {
        mode: normalized.mode,
        field_table: table.name.clone(),
        samples,
        diagnostics: Diagnostics {
            skipped: normalized.skipped,
            degenerate,
        },
        summary,
    })
}
