//! CSV export of batch results and diagnostics.
//!
//! Result columns use the input header names, so an exported table can be
//! fed straight back into `process_batch`.

use std::io;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchResult, Sample};
use crate::error::ExportError;
use crate::schema::{InputMode, MINERAL_COLUMNS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Fixed number of decimals for numeric columns; shortest round-trip when `None`.
    pub precision: Option<usize>,
}

impl ExportOptions {
    fn number(&self, v: f64) -> String {
        match self.precision {
            Some(p) => format!("{v:.p$}"),
            None => v.to_string(),
        }
    }
}

/// Pass-through headers across all samples, first-seen order.
fn extra_headers(samples: &[Sample]) -> Vec<&str> {
    let mut headers: Vec<&str> = Vec::new();
    for s in samples {
        for (h, _) in &s.extra {
            if !headers.contains(&h.as_str()) {
                headers.push(h);
            }
        }
    }
    headers
}

pub fn write_results<W: io::Write>(result: &BatchResult, writer: W, options: &ExportOptions) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let with_raw = result.mode == InputMode::FullMineral;
    let extras = extra_headers(&result.samples);

    let mut header: Vec<&str> = vec!["Sample"];
    if with_raw {
        header.extend(MINERAL_COLUMNS.iter().map(|c| c.name()));
    }
    header.extend(extras.iter().copied());
    header.extend(["Q", "F", "L", "MIA", "MIA category", "classification", "Q%", "F%", "L%"]);
    wtr.write_record(&header)?;

    for s in &result.samples {
        let mut record: Vec<String> = vec![s.id.clone()];
        if with_raw {
            match &s.raw {
                Some(m) => record.extend(m.values().iter().map(|&v| options.number(v))),
                None => record.extend(std::iter::repeat(String::new()).take(MINERAL_COLUMNS.len())),
            }
        }
        for h in &extras {
            let cell = s.extra.iter().find(|(k, _)| k == h).map(|(_, v)| v.clone());
            record.push(cell.unwrap_or_default());
        }
        record.push(options.number(s.qfl.q));
        record.push(options.number(s.qfl.f));
        record.push(options.number(s.qfl.l));
        record.push(options.number(s.mia));
        record.push(s.mia_category.label().to_string());
        record.push(s.classification.to_string());
        match &s.normalized {
            Some(t) => record.extend(t.percent().iter().map(|&v| options.number(v))),
            None => record.extend([String::new(), String::new(), String::new()]),
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Every row left out of the plot: skipped rows and degenerate samples, by row.
pub fn write_diagnostics<W: io::Write>(result: &BatchResult, writer: W) -> Result<(), ExportError> {
    let mut entries: Vec<(usize, String, &'static str, String)> = result
        .diagnostics
        .skipped
        .iter()
        .map(|s| (s.row, s.id.clone().unwrap_or_default(), "skipped", s.reason.to_string()))
        .collect();
    entries.extend(
        result
            .diagnostics
            .degenerate
            .iter()
            .map(|d| (d.row, d.id.clone(), "degenerate", "Q + F + L = 0".to_string())),
    );
    entries.sort_by_key(|e| e.0);

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["row", "sample", "status", "reason"])?;
    for (row, id, status, reason) in entries {
        wtr.write_record([row.to_string(), id, status.to_string(), reason])?;
    }
    wtr.flush()?;
    Ok(())
}
