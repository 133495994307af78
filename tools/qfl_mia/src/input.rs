//! CSV table → `RawRow`s.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use geolab_core::RawRow;

/// Read every data row, pairing cells with the header row.
/// Short rows keep only the cells they have; the core reports what is missing.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers().context("cannot read CSV header row")?.clone();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("malformed CSV at data row {}", i + 1))?;
        rows.push(RawRow::from_pairs(headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

pub fn read_file(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    read_rows(file).with_context(|| format!("while reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_pair_with_headers() {
        let csv = "Sample, Q ,F,L\nA, 60 ,30,10\nB,20,50\n";
        let rows = read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Q"), Some("60"));
        assert_eq!(rows[1].get("L"), None);
    }
}
