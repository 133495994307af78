//! Schema normalizer.
//!
//! Maps heterogeneous column headers onto the canonical component schema
//! through a fixed alias table, resolves the batch input mode, and parses
//! every row into a `Composition` or a `SkippedRow`.
//!
//! Row numbers are 1-based data rows (the header line is not counted).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::Qfl;
use crate::error::SchemaError;

// ── Input rows ────────────────────────────────────────────────────────────────

/// One input row as ordered (header, cell text) pairs.
///
/// Uploaded CSV tables and interactively edited tables both arrive in this
/// shape; headers are matched later, so any casing or alias is accepted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Append one cell (builder style).
    pub fn with(mut self, header: impl Into<String>, value: impl ToString) -> Self {
        self.cells.push((header.into(), value.to_string()));
        self
    }

    /// Exact-header lookup, first match.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

// ── Modes and canonical columns ───────────────────────────────────────────────

/// The two mutually exclusive input schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Raw subcomponents: Qm, Qp, K, P, Lm, Ls, Lv.
    FullMineral,
    /// Endmember sums supplied directly: Q, F, L.
    DirectQfl,
}

impl InputMode {
    pub fn required_columns(self) -> &'static [Column] {
        match self {
            InputMode::FullMineral => &MINERAL_COLUMNS,
            InputMode::DirectQfl => &QFL_COLUMNS,
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::FullMineral => f.write_str("full mineral"),
            InputMode::DirectQfl => f.write_str("direct Q-F-L"),
        }
    }
}

/// Canonical column of either input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Sample,
    Qm,
    Qp,
    K,
    P,
    Lm,
    Ls,
    Lv,
    Q,
    F,
    L,
}

const N_COLUMNS: usize = 11;

pub const MINERAL_COLUMNS: [Column; 7] = [
    Column::Qm,
    Column::Qp,
    Column::K,
    Column::P,
    Column::Lm,
    Column::Ls,
    Column::Lv,
];

pub const QFL_COLUMNS: [Column; 3] = [Column::Q, Column::F, Column::L];

impl Column {
    /// Canonical header as written on export.
    pub fn name(self) -> &'static str {
        match self {
            Column::Sample => "Sample",
            Column::Qm => "Qm",
            Column::Qp => "Qp",
            Column::K => "K",
            Column::P => "P",
            Column::Lm => "Lm",
            Column::Ls => "Ls",
            Column::Lv => "Lv",
            Column::Q => "Q",
            Column::F => "F",
            Column::L => "L",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Alias table ───────────────────────────────────────────────────────────────

/// Header key (trimmed, lower-cased, inner whitespace collapsed) → column.
/// Canonical short names are listed too; they take precedence over aliases.
const ALIASES: &[(&str, Column)] = &[
    ("sample", Column::Sample),
    ("sample id", Column::Sample),
    ("sample_id", Column::Sample),
    ("id", Column::Sample),
    ("qm", Column::Qm),
    ("monocrystalline quartz", Column::Qm),
    ("qp", Column::Qp),
    ("polycrystalline quartz", Column::Qp),
    ("k", Column::K),
    ("feldspar", Column::K),
    ("k-feldspar", Column::K),
    ("p", Column::P),
    ("mica", Column::P),
    ("plagioclase", Column::P),
    ("lm", Column::Lm),
    ("ls", Column::Ls),
    ("lv", Column::Lv),
    ("lithic fragment", Column::Lv),
    ("q", Column::Q),
    ("f", Column::F),
    ("l", Column::L),
];

/// Columns written by `export`. Recognised and dropped on input so that an
/// exported table can be fed back in.
const DERIVED_HEADERS: &[&str] = &[
    "mia",
    "mia category",
    "classification",
    "q%",
    "f%",
    "l%",
    "q %",
    "f %",
    "l %",
];

fn header_key(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve a header to its canonical column, if any.
pub fn resolve_column(header: &str) -> Option<Column> {
    lookup(&header_key(header)).map(|(col, _)| col)
}

/// Returns the column and whether `key` is its canonical short name.
fn lookup(key: &str) -> Option<(Column, bool)> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|&(_, col)| (col, col.name().eq_ignore_ascii_case(key)))
}

// ── Normalized output ─────────────────────────────────────────────────────────

/// Raw detrital components, percentages of the framework grains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MineralComposition {
    pub qm: f64,
    pub qp: f64,
    pub k: f64,
    pub p: f64,
    pub lm: f64,
    pub ls: f64,
    pub lv: f64,
}

impl MineralComposition {
    /// Values in `MINERAL_COLUMNS` order.
    pub fn values(&self) -> [f64; 7] {
        [self.qm, self.qp, self.k, self.p, self.lm, self.ls, self.lv]
    }

    fn from_values(v: &[f64]) -> Self {
        Self {
            qm: v[0],
            qp: v[1],
            k: v[2],
            p: v[3],
            lm: v[4],
            ls: v[5],
            lv: v[6],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Composition {
    Mineral(MineralComposition),
    Direct(Qfl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub row: usize,
    pub id: String,
    pub composition: Composition,
    /// Unrecognised input columns, in input order.
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    MissingComponent { columns: Vec<Column> },
    InvalidValue { column: Column, value: String },
    DuplicateId { id: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingComponent { columns } => {
                let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
                write!(f, "missing component: {}", names.join(", "))
            }
            SkipReason::InvalidValue { column, value } => {
                write!(f, "invalid value {value:?} in column {column}")
            }
            SkipReason::DuplicateId { id } => write!(f, "duplicate sample id {id:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    /// Sample id from the input, when the row carried one.
    pub id: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub mode: InputMode,
    pub rows: Vec<NormalizedRow>,
    pub skipped: Vec<SkippedRow>,
}

// ── Per-row column resolution ─────────────────────────────────────────────────

struct ResolvedRow<'a> {
    /// (cell text, precedence) per canonical column; 0 = canonical header.
    slots: [Option<(&'a str, u8)>; N_COLUMNS],
    extra: Vec<(String, String)>,
}

impl<'a> ResolvedRow<'a> {
    fn new(row: &'a RawRow) -> Self {
        let mut slots: [Option<(&str, u8)>; N_COLUMNS] = [None; N_COLUMNS];
        let mut extra = Vec::new();

        for (header, value) in &row.cells {
            let key = header_key(header);
            if let Some((col, canonical)) = lookup(&key) {
                let precedence = if canonical { 0 } else { 1 };
                let replace = match slots[col as usize] {
                    Some((_, held)) => precedence < held,
                    None => true,
                };
                if replace {
                    slots[col as usize] = Some((value.as_str(), precedence));
                }
            } else if DERIVED_HEADERS.contains(&key.as_str()) {
                continue;
            } else {
                extra.push((header.trim().to_string(), value.clone()));
            }
        }

        Self { slots, extra }
    }

    fn value(&self, col: Column) -> Option<&'a str> {
        self.slots[col as usize].map(|(v, _)| v.trim())
    }

    fn has_value(&self, col: Column) -> bool {
        self.value(col).is_some_and(|v| !v.is_empty())
    }

    fn has_mineral(&self) -> bool {
        MINERAL_COLUMNS.iter().any(|&c| self.has_value(c))
    }

    fn has_direct(&self) -> bool {
        QFL_COLUMNS.iter().any(|&c| self.has_value(c))
    }
}

/// Decide the batch mode before any row is parsed.
///
/// A row with only mineral values and a row with only Q/F/L values can
/// never share a batch. Rows carrying both (re-imported exports) are
/// compatible with either mode; with no declaration, mineral data wins,
/// so a Q/F/L-only row next to any mineral row is a mixed batch.
fn resolve_mode(rows: &[ResolvedRow], declared: Option<InputMode>) -> Result<InputMode, SchemaError> {
    let mut mineral_only = None;
    let mut direct_only = None;
    let mut first_mineral = None;
    let mut any_direct = false;

    for (i, r) in rows.iter().enumerate() {
        let (m, d) = (r.has_mineral(), r.has_direct());
        if m && first_mineral.is_none() {
            first_mineral = Some(i + 1);
        }
        any_direct |= d;
        if m && !d && mineral_only.is_none() {
            mineral_only = Some(i + 1);
        }
        if d && !m && direct_only.is_none() {
            direct_only = Some(i + 1);
        }
    }

    if let (Some(mineral_row), Some(direct_row)) = (mineral_only, direct_only) {
        return Err(SchemaError::MixedSchemas { mineral_row, direct_row });
    }

    match declared {
        Some(InputMode::FullMineral) => match direct_only {
            Some(row) => Err(SchemaError::ModeMismatch {
                declared: InputMode::FullMineral,
                found: InputMode::DirectQfl,
                row,
            }),
            None => Ok(InputMode::FullMineral),
        },
        Some(InputMode::DirectQfl) => match mineral_only {
            Some(row) => Err(SchemaError::ModeMismatch {
                declared: InputMode::DirectQfl,
                found: InputMode::FullMineral,
                row,
            }),
            None => Ok(InputMode::DirectQfl),
        },
        // Inference picks mineral data, which a Q/F/L-only row cannot satisfy.
        None => match (first_mineral, direct_only) {
            (Some(mineral_row), Some(direct_row)) => Err(SchemaError::MixedSchemas { mineral_row, direct_row }),
            (Some(_), None) => Ok(InputMode::FullMineral),
            (None, _) if any_direct => Ok(InputMode::DirectQfl),
            (None, _) => Err(SchemaError::UndeterminedMode),
        },
    }
}

fn parse_value(column: Column, text: &str) -> Result<f64, SkipReason> {
    match text.parse::<f64>() {
        // + 0.0 folds -0.0 into 0.0
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v + 0.0),
        _ => Err(SkipReason::InvalidValue {
            column,
            value: text.to_string(),
        }),
    }
}

fn parse_composition(r: &ResolvedRow, mode: InputMode) -> Result<Composition, SkipReason> {
    let required = mode.required_columns();

    let missing: Vec<Column> = required.iter().copied().filter(|&c| !r.has_value(c)).collect();
    if !missing.is_empty() {
        return Err(SkipReason::MissingComponent { columns: missing });
    }

    let mut values = Vec::with_capacity(required.len());
    let mut total = 0.0;
    for &c in required {
        let text = r.value(c).unwrap_or_default();
        let v = parse_value(c, text)?;
        total += v;
        // Endmember sums and Q + F + L must stay finite.
        if !total.is_finite() {
            return Err(SkipReason::InvalidValue {
                column: c,
                value: text.to_string(),
            });
        }
        values.push(v);
    }

    Ok(match mode {
        InputMode::FullMineral => Composition::Mineral(MineralComposition::from_values(&values)),
        InputMode::DirectQfl => Composition::Direct(Qfl::new(values[0], values[1], values[2])),
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Normalize a submitted table.
///
/// Fails only when the mode cannot be settled or nothing survives; every
/// other problem is row-scoped and lands in `skipped`.
pub fn normalize_rows(rows: &[RawRow], declared: Option<InputMode>) -> Result<NormalizedTable, SchemaError> {
    if rows.is_empty() {
        return Err(SchemaError::EmptyInput);
    }

    let resolved: Vec<ResolvedRow> = rows.iter().map(ResolvedRow::new).collect();
    let mode = resolve_mode(&resolved, declared)?;
    debug!(%mode, rows = rows.len(), declared = declared.is_some(), "resolved input mode");

    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (i, r) in resolved.into_iter().enumerate() {
        let row = i + 1;
        let given_id = r.value(Column::Sample).filter(|v| !v.is_empty());

        let result = parse_composition(&r, mode).and_then(|composition| {
            let id = given_id.map_or_else(|| format!("sample-{row}"), str::to_string);
            if seen.contains(&id) {
                Err(SkipReason::DuplicateId { id })
            } else {
                Ok((id, composition))
            }
        });

        match result {
            Ok((id, composition)) => {
                seen.insert(id.clone());
                out.push(NormalizedRow {
                    row,
                    id,
                    composition,
                    extra: r.extra,
                });
            }
            Err(reason) => {
                warn!(row, id = given_id.unwrap_or(""), %reason, "skipping row");
                skipped.push(SkippedRow {
                    row,
                    id: given_id.map(str::to_string),
                    reason,
                });
            }
        }
    }

    if out.is_empty() {
        return Err(SchemaError::NoValidRows { skipped: skipped.len() });
    }

    Ok(NormalizedTable { mode, rows: out, skipped })
}
