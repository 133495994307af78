//! Provenance / classification field tables.
//!
//! A table is ordered: the order is the tie-break when a point falls on an
//! edge shared by two fields (see `classify`). Built-in tables tile the whole
//! triangle, so every non-degenerate sample lands in one of their fields.
//!
//! Vertex values are (Q, F, L) percentages read off the published diagrams:
//!   - Dickinson et al. (1983) QFL provenance fields (digitized boundaries)
//!   - Pettijohn, Potter & Siever QFR sandstone classes: Q = 95 and Q = 75
//!     cut-offs, F:L ratio lines 3:1, 1:1, 1:3.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{project, Point2, Ternary};
use crate::error::FieldTableError;

/// Names the pipeline reserves for samples outside every field.
pub const RESERVED_NAMES: [&str; 2] = ["unclassified", "undefined"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldScheme {
    #[serde(alias = "dickinson")]
    Dickinson1983,
    #[serde(alias = "pettijohn")]
    Pettijohn1975,
}

impl FieldScheme {
    /// Shared read-only table, built on first use.
    pub fn table(self) -> &'static FieldTable {
        static DICKINSON: OnceLock<FieldTable> = OnceLock::new();
        static PETTIJOHN: OnceLock<FieldTable> = OnceLock::new();
        match self {
            FieldScheme::Dickinson1983 => DICKINSON.get_or_init(dickinson_1983),
            FieldScheme::Pettijohn1975 => PETTIJOHN.get_or_init(pettijohn_1975),
        }
    }
}

// ── Types ─────────────────────────────────────────────────────────────────────

/// A named polygon in normalized ternary space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvenanceField {
    pub name: String,
    pub color: [u8; 3],
    pub vertices: Vec<Ternary>,
    #[serde(skip)]
    polygon: Vec<Point2>,
}

impl ProvenanceField {
    fn build(name: String, color: [u8; 3], vertices: Vec<Ternary>) -> Self {
        let polygon = vertices.iter().map(project).collect();
        Self {
            name,
            color,
            vertices,
            polygon,
        }
    }

    /// Vertices projected with `ternary::project`.
    pub fn polygon(&self) -> &[Point2] {
        &self.polygon
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldTable {
    pub name: String,
    pub fields: Vec<ProvenanceField>,
}

impl FieldTable {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn from_spec(spec: FieldTableSpec) -> Result<Self, FieldTableError> {
        if spec.fields.is_empty() {
            return Err(FieldTableError::Empty(spec.name));
        }

        let mut fields: Vec<ProvenanceField> = Vec::with_capacity(spec.fields.len());
        for (i, f) in spec.fields.into_iter().enumerate() {
            if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(f.name.trim())) {
                return Err(FieldTableError::ReservedName(f.name));
            }
            if fields.iter().any(|existing| existing.name == f.name) {
                return Err(FieldTableError::DuplicateName(f.name));
            }
            if f.vertices.len() < 3 {
                return Err(FieldTableError::TooFewVertices {
                    field: f.name,
                    count: f.vertices.len(),
                });
            }

            let mut vertices = Vec::with_capacity(f.vertices.len());
            for (index, &[q, fe, l]) in f.vertices.iter().enumerate() {
                let valid = [q, fe, l].iter().all(|v| v.is_finite() && *v >= 0.0);
                match Ternary::normalize(q, fe, l) {
                    Some(t) if valid => vertices.push(t),
                    _ => {
                        return Err(FieldTableError::InvalidVertex {
                            field: f.name,
                            index,
                        })
                    }
                }
            }

            let color = f.color.unwrap_or(PALETTE[i % PALETTE.len()]);
            fields.push(ProvenanceField::build(f.name, color, vertices));
        }

        Ok(Self {
            name: spec.name,
            fields,
        })
    }
}

/// On-disk form of a custom field table.
///
/// Vertices are (Q, F, L) triples in any unit; each is renormalized.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldTableSpec {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    pub vertices: Vec<[f64; 3]>,
}

#[rustfmt::skip]
const PALETTE: [[u8; 3]; 9] = [
    [230, 159,   0],
    [ 86, 180, 233],
    [  0, 158, 115],
    [240, 228,  66],
    [  0, 114, 178],
    [213,  94,   0],
    [204, 121, 167],
    [153, 153, 153],
    [117, 112, 179],
];

// ── Built-in tables ───────────────────────────────────────────────────────────

/// (Q, F, L) in percent; built-in vertices always sum to 100.
fn pct(q: f64, f: f64, l: f64) -> Ternary {
    Ternary {
        q: q / 100.0,
        f: f / 100.0,
        l: l / 100.0,
    }
}

fn field(name: &str, color: [u8; 3], vertices: &[Ternary]) -> ProvenanceField {
    ProvenanceField::build(name.to_string(), color, vertices.to_vec())
}

#[rustfmt::skip]
fn dickinson_1983() -> FieldTable {
    // Triangle corners.
    let q_apex = pct(100.0, 0.0, 0.0);
    let f_apex = pct(0.0, 100.0, 0.0);
    let l_apex = pct(0.0, 0.0, 100.0);

    // Continental block, on the Q–F edge.
    let ci_qf = pct(82.0, 18.0, 0.0);
    let tc_qf = pct(45.0, 55.0, 0.0);

    // Lower limit of the continental block, Q side → F–L edge.
    let cb_q = pct(97.0, 0.0, 3.0);
    let cb_ci = pct(79.0, 16.0, 5.0);
    let triple = pct(70.0, 23.0, 7.0);
    let cb_bu = pct(42.0, 50.0, 8.0);
    let cb_fl = pct(0.0, 85.0, 15.0);

    // Recycled orogen / magmatic arc limit, triple junction → F–L edge.
    let ro_1 = pct(56.0, 21.0, 23.0);
    let ro_2 = pct(31.5, 17.5, 51.0);
    let ro_fl = pct(0.0, 13.0, 87.0);

    // Recycled orogen subdivisions on the Q–L edge.
    let ql_75 = pct(75.0, 0.0, 25.0);
    let ql_50 = pct(50.0, 0.0, 50.0);

    // Magmatic arc subdivisions on the F–L edge.
    let fl_50 = pct(0.0, 50.0, 50.0);
    let fl_25 = pct(0.0, 25.0, 75.0);

    FieldTable {
        name: "Dickinson (1983) QFL provenance".to_string(),
        fields: vec![
            field("Craton interior",         [250, 220, 160], &[q_apex, ci_qf, cb_ci, cb_q]),
            field("Transitional continental", [240, 180, 100], &[ci_qf, tc_qf, cb_bu, triple, cb_ci]),
            field("Basement uplift",         [215, 130,  60], &[tc_qf, f_apex, cb_fl, cb_bu]),
            field("Quartzose recycled",      [200, 225, 240], &[cb_q, ql_75, ro_1, triple, cb_ci]),
            field("Transitional recycled",   [140, 185, 225], &[ql_75, ql_50, ro_2, ro_1]),
            field("Lithic recycled",         [ 80, 135, 200], &[ql_50, l_apex, ro_fl, ro_2]),
            field("Dissected arc",           [200, 230, 170], &[triple, cb_bu, cb_fl, fl_50, ro_1]),
            field("Transitional arc",        [140, 200, 120], &[ro_1, fl_50, fl_25, ro_2]),
            field("Undissected arc",         [ 80, 160,  80], &[ro_2, fl_25, ro_fl]),
        ],
    }
}

#[rustfmt::skip]
fn pettijohn_1975() -> FieldTable {
    let q_apex = pct(100.0, 0.0, 0.0);
    let f_apex = pct(0.0, 100.0, 0.0);
    let l_apex = pct(0.0, 0.0, 100.0);

    // Q = 95 line.
    let q95_f = pct(95.0, 5.0, 0.0);
    let q95_mid = pct(95.0, 2.5, 2.5);
    let q95_l = pct(95.0, 0.0, 5.0);

    // Q = 75 line, cut by the F:L ratio lines.
    let q75_f = pct(75.0, 25.0, 0.0);
    let q75_3to1 = pct(75.0, 18.75, 6.25);
    let q75_mid = pct(75.0, 12.5, 12.5);
    let q75_1to3 = pct(75.0, 6.25, 18.75);
    let q75_l = pct(75.0, 0.0, 25.0);

    // Ratio lines on the F–L edge.
    let fl_3to1 = pct(0.0, 75.0, 25.0);
    let fl_mid = pct(0.0, 50.0, 50.0);
    let fl_1to3 = pct(0.0, 25.0, 75.0);

    FieldTable {
        name: "Pettijohn (1975) sandstone classification".to_string(),
        fields: vec![
            field("Quartz arenite",          [255, 250, 205], &[q_apex, q95_f, q95_mid, q95_l]),
            field("Subarkose",               [255, 218, 185], &[q95_f, q75_f, q75_3to1, q75_mid, q95_mid]),
            field("Sublitharenite",          [210, 230, 210], &[q95_mid, q75_mid, q75_1to3, q75_l, q95_l]),
            field("Arkose",                  [240, 160, 120], &[q75_f, f_apex, fl_3to1, q75_3to1]),
            field("Lithic arkose",           [220, 180, 150], &[q75_3to1, fl_3to1, fl_mid, q75_mid]),
            field("Feldspathic litharenite", [170, 200, 170], &[q75_mid, fl_mid, fl_1to3, q75_1to3]),
            field("Litharenite",             [120, 170, 140], &[q75_1to3, fl_1to3, l_apex, q75_l]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn builtin_vertices_sum_to_one() {
        for scheme in [FieldScheme::Dickinson1983, FieldScheme::Pettijohn1975] {
            for f in &scheme.table().fields {
                assert_eq!(f.polygon().len(), f.vertices.len());
                for v in &f.vertices {
                    assert_abs_diff_eq!(v.q + v.f + v.l, 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn builtin_table_is_shared() {
        let a = FieldScheme::Pettijohn1975.table() as *const FieldTable;
        let b = FieldScheme::Pettijohn1975.table() as *const FieldTable;
        assert_eq!(a, b);
        assert_eq!(FieldScheme::Dickinson1983.table().fields.len(), 9);
        assert_eq!(FieldScheme::Pettijohn1975.table().fields.len(), 7);
    }

    #[test]
    fn custom_table_accepts_percent_and_assigns_colours() {
        let json = r#"{
            "name": "two halves",
            "fields": [
                { "name": "quartz side", "color": [1, 2, 3], "vertices": [[100, 0, 0], [50, 50, 0], [50, 0, 50]] },
                { "name": "rest", "vertices": [[0.5, 0.5, 0], [0, 1, 0], [0, 0, 1], [0.5, 0, 0.5]] }
            ]
        }"#;
        let spec: FieldTableSpec = serde_json::from_str(json).unwrap();
        let table = FieldTable::from_spec(spec).unwrap();
        assert_eq!(table.fields.len(), 2);
        assert_eq!(table.fields[0].color, [1, 2, 3]);
        assert_eq!(table.fields[1].color, PALETTE[1]);
        assert_abs_diff_eq!(table.fields[0].vertices[1].f, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn invalid_custom_tables_are_rejected() {
        let spec = |fields: Vec<FieldSpec>| FieldTableSpec {
            name: "t".into(),
            fields,
        };
        let tri = || vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let named = |name: &str, vertices: Vec<[f64; 3]>| FieldSpec {
            name: name.into(),
            color: None,
            vertices,
        };

        assert!(matches!(FieldTable::from_spec(spec(vec![])), Err(FieldTableError::Empty(_))));
        assert!(matches!(
            FieldTable::from_spec(spec(vec![named("a", tri()), named("a", tri())])),
            Err(FieldTableError::DuplicateName(_))
        ));
        assert!(matches!(
            FieldTable::from_spec(spec(vec![named("Unclassified", tri())])),
            Err(FieldTableError::ReservedName(_))
        ));
        assert!(matches!(
            FieldTable::from_spec(spec(vec![named("a", vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])])),
            Err(FieldTableError::TooFewVertices { count: 2, .. })
        ));
        assert!(matches!(
            FieldTable::from_spec(spec(vec![named("a", vec![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]])])),
            Err(FieldTableError::InvalidVertex { index: 1, .. })
        ));
        assert!(matches!(
            FieldTable::from_spec(spec(vec![named("a", vec![[1.0, 0.0, 0.0], [2.0, -1.0, 0.0], [0.0, 0.0, 1.0]])])),
            Err(FieldTableError::InvalidVertex { index: 1, .. })
        ));
    }
}
