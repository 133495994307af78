//! Point-in-field classification.
//!
//! Crossing-number test in projected Cartesian space. A point within
//! `tolerance` of any edge of a field counts as inside it; fields are tried
//! in table order, so a point on a shared edge belongs to the earlier field.

use std::fmt;

use serde::{Serialize, Serializer};

use super::fields::{FieldTable, ProvenanceField};
use super::Point2;

pub const DEFAULT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    Field(String),
    /// Positioned, but outside every field of the table.
    Unclassified,
    /// Degenerate sample (Q + F + L = 0): no position at all.
    Undefined,
}

impl Classification {
    pub fn as_str(&self) -> &str {
        match self {
            Classification::Field(name) => name,
            Classification::Unclassified => "unclassified",
            Classification::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// First field (in table order) containing `p`.
pub fn locate<'t>(p: Point2, table: &'t FieldTable, tolerance: f64) -> Option<&'t ProvenanceField> {
    table
        .fields
        .iter()
        .find(|field| contains(field.polygon(), p, tolerance))
}

pub fn classify_point(p: Point2, table: &FieldTable, tolerance: f64) -> Classification {
    match locate(p, table, tolerance) {
        Some(field) => Classification::Field(field.name.clone()),
        None => Classification::Unclassified,
    }
}

/// Inside or on the boundary (within `tolerance`).
pub fn contains(polygon: &[Point2], p: Point2, tolerance: f64) -> bool {
    on_boundary(polygon, p, tolerance) || crossing_number(polygon, p)
}

fn edges(polygon: &[Point2]) -> impl Iterator<Item = (Point2, Point2)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

fn on_boundary(polygon: &[Point2], p: Point2, tolerance: f64) -> bool {
    edges(polygon).any(|(a, b)| distance_to_segment(p, a, b) <= tolerance)
}

/// Odd number of edge crossings along a ray towards +x.
fn crossing_number(polygon: &[Point2], p: Point2) -> bool {
    let mut inside = false;
    for (a, b) in edges(polygon) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p.x - (a.x + t * dx)).hypot(p.y - (a.y + t * dy))
}
