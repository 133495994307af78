//! Ternary normalization and projection.
//!
//! Axis convention, used by both the classifier and the renderer:
//!
//!   Q apex        (1/2, √3/2)
//!   F lower-left  (0, 0)
//!   L lower-right (1, 0)
//!
//!   x = l + q/2
//!   y = (√3/2) · q
//!
//! `project` is the only barycentric → Cartesian mapping in the crate.

pub mod classify;
pub mod fields;

use serde::{Deserialize, Serialize};

use crate::aggregate::Qfl;

pub const SQRT3_2: f64 = 0.866_025_403_784_438_6;

/// A point on the unit simplex: q + f + l = 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ternary {
    pub q: f64,
    pub f: f64,
    pub l: f64,
}

impl Ternary {
    /// Normalize any non-negative triple. `None` when the sum is zero.
    pub fn normalize(q: f64, f: f64, l: f64) -> Option<Self> {
        // Pre-scale by the largest component so the sum cannot overflow.
        let scale = q.max(f).max(l);
        if !(scale > 0.0 && scale.is_finite()) {
            return None;
        }
        let (q, f, l) = (q / scale, f / scale, l / scale);
        let total = q + f + l;
        Some(Self {
            q: q / total,
            f: f / total,
            l: l / total,
        })
    }

    pub fn from_qfl(qfl: &Qfl) -> Option<Self> {
        Self::normalize(qfl.q, qfl.f, qfl.l)
    }

    /// Percentages (Q%, F%, L%).
    pub fn percent(&self) -> [f64; 3] {
        [self.q * 100.0, self.f * 100.0, self.l * 100.0]
    }
}

/// Cartesian point in diagram space (triangle side = 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub fn project(t: &Ternary) -> Point2 {
    Point2 {
        x: t.l + 0.5 * t.q,
        y: SQRT3_2 * t.q,
    }
}

/// Triangle corners in (F, L, Q) order.
pub fn corners() -> [Point2; 3] {
    [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.5, SQRT3_2)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn vertices_project_to_corners() {
        let [f, l, q] = corners();
        assert_eq!(project(&Ternary { q: 0.0, f: 1.0, l: 0.0 }), f);
        assert_eq!(project(&Ternary { q: 0.0, f: 0.0, l: 1.0 }), l);
        assert_eq!(project(&Ternary { q: 1.0, f: 0.0, l: 0.0 }), q);
    }

    #[test]
    fn centroid_projects_to_triangle_centroid() {
        let p = project(&Ternary::normalize(1.0, 1.0, 1.0).unwrap());
        assert_abs_diff_eq!(p.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, SQRT3_2 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn normalization_is_idempotent() {
        for (q, f, l) in [(56.2, 13.2, 15.6), (20.0, 50.0, 30.0), (0.0, 0.0, 7.0), (1e-9, 3.0, 2.0)] {
            let once = Ternary::normalize(q, f, l).unwrap();
            let twice = Ternary::normalize(once.q, once.f, once.l).unwrap();
            assert_abs_diff_eq!(once.q + once.f + once.l, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(twice.q, once.q, epsilon = 1e-12);
            assert_abs_diff_eq!(twice.f, once.f, epsilon = 1e-12);
            assert_abs_diff_eq!(twice.l, once.l, epsilon = 1e-12);
        }
    }

    #[test]
    fn huge_components_still_normalize() {
        let t = Ternary::normalize(1e308, 1e308, 1e308).unwrap();
        assert_abs_diff_eq!(t.q, 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t.l, 1.0 / 3.0, epsilon = 1e-12);
        let t = Ternary::normalize(f64::MAX, 0.0, f64::MAX).unwrap();
        assert_abs_diff_eq!(t.q, 0.5, epsilon = 1e-12);
        assert_eq!(t.f, 0.0);
    }

    #[test]
    fn zero_sum_has_no_position() {
        assert!(Ternary::normalize(0.0, 0.0, 0.0).is_none());
        assert!(Ternary::from_qfl(&Qfl::default()).is_none());
    }
}
