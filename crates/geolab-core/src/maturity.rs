//! Maturity Index of Arenites.
//!
//!   MIA = 100 · Q / (Q + F)      when Q + F > 0
//!   MIA = 0                      otherwise
//!
//! Q / (Q + F) is the single formula used everywhere. When F was aggregated
//! as K + P it is the same quantity as Q / (Q + K + P).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::Qfl;

pub fn maturity_index(qfl: &Qfl) -> f64 {
    // Scaled by the larger term so Q + F cannot overflow.
    let scale = qfl.q.max(qfl.f);
    if !(scale > 0.0 && scale.is_finite()) {
        return 0.0;
    }
    let (q, f) = (qfl.q / scale, qfl.f / scale);
    (100.0 * (q / (q + f))).clamp(0.0, 100.0)
}

/// Closed, ordered MIA bands. Each band includes its upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MiaCategory {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl MiaCategory {
    pub fn from_mia(mia: f64) -> Self {
        if mia > 75.0 {
            MiaCategory::High
        } else if mia > 50.0 {
            MiaCategory::Moderate
        } else if mia > 25.0 {
            MiaCategory::Low
        } else {
            MiaCategory::VeryLow
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MiaCategory::High => "High",
            MiaCategory::Moderate => "Moderate",
            MiaCategory::Low => "Low",
            MiaCategory::VeryLow => "Very Low",
        }
    }

    /// Source-area reading of the band.
    pub fn interpretation(self) -> &'static str {
        match self {
            MiaCategory::High => {
                "intense chemical weathering of a tectonically stable source under a humid climate"
            }
            MiaCategory::Moderate => "recycled sources in a semi-humid setting",
            MiaCategory::Low => "active tectonics in a transitional or semi-arid setting",
            MiaCategory::VeryLow => "immature sediment from an arid or high-relief source",
        }
    }

    /// Bar colour for charts.
    #[rustfmt::skip]
    pub fn color(self) -> [u8; 3] {
        match self {
            MiaCategory::VeryLow  => [0xff, 0x66, 0x66],
            MiaCategory::Low      => [0xff, 0xcc, 0x66],
            MiaCategory::Moderate => [0x66, 0xcc, 0xff],
            MiaCategory::High     => [0x66, 0xff, 0x66],
        }
    }
}

impl fmt::Display for MiaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn worked_examples() {
        let mia = maturity_index(&Qfl::new(56.2, 13.2, 15.6));
        assert_abs_diff_eq!(mia, 80.98, epsilon = 0.01);
        assert_eq!(MiaCategory::from_mia(mia), MiaCategory::High);

        let mia = maturity_index(&Qfl::new(20.0, 50.0, 30.0));
        assert_abs_diff_eq!(mia, 28.57, epsilon = 0.01);
        assert_eq!(MiaCategory::from_mia(mia), MiaCategory::Low);
    }

    #[test]
    fn zero_quartz_plus_feldspar_is_zero() {
        assert_eq!(maturity_index(&Qfl::new(0.0, 0.0, 40.0)), 0.0);
        assert_eq!(maturity_index(&Qfl::default()), 0.0);
    }

    #[test]
    fn mia_stays_in_range() {
        for (q, f) in [
            (0.0, 1.0),
            (1.0, 0.0),
            (1e-300, 1e300),
            (3.0, 7.0),
            (1e300, 1e-300),
            (f64::MAX, f64::MAX),
            (1e308, 1e307),
        ] {
            let mia = maturity_index(&Qfl::new(q, f, 0.0));
            assert!((0.0..=100.0).contains(&mia), "q={q} f={f} gave {mia}");
        }
        assert_abs_diff_eq!(maturity_index(&Qfl::new(1e308, 1e308, 1e308)), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn band_edges_belong_to_lower_band() {
        assert_eq!(MiaCategory::from_mia(75.0), MiaCategory::Moderate);
        assert_eq!(MiaCategory::from_mia(75.000001), MiaCategory::High);
        assert_eq!(MiaCategory::from_mia(50.0), MiaCategory::Low);
        assert_eq!(MiaCategory::from_mia(25.0), MiaCategory::VeryLow);
        assert_eq!(MiaCategory::from_mia(0.0), MiaCategory::VeryLow);
        assert_eq!(MiaCategory::from_mia(100.0), MiaCategory::High);
    }

    #[test]
    fn feldspar_split_formula_agrees() {
        // Q / (Q + K + P) with F = K + P
        let (q, k, p) = (48.4 + 7.8, 7.8, 5.4);
        let split = 100.0 * q / (q + k + p);
        assert_abs_diff_eq!(maturity_index(&Qfl::new(q, k + p, 15.6)), split, epsilon = 1e-12);
    }
}
