//! Component aggregator: raw subcomponents → Q, F, L endmembers.

use serde::{Deserialize, Serialize};

use crate::schema::{Composition, MineralComposition};

/// Endmember sums. Non-negative; not necessarily summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Qfl {
    /// Total quartz (Qm + Qp).
    pub q: f64,
    /// Total feldspar (K + P).
    pub f: f64,
    /// Total lithic fragments (Lm + Ls + Lv).
    pub l: f64,
}

impl Qfl {
    pub fn new(q: f64, f: f64, l: f64) -> Self {
        Self { q, f, l }
    }

    pub fn total(&self) -> f64 {
        self.q + self.f + self.l
    }
}

pub fn aggregate_minerals(m: &MineralComposition) -> Qfl {
    Qfl {
        q: m.qm + m.qp,
        f: m.k + m.p,
        l: m.lm + m.ls + m.lv,
    }
}

/// Endmembers for either schema; direct Q/F/L pass through unchanged.
pub fn aggregate(composition: &Composition) -> Qfl {
    match composition {
        Composition::Mineral(m) => aggregate_minerals(m),
        Composition::Direct(qfl) => *qfl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sums_subcomponents() {
        let m = MineralComposition {
            qm: 48.4,
            qp: 7.8,
            k: 7.8,
            p: 5.4,
            lm: 7.6,
            ls: 8.0,
            lv: 0.0,
        };
        let qfl = aggregate_minerals(&m);
        assert_abs_diff_eq!(qfl.q, 56.2, epsilon = 1e-12);
        assert_abs_diff_eq!(qfl.f, 13.2, epsilon = 1e-12);
        assert_abs_diff_eq!(qfl.l, 15.6, epsilon = 1e-12);
        assert_eq!(qfl.q, m.qm + m.qp);
    }

    #[test]
    fn direct_passes_through() {
        let qfl = Qfl::new(20.0, 50.0, 30.0);
        assert_eq!(aggregate(&Composition::Direct(qfl)), qfl);
    }

    #[test]
    fn all_zero_minerals_give_zero_triple() {
        let qfl = aggregate(&Composition::Mineral(MineralComposition::default()));
        assert_eq!(qfl, Qfl::default());
        assert_eq!(qfl.total(), 0.0);
    }
}
