//! Metropolis and heat-bath acceptance for a picked candidate.
//!
//! A site with one legal orientation is accepted with probability
//! `min(1, rho * r)`, where `r` is the ratio of the post-move to pre-move
//! weight products over the four plaquette cells. A site with both
//! orientations samples among up, down and no move with probabilities
//! proportional to `r_up`, `r_down` and 1. The global normalizer `rho`
//! does not enter the heat-bath sum.
//!
//! Each decision consumes exactly one uniform draw.

use crate::candidates::FlippableEntry;
use crate::flip::{Direction, FlipRecord, propose};
use crate::lattice::Lattice;
use crate::rng::SimRng;
use crate::vertex::VertexType;
use crate::weights::Weights;
use serde::{Deserialize, Serialize};

/// `product(after) / product(before)`, clamped to a usable ratio.
///
/// Returns 0 whenever either product is not positive or the quotient is not
/// finite, so zero and negative weights can only suppress a move.
pub fn weight_ratio(weights: &Weights, before: &[VertexType; 4], after: &[VertexType; 4]) -> f64 {
    let pre = weights.product(before);
    if pre <= 0.0 {
        return 0.0;
    }
    let post = weights.product(after);
    if post <= 0.0 {
        return 0.0;
    }
    let ratio = post / pre;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// `min(1, rho * ratio)`, never outside `[0, 1]`.
pub fn metropolis_probability(rho: f64, ratio: f64) -> f64 {
    let p = rho * ratio;
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// Heat-bath probabilities at a site with both orientations available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatBath {
    pub p_up: f64,
    pub p_down: f64,
    pub p_none: f64,
}

impl HeatBath {
    pub fn new(ratio_up: f64, ratio_down: f64) -> Self {
        let up = sanitize(ratio_up);
        let down = sanitize(ratio_down);
        let total = 1.0 + up + down;
        Self {
            p_up: up / total,
            p_down: down / total,
            p_none: 1.0 / total,
        }
    }

    /// Map one uniform draw in `[0, 1)` to a choice.
    pub fn select(&self, u: f64) -> Option<Direction> {
        if u < self.p_up {
            Some(Direction::Up)
        } else if u < self.p_up + self.p_down {
            Some(Direction::Down)
        } else {
            None
        }
    }
}

fn sanitize(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 { ratio } else { 0.0 }
}

/// What kind of site was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteKind {
    Single(Direction),
    Biflip,
}

/// Outcome of one proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub site: SiteKind,
    pub accepted: Option<FlipRecord>,
}

/// The Metropolis probability of the move at `(row, col)`, or `None` if the
/// move is not legal there.
pub fn acceptance_probability(
    lattice: &Lattice,
    weights: &Weights,
    row: usize,
    col: usize,
    direction: Direction,
) -> Option<f64> {
    let record = propose(lattice, row, col, direction)?;
    let ratio = weight_ratio(weights, &record.before, &record.after);
    Some(metropolis_probability(weights.rho(), ratio))
}

/// Decide whether (and which) move to make at a picked candidate.
///
/// Does not write the lattice; the caller commits the returned record.
pub fn decide(entry: &FlippableEntry, lattice: &Lattice, weights: &Weights, rng: &mut SimRng) -> Decision {
    let proposal = |direction| {
        propose(lattice, entry.row, entry.col, direction).map(|record| {
            let ratio = weight_ratio(weights, &record.before, &record.after);
            (record, ratio)
        })
    };

    if entry.is_biflip() {
        let up = proposal(Direction::Up);
        let down = proposal(Direction::Down);
        let heat_bath = HeatBath::new(
            up.map_or(0.0, |(_, r)| r),
            down.map_or(0.0, |(_, r)| r),
        );
        let accepted = match heat_bath.select(rng.next_f64()) {
            Some(Direction::Up) => up.map(|(record, _)| record),
            Some(Direction::Down) => down.map(|(record, _)| record),
            None => None,
        };
        return Decision {
            site: SiteKind::Biflip,
            accepted,
        };
    }

    let direction = if entry.can_flip_up {
        Direction::Up
    } else {
        Direction::Down
    };
    let (record, p) = match proposal(direction) {
        Some((record, ratio)) => (Some(record), metropolis_probability(weights.rho(), ratio)),
        None => (None, 0.0),
    };
    let accepted = if rng.chance(p) { record } else { None };
    Decision {
        site: SiteKind::Single(direction),
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundary;
    use crate::test_utils::seeded_sim;
    use crate::weights::WeightTable;
    use crate::vertex::VertexType::*;

    fn weights(table: WeightTable) -> Weights {
        Weights::new(table).unwrap()
    }

    #[test]
    fn ratio_of_uniform_weights_is_one() {
        let w = weights(WeightTable::default());
        assert_eq!(weight_ratio(&w, &[A1, B2, A2, B1], &[C1, C2, C1, C2]), 1.0);
    }

    #[test]
    fn ratio_follows_products() {
        let w = weights(WeightTable::symmetric(1.0, 1.0, 2.0));
        // Up from [a1, b2, a2, b1] creates four c vertices.
        assert_eq!(weight_ratio(&w, &[A1, B2, A2, B1], &[C1, C2, C1, C2]), 16.0);
        assert_eq!(weight_ratio(&w, &[C1, C2, C1, C2], &[A1, B2, A2, B1]), 1.0 / 16.0);
    }

    #[test]
    fn zero_pre_product_rejects() {
        let mut table = WeightTable::default();
        table.a1 = 0.0;
        let w = weights(table);
        assert_eq!(weight_ratio(&w, &[A1, B2, A2, B1], &[C1, C2, C1, C2]), 0.0);
    }

    #[test]
    fn negative_weight_suppresses() {
        let mut table = WeightTable::default();
        table.c1 = -2.0;
        let w = weights(table);
        assert_eq!(weight_ratio(&w, &[A1, B2, A2, B1], &[C1, C2, C1, C2]), 0.0);
    }

    #[test]
    fn metropolis_is_clamped() {
        assert_eq!(metropolis_probability(1.0, 3.0), 1.0);
        assert_eq!(metropolis_probability(0.5, 1.0), 0.5);
        assert_eq!(metropolis_probability(0.0, 5.0), 0.0);
        assert_eq!(metropolis_probability(f64::INFINITY, 0.0), 0.0);
    }

    #[test]
    fn heat_bath_sums_to_one() {
        for (up, down) in [(1.0, 1.0), (0.0, 4.0), (16.0, 1.0 / 16.0), (0.0, 0.0), (1e9, 1e-9)] {
            let hb = HeatBath::new(up, down);
            let sum = hb.p_up + hb.p_down + hb.p_none;
            assert!((sum - 1.0).abs() < 1e-12, "{up} {down} -> {sum}");
            for p in [hb.p_up, hb.p_down, hb.p_none] {
                assert!((0.0..=1.0).contains(&p));
            }
        }
    }

    #[test]
    fn heat_bath_uniform_is_thirds() {
        let hb = HeatBath::new(1.0, 1.0);
        assert!((hb.p_up - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(hb.select(0.0), Some(Direction::Up));
        assert_eq!(hb.select(0.5), Some(Direction::Down));
        assert_eq!(hb.select(0.9), None);
    }

    #[test]
    fn uniform_weights_always_accept_single_site() {
        let lattice = Boundary::DwbcHigh.build(4).unwrap();
        let w = weights(WeightTable::default());
        let entry = FlippableEntry::evaluate(&lattice, 1, 0);
        let mut rng = SimRng::new(1);
        for _ in 0..50 {
            let decision = decide(&entry, &lattice, &w, &mut rng);
            assert_eq!(decision.site, SiteKind::Single(Direction::Up));
            assert!(decision.accepted.is_some());
        }
    }

    #[test]
    fn decide_consumes_exactly_one_draw() {
        let lattice = Boundary::DwbcHigh.build(4).unwrap();
        let w = weights(WeightTable::symmetric(1.0, 2.0, 0.5));
        let entry = FlippableEntry::evaluate(&lattice, 2, 1);
        let mut rng = SimRng::new(77);
        let mut reference = SimRng::new(77);
        decide(&entry, &lattice, &w, &mut rng);
        reference.next_u64();
        assert_eq!(rng, reference);
    }

    /// A lattice and one of its sites where both orientations are legal.
    fn biflip_site() -> (Lattice, FlippableEntry) {
        let mut sim = seeded_sim(8, 3);
        for _ in 0..20_000 {
            if let Some(entry) = sim.candidates().iter().find(|e| e.is_biflip()) {
                return (sim.lattice().clone(), *entry);
            }
            sim.step();
        }
        panic!("no site with both orientations reached");
    }

    #[test]
    fn biflip_site_uses_heat_bath() {
        let (lattice, entry) = biflip_site();
        let w = weights(WeightTable {
            a1: 1.0,
            a2: 1.5,
            b1: 2.0,
            b2: 0.7,
            c1: 1.2,
            c2: 0.9,
        });
        let up = propose(&lattice, entry.row, entry.col, Direction::Up).unwrap();
        let down = propose(&lattice, entry.row, entry.col, Direction::Down).unwrap();
        let expected = HeatBath::new(
            weight_ratio(&w, &up.before, &up.after),
            weight_ratio(&w, &down.before, &down.after),
        );

        let mut rng = SimRng::new(11);
        let mut reference = rng.clone();
        let decision = decide(&entry, &lattice, &w, &mut rng);
        reference.next_u64();
        assert_eq!(decision.site, SiteKind::Biflip);
        assert_eq!(rng, reference);

        let trials = 30_000;
        let (mut n_up, mut n_down, mut n_none) = (0u32, 0u32, 0u32);
        for _ in 0..trials {
            match decide(&entry, &lattice, &w, &mut rng).accepted {
                Some(record) if record.plaquette.direction == Direction::Up => {
                    assert_eq!(record, up);
                    n_up += 1;
                }
                Some(record) => {
                    assert_eq!(record, down);
                    n_down += 1;
                }
                None => n_none += 1,
            }
        }
        let freq = |n: u32| f64::from(n) / f64::from(trials);
        assert!((freq(n_up) - expected.p_up).abs() < 0.02, "up {n_up} vs {}", expected.p_up);
        assert!((freq(n_down) - expected.p_down).abs() < 0.02, "down {n_down} vs {}", expected.p_down);
        assert!((freq(n_none) - expected.p_none).abs() < 0.02, "none {n_none} vs {}", expected.p_none);
    }

    #[test]
    fn acceptance_probability_none_when_illegal() {
        let lattice = Boundary::DwbcHigh.build(4).unwrap();
        let w = weights(WeightTable::default());
        assert_eq!(acceptance_probability(&lattice, &w, 1, 1, Direction::Up), None);
        assert_eq!(acceptance_probability(&lattice, &w, 1, 0, Direction::Up), Some(1.0));
    }
}
