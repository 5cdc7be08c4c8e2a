//! Boltzmann weights per vertex type.

use crate::config::ConfigError;
use crate::vertex::VertexType;
use serde::{Deserialize, Serialize};

/// Largest usable weight magnitude. Four-vertex products stay below
/// `1e152`, so every ratio of two products is finite.
pub const MAX_WEIGHT: f64 = 1e38;

/// Smallest usable non-zero weight magnitude. Use 0 to forbid a type.
pub const MIN_WEIGHT: f64 = 1e-38;

/// One weight per vertex type.
///
/// Zero forbids a type. Negative values are accepted and behave like zero
/// in every acceptance probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub a1: f64,
    pub a2: f64,
    pub b1: f64,
    pub b2: f64,
    pub c1: f64,
    pub c2: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl WeightTable {
    pub fn uniform(w: f64) -> Self {
        Self {
            a1: w,
            a2: w,
            b1: w,
            b2: w,
            c1: w,
            c2: w,
        }
    }

    /// Symmetric weights `a` for a1/a2, `b` for b1/b2, `c` for c1/c2.
    pub fn symmetric(a: f64, b: f64, c: f64) -> Self {
        Self {
            a1: a,
            a2: a,
            b1: b,
            b2: b,
            c1: c,
            c2: c,
        }
    }

    pub fn get(&self, vertex: VertexType) -> f64 {
        match vertex {
            VertexType::A1 => self.a1,
            VertexType::A2 => self.a2,
            VertexType::B1 => self.b1,
            VertexType::B2 => self.b2,
            VertexType::C1 => self.c1,
            VertexType::C2 => self.c2,
        }
    }

    pub fn set(&mut self, vertex: VertexType, weight: f64) {
        match vertex {
            VertexType::A1 => self.a1 = weight,
            VertexType::A2 => self.a2 = weight,
            VertexType::B1 => self.b1 = weight,
            VertexType::B2 => self.b2 = weight,
            VertexType::C1 => self.c1 = weight,
            VertexType::C2 => self.c2 = weight,
        }
    }

    /// Weights in `VertexType::index` order.
    pub fn as_array(&self) -> [f64; 6] {
        VertexType::ALL.map(|v| self.get(v))
    }

    /// Every weight must be finite, and non-zero weights must have a
    /// magnitude in `[MIN_WEIGHT, MAX_WEIGHT]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for vertex in VertexType::ALL {
            let value = self.get(vertex);
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { vertex, value });
            }
            let magnitude = value.abs();
            if magnitude != 0.0 && !(MIN_WEIGHT..=MAX_WEIGHT).contains(&magnitude) {
                return Err(ConfigError::WeightOutOfRange { vertex, value });
            }
        }
        Ok(())
    }

    pub fn has_negative(&self) -> bool {
        self.as_array().iter().any(|&w| w < 0.0)
    }
}

/// A validated weight table plus its cached normalizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    table: WeightTable,
    values: [f64; 6],
    rho: f64,
}

impl Weights {
    pub fn new(table: WeightTable) -> Result<Self, ConfigError> {
        table.validate()?;
        let values = table.as_array();
        Ok(Self {
            table,
            values,
            rho: normalizer(&values),
        })
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    #[inline]
    pub fn get(&self, vertex: VertexType) -> f64 {
        self.values[vertex.index()]
    }

    /// `1 / max` over every ordered 4-vertex product, or 0 when no product is
    /// positive.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Product of the weights of four vertices.
    #[inline]
    pub fn product(&self, vertices: &[VertexType; 4]) -> f64 {
        vertices.iter().map(|&v| self.get(v)).product()
    }
}

/// Maximum over all 6^4 ordered products, inverted.
fn normalizer(values: &[f64; 6]) -> f64 {
    let mut max = f64::NEG_INFINITY;
    for &a in values {
        for &b in values {
            for &c in values {
                for &d in values {
                    max = max.max(a * b * c * d);
                }
            }
        }
    }
    if max > 0.0 && max.is_finite() { 1.0 / max } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_one_has_unit_rho() {
        let w = Weights::new(WeightTable::default()).unwrap();
        assert_eq!(w.rho(), 1.0);
    }

    #[test]
    fn rho_uses_largest_product() {
        let w = Weights::new(WeightTable::symmetric(1.0, 0.5, 2.0)).unwrap();
        assert!((w.rho() - 1.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn rho_accounts_for_negative_pairs() {
        // (-3)^4 = 81 beats 1.
        let mut table = WeightTable::default();
        table.b1 = -3.0;
        let w = Weights::new(table).unwrap();
        assert!((w.rho() - 1.0 / 81.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_weights_give_zero_rho() {
        let w = Weights::new(WeightTable::uniform(0.0)).unwrap();
        assert_eq!(w.rho(), 0.0);
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let mut table = WeightTable::default();
        table.c2 = f64::NAN;
        assert!(matches!(
            Weights::new(table),
            Err(ConfigError::NonFiniteWeight {
                vertex: VertexType::C2,
                ..
            })
        ));
        table.c2 = f64::INFINITY;
        assert!(Weights::new(table).is_err());
    }

    #[test]
    fn extreme_magnitudes_are_rejected() {
        for value in [1e100, -1e100, 1e-100] {
            let mut table = WeightTable::default();
            table.b2 = value;
            assert!(matches!(
                Weights::new(table),
                Err(ConfigError::WeightOutOfRange {
                    vertex: VertexType::B2,
                    ..
                })
            ));
        }
    }

    #[test]
    fn range_limits_keep_products_usable() {
        use VertexType::*;
        let mut table = WeightTable::uniform(MIN_WEIGHT);
        table.c1 = MAX_WEIGHT;
        table.c2 = MAX_WEIGHT;
        let w = Weights::new(table).unwrap();
        assert!(w.rho() > 0.0 && w.rho().is_finite());
        let pre = w.product(&[A1, B2, A2, B1]);
        let post = w.product(&[C1, C2, C1, C2]);
        assert!(pre > 0.0 && post.is_finite());
        assert!((post / pre).is_finite());
    }

    #[test]
    fn get_and_set_cover_every_type() {
        let mut table = WeightTable::default();
        for (i, v) in VertexType::ALL.iter().enumerate() {
            table.set(*v, i as f64 + 0.5);
        }
        for (i, v) in VertexType::ALL.iter().enumerate() {
            assert_eq!(table.get(*v), i as f64 + 0.5);
        }
        assert_eq!(table.as_array(), [0.5, 1.5, 2.5, 3.5, 4.5, 5.5]);
    }

    #[test]
    fn product_multiplies_four_weights() {
        use VertexType::*;
        let w = Weights::new(WeightTable::symmetric(2.0, 3.0, 5.0)).unwrap();
        assert_eq!(w.product(&[A1, B2, C1, C2]), 2.0 * 3.0 * 5.0 * 5.0);
    }
}
