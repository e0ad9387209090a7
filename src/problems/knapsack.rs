//! 0/1 knapsack with a squared capacity penalty.

use serde::{Deserialize, Serialize};

use super::bit;
use crate::error::{Error, Result};
use crate::model::{EnergyModel, EnergyModelBuilder, Metrics, Problem};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub value: f64,
    pub weight: f64,
}

/// Select items maximizing total value subject to a weight capacity.
///
/// Encoded as the cost
///
/// ```text
/// H(x) = -Σ vᵢxᵢ + P·(Σ wᵢxᵢ - C)²
/// ```
///
/// which gives `hᵢ = vᵢ - P·wᵢ² + 2PC·wᵢ` and `J_ij = -2P·wᵢ·wⱼ`. The
/// penalty pulls the load toward `C` from both sides; overweight selections
/// are scored as invalid rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knapsack {
    pub items: Vec<Item>,
    pub capacity: f64,
    pub penalty: f64,
}

impl Knapsack {
    /// Creates a knapsack from `(value, weight)` pairs.
    pub fn new(items: &[(f64, f64)], capacity: f64, penalty: f64) -> Self {
        Self {
            items: items
                .iter()
                .map(|&(value, weight)| Item { value, weight })
                .collect(),
            capacity,
            penalty,
        }
    }

    /// `(total value, total weight)` of the selected items.
    pub fn totals(&self, solution: &[u8]) -> (f64, f64) {
        self.items
            .iter()
            .enumerate()
            .filter(|&(i, _)| bit(solution, i))
            .fold((0.0, 0.0), |(v, w), (_, item)| (v + item.value, w + item.weight))
    }
}

impl Problem for Knapsack {
    fn energy_model(&self) -> Result<EnergyModel> {
        if !(self.penalty.is_finite() && self.penalty >= 0.0) {
            return Err(Error::Configuration(format!(
                "knapsack penalty must be non-negative, got {}",
                self.penalty
            )));
        }
        if !self.capacity.is_finite() {
            return Err(Error::Configuration("knapsack capacity must be finite".into()));
        }
        let (p, c) = (self.penalty, self.capacity);
        let mut builder = EnergyModelBuilder::new(self.items.len());
        for (i, a) in self.items.iter().enumerate() {
            builder.add_linear_term(i, -a.value + p * (a.weight * a.weight - 2.0 * c * a.weight))?;
            for (j, b) in self.items.iter().enumerate().skip(i + 1) {
                builder.add_quadratic_term(i, j, 2.0 * p * a.weight * b.weight)?;
            }
        }
        builder.build()
    }

    fn evaluate(&self, solution: &[u8]) -> Metrics {
        let (value, weight) = self.totals(solution);
        let mut metrics = Metrics::new();
        metrics.insert("valid".into(), (weight <= self.capacity).into());
        metrics.insert("total_value".into(), value.into());
        metrics.insert("total_weight".into(), weight.into());
        metrics.insert("capacity".into(), self.capacity.into());
        metrics
    }
}
