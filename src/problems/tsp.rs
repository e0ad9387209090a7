//! Travelling salesperson as a permutation-matrix encoding.

use serde::{Deserialize, Serialize};

use super::bit;
use crate::error::{Error, Result};
use crate::model::{EnergyModel, EnergyModelBuilder, Metrics, Problem};

/// Shortest closed tour through `N` cities.
///
/// Uses `N²` variables, `x[i·N + t] = 1` meaning city `i` is visited at step
/// `t`. The cost is
///
/// ```text
/// H = A·Σᵢ(Σₜ x_it - 1)² + A·Σₜ(Σᵢ x_it - 1)² + Σ_{i≠j} Σₜ d_ij·x_it·x_j(t+1)
/// ```
///
/// with steps taken modulo `N`. Directed distances are supported; both
/// directions between the same pair of variables add up on one coupling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tsp {
    pub distances: Vec<Vec<f64>>,
    pub penalty: f64,
}

impl Tsp {
    pub fn new(distances: Vec<Vec<f64>>, penalty: f64) -> Self {
        Self { distances, penalty }
    }

    pub fn cities(&self) -> usize {
        self.distances.len()
    }

    /// Variable index of city `i` at step `t`.
    pub fn index(&self, city: usize, step: usize) -> usize {
        city * self.cities() + step
    }

    /// City visited at each step, if `solution` is a permutation matrix.
    pub fn tour(&self, solution: &[u8]) -> Option<Vec<usize>> {
        let n = self.cities();
        let mut tour = Vec::with_capacity(n);
        for t in 0..n {
            let mut cities = (0..n).filter(|&i| bit(solution, self.index(i, t)));
            let city = cities.next()?;
            if cities.next().is_some() {
                return None;
            }
            tour.push(city);
        }
        let mut seen = vec![false; n];
        for &city in &tour {
            if std::mem::replace(&mut seen[city], true) {
                return None;
            }
        }
        Some(tour)
    }

    /// Closed length of `tour`.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        let n = tour.len();
        (0..n)
            .map(|t| self.distances[tour[t]][tour[(t + 1) % n]])
            .sum()
    }

    fn check_shape(&self) -> Result<()> {
        let n = self.cities();
        if let Some(row) = self.distances.iter().find(|row| row.len() != n) {
            return Err(Error::DimensionMismatch {
                what: "distance row",
                expected: n,
                found: row.len(),
            });
        }
        if !(self.penalty.is_finite() && self.penalty > 0.0) {
            return Err(Error::Configuration(format!(
                "tsp penalty must be positive, got {}",
                self.penalty
            )));
        }
        Ok(())
    }
}

impl Problem for Tsp {
    fn energy_model(&self) -> Result<EnergyModel> {
        self.check_shape()?;
        let n = self.cities();
        let a = self.penalty;
        let mut builder = EnergyModelBuilder::new(n * n);

        // A·(Σ x - 1)² over a group = A·Σ_{u<v} 2·x_u·x_v - A·Σ x_u + A.
        let mut one_hot = |group: &[usize]| -> Result<()> {
            for (k, &u) in group.iter().enumerate() {
                builder.add_linear_term(u, -a)?;
                for &v in &group[k + 1..] {
                    builder.add_quadratic_term(u, v, 2.0 * a)?;
                }
            }
            Ok(())
        };
        for i in 0..n {
            let row: Vec<usize> = (0..n).map(|t| self.index(i, t)).collect();
            one_hot(&row)?;
        }
        for t in 0..n {
            let column: Vec<usize> = (0..n).map(|i| self.index(i, t)).collect();
            one_hot(&column)?;
        }

        if n > 1 {
            for i in 0..n {
                for j in (0..n).filter(|&j| j != i) {
                    let d = self.distances[i][j];
                    for t in 0..n {
                        builder.add_quadratic_term(self.index(i, t), self.index(j, (t + 1) % n), d)?;
                    }
                }
            }
        }
        builder.build()
    }

    fn evaluate(&self, solution: &[u8]) -> Metrics {
        let mut metrics = Metrics::new();
        match self.tour(solution) {
            Some(tour) => {
                metrics.insert("valid".into(), true.into());
                metrics.insert("tour_length".into(), self.tour_length(&tour).into());
            }
            None => {
                metrics.insert("valid".into(), false.into());
            }
        }
        metrics
    }
}
