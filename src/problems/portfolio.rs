//! Mean-variance asset selection.

use serde::{Deserialize, Serialize};

use super::bit;
use crate::error::{Error, Result};
use crate::model::{EnergyModel, EnergyModelBuilder, Metrics, Problem};

/// Choose a subset of assets trading expected return against risk:
///
/// ```text
/// H(x) = q·xᵀΣx - μᵀx
/// ```
///
/// Off-diagonal covariance becomes `J_ij = -q·(Σ_ij + Σ_ji)`; the diagonal
/// folds into the bias (`xᵢ² = xᵢ`), giving `hᵢ = μᵢ - q·Σ_ii`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub returns: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub risk_aversion: f64,
}

impl Portfolio {
    pub fn new(returns: Vec<f64>, covariance: Vec<Vec<f64>>, risk_aversion: f64) -> Self {
        Self {
            returns,
            covariance,
            risk_aversion,
        }
    }

    pub fn expected_return(&self, solution: &[u8]) -> f64 {
        self.returns
            .iter()
            .enumerate()
            .filter(|&(i, _)| bit(solution, i))
            .map(|(_, mu)| mu)
            .sum()
    }

    /// Portfolio variance `xᵀΣx`.
    pub fn risk(&self, solution: &[u8]) -> f64 {
        let mut risk = 0.0;
        for (i, row) in self.covariance.iter().enumerate() {
            if !bit(solution, i) {
                continue;
            }
            risk += row
                .iter()
                .enumerate()
                .filter(|&(j, _)| bit(solution, j))
                .map(|(_, s)| s)
                .sum::<f64>();
        }
        risk
    }

    fn check_shape(&self) -> Result<()> {
        let n = self.returns.len();
        if self.covariance.len() != n {
            return Err(Error::DimensionMismatch {
                what: "covariance",
                expected: n,
                found: self.covariance.len(),
            });
        }
        if let Some(row) = self.covariance.iter().find(|row| row.len() != n) {
            return Err(Error::DimensionMismatch {
                what: "covariance row",
                expected: n,
                found: row.len(),
            });
        }
        Ok(())
    }
}

impl Problem for Portfolio {
    fn energy_model(&self) -> Result<EnergyModel> {
        self.check_shape()?;
        let q = self.risk_aversion;
        let mut builder = EnergyModelBuilder::new(self.returns.len());
        for (i, &mu) in self.returns.iter().enumerate() {
            builder.add_linear_term(i, q * self.covariance[i][i] - mu)?;
            for j in (i + 1)..self.returns.len() {
                let sigma = self.covariance[i][j] + self.covariance[j][i];
                builder.add_quadratic_term(i, j, q * sigma)?;
            }
        }
        builder.build()
    }

    fn evaluate(&self, solution: &[u8]) -> Metrics {
        let selected = (0..self.returns.len())
            .filter(|&i| bit(solution, i))
            .count();
        let mut metrics = Metrics::new();
        metrics.insert("expected_return".into(), self.expected_return(solution).into());
        metrics.insert("risk".into(), self.risk(solution).into());
        metrics.insert("selected".into(), selected.into());
        metrics
    }
}
