//! Problem encoder contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::EnergyModel;
use crate::error::Result;

/// A named metric reported by [`Problem::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Flag(bool),
    Number(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            MetricValue::Number(v) => Some(v),
            MetricValue::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            MetricValue::Flag(b) => Some(b),
            MetricValue::Number(_) => None,
        }
    }
}

impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        MetricValue::Flag(b)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Number(v as f64)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Flag(b) => write!(f, "{b}"),
            MetricValue::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Metric name to value, ordered by name.
pub type Metrics = BTreeMap<String, MetricValue>;

/// A combinatorial problem that can be annealed.
///
/// Encoders are pure, stateless transforms: [`energy_model`](Problem::energy_model)
/// expresses the objective and all constraints (as quadratic penalties) in
/// a single [`EnergyModel`], and [`evaluate`](Problem::evaluate) scores a
/// decoded 0/1 assignment in problem terms.
///
/// # Examples
///
/// ```
/// use vpu_anneal::model::{EnergyModel, EnergyModelBuilder, Metrics, Problem};
///
/// struct PickOne;
///
/// impl Problem for PickOne {
///     fn energy_model(&self) -> vpu_anneal::Result<EnergyModel> {
///         // H = (x0 + x1 - 1)² = 2·x0·x1 - x0 - x1 + 1
///         let mut b = EnergyModelBuilder::new(2);
///         b.add_quadratic_term(0, 1, 2.0)?;
///         b.add_linear_term(0, -1.0)?;
///         b.add_linear_term(1, -1.0)?;
///         b.build()
///     }
///
///     fn evaluate(&self, solution: &[u8]) -> Metrics {
///         let mut m = Metrics::new();
///         m.insert("valid".into(), (solution.iter().map(|&b| b as u32).sum::<u32>() == 1).into());
///         m
///     }
/// }
///
/// let model = PickOne.energy_model().unwrap();
/// assert!(model.energy(&[1.0, 0.0]) < model.energy(&[1.0, 1.0]));
/// ```
pub trait Problem {
    /// Encodes the problem as a quadratic energy model.
    fn energy_model(&self) -> Result<EnergyModel>;

    /// Scores a discrete solution. The default reports nothing.
    fn evaluate(&self, solution: &[u8]) -> Metrics {
        let _ = solution;
        Metrics::new()
    }
}

/// A bare energy model is a problem with no domain metrics.
impl Problem for EnergyModel {
    fn energy_model(&self) -> Result<EnergyModel> {
        Ok(self.clone())
    }
}
