//! Weighted maximum cut.

use serde::{Deserialize, Serialize};

use super::bit;
use crate::error::Result;
use crate::model::{EnergyModel, EnergyModelBuilder, Metrics, Problem};

/// Partition the vertices of a weighted graph to maximize the weight of
/// edges crossing the partition.
///
/// Each edge becomes an inhibitory coupling `J_ij = -w_ij` with no bias, so
/// neighbors are pushed into opposite states. Parallel edges accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxCut {
    pub n: usize,
    /// `(u, v, weight)` with `u != v`.
    pub edges: Vec<(usize, usize, f64)>,
}

impl MaxCut {
    pub fn new(n: usize, edges: Vec<(usize, usize, f64)>) -> Self {
        Self { n, edges }
    }

    /// Total weight of edges whose endpoints fall on different sides.
    pub fn cut_value(&self, solution: &[u8]) -> f64 {
        self.cut_edges_iter(solution).map(|&(_, _, w)| w).sum()
    }

    fn cut_edges_iter<'a>(
        &'a self,
        solution: &'a [u8],
    ) -> impl Iterator<Item = &'a (usize, usize, f64)> + 'a {
        self.edges
            .iter()
            .filter(move |&&(u, v, _)| bit(solution, u) != bit(solution, v))
    }
}

impl Problem for MaxCut {
    fn energy_model(&self) -> Result<EnergyModel> {
        let mut builder = EnergyModelBuilder::new(self.n);
        for &(u, v, w) in &self.edges {
            builder.add_coupling(u, v, -w)?;
        }
        builder.build()
    }

    fn evaluate(&self, solution: &[u8]) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert("cut_value".into(), self.cut_value(solution).into());
        metrics.insert(
            "cut_edges".into(),
            self.cut_edges_iter(solution).count().into(),
        );
        metrics
    }
}
