//! Decoding readouts into discrete solutions.

use serde::{Deserialize, Serialize};

use crate::engine::{Readout, Spike};
use crate::error::{Error, Result};
use crate::model::{EnergyModel, Metrics, Problem};

/// Decoded outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Discrete 0/1 assignment, one entry per unit.
    pub solution: Vec<u8>,
    /// Final raw activations.
    pub raw_state: Vec<f64>,
    /// Final activations normalized into `[0, 1]`.
    pub normalized_state: Vec<f64>,
    /// Energy at each control interval, when tracing was enabled.
    pub energy_trace: Option<Vec<f64>>,
    /// Feedback current vectors at each control interval, when tracing was enabled.
    pub current_trace: Option<Vec<Vec<f64>>>,
    /// Spike events, when tracing was enabled.
    pub spikes: Option<Vec<Spike>>,
    /// Problem-specific metrics.
    pub metrics: Metrics,
    /// Energy of `solution` under the model, if one was supplied.
    pub energy: Option<f64>,
    /// Number of control intervals where the feedback was scaled to the ceiling.
    pub saturation_events: usize,
    /// Integration steps executed.
    pub steps: u64,
}

impl SimulationResult {
    /// Fills in [`energy`](Self::energy) from `model`.
    pub fn with_energy(mut self, model: &EnergyModel) -> Result<Self> {
        if model.n() != self.solution.len() {
            return Err(Error::DimensionMismatch {
                what: "solution",
                expected: model.n(),
                found: self.solution.len(),
            });
        }
        self.energy = Some(model.energy_of_solution(&self.solution));
        Ok(self)
    }

    /// Number of units decoded as 1.
    pub fn ones(&self) -> usize {
        self.solution.iter().filter(|&&b| b == 1).count()
    }
}

/// Thresholds normalized unit states into a 0/1 solution.
///
/// A unit decodes to 1 when its normalized state is `>= cutoff`.
/// Decoding is pure: it never touches the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultDecoder {
    cutoff: f64,
}

impl Default for ResultDecoder {
    fn default() -> Self {
        Self { cutoff: 0.5 }
    }
}

impl ResultDecoder {
    pub fn new(cutoff: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&cutoff) {
            return Err(Error::Configuration(format!(
                "decoder cutoff must lie in [0, 1], got {cutoff}"
            )));
        }
        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn threshold(&self, normalized: &[f64]) -> Vec<u8> {
        normalized
            .iter()
            .map(|&s| u8::from(s >= self.cutoff))
            .collect()
    }

    /// Decodes without problem-specific scoring.
    pub fn decode(&self, readout: &Readout) -> SimulationResult {
        let (energy_trace, current_trace, spikes) = match &readout.trace {
            Some(t) => (
                Some(t.energy.clone()),
                Some(t.currents.clone()),
                Some(t.spikes.clone()),
            ),
            None => (None, None, None),
        };
        SimulationResult {
            solution: self.threshold(&readout.normalized),
            raw_state: readout.activations.clone(),
            normalized_state: readout.normalized.clone(),
            energy_trace,
            current_trace,
            spikes,
            metrics: Metrics::new(),
            energy: None,
            saturation_events: readout.saturation.len(),
            steps: readout.steps,
        }
    }

    /// Decodes and lets `problem` score the discrete solution.
    pub fn decode_with<P: Problem + ?Sized>(&self, readout: &Readout, problem: &P) -> SimulationResult {
        let mut result = self.decode(readout);
        result.metrics = problem.evaluate(&result.solution);
        result
    }
}
