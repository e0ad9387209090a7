//! Engine phases, per-run state, and readout records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of an [`ExecutionEngine`](super::ExecutionEngine).
///
/// ```text
/// UNALLOCATED → ALLOCATED → RUNNING → READY → RUNNING → … → READOUT
/// ```
///
/// `ALLOCATE` is accepted in every phase and discards prior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Unallocated,
    Allocated,
    Ready,
    Running,
    Readout,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Unallocated => "UNALLOCATED",
            Phase::Allocated => "ALLOCATED",
            Phase::Ready => "READY",
            Phase::Running => "RUNNING",
            Phase::Readout => "READOUT",
        })
    }
}

/// A threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub unit: usize,
    /// Simulated time of the crossing (s).
    pub time: f64,
}

/// Recorded when the feedback current had to be scaled to the ceiling.
///
/// Non-fatal: scaling is the mitigation, execution continues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationWarning {
    /// Integration step at which the feedback was recomputed.
    pub step: u64,
    pub time: f64,
    /// Peak raw current magnitude (A).
    pub peak: f64,
    /// Scale applied, `ceiling / peak`.
    pub scale: f64,
}

/// Per-control-interval history, recorded when tracing is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Model energy of the normalized state at each control interval.
    pub energy: Vec<f64>,
    /// Injected feedback current vector at each control interval.
    pub currents: Vec<Vec<f64>>,
    pub spikes: Vec<Spike>,
}

/// Snapshot produced by `READ`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    /// Raw activations (V, relative to the leak reversal potential).
    pub activations: Vec<f64>,
    /// Activations rescaled into `[0, 1]` between rest and threshold.
    pub normalized: Vec<f64>,
    /// Simulated time since allocation (s).
    pub time: f64,
    /// Integration steps since allocation.
    pub steps: u64,
    pub trace: Option<Trace>,
    pub saturation: Vec<SaturationWarning>,
}

/// Mutable simulation state for one allocation.
///
/// All per-unit data lives in flat buffers indexed by unit id; units only
/// interact through the shared `J` and `h`.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub(crate) n: usize,
    pub(crate) activations: Vec<f64>,
    pub(crate) normalized: Vec<f64>,
    pub(crate) coupling: Vec<f64>,
    pub(crate) bias: Vec<f64>,
    pub(crate) feedback: Vec<f64>,
    pub(crate) refractory_until: Vec<u64>,
    pub(crate) noise_amplitude: f64,
    pub(crate) step: u64,
    pub(crate) trace: Option<Trace>,
    pub(crate) saturation: Vec<SaturationWarning>,
}

impl EngineState {
    pub(crate) fn new(n: usize, rest: f64, trace: bool) -> Self {
        Self {
            n,
            activations: vec![rest; n],
            normalized: vec![0.0; n],
            coupling: vec![0.0; n * n],
            bias: vec![0.0; n],
            feedback: vec![0.0; n],
            refractory_until: vec![0; n],
            noise_amplitude: 0.0,
            step: 0,
            trace: trace.then(Trace::default),
            saturation: Vec::new(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Loaded coupling matrix, row-major.
    pub fn coupling(&self) -> &[f64] {
        &self.coupling
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Feedback current currently injected into each unit.
    pub fn feedback(&self) -> &[f64] {
        &self.feedback
    }

    pub fn noise_amplitude(&self) -> f64 {
        self.noise_amplitude
    }

    /// Integration steps since allocation.
    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn saturation(&self) -> &[SaturationWarning] {
        &self.saturation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_at_rest() {
        let state = EngineState::new(3, 0.0, false);
        assert_eq!(state.n(), 3);
        assert_eq!(state.activations(), &[0.0, 0.0, 0.0]);
        assert_eq!(state.coupling().len(), 9);
        assert_eq!(state.noise_amplitude(), 0.0);
        assert!(state.trace.is_none());
        assert!(EngineState::new(1, 0.0, true).trace.is_some());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Ready.to_string(), "READY");
        assert_eq!(Phase::Readout.to_string(), "READOUT");
    }
}
