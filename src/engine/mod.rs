//! Stochastic execution engine (the virtual processing unit).
//!
//! Interprets a [`Program`](crate::isa::Program) as a time-stepped
//! dynamical system: `n` leaky integrate-and-fire units driven by noise and
//! by a feedback current derived from the loaded energy model. High noise
//! lets the population explore; as the noise is lowered the feedback loop
//! settles it into a low-energy configuration.
//!
//! # Closed loop
//!
//! Every control interval (coarser than the integration step) the engine
//! computes `s = clamp((v - rest) / (threshold - rest), 0, 1)` and the
//! current `J·s + h`. The current is scaled down uniformly so its peak never
//! exceeds the configured ceiling; each such event is recorded as a
//! [`SaturationWarning`].
//!
//! # References
//!
//! - Gerstner & Kistler (2002), "Spiking Neuron Models", ch. 4 (LIF with noise)
//! - Kloeden & Platen (1992), "Numerical Solution of Stochastic Differential Equations"

mod config;
mod feedback;
mod runner;
mod types;

pub use config::EngineConfig;
pub use feedback::{feedback_current, normalize_state, FeedbackOutcome};
pub use runner::ExecutionEngine;
pub use types::{EngineState, Phase, Readout, SaturationWarning, Spike, Trace};
