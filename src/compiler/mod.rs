//! Compiler from energy models to VPU programs.
//!
//! A [`StrategyConfig`] selects how exploration noise is scheduled:
//! [`Strategy::Annealing`] emits one noise stage per schedule entry
//! (high amplitude first), [`Strategy::SingleShot`] a single stage.

mod compile;
mod config;

pub use compile::{Compiler, DEFAULT_OPERATING_RANGE};
pub use config::{NoiseStage, Strategy, StrategyConfig};
