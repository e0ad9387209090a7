//! Stochastic annealing on a simulated processing unit.
//!
//! Combinatorial problems are lowered to a quadratic energy model,
//! compiled to a small instruction set, and executed on a population of
//! noisy leaky integrate-and-fire units whose closed-loop dynamics settle
//! into low-energy configurations:
//!
//! - **Model**: the canonical `E(x) = -0.5·xᵀJx - hᵀx` form, builders, and
//!   normalization into the device operating range.
//! - **ISA**: `ALLOCATE`, `LOAD_COUPLING`, `LOAD_BIAS`, `SET_NOISE`, `RUN`,
//!   `READ`, plus a compact binary program encoding.
//! - **Compiler**: annealing (a noise schedule) and single-shot strategies.
//! - **Engine**: the Euler–Maruyama integrator with spike/reset, refractory
//!   period, saturated feedback, and a phase state machine.
//! - **Decoder**: thresholds final states into 0/1 solutions.
//! - **Backend / Process**: device boundary with scoped teardown, and the
//!   end-to-end pipeline with seeded batch runs.
//! - **Problems**: MaxCut, Knapsack, Portfolio, and TSP encoders.
//!
//! # Example
//!
//! ```
//! use vpu_anneal::compiler::{Compiler, StrategyConfig};
//! use vpu_anneal::decoder::ResultDecoder;
//! use vpu_anneal::engine::{EngineConfig, ExecutionEngine};
//! use vpu_anneal::model::EnergyModel;
//!
//! # fn main() -> vpu_anneal::Result<()> {
//! let model = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0])?;
//! let normalized = model.normalized(1.5e-9)?;
//! let program = Compiler::default().compile(&normalized.model, &StrategyConfig::default())?;
//!
//! let mut engine = ExecutionEngine::new(EngineConfig::critical().with_seed(7))?;
//! let result = ResultDecoder::default().decode(&engine.execute(&program)?);
//! assert_eq!(result.solution.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `parallel`: [`Process::run_batch`](process::Process::run_batch) on the
//!   rayon thread pool.
//!
//! Configs, programs, problem types and results always derive serde's
//! `Serialize`/`Deserialize`.

pub mod backend;
pub mod compiler;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod isa;
pub mod model;
pub mod problems;
pub mod process;
pub mod random;

pub use error::{Error, Result};
