//! Quadratic energy models.
//!
//! Every problem is lowered to one canonical form, a symmetric coupling
//! matrix `J` with zero diagonal and a bias vector `h`, describing
//!
//! ```text
//! E(x) = -0.5 · xᵀ J x - hᵀ x
//! ```
//!
//! over binary-like variables. Constraints enter as quadratic penalty
//! terms. Before compilation the coefficients are scaled into the device
//! operating range with [`EnergyModel::normalized`].

mod normalize;
mod problem;
mod types;

pub use normalize::Normalized;
pub use problem::{MetricValue, Metrics, Problem};
pub use types::{EnergyModel, EnergyModelBuilder, SYMMETRY_TOLERANCE};

pub(crate) use types::check_symmetric;
