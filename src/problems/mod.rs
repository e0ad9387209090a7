//! Reference problem encoders.
//!
//! Each type implements [`Problem`](crate::model::Problem): a pure
//! transform from a combinatorial problem to an
//! [`EnergyModel`](crate::model::EnergyModel), plus domain metrics for
//! decoded solutions. Encoders produce coefficients in problem units; the
//! [`Process`](crate::process::Process) scales them into the device range.
//!
//! | Problem | Variables | Constraints |
//! |---------|-----------|-------------|
//! | [`MaxCut`] | one per vertex | none |
//! | [`Knapsack`] | one per item | capacity (squared penalty) |
//! | [`Portfolio`] | one per asset | none |
//! | [`Tsp`] | one per (city, step) | one-hot rows and columns |

mod knapsack;
mod maxcut;
mod portfolio;
mod tsp;

pub use knapsack::{Item, Knapsack};
pub use maxcut::MaxCut;
pub use portfolio::Portfolio;
pub use tsp::Tsp;

/// Reads bit `i`, treating missing entries as 0.
fn bit(solution: &[u8], i: usize) -> bool {
    solution.get(i).is_some_and(|&b| b == 1)
}
