//! Seedable random sources for the noise term.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates a reproducible RNG from a seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Creates an RNG from `seed`, or from fresh entropy when `None`.
pub fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => create_rng(seed),
        None => create_rng(rand::random()),
    }
}

/// Draws one sample from N(0, 1) using the Box-Muller transform.
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
