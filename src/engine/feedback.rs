//! Closed-loop feedback law.
//!
//! At every control interval the activations are mapped to a normalized
//! state `s ∈ [0, 1]ⁿ` and the drive current `J·s + h` is computed. If its
//! peak magnitude exceeds the ceiling the whole vector is scaled down by
//! `ceiling / peak`, preserving direction.

/// Outcome of one feedback recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackOutcome {
    /// Peak `|J·s + h|` before saturation scaling.
    pub peak: f64,
    /// Factor applied to the raw current, `1.0` when no scaling was needed.
    pub scale: f64,
    /// `-0.5·sᵀJs - hᵀs` at the sampled state.
    pub energy: f64,
}

impl FeedbackOutcome {
    pub fn saturated(&self) -> bool {
        self.scale < 1.0
    }
}

/// Clamped linear rescaling of activations between `rest` (0) and `threshold` (1).
pub fn normalize_state(activations: &[f64], rest: f64, threshold: f64, out: &mut [f64]) {
    let span = threshold - rest;
    for (s, &v) in out.iter_mut().zip(activations) {
        *s = ((v - rest) / span).clamp(0.0, 1.0);
    }
}

/// Computes the saturated feedback current into `out`.
///
/// `coupling` is row-major `n × n`; `bias`, `state` and `out` have length
/// `n`. Whenever `peak` is finite, every entry of `out` satisfies
/// `|out[i]| <= ceiling`.
pub fn feedback_current(
    coupling: &[f64],
    bias: &[f64],
    state: &[f64],
    ceiling: f64,
    out: &mut [f64],
) -> FeedbackOutcome {
    let n = bias.len();
    let mut peak = 0.0_f64;
    let mut quadratic = 0.0;
    let mut linear = 0.0;
    for i in 0..n {
        let row = &coupling[i * n..(i + 1) * n];
        let js: f64 = row.iter().zip(state).map(|(j, s)| j * s).sum();
        out[i] = js + bias[i];
        quadratic += state[i] * js;
        linear += bias[i] * state[i];
        peak = peak.max(out[i].abs());
    }

    let mut scale = 1.0;
    if peak > ceiling {
        scale = ceiling / peak;
        for c in out.iter_mut() {
            // Rounding of c * scale may land one ulp past the ceiling.
            *c = (*c * scale).clamp(-ceiling, ceiling);
        }
    }

    FeedbackOutcome {
        peak,
        scale,
        energy: -0.5 * quadratic - linear,
    }
}
