//! Scaling coefficients into the device operating range.

use super::types::EnergyModel;
use crate::error::{Error, Result};

/// A model scaled into `[-range, +range]`, together with the factor applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub model: EnergyModel,
    /// Multiplier applied to every coefficient, in `(0, 1]`.
    pub scale: f64,
}

impl Normalized {
    /// Reconstructs the original coefficients (up to rounding).
    pub fn unscaled(&self) -> EnergyModel {
        self.model.scaled(1.0 / self.scale)
    }
}

impl EnergyModel {
    /// Scales the model down uniformly so that no coefficient exceeds `range`.
    ///
    /// Models already inside the range are returned unchanged with
    /// `scale == 1.0`; coefficients are never scaled up. Signs and ratios
    /// between coefficients are preserved.
    pub fn normalized(&self, range: f64) -> Result<Normalized> {
        if !(range.is_finite() && range > 0.0) {
            return Err(Error::Configuration(format!(
                "operating range must be positive and finite, got {range}"
            )));
        }
        let max = self.max_abs();
        if max <= range {
            return Ok(Normalized {
                model: self.clone(),
                scale: 1.0,
            });
        }
        let mut scale = range / max;
        let mut model = self.scaled(scale);
        // Rounding in range / max can leave the peak one ulp above range.
        while model.max_abs() > range {
            scale *= 1.0 - f64::EPSILON;
            model = self.scaled(scale);
        }
        Ok(Normalized { model, scale })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_inside_range_unchanged() {
        let model = EnergyModel::from_rows(&[vec![0.0, 0.5], vec![0.5, 0.0]], vec![-1.0, 0.0]).unwrap();
        let n = model.normalized(1.5).unwrap();
        assert_eq!(n.scale, 1.0);
        assert_eq!(n.model, model);
    }

    #[test]
    fn test_scales_down_to_range() {
        let model = EnergyModel::from_rows(&[vec![0.0, -10.0], vec![-10.0, 0.0]], vec![4.0, 0.0]).unwrap();
        let n = model.normalized(1.5e-9).unwrap();
        assert!((n.scale - 1.5e-10).abs() < 1e-22);
        assert!(n.model.max_abs() <= 1.5e-9);
        assert!((n.model.coupling(0, 1) + 1.5e-9).abs() < 1e-21);
        assert!((n.model.bias()[0] - 0.6e-9).abs() < 1e-21);
    }

    #[test]
    fn test_rejects_bad_range() {
        let model = EnergyModel::new(1, vec![0.0], vec![1.0]).unwrap();
        assert!(model.normalized(0.0).is_err());
        assert!(model.normalized(f64::NAN).is_err());
        assert!(model.normalized(-1.0).is_err());
    }

    fn arb_model() -> impl Strategy<Value = EnergyModel> {
        (1usize..8).prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec(-1e3f64..1e3, n * (n - 1) / 2),
                prop::collection::vec(-1e3f64..1e3, n),
            )
                .prop_map(|(n, upper, bias)| {
                    let mut coupling = vec![0.0; n * n];
                    let mut k = 0;
                    for i in 0..n {
                        for j in (i + 1)..n {
                            coupling[i * n + j] = upper[k];
                            coupling[j * n + i] = upper[k];
                            k += 1;
                        }
                    }
                    EnergyModel::new(n, coupling, bias).unwrap()
                })
        })
    }

    proptest! {
        #[test]
        fn prop_normalization_bounds_and_preserves_structure(
            model in arb_model(),
            range in 1e-12f64..10.0,
        ) {
            let n = model.normalized(range).unwrap();
            prop_assert!(n.model.max_abs() <= range);
            prop_assert!(n.scale > 0.0 && n.scale <= 1.0);

            let original = model.coupling_matrix().iter().chain(model.bias());
            let scaled = n.model.coupling_matrix().iter().chain(n.model.bias());
            for (a, b) in original.zip(scaled) {
                prop_assert!(a.signum() == b.signum() || *a == 0.0, "sign flipped: {} -> {}", a, b);
            }

            let restored = n.unscaled();
            let original = model.coupling_matrix().iter().chain(model.bias());
            let back = restored.coupling_matrix().iter().chain(restored.bias());
            for (a, b) in original.zip(back) {
                prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0), "{} vs {}", a, b);
            }
        }
    }
}
