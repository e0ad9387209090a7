//! Strategy configuration for compilation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the noise is driven during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// One `SET_NOISE`/`RUN` pair per noise-schedule stage.
    #[default]
    Annealing,
    /// A single `SET_NOISE`/`RUN` pair using the defaults.
    SingleShot,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Annealing => "annealing",
            Strategy::SingleShot => "single-shot",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annealing" => Ok(Strategy::Annealing),
            "single-shot" => Ok(Strategy::SingleShot),
            other => Err(format!(
                "unknown strategy '{other}', expected 'annealing' or 'single-shot'"
            )),
        }
    }
}

/// One stage of an annealing schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseStage {
    /// Noise amplitude in volts.
    pub amplitude: f64,
    /// Simulated duration in seconds.
    pub duration: f64,
}

impl NoiseStage {
    pub fn new(amplitude: f64, duration: f64) -> Self {
        Self {
            amplitude,
            duration,
        }
    }
}

/// Configuration for [`Compiler::compile`](super::Compiler::compile).
///
/// The default schedule anneals 10 mV → 5 mV → 2 mV for 100 ms each; the
/// single-shot default is 2 mV for 500 ms.
///
/// # Examples
///
/// ```
/// use vpu_anneal::compiler::{NoiseStage, Strategy, StrategyConfig};
///
/// let config = StrategyConfig::default()
///     .with_noise_schedule(vec![
///         NoiseStage::new(8e-3, 0.05),
///         NoiseStage::new(4e-3, 0.05),
///         NoiseStage::new(1e-3, 0.10),
///     ]);
/// assert!(config.validate().is_ok());
/// assert!(config.is_monotone());
///
/// let single = StrategyConfig::single_shot(2e-3, 0.5);
/// assert_eq!(single.strategy, Strategy::SingleShot);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub strategy: Strategy,

    /// Ordered annealing stages. Amplitudes should be non-increasing; this
    /// is the caller's responsibility and is not enforced.
    pub noise_schedule: Vec<NoiseStage>,

    /// Amplitude used by [`Strategy::SingleShot`].
    pub default_amplitude: f64,

    /// Duration used by [`Strategy::SingleShot`].
    pub default_duration: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Annealing,
            noise_schedule: vec![
                NoiseStage::new(10.0e-3, 100e-3),
                NoiseStage::new(5.0e-3, 100e-3),
                NoiseStage::new(2.0e-3, 100e-3),
            ],
            default_amplitude: 2.0e-3,
            default_duration: 500e-3,
        }
    }
}

impl StrategyConfig {
    /// Single-shot strategy with the given amplitude and duration.
    pub fn single_shot(amplitude: f64, duration: f64) -> Self {
        Self {
            strategy: Strategy::SingleShot,
            default_amplitude: amplitude,
            default_duration: duration,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_noise_schedule(mut self, schedule: Vec<NoiseStage>) -> Self {
        self.strategy = Strategy::Annealing;
        self.noise_schedule = schedule;
        self
    }

    pub fn with_default_amplitude(mut self, amplitude: f64) -> Self {
        self.default_amplitude = amplitude;
        self
    }

    pub fn with_default_duration(mut self, duration: f64) -> Self {
        self.default_duration = duration;
        self
    }

    /// Stages that will actually be emitted for the selected strategy.
    pub fn stages(&self) -> Vec<NoiseStage> {
        match self.strategy {
            Strategy::Annealing => self.noise_schedule.clone(),
            Strategy::SingleShot => vec![NoiseStage::new(
                self.default_amplitude,
                self.default_duration,
            )],
        }
    }

    /// Whether schedule amplitudes never increase from one stage to the next.
    pub fn is_monotone(&self) -> bool {
        self.noise_schedule
            .windows(2)
            .all(|w| w[1].amplitude <= w[0].amplitude)
    }

    /// Total simulated time of the emitted stages.
    pub fn total_duration(&self) -> f64 {
        self.stages().iter().map(|s| s.duration).sum()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.strategy {
            Strategy::Annealing => {
                if self.noise_schedule.is_empty() {
                    return Err("annealing strategy needs a non-empty noise_schedule".into());
                }
                for (k, stage) in self.noise_schedule.iter().enumerate() {
                    check_stage(stage).map_err(|e| format!("noise_schedule[{k}]: {e}"))?;
                }
            }
            Strategy::SingleShot => {
                check_stage(&NoiseStage::new(self.default_amplitude, self.default_duration))
                    .map_err(|e| format!("single-shot defaults: {e}"))?;
            }
        }
        Ok(())
    }
}

fn check_stage(stage: &NoiseStage) -> Result<(), String> {
    if !(stage.amplitude.is_finite() && stage.amplitude > 0.0) {
        return Err(format!(
            "amplitude must be positive and finite, got {}",
            stage.amplitude
        ));
    }
    if !(stage.duration.is_finite() && stage.duration > 0.0) {
        return Err(format!(
            "duration must be positive and finite, got {}",
            stage.duration
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StrategyConfig::default();
        assert_eq!(config.strategy, Strategy::Annealing);
        assert_eq!(config.noise_schedule.len(), 3);
        assert!(config.is_monotone());
        assert!(config.validate().is_ok());
        assert!((config.total_duration() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("annealing".parse::<Strategy>().unwrap(), Strategy::Annealing);
        assert_eq!("single-shot".parse::<Strategy>().unwrap(), Strategy::SingleShot);
        assert!("quench".parse::<Strategy>().is_err());
        assert_eq!(Strategy::SingleShot.to_string(), "single-shot");
    }

    #[test]
    fn test_single_shot_stages() {
        let config = StrategyConfig::single_shot(3e-3, 0.25);
        assert_eq!(config.stages(), vec![NoiseStage::new(3e-3, 0.25)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_schedule() {
        let config = StrategyConfig::default().with_noise_schedule(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_stage() {
        let config = StrategyConfig::default()
            .with_noise_schedule(vec![NoiseStage::new(1e-3, 0.1), NoiseStage::new(0.0, 0.1)]);
        let err = config.validate().unwrap_err();
        assert!(err.contains("noise_schedule[1]"), "{err}");

        let config = StrategyConfig::default()
            .with_noise_schedule(vec![NoiseStage::new(1e-3, f64::NAN)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_single_shot_defaults() {
        let config = StrategyConfig::single_shot(2e-3, -1.0);
        assert!(config.validate().is_err());
        let config = StrategyConfig::single_shot(f64::INFINITY, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_monotonicity_is_reported_not_enforced() {
        let config = StrategyConfig::default()
            .with_noise_schedule(vec![NoiseStage::new(1e-3, 0.1), NoiseStage::new(5e-3, 0.1)]);
        assert!(!config.is_monotone());
        assert!(config.validate().is_ok());
    }
}
