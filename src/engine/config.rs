//! Physical and numerical parameters of the simulated processing unit.

use serde::{Deserialize, Serialize};

/// Configuration for the [`ExecutionEngine`](super::ExecutionEngine).
///
/// Activations are membrane-potential displacements in volts, measured
/// relative to the leak reversal potential, so the default rest and reset
/// levels are `0`. Defaults describe a passive leaky integrate-and-fire
/// unit: with nothing loaded it relaxes to rest. [`EngineConfig::critical`]
/// adds a tonic offset current that holds units just below threshold.
///
/// | Parameter | Default |
/// |---|---|
/// | `tau` | 20 ms |
/// | `resistance` | 50 MΩ |
/// | `rest`, `reset` | 0 V |
/// | `threshold` | 20 mV |
/// | `offset_current` | 0 A (0.36 nA in `critical()`) |
/// | `refractory` | 5 ms |
/// | `dt` | 0.1 ms |
/// | `control_interval` | 1 ms |
/// | `current_ceiling` | 1.5 nA |
///
/// # Examples
///
/// ```
/// use vpu_anneal::engine::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_dt(0.25e-3)
///     .with_trace(true)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.control_steps(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Membrane time constant (s).
    pub tau: f64,

    /// Input resistance (Ω) converting current to voltage drive.
    pub resistance: f64,

    /// Level the activation relaxes toward (V).
    pub rest: f64,

    /// Level the activation is reset to after a spike (V).
    pub reset: f64,

    /// Spike threshold (V). Also the top of the normalized state range.
    pub threshold: f64,

    /// Constant current injected into every unit (A).
    pub offset_current: f64,

    /// Interval after a spike during which a unit does not update (s).
    pub refractory: f64,

    /// Integration timestep (s).
    pub dt: f64,

    /// Interval between feedback recomputations (s). Must be ≥ `dt`.
    pub control_interval: f64,

    /// Maximum magnitude of injected feedback current (A).
    pub current_ceiling: f64,

    /// Record energy, feedback currents and spikes at every control interval.
    pub trace: bool,

    /// Random seed for the noise source. `None` = non-deterministic.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tau: 20e-3,
            resistance: 50e6,
            rest: 0.0,
            reset: 0.0,
            threshold: 20e-3,
            offset_current: 0.0,
            refractory: 5e-3,
            dt: 0.1e-3,
            control_interval: 1e-3,
            current_ceiling: 1.5e-9,
            trace: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Critical regime: a 0.36 nA tonic offset places the equilibrium at
    /// 18 mV, just below the 20 mV threshold, so small feedback currents
    /// decide which units fire. This is the preset to anneal with.
    pub fn critical() -> Self {
        Self {
            offset_current: 0.36e-9,
            ..Self::default()
        }
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.resistance = resistance;
        self
    }

    pub fn with_rest(mut self, rest: f64) -> Self {
        self.rest = rest;
        self
    }

    pub fn with_reset(mut self, reset: f64) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_offset_current(mut self, current: f64) -> Self {
        self.offset_current = current;
        self
    }

    pub fn with_refractory(mut self, refractory: f64) -> Self {
        self.refractory = refractory;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_control_interval(mut self, interval: f64) -> Self {
        self.control_interval = interval;
        self
    }

    pub fn with_current_ceiling(mut self, ceiling: f64) -> Self {
        self.current_ceiling = ceiling;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Steady-state activation with no feedback and no noise.
    pub fn equilibrium(&self) -> f64 {
        self.rest + self.resistance * self.offset_current
    }

    /// Integration steps between feedback recomputations (at least 1).
    pub fn control_steps(&self) -> u64 {
        ((self.control_interval / self.dt).round() as u64).max(1)
    }

    /// Integration steps a unit stays frozen after a spike.
    pub fn refractory_steps(&self) -> u64 {
        (self.refractory / self.dt).round() as u64
    }

    /// Integration steps needed to cover `duration` seconds.
    pub fn steps_for(&self, duration: f64) -> u64 {
        (duration / self.dt).round() as u64
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("tau", self.tau),
            ("resistance", self.resistance),
            ("rest", self.rest),
            ("reset", self.reset),
            ("threshold", self.threshold),
            ("offset_current", self.offset_current),
            ("refractory", self.refractory),
            ("dt", self.dt),
            ("control_interval", self.control_interval),
            ("current_ceiling", self.current_ceiling),
        ];
        if let Some((name, v)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite, got {v}"));
        }
        if self.tau <= 0.0 {
            return Err("tau must be positive".into());
        }
        if self.resistance <= 0.0 {
            return Err("resistance must be positive".into());
        }
        if self.threshold <= self.rest {
            return Err(format!(
                "threshold ({}) must lie above rest ({})",
                self.threshold, self.rest
            ));
        }
        if self.reset >= self.threshold {
            return Err(format!(
                "reset ({}) must lie below threshold ({})",
                self.reset, self.threshold
            ));
        }
        if self.refractory < 0.0 {
            return Err("refractory must be non-negative".into());
        }
        if self.dt <= 0.0 {
            return Err("dt must be positive".into());
        }
        if self.control_interval < self.dt {
            return Err(format!(
                "control_interval ({}) must be at least dt ({})",
                self.control_interval, self.dt
            ));
        }
        if self.current_ceiling <= 0.0 {
            return Err("current_ceiling must be positive".into());
        }
        Ok(())
    }
}
