//! End-to-end orchestration: problem → model → program → device → result.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{connect, execute_scoped, SIMULATOR};
use crate::compiler::{Compiler, StrategyConfig, DEFAULT_OPERATING_RANGE};
use crate::decoder::{ResultDecoder, SimulationResult};
use crate::engine::EngineConfig;
use crate::error::{Error, Result};
use crate::model::Problem;

/// Configuration for a [`Process`].
///
/// # Examples
///
/// ```
/// use vpu_anneal::compiler::StrategyConfig;
/// use vpu_anneal::engine::EngineConfig;
/// use vpu_anneal::process::ProcessConfig;
///
/// let config = ProcessConfig::default()
///     .with_engine(EngineConfig::default().with_seed(3))
///     .with_strategy(StrategyConfig::single_shot(2e-3, 0.2))
///     .with_cutoff(0.6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Backend name passed to [`connect`].
    ///
    /// Default: `"simulator"`
    pub backend: String,

    pub engine: EngineConfig,

    pub strategy: StrategyConfig,

    /// Coefficient bound the model is normalized into before compiling.
    ///
    /// Default: 1.5e-9 (1.5 nA)
    pub operating_range: f64,

    /// Decoder cutoff on normalized unit states.
    ///
    /// Default: 0.5
    pub cutoff: f64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            backend: SIMULATOR.to_string(),
            engine: EngineConfig::default(),
            strategy: StrategyConfig::default(),
            operating_range: DEFAULT_OPERATING_RANGE,
            cutoff: 0.5,
        }
    }
}

impl ProcessConfig {
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyConfig) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_operating_range(mut self, range: f64) -> Self {
        self.operating_range = range;
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        self.engine.validate()?;
        self.strategy.validate()?;
        if !(self.operating_range.is_finite() && self.operating_range > 0.0) {
            return Err("operating_range must be positive and finite".into());
        }
        if !(0.0..=1.0).contains(&self.cutoff) {
            return Err("cutoff must lie in [0, 1]".into());
        }
        Ok(())
    }
}

/// Runs problems on a backend.
///
/// Each run builds a fresh device connection, so a `Process` can be shared
/// across threads and reused for any number of problems.
///
/// # Examples
///
/// ```
/// use vpu_anneal::compiler::StrategyConfig;
/// use vpu_anneal::engine::EngineConfig;
/// use vpu_anneal::problems::MaxCut;
/// use vpu_anneal::process::{Process, ProcessConfig};
///
/// let square = MaxCut::new(4, vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
/// let process = Process::new(
///     ProcessConfig::default()
///         .with_engine(EngineConfig::critical().with_seed(1))
///         .with_strategy(StrategyConfig::single_shot(2e-3, 0.05)),
/// )
/// .unwrap();
/// let result = process.run(&square).unwrap();
/// assert_eq!(result.solution.len(), 4);
/// assert!(result.metrics.contains_key("cut_value"));
/// ```
#[derive(Debug, Clone)]
pub struct Process {
    config: ProcessConfig,
    compiler: Compiler,
    decoder: ResultDecoder,
}

impl Process {
    pub fn new(config: ProcessConfig) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        let compiler = Compiler::new(config.operating_range)?;
        let decoder = ResultDecoder::new(config.cutoff)?;
        Ok(Self {
            config,
            compiler,
            decoder,
        })
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    /// Runs `problem` once with the configured engine seed.
    pub fn run<P: Problem + ?Sized>(&self, problem: &P) -> Result<SimulationResult> {
        self.run_with(problem, self.config.engine.clone())
    }

    /// Runs `problem` once per seed, each on an independent engine.
    ///
    /// Results are returned in seed order. The first failing run aborts the
    /// batch. With the `parallel` feature the runs execute on the rayon pool.
    pub fn run_batch<P: Problem + Sync + ?Sized>(
        &self,
        problem: &P,
        seeds: &[u64],
    ) -> Result<Vec<SimulationResult>> {
        let run_one = |&seed: &u64| self.run_with(problem, self.config.engine.clone().with_seed(seed));

        #[cfg(feature = "parallel")]
        let results = seeds.par_iter().map(run_one).collect();
        #[cfg(not(feature = "parallel"))]
        let results = seeds.iter().map(run_one).collect();

        results
    }

    fn run_with<P: Problem + ?Sized>(
        &self,
        problem: &P,
        engine: EngineConfig,
    ) -> Result<SimulationResult> {
        let model = problem.energy_model()?;
        let normalized = model.normalized(self.config.operating_range)?;
        let program = self.compiler.compile(&normalized.model, &self.config.strategy)?;

        let mut backend = connect(&self.config.backend, engine)?;
        let readout = execute_scoped(backend.as_mut(), &program)?;

        let result = self
            .decoder
            .decode_with(&readout, problem)
            .with_energy(&model)?;
        info!(
            backend = backend.name(),
            units = model.n(),
            strategy = %self.config.strategy.strategy,
            scale = normalized.scale,
            steps = result.steps,
            saturation_events = result.saturation_events,
            energy = result.energy,
            "process finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnergyModel;
    use crate::problems::MaxCut;

    fn single_shot(seed: u64) -> Process {
        Process::new(
            ProcessConfig::default()
                .with_engine(EngineConfig::critical().with_seed(seed))
                .with_strategy(StrategyConfig::single_shot(2e-3, 0.5)),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(ProcessConfig::default().validate().is_ok());
        assert!(ProcessConfig::default().with_cutoff(1.5).validate().is_err());
        assert!(ProcessConfig::default()
            .with_operating_range(0.0)
            .validate()
            .is_err());
        assert!(ProcessConfig::default()
            .with_engine(EngineConfig::default().with_dt(0.0))
            .validate()
            .is_err());
        let err = Process::new(ProcessConfig::default().with_cutoff(-0.1)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_from_json() {
        use crate::compiler::Strategy;

        let config: ProcessConfig = serde_json::from_str(
            r#"{
                "cutoff": 0.7,
                "engine": { "seed": 4, "dt": 0.0002, "trace": true },
                "strategy": { "strategy": "single-shot", "default_duration": 0.2 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.backend, "simulator");
        assert_eq!(config.cutoff, 0.7);
        assert_eq!(config.engine.seed, Some(4));
        assert_eq!(config.engine.dt, 0.0002);
        assert_eq!(config.engine.tau, 20e-3);
        assert_eq!(config.strategy.strategy, Strategy::SingleShot);
        assert_eq!(config.strategy.default_duration, 0.2);
        assert_eq!(config.strategy.default_amplitude, 2e-3);
        assert!(config.validate().is_ok());

        let json = serde_json::to_string(&config).unwrap();
        let back: ProcessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_unknown_backend() {
        let process = Process::new(ProcessConfig::default().with_backend("hardware")).unwrap();
        let model = EnergyModel::new(1, vec![0.0], vec![0.0]).unwrap();
        assert!(matches!(
            process.run(&model),
            Err(Error::BackendUnavailable(_))
        ));
    }

    /// No drive and no coupling: under the default engine every unit
    /// relaxes to rest and only noise moves it.
    #[test]
    fn test_zero_model_five_units() {
        let sigma = 2e-3;
        let model = EnergyModel::new(5, vec![0.0; 25], vec![0.0; 5]).unwrap();
        let process = Process::new(
            ProcessConfig::default()
                .with_engine(EngineConfig::default().with_seed(11))
                .with_strategy(StrategyConfig::single_shot(sigma, 0.5)),
        )
        .unwrap();
        let result = process.run(&model).unwrap();
        assert_eq!(result.raw_state.len(), 5);
        for &v in &result.raw_state {
            assert!(v.abs() < 5.0 * sigma, "unit at {v}, expected near rest");
        }
        assert_eq!(result.solution, vec![0; 5]);
        assert_eq!(result.steps, 5000);
        assert_eq!(result.saturation_events, 0);
        assert_eq!(result.energy, Some(0.0));
    }

    #[test]
    fn test_large_coefficients_are_normalized() {
        // Far outside the operating range; the process scales it down.
        let model = EnergyModel::from_rows(&[vec![0.0, -40.0], vec![-40.0, 0.0]], vec![3.0, 0.0]).unwrap();
        let result = single_shot(2).run(&model).unwrap();
        assert_eq!(result.solution.len(), 2);
        assert_eq!(result.saturation_events, 0);
        // Reported energy is in the caller's units.
        let expected = model.energy_of_solution(&result.solution);
        assert_eq!(result.energy, Some(expected));
    }

    /// Mutually inhibiting pair: one unit should win most of the time.
    #[test]
    fn test_antiferromagnetic_pair_anticorrelates() {
        let model = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0]).unwrap();
        let seeds: Vec<u64> = (0..40).collect();
        let results = single_shot(0).run_batch(&model, &seeds).unwrap();
        let anti = results
            .iter()
            .filter(|r| r.solution[0] != r.solution[1])
            .count();
        assert!(anti > seeds.len() - anti, "anti-correlated in {anti}/40 runs");
    }

    #[test]
    fn test_four_cycle_maxcut_reaches_optimum() {
        let square = MaxCut::new(4, vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)]);
        let process =
            Process::new(ProcessConfig::default().with_engine(EngineConfig::critical())).unwrap();
        let seeds: Vec<u64> = (100..112).collect();
        let results = process.run_batch(&square, &seeds).unwrap();
        let cuts: Vec<f64> = results
            .iter()
            .map(|r| r.metrics["cut_value"].as_f64().unwrap_or(0.0))
            .collect();
        let best = cuts.iter().cloned().fold(0.0, f64::max);
        let mean = cuts.iter().sum::<f64>() / cuts.len() as f64;
        assert_eq!(best, 4.0, "cuts: {cuts:?}");
        assert!(mean >= 2.0, "cuts: {cuts:?}");
        for r in &results {
            assert_eq!(r.steps, 3000);
        }
    }

    #[test]
    fn test_batch_matches_individual_runs() {
        let model = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0]).unwrap();
        let process = single_shot(0);
        let batch = process.run_batch(&model, &[5, 6, 7]).unwrap();
        for (seed, result) in [5, 6, 7].into_iter().zip(&batch) {
            assert_eq!(&single_shot(seed).run(&model).unwrap(), result);
        }
    }

    #[test]
    fn test_invalid_problem_propagates() {
        struct Broken;
        impl Problem for Broken {
            fn energy_model(&self) -> Result<EnergyModel> {
                EnergyModel::new(2, vec![0.0; 3], vec![0.0; 2])
            }
        }
        assert!(single_shot(0).run(&Broken).unwrap_err().is_configuration());
    }
}
