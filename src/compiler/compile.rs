//! Lowering of energy models to programs.

use tracing::debug;

use super::config::StrategyConfig;
use crate::error::{Error, Result};
use crate::isa::{Instruction, Program};
use crate::model::EnergyModel;

/// Default operating range: ±1.5 nA of injected current per coefficient.
pub const DEFAULT_OPERATING_RANGE: f64 = 1.5e-9;

/// Compiles an [`EnergyModel`] plus a [`StrategyConfig`] into a [`Program`].
///
/// The emitted program is:
///
/// 1. `ALLOCATE n`
/// 2. bulk `LOAD_COUPLING J`, bulk `LOAD_BIAS h`
/// 3. one `SET_NOISE σ` / `RUN d` pair per stage, in schedule order
/// 4. `READ`
///
/// Compilation is a pure function of its inputs. Models must already be
/// normalized into the operating range (see [`EnergyModel::normalized`]).
///
/// # Examples
///
/// ```
/// use vpu_anneal::compiler::{Compiler, StrategyConfig};
/// use vpu_anneal::isa::Opcode;
/// use vpu_anneal::model::EnergyModel;
///
/// let model = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0])
///     .unwrap()
///     .normalized(1.5e-9)
///     .unwrap()
///     .model;
/// let program = Compiler::default()
///     .compile(&model, &StrategyConfig::single_shot(2e-3, 0.5))
///     .unwrap();
/// assert_eq!(
///     program.opcodes(),
///     vec![Opcode::Allocate, Opcode::LoadCoupling, Opcode::LoadBias,
///          Opcode::SetNoise, Opcode::Run, Opcode::Read]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compiler {
    operating_range: f64,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            operating_range: DEFAULT_OPERATING_RANGE,
        }
    }
}

impl Compiler {
    pub fn new(operating_range: f64) -> Result<Self> {
        if !(operating_range.is_finite() && operating_range > 0.0) {
            return Err(Error::Configuration(format!(
                "operating range must be positive and finite, got {operating_range}"
            )));
        }
        Ok(Self { operating_range })
    }

    pub fn operating_range(&self) -> f64 {
        self.operating_range
    }

    /// Compiles `model` under `strategy`.
    pub fn compile(&self, model: &EnergyModel, strategy: &StrategyConfig) -> Result<Program> {
        strategy.validate().map_err(Error::Configuration)?;

        let max = model.max_abs();
        if max > self.operating_range {
            return Err(Error::Unnormalized {
                max,
                range: self.operating_range,
            });
        }

        let stages = strategy.stages();
        let mut program = Program::new();
        program.push(Instruction::Allocate { size: model.n() });
        program.push(Instruction::coupling_bulk(model.coupling_matrix().to_vec()));
        program.push(Instruction::bias_bulk(model.bias().to_vec()));
        for stage in &stages {
            program.push(Instruction::SetNoise {
                amplitude: stage.amplitude,
            });
            program.push(Instruction::Run {
                duration: stage.duration,
            });
        }
        program.push(Instruction::Read);

        debug!(
            n = model.n(),
            strategy = %strategy.strategy,
            stages = stages.len(),
            instructions = program.len(),
            "compiled energy model"
        );
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{NoiseStage, Strategy};
    use crate::isa::Opcode;

    fn model() -> EnergyModel {
        EnergyModel::from_rows(
            &[vec![0.0, -1e-9, 5e-10], vec![-1e-9, 0.0, 0.0], vec![5e-10, 0.0, 0.0]],
            vec![2e-10, 0.0, -1e-10],
        )
        .unwrap()
    }

    #[test]
    fn test_compile_annealing_shape() {
        let strategy = StrategyConfig::default().with_noise_schedule(vec![
            NoiseStage::new(9e-3, 0.02),
            NoiseStage::new(6e-3, 0.03),
            NoiseStage::new(3e-3, 0.04),
            NoiseStage::new(1e-3, 0.05),
        ]);
        let program = Compiler::default().compile(&model(), &strategy).unwrap();
        let ins = program.instructions();

        assert_eq!(ins.len(), 3 + 2 * 4 + 1);
        assert_eq!(ins[0], Instruction::Allocate { size: 3 });
        assert_eq!(ins[1], Instruction::coupling_bulk(model().coupling_matrix().to_vec()));
        assert_eq!(ins[2], Instruction::bias_bulk(model().bias().to_vec()));
        for (k, stage) in strategy.noise_schedule.iter().enumerate() {
            assert_eq!(
                ins[3 + 2 * k],
                Instruction::SetNoise {
                    amplitude: stage.amplitude
                }
            );
            assert_eq!(
                ins[4 + 2 * k],
                Instruction::Run {
                    duration: stage.duration
                }
            );
        }
        assert_eq!(ins.last(), Some(&Instruction::Read));
    }

    #[test]
    fn test_compile_single_shot_uses_defaults() {
        let strategy = StrategyConfig::default()
            .with_strategy(Strategy::SingleShot)
            .with_default_amplitude(4e-3)
            .with_default_duration(0.2);
        let program = Compiler::default().compile(&model(), &strategy).unwrap();
        assert_eq!(
            program.opcodes(),
            vec![
                Opcode::Allocate,
                Opcode::LoadCoupling,
                Opcode::LoadBias,
                Opcode::SetNoise,
                Opcode::Run,
                Opcode::Read
            ]
        );
        assert_eq!(program.instructions()[3], Instruction::SetNoise { amplitude: 4e-3 });
        assert_eq!(program.instructions()[4], Instruction::Run { duration: 0.2 });
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = Compiler::default();
        let strategy = StrategyConfig::default();
        let a = compiler.compile(&model(), &strategy).unwrap();
        let b = compiler.compile(&model(), &strategy).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.encode().unwrap(), b.encode().unwrap());
    }

    #[test]
    fn test_compile_preserves_non_monotone_schedule_order() {
        let strategy = StrategyConfig::default()
            .with_noise_schedule(vec![NoiseStage::new(1e-3, 0.1), NoiseStage::new(5e-3, 0.1)]);
        assert!(!strategy.is_monotone());
        let program = Compiler::default().compile(&model(), &strategy).unwrap();
        assert_eq!(program.instructions()[3], Instruction::SetNoise { amplitude: 1e-3 });
        assert_eq!(program.instructions()[5], Instruction::SetNoise { amplitude: 5e-3 });
    }

    #[test]
    fn test_compile_rejects_unnormalized_model() {
        let raw = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0]).unwrap();
        let err = Compiler::default()
            .compile(&raw, &StrategyConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::Unnormalized { .. }));
        assert!(err.is_configuration());

        let normalized = raw.normalized(DEFAULT_OPERATING_RANGE).unwrap().model;
        assert!(Compiler::default()
            .compile(&normalized, &StrategyConfig::default())
            .is_ok());
    }

    #[test]
    fn test_compile_rejects_malformed_strategy() {
        let strategy = StrategyConfig::default().with_noise_schedule(vec![]);
        let err = Compiler::default().compile(&model(), &strategy).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_custom_operating_range() {
        let raw = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0]).unwrap();
        let compiler = Compiler::new(1.0).unwrap();
        assert!(compiler.compile(&raw, &StrategyConfig::default()).is_ok());
        assert!(Compiler::new(0.0).is_err());
        assert!(Compiler::new(f64::INFINITY).is_err());
    }
}
