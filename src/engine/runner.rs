//! Instruction interpreter and stochastic integrator.

use rand::rngs::StdRng;
use tracing::{debug, error, trace, warn};

use super::config::EngineConfig;
use super::feedback::{feedback_current, normalize_state};
use super::types::{EngineState, Phase, Readout, SaturationWarning, Spike};
use crate::error::{Error, Result};
use crate::isa::{BiasLoad, CouplingLoad, Instruction, Opcode, Program};
use crate::model::check_symmetric;
use crate::random::{rng_from, standard_normal};

/// Executes VPU programs on a simulated population of leaky
/// integrate-and-fire units.
///
/// Each unit follows the Euler–Maruyama update
///
/// ```text
/// v ← v + dt/τ · (-(v - rest) + R·(I_offset + I_fb)) + σ·√(2/τ)·√dt·ξ,   ξ ~ N(0, 1)
/// ```
///
/// and is reset to `reset` (then frozen for the refractory interval) when
/// it crosses `threshold`. Every control interval the feedback current
/// `I_fb = J·s + h` is recomputed from the normalized state `s` and scaled
/// down to the current ceiling if necessary.
///
/// One engine runs one program at a time; use separate engines for
/// concurrent runs.
///
/// # Examples
///
/// ```
/// use vpu_anneal::engine::{EngineConfig, ExecutionEngine};
/// use vpu_anneal::isa::{Instruction, Program};
///
/// let program = Program::from(vec![
///     Instruction::Allocate { size: 5 },
///     Instruction::Run { duration: 0.1 },
///     Instruction::Read,
/// ]);
/// let mut engine = ExecutionEngine::new(EngineConfig::default().with_seed(1)).unwrap();
/// let readout = engine.execute(&program).unwrap();
/// assert_eq!(readout.activations.len(), 5);
/// assert_eq!(readout.steps, 1000);
/// ```
#[derive(Debug)]
pub struct ExecutionEngine {
    config: EngineConfig,
    rng: StdRng,
    phase: Phase,
    state: Option<EngineState>,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        let rng = rng_from(config.seed);
        Ok(Self {
            config,
            rng,
            phase: Phase::Unallocated,
            state: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current simulation state, if allocated.
    pub fn state(&self) -> Option<&EngineState> {
        self.state.as_ref()
    }

    /// Runs `program` from start to finish and returns its readout.
    ///
    /// The first failing instruction aborts execution. A program that ends
    /// without `READ` is a configuration error.
    pub fn execute(&mut self, program: &Program) -> Result<Readout> {
        let mut readout = None;
        for instruction in program {
            if let Some(r) = self.apply(instruction)? {
                readout = Some(r);
            }
        }
        readout.ok_or_else(|| Error::Configuration("program finished without READ".into()))
    }

    /// Executes a single instruction. Returns the snapshot for `READ`.
    pub fn apply(&mut self, instruction: &Instruction) -> Result<Option<Readout>> {
        match instruction {
            Instruction::Allocate { size } => self.allocate(*size)?,
            Instruction::LoadCoupling { load } => self.load_coupling(load)?,
            Instruction::LoadBias { load } => self.load_bias(load)?,
            Instruction::SetNoise { amplitude } => self.set_noise(*amplitude)?,
            Instruction::Run { duration } => self.run(*duration)?,
            Instruction::Read => return self.read().map(Some),
        }
        Ok(None)
    }

    /// `ALLOCATE n`: discards any prior state and places `n` units at rest.
    pub fn allocate(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::Configuration(
                "ALLOCATE size must be positive".into(),
            ));
        }
        self.state = Some(EngineState::new(size, self.config.rest, self.config.trace));
        self.phase = Phase::Allocated;
        debug!(units = size, "allocated");
        Ok(())
    }

    /// `LOAD_COUPLING`: bulk replace or element-wise accumulate.
    pub fn load_coupling(&mut self, load: &CouplingLoad) -> Result<()> {
        let state = self.configurable(Opcode::LoadCoupling)?;
        let n = state.n;
        match load {
            CouplingLoad::Bulk(values) => {
                if values.len() != n * n {
                    return Err(Error::DimensionMismatch {
                        what: "coupling",
                        expected: n * n,
                        found: values.len(),
                    });
                }
                check_finite(values)?;
                check_symmetric(n, values)?;
                state.coupling.copy_from_slice(values);
            }
            &CouplingLoad::Element { i, j, value } => {
                for index in [i, j] {
                    if index >= n {
                        return Err(Error::IndexOutOfRange {
                            what: "coupling",
                            index,
                            size: n,
                        });
                    }
                }
                if i == j {
                    return Err(Error::Configuration(format!(
                        "coupling diagonal J[{i}][{i}] cannot be loaded"
                    )));
                }
                check_finite(&[value])?;
                state.coupling[i * n + j] += value;
                state.coupling[j * n + i] += value;
            }
        }
        Ok(())
    }

    /// `LOAD_BIAS`: bulk replace or element-wise accumulate.
    pub fn load_bias(&mut self, load: &BiasLoad) -> Result<()> {
        let state = self.configurable(Opcode::LoadBias)?;
        let n = state.n;
        match load {
            BiasLoad::Bulk(values) => {
                if values.len() != n {
                    return Err(Error::DimensionMismatch {
                        what: "bias",
                        expected: n,
                        found: values.len(),
                    });
                }
                check_finite(values)?;
                state.bias.copy_from_slice(values);
            }
            &BiasLoad::Element { i, value } => {
                if i >= n {
                    return Err(Error::IndexOutOfRange {
                        what: "bias",
                        index: i,
                        size: n,
                    });
                }
                check_finite(&[value])?;
                state.bias[i] += value;
            }
        }
        Ok(())
    }

    /// `SET_NOISE σ`: amplitude used by every subsequent `RUN`.
    pub fn set_noise(&mut self, amplitude: f64) -> Result<()> {
        if !(amplitude.is_finite() && amplitude >= 0.0) {
            return Err(Error::Configuration(format!(
                "noise amplitude must be non-negative and finite, got {amplitude}"
            )));
        }
        let state = self.configurable(Opcode::SetNoise)?;
        state.noise_amplitude = amplitude;
        Ok(())
    }

    /// `RUN d`: integrates for `d` seconds of simulated time.
    ///
    /// Blocks for the whole duration. The step count is `d / dt` rounded to
    /// the nearest integer and depends on nothing else; a duration that
    /// rounds to zero steps is rejected. On numeric overflow the run is
    /// aborted and the allocation discarded.
    pub fn run(&mut self, duration: f64) -> Result<()> {
        if !(duration.is_finite() && duration > 0.0) {
            return Err(Error::Configuration(format!(
                "RUN duration must be positive and finite, got {duration}"
            )));
        }
        self.require(Opcode::Run, &[Phase::Allocated, Phase::Ready])?;
        let steps = self.config.steps_for(duration);
        if steps == 0 {
            return Err(Error::Configuration(format!(
                "RUN duration {duration} is shorter than one integration step ({})",
                self.config.dt
            )));
        }

        self.phase = Phase::Running;
        let outcome = match self.state.as_mut() {
            Some(state) => integrate(&self.config, &mut self.rng, state, steps),
            None => Ok(()),
        };
        match outcome {
            Ok(()) => {
                self.phase = Phase::Ready;
                debug!(duration, steps, "run complete");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "run aborted");
                self.disconnect();
                Err(e)
            }
        }
    }

    /// `READ`: snapshots activations (and trace, if enabled).
    pub fn read(&mut self) -> Result<Readout> {
        self.require(Opcode::Read, &[Phase::Ready])?;
        let Some(state) = self.state.as_mut() else {
            return Err(Error::InvalidPhase {
                opcode: Opcode::Read,
                phase: self.phase,
            });
        };

        let mut normalized = vec![0.0; state.n];
        normalize_state(
            &state.activations,
            self.config.rest,
            self.config.threshold,
            &mut normalized,
        );
        let saturation = std::mem::take(&mut state.saturation);
        if !saturation.is_empty() {
            warn!(
                events = saturation.len(),
                "feedback current was scaled to the ceiling"
            );
        }
        let readout = Readout {
            activations: state.activations.clone(),
            normalized,
            time: state.step as f64 * self.config.dt,
            steps: state.step,
            trace: state.trace.take(),
            saturation,
        };
        self.phase = Phase::Readout;
        debug!(units = state.n, steps = state.step, "read");
        Ok(readout)
    }

    /// Tears down the allocation. Safe to call in any phase.
    pub fn disconnect(&mut self) {
        self.state = None;
        self.phase = Phase::Unallocated;
    }

    fn require(&self, opcode: Opcode, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::InvalidPhase {
                opcode,
                phase: self.phase,
            })
        }
    }

    /// State in a phase that accepts coefficient and noise updates.
    fn configurable(&mut self, opcode: Opcode) -> Result<&mut EngineState> {
        self.require(opcode, &[Phase::Allocated, Phase::Ready])?;
        let phase = self.phase;
        self.state
            .as_mut()
            .ok_or(Error::InvalidPhase { opcode, phase })
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(Error::Configuration(format!(
            "non-finite coefficient {v}"
        ))),
        None => Ok(()),
    }
}

/// Advances `state` by `steps` integration steps.
fn integrate(
    config: &EngineConfig,
    rng: &mut StdRng,
    state: &mut EngineState,
    steps: u64,
) -> Result<()> {
    let control = config.control_steps();
    let refractory = config.refractory_steps();
    let decay = config.dt / config.tau;
    // Wiener increment: noise scales with √dt.
    let noise_gain = state.noise_amplitude * (2.0 / config.tau).sqrt() * config.dt.sqrt();

    for _ in 0..steps {
        let step = state.step;
        if step % control == 0 {
            update_feedback(config, state, step)?;
        }

        for i in 0..state.n {
            if state.refractory_until[i] > step {
                continue;
            }
            let v = state.activations[i];
            let drive = config.resistance * (config.offset_current + state.feedback[i]);
            let mut next = v + decay * (-(v - config.rest) + drive);
            if noise_gain > 0.0 {
                next += noise_gain * standard_normal(rng);
            }
            if !next.is_finite() {
                return Err(Error::NumericInstability {
                    step,
                    unit: i,
                    value: next,
                });
            }
            if next > config.threshold {
                if let Some(trace) = state.trace.as_mut() {
                    trace.spikes.push(Spike {
                        unit: i,
                        time: (step + 1) as f64 * config.dt,
                    });
                }
                next = config.reset;
                state.refractory_until[i] = step + 1 + refractory;
            }
            state.activations[i] = next;
        }
        state.step += 1;
    }
    Ok(())
}

/// Recomputes the injected feedback current from the current activations.
fn update_feedback(config: &EngineConfig, state: &mut EngineState, step: u64) -> Result<()> {
    normalize_state(
        &state.activations,
        config.rest,
        config.threshold,
        &mut state.normalized,
    );
    let outcome = feedback_current(
        &state.coupling,
        &state.bias,
        &state.normalized,
        config.current_ceiling,
        &mut state.feedback,
    );
    if let Some((unit, &value)) = state
        .feedback
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite())
    {
        return Err(Error::NumericInstability { step, unit, value });
    }

    let time = step as f64 * config.dt;
    if outcome.saturated() {
        trace!(step, peak = outcome.peak, scale = outcome.scale, "feedback saturated");
        state.saturation.push(SaturationWarning {
            step,
            time,
            peak: outcome.peak,
            scale: outcome.scale,
        });
    }
    if let Some(t) = state.trace.as_mut() {
        t.energy.push(outcome.energy);
        t.currents.push(state.feedback.clone());
    }
    Ok(())
}
