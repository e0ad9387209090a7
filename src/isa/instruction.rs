//! Opcodes and instructions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operation codes understood by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    /// Reserve state for `n` units.
    Allocate,
    /// Install or update coupling coefficients.
    LoadCoupling,
    /// Install or update bias coefficients.
    LoadBias,
    /// Set the noise amplitude for subsequent runs.
    SetNoise,
    /// Advance the simulation.
    Run,
    /// Snapshot activations into the readout.
    Read,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::Allocate,
        Opcode::LoadCoupling,
        Opcode::LoadBias,
        Opcode::SetNoise,
        Opcode::Run,
        Opcode::Read,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Allocate => "ALLOCATE",
            Opcode::LoadCoupling => "LOAD_COUPLING",
            Opcode::LoadBias => "LOAD_BIAS",
            Opcode::SetNoise => "SET_NOISE",
            Opcode::Run => "RUN",
            Opcode::Read => "READ",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operand of `LOAD_COUPLING`.
///
/// `Bulk` replaces the whole row-major `n × n` matrix. `Element` adds
/// `value` to the pair `(i, j)`, landing on both `J[i][j]` and `J[j][i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouplingLoad {
    Bulk(Vec<f64>),
    Element { i: usize, j: usize, value: f64 },
}

/// Operand of `LOAD_BIAS`.
///
/// `Bulk` replaces the whole vector; `Element` adds `value` to `h[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasLoad {
    Bulk(Vec<f64>),
    Element { i: usize, value: f64 },
}

/// One instruction of a program.
///
/// Durations are in seconds of simulated time; amplitudes in volts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Allocate { size: usize },
    LoadCoupling { load: CouplingLoad },
    LoadBias { load: BiasLoad },
    SetNoise { amplitude: f64 },
    Run { duration: f64 },
    Read,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Allocate { .. } => Opcode::Allocate,
            Instruction::LoadCoupling { .. } => Opcode::LoadCoupling,
            Instruction::LoadBias { .. } => Opcode::LoadBias,
            Instruction::SetNoise { .. } => Opcode::SetNoise,
            Instruction::Run { .. } => Opcode::Run,
            Instruction::Read => Opcode::Read,
        }
    }

    pub fn coupling_bulk(values: Vec<f64>) -> Self {
        Instruction::LoadCoupling {
            load: CouplingLoad::Bulk(values),
        }
    }

    pub fn coupling_element(i: usize, j: usize, value: f64) -> Self {
        Instruction::LoadCoupling {
            load: CouplingLoad::Element { i, j, value },
        }
    }

    pub fn bias_bulk(values: Vec<f64>) -> Self {
        Instruction::LoadBias {
            load: BiasLoad::Bulk(values),
        }
    }

    pub fn bias_element(i: usize, value: f64) -> Self {
        Instruction::LoadBias {
            load: BiasLoad::Element { i, value },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        match self {
            Instruction::Allocate { size } => write!(f, "{op} {size}"),
            Instruction::LoadCoupling { load } => match load {
                CouplingLoad::Bulk(values) => write!(f, "{op} <{} values>", values.len()),
                CouplingLoad::Element { i, j, value } => write!(f, "{op} {i} {j} {value:e}"),
            },
            Instruction::LoadBias { load } => match load {
                BiasLoad::Bulk(values) => write!(f, "{op} <{} values>", values.len()),
                BiasLoad::Element { i, value } => write!(f, "{op} {i} {value:e}"),
            },
            Instruction::SetNoise { amplitude } => write!(f, "{op} {amplitude:e}"),
            Instruction::Run { duration } => write!(f, "{op} {duration:e}"),
            Instruction::Read => write!(f, "{op}"),
        }
    }
}
