//! Instruction set of the virtual processing unit.
//!
//! | Opcode | Operands | Effect |
//! |---|---|---|
//! | `ALLOCATE` | size `n` | reserve state for `n` units at rest |
//! | `LOAD_COUPLING` | bulk `J` or element `(i, j, v)` | install / accumulate couplings |
//! | `LOAD_BIAS` | bulk `h` or element `(i, v)` | install / accumulate biases |
//! | `SET_NOISE` | amplitude `σ` | noise for subsequent runs |
//! | `RUN` | duration `d` | advance the simulation by `d` seconds |
//! | `READ` | — | snapshot activations |
//!
//! A [`Program`] is an ordered sequence of instructions with a text
//! listing ([`std::fmt::Display`]) and a binary encoding
//! ([`Program::encode`] / [`Program::decode`]) for driver boundaries.

mod instruction;
mod program;

pub use instruction::{BiasLoad, CouplingLoad, Instruction, Opcode};
pub use program::Program;
