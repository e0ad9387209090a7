//! Instruction sequences and their binary encoding.

use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::instruction::{Instruction, Opcode};
use crate::error::{Error, Result};

const MAGIC: &[u8; 4] = b"VPU1";

/// An ordered instruction sequence.
///
/// Execution order is emission order; a program is never reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Opcode sequence, handy for shape assertions.
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions.iter().map(Instruction::opcode).collect()
    }

    /// Encodes the program for transport across a driver boundary.
    ///
    /// Layout: `"VPU1"` followed by the bincode encoding of the instruction
    /// list (fixed-width little-endian integers).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = codec()
            .serialize(&self.instructions)
            .map_err(|e| Error::Decode(e.to_string()))?;
        let mut out = Vec::with_capacity(MAGIC.len() + body.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decodes a byte stream produced by [`Program::encode`].
    ///
    /// Truncated input, unknown instruction tags and trailing bytes are all
    /// rejected with [`Error::Decode`].
    pub fn decode(bytes: &[u8]) -> Result<Program> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| Error::Decode("bad magic".into()))?;
        let instructions: Vec<Instruction> = codec()
            .deserialize(body)
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(Program { instructions })
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

impl FromIterator<Instruction> for Program {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{pc:04}  {instruction}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Program {
        Program::from(vec![
            Instruction::Allocate { size: 2 },
            Instruction::coupling_bulk(vec![0.0, -1e-9, -1e-9, 0.0]),
            Instruction::bias_bulk(vec![0.0, 0.0]),
            Instruction::coupling_element(0, 1, 2.5e-10),
            Instruction::bias_element(1, -3e-10),
            Instruction::SetNoise { amplitude: 2e-3 },
            Instruction::Run { duration: 0.5 },
            Instruction::Read,
        ])
    }

    #[test]
    fn test_encode_decode_preserves_program() {
        let program = sample();
        let bytes = program.encode().unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(Program::decode(&bytes).unwrap(), program);
        assert_eq!(Program::decode(&Program::new().encode().unwrap()).unwrap(), Program::new());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = sample().encode().unwrap();
        bytes[0] = b'X';
        assert_eq!(Program::decode(&bytes), Err(Error::Decode("bad magic".into())));
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let bytes = sample().encode().unwrap();
        for cut in [0, 3, 12, bytes.len() - 1] {
            assert!(
                matches!(Program::decode(&bytes[..cut]), Err(Error::Decode(_))),
                "cut at {cut} should fail"
            );
        }
    }

    #[test]
    fn test_decode_rejects_unknown_tag_and_trailing_bytes() {
        // The variant index of the single READ is the last four bytes.
        let mut bytes = Program::from(vec![Instruction::Read]).encode().unwrap();
        let tag_pos = bytes.len() - 4;
        bytes[tag_pos] = 0x7F;
        assert!(matches!(Program::decode(&bytes), Err(Error::Decode(_))));

        let mut bytes = Program::from(vec![Instruction::Read]).encode().unwrap();
        bytes.push(0);
        assert!(matches!(Program::decode(&bytes), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_oversized_payload_length() {
        // magic | count | LOAD_BIAS | bulk | len | one f64
        let mut bytes = Program::from(vec![Instruction::bias_bulk(vec![1.0])])
            .encode()
            .unwrap();
        assert_eq!(bytes.len(), 36);
        bytes[20..28].copy_from_slice(&(u64::MAX / 2).to_le_bytes());
        assert!(matches!(Program::decode(&bytes), Err(Error::Decode(_))));
    }

    #[test]
    fn test_listing_numbers_instructions() {
        let listing = sample().to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "0000  ALLOCATE 2");
        assert_eq!(lines[7], "0007  READ");
    }

    #[test]
    fn test_opcodes() {
        assert_eq!(
            sample().opcodes(),
            vec![
                Opcode::Allocate,
                Opcode::LoadCoupling,
                Opcode::LoadBias,
                Opcode::LoadCoupling,
                Opcode::LoadBias,
                Opcode::SetNoise,
                Opcode::Run,
                Opcode::Read,
            ]
        );
    }
}
