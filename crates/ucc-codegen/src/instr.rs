//! The IR instruction representation.
//!
//! Instructions are opcode-plus-operands tuples. Opcodes follow the
//! `<op>_<typename>[...]` convention where the suffix encodes the scalar
//! type and any dimensional modifiers (`_*` for a pointer, `_N` for an
//! array of size N, nested for multi-dimensional arrays). Basic-block
//! labels are single-part instructions whose opcode is the bare label
//! number.

use std::fmt;

/// A single IR instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instr {
    /// The opcode, or the bare number for a label
    pub opcode: String,
    /// The operands, in order
    pub operands: Vec<String>,
}

impl Instr {
    /// Creates an instruction from an opcode and its operands.
    #[must_use]
    pub fn new(opcode: impl Into<String>, operands: Vec<String>) -> Self {
        Self { opcode: opcode.into(), operands }
    }

    /// Creates a label marker from a temporary name, stripping the leading
    /// `%`.
    #[must_use]
    pub fn label(temp: &str) -> Self {
        Self { opcode: temp.trim_start_matches('%').to_string(), operands: Vec::new() }
    }

    /// Whether this instruction marks a basic-block label.
    #[must_use]
    pub fn is_label(&self) -> bool {
        self.operands.is_empty() && self.opcode.chars().all(|c| c.is_ascii_digit())
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_label() {
            return write!(f, "{}:", self.opcode);
        }

        write!(f, "{}", self.opcode)?;

        let mut sep = " ";
        for operand in &self.operands {
            write!(f, "{sep}{operand}")?;
            sep = ", ";
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_render_with_a_colon() {
        assert_eq!(Instr::label("%7").to_string(), "7:");
    }

    #[test]
    fn instructions_render_space_then_commas() {
        let instr = Instr::new("add_int", vec!["%1".into(), "%2".into(), "%3".into()]);

        assert_eq!(instr.to_string(), "add_int %1, %2, %3");
    }
}
