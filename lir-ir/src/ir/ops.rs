//! IR Opcodes
//!
//! Defines the instruction set. Comparison-branches follow the RISC-V style
//! (compare two operands and jump) because that maps easily onto most targets.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Returns
    Ret,
    RetVoid,

    // Integer math
    Add,
    Sub,
    SMul,
    UMul,
    SDiv,
    UDiv,
    SRem,
    URem,

    // Bitwise and unary
    And,
    Or,
    Xor,
    Not,
    Neg,

    // Jumps
    Br,
    Beq,
    Bne,
    Bgt,
    Blt,
    Bge,
    Ble,

    Call,

    // Memory
    Alloca,
    StructLoad,
    Load,
    GEP,
    StructStore,
    Store,
}

impl Opcode {
    /// Two-operand arithmetic and bitwise operations
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::SMul
                | Opcode::UMul
                | Opcode::SDiv
                | Opcode::UDiv
                | Opcode::SRem
                | Opcode::URem
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
        )
    }

    pub fn is_unary(&self) -> bool {
        matches!(self, Opcode::Not | Opcode::Neg)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Ret | Opcode::RetVoid | Opcode::Br)
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Opcode::Store | Opcode::StructStore)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            Opcode::Ret => "ret",
            Opcode::RetVoid => "retvoid",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::SMul => "smul",
            Opcode::UMul => "umul",
            Opcode::SDiv => "sdiv",
            Opcode::UDiv => "udiv",
            Opcode::SRem => "srem",
            Opcode::URem => "urem",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Not => "not",
            Opcode::Neg => "neg",
            Opcode::Br => "br",
            Opcode::Beq => "beq",
            Opcode::Bne => "bne",
            Opcode::Bgt => "bgt",
            Opcode::Blt => "blt",
            Opcode::Bge => "bge",
            Opcode::Ble => "ble",
            Opcode::Call => "call",
            Opcode::Alloca => "alloca",
            Opcode::StructLoad => "structload",
            Opcode::Load => "load",
            Opcode::GEP => "getelementptr",
            Opcode::StructStore => "structstore",
            Opcode::Store => "store",
        };
        write!(f, "{op_str}")
    }
}
