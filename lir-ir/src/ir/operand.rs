//! IR Operands
//!
//! Operands are small tagged values copied by value. The first four variants
//! are produced by the builder; `Mem`, `HReg`, `AReg` and `PReg` are hardware
//! operands that only the lowering pass creates.

use lir_common::RegName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A global string constant, registered once on the module and referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringPtr {
    pub name: String,
    pub value: String,
}

/// IR Operand
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// Immediate constant
    Imm(i64),

    /// Virtual register
    Reg(RegName),

    /// Block label, by name
    Label(String),

    /// Reference to a module string constant
    StringPtr(StringPtr),

    /// Stack slot of an alloca, with its frame offset (`[rbp - offset]`)
    Mem { name: RegName, offset: u32 },

    /// General register index
    HReg(u32),

    /// Argument register index
    AReg(u32),

    /// Pointer register index
    PReg(u32),
}

impl Operand {
    pub fn as_imm(&self) -> Option<i64> {
        match self {
            Operand::Imm(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_virtual_reg(&self) -> bool {
        matches!(self, Operand::Reg(_))
    }

    pub fn reg_name(&self) -> Option<&RegName> {
        match self {
            Operand::Reg(name) => Some(name),
            _ => None,
        }
    }

    /// True for the operands only the lowering pass produces
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            Operand::Mem { .. } | Operand::HReg(_) | Operand::AReg(_) | Operand::PReg(_)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Imm(v) => write!(f, "{v}"),
            Operand::Reg(name) => write!(f, "%{name}"),
            Operand::Label(name) => write!(f, "{name}"),
            Operand::StringPtr(ptr) => write!(f, "@{}", ptr.name),
            Operand::Mem { name, offset } => write!(f, "[%{name} @ -{offset}]"),
            Operand::HReg(n) => write!(f, "$h{n}"),
            Operand::AReg(n) => write!(f, "$a{n}"),
            Operand::PReg(n) => write!(f, "$p{n}"),
        }
    }
}
