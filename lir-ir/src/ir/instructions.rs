//! IR Instructions
//!
//! An instruction is an opcode, a result data type, an optional destination
//! and up to three source operands. A function call additionally carries the
//! callee name and its ordered argument list.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{Opcode, Operand, Type};

/// Callee and arguments of a `Call` instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub callee: String,
    pub args: Vec<Operand>,
}

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub data_type: Type,
    pub dest: Option<Operand>,
    pub src1: Option<Operand>,
    pub src2: Option<Operand>,
    pub src3: Option<Operand>,
    /// Present exactly when `opcode` is `Call`
    pub call: Option<FunctionCall>,
}

impl Instruction {
    pub fn new(opcode: Opcode, data_type: Type) -> Self {
        Self {
            opcode,
            data_type,
            dest: None,
            src1: None,
            src2: None,
            src3: None,
            call: None,
        }
    }

    /// Build a call instruction
    pub fn call(callee: impl Into<String>, args: Vec<Operand>, data_type: Type) -> Self {
        Self {
            call: Some(FunctionCall {
                callee: callee.into(),
                args,
            }),
            ..Self::new(Opcode::Call, data_type)
        }
    }

    pub fn with_dest(mut self, dest: Operand) -> Self {
        self.dest = Some(dest);
        self
    }

    pub fn with_src1(mut self, op: Operand) -> Self {
        self.src1 = Some(op);
        self
    }

    pub fn with_src2(mut self, op: Operand) -> Self {
        self.src2 = Some(op);
        self
    }

    pub fn with_src3(mut self, op: Operand) -> Self {
        self.src3 = Some(op);
        self
    }

    pub fn is_call(&self) -> bool {
        self.call.is_some()
    }

    pub fn callee(&self) -> Option<&str> {
        self.call.as_ref().map(|c| c.callee.as_str())
    }

    /// Call arguments, empty for anything but a call
    pub fn args(&self) -> &[Operand] {
        self.call.as_ref().map(|c| c.args.as_slice()).unwrap_or(&[])
    }

    /// Present source operands in slot order
    pub fn sources(&self) -> impl Iterator<Item = &Operand> {
        [&self.src1, &self.src2, &self.src3]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    pub fn sources_mut(&mut self) -> impl Iterator<Item = &mut Operand> {
        [&mut self.src1, &mut self.src2, &mut self.src3]
            .into_iter()
            .filter_map(Option::as_mut)
    }

    /// Every operand the instruction holds: destination, sources and call arguments
    pub fn all_operands(&self) -> impl Iterator<Item = &Operand> {
        self.dest.iter().chain(self.sources()).chain(self.args().iter())
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = &self.dest {
            write!(f, "{dest} = ")?;
        }
        write!(f, "{}", self.opcode)?;

        match self.opcode {
            Opcode::Br | Opcode::RetVoid => {}
            _ => write!(f, " {}", self.data_type)?,
        }

        if let Some(call) = &self.call {
            write!(f, " @{}(", call.callee)?;
            for (i, arg) in call.args.iter().enumerate() {
                if i > 0 { write!(f, ", ")?; }
                write!(f, "{arg}")?;
            }
            return write!(f, ")");
        }

        for (i, op) in self.sources().enumerate() {
            if i == 0 {
                write!(f, " {op}")?;
            } else {
                write!(f, ", {op}")?;
            }
        }
        Ok(())
    }
}
