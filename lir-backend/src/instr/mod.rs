//! Instruction lowering
//!
//! One `impl FunctionLowerer` block per instruction family; `lower_instruction`
//! dispatches on the opcode.

use lir_ir::{Instruction, Opcode};
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;

pub(crate) mod helpers;
mod memory;
mod arithmetic;
mod control_flow;
mod call;

impl FunctionLowerer<'_> {
    pub(crate) fn lower_instruction(&mut self, instr: &Instruction, is_last: bool) -> Result<(), CodegenError> {
        match instr.opcode {
            Opcode::Ret => self.lower_return(instr, is_last)?,
            Opcode::RetVoid => self.emit_return_jump(is_last),

            // Slots are part of the frame
            Opcode::Alloca => {}

            Opcode::Load => self.lower_load(instr)?,
            Opcode::Store => self.lower_store(instr)?,
            Opcode::StructLoad => self.lower_struct_load(instr)?,
            Opcode::StructStore => self.lower_struct_store(instr)?,
            Opcode::GEP => self.lower_gep(instr)?,

            Opcode::Add
            | Opcode::Sub
            | Opcode::SMul
            | Opcode::UMul
            | Opcode::And
            | Opcode::Or
            | Opcode::Xor => self.lower_binary(instr)?,

            Opcode::SDiv | Opcode::UDiv | Opcode::SRem | Opcode::URem => self.lower_division(instr)?,

            Opcode::Not | Opcode::Neg => self.lower_unary(instr)?,

            Opcode::Br => self.lower_branch(instr)?,
            Opcode::Beq
            | Opcode::Bne
            | Opcode::Bgt
            | Opcode::Blt
            | Opcode::Bge
            | Opcode::Ble => self.lower_cond_branch(instr)?,

            Opcode::Call => self.lower_call(instr)?,
        }

        Ok(())
    }
}
