//! Control flow lowering: returns and branches

use lir_codegen::{AsmInst, CallingConvention, Cond, X86Operand};
use lir_ir::{Instruction, Opcode, Operand};
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;
use super::helpers::widen;

impl FunctionLowerer<'_> {
    /// `ret ty value`: the value goes to eax/rax
    pub(crate) fn lower_return(&mut self, instr: &Instruction, is_last: bool) -> Result<(), CodegenError> {
        let opcode = "ret";
        let width = self.value_width(&instr.data_type, opcode)?;
        let value = self.required(&instr.src1, opcode)?;

        // HReg(0) is rax
        if *value != Operand::HReg(0) {
            self.load_into(CallingConvention::RETURN_REG, value, width, opcode)?;
        }
        self.emit_return_jump(is_last);
        Ok(())
    }

    /// `br label`
    pub(crate) fn lower_branch(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let target = self.branch_target(instr.src1.as_ref(), "br")?;
        self.emit(AsmInst::Jmp(target));
        Ok(())
    }

    /// `beq`/`bne`/`bgt`/`blt`/`bge`/`ble ty a, b, label`: compare and jump,
    /// falling through to the next block otherwise
    pub(crate) fn lower_cond_branch(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = instr.opcode.to_string();
        let width = self.int_width(&instr.data_type, &opcode)?;
        let lhs = self.required(&instr.src1, &opcode)?;
        let rhs = self.required(&instr.src2, &opcode)?;
        let target = self.branch_target(instr.src3.as_ref(), &opcode)?;

        self.load_into(CallingConvention::SCRATCH, lhs, width, &opcode)?;
        let rhs = self.rhs_operand(rhs, width, &opcode)?;
        self.emit(AsmInst::Cmp(X86Operand::reg(CallingConvention::SCRATCH, widen(width)), rhs));

        let cond = match instr.opcode {
            Opcode::Beq => Cond::E,
            Opcode::Bne => Cond::Ne,
            Opcode::Bgt => Cond::G,
            Opcode::Blt => Cond::L,
            Opcode::Bge => Cond::Ge,
            Opcode::Ble => Cond::Le,
            other => unreachable!("{other} is not a conditional branch"),
        };
        self.emit(AsmInst::Jcc(cond, target));
        Ok(())
    }
}
