//! Arithmetic instruction lowering
//!
//! Results are computed in `r11` and then written to the destination.
//! Division goes through `rdx:rax`; `rax` is preserved around it unless it
//! is the destination. Unsigned division zero-extends narrow operands.

use lir_codegen::{AsmInst, CallingConvention, Location, Width, X86Operand, X86Reg};
use lir_ir::{Instruction, Opcode};
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;
use super::helpers::widen;

impl FunctionLowerer<'_> {
    /// add, sub, smul, umul, and, or, xor
    pub(crate) fn lower_binary(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = instr.opcode.to_string();
        let width = self.int_width(&instr.data_type, &opcode)?;
        let lhs = self.required(&instr.src1, &opcode)?;
        let rhs = self.required(&instr.src2, &opcode)?;

        let acc = X86Operand::reg(CallingConvention::SCRATCH, widen(width));
        self.load_into(CallingConvention::SCRATCH, lhs, width, &opcode)?;
        let rhs = self.rhs_operand(rhs, width, &opcode)?;

        let inst = match instr.opcode {
            Opcode::Add => AsmInst::Add(acc, rhs),
            Opcode::Sub => AsmInst::Sub(acc, rhs),
            Opcode::SMul | Opcode::UMul => match rhs {
                X86Operand::Imm(imm) => AsmInst::Imul3(acc.clone(), acc, imm),
                rhs => AsmInst::Imul(acc, rhs),
            },
            Opcode::And => AsmInst::And(acc, rhs),
            Opcode::Or => AsmInst::Or(acc, rhs),
            Opcode::Xor => AsmInst::Xor(acc, rhs),
            other => unreachable!("{other} is not a two-operand arithmetic instruction"),
        };
        self.emit(inst);
        self.normalize(CallingConvention::SCRATCH, width);
        self.store_result(&instr.dest, CallingConvention::SCRATCH, width, &opcode)
    }

    /// sdiv, udiv, srem, urem
    pub(crate) fn lower_division(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = instr.opcode.to_string();
        let width = self.int_width(&instr.data_type, &opcode)?;
        let wide = widen(width);
        let dividend = self.required(&instr.src1, &opcode)?;
        let divisor = self.required(&instr.src2, &opcode)?;
        let dest = self.required(&instr.dest, &opcode)?;

        let preserve_rax = self.value_location(dest, &opcode)? != Location::Reg(X86Reg::Rax);
        let rax = X86Operand::qword(X86Reg::Rax);
        if preserve_rax {
            self.emit(AsmInst::Push(rax.clone()));
        }

        let signed = matches!(instr.opcode, Opcode::SDiv | Opcode::SRem);
        if signed {
            self.load_into(CallingConvention::SCRATCH, divisor, width, &opcode)?;
            self.load_into(X86Reg::Rax, dividend, width, &opcode)?;
        } else {
            self.load_into_unsigned(CallingConvention::SCRATCH, divisor, width, &opcode)?;
            self.load_into_unsigned(X86Reg::Rax, dividend, width, &opcode)?;
        }

        let divisor = X86Operand::reg(CallingConvention::SCRATCH, wide);
        if signed {
            self.emit(if wide == Width::Qword { AsmInst::Cqo } else { AsmInst::Cdq });
            self.emit(AsmInst::Idiv(divisor));
        } else {
            let edx = X86Operand::reg(X86Reg::Rdx, Width::Dword);
            self.emit(AsmInst::Xor(edx.clone(), edx));
            self.emit(AsmInst::Div(divisor));
        }

        let result = match instr.opcode {
            Opcode::SDiv | Opcode::UDiv => X86Reg::Rax,
            _ => X86Reg::Rdx,
        };
        self.emit(AsmInst::Mov(
            X86Operand::reg(CallingConvention::SCRATCH, wide),
            X86Operand::reg(result, wide),
        ));
        if preserve_rax {
            self.emit(AsmInst::Pop(rax));
        }

        self.normalize(CallingConvention::SCRATCH, width);
        self.store_result(&instr.dest, CallingConvention::SCRATCH, width, &opcode)
    }

    /// not, neg
    pub(crate) fn lower_unary(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = instr.opcode.to_string();
        let width = self.int_width(&instr.data_type, &opcode)?;
        let src = self.required(&instr.src1, &opcode)?;

        self.load_into(CallingConvention::SCRATCH, src, width, &opcode)?;
        let acc = X86Operand::reg(CallingConvention::SCRATCH, widen(width));
        self.emit(match instr.opcode {
            Opcode::Neg => AsmInst::Neg(acc),
            _ => AsmInst::Not(acc),
        });
        self.normalize(CallingConvention::SCRATCH, width);
        self.store_result(&instr.dest, CallingConvention::SCRATCH, width, &opcode)
    }
}
