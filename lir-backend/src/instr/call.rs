//! Function call lowering
//!
//! Arguments one to six go in rdi, rsi, rdx, rcx, r8 and r9; the rest are
//! pushed right to left with rsp kept 16-byte aligned at the call. `eax` is
//! zeroed for variadic callees and the result is left in `rax`.

use lir_codegen::{AsmInst, CallingConvention, Width, X86Operand};
use lir_ir::{Instruction, Operand};
use log::trace;
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;
use super::helpers::fits_i32;

impl FunctionLowerer<'_> {
    pub(crate) fn lower_call(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "call";
        let Some(callee) = instr.callee() else {
            return Err(self.missing_operand(opcode));
        };
        let args = instr.args();
        let reg_count = args.len().min(CallingConvention::MAX_REG_ARGS);
        let stack_args = &args[reg_count..];
        trace!("  call {callee}: {} register args, {} stack args", reg_count, stack_args.len());

        let rsp = X86Operand::qword(CallingConvention::STACK_PTR);
        let padding = if stack_args.len() % 2 == 1 { 8 } else { 0 };
        if padding != 0 {
            self.emit(AsmInst::Sub(rsp.clone(), X86Operand::Imm(padding)));
        }
        for arg in stack_args.iter().rev() {
            self.push_argument(arg, opcode)?;
        }

        for (i, arg) in args[..reg_count].iter().enumerate() {
            let reg = CallingConvention::arg_reg(i).map_err(|e| self.abi_error(e))?;
            self.load_into(reg, arg, Width::Qword, opcode)?;
        }

        let eax = X86Operand::reg(CallingConvention::RETURN_REG, Width::Dword);
        self.emit(AsmInst::Xor(eax.clone(), eax));
        self.emit(AsmInst::Call(callee.to_string()));

        let cleanup = 8 * stack_args.len() as i64 + padding;
        if cleanup != 0 {
            self.emit(AsmInst::Add(rsp, X86Operand::Imm(cleanup)));
        }

        if instr.dest.is_some() {
            let width = self.value_width(&instr.data_type, opcode)?;
            self.store_result(&instr.dest, CallingConvention::RETURN_REG, width, opcode)?;
        }
        Ok(())
    }

    fn push_argument(&mut self, arg: &Operand, opcode: &str) -> Result<(), CodegenError> {
        match arg {
            Operand::Imm(v) if fits_i32(*v) => self.emit(AsmInst::Push(X86Operand::Imm(*v))),
            _ => {
                self.load_into(CallingConvention::SCRATCH, arg, Width::Qword, opcode)?;
                self.emit(AsmInst::Push(X86Operand::qword(CallingConvention::SCRATCH)));
            }
        }
        Ok(())
    }
}
