//! Memory instruction lowering: loads, stores, struct fields and GEP

use lir_codegen::{AsmInst, CallingConvention, Location, Width, X86Operand};
use lir_ir::{Instruction, Operand, Type};
use log::trace;
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;
use super::helpers::{fits_i32, location_operand, truncate_imm};

impl FunctionLowerer<'_> {
    /// `dest = load ty src`
    pub(crate) fn lower_load(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "load";
        let width = self.value_width(&instr.data_type, opcode)?;
        let src = self.required(&instr.src1, opcode)?;
        let mem = self.address_of(src, 0, width, opcode)?;
        self.load_to_dest(&instr.dest, mem, width, opcode)
    }

    /// `store ty value, dest`
    pub(crate) fn lower_store(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "store";
        let width = self.value_width(&instr.data_type, opcode)?;
        let value = self.required(&instr.src1, opcode)?;
        let dest = self.required(&instr.src2, opcode)?;
        let mem = self.address_of(dest, 0, width, opcode)?;
        self.store_value(mem, value, width, opcode)
    }

    /// `dest = structload %struct src, index`
    pub(crate) fn lower_struct_load(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "structload";
        let (offset, width) = self.field_layout(&instr.data_type, &instr.src2, opcode)?;
        let src = self.required(&instr.src1, opcode)?;
        let mem = self.address_of(src, offset, width, opcode)?;
        self.load_to_dest(&instr.dest, mem, width, opcode)
    }

    /// `structstore %struct ptr, index, value`
    pub(crate) fn lower_struct_store(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "structstore";
        let (offset, width) = self.field_layout(&instr.data_type, &instr.src2, opcode)?;
        let ptr = self.required(&instr.src1, opcode)?;
        let value = self.required(&instr.src3, opcode)?;
        let mem = self.address_of(ptr, offset, width, opcode)?;
        self.store_value(mem, value, width, opcode)
    }

    /// `dest = getelementptr ty ptr, index`, i.e. `ptr + index * size(ty)`
    pub(crate) fn lower_gep(&mut self, instr: &Instruction) -> Result<(), CodegenError> {
        let opcode = "getelementptr";
        let elem_size = instr.data_type.size_in_bytes() as i64;
        let ptr = self.required(&instr.src1, opcode)?;
        let index = self.required(&instr.src2, opcode)?;

        let scratch = X86Operand::qword(CallingConvention::SCRATCH);
        self.load_into(CallingConvention::SCRATCH, ptr, Width::Qword, opcode)?;

        match index {
            Operand::Imm(i) => {
                let disp = i.wrapping_mul(elem_size);
                if disp != 0 {
                    let rhs = self.rhs_operand(&Operand::Imm(disp), Width::Qword, opcode)?;
                    self.emit(AsmInst::Add(scratch.clone(), rhs));
                }
            }
            _ => {
                let index_reg = X86Operand::qword(CallingConvention::SCRATCH2);
                self.load_into(CallingConvention::SCRATCH2, index, Width::Qword, opcode)?;
                if elem_size != 1 {
                    self.emit(AsmInst::Imul3(index_reg.clone(), index_reg.clone(), elem_size));
                }
                self.emit(AsmInst::Add(scratch, index_reg));
            }
        }

        self.store_result(&instr.dest, CallingConvention::SCRATCH, Width::Qword, opcode)
    }

    /// Byte offset and width of the struct field selected by `index`
    fn field_layout(&self, ty: &Type, index: &Option<Operand>, opcode: &str) -> Result<(u32, Width), CodegenError> {
        let index = match self.required(index, opcode)? {
            Operand::Imm(i) if *i >= 0 => *i as usize,
            other => return Err(self.unsupported_operand(opcode, other)),
        };
        let (Some(offset), Some(field)) = (ty.field_offset(index), ty.field_type(index)) else {
            return Err(self.unsupported_type(ty, opcode));
        };
        trace!("  field {index} of {ty} at +{offset}");
        let width = self.value_width(field, opcode)?;
        Ok((offset, width))
    }

    /// Load from memory into the destination, directly when it is a register
    fn load_to_dest(&mut self, dest: &Option<Operand>, mem: X86Operand, width: Width, opcode: &str) -> Result<(), CodegenError> {
        let dest_op = self.required(dest, opcode)?;
        match self.value_location(dest_op, opcode)? {
            Location::Reg(reg) => {
                self.load_from(reg, mem, width);
                Ok(())
            }
            Location::Slot(_) => {
                self.load_from(CallingConvention::SCRATCH, mem, width);
                self.store_result(dest, CallingConvention::SCRATCH, width, opcode)
            }
        }
    }

    /// Store `value` to a memory operand of `width`
    fn store_value(&mut self, mem: X86Operand, value: &Operand, width: Width, opcode: &str) -> Result<(), CodegenError> {
        match value {
            Operand::Imm(v) if fits_i32(truncate_imm(*v, width)) => {
                self.emit(AsmInst::Mov(mem, X86Operand::Imm(truncate_imm(*v, width))));
            }
            Operand::HReg(_) | Operand::PReg(_) => match self.value_location(value, opcode)? {
                Location::Reg(reg) => self.emit(AsmInst::Mov(mem, X86Operand::reg(reg, width))),
                loc @ Location::Slot(_) => {
                    let tmp = X86Operand::reg(CallingConvention::SCRATCH2, width);
                    self.emit(AsmInst::Mov(tmp.clone(), location_operand(loc, width)));
                    self.emit(AsmInst::Mov(mem, tmp));
                }
            },
            _ => {
                self.load_into(CallingConvention::SCRATCH2, value, width, opcode)?;
                self.emit(AsmInst::Mov(mem, X86Operand::reg(CallingConvention::SCRATCH2, width)));
            }
        }
        Ok(())
    }
}
