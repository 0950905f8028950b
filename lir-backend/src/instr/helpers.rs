//! Common helper functions for instruction lowering
//!
//! Operand resolution shared by every instruction: where a hardware operand
//! lives, how to get its value into a register and how to write a result
//! back. `r11` is the primary scratch register and `r10` the secondary one.

use lir_codegen::{AsmInst, CallingConvention, Location, Width, X86Operand, X86Reg};
use lir_ir::{Operand, Type};
use crate::error::CodegenError;
use crate::lower::FunctionLowerer;

/// Values narrower than 32 bits are kept sign-extended in 32-bit registers
pub(crate) fn widen(width: Width) -> Width {
    match width {
        Width::Byte | Width::Word => Width::Dword,
        wide => wide,
    }
}

pub(crate) fn is_narrow(width: Width) -> bool {
    widen(width) != width
}

/// Truncate an immediate to what an instruction of `width` can encode
pub(crate) fn truncate_imm(value: i64, width: Width) -> i64 {
    match width {
        Width::Byte => value as i8 as i64,
        Width::Word => value as i16 as i64,
        Width::Dword => value as i32 as i64,
        Width::Qword => value,
    }
}

/// Low `width` bits of an immediate, read as unsigned
pub(crate) fn zero_extend_imm(value: i64, width: Width) -> i64 {
    match width {
        Width::Byte => value as u8 as i64,
        Width::Word => value as u16 as i64,
        Width::Dword => value as u32 as i64,
        Width::Qword => value,
    }
}

pub(crate) fn fits_i32(value: i64) -> bool {
    i32::try_from(value).is_ok()
}

pub(crate) fn location_operand(loc: Location, width: Width) -> X86Operand {
    match loc {
        Location::Reg(reg) => X86Operand::reg(reg, width),
        Location::Slot(offset) => X86Operand::frame_slot(offset, width),
    }
}

impl FunctionLowerer<'_> {
    /// Required operand slot of an instruction
    pub(crate) fn required<'i>(&self, op: &'i Option<Operand>, opcode: &str) -> Result<&'i Operand, CodegenError> {
        op.as_ref().ok_or_else(|| self.missing_operand(opcode))
    }

    /// Width of a value of type `ty`
    pub(crate) fn value_width(&self, ty: &Type, opcode: &str) -> Result<Width, CodegenError> {
        let width = match ty {
            Type::Struct { .. } => None,
            _ => Width::from_bytes(ty.size_in_bytes()),
        };
        width.ok_or_else(|| self.unsupported_type(ty, opcode))
    }

    /// Width of an integer operation; float arithmetic is not supported
    pub(crate) fn int_width(&self, ty: &Type, opcode: &str) -> Result<Width, CodegenError> {
        if ty.is_float() {
            return Err(self.unsupported_type(ty, opcode));
        }
        self.value_width(ty, opcode)
    }

    pub(crate) fn unsupported_type(&self, ty: &Type, opcode: &str) -> CodegenError {
        CodegenError::UnsupportedType {
            function: self.function.name.clone(),
            opcode: opcode.to_string(),
            ty: ty.to_string(),
        }
    }

    /// Where a general, pointer or argument register lives
    pub(crate) fn value_location(&self, op: &Operand, opcode: &str) -> Result<Location, CodegenError> {
        match op {
            Operand::HReg(i) => self.frame.general_location(*i).map_err(|e| self.abi_error(e)),
            Operand::PReg(i) => self.frame.pointer_location(*i).map_err(|e| self.abi_error(e)),
            Operand::AReg(i) => {
                let home = self.frame.arg_home(*i as usize).map_err(|e| self.abi_error(e))?;
                Ok(Location::Slot(home))
            }
            other => Err(self.unsupported_operand(opcode, other)),
        }
    }

    /// Put the value of `op` into `reg`.
    ///
    /// Slot operands yield their address, strings their RIP-relative
    /// address. Narrow values are sign-extended into the 32-bit register.
    pub(crate) fn load_into(&mut self, reg: X86Reg, op: &Operand, width: Width, opcode: &str) -> Result<(), CodegenError> {
        let wide = widen(width);
        match op {
            Operand::Imm(v) => {
                self.emit(AsmInst::Mov(X86Operand::reg(reg, wide), X86Operand::Imm(truncate_imm(*v, wide))));
            }
            Operand::Mem { offset, .. } => {
                self.emit(AsmInst::Lea(X86Operand::qword(reg), X86Operand::frame_addr(*offset)));
            }
            Operand::StringPtr(ptr) => {
                self.emit(AsmInst::Lea(X86Operand::qword(reg), X86Operand::RipRel(ptr.name.clone())));
            }
            _ => {
                let loc = self.value_location(op, opcode)?;
                if loc == Location::Reg(reg) && !is_narrow(width) {
                    return Ok(());
                }
                self.load_from(reg, location_operand(loc, width), width);
            }
        }
        Ok(())
    }

    /// Like `load_into`, but narrow values are zero-extended into the 32-bit
    /// register. Used where the operation reads its operands as unsigned.
    pub(crate) fn load_into_unsigned(&mut self, reg: X86Reg, op: &Operand, width: Width, opcode: &str) -> Result<(), CodegenError> {
        if !is_narrow(width) {
            return self.load_into(reg, op, width, opcode);
        }
        let dst = X86Operand::reg(reg, Width::Dword);
        match op {
            Operand::Imm(v) => {
                self.emit(AsmInst::Mov(dst, X86Operand::Imm(zero_extend_imm(*v, width))));
            }
            Operand::HReg(_) | Operand::PReg(_) | Operand::AReg(_) => {
                let loc = self.value_location(op, opcode)?;
                self.emit(AsmInst::Movzx(dst, location_operand(loc, width)));
            }
            _ => return Err(self.unsupported_operand(opcode, op)),
        }
        Ok(())
    }

    /// `mov`, or `movsx` for narrow values, from a register or memory source
    pub(crate) fn load_from(&mut self, reg: X86Reg, src: X86Operand, width: Width) {
        if is_narrow(width) {
            self.emit(AsmInst::Movsx(X86Operand::reg(reg, Width::Dword), src));
        } else {
            self.emit(AsmInst::Mov(X86Operand::reg(reg, width), src));
        }
    }

    /// Right-hand operand of a two-operand instruction whose left side is a
    /// register of `widen(width)`
    pub(crate) fn rhs_operand(&mut self, op: &Operand, width: Width, opcode: &str) -> Result<X86Operand, CodegenError> {
        let wide = widen(width);
        match op {
            Operand::Imm(v) if fits_i32(truncate_imm(*v, wide)) => Ok(X86Operand::Imm(truncate_imm(*v, wide))),
            Operand::HReg(_) | Operand::PReg(_) | Operand::AReg(_) if !is_narrow(width) => {
                let loc = self.value_location(op, opcode)?;
                Ok(location_operand(loc, wide))
            }
            _ => {
                self.load_into(CallingConvention::SCRATCH2, op, width, opcode)?;
                Ok(X86Operand::reg(CallingConvention::SCRATCH2, wide))
            }
        }
    }

    /// Memory operand `disp` bytes past the address held by `ptr`
    pub(crate) fn address_of(&mut self, ptr: &Operand, disp: u32, width: Width, opcode: &str) -> Result<X86Operand, CodegenError> {
        match ptr {
            Operand::Mem { offset, .. } => {
                Ok(X86Operand::deref(X86Reg::Rbp, disp as i32 - *offset as i32, width))
            }
            Operand::StringPtr(_) => {
                self.load_into(CallingConvention::SCRATCH, ptr, Width::Qword, opcode)?;
                Ok(X86Operand::deref(CallingConvention::SCRATCH, disp as i32, width))
            }
            _ => match self.value_location(ptr, opcode)? {
                Location::Reg(reg) => Ok(X86Operand::deref(reg, disp as i32, width)),
                Location::Slot(offset) => {
                    self.emit(AsmInst::Mov(
                        X86Operand::qword(CallingConvention::SCRATCH),
                        X86Operand::frame_slot(offset, Width::Qword),
                    ));
                    Ok(X86Operand::deref(CallingConvention::SCRATCH, disp as i32, width))
                }
            },
        }
    }

    /// Write the value in `src` to the destination operand
    pub(crate) fn store_result(&mut self, dest: &Option<Operand>, src: X86Reg, width: Width, opcode: &str) -> Result<(), CodegenError> {
        let dest = self.required(dest, opcode)?;
        let loc = self.value_location(dest, opcode)?;
        if loc == Location::Reg(src) {
            return Ok(());
        }
        let wide = widen(width);
        self.emit(AsmInst::Mov(location_operand(loc, wide), X86Operand::reg(src, wide)));
        Ok(())
    }

    /// Re-normalise a narrow result to its sign-extended 32-bit form
    pub(crate) fn normalize(&mut self, reg: X86Reg, width: Width) {
        if is_narrow(width) {
            self.emit(AsmInst::Movsx(X86Operand::reg(reg, Width::Dword), X86Operand::reg(reg, width)));
        }
    }
}
