//! System V AMD64 ABI Implementation
//!
//! This module implements the calling convention and the stack frame layout
//! used by the writer, including prologue and epilogue generation.

use crate::asm::{AsmInst, Width, X86Operand, X86Reg};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbiError {
    #[error("Too many arguments: {count} (maximum in registers: {max})")]
    TooManyArguments { count: usize, max: usize },

    #[error("No frame slot reserved for {class} register {index}")]
    UnreservedSlot { class: &'static str, index: u32 },

    #[error("Stack frame too large: {0} bytes")]
    FrameTooLarge(u64),
}

/// System V AMD64 Calling Convention
///
/// Register Usage:
/// - rdi, rsi, rdx, rcx, r8, r9: integer arguments, homed into the frame
/// - rax: return value, first general register
/// - rbx, r12, r13: general registers 1-3 (callee-saved)
/// - r14, r15: pointer registers (callee-saved)
/// - r10, r11: scratch
/// - rbp, rsp: frame and stack pointer
pub struct CallingConvention;

impl CallingConvention {
    pub const MAX_REG_ARGS: usize = 6;

    pub const ARG_REGS: [X86Reg; 6] = [
        X86Reg::Rdi, X86Reg::Rsi, X86Reg::Rdx, X86Reg::Rcx, X86Reg::R8, X86Reg::R9,
    ];

    /// Physical backing for general registers, by index
    pub const GENERAL_REGS: [X86Reg; 4] = [X86Reg::Rax, X86Reg::Rbx, X86Reg::R12, X86Reg::R13];

    /// Physical backing for pointer registers, by index
    pub const POINTER_REGS: [X86Reg; 2] = [X86Reg::R14, X86Reg::R15];

    pub const CALLEE_SAVED: [X86Reg; 5] = [
        X86Reg::Rbx, X86Reg::R12, X86Reg::R13, X86Reg::R14, X86Reg::R15,
    ];

    pub const RETURN_REG: X86Reg = X86Reg::Rax;
    pub const SCRATCH: X86Reg = X86Reg::R11;
    pub const SCRATCH2: X86Reg = X86Reg::R10;
    pub const FRAME_PTR: X86Reg = X86Reg::Rbp;
    pub const STACK_PTR: X86Reg = X86Reg::Rsp;

    pub const STACK_ALIGN: u32 = 16;
    pub const SLOT_SIZE: u32 = 8;

    /// Get the register for an argument index (0-based)
    pub fn arg_reg(index: usize) -> Result<X86Reg, AbiError> {
        Self::ARG_REGS.get(index).copied().ok_or(AbiError::TooManyArguments {
            count: index + 1,
            max: Self::MAX_REG_ARGS,
        })
    }

    pub fn is_callee_saved(reg: X86Reg) -> bool {
        Self::CALLEE_SAVED.contains(&reg)
    }
}

/// Where a general or pointer register index lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Reg(X86Reg),
    /// Frame slot at `[rbp-offset]`
    Slot(u32),
}

/// Stack Frame Layout
///
/// The frame grows down from rbp. Offsets are positive distances below rbp:
/// 1. Local variables (allocas), `[rbp-1]` .. `[rbp-locals_size]`
/// 2. Argument homes, one 8-byte slot per incoming argument register
/// 3. Save slots for the callee-saved registers the function uses
/// 4. Overflow slots for general registers beyond the physical pool
/// 5. Overflow slots for pointer registers beyond the physical pool
///
/// The total is rounded up to 16 bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub locals_size: u32,
    pub arg_count: usize,

    /// Callee-saved registers that need to be preserved
    pub saved_regs: Vec<X86Reg>,

    pub general_count: u32,
    pub pointer_count: u32,
}

impl Frame {
    /// Lay out a frame for a function with `arg_count` register arguments
    /// that uses `general_count` general and `pointer_count` pointer
    /// register indices.
    pub fn new(
        locals_size: u32,
        arg_count: usize,
        general_count: u32,
        pointer_count: u32,
    ) -> Result<Self, AbiError> {
        if arg_count > CallingConvention::MAX_REG_ARGS {
            return Err(AbiError::TooManyArguments {
                count: arg_count,
                max: CallingConvention::MAX_REG_ARGS,
            });
        }

        let used_general = CallingConvention::GENERAL_REGS
            .iter()
            .take(general_count as usize);
        let used_pointer = CallingConvention::POINTER_REGS
            .iter()
            .take(pointer_count as usize);
        let saved_regs = used_general
            .chain(used_pointer)
            .copied()
            .filter(|&r| CallingConvention::is_callee_saved(r))
            .collect();

        let frame = Self {
            locals_size,
            arg_count,
            saved_regs,
            general_count,
            pointer_count,
        };

        let total = frame.total_size_unchecked();
        if total > i32::MAX as u64 {
            return Err(AbiError::FrameTooLarge(total));
        }
        Ok(frame)
    }

    /// Total frame size below rbp, 16-byte aligned
    pub fn total_size(&self) -> u32 {
        self.total_size_unchecked() as u32
    }

    /// Home slot of incoming argument `index`
    pub fn arg_home(&self, index: usize) -> Result<u32, AbiError> {
        if index >= self.arg_count {
            return Err(AbiError::TooManyArguments {
                count: index + 1,
                max: self.arg_count,
            });
        }
        Ok(self.homes_base() + CallingConvention::SLOT_SIZE * (index as u32 + 1))
    }

    /// Save slot of a callee-saved register, if the frame preserves it
    pub fn save_slot(&self, reg: X86Reg) -> Option<u32> {
        let pos = self.saved_regs.iter().position(|&r| r == reg)?;
        Some(self.saves_base() + CallingConvention::SLOT_SIZE * (pos as u32 + 1))
    }

    /// Location of general register `index`
    pub fn general_location(&self, index: u32) -> Result<Location, AbiError> {
        if let Some(&reg) = CallingConvention::GENERAL_REGS.get(index as usize) {
            return Ok(Location::Reg(reg));
        }
        if index >= self.general_count {
            return Err(AbiError::UnreservedSlot { class: "general", index });
        }
        let overflow = index - CallingConvention::GENERAL_REGS.len() as u32;
        Ok(Location::Slot(self.general_overflow_base() + CallingConvention::SLOT_SIZE * (overflow + 1)))
    }

    /// Location of pointer register `index`
    pub fn pointer_location(&self, index: u32) -> Result<Location, AbiError> {
        if let Some(&reg) = CallingConvention::POINTER_REGS.get(index as usize) {
            return Ok(Location::Reg(reg));
        }
        if index >= self.pointer_count {
            return Err(AbiError::UnreservedSlot { class: "pointer", index });
        }
        let overflow = index - CallingConvention::POINTER_REGS.len() as u32;
        Ok(Location::Slot(self.pointer_overflow_base() + CallingConvention::SLOT_SIZE * (overflow + 1)))
    }

    /// Generate function prologue
    ///
    /// The prologue:
    /// 1. Saves the old frame pointer and sets up the new one
    /// 2. Allocates the frame
    /// 3. Saves callee registers
    /// 4. Homes the incoming argument registers
    pub fn gen_prologue(&self) -> Vec<AsmInst> {
        let mut code = vec![
            AsmInst::Push(X86Operand::qword(CallingConvention::FRAME_PTR)),
            AsmInst::Mov(
                X86Operand::qword(CallingConvention::FRAME_PTR),
                X86Operand::qword(CallingConvention::STACK_PTR),
            ),
            AsmInst::Sub(
                X86Operand::qword(CallingConvention::STACK_PTR),
                X86Operand::Imm(self.total_size() as i64),
            ),
        ];

        for (i, &reg) in self.saved_regs.iter().enumerate() {
            let slot = self.saves_base() + CallingConvention::SLOT_SIZE * (i as u32 + 1);
            code.push(AsmInst::Mov(
                X86Operand::frame_slot(slot, Width::Qword),
                X86Operand::qword(reg),
            ));
        }

        for (i, &reg) in CallingConvention::ARG_REGS.iter().take(self.arg_count).enumerate() {
            let slot = self.homes_base() + CallingConvention::SLOT_SIZE * (i as u32 + 1);
            code.push(AsmInst::Mov(
                X86Operand::frame_slot(slot, Width::Qword),
                X86Operand::qword(reg),
            ));
        }

        code
    }

    /// Generate function epilogue
    ///
    /// Restores callee registers, then tears the frame down with `leave`.
    pub fn gen_epilogue(&self) -> Vec<AsmInst> {
        let mut code = Vec::new();

        for (i, &reg) in self.saved_regs.iter().enumerate() {
            let slot = self.saves_base() + CallingConvention::SLOT_SIZE * (i as u32 + 1);
            code.push(AsmInst::Mov(
                X86Operand::qword(reg),
                X86Operand::frame_slot(slot, Width::Qword),
            ));
        }

        code.push(AsmInst::Leave);
        code.push(AsmInst::Ret);
        code
    }

    fn homes_base(&self) -> u32 {
        align_to(self.locals_size, CallingConvention::SLOT_SIZE)
    }

    fn saves_base(&self) -> u32 {
        self.homes_base() + CallingConvention::SLOT_SIZE * self.arg_count as u32
    }

    fn general_overflow_base(&self) -> u32 {
        self.saves_base() + CallingConvention::SLOT_SIZE * self.saved_regs.len() as u32
    }

    fn general_overflow(&self) -> u32 {
        self.general_count
            .saturating_sub(CallingConvention::GENERAL_REGS.len() as u32)
    }

    fn pointer_overflow_base(&self) -> u32 {
        self.general_overflow_base() + CallingConvention::SLOT_SIZE * self.general_overflow()
    }

    fn pointer_overflow(&self) -> u32 {
        self.pointer_count
            .saturating_sub(CallingConvention::POINTER_REGS.len() as u32)
    }

    fn total_size_unchecked(&self) -> u64 {
        let used = self.pointer_overflow_base() as u64
            + CallingConvention::SLOT_SIZE as u64 * self.pointer_overflow() as u64;
        used.div_ceil(CallingConvention::STACK_ALIGN as u64) * CallingConvention::STACK_ALIGN as u64
    }
}

fn align_to(offset: u32, align: u32) -> u32 {
    offset.div_ceil(align) * align
}
