//! LIR - x86-64 Code Generation Support
//!
//! The target model the assembly writer builds on:
//!
//! - Assembly instruction, operand and register definitions
//! - System V AMD64 calling convention and stack frame layout
//! - Text emission in GAS Intel syntax

pub mod asm;
pub mod abi;
pub mod emit;

pub use asm::{AsmInst, Cond, Section, Width, X86Operand, X86Reg};
pub use abi::{AbiError, CallingConvention, Frame, Location};
pub use emit::emit_program;
