//! LIR - Backend
//!
//! This crate writes lowered IR modules as x86-64 assembly (GAS, Intel
//! syntax, System V calling convention). The result is a text file ready for
//! an external assembler and linker.

pub mod error;
pub mod naming;
pub mod lower;
mod instr;

pub use error::CodegenError;
pub use lower::{lower_function, lower_module_to_asm, write_module};

// Re-export the pieces callers need alongside the writer
pub use lir_codegen::{emit_program, AsmInst};
pub use lir_ir::{lower_module, LoweredModule, Module};

#[cfg(test)]
mod tests;
