//! LIR - Intermediate Representation
//!
//! This crate defines the target-independent IR, the builder used to
//! construct it, and the lowering pass that classifies every virtual
//! register into a concrete storage class before the assembly writer runs.

pub mod ir;
pub mod lower;

pub use ir::{
    Type, Operand, StringPtr, Opcode, Instruction, FunctionCall,
    Block, Function, Linkage, Module, IrBuilder
};
pub use lower::{lower_module, LowerError, LoweredModule};
pub use lir_common::{BlockId, RegName};
