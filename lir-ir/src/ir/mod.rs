//! Intermediate Representation
//!
//! ## Architecture
//!
//! The module is structured as follows:
//! - `types` - Value descriptors (Type)
//! - `operand` - Tagged operand values, virtual and hardware
//! - `ops` - The opcode set
//! - `instructions` - Instructions and function calls
//! - `blocks` - Basic blocks
//! - `function` - Function definitions and linkage
//! - `module` - The top-level compilation unit
//! - `builder` - IR construction API with build-time constant folding
//!
//! Ownership is a strict tree: Module owns Functions, which own Blocks, which
//! own Instructions, which own their Operands. Everything that refers across
//! the tree (labels, registers, strings) does so by name.

// Public exports - clean API surface
pub use self::types::Type;
pub use self::operand::{Operand, StringPtr};
pub use self::ops::Opcode;
pub use self::instructions::{Instruction, FunctionCall};
pub use self::blocks::Block;
pub use self::function::{Function, Linkage};
pub use self::module::Module;
pub use self::builder::IrBuilder;

// Internal modules
mod types;
mod operand;
mod ops;
mod instructions;
mod blocks;
mod function;
mod module;
mod builder;
