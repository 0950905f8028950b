//! Lowering Module - Integrates All Lowering Components
//!
//! Turns a lowered IR module into x86-64 assembly. `module` handles the file
//! layout and directives, `function` the frame and block structure; the
//! per-instruction work lives in `crate::instr`.

mod module;
mod function;

pub use module::{lower_module_to_asm, write_module};
pub use function::lower_function;

pub(crate) use function::FunctionLowerer;
