//! Storage Classification
//!
//! Rewrites every virtual register of a module into a hardware operand:
//! alloca results become frame slots, GEP results pointer registers,
//! arguments argument registers and everything else general registers.
//! No liveness analysis is done. The general-register counter restarts at
//! each call and store, which keeps indices small for the code shapes the
//! front end produces.

use std::ops::Deref;
use log::debug;
use thiserror::Error;
use lir_common::{CompilerError, RegName};
use crate::ir::{Function, Module};
use self::context::ClassifierContext;

mod context;

#[cfg(test)]
mod tests;

/// Errors raised by the lowering pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error("module '{module}' has already been lowered")]
    AlreadyLowered { module: String },

    #[error("register %{reg} in {function}:{block} was never defined")]
    UnresolvedRegister {
        function: String,
        block: String,
        reg: RegName,
    },
}

impl From<LowerError> for CompilerError {
    fn from(err: LowerError) -> Self {
        match &err {
            LowerError::AlreadyLowered { .. } => CompilerError::InternalError {
                message: err.to_string(),
            },
            LowerError::UnresolvedRegister { function, .. } => {
                CompilerError::lowering_error(function.clone(), err.to_string())
            }
        }
    }
}

/// A module that has been through the lowering pass.
///
/// Only `lower_module` creates one, so holding a `LoweredModule` means every
/// operand is a hardware operand, an immediate, a label or a string.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredModule {
    module: Module,
}

impl LoweredModule {
    pub fn into_inner(self) -> Module {
        self.module
    }
}

impl Deref for LoweredModule {
    type Target = Module;

    fn deref(&self) -> &Module {
        &self.module
    }
}

/// Classify every virtual register in the module.
///
/// Extern functions are skipped. Fails if the module was already lowered or
/// if some register is used without ever being defined.
pub fn lower_module(mut module: Module) -> Result<LoweredModule, LowerError> {
    if module.lowered {
        return Err(LowerError::AlreadyLowered { module: module.name });
    }

    for function in module.functions.iter_mut() {
        if function.is_extern() {
            debug!("Skipping extern function '{}'", function.name);
            continue;
        }
        lower_function(function)?;
    }

    module.lowered = true;
    Ok(LoweredModule { module })
}

fn lower_function(function: &mut Function) -> Result<(), LowerError> {
    let mut ctx = ClassifierContext::for_function(function);

    for block in function.blocks.iter_mut() {
        for instr in block.instructions.iter_mut() {
            ctx.classify(instr);
        }
    }
    function.stack_size = ctx.stack_size();

    debug!(
        "Lowered '{}': {} slots ({} bytes), {} general, {} pointer, {} args",
        function.name,
        ctx.slot_count(),
        function.stack_size,
        ctx.general_count(),
        ctx.pointer_count(),
        function.arg_count()
    );

    verify_function(function)
}

/// Every operand must have been resolved
fn verify_function(function: &Function) -> Result<(), LowerError> {
    for block in &function.blocks {
        for instr in &block.instructions {
            if let Some(reg) = instr.all_operands().find_map(|op| op.reg_name()) {
                return Err(LowerError::UnresolvedRegister {
                    function: function.name.clone(),
                    block: block.name.clone(),
                    reg: reg.clone(),
                });
            }
        }
    }
    Ok(())
}
