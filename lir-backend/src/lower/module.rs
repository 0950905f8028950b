//! Module Lowering - file layout and per-function directives

use lir_codegen::{emit_program, AsmInst, Section};
use lir_ir::{Linkage, LoweredModule};
use log::{debug, info};
use crate::error::CodegenError;
use super::function::lower_function;

/// Lower a whole module to assembly instructions.
///
/// Layout: syntax directive, `.data` with one entry per string constant,
/// `.text`, then each function preceded by a blank line. Extern functions
/// only get an `.extern` directive; global ones are exported.
pub fn lower_module_to_asm(module: &LoweredModule) -> Result<Vec<AsmInst>, CodegenError> {
    info!("Writing module '{}' ({} functions)", module.name, module.functions.len());

    let mut asm = vec![AsmInst::IntelSyntax, AsmInst::Section(Section::Data)];
    for string in &module.strings {
        asm.push(AsmInst::StringConst {
            label: string.name.clone(),
            value: string.value.clone(),
        });
    }
    asm.push(AsmInst::Section(Section::Text));

    for function in &module.functions {
        asm.push(AsmInst::Blank);
        match function.linkage {
            Linkage::Extern => {
                debug!("Declaring extern function '{}'", function.name);
                asm.push(AsmInst::Extern(function.name.clone()));
                continue;
            }
            Linkage::Global => {
                asm.push(AsmInst::Globl(function.name.clone()));
                asm.push(AsmInst::FunctionType(function.name.clone()));
            }
            Linkage::Local => {}
        }
        asm.extend(lower_function(function)?);
    }

    info!("Module '{}' complete: {} instructions", module.name, asm.len());
    Ok(asm)
}

/// Write a lowered module as GAS Intel-syntax assembly text
pub fn write_module(module: &LoweredModule) -> Result<String, CodegenError> {
    let asm = lower_module_to_asm(module)?;
    Ok(emit_program(&asm))
}
