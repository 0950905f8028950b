//! Function Lowering - Handles lowering of functions
//!
//! This module is responsible for lowering one lowered IR function to
//! assembly: frame layout, prologue, block labels, per-instruction lowering
//! and the shared epilogue.

use lir_codegen::{AbiError, AsmInst, CallingConvention, Frame};
use lir_ir::{Function, Operand};
use log::{debug, info, trace};
use crate::error::CodegenError;
use crate::naming::{block_label, epilogue_label};

/// Per-function lowering state
pub(crate) struct FunctionLowerer<'a> {
    pub(crate) function: &'a Function,
    pub(crate) frame: Frame,
    code: Vec<AsmInst>,
    epilogue_used: bool,
}

impl<'a> FunctionLowerer<'a> {
    fn new(function: &'a Function) -> Result<Self, CodegenError> {
        let (general_count, pointer_count) = scan_register_usage(function)?;

        if function.arg_count() > CallingConvention::MAX_REG_ARGS {
            return Err(CodegenError::TooManyArguments {
                function: function.name.clone(),
                count: function.arg_count(),
                max: CallingConvention::MAX_REG_ARGS,
            });
        }

        let frame = Frame::new(function.stack_size, function.arg_count(), general_count, pointer_count)
            .map_err(|e| abi_error(function, e))?;

        Ok(Self {
            function,
            frame,
            code: Vec::new(),
            epilogue_used: false,
        })
    }

    pub(crate) fn emit(&mut self, inst: AsmInst) {
        if let AsmInst::Mov(dst, src) = &inst {
            debug_assert!(!(dst.is_mem() && src.is_mem()), "memory to memory move: {inst}");
        }
        self.code.push(inst);
    }

    /// Return from the function: jump to the shared epilogue unless this is
    /// the last instruction, which falls into it
    pub(crate) fn emit_return_jump(&mut self, is_last: bool) {
        if !is_last {
            self.epilogue_used = true;
            self.emit(AsmInst::Jmp(epilogue_label(&self.function.name)));
        }
    }

    /// Label of the block a branch operand names
    pub(crate) fn branch_target(&self, op: Option<&Operand>, opcode: &str) -> Result<String, CodegenError> {
        match op {
            Some(Operand::Label(name)) => {
                if self.function.get_block_by_name(name).is_none() {
                    return Err(CodegenError::UnknownBlock {
                        function: self.function.name.clone(),
                        block: name.clone(),
                    });
                }
                Ok(block_label(&self.function.name, name))
            }
            Some(other) => Err(self.unsupported_operand(opcode, other)),
            None => Err(self.missing_operand(opcode)),
        }
    }

    pub(crate) fn abi_error(&self, err: AbiError) -> CodegenError {
        abi_error(self.function, err)
    }

    pub(crate) fn missing_operand(&self, opcode: &str) -> CodegenError {
        CodegenError::MissingOperand {
            function: self.function.name.clone(),
            opcode: opcode.to_string(),
        }
    }

    pub(crate) fn unsupported_operand(&self, opcode: &str, op: &Operand) -> CodegenError {
        match op {
            Operand::Reg(_) => CodegenError::UnloweredOperand {
                function: self.function.name.clone(),
                operand: op.to_string(),
            },
            _ => CodegenError::UnsupportedOperand {
                function: self.function.name.clone(),
                opcode: opcode.to_string(),
                operand: op.to_string(),
            },
        }
    }

    fn lower_body(mut self) -> Result<Vec<AsmInst>, CodegenError> {
        let function = self.function;
        self.emit(AsmInst::Label(function.name.clone()));
        let prologue = self.frame.gen_prologue();
        self.code.extend(prologue);

        let last_block = function.blocks.len().saturating_sub(1);
        for (block_idx, block) in function.blocks.iter().enumerate() {
            debug!("Lowering block '{}' ({} instructions)", block.name, block.len());
            self.emit(AsmInst::Label(block_label(&function.name, &block.name)));

            for (i, instr) in block.instructions.iter().enumerate() {
                trace!("  {instr}");
                let is_last = block_idx == last_block && i + 1 == block.len();
                self.lower_instruction(instr, is_last)?;
            }
        }

        if self.epilogue_used {
            self.emit(AsmInst::Label(epilogue_label(&function.name)));
        }
        let epilogue = self.frame.gen_epilogue();
        self.code.extend(epilogue);

        Ok(self.code)
    }
}

/// Lower a single lowered function to assembly: label, prologue, blocks
/// and epilogue. Visibility directives are left to the module writer.
pub fn lower_function(function: &Function) -> Result<Vec<AsmInst>, CodegenError> {
    info!(
        "Writing function '{}' ({} blocks, {} bytes of locals)",
        function.name,
        function.blocks.len(),
        function.stack_size
    );

    let lowerer = FunctionLowerer::new(function)?;
    debug!(
        "Frame for '{}': {} bytes, saves {:?}",
        function.name,
        lowerer.frame.total_size(),
        lowerer.frame.saved_regs
    );
    lowerer.lower_body()
}

/// Count the general and pointer register indices a function uses.
/// Fails on the first operand the lowering pass left untouched.
fn scan_register_usage(function: &Function) -> Result<(u32, u32), CodegenError> {
    let mut general = 0;
    let mut pointer = 0;

    for block in &function.blocks {
        for instr in &block.instructions {
            for op in instr.all_operands() {
                match op {
                    Operand::Reg(_) => {
                        return Err(CodegenError::UnloweredOperand {
                            function: function.name.clone(),
                            operand: op.to_string(),
                        });
                    }
                    Operand::HReg(i) => general = general.max(i + 1),
                    Operand::PReg(i) => pointer = pointer.max(i + 1),
                    _ => {}
                }
            }
        }
    }
    Ok((general, pointer))
}

fn abi_error(function: &Function, err: AbiError) -> CodegenError {
    match err {
        AbiError::TooManyArguments { count, max } => CodegenError::TooManyArguments {
            function: function.name.clone(),
            count,
            max,
        },
        source => CodegenError::Abi {
            function: function.name.clone(),
            source,
        },
    }
}
