//! Backend error type

use lir_codegen::AbiError;
use lir_common::CompilerError;
use thiserror::Error;

/// Errors raised while writing assembly for a lowered module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("{function}: operand {operand} was never lowered")]
    UnloweredOperand { function: String, operand: String },

    #[error("{function}: operand {operand} cannot be used by {opcode}")]
    UnsupportedOperand {
        function: String,
        opcode: String,
        operand: String,
    },

    #[error("{function}: type {ty} is not supported by {opcode}")]
    UnsupportedType {
        function: String,
        opcode: String,
        ty: String,
    },

    #[error("{function}: {count} arguments, at most {max} can be passed in registers")]
    TooManyArguments {
        function: String,
        count: usize,
        max: usize,
    },

    #[error("{function}: branch to unknown block '{block}'")]
    UnknownBlock { function: String, block: String },

    #[error("{function}: {opcode} is missing an operand")]
    MissingOperand { function: String, opcode: String },

    #[error("{function}: {source}")]
    Abi {
        function: String,
        #[source]
        source: AbiError,
    },
}

impl CodegenError {
    pub fn function(&self) -> &str {
        match self {
            CodegenError::UnloweredOperand { function, .. }
            | CodegenError::UnsupportedOperand { function, .. }
            | CodegenError::UnsupportedType { function, .. }
            | CodegenError::TooManyArguments { function, .. }
            | CodegenError::UnknownBlock { function, .. }
            | CodegenError::MissingOperand { function, .. }
            | CodegenError::Abi { function, .. } => function,
        }
    }
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        CompilerError::codegen_error(err.function().to_string(), err.to_string())
    }
}
