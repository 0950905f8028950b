//! Error handling for the LIR pipeline
//!
//! Each stage defines its own precise error type (`LowerError`, `CodegenError`,
//! `AbiError`). `CompilerError` is the umbrella type the driver works with;
//! stage errors convert into it.

use thiserror::Error;

/// Main error type that encompasses all phases of the pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lowering error in {function}: {message}")]
    LoweringError {
        function: String,
        message: String,
    },

    #[error("Code generation error in {function}: {message}")]
    CodegenError {
        function: String,
        message: String,
    },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a lowering error
    pub fn lowering_error(function: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::LoweringError {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a codegen error
    pub fn codegen_error(function: impl Into<String>, message: impl Into<String>) -> Self {
        CompilerError::CodegenError {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}
