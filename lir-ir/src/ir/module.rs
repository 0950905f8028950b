//! Module
//!
//! The top-level unit the lowering pass and the assembly writer operate on.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{Function, StringPtr};

/// IR Module - a complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub strings: Vec<StringPtr>,

    /// Set once the lowering pass has rewritten every function
    #[serde(default)]
    pub(crate) lowered: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            strings: Vec::new(),
            lowered: false,
        }
    }

    /// Add a function.
    ///
    /// Panics on a duplicate function name.
    pub fn add_function(&mut self, function: Function) {
        if self.get_function(&function.name).is_some() {
            panic!("module '{}' already defines function '{}'", self.name, function.name);
        }
        self.functions.push(function);
    }

    pub fn add_string_ptr(&mut self, ptr: StringPtr) {
        self.strings.push(ptr);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn get_function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name == name)
    }

    pub fn get_string(&self, name: &str) -> Option<&StringPtr> {
        self.strings.iter().find(|s| s.name == name)
    }

    /// Whether the lowering pass has already run on this module
    pub fn is_lowered(&self) -> bool {
        self.lowered
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ";module {}", self.name)?;
        for string in &self.strings {
            writeln!(f, "@{} = \"{}\"", string.name, string.value)?;
        }
        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{func}")?;
        }
        Ok(())
    }
}
