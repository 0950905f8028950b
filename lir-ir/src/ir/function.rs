//! Function Definitions
//!
//! Defines IR functions with their linkage, arguments and blocks.

use lir_common::{BlockId, RegName};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::ir::{Block, Type};

/// Linkage types for functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    Global,  // Visible to other modules
    Local,   // Only visible within this module
    Extern,  // Defined elsewhere, no body
}

/// Function in IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub linkage: Linkage,
    pub return_type: Type,
    pub args: Vec<(Type, RegName)>,
    pub blocks: Vec<Block>,

    /// Bytes of stack reserved for allocas, computed by the lowering pass
    pub stack_size: u32,

    next_block_id: BlockId,
}

impl Function {
    pub fn new(name: impl Into<String>, linkage: Linkage, return_type: Type) -> Self {
        Self {
            name: name.into(),
            linkage,
            return_type,
            args: Vec::new(),
            blocks: Vec::new(),
            stack_size: 0,
            next_block_id: 1,
        }
    }

    /// Declare an argument with its register
    pub fn add_arg(&mut self, arg_type: Type, reg: impl Into<RegName>) {
        self.args.push((arg_type, reg.into()));
    }

    /// Declare arguments by type only; registers are numbered from 0 in order
    pub fn set_args(&mut self, types: Vec<Type>) {
        self.args = types
            .into_iter()
            .enumerate()
            .map(|(i, ty)| (ty, RegName::Num(i as u32)))
            .collect();
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn is_extern(&self) -> bool {
        self.linkage == Linkage::Extern
    }

    /// Append a block and return its id.
    ///
    /// Panics if the function already has a block with the same name or is
    /// an extern declaration.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        self.check_new_block(&block);
        block.id = self.take_block_id();
        let id = block.id;
        self.blocks.push(block);
        id
    }

    /// Insert a block directly after the block with id `after`.
    ///
    /// Panics if `after` does not exist in this function.
    pub fn add_block_after(&mut self, after: BlockId, mut block: Block) -> BlockId {
        self.check_new_block(&block);
        let Some(pos) = self.blocks.iter().position(|b| b.id == after) else {
            panic!("function '{}' has no block with id {after}", self.name);
        };
        block.id = self.take_block_id();
        let id = block.id;
        self.blocks.insert(pos + 1, block);
        id
    }

    pub fn get_block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn get_block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn entry_block(&self) -> Option<&Block> {
        self.blocks.first()
    }

    fn take_block_id(&mut self) -> BlockId {
        let id = self.next_block_id;
        self.next_block_id += 1;
        id
    }

    fn check_new_block(&self, block: &Block) {
        if self.is_extern() {
            panic!("extern function '{}' cannot have blocks", self.name);
        }
        if self.get_block_by_name(&block.name).is_some() {
            panic!("function '{}' already has a block named '{}'", self.name, block.name);
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.blocks.is_empty() { "def" } else { "func" };
        let linkage = match self.linkage {
            Linkage::Global => "gbl",
            Linkage::Local => "lcl",
            Linkage::Extern => "ext",
        };
        write!(f, "{keyword} ({linkage}) {}(", self.name)?;
        for (i, (ty, reg)) in self.args.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{ty} %{reg}")?;
        }
        write!(f, ") -> {}", self.return_type)?;

        if self.blocks.is_empty() {
            return writeln!(f, ";");
        }
        writeln!(f, " {{")?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}
