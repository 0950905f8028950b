//! IR Builder
//!
//! Stateful construction API: fresh virtual-register and string numbering,
//! a current insertion point, and build-time constant folding.
//!
//! The builder owns the module under construction. Misusing it (building
//! without a current function or block, naming a block or function that does
//! not exist) is a contract violation and panics.

use lir_common::{BlockId, RegName};
use log::trace;
use crate::ir::{
    Block, Function, Instruction, Module, Opcode, Operand, StringPtr, Type
};

/// Builder for constructing IR
pub struct IrBuilder {
    module: Module,
    current_function: Option<usize>,
    current_block: Option<BlockId>,
    next_reg: u32,
    next_string: u32,
}

impl IrBuilder {
    /// Start building a fresh, empty module
    pub fn new(module_name: impl Into<String>) -> Self {
        Self::from_module(Module::new(module_name))
    }

    /// Continue building on an existing module
    pub fn from_module(module: Module) -> Self {
        Self {
            next_string: module.strings.len() as u32,
            module,
            current_function: None,
            current_block: None,
            next_reg: 0,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Finish construction and hand the module back
    pub fn finish(self) -> Module {
        self.module
    }

    pub fn add_function(&mut self, function: Function) {
        trace!("add_function: {}", function.name);
        self.module.add_function(function);
    }

    pub fn add_string_ptr(&mut self, ptr: StringPtr) {
        self.module.add_string_ptr(ptr);
    }

    /// Select the function subsequent blocks go into.
    ///
    /// The virtual-register counter restarts at the function's argument
    /// count, so arguments occupy the lowest register numbers.
    pub fn set_current_function(&mut self, name: &str) {
        let Some(index) = self.module.functions.iter().position(|f| f.name == name) else {
            panic!("module '{}' has no function named '{name}'", self.module.name);
        };
        self.current_function = Some(index);
        self.current_block = None;
        self.next_reg = self.module.functions[index].arg_count() as u32;
        trace!("set_current_function: {name}, first free register %{}", self.next_reg);
    }

    pub fn current_function(&self) -> Option<&Function> {
        self.current_function.map(|i| &self.module.functions[i])
    }

    // ===== Blocks and insertion point =====

    /// Create a new block at the end of the current function and make it
    /// the insertion point
    pub fn create_block(&mut self, name: &str) -> BlockId {
        let id = self.add_block(name);
        self.current_block = Some(id);
        id
    }

    /// Append a block without moving the insertion point
    pub fn add_block(&mut self, name: &str) -> BlockId {
        let id = self.function_mut().add_block(Block::new(name));
        trace!("add_block: {name} (id {id})");
        id
    }

    /// Insert a block right after `after` without moving the insertion point
    pub fn add_block_after(&mut self, after: BlockId, name: &str) -> BlockId {
        let id = self.function_mut().add_block_after(after, Block::new(name));
        trace!("add_block_after: {name} (id {id}) after block {after}");
        id
    }

    pub fn set_insert_point(&mut self, block: BlockId) {
        if self.function().get_block(block).is_none() {
            panic!("function '{}' has no block with id {block}", self.function().name);
        }
        self.current_block = Some(block);
    }

    pub fn insert_point(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Whether the insertion block already ends in a terminator
    pub fn current_block_has_terminator(&self) -> bool {
        match (self.current_function(), self.current_block) {
            (Some(func), Some(id)) => func.get_block(id).is_some_and(Block::has_terminator),
            _ => false,
        }
    }

    // ===== Operand builders =====

    pub fn create_i8(&self, value: i8) -> Operand {
        Operand::Imm(value as i64)
    }

    pub fn create_i16(&self, value: i16) -> Operand {
        Operand::Imm(value as i64)
    }

    pub fn create_i32(&self, value: i32) -> Operand {
        Operand::Imm(value as i64)
    }

    pub fn create_i64(&self, value: i64) -> Operand {
        Operand::Imm(value)
    }

    /// Register a string constant on the module under a fresh `STR<k>` name.
    /// The stored value is already escaped for a `.string` directive.
    pub fn create_string(&mut self, value: &str) -> Operand {
        let name = format!("STR{}", self.next_string);
        self.next_string += 1;

        let ptr = StringPtr {
            name,
            value: escape_string(value),
        };
        trace!("create_string: {} = {:?}", ptr.name, ptr.value);
        self.module.add_string_ptr(ptr.clone());
        Operand::StringPtr(ptr)
    }

    // ===== Memory =====

    /// Reserve a stack-resident value. Its size is accounted for by the
    /// lowering pass, not here.
    pub fn create_alloca(&mut self, ty: Type) -> Operand {
        let dest = self.new_reg();
        self.add_instruction(Instruction::new(Opcode::Alloca, ty).with_dest(dest.clone()));
        dest
    }

    pub fn create_store(&mut self, ty: Type, value: Operand, dest: Operand) {
        self.add_instruction(
            Instruction::new(Opcode::Store, ty)
                .with_src1(value)
                .with_src2(dest),
        );
    }

    pub fn create_struct_store(&mut self, ty: Type, ptr: Operand, index: u32, value: Operand) {
        self.add_instruction(
            Instruction::new(Opcode::StructStore, ty)
                .with_src1(ptr)
                .with_src2(Operand::Imm(index as i64))
                .with_src3(value),
        );
    }

    pub fn create_load(&mut self, ty: Type, src: Operand) -> Operand {
        let dest = self.new_reg();
        self.add_instruction(
            Instruction::new(Opcode::Load, ty)
                .with_dest(dest.clone())
                .with_src1(src),
        );
        dest
    }

    pub fn create_struct_load(&mut self, ty: Type, src: Operand, index: u32) -> Operand {
        let dest = self.new_reg();
        self.add_instruction(
            Instruction::new(Opcode::StructLoad, ty)
                .with_dest(dest.clone())
                .with_src1(src)
                .with_src2(Operand::Imm(index as i64)),
        );
        dest
    }

    /// Address of element `index` past `ptr`, in units of `ty`
    pub fn create_gep(&mut self, ty: Type, ptr: Operand, index: Operand) -> Operand {
        self.create_binary_op(ty, ptr, index, Opcode::GEP)
    }

    // ===== Arithmetic =====

    pub fn create_add(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::Add)
    }

    pub fn create_sub(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::Sub)
    }

    pub fn create_smul(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::SMul)
    }

    pub fn create_umul(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::UMul)
    }

    pub fn create_sdiv(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::SDiv)
    }

    pub fn create_udiv(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::UDiv)
    }

    pub fn create_srem(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::SRem)
    }

    pub fn create_urem(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::URem)
    }

    pub fn create_and(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::And)
    }

    pub fn create_or(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::Or)
    }

    pub fn create_xor(&mut self, ty: Type, op1: Operand, op2: Operand) -> Operand {
        self.create_binary_op(ty, op1, op2, Opcode::Xor)
    }

    /// Arithmetic negation; an immediate is negated in place
    pub fn create_neg(&mut self, ty: Type, op: Operand) -> Operand {
        if let Operand::Imm(v) = op {
            return Operand::Imm(v.wrapping_neg());
        }
        self.create_unary_op(ty, op, Opcode::Neg)
    }

    /// Bitwise complement; an immediate is complemented in place
    pub fn create_not(&mut self, ty: Type, op: Operand) -> Operand {
        if let Operand::Imm(v) = op {
            return Operand::Imm(!v);
        }
        self.create_unary_op(ty, op, Opcode::Not)
    }

    // ===== Control flow =====

    /// Branch to `target` if equal. Two equal immediates fold into an
    /// unconditional branch.
    pub fn create_beq(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        if let (Operand::Imm(a), Operand::Imm(b)) = (&op1, &op2) {
            if a == b {
                trace!("create_beq: {a} == {b}, folding to br");
                self.create_br(target);
                return;
            }
        }
        self.create_cond_branch(ty, op1, op2, target, Opcode::Beq);
    }

    pub fn create_bne(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        self.create_cond_branch(ty, op1, op2, target, Opcode::Bne);
    }

    pub fn create_bgt(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        self.create_cond_branch(ty, op1, op2, target, Opcode::Bgt);
    }

    pub fn create_blt(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        self.create_cond_branch(ty, op1, op2, target, Opcode::Blt);
    }

    pub fn create_bge(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        self.create_cond_branch(ty, op1, op2, target, Opcode::Bge);
    }

    pub fn create_ble(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId) {
        self.create_cond_branch(ty, op1, op2, target, Opcode::Ble);
    }

    pub fn create_br(&mut self, target: BlockId) {
        let label = self.label_for(target);
        self.add_instruction(Instruction::new(Opcode::Br, Type::Void).with_src1(label));
    }

    pub fn create_void_call(&mut self, name: &str, args: Vec<Operand>) {
        self.add_instruction(Instruction::call(name, args, Type::Void));
    }

    pub fn create_call(&mut self, ty: Type, name: &str, args: Vec<Operand>) -> Operand {
        let dest = self.new_reg();
        self.add_instruction(Instruction::call(name, args, ty).with_dest(dest.clone()));
        dest
    }

    pub fn create_ret_void(&mut self) {
        self.add_instruction(Instruction::new(Opcode::RetVoid, Type::Void));
    }

    pub fn create_ret(&mut self, ty: Type, op: Operand) {
        self.add_instruction(Instruction::new(Opcode::Ret, ty).with_src1(op));
    }

    /// Append a prebuilt instruction at the insertion point
    pub fn add_instruction(&mut self, instr: Instruction) {
        let Some(block_id) = self.current_block else {
            panic!("no insertion point set in function '{}'", self.function().name);
        };
        trace!("  {instr}");
        let func = self.function_mut();
        let name = func.name.clone();
        match func.get_block_mut(block_id) {
            Some(block) => block.add_instruction(instr),
            None => panic!("function '{name}' has no block with id {block_id}"),
        }
    }

    // ===== Internals =====

    fn create_binary_op(&mut self, ty: Type, op1: Operand, op2: Operand, opcode: Opcode) -> Operand {
        if let (Operand::Imm(a), Operand::Imm(b)) = (&op1, &op2) {
            if let Some(folded) = fold_binary(opcode, *a, *b) {
                trace!("fold: {opcode} {a}, {b} = {folded}");
                return Operand::Imm(folded);
            }
        }

        let dest = self.new_reg();
        self.add_instruction(
            Instruction::new(opcode, ty)
                .with_dest(dest.clone())
                .with_src1(op1)
                .with_src2(op2),
        );
        dest
    }

    fn create_unary_op(&mut self, ty: Type, op: Operand, opcode: Opcode) -> Operand {
        let dest = self.new_reg();
        self.add_instruction(
            Instruction::new(opcode, ty)
                .with_dest(dest.clone())
                .with_src1(op),
        );
        dest
    }

    fn create_cond_branch(&mut self, ty: Type, op1: Operand, op2: Operand, target: BlockId, opcode: Opcode) {
        let label = self.label_for(target);
        self.add_instruction(
            Instruction::new(opcode, ty)
                .with_src1(op1)
                .with_src2(op2)
                .with_src3(label),
        );
    }

    fn label_for(&self, target: BlockId) -> Operand {
        let func = self.function();
        match func.get_block(target) {
            Some(block) => Operand::Label(block.name.clone()),
            None => panic!("function '{}' has no block with id {target}", func.name),
        }
    }

    fn new_reg(&mut self) -> Operand {
        let reg = self.next_reg;
        self.next_reg += 1;
        Operand::Reg(RegName::Num(reg))
    }

    fn function(&self) -> &Function {
        match self.current_function {
            Some(index) => &self.module.functions[index],
            None => panic!("no current function set on the builder"),
        }
    }

    fn function_mut(&mut self) -> &mut Function {
        match self.current_function {
            Some(index) => &mut self.module.functions[index],
            None => panic!("no current function set on the builder"),
        }
    }
}

/// Escape a string for GAS: backslash, quote and the common control
/// characters get their short forms, any other byte outside printable ASCII
/// becomes a three-digit octal escape.
fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'"' => escaped.push_str("\\\""),
            b'\n' => escaped.push_str("\\n"),
            b'\t' => escaped.push_str("\\t"),
            b'\r' => escaped.push_str("\\r"),
            0x20..=0x7e => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{byte:03o}")),
        }
    }
    escaped
}

/// Build-time folding for two immediates. Division by zero and `MIN / -1`
/// are left to run time.
fn fold_binary(opcode: Opcode, a: i64, b: i64) -> Option<i64> {
    match opcode {
        Opcode::Add => Some(a.wrapping_add(b)),
        Opcode::Sub => Some(a.wrapping_sub(b)),
        Opcode::SMul => Some(a.wrapping_mul(b)),
        Opcode::SDiv => a.checked_div(b),
        Opcode::And => Some(a & b),
        Opcode::Or => Some(a | b),
        Opcode::Xor => Some(a ^ b),
        _ => None,
    }
}
