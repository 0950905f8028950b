//! Per-function classification state
//!
//! One `ClassifierContext` lives for exactly one function. It records which
//! storage class each virtual register was given and the counters used to
//! hand out the next index in each class.

use std::collections::HashMap;
use lir_common::RegName;
use log::trace;
use crate::ir::{Function, Instruction, Opcode, Operand, Type};

#[derive(Debug, Default)]
pub(crate) struct ClassifierContext {
    /// Alloca destinations and their frame offsets
    mem_slots: HashMap<RegName, u32>,
    arg_regs: HashMap<RegName, u32>,
    ptr_regs: HashMap<RegName, u32>,
    gen_regs: HashMap<RegName, u32>,

    next_gen: u32,
    next_ptr: u32,
    stack_offset: u32,
}

impl ClassifierContext {
    /// Fresh context with the function's arguments already assigned, in
    /// declaration order
    pub(crate) fn for_function(function: &Function) -> Self {
        let mut ctx = Self::default();
        for (index, (_, reg)) in function.args.iter().enumerate() {
            trace!("{}: %{reg} -> $a{index}", function.name);
            ctx.arg_regs.insert(reg.clone(), index as u32);
        }
        ctx
    }

    /// Bytes of stack claimed by allocas so far
    pub(crate) fn stack_size(&self) -> u32 {
        self.stack_offset
    }

    pub(crate) fn general_count(&self) -> usize {
        self.gen_regs.len()
    }

    pub(crate) fn pointer_count(&self) -> usize {
        self.ptr_regs.len()
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.mem_slots.len()
    }

    /// Classify the destination of `instr` and rewrite every operand it holds
    pub(crate) fn classify(&mut self, instr: &mut Instruction) {
        match instr.opcode {
            Opcode::Alloca => {
                if let Some(name) = dest_name(instr) {
                    let offset = self.alloc_slot(&instr.data_type);
                    trace!("  %{name} -> [rbp-{offset}]");
                    self.mem_slots.insert(name.clone(), offset);
                    instr.dest = Some(Operand::Mem { name, offset });
                }
                // The destination is final; an alloca has no sources
                return;
            }

            Opcode::GEP => {
                if let Some(name) = dest_name(instr) {
                    let index = self.next_ptr;
                    self.next_ptr += 1;
                    trace!("  %{name} -> $p{index}");
                    self.ptr_regs.insert(name, index);
                    instr.dest = Some(Operand::PReg(index));
                }
            }

            Opcode::Load | Opcode::StructLoad => self.classify_general_dest(instr),
            op if op.is_binary() || op.is_unary() => self.classify_general_dest(instr),

            Opcode::Call => {
                self.next_gen = 0;
                if let Some(call) = instr.call.as_mut() {
                    for arg in call.args.iter_mut() {
                        self.rewrite(arg);
                    }
                }
                self.classify_general_dest(instr);
            }

            // Values stored to memory are dead as far as registers go
            op if op.is_store() => self.next_gen = 0,

            _ => {}
        }

        for op in instr.sources_mut() {
            self.rewrite(op);
        }
    }

    fn classify_general_dest(&mut self, instr: &mut Instruction) {
        if let Some(name) = dest_name(instr) {
            let index = self.next_gen;
            self.next_gen += 1;
            trace!("  %{name} -> $h{index}");
            self.gen_regs.insert(name, index);
            instr.dest = Some(Operand::HReg(index));
        }
    }

    /// Rewrite a virtual register by priority: memory slot, argument,
    /// pointer, general. Anything else passes through.
    fn rewrite(&self, op: &mut Operand) {
        let Operand::Reg(name) = &*op else {
            return;
        };

        let replacement = if let Some(&offset) = self.mem_slots.get(name) {
            Operand::Mem { name: name.clone(), offset }
        } else if let Some(&index) = self.arg_regs.get(name) {
            Operand::AReg(index)
        } else if let Some(&index) = self.ptr_regs.get(name) {
            Operand::PReg(index)
        } else if let Some(&index) = self.gen_regs.get(name) {
            Operand::HReg(index)
        } else {
            return;
        };
        *op = replacement;
    }

    fn alloc_slot(&mut self, ty: &Type) -> u32 {
        // Zero-sized slots still get a distinct address below rbp
        self.stack_offset += ty.size_in_bytes().max(1);
        self.stack_offset
    }
}

fn dest_name(instr: &Instruction) -> Option<RegName> {
    match &instr.dest {
        Some(Operand::Reg(name)) => Some(name.clone()),
        _ => None,
    }
}
