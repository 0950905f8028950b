//! Unit tests for the lowering pass

use super::*;
use crate::ir::{Instruction, IrBuilder, Linkage, Opcode, Operand, Type};
use pretty_assertions::assert_eq;

fn reg(n: u32) -> Operand {
    Operand::Reg(RegName::Num(n))
}

fn builder_for(name: &str, args: Vec<Type>) -> IrBuilder {
    let mut builder = IrBuilder::new("test");
    let mut func = Function::new(name, Linkage::Global, Type::I32);
    func.set_args(args);
    builder.add_function(func);
    builder.set_current_function(name);
    builder.create_block("entry");
    builder
}

fn lowered_entry<'a>(lowered: &'a LoweredModule, func: &str) -> &'a [Instruction] {
    &lowered.get_function(func).unwrap().entry_block().unwrap().instructions
}

#[test]
fn test_alloca_offsets_accumulate() {
    let mut builder = builder_for("main", vec![]);
    builder.create_alloca(Type::I32);
    builder.create_alloca(Type::I32);
    builder.create_alloca(Type::I64);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    let offsets: Vec<u32> = instrs
        .iter()
        .filter_map(|i| match &i.dest {
            Some(Operand::Mem { offset, .. }) => Some(*offset),
            _ => None,
        })
        .collect();
    assert_eq!(offsets, vec![4, 8, 16]);
    assert_eq!(lowered.get_function("main").unwrap().stack_size, 16);
}

#[test]
fn test_zero_sized_alloca_gets_its_own_byte() {
    let mut builder = builder_for("main", vec![]);
    builder.create_alloca(Type::Void);
    builder.create_alloca(Type::I32);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    assert_eq!(instrs[0].dest, Some(Operand::Mem { name: RegName::Num(0), offset: 1 }));
    assert_eq!(instrs[1].dest, Some(Operand::Mem { name: RegName::Num(1), offset: 5 }));
    assert_eq!(lowered.get_function("main").unwrap().stack_size, 5);
}

#[test]
fn test_store_load_add_program() {
    let mut builder = builder_for("main", vec![]);
    let a = builder.create_alloca(Type::I32);
    let b = builder.create_alloca(Type::I32);
    builder.create_store(Type::I32, Operand::Imm(20), a.clone());
    builder.create_store(Type::I32, Operand::Imm(30), b.clone());
    let x = builder.create_load(Type::I32, a);
    let y = builder.create_load(Type::I32, b);
    let sum = builder.create_add(Type::I32, x, y);
    builder.create_ret(Type::I32, sum);

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    let slot_a = Operand::Mem { name: RegName::Num(0), offset: 4 };
    let slot_b = Operand::Mem { name: RegName::Num(1), offset: 8 };

    assert_eq!(instrs[0].dest, Some(slot_a.clone()));
    assert_eq!(instrs[1].dest, Some(slot_b.clone()));
    assert_eq!(instrs[2].src2, Some(slot_a.clone()));
    assert_eq!(instrs[3].src2, Some(slot_b.clone()));

    assert_eq!(instrs[4].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[4].src1, Some(slot_a));
    assert_eq!(instrs[5].dest, Some(Operand::HReg(1)));
    assert_eq!(instrs[5].src1, Some(slot_b));

    assert_eq!(instrs[6].dest, Some(Operand::HReg(2)));
    assert_eq!(instrs[6].src1, Some(Operand::HReg(0)));
    assert_eq!(instrs[6].src2, Some(Operand::HReg(1)));
    assert_eq!(instrs[7].src1, Some(Operand::HReg(2)));
}

#[test]
fn test_no_virtual_registers_remain() {
    let mut builder = builder_for("f", vec![Type::I32, Type::pointer_to(Type::I32)]);
    let slot = builder.create_alloca(Type::I32);
    builder.create_store(Type::I32, reg(0), slot.clone());
    let p = builder.create_gep(Type::I32, reg(1), Operand::Imm(2));
    let v = builder.create_load(Type::I32, p);
    let w = builder.create_load(Type::I32, slot);
    let sum = builder.create_add(Type::I32, v, w);
    let r = builder.create_call(Type::I32, "g", vec![sum, reg(0)]);
    builder.create_ret(Type::I32, r);

    let lowered = lower_module(builder.finish()).unwrap();
    assert!(lowered.is_lowered());
    for func in &lowered.functions {
        for block in &func.blocks {
            for instr in &block.instructions {
                assert!(instr.all_operands().all(|op| !op.is_virtual_reg()), "{instr}");
            }
        }
    }
}

#[test]
fn test_call_resets_general_registers() {
    let mut builder = builder_for("main", vec![]);
    let slot = builder.create_alloca(Type::I32);
    let first = builder.create_load(Type::I32, slot.clone());
    builder.create_void_call("f", vec![first]);
    builder.create_load(Type::I32, slot);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    assert_eq!(instrs[1].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[2].args(), &[Operand::HReg(0)]);
    assert_eq!(instrs[3].dest, Some(Operand::HReg(0)));
}

#[test]
fn test_call_result_is_first_general_register() {
    let mut builder = builder_for("main", vec![]);
    let slot = builder.create_alloca(Type::I32);
    let a = builder.create_load(Type::I32, slot.clone());
    let b = builder.create_load(Type::I32, slot);
    let r = builder.create_call(Type::I32, "max", vec![a, b]);
    builder.create_ret(Type::I32, r);

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    assert_eq!(instrs[3].args(), &[Operand::HReg(0), Operand::HReg(1)]);
    assert_eq!(instrs[3].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[4].src1, Some(Operand::HReg(0)));
}

#[test]
fn test_store_resets_general_registers() {
    let mut builder = builder_for("main", vec![]);
    let a = builder.create_alloca(Type::I32);
    let b = builder.create_alloca(Type::I32);
    let x = builder.create_load(Type::I32, a.clone());
    builder.create_store(Type::I32, x, b.clone());
    builder.create_load(Type::I32, b);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    assert_eq!(instrs[2].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[3].src1, Some(Operand::HReg(0)));
    assert_eq!(instrs[4].dest, Some(Operand::HReg(0)));
}

#[test]
fn test_arguments_become_argument_registers() {
    let mut builder = builder_for("add", vec![Type::I32, Type::I32]);
    let sum = builder.create_add(Type::I32, reg(0), reg(1));
    builder.create_ret(Type::I32, sum);

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "add");

    assert_eq!(instrs[0].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[0].src1, Some(Operand::AReg(0)));
    assert_eq!(instrs[0].src2, Some(Operand::AReg(1)));
}

#[test]
fn test_named_arguments() {
    let mut builder = IrBuilder::new("test");
    let mut func = Function::new("id", Linkage::Local, Type::I64);
    func.add_arg(Type::I64, "x");
    builder.add_function(func);
    builder.set_current_function("id");
    builder.create_block("entry");
    builder.create_ret(Type::I64, Operand::Reg(RegName::named("x")));

    let lowered = lower_module(builder.finish()).unwrap();
    assert_eq!(lowered_entry(&lowered, "id")[0].src1, Some(Operand::AReg(0)));
}

#[test]
fn test_gep_uses_pointer_registers() {
    let mut builder = builder_for("f", vec![Type::pointer_to(Type::I32)]);
    let p0 = builder.create_gep(Type::I32, reg(0), Operand::Imm(1));
    builder.create_store(Type::I32, Operand::Imm(5), p0.clone());
    let p1 = builder.create_gep(Type::I32, reg(0), Operand::Imm(2));
    let v = builder.create_load(Type::I32, p1);
    builder.create_ret(Type::I32, v);

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "f");

    assert_eq!(instrs[0].dest, Some(Operand::PReg(0)));
    assert_eq!(instrs[0].src1, Some(Operand::AReg(0)));
    assert_eq!(instrs[1].src2, Some(Operand::PReg(0)));
    // Pointer indices are not reset by the store
    assert_eq!(instrs[2].dest, Some(Operand::PReg(1)));
    assert_eq!(instrs[3].src1, Some(Operand::PReg(1)));
    assert_eq!(instrs[3].dest, Some(Operand::HReg(0)));
}

#[test]
fn test_non_register_operands_pass_through() {
    let mut builder = builder_for("main", vec![Type::I32]);
    let exit = builder.add_block("exit");
    let s = builder.create_string("hi");
    builder.create_void_call("puts", vec![s.clone()]);
    builder.create_bgt(Type::I32, reg(0), Operand::Imm(3), exit);
    builder.create_br(exit);
    builder.set_insert_point(exit);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "main");

    assert_eq!(instrs[0].args(), &[s]);
    assert_eq!(instrs[1].src1, Some(Operand::AReg(0)));
    assert_eq!(instrs[1].src2, Some(Operand::Imm(3)));
    assert_eq!(instrs[1].src3, Some(Operand::Label("exit".into())));
    assert_eq!(instrs[2].src1, Some(Operand::Label("exit".into())));
}

#[test]
fn test_unary_destinations_are_general() {
    let mut builder = builder_for("f", vec![Type::I32]);
    let n = builder.create_neg(Type::I32, reg(0));
    let m = builder.create_not(Type::I32, n);
    builder.create_ret(Type::I32, m);

    let lowered = lower_module(builder.finish()).unwrap();
    let instrs = lowered_entry(&lowered, "f");
    assert_eq!(instrs[0].opcode, Opcode::Neg);
    assert_eq!(instrs[0].dest, Some(Operand::HReg(0)));
    assert_eq!(instrs[1].dest, Some(Operand::HReg(1)));
    assert_eq!(instrs[1].src1, Some(Operand::HReg(0)));
}

#[test]
fn test_each_function_gets_fresh_state() {
    let mut builder = builder_for("first", vec![]);
    builder.create_alloca(Type::I64);
    let slot = builder.create_alloca(Type::I32);
    let v = builder.create_load(Type::I32, slot);
    builder.create_ret(Type::I32, v);

    builder.add_function(Function::new("second", Linkage::Global, Type::I32));
    builder.set_current_function("second");
    builder.create_block("entry");
    let slot = builder.create_alloca(Type::I32);
    let v = builder.create_load(Type::I32, slot);
    builder.create_ret(Type::I32, v);

    let lowered = lower_module(builder.finish()).unwrap();
    assert_eq!(lowered.get_function("first").unwrap().stack_size, 12);
    assert_eq!(lowered.get_function("second").unwrap().stack_size, 4);

    let second = lowered_entry(&lowered, "second");
    assert_eq!(second[0].dest, Some(Operand::Mem { name: RegName::Num(0), offset: 4 }));
    assert_eq!(second[1].dest, Some(Operand::HReg(0)));
}

#[test]
fn test_extern_functions_are_skipped() {
    let mut builder = builder_for("main", vec![]);
    builder.create_ret(Type::I32, Operand::Imm(0));
    let mut puts = Function::new("puts", Linkage::Extern, Type::I32);
    puts.add_arg(Type::pointer_to(Type::I8), "s");
    builder.add_function(puts);

    let lowered = lower_module(builder.finish()).unwrap();
    let puts = lowered.get_function("puts").unwrap();
    assert!(puts.blocks.is_empty());
    assert_eq!(puts.stack_size, 0);
}

#[test]
fn test_lowering_twice_is_rejected() {
    let mut builder = builder_for("main", vec![]);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let module = lower_module(builder.finish()).unwrap().into_inner();
    assert!(module.is_lowered());

    let err = lower_module(module).unwrap_err();
    assert_eq!(err, LowerError::AlreadyLowered { module: "test".into() });
}

#[test]
fn test_undefined_register_is_reported() {
    let mut builder = builder_for("main", vec![]);
    let v = builder.create_add(Type::I32, reg(5), Operand::Imm(1));
    builder.create_ret(Type::I32, v);

    let err = lower_module(builder.finish()).unwrap_err();
    assert_eq!(
        err,
        LowerError::UnresolvedRegister {
            function: "main".into(),
            block: "entry".into(),
            reg: RegName::Num(5),
        }
    );
    assert_eq!(err.to_string(), "register %5 in main:entry was never defined");

    let umbrella: CompilerError = err.into();
    assert!(matches!(umbrella, CompilerError::LoweringError { .. }));
}
