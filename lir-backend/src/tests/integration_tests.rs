//! End-to-end tests: build with the IR builder, lower, write assembly

use lir_ir::{Block, Function, Instruction, IrBuilder, Linkage, Opcode, Operand, RegName, Type};
use pretty_assertions::assert_eq;
use crate::{lower_function, lower_module, write_module, CodegenError};

fn builder_for(name: &str, linkage: Linkage, args: Vec<Type>) -> IrBuilder {
    let mut builder = IrBuilder::new("test");
    let mut func = Function::new(name, linkage, Type::I32);
    func.set_args(args);
    builder.add_function(func);
    builder.set_current_function(name);
    builder.create_block("entry");
    builder
}

fn write(builder: IrBuilder) -> Result<String, CodegenError> {
    let lowered = lower_module(builder.finish()).expect("lowering failed");
    write_module(&lowered)
}

#[test]
fn test_return_zero() {
    let mut builder = builder_for("main", Linkage::Global, vec![]);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let expected = "\
.intel_syntax noprefix
.data
.text

.globl main
.type main, @function
main:
  push rbp
  mov rbp, rsp
  sub rsp, 0
.Lmain.entry:
  mov eax, 0
  leave
  ret
";
    assert_eq!(write(builder).unwrap(), expected);
}

#[test]
fn test_store_load_add_program() {
    let mut builder = builder_for("main", Linkage::Global, vec![]);
    let a = builder.create_alloca(Type::I32);
    let b = builder.create_alloca(Type::I32);
    builder.create_store(Type::I32, Operand::Imm(20), a.clone());
    builder.create_store(Type::I32, Operand::Imm(30), b.clone());
    let x = builder.create_load(Type::I32, a);
    let y = builder.create_load(Type::I32, b);
    let sum = builder.create_add(Type::I32, x, y);
    builder.create_ret(Type::I32, sum);

    let expected = "\
.intel_syntax noprefix
.data
.text

.globl main
.type main, @function
main:
  push rbp
  mov rbp, rsp
  sub rsp, 32
  mov QWORD PTR [rbp-16], rbx
  mov QWORD PTR [rbp-24], r12
.Lmain.entry:
  mov DWORD PTR [rbp-4], 20
  mov DWORD PTR [rbp-8], 30
  mov eax, DWORD PTR [rbp-4]
  mov ebx, DWORD PTR [rbp-8]
  mov r11d, eax
  add r11d, ebx
  mov r12d, r11d
  mov eax, r12d
  mov rbx, QWORD PTR [rbp-16]
  mov r12, QWORD PTR [rbp-24]
  leave
  ret
";
    assert_eq!(write(builder).unwrap(), expected);
}

#[test]
fn test_strings_go_to_data_section() {
    let mut builder = builder_for("main", Linkage::Global, vec![]);
    let hello = builder.create_string("Hello\n");
    builder.create_void_call("puts", vec![hello]);
    builder.create_ret(Type::I32, Operand::Imm(0));
    builder.add_function(Function::new("puts", Linkage::Extern, Type::I32));

    let asm = write(builder).unwrap();
    assert!(asm.starts_with(".intel_syntax noprefix\n.data\nSTR0: .string \"Hello\\n\"\n.text\n"));
    assert!(asm.contains("  lea rdi, [rip + STR0]\n  xor eax, eax\n  call puts\n"));
}

#[test]
fn test_string_with_quotes_and_backslash() {
    let mut builder = builder_for("main", Linkage::Global, vec![]);
    let text = builder.create_string("say \"hi\" \\ ok");
    builder.create_void_call("puts", vec![text]);
    builder.create_ret(Type::I32, Operand::Imm(0));

    let asm = write(builder).unwrap();
    assert!(asm.contains("\nSTR0: .string \"say \\\"hi\\\" \\\\ ok\"\n"), "{asm}");
}

#[test]
fn test_extern_emits_only_declaration() {
    let mut builder = builder_for("main", Linkage::Global, vec![]);
    builder.create_ret(Type::I32, Operand::Imm(0));
    builder.add_function(Function::new("puts", Linkage::Extern, Type::I32));

    let asm = write(builder).unwrap();
    assert!(asm.ends_with("\n\n.extern puts\n"));
    assert!(!asm.contains("puts:"));
    assert!(!asm.contains(".globl puts"));
}

#[test]
fn test_local_function_has_no_visibility_directives() {
    let mut builder = builder_for("helper", Linkage::Local, vec![]);
    builder.create_ret(Type::I32, Operand::Imm(1));

    let asm = write(builder).unwrap();
    assert!(asm.contains("\nhelper:\n"));
    assert!(!asm.contains(".globl"));
    assert!(!asm.contains(".type"));
}

#[test]
fn test_early_return_jumps_to_epilogue() {
    let mut builder = builder_for("sign", Linkage::Global, vec![Type::I32]);
    let negative = builder.add_block("negative");
    builder.create_blt(Type::I32, Operand::Reg(RegName::Num(0)), Operand::Imm(0), negative);
    builder.create_ret(Type::I32, Operand::Imm(1));
    builder.set_insert_point(negative);
    builder.create_ret(Type::I32, Operand::Imm(-1));

    let expected_body = "\
.Lsign.entry:
  mov r11d, DWORD PTR [rbp-8]
  cmp r11d, 0
  jl .Lsign.negative
  mov eax, 1
  jmp .Lsign..epilogue
.Lsign.negative:
  mov eax, -1
.Lsign..epilogue:
  leave
  ret
";
    let asm = write(builder).unwrap();
    assert!(asm.contains("  sub rsp, 16\n  mov QWORD PTR [rbp-8], rdi\n"), "{asm}");
    assert!(asm.ends_with(expected_body), "{asm}");
}

#[test]
fn test_block_names_are_scoped_per_function() {
    let mut builder = builder_for("first", Linkage::Global, vec![]);
    builder.create_ret(Type::I32, Operand::Imm(1));
    builder.add_function(Function::new("second", Linkage::Global, Type::I32));
    builder.set_current_function("second");
    builder.create_block("entry");
    builder.create_ret(Type::I32, Operand::Imm(2));

    let asm = write(builder).unwrap();
    assert!(asm.contains(".Lfirst.entry:\n"));
    assert!(asm.contains(".Lsecond.entry:\n"));
}

#[test]
fn test_unlowered_register_is_rejected() {
    let mut func = Function::new("f", Linkage::Global, Type::I32);
    let mut block = Block::new("entry");
    block.add_instruction(Instruction::new(Opcode::Ret, Type::I32).with_src1(Operand::Reg(RegName::Num(0))));
    func.add_block(block);

    let err = lower_function(&func).unwrap_err();
    assert_eq!(
        err,
        CodegenError::UnloweredOperand {
            function: "f".into(),
            operand: "%0".into(),
        }
    );
}

#[test]
fn test_too_many_incoming_arguments() {
    let mut builder = builder_for("wide", Linkage::Global, vec![Type::I32; 7]);
    builder.create_ret(Type::I32, Operand::Reg(RegName::Num(6)));

    let err = write(builder).unwrap_err();
    assert_eq!(
        err,
        CodegenError::TooManyArguments {
            function: "wide".into(),
            count: 7,
            max: 6,
        }
    );
}

#[test]
fn test_branch_to_unknown_block() {
    let mut func = Function::new("f", Linkage::Global, Type::Void);
    let mut block = Block::new("entry");
    block.add_instruction(Instruction::new(Opcode::Br, Type::Void).with_src1(Operand::Label("nowhere".into())));
    func.add_block(block);

    let err = lower_function(&func).unwrap_err();
    assert_eq!(
        err,
        CodegenError::UnknownBlock {
            function: "f".into(),
            block: "nowhere".into(),
        }
    );
}

#[test]
fn test_codegen_error_converts_to_compiler_error() {
    let err = CodegenError::UnknownBlock {
        function: "f".into(),
        block: "nowhere".into(),
    };
    let umbrella: lir_common::CompilerError = err.into();
    assert_eq!(
        umbrella.to_string(),
        "Code generation error in f: f: branch to unknown block 'nowhere'"
    );
}
