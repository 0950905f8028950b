//! Bundled sample modules, built through the IR builder

use lir_ir::{Function, IrBuilder, Linkage, Module, Operand, RegName, Type};

/// Sample names with a one-line description
pub const SAMPLES: &[(&str, &str)] = &[
    ("ret0", "main returns 0"),
    ("arith", "two stack slots, loads and an add"),
    ("branch", "local max() with a conditional branch, called from main"),
    ("hello", "printf of a string constant"),
    ("call", "call into a local function using multiply and remainder"),
];

/// Build the sample called `name`
pub fn build(name: &str) -> Option<Module> {
    let module = match name {
        "ret0" => ret0(),
        "arith" => arith(),
        "branch" => branch(),
        "hello" => hello(),
        "call" => call(),
        _ => return None,
    };
    Some(module)
}

fn arg(index: u32) -> Operand {
    Operand::Reg(RegName::Num(index))
}

/// Add a function and point the builder at its entry block
fn begin_function(builder: &mut IrBuilder, name: &str, linkage: Linkage, args: Vec<Type>) {
    let mut function = Function::new(name, linkage, Type::I32);
    function.set_args(args);
    builder.add_function(function);
    builder.set_current_function(name);
    builder.create_block("entry");
}

fn ret0() -> Module {
    let mut builder = IrBuilder::new("ret0");
    begin_function(&mut builder, "main", Linkage::Global, vec![]);
    let zero = builder.create_i32(0);
    builder.create_ret(Type::I32, zero);
    builder.finish()
}

fn arith() -> Module {
    let mut builder = IrBuilder::new("arith");
    begin_function(&mut builder, "main", Linkage::Global, vec![]);

    let a = builder.create_alloca(Type::I32);
    let b = builder.create_alloca(Type::I32);
    let twenty = builder.create_i32(20);
    let thirty = builder.create_i32(30);
    builder.create_store(Type::I32, twenty, a.clone());
    builder.create_store(Type::I32, thirty, b.clone());
    let x = builder.create_load(Type::I32, a);
    let y = builder.create_load(Type::I32, b);
    let sum = builder.create_add(Type::I32, x, y);
    builder.create_ret(Type::I32, sum);
    builder.finish()
}

fn branch() -> Module {
    let mut builder = IrBuilder::new("branch");

    begin_function(&mut builder, "max", Linkage::Local, vec![Type::I32, Type::I32]);
    let first = builder.add_block("first");
    builder.create_bgt(Type::I32, arg(0), arg(1), first);
    builder.create_ret(Type::I32, arg(1));
    builder.set_insert_point(first);
    builder.create_ret(Type::I32, arg(0));

    begin_function(&mut builder, "main", Linkage::Global, vec![]);
    let args = vec![builder.create_i32(3), builder.create_i32(7)];
    let result = builder.create_call(Type::I32, "max", args);
    builder.create_ret(Type::I32, result);
    builder.finish()
}

fn hello() -> Module {
    let mut builder = IrBuilder::new("hello");
    builder.add_function(Function::new("printf", Linkage::Extern, Type::I32));

    begin_function(&mut builder, "main", Linkage::Global, vec![]);
    let message = builder.create_string("Hello, world!\n");
    builder.create_call(Type::I32, "printf", vec![message]);
    let zero = builder.create_i32(0);
    builder.create_ret(Type::I32, zero);
    builder.finish()
}

fn call() -> Module {
    let mut builder = IrBuilder::new("call");

    // mix(a, b) = (a * b) % 7
    begin_function(&mut builder, "mix", Linkage::Local, vec![Type::I32, Type::I32]);
    let product = builder.create_smul(Type::I32, arg(0), arg(1));
    let seven = builder.create_i32(7);
    let rem = builder.create_srem(Type::I32, product, seven);
    builder.create_ret(Type::I32, rem);

    begin_function(&mut builder, "main", Linkage::Global, vec![]);
    let args = vec![builder.create_i32(6), builder.create_i32(9)];
    let mixed = builder.create_call(Type::I32, "mix", args);
    let one = builder.create_i32(1);
    let result = builder.create_add(Type::I32, mixed, one);
    builder.create_ret(Type::I32, result);
    builder.finish()
}
