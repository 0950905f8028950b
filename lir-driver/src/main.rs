//! LIR Compiler Driver
//!
//! Builds the bundled sample modules through the IR builder, lowers them and
//! writes x86-64 assembly. Assembling and linking are left to the system
//! toolchain.

mod samples;

use clap::{Parser, Subcommand};
use lir_backend::write_module;
use lir_common::CompilerError;
use lir_ir::lower_module;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lirc")]
#[command(about = "LIR x86-64 assembly writer")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log at debug level when RUST_LOG is not set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, lower and write one of the bundled sample modules
    Demo {
        /// Sample to build (see `lirc list`)
        name: String,

        /// Output assembly file; printed to stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the IR before and after lowering
        #[arg(long)]
        print_ir: bool,

        /// Dump the unlowered module as JSON
        #[arg(long)]
        emit_json: Option<PathBuf>,
    },

    /// List the bundled samples
    List,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Demo { name, output, print_ir, emit_json } => {
            run_demo(&name, output.as_deref(), print_ir, emit_json.as_deref())
        }
        Commands::List => {
            list_samples();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn list_samples() {
    for (name, description) in samples::SAMPLES {
        println!("{name:<8} {description}");
    }
}

fn run_demo(
    name: &str,
    output_path: Option<&Path>,
    print_ir: bool,
    json_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let module = samples::build(name)
        .ok_or_else(|| format!("unknown sample '{name}', see `lirc list`"))?;

    if let Some(path) = json_path {
        fs::write(path, serde_json::to_string_pretty(&module)?)?;
        info!("IR written to {}", path.display());
    }

    if print_ir {
        println!("=== IR ===");
        print!("{module}");
    }

    let lowered = lower_module(module).map_err(CompilerError::from)?;
    if print_ir {
        println!("=== Lowered IR ===");
        print!("{}", &*lowered);
        println!("=== End IR ===");
    }

    let asm = write_module(&lowered).map_err(CompilerError::from)?;
    match output_path {
        Some(path) => {
            fs::write(path, &asm)?;
            println!("Assembly written to: {}", path.display());
        }
        None => print!("{asm}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lir_ir::Module;

    fn compile(module: Module) -> Result<String, CompilerError> {
        let lowered = lower_module(module)?;
        Ok(write_module(&lowered)?)
    }

    fn compile_sample(name: &str) -> String {
        let module = samples::build(name).expect("sample exists");
        compile(module).expect("sample compiles")
    }

    #[test]
    fn test_every_listed_sample_compiles() {
        for (name, _) in samples::SAMPLES {
            let asm = compile_sample(name);
            assert!(asm.starts_with(".intel_syntax noprefix\n"), "{name}");
            assert!(asm.contains("\nmain:\n"), "{name}");
        }
    }

    #[test]
    fn test_unknown_sample() {
        assert!(samples::build("nope").is_none());
        assert!(run_demo("nope", None, false, None).is_err());
    }

    #[test]
    fn test_hello_sample() {
        let asm = compile_sample("hello");
        assert!(asm.contains("STR0: .string \"Hello, world!\\n\"\n"));
        assert!(asm.contains(".extern printf\n"));
        assert!(asm.contains("  lea rdi, [rip + STR0]\n  xor eax, eax\n  call printf\n"));
    }

    #[test]
    fn test_branch_sample_keeps_max_local() {
        let asm = compile_sample("branch");
        assert!(!asm.contains(".globl max"));
        assert!(asm.contains("  jg .Lmax.first\n"));
        assert!(asm.contains("  jmp .Lmax..epilogue\n"));
        assert!(asm.contains("  call max\n"));
    }

    #[test]
    fn test_demo_writes_output_and_json() {
        let dir = std::env::temp_dir().join(format!("lirc-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let asm_path = dir.join("call.s");
        let json_path = dir.join("call.json");

        run_demo("call", Some(&asm_path), false, Some(&json_path)).unwrap();

        let asm = fs::read_to_string(&asm_path).unwrap();
        assert_eq!(asm, compile_sample("call"));
        let json = fs::read_to_string(&json_path).unwrap();
        let module: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(module, samples::build("call").unwrap());
        assert!(!module.is_lowered());

        fs::remove_dir_all(&dir).unwrap();
    }
}
