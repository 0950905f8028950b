//! Assembly Text Emission

use crate::asm::AsmInst;

const INDENT: &str = "  ";

/// Render a program as GAS text, one instruction or directive per line.
///
/// Labels and directives start at column zero; instructions are indented.
pub fn emit_program(instructions: &[AsmInst]) -> String {
    let mut out = String::new();
    for inst in instructions {
        if !inst.is_unindented() {
            out.push_str(INDENT);
        }
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    out
}
