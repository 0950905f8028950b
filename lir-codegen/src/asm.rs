//! x86-64 Assembly Instruction Definitions
//!
//! This module defines the register model, operand forms and the subset of
//! the x86-64 instruction set the writer emits, in GAS Intel syntax.

use std::fmt;

/// Operand width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Word,
    Dword,
    Qword,
}

impl Width {
    /// Width for a value of `bytes` bytes
    pub fn from_bytes(bytes: u32) -> Option<Width> {
        match bytes {
            1 => Some(Width::Byte),
            2 => Some(Width::Word),
            4 => Some(Width::Dword),
            8 => Some(Width::Qword),
            _ => None,
        }
    }

    /// Size keyword for memory operands
    pub fn ptr_keyword(self) -> &'static str {
        match self {
            Width::Byte => "BYTE PTR",
            Width::Word => "WORD PTR",
            Width::Dword => "DWORD PTR",
            Width::Qword => "QWORD PTR",
        }
    }
}

/// x86-64 general purpose registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum X86Reg {
    Rax, Rbx, Rcx, Rdx, Rsi, Rdi, Rbp, Rsp,
    R8, R9, R10, R11, R12, R13, R14, R15,
}

impl X86Reg {
    /// Register name at the given width (`eax`, `r12d`, `sil`, ...)
    pub fn name(self, width: Width) -> &'static str {
        let names: [&'static str; 4] = match self {
            X86Reg::Rax => ["al", "ax", "eax", "rax"],
            X86Reg::Rbx => ["bl", "bx", "ebx", "rbx"],
            X86Reg::Rcx => ["cl", "cx", "ecx", "rcx"],
            X86Reg::Rdx => ["dl", "dx", "edx", "rdx"],
            X86Reg::Rsi => ["sil", "si", "esi", "rsi"],
            X86Reg::Rdi => ["dil", "di", "edi", "rdi"],
            X86Reg::Rbp => ["bpl", "bp", "ebp", "rbp"],
            X86Reg::Rsp => ["spl", "sp", "esp", "rsp"],
            X86Reg::R8 => ["r8b", "r8w", "r8d", "r8"],
            X86Reg::R9 => ["r9b", "r9w", "r9d", "r9"],
            X86Reg::R10 => ["r10b", "r10w", "r10d", "r10"],
            X86Reg::R11 => ["r11b", "r11w", "r11d", "r11"],
            X86Reg::R12 => ["r12b", "r12w", "r12d", "r12"],
            X86Reg::R13 => ["r13b", "r13w", "r13d", "r13"],
            X86Reg::R14 => ["r14b", "r14w", "r14d", "r14"],
            X86Reg::R15 => ["r15b", "r15w", "r15d", "r15"],
        };
        match width {
            Width::Byte => names[0],
            Width::Word => names[1],
            Width::Dword => names[2],
            Width::Qword => names[3],
        }
    }
}

impl fmt::Display for X86Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name(Width::Qword))
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum X86Operand {
    Reg(X86Reg, Width),
    Imm(i64),

    /// `[base+disp]`; the width is omitted for `lea`
    Mem {
        width: Option<Width>,
        base: X86Reg,
        disp: i32,
    },

    /// RIP-relative reference to a data label
    RipRel(String),
}

impl X86Operand {
    pub fn reg(reg: X86Reg, width: Width) -> Self {
        X86Operand::Reg(reg, width)
    }

    pub fn qword(reg: X86Reg) -> Self {
        X86Operand::Reg(reg, Width::Qword)
    }

    /// Frame slot at `[rbp-offset]`
    pub fn frame_slot(offset: u32, width: Width) -> Self {
        X86Operand::Mem {
            width: Some(width),
            base: X86Reg::Rbp,
            disp: -(offset as i32),
        }
    }

    /// Frame slot address, for `lea`
    pub fn frame_addr(offset: u32) -> Self {
        X86Operand::Mem {
            width: None,
            base: X86Reg::Rbp,
            disp: -(offset as i32),
        }
    }

    /// Memory at `[base+disp]`
    pub fn deref(base: X86Reg, disp: i32, width: Width) -> Self {
        X86Operand::Mem {
            width: Some(width),
            base,
            disp,
        }
    }

    pub fn is_mem(&self) -> bool {
        matches!(self, X86Operand::Mem { .. })
    }
}

impl fmt::Display for X86Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            X86Operand::Reg(reg, width) => write!(f, "{}", reg.name(*width)),
            X86Operand::Imm(v) => write!(f, "{v}"),
            X86Operand::Mem { width, base, disp } => {
                if let Some(width) = width {
                    write!(f, "{} ", width.ptr_keyword())?;
                }
                match *disp {
                    0 => write!(f, "[{base}]"),
                    d if d < 0 => write!(f, "[{base}-{}]", d.unsigned_abs()),
                    d => write!(f, "[{base}+{d}]"),
                }
            }
            X86Operand::RipRel(label) => write!(f, "[rip + {label}]"),
        }
    }
}

/// Condition codes for conditional jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    E,
    Ne,
    G,
    L,
    Ge,
    Le,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::G => "g",
            Cond::L => "l",
            Cond::Ge => "ge",
            Cond::Le => "le",
        };
        write!(f, "{suffix}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Text,
}

/// x86-64 Assembly Instructions and Directives
#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Directives
    IntelSyntax,                          // .intel_syntax noprefix
    Section(Section),
    Globl(String),
    FunctionType(String),                 // .type name, @function
    Extern(String),
    StringConst { label: String, value: String },

    // Data movement
    Mov(X86Operand, X86Operand),
    Movsx(X86Operand, X86Operand),
    Movzx(X86Operand, X86Operand),
    Lea(X86Operand, X86Operand),
    Push(X86Operand),
    Pop(X86Operand),

    // Arithmetic and logic (dst, src)
    Add(X86Operand, X86Operand),
    Sub(X86Operand, X86Operand),
    Imul(X86Operand, X86Operand),
    Imul3(X86Operand, X86Operand, i64),   // dst = src * imm
    And(X86Operand, X86Operand),
    Or(X86Operand, X86Operand),
    Xor(X86Operand, X86Operand),
    Neg(X86Operand),
    Not(X86Operand),

    // Division through rdx:rax
    Cdq,
    Cqo,
    Idiv(X86Operand),
    Div(X86Operand),

    // Control flow
    Cmp(X86Operand, X86Operand),
    Jmp(String),
    Jcc(Cond, String),
    Call(String),
    Leave,
    Ret,

    // Pseudo
    Label(String),
    Blank,
}

impl AsmInst {
    /// Labels, directives and blank lines start at column zero
    pub fn is_unindented(&self) -> bool {
        matches!(
            self,
            AsmInst::IntelSyntax
                | AsmInst::Section(_)
                | AsmInst::Globl(_)
                | AsmInst::FunctionType(_)
                | AsmInst::Extern(_)
                | AsmInst::StringConst { .. }
                | AsmInst::Label(_)
                | AsmInst::Blank
        )
    }
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Directives
            AsmInst::IntelSyntax => write!(f, ".intel_syntax noprefix"),
            AsmInst::Section(Section::Data) => write!(f, ".data"),
            AsmInst::Section(Section::Text) => write!(f, ".text"),
            AsmInst::Globl(name) => write!(f, ".globl {name}"),
            AsmInst::FunctionType(name) => write!(f, ".type {name}, @function"),
            AsmInst::Extern(name) => write!(f, ".extern {name}"),
            AsmInst::StringConst { label, value } => write!(f, "{label}: .string \"{value}\""),

            // Data movement
            AsmInst::Mov(dst, src) => write!(f, "mov {dst}, {src}"),
            AsmInst::Movsx(dst, src) => write!(f, "movsx {dst}, {src}"),
            AsmInst::Movzx(dst, src) => write!(f, "movzx {dst}, {src}"),
            AsmInst::Lea(dst, src) => write!(f, "lea {dst}, {src}"),
            AsmInst::Push(op) => write!(f, "push {op}"),
            AsmInst::Pop(op) => write!(f, "pop {op}"),

            // Arithmetic
            AsmInst::Add(dst, src) => write!(f, "add {dst}, {src}"),
            AsmInst::Sub(dst, src) => write!(f, "sub {dst}, {src}"),
            AsmInst::Imul(dst, src) => write!(f, "imul {dst}, {src}"),
            AsmInst::Imul3(dst, src, imm) => write!(f, "imul {dst}, {src}, {imm}"),
            AsmInst::And(dst, src) => write!(f, "and {dst}, {src}"),
            AsmInst::Or(dst, src) => write!(f, "or {dst}, {src}"),
            AsmInst::Xor(dst, src) => write!(f, "xor {dst}, {src}"),
            AsmInst::Neg(op) => write!(f, "neg {op}"),
            AsmInst::Not(op) => write!(f, "not {op}"),

            AsmInst::Cdq => write!(f, "cdq"),
            AsmInst::Cqo => write!(f, "cqo"),
            AsmInst::Idiv(op) => write!(f, "idiv {op}"),
            AsmInst::Div(op) => write!(f, "div {op}"),

            // Control flow
            AsmInst::Cmp(a, b) => write!(f, "cmp {a}, {b}"),
            AsmInst::Jmp(label) => write!(f, "jmp {label}"),
            AsmInst::Jcc(cond, label) => write!(f, "j{cond} {label}"),
            AsmInst::Call(name) => write!(f, "call {name}"),
            AsmInst::Leave => write!(f, "leave"),
            AsmInst::Ret => write!(f, "ret"),

            // Pseudo
            AsmInst::Label(label) => write!(f, "{label}:"),
            AsmInst::Blank => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(X86Reg::Rax.name(Width::Dword), "eax");
        assert_eq!(X86Reg::Rsi.name(Width::Byte), "sil");
        assert_eq!(X86Reg::R12.name(Width::Dword), "r12d");
        assert_eq!(X86Reg::R9.name(Width::Word), "r9w");
        assert_eq!(format!("{}", X86Reg::Rbp), "rbp");
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(format!("{}", X86Operand::frame_slot(4, Width::Dword)), "DWORD PTR [rbp-4]");
        assert_eq!(format!("{}", X86Operand::frame_addr(16)), "[rbp-16]");
        assert_eq!(format!("{}", X86Operand::deref(X86Reg::R11, 0, Width::Byte)), "BYTE PTR [r11]");
        assert_eq!(format!("{}", X86Operand::deref(X86Reg::R14, 8, Width::Qword)), "QWORD PTR [r14+8]");
        assert_eq!(format!("{}", X86Operand::RipRel("STR0".into())), "[rip + STR0]");
        assert_eq!(format!("{}", X86Operand::Imm(-3)), "-3");
    }

    #[test]
    fn test_instruction_display() {
        let eax = X86Operand::reg(X86Reg::Rax, Width::Dword);
        assert_eq!(format!("{}", AsmInst::Mov(eax.clone(), X86Operand::Imm(0))), "mov eax, 0");
        assert_eq!(
            format!("{}", AsmInst::Imul3(eax.clone(), X86Operand::reg(X86Reg::R11, Width::Dword), 3)),
            "imul eax, r11d, 3"
        );
        assert_eq!(format!("{}", AsmInst::Jcc(Cond::Ge, ".Lmain.exit".into())), "jge .Lmain.exit");
        assert_eq!(format!("{}", AsmInst::FunctionType("main".into())), ".type main, @function");
        assert_eq!(
            format!("{}", AsmInst::StringConst { label: "STR0".into(), value: "hi\\n".into() }),
            "STR0: .string \"hi\\n\""
        );
        assert_eq!(
            format!("{}", AsmInst::Movzx(eax.clone(), X86Operand::frame_slot(1, Width::Byte))),
            "movzx eax, BYTE PTR [rbp-1]"
        );
        assert_eq!(format!("{}", AsmInst::Label("main".into())), "main:");
        assert_eq!(format!("{}", AsmInst::Blank), "");
    }

    #[test]
    fn test_width_lookup() {
        assert_eq!(Width::from_bytes(4), Some(Width::Dword));
        assert_eq!(Width::from_bytes(3), None);
        assert_eq!(Width::from_bytes(1), Some(Width::Byte));
    }
}
