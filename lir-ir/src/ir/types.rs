//! IR Type System
//!
//! Value descriptors: void, integer and float widths, pointers and structs.
//! Types carry no behaviour beyond identity, size and layout lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR Type system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,

    /// Pointer to a base type
    Pointer(Box<Type>),

    /// Named structure with ordered element types
    Struct {
        name: String,
        elements: Vec<Type>,
    },
}

impl Type {
    pub fn pointer_to(base: Type) -> Self {
        Type::Pointer(Box::new(base))
    }

    pub fn structure(name: impl Into<String>, elements: Vec<Type>) -> Self {
        Type::Struct {
            name: name.into(),
            elements,
        }
    }

    /// Get the size of this type in bytes
    pub fn size_in_bytes(&self) -> u32 {
        match self {
            Type::Void => 0,
            Type::I8 => 1,
            Type::I16 => 2,
            Type::I32 | Type::F32 => 4,
            Type::I64 | Type::F64 | Type::Pointer(_) => 8,
            Type::Struct { elements, .. } => {
                let mut offset = 0;
                for element in elements {
                    offset = align_to(offset, element.alignment()) + element.size_in_bytes();
                }
                align_to(offset, self.alignment())
            }
        }
    }

    /// Natural alignment in bytes
    pub fn alignment(&self) -> u32 {
        match self {
            Type::Void => 1,
            Type::Struct { elements, .. } => {
                elements.iter().map(Type::alignment).max().unwrap_or(1)
            }
            scalar => scalar.size_in_bytes(),
        }
    }

    /// Byte offset of element `index` in a struct, `None` for anything else
    /// or an out-of-range index.
    pub fn field_offset(&self, index: usize) -> Option<u32> {
        let Type::Struct { elements, .. } = self else {
            return None;
        };
        if index >= elements.len() {
            return None;
        }

        let mut offset = 0;
        for element in &elements[..index] {
            offset = align_to(offset, element.alignment()) + element.size_in_bytes();
        }
        Some(align_to(offset, elements[index].alignment()))
    }

    /// Type of element `index` in a struct
    pub fn field_type(&self, index: usize) -> Option<&Type> {
        match self {
            Type::Struct { elements, .. } => elements.get(index),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Get the base type for pointers
    pub fn base_type(&self) -> Option<&Type> {
        match self {
            Type::Pointer(base) => Some(base),
            _ => None,
        }
    }
}

fn align_to(offset: u32, align: u32) -> u32 {
    if align <= 1 {
        offset
    } else {
        offset.div_ceil(align) * align
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::I8 => write!(f, "i8"),
            Type::I16 => write!(f, "i16"),
            Type::I32 => write!(f, "i32"),
            Type::I64 => write!(f, "i64"),
            Type::F32 => write!(f, "f32"),
            Type::F64 => write!(f, "f64"),
            Type::Pointer(base) => write!(f, "{base}*"),
            Type::Struct { name, .. } => write!(f, "%{name}"),
        }
    }
}
