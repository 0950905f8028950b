//! Common types used throughout the pipeline
//!
//! Identifiers that are shared between the IR, the lowering pass and the
//! assembly writer live here so no stage has to depend on another one just
//! to name a value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-order identifier of a block inside its function
pub type BlockId = u32;

/// Name of a virtual register.
///
/// The builder hands out numbered registers; a front end may also use
/// symbolic names. Either way registers are addressed by name, never by
/// object identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegName {
    Num(u32),
    Named(String),
}

impl RegName {
    pub fn named(name: impl Into<String>) -> Self {
        RegName::Named(name.into())
    }
}

impl From<u32> for RegName {
    fn from(num: u32) -> Self {
        RegName::Num(num)
    }
}

impl From<&str> for RegName {
    fn from(name: &str) -> Self {
        RegName::Named(name.to_string())
    }
}

impl From<String> for RegName {
    fn from(name: String) -> Self {
        RegName::Named(name)
    }
}

impl fmt::Display for RegName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegName::Num(n) => write!(f, "{n}"),
            RegName::Named(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_name_display() {
        assert_eq!(RegName::Num(3).to_string(), "3");
        assert_eq!(RegName::named("x").to_string(), "x");
    }

    #[test]
    fn test_reg_name_conversions() {
        assert_eq!(RegName::from(7), RegName::Num(7));
        assert_eq!(RegName::from("tmp"), RegName::Named("tmp".to_string()));
        assert_ne!(RegName::from(1), RegName::from("1"));
    }
}
