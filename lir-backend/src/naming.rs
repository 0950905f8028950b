//! Assembly label naming
//!
//! Block labels are local (`.L`) symbols qualified by the function name, so
//! different functions may reuse block names.

/// Label of block `block` in `function`
pub fn block_label(function: &str, block: &str) -> String {
    format!(".L{function}.{block}")
}

/// Label of the shared epilogue of `function`.
///
/// Block names are never empty, so the double dot cannot clash with a block label.
pub fn epilogue_label(function: &str) -> String {
    format!(".L{function}..epilogue")
}
