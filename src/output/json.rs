//! JSON output formatting

use std::io;

use crate::tree::TreeNode;

/// One tree serializes as an object, several as an array.
pub fn to_json(roots: &[TreeNode]) -> serde_json::Result<String> {
    match roots {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(roots),
    }
}

/// Print trees as pretty-printed JSON to stdout.
pub fn print_json(roots: &[TreeNode]) -> io::Result<()> {
    let json = to_json(roots).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
