/// Tree dumping for tests and debugging
///
/// Renders one label per line, indented by depth.

use std::fmt::Write as FmtWrite;

use crate::ast::Node;

/// Dump a tree as an indented list of node labels.
pub fn dump(node: &Node) -> String {
    let mut out = String::new();
    node.traverse(0, &mut |level, n| {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}{}", "  ".repeat(level), n.label());
    });
    out
}
