//! Output of the reserved `help` command.
//!
//! Every command is printed as `[name]: help`, indented with one tab per level.

use crate::command::CommandNode;
use std::io::{self, Write};

/// How nested commands are indented in the help listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HelpStyle {
    /// Whenever a command sharing its name with a root command is printed, the
    /// indentation for its later siblings drops back to zero and its children
    /// restart at one tab. Keeps listings of several roots visually flat.
    #[default]
    ResetOnRootName,
    /// Indentation always equals the depth in the tree.
    Nested,
}

/// Write the help listing for all `roots`.
pub fn write_help(roots: &[CommandNode], style: HelpStyle, out: &mut dyn Write) -> io::Result<()> {
    let root_names: Vec<&str> = roots.iter().map(|r| r.name.as_str()).collect();
    write_level(roots, &root_names, 0, style, out)
}

fn write_level(
    nodes: &[CommandNode],
    root_names: &[&str],
    mut indent: usize,
    style: HelpStyle,
    out: &mut dyn Write,
) -> io::Result<()> {
    for node in nodes {
        for _ in 0..indent {
            out.write_all(b"\t")?;
        }
        if style == HelpStyle::ResetOnRootName && root_names.contains(&node.name.as_str()) {
            indent = 0;
        }
        writeln!(out, "[{}]: {}", node.name, node.help)?;
        if !node.children.is_empty() {
            write_level(&node.children, root_names, indent + 1, style, out)?;
        }
    }
    Ok(())
}
