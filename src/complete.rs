//! Prefix completion over a tree of keywords and `key=` argument placeholders.
//!
//! Every node is matched through its canonical form: the name followed by a
//! space for keywords, or by `=` for arguments. Matching walks the typed text
//! level by level. As long as exactly one child of the current node matches,
//! the walk continues below it with whatever text is left; otherwise the
//! matches found at that level are the result.
//!
//! Offsets and lengths are counted in `char`s, not bytes.

use crate::command::{CommandNode, CommandTree, DynamicNames};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Candidates for the text typed so far.
///
/// Each candidate is the text to insert at the cursor. `offset` is the number of
/// chars before the cursor that belong to the word being completed, so an
/// editor that replaces whole words should replace the last `offset` chars with
/// that word followed by the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: Vec<String>,
    pub offset: usize,
}

enum NameSource {
    Static(String),
    Dynamic(DynamicNames),
}

/// One node of a completion tree.
pub struct CompletionNode {
    name: NameSource,
    is_argument: bool,
    children: Vec<CompletionNode>,
}

impl CompletionNode {
    /// The unnamed node holding the top-level commands. Its own name is never matched.
    pub fn root(children: Vec<CompletionNode>) -> Self {
        Self::keyword("").with_children(children)
    }

    /// A literal word, matched as `name `.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: NameSource::Static(name.into()),
            is_argument: false,
            children: Vec::new(),
        }
    }

    /// A `key=value` placeholder, matched as `name=`.
    ///
    /// Arguments never consume a level: after one is typed out, its siblings
    /// are offered again.
    pub fn argument(name: impl Into<String>) -> Self {
        Self {
            is_argument: true,
            ..Self::keyword(name)
        }
    }

    /// Keywords computed at completion time from the whole typed line.
    pub fn dynamic<F>(callback: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        Self::from_callback(Arc::new(callback))
    }

    fn from_callback(callback: DynamicNames) -> Self {
        Self {
            name: NameSource::Dynamic(callback),
            is_argument: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = CompletionNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn child(mut self, child: CompletionNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append one argument child per name, after the existing children.
    pub fn with_arguments<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_children(names.into_iter().map(CompletionNode::argument))
    }

    pub fn is_argument(&self) -> bool {
        self.is_argument
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.name, NameSource::Dynamic(_))
    }

    pub fn children(&self) -> &[CompletionNode] {
        &self.children
    }

    /// Build the completion tree mirroring a command tree.
    ///
    /// Below each command come its subcommands, then its dynamic suggestions,
    /// then its `key=` arguments.
    pub fn from_commands(tree: &CommandTree) -> Self {
        Self::root(tree.roots().iter().map(Self::from_command).collect::<Vec<_>>())
    }

    fn from_command(command: &CommandNode) -> Self {
        let mut node = Self::keyword(command.name.clone())
            .with_children(command.children.iter().map(Self::from_command));
        if let Some(callback) = &command.suggestions {
            node = node.child(Self::from_callback(callback.clone()));
        }
        node.with_arguments(command.arguments.iter().cloned())
    }

    /// Canonical forms of this node's names for the given line.
    fn canonical_names(&self, line: &str) -> Vec<Vec<char>> {
        let separator = if self.is_argument { '=' } else { ' ' };
        let suffixed = |name: &str| -> Vec<char> {
            name.chars().chain(std::iter::once(separator)).collect()
        };
        match &self.name {
            NameSource::Static(name) => vec![suffixed(name)],
            NameSource::Dynamic(callback) => callback(line).iter().map(|n| suffixed(n.as_str())).collect(),
        }
    }

    /// Render the tree as indented text, one node per line.
    pub fn tree(&self, prefix: &str) -> String {
        let mut buf = String::new();
        for child in &self.children {
            child.print(prefix, 0, &mut buf);
        }
        buf
    }

    fn print(&self, prefix: &str, level: usize, buf: &mut String) {
        buf.push_str(prefix);
        for _ in 0..level {
            buf.push_str("    ");
        }
        match &self.name {
            NameSource::Static(name) if self.is_argument => buf.push_str(&format!("{name}=")),
            NameSource::Static(name) => buf.push_str(name),
            NameSource::Dynamic(_) => buf.push_str("<dynamic>"),
        }
        buf.push('\n');
        for child in &self.children {
            child.print(prefix, level + 1, buf);
        }
    }
}

impl fmt::Debug for CompletionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.name {
            NameSource::Static(name) => name.as_str(),
            NameSource::Dynamic(_) => "<dynamic>",
        };
        f.debug_struct("CompletionNode")
            .field("name", &name)
            .field("is_argument", &self.is_argument)
            .field("children", &self.children)
            .finish()
    }
}

/// Compute the completion candidates for `line`, the text left of the cursor.
pub fn complete(tree: &CompletionNode, line: &str) -> Completion {
    let chars: Vec<char> = line.chars().collect();
    let completion = complete_level(tree, &chars, line);
    trace!(line, candidates = ?completion.candidates, offset = completion.offset, "completed");
    completion
}

struct Match {
    suggestion: Vec<char>,
    offset: usize,
    descend: bool,
}

/// `name` is fully typed once `line` starts with it. Exactly the name yields a
/// bare space; more text echoes the name and lets the walk descend.
fn match_keyword(name: &[char], line: &[char]) -> Option<Match> {
    if line.len() >= name.len() {
        if !line.starts_with(name) {
            return None;
        }
        let suggestion = if line.len() == name.len() {
            vec![' ']
        } else {
            name.to_vec()
        };
        Some(Match {
            suggestion,
            offset: name.len(),
            descend: true,
        })
    } else if name.starts_with(line) {
        Some(Match {
            suggestion: name[line.len()..].to_vec(),
            offset: line.len(),
            descend: false,
        })
    } else {
        None
    }
}

/// Once `key=` is typed the argument waits for its value. A value asks for a
/// separating space, and after the space the argument is offered again.
fn match_argument(name: &[char], line: &[char]) -> Option<Match> {
    if line.len() >= name.len() {
        if !line.starts_with(name) {
            return None;
        }
        match line.last() {
            Some(' ') => Some(Match {
                suggestion: name.to_vec(),
                offset: line.len(),
                descend: true,
            }),
            Some('=') => None,
            _ => Some(Match {
                suggestion: vec![' '],
                offset: line.len(),
                descend: false,
            }),
        }
    } else if name.starts_with(line) {
        Some(Match {
            suggestion: name[line.len()..].to_vec(),
            offset: line.len(),
            descend: false,
        })
    } else {
        None
    }
}

fn complete_level(node: &CompletionNode, line: &[char], orig_line: &str) -> Completion {
    let start = line.iter().position(|c| !c.is_whitespace()).unwrap_or(line.len());
    let line = &line[start..];

    let mut completion = Completion::default();
    let mut descend = false;
    let mut next = node;

    for child in &node.children {
        for name in child.canonical_names(orig_line) {
            let matched = if child.is_argument {
                match_argument(&name, line)
            } else {
                match_keyword(&name, line)
            };
            let Some(m) = matched else {
                continue;
            };
            completion.candidates.push(m.suggestion.into_iter().collect());
            completion.offset = m.offset;
            descend = m.descend;
            // arguments stay selectable, so the walk continues on this level
            next = if child.is_argument { node } else { child };
        }
    }

    if completion.candidates.len() != 1 {
        return completion;
    }

    if let Some(rest) = (completion.offset..line.len()).find(|&i| line[i] != ' ') {
        return complete_level(next, &line[rest..], orig_line);
    }
    if descend {
        return complete_level(next, &[], orig_line);
    }
    completion
}
