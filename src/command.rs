use crate::context::SessionContext;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Tokens left over after the command path has been resolved.
///
/// Handed to the handler by value, in the order they were typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub values: Vec<String>,
}

impl Args {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up the value of a `key=value` argument.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.values.iter().find_map(|v| {
            v.split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, val)| val)
        })
    }
}

/// Signature of a command handler.
///
/// Output meant for the operator goes to `stdout`. Returning an error or
/// panicking does not end the session: the interpreter reports it and returns
/// to the prompt.
pub type Handler =
    Box<dyn Fn(&mut SessionContext, Args, &mut dyn Write) -> anyhow::Result<()>>;

/// Callback computing completion candidates at completion time.
///
/// It receives the whole line typed so far.
pub type DynamicNames = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// What happens when a node is the end point of a dispatch.
pub enum Action {
    /// Run the handler with the remaining tokens.
    Executable(Handler),
    /// Pure namespace for its children; selecting it runs nothing.
    Group,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Executable(_) => f.write_str("Executable"),
            Action::Group => f.write_str("Group"),
        }
    }
}

/// One entry of the command tree.
///
/// Besides the dispatch data (`name`, `action`, `children`) a node carries the
/// completion metadata used to derive the completion tree: the `key=` argument
/// names it accepts and an optional callback suggesting positional values.
pub struct CommandNode {
    pub name: String,
    pub help: String,
    pub action: Action,
    pub children: Vec<CommandNode>,
    pub arguments: Vec<String>,
    pub suggestions: Option<DynamicNames>,
}

impl CommandNode {
    /// A grouping node without handler.
    pub fn group(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            action: Action::Group,
            children: Vec::new(),
            arguments: Vec::new(),
            suggestions: None,
        }
    }

    /// An executable node.
    pub fn new<F>(name: impl Into<String>, help: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut SessionContext, Args, &mut dyn Write) -> anyhow::Result<()> + 'static,
    {
        Self {
            action: Action::Executable(Box::new(handler)),
            ..Self::group(name, help)
        }
    }

    /// Append a subcommand. Sibling order is kept.
    pub fn subcommand(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    /// Declare `key=` arguments offered by completion.
    pub fn with_arguments<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(names.into_iter().map(Into::into));
        self
    }

    /// Offer values computed at completion time after this command.
    pub fn with_suggestions<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestions = Some(Arc::new(callback));
        self
    }

    pub fn is_executable(&self) -> bool {
        matches!(self.action, Action::Executable(_))
    }

    /// First child called `name`.
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Number of edges on the longest path from this node down to a leaf.
    pub fn depth(&self) -> usize {
        self.children.iter().map(|c| c.depth() + 1).max().unwrap_or(0)
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("children", &self.children)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Ordered forest of root commands.
///
/// Nodes own their children, so a node can never be its own descendant.
#[derive(Debug, Default)]
pub struct CommandTree {
    roots: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root command together with all its subcommands.
    pub fn add(&mut self, node: CommandNode) {
        if self.root(&node.name).is_some() {
            tracing::warn!(name = %node.name, "duplicate root command, the first one wins");
        }
        self.roots.push(node);
    }

    pub fn roots(&self) -> &[CommandNode] {
        &self.roots
    }

    /// First root called `name`.
    pub fn root(&self, name: &str) -> Option<&CommandNode> {
        self.roots.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut SessionContext, _: Args, _: &mut dyn Write) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_add_counts_only_roots() {
        let mut tree = CommandTree::new();
        tree.add(
            CommandNode::new("github", "github commands", noop)
                .subcommand(CommandNode::new("login", "log in", noop))
                .subcommand(CommandNode::new("logout", "log out", noop)),
        );
        assert_eq!(tree.len(), 1);

        tree.add(CommandNode::group("sql", "sql commands"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.roots()[1].name, "sql");
    }

    #[test]
    fn test_group_is_not_executable() {
        let group = CommandNode::group("ns", "namespace");
        assert!(!group.is_executable());
        assert!(CommandNode::new("run", "", noop).is_executable());
    }

    #[test]
    fn test_child_lookup_and_depth() {
        let node = CommandNode::group("root", "")
            .subcommand(CommandNode::group("mid", "").subcommand(CommandNode::new("leaf", "", noop)))
            .subcommand(CommandNode::new("other", "", noop));

        assert_eq!(node.child("other").map(|c| c.name.as_str()), Some("other"));
        assert!(node.child("leaf").is_none());
        assert_eq!(node.depth(), 2);
    }

    #[test]
    fn test_args_option_lookup() {
        let args = Args::new(vec!["user=alice".into(), "verbose".into(), "host=db=1".into()]);
        assert_eq!(args.option("user"), Some("alice"));
        assert_eq!(args.option("host"), Some("db=1"));
        assert_eq!(args.option("verbose"), None);
        assert_eq!(args.get(1), Some("verbose"));
        assert_eq!(args.len(), 3);
    }
}
