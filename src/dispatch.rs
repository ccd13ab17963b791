//! Resolution of a token sequence against the command tree.
//!
//! Starting from the roots, the first token selects a root command by name.
//! After that every following token descends one level as long as it names a
//! child of the node matched last. The first token that does not name a child
//! ends the walk: the node matched last is the dispatch target and every token
//! after it is passed to its handler.

use crate::command::{Action, Args, CommandNode};
use crate::context::SessionContext;
use crate::error::CliError;
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Outcome of walking the tree for a token sequence.
#[derive(Debug)]
pub struct Resolution<'t> {
    /// The node the walk stopped at.
    pub node: &'t CommandNode,
    /// Names matched on the way, root first. Always ends with `node.name`.
    pub path: Vec<&'t str>,
    /// How many leading tokens were consumed as path.
    pub consumed: usize,
}

impl Resolution<'_> {
    /// Tokens remaining after the consumed path.
    pub fn args(&self, tokens: &[String]) -> Args {
        Args::new(tokens[self.consumed..].to_vec())
    }
}

/// Find the deepest command named by the leading tokens.
///
/// Returns `None` when no root command matches the first token. Among siblings
/// sharing a name the first one registered wins.
pub fn resolve<'t>(roots: &'t [CommandNode], tokens: &[String]) -> Option<Resolution<'t>> {
    let first = tokens.first()?;
    let mut node = roots.iter().find(|c| c.name == *first)?;
    let mut path = vec![node.name.as_str()];

    while let Some(child) = tokens.get(path.len()).and_then(|t| node.child(t)) {
        node = child;
        path.push(node.name.as_str());
    }

    Some(Resolution {
        node,
        consumed: path.len(),
        path,
    })
}

/// Resolve `tokens` and invoke the handler of the resolved command.
///
/// Every matched name is pushed onto the context's command path before the
/// handler runs. An empty token sequence is a no-op. A handler that returns an
/// error or panics yields [`CliError::HandlerFailure`].
pub fn dispatch(
    ctx: &mut SessionContext,
    roots: &[CommandNode],
    tokens: &[String],
    stdout: &mut dyn Write,
) -> Result<(), CliError> {
    let Some(first) = tokens.first() else {
        return Ok(());
    };
    let resolution = resolve(roots, tokens).ok_or_else(|| CliError::UnknownCommand(first.clone()))?;

    for name in &resolution.path {
        ctx.push_command(*name);
    }
    let command = resolution.path.join(" ");
    let args = resolution.args(tokens);
    debug!(%command, args = ?args.values, "dispatching");

    match &resolution.node.action {
        Action::Executable(handler) => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, args, stdout)));
            match outcome {
                Ok(result) => result.map_err(|error| CliError::HandlerFailure { command, error }),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(%command, %message, "handler panicked");
                    Err(CliError::HandlerFailure {
                        command,
                        error: anyhow::anyhow!("panicked: {message}"),
                    })
                }
            }
        }
        Action::Group => Err(CliError::NoHandler(command)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
