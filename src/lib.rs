//! An embeddable interpreter for trees of nested commands.
//!
//! A host registers root commands, each with any number of nested subcommands,
//! and hands control to [`Interpreter`]. Every line the operator types is split
//! into tokens (backticks group words into one token), the deepest command
//! named by the leading tokens is looked up and its handler is called with the
//! remaining tokens. The same tree drives tab completion in the line editor.
//!
//! The public modules [`command`] and [`context`] expose the types handlers
//! work with; [`complete`] and [`dispatch`] can be used on their own when the
//! host runs its own loop.

pub mod command;
pub mod complete;
mod config;
pub mod context;
pub mod dispatch;
pub mod editor;
mod error;
mod help;
mod interpreter;
pub mod parser;
pub mod signal;

pub use command::{Args, CommandNode, CommandTree};
pub use config::Config;
pub use context::SessionContext;
pub use error::CliError;
pub use help::HelpStyle;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{ExitCode, Flow, Interpreter, RESERVED_COMMANDS};
