use crate::parser::ParsingError;
use thiserror::Error;

/// Everything that can go wrong between reading a line and running a handler.
///
/// Only [`CliError::LineSource`] is fatal to a session; the loop reports every
/// other variant to the operator and goes back to the prompt.
#[derive(Debug, Error)]
pub enum CliError {
    /// The line could not be tokenized, e.g. an unterminated backtick quote.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ParsingError),

    /// No root command matches the first token.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The resolved command is a grouping node without a handler.
    #[error("no handler for command: {0}")]
    NoHandler(String),

    /// The handler itself returned an error.
    #[error("command `{command}` failed: {error:#}")]
    HandlerFailure {
        command: String,
        error: anyhow::Error,
    },

    /// The line editor failed in a way the session cannot recover from.
    #[error("line source failed: {0}")]
    LineSource(String),

    /// Writing to the session's output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the session loop has to stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CliError::LineSource(_))
    }
}
