//! Line editing boundary of the interpreter.
//!
//! The session loop only talks to a [`LineSource`]. [`ReadlineSource`] is the
//! implementation backed by [`rustyline`], with tab completion driven by
//! [`complete`](crate::complete::complete).

use crate::complete::{self, Completion, CompletionNode};
use crate::config::Config;
use crate::error::CliError;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Cmd, CompletionType, Context, Editor, Helper, KeyEvent};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Result of asking a [`LineSource`] for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// The operator pressed the interrupt key at the prompt.
    Interrupted,
    /// The input stream ended.
    Eof,
}

/// Where the session loop gets its input from.
pub trait LineSource {
    /// Block until the operator entered a line.
    ///
    /// An `Err` is fatal to the session.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, CliError>;

    fn add_history(&mut self, line: &str) -> Result<(), CliError>;

    /// Use `tree` for completion from now on.
    fn register_completion(&mut self, tree: CompletionNode);

    /// Called once when the session ends.
    fn close(&mut self) -> Result<(), CliError> {
        Ok(())
    }
}

fn line_source_error(err: ReadlineError) -> CliError {
    CliError::LineSource(err.to_string())
}

/// rustyline helper offering completions from a [`CompletionNode`] tree.
pub struct CommandHelper {
    tree: CompletionNode,
}

impl CommandHelper {
    pub fn new(tree: CompletionNode) -> Self {
        Self { tree }
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let Completion { candidates, offset } = complete::complete(&self.tree, typed);

        // rustyline replaces from a byte position, the engine counts chars
        let start = match offset {
            0 => pos,
            n => typed.char_indices().rev().nth(n - 1).map_or(0, |(i, _)| i),
        };
        let word = &typed[start..];

        let pairs = candidates
            .into_iter()
            .map(|candidate| {
                let replacement = format!("{word}{candidate}");
                Pair {
                    display: replacement.trim_end().to_string(),
                    replacement,
                }
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

impl Helper for CommandHelper {}

/// Interactive terminal input through rustyline.
pub struct ReadlineSource {
    editor: Editor<CommandHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl ReadlineSource {
    /// Create the editor and load history from `config.history_file` if it exists.
    pub fn new(config: &Config) -> Result<Self, CliError> {
        let rl_config = rustyline::Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::with_config(rl_config).map_err(line_source_error)?;
        // suspending would leave the session stopped in the background
        editor.bind_sequence(KeyEvent::ctrl('Z'), Cmd::Noop);

        if let Some(path) = config.history_file.as_deref().filter(|p| p.exists()) {
            if let Err(err) = editor.load_history(path) {
                warn!(path = %path.display(), "failed to load history: {err}");
            }
        }

        Ok(Self {
            editor,
            history_file: config.history_file.clone(),
        })
    }
}

impl LineSource for ReadlineSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(line_source_error(err)),
        }
    }

    fn add_history(&mut self, line: &str) -> Result<(), CliError> {
        self.editor
            .add_history_entry(line)
            .map(|_| ())
            .map_err(line_source_error)
    }

    fn register_completion(&mut self, tree: CompletionNode) {
        self.editor.set_helper(Some(CommandHelper::new(tree)));
    }

    fn close(&mut self) -> Result<(), CliError> {
        if let Some(path) = &self.history_file {
            debug!(path = %path.display(), "saving history");
            self.editor.save_history(path).map_err(line_source_error)?;
        }
        Ok(())
    }
}
