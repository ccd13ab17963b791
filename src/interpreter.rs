use crate::command::{CommandNode, CommandTree};
use crate::complete::CompletionNode;
use crate::config::Config;
use crate::context::SessionContext;
use crate::dispatch::dispatch;
use crate::editor::{LineSource, ReadOutcome};
use crate::error::CliError;
use crate::help::write_help;
use crate::parser::{Parser, QuoteParser};
use crate::signal::CancellationToken;
use std::collections::HashMap;
use std::io::{self, Write};
use tracing::{debug, info, warn};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Names handled by the interpreter itself. Commands registered under these
/// names are never reached.
pub const RESERVED_COMMANDS: [&str; 3] = ["exit", "clear", "help"];

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

type ExitHook = Box<dyn FnMut(&mut dyn Write) -> io::Result<()>>;

/// What the caller should do after a line has been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The operator asked to leave the session.
    Exit,
}

/// An interactive interpreter over a tree of nested commands.
///
/// The interpreter owns the command tree and one [`SessionContext`] per session
/// name. Lines are tokenized, the reserved commands `exit`, `clear` and `help`
/// are handled directly and everything else is dispatched to the tree.
///
/// Example
/// ```
/// use cmdtree::{CommandNode, Config, Interpreter};
/// let mut cli = Interpreter::new(Config::default());
/// cli.add_command(CommandNode::new("echo", "print arguments", |_ctx, args, out| {
///     write!(out, "{}", args.values.join(" "))?;
///     Ok(())
/// }));
/// let mut out = Vec::new();
/// let code = cli.run_unattended(&["echo", "hello", "world"], &mut out);
/// assert_eq!(code, 0);
/// assert_eq!(String::from_utf8(out).unwrap(), "hello world\n");
/// ```
pub struct Interpreter {
    commands: CommandTree,
    contexts: HashMap<String, SessionContext>,
    current: String,
    parser: Box<dyn Parser>,
    config: Config,
    on_exit: ExitHook,
    closed: bool,
}

impl Interpreter {
    /// Create an interpreter with no commands, positioned on the default session.
    pub fn new(config: Config) -> Self {
        let farewell = config.farewell.clone();
        let mut cli = Self {
            commands: CommandTree::new(),
            contexts: HashMap::new(),
            current: String::new(),
            parser: Box::new(QuoteParser),
            config,
            on_exit: Box::new(move |out: &mut dyn Write| writeln!(out, "{farewell}")),
            closed: false,
        };
        cli.set_context("");
        cli
    }

    /// Register a root command together with its subcommands.
    pub fn add_command(&mut self, command: CommandNode) {
        if RESERVED_COMMANDS.contains(&command.name.as_str()) {
            warn!(name = %command.name, "command name is reserved and will never be dispatched");
        }
        self.commands.add(command);
    }

    pub fn commands(&self) -> &CommandTree {
        &self.commands
    }

    /// Completion tree mirroring the registered commands.
    pub fn completion_tree(&self) -> CompletionNode {
        CompletionNode::from_commands(&self.commands)
    }

    /// Switch to the session called `name`, creating it on first use.
    pub fn set_context(&mut self, name: &str) -> &mut SessionContext {
        self.current = name.to_string();
        self.contexts
            .entry(self.current.clone())
            .or_insert_with(|| SessionContext::new(name))
    }

    /// The current session's context.
    ///
    /// `new` and `set_context` insert the entry for `current`, so it always exists.
    pub fn context(&self) -> &SessionContext {
        &self.contexts[&self.current]
    }

    pub fn set_parser(&mut self, parser: impl Parser + 'static) {
        self.parser = Box::new(parser);
    }

    /// Replace the hook run once when the session ends.
    pub fn on_exit<F>(&mut self, hook: F)
    where
        F: FnMut(&mut dyn Write) -> io::Result<()> + 'static,
    {
        self.on_exit = Box::new(hook);
    }

    /// Tokenize and run a single line.
    ///
    /// Returns [`Flow::Exit`] for the `exit` command without running the exit
    /// hook; that is left to [`Interpreter::shutdown`].
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<Flow, CliError> {
        let ctx = self
            .contexts
            .entry(self.current.clone())
            .or_insert_with(|| SessionContext::new(self.current.as_str()));
        ctx.reset_commands();

        let tokens = self.parser.parse_strict(line)?;
        let Some(first) = tokens.first() else {
            writeln!(stdout, "warning: No input detected")?;
            return Ok(Flow::Continue);
        };

        match first.as_str() {
            "exit" => return Ok(Flow::Exit),
            "clear" => {
                stdout.write_all(CLEAR_SCREEN.as_bytes())?;
                stdout.flush()?;
                return Ok(Flow::Continue);
            }
            "help" => {
                write_help(self.commands.roots(), self.config.help_style, stdout)?;
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        dispatch(ctx, self.commands.roots(), &tokens, stdout)?;
        writeln!(stdout)?;
        Ok(Flow::Continue)
    }

    /// Print a recoverable error for the operator.
    pub fn report(&self, err: &CliError, stdout: &mut dyn Write) -> io::Result<()> {
        debug!(error = ?err, "reporting error");
        writeln!(stdout, "error: {err}")
    }

    /// Run the exit hook. Only the first call has an effect.
    pub fn shutdown(&mut self, stdout: &mut dyn Write) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("session closing");
        (self.on_exit)(stdout)
    }

    /// Run one line built from `args` joined by single spaces, then stop.
    ///
    /// Errors are reported to `stdout`. The returned exit code is 1 if the line
    /// failed and [`Config::unattended_exit_codes`] is set, 0 otherwise.
    pub fn run_unattended<S: AsRef<str>>(&mut self, args: &[S], stdout: &mut dyn Write) -> ExitCode {
        let line = args.iter().map(|a| a.as_ref()).collect::<Vec<&str>>().join(" ");
        debug!(%line, "running unattended");

        let result = match self.execute_line(&line, stdout) {
            Ok(Flow::Exit) => self.shutdown(stdout).map_err(CliError::from),
            Ok(Flow::Continue) => Ok(()),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => 0,
            Err(err) => {
                if let Err(io_err) = self.report(&err, stdout) {
                    warn!("failed to report error: {io_err}");
                }
                if self.config.unattended_exit_codes { 1 } else { 0 }
            }
        }
    }

    /// Read and execute lines from `source` until the session ends.
    ///
    /// The session ends on `exit`, on an interrupt at the prompt, at end of
    /// input, or once `cancel` is set; the exit hook runs in every case, also
    /// when the session ends with an error. Only a failing line source or a
    /// failing `stdout` is returned as an error.
    pub fn repl(
        &mut self,
        source: &mut dyn LineSource,
        cancel: &CancellationToken,
        stdout: &mut dyn Write,
    ) -> Result<(), CliError> {
        source.register_completion(self.completion_tree());

        let outcome = self.read_eval_loop(source, cancel, stdout);
        let closed = self.close(source, stdout);
        outcome.and(closed)
    }

    fn read_eval_loop(
        &mut self,
        source: &mut dyn LineSource,
        cancel: &CancellationToken,
        stdout: &mut dyn Write,
    ) -> Result<(), CliError> {
        loop {
            if cancel.is_cancelled() {
                info!("cancelled");
                return Ok(());
            }

            let line = match source.read_line(&self.config.prompt)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Interrupted => {
                    writeln!(stdout, "^C")?;
                    return Ok(());
                }
                ReadOutcome::Eof => return Ok(()),
            };

            if let Err(err) = source.add_history(&line) {
                warn!("failed to add history entry: {err}");
            }

            match self.execute_line(&line, stdout) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(err) => self.report(&err, stdout)?,
            }
        }
    }

    fn close(&mut self, source: &mut dyn LineSource, stdout: &mut dyn Write) -> Result<(), CliError> {
        let hook = self.shutdown(stdout);
        if let Err(err) = source.close() {
            warn!("failed to close line source: {err}");
        }
        hook.map_err(CliError::from)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::help::HelpStyle;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample() -> Interpreter {
        let mut cli = Interpreter::default();
        cli.add_command(
            CommandNode::new("github", "github commands", |_ctx, _args, out| {
                write!(out, "I do nothing...")?;
                Ok(())
            })
            .subcommand(CommandNode::new("login", "log in", |ctx, args, out| {
                let user = args.get(0).ok_or_else(|| anyhow::anyhow!("Failed login"))?;
                ctx.set("user", user);
                write!(out, "Logged in {user} via {}", ctx.command_path().join("/"))?;
                Ok(())
            })),
        );
        cli.add_command(CommandNode::group("sql", "sql commands"));
        cli
    }

    fn run(cli: &mut Interpreter, line: &str) -> (Result<Flow, CliError>, String) {
        let mut out = Vec::new();
        let res = cli.execute_line(line, &mut out);
        (res, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_dispatch_prints_trailing_newline() {
        let mut cli = sample();
        let (res, out) = run(&mut cli, "github login alice");
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "Logged in alice via github/login\n");
        assert_eq!(cli.context().get("user"), Some("alice"));
    }

    #[test]
    fn test_command_path_is_reset_every_line() {
        let mut cli = sample();
        run(&mut cli, "github login alice");
        run(&mut cli, "github");
        assert_eq!(cli.context().command_path(), ["github"]);

        run(&mut cli, "");
        assert!(cli.context().command_path().is_empty());
    }

    #[test]
    fn test_empty_line_warns() {
        let mut cli = sample();
        let (res, out) = run(&mut cli, "   ");
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, "warning: No input detected\n");
    }

    #[test]
    fn test_reserved_commands() {
        let mut cli = sample();
        assert_eq!(run(&mut cli, "exit").0.unwrap(), Flow::Exit);

        let (res, out) = run(&mut cli, "clear");
        assert_eq!(res.unwrap(), Flow::Continue);
        assert_eq!(out, CLEAR_SCREEN);

        let (_, out) = run(&mut cli, "help");
        assert_eq!(out, "[github]: github commands\n\t[login]: log in\n[sql]: sql commands\n");
    }

    #[test]
    fn test_reserved_name_shadows_registered_command() {
        let mut cli = Interpreter::new(Config {
            help_style: HelpStyle::Nested,
            ..Config::default()
        });
        cli.add_command(CommandNode::new("help", "never reached", |_ctx, _args, out| {
            write!(out, "custom")?;
            Ok(())
        }));
        let (_, out) = run(&mut cli, "help");
        assert_eq!(out, "[help]: never reached\n");
    }

    #[test]
    fn test_errors_are_returned() {
        let mut cli = sample();
        assert!(matches!(run(&mut cli, "nope").0, Err(CliError::UnknownCommand(_))));
        assert!(matches!(run(&mut cli, "sql").0, Err(CliError::NoHandler(_))));
        assert!(matches!(
            run(&mut cli, "github login").0,
            Err(CliError::HandlerFailure { .. })
        ));
        assert!(matches!(
            run(&mut cli, "github login `alice").0,
            Err(CliError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_contexts_are_kept_per_name() {
        let mut cli = sample();
        run(&mut cli, "github login alice");

        cli.set_context("other");
        assert_eq!(cli.context().name(), "other");
        assert_eq!(cli.context().get("user"), None);
        run(&mut cli, "github login bob");

        cli.set_context("");
        assert_eq!(cli.context().get("user"), Some("alice"));
        cli.set_context("other");
        assert_eq!(cli.context().get("user"), Some("bob"));
    }

    #[test]
    fn test_shutdown_runs_hook_once() {
        let calls = Rc::new(RefCell::new(0));
        let mut cli = sample();
        let counter = calls.clone();
        cli.on_exit(move |out| {
            *counter.borrow_mut() += 1;
            writeln!(out, "see you")
        });

        let mut out = Vec::new();
        cli.shutdown(&mut out).unwrap();
        cli.shutdown(&mut out).unwrap();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "see you\n");
    }

    #[test]
    fn test_unattended_exit_codes() {
        let mut cli = sample();
        let mut out = Vec::new();
        assert_eq!(cli.run_unattended(&["github", "login", "alice"], &mut out), 0);
        assert_eq!(cli.run_unattended(&["nope"], &mut out), 1);
        assert_eq!(cli.run_unattended(&["exit"], &mut out), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Logged in alice via github/login\nerror: unknown command: nope\nbye\n"
        );

        let mut lenient = Interpreter::new(Config {
            unattended_exit_codes: false,
            ..Config::default()
        });
        assert_eq!(lenient.run_unattended(&["nope"], &mut Vec::<u8>::new()), 0);
    }

    #[test]
    fn test_unattended_help_prints_listing() {
        let mut cli = sample();
        let mut out = Vec::new();
        assert_eq!(cli.run_unattended(&["help"], &mut out), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[github]: github commands\n\t[login]: log in\n[sql]: sql commands\n"
        );
    }

    #[test]
    fn test_unattended_joins_arguments() {
        let mut cli = Interpreter::default();
        cli.add_command(CommandNode::new("say", "", |_ctx, args, out| {
            write!(out, "{:?}", args.values)?;
            Ok(())
        }));
        let mut out = Vec::new();
        let args = vec!["say".to_string(), "`hello".to_string(), "world`".to_string()];
        assert_eq!(cli.run_unattended(args.as_slice(), &mut out), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "[\"hello world\"]\n");
    }
}
