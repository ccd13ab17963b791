use argh::FromArgs;
use cmdtree::editor::ReadlineSource;
use cmdtree::signal::{CancellationToken, install_interrupt_handler};
use cmdtree::{CommandNode, Config, HelpStyle, Interpreter};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// Demo shell with nested `github` and `sql` commands.
#[argh(note = "Run `{command_name} unattended <words>...` to execute one command line and exit. \
Every word after `unattended` is passed on verbatim, including `help` and `--help`.")]
struct Opts {
    #[argh(option, default = "String::from(\"> \")")]
    /// text shown before every line.
    prompt: String,

    #[argh(option)]
    /// file to load line history from and save it to on exit.
    history_file: Option<PathBuf>,

    #[argh(switch)]
    /// indent `help` output strictly by command depth.
    nested_help: bool,
}

/// Words of the command line to run when started as `<bin> unattended ...`.
///
/// Checked before flag parsing so that words like `help` or `--help` reach the
/// interpreter instead of the flag parser.
fn unattended_line(args: &[String]) -> Option<&[String]> {
    match args {
        [_bin, mode, line @ ..] if mode == "unattended" => Some(line),
        _ => None,
    }
}

fn account_commands(name: &str, help: &str) -> CommandNode {
    CommandNode::new(name, help, |_ctx, _args, out| {
        write!(out, "I do nothing...")?;
        Ok(())
    })
    .subcommand(
        CommandNode::new("login", "store the user name for this session", |ctx, args, out| {
            let user = args
                .option("user")
                .or_else(|| args.get(0))
                .ok_or_else(|| anyhow::anyhow!("Failed login: no user given"))?;
            ctx.set("user", user);
            write!(out, "Logged in {user} ({})", ctx.command_path().join(" "))?;
            Ok(())
        })
        .with_arguments(["user"]),
    )
    .subcommand(
        CommandNode::new("logout", "forget the user of this session", |ctx, _args, out| {
            match ctx.remove("user") {
                Some(user) => write!(out, "Logged out with username {user}")?,
                None => write!(out, "Failed logout: nobody is logged in")?,
            }
            Ok(())
        })
        .subcommand(CommandNode::group("defer", "defer a logout")),
    )
}

fn add_commands(cli: &mut Interpreter) {
    cli.add_command(account_commands("github", "github primary command interface"));
    cli.add_command(
        account_commands("sql", "sql primary command interface").subcommand(
            CommandNode::new("query", "echo a query back", |ctx, args, out| {
                let who = ctx.get("user").unwrap_or("anonymous");
                write!(out, "{who}: {}", args.values.join(" "))?;
                Ok(())
            })
            .with_arguments(["limit", "format"])
            .with_suggestions(|_line| vec!["select".to_string(), "explain".to_string()]),
        ),
    );
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if let Some(line) = unattended_line(&args) {
        let mut cli = Interpreter::new(Config::default());
        add_commands(&mut cli);
        let code = cli.run_unattended(line, &mut std::io::stdout());
        std::process::exit(code);
    }

    let opts: Opts = argh::from_env();
    let config = Config {
        prompt: opts.prompt,
        history_file: opts.history_file,
        help_style: if opts.nested_help {
            HelpStyle::Nested
        } else {
            HelpStyle::ResetOnRootName
        },
        ..Config::default()
    };

    let mut cli = Interpreter::new(config.clone());
    add_commands(&mut cli);
    let mut stdout = std::io::stdout();

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel)?;
    let mut source = ReadlineSource::new(&config)?;
    cli.repl(&mut source, &cancel, &mut stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_unattended_words_bypass_flag_parsing() {
        let args = words("cmdtree unattended help");
        assert_eq!(unattended_line(&args), Some(&args[2..]));

        let args = words("cmdtree unattended --help");
        assert_eq!(unattended_line(&args).unwrap(), ["--help"]);

        let args = words("cmdtree unattended");
        assert_eq!(unattended_line(&args).unwrap().len(), 0);
    }

    #[test]
    fn test_interactive_invocations_are_not_unattended() {
        assert_eq!(unattended_line(&words("cmdtree")), None);
        assert_eq!(unattended_line(&words("cmdtree --prompt unattended")), None);
        assert_eq!(unattended_line(&words("cmdtree --nested-help unattended help")), None);
    }

    #[test]
    fn test_unattended_help_lists_demo_commands() {
        let mut cli = Interpreter::new(Config::default());
        add_commands(&mut cli);
        let mut out = Vec::new();

        assert_eq!(cli.run_unattended(&["help"], &mut out), 0);
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("[github]: github primary command interface\n\t[login]:"));
        assert!(out.contains("[sql]: sql primary command interface\n"));
    }
}
