use crate::help::HelpStyle;
use std::path::PathBuf;

/// Settings of an [`Interpreter`](crate::Interpreter) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Printed before every line read interactively.
    pub prompt: String,
    /// Where line history is loaded from at start and saved to on exit.
    pub history_file: Option<PathBuf>,
    pub help_style: HelpStyle,
    /// Printed by the default exit hook.
    pub farewell: String,
    /// When set, unattended mode exits with 1 if the line could not be run
    /// successfully. Otherwise it always exits with 0.
    pub unattended_exit_codes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            history_file: None,
            help_style: HelpStyle::default(),
            farewell: "bye".to_string(),
            unattended_exit_codes: true,
        }
    }
}
