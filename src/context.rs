use std::collections::HashMap;

/// Mutable, per-session state handed to every command handler.
///
/// The context contains:
/// - `name`: the session name, empty for the default session.
/// - `command_path`: names matched while resolving the current line. It is
///   cleared before every line is dispatched.
/// - `values`: an in-memory key/value store handlers can use to keep state
///   between lines of the same session.
///
/// Contexts are owned by the [`Interpreter`](crate::Interpreter); handlers only
/// ever receive a mutable borrow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    name: String,
    command_path: Vec<String>,
    values: HashMap<String, String>,
}

impl SessionContext {
    /// Create an empty context for the session called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the commands matched so far for the current line, outermost first.
    pub fn command_path(&self) -> &[String] {
        &self.command_path
    }

    pub fn reset_commands(&mut self) {
        self.command_path.clear();
    }

    pub fn push_command(&mut self, name: impl Into<String>) {
        self.command_path.push(name.into());
    }

    /// Get a value stored in this session.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set or override a value stored in this session.
    pub fn set(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.values.insert(key.into(), val.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::SessionContext;

    #[test]
    fn test_context_set_and_get_value() {
        let mut ctx = SessionContext::new("");

        // initially absent
        assert_eq!(ctx.get("token"), None);

        ctx.set("token", "abc");
        assert_eq!(ctx.get("token"), Some("abc"));

        assert_eq!(ctx.remove("token"), Some("abc".to_string()));
        assert_eq!(ctx.get("token"), None);
    }

    #[test]
    fn test_command_path_push_and_reset() {
        let mut ctx = SessionContext::new("admin");
        ctx.push_command("sql");
        ctx.push_command("login");
        assert_eq!(ctx.command_path(), ["sql", "login"]);
        assert_eq!(ctx.name(), "admin");

        ctx.reset_commands();
        assert!(ctx.command_path().is_empty());
    }
}
