//! Splitting of a raw input line into argument tokens.
//!
//! Tokens are separated by runs of whitespace. A run of chunks wrapped in
//! backticks is joined back with single spaces and yields one token, so
//! `` say `hello world` `` produces `["say", "hello world"]`. There is no
//! escaping of backticks inside a quoted run.

use thiserror::Error;

/// Opens and closes a quoted run.
const QUOTE: char = '`';

/// Errors that can occur while tokenizing a line in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsingError {
    /// An opening backtick was never closed.
    ///
    /// `tokens` holds everything emitted before the quoted run started and
    /// `partial` the text accumulated inside the run.
    #[error("unterminated quote near `{partial}")]
    UnterminatedQuote { tokens: Vec<String>, partial: String },
}

/// Anything able to turn a raw line into tokens.
pub trait Parser {
    /// Tokenize `input`, silently dropping an unterminated quoted run.
    fn parse(&self, input: &str) -> Vec<String>;

    /// Tokenize `input`, reporting an unterminated quoted run as an error.
    fn parse_strict(&self, input: &str) -> Result<Vec<String>, ParsingError>;
}

/// The default tokenizer honouring backtick quoting.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuoteParser;

impl Parser for QuoteParser {
    fn parse(&self, input: &str) -> Vec<String> {
        match split_into_tokens(input) {
            Ok(tokens) => tokens,
            Err(ParsingError::UnterminatedQuote { tokens, .. }) => tokens,
        }
    }

    fn parse_strict(&self, input: &str) -> Result<Vec<String>, ParsingError> {
        split_into_tokens(input)
    }
}

/// Split `input` into tokens.
///
/// A chunk both opening and closing a quote (e.g. `` `one` ``) is emitted as a
/// single token with the backticks stripped. A closing chunk seen outside of a
/// quoted run is emitted unchanged.
pub fn split_into_tokens(input: &str) -> Result<Vec<String>, ParsingError> {
    let mut tokens = Vec::new();
    let mut quoted: Option<String> = None;

    for chunk in input.split_whitespace() {
        match quoted.take() {
            Some(mut run) => {
                run.push(' ');
                match chunk.strip_suffix(QUOTE) {
                    Some(last) => {
                        run.push_str(last);
                        tokens.push(run);
                    }
                    None => {
                        run.push_str(chunk);
                        quoted = Some(run);
                    }
                }
            }
            None => match chunk.strip_prefix(QUOTE) {
                Some(rest) => match rest.strip_suffix(QUOTE) {
                    Some(whole) => tokens.push(whole.to_string()),
                    None => quoted = Some(rest.to_string()),
                },
                None => tokens.push(chunk.to_string()),
            },
        }
    }

    match quoted {
        Some(partial) => Err(ParsingError::UnterminatedQuote { tokens, partial }),
        None => Ok(tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_run_is_single_token() {
        let parsed = QuoteParser.parse("aa bb cc `hello world` dd");
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[3], "hello world");
        assert_eq!(parsed[4], "dd");
    }

    #[test]
    fn test_plain_input_matches_whitespace_split() {
        let line = "  github   login \t alice\nbob ";
        let expected: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        assert_eq!(QuoteParser.parse(line), expected);
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert!(QuoteParser.parse("").is_empty());
        assert!(QuoteParser.parse("   \t ").is_empty());
    }

    #[test]
    fn test_long_quoted_run_joins_with_single_spaces() {
        let parsed = QuoteParser.parse("echo `a   b    c` tail");
        assert_eq!(parsed, vec!["echo", "a b c", "tail"]);
    }

    #[test]
    fn test_single_chunk_quote() {
        assert_eq!(QuoteParser.parse("set `value`"), vec!["set", "value"]);
        assert_eq!(QuoteParser.parse("set ``"), vec!["set", ""]);
    }

    #[test]
    fn test_lone_backtick_opens_run() {
        assert_eq!(QuoteParser.parse("say ` hi there`"), vec!["say", " hi there"]);
    }

    #[test]
    fn test_closing_backtick_outside_run_is_kept() {
        assert_eq!(QuoteParser.parse("a b` c"), vec!["a", "b`", "c"]);
    }

    #[test]
    fn test_unterminated_quote_is_dropped_by_lenient_parse() {
        assert_eq!(QuoteParser.parse("login `alice smith"), vec!["login"]);
    }

    #[test]
    fn test_unterminated_quote_is_reported_by_strict_parse() {
        let err = QuoteParser.parse_strict("login `alice smith").unwrap_err();
        assert_eq!(
            err,
            ParsingError::UnterminatedQuote {
                tokens: vec!["login".to_string()],
                partial: "alice smith".to_string(),
            }
        );
    }
}
