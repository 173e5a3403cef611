//! Command allowlist.
//!
//! Commands are tokenized into an argument vector and matched against
//! allow-listed argv prefixes. Nothing is ever handed to a shell, and unquoted
//! shell metacharacters reject the command outright.

use thiserror::Error;

/// Characters a shell would interpret. Rejected unless quoted.
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '<', '>', '$', '`', '(', ')', '\n', '\r'];

/// Why a command could not be tokenized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),

    #[error("trailing backslash")]
    TrailingEscape,

    #[error("shell metacharacter '{0}' is not allowed")]
    Metacharacter(char),

    #[error("empty command")]
    Empty,
}

/// Split `input` into words. Supports single quotes (literal), double quotes
/// (with `\"` and `\\` escapes) and backslash escapes outside quotes.
pub fn tokenize(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(esc @ ('"' | '\\')) => current.push(esc),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => match chars.next() {
                Some(ch) => {
                    in_word = true;
                    current.push(ch);
                }
                None => return Err(TokenizeError::TrailingEscape),
            },
            c if SHELL_METACHARACTERS.contains(&c) => return Err(TokenizeError::Metacharacter(c)),
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    if words.is_empty() {
        return Err(TokenizeError::Empty);
    }
    Ok(words)
}

/// One allow-listed argv prefix, e.g. `["git", "status"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowRule {
    prefix: Vec<String>,
    denied_args: Vec<&'static str>,
}

impl AllowRule {
    /// Build a rule from a space-separated prefix such as `"git log"`.
    pub fn parse(entry: &str) -> Result<Self, TokenizeError> {
        let prefix = tokenize(entry)?;
        let denied_args = denied_args_for(&prefix[0]);
        Ok(Self { prefix, denied_args })
    }

    fn matches(&self, argv: &[String]) -> bool {
        argv.len() >= self.prefix.len() && argv.iter().zip(&self.prefix).all(|(a, p)| a == p)
    }

    fn denied_arg<'a>(&self, argv: &'a [String]) -> Option<&'a str> {
        argv[self.prefix.len()..]
            .iter()
            .map(String::as_str)
            .find(|arg| {
                self.denied_args
                    .iter()
                    .any(|d| *arg == *d || arg.strip_prefix(d).is_some_and(|rest| rest.starts_with('=')))
            })
    }
}

/// Flags that turn an otherwise read-only program into a writer or launcher.
fn denied_args_for(program: &str) -> Vec<&'static str> {
    match program {
        "find" => vec![
            "-exec", "-execdir", "-ok", "-okdir", "-delete", "-fprint", "-fprint0", "-fprintf", "-fls",
        ],
        "git" => vec!["--output", "-c", "--exec-path"],
        _ => Vec::new(),
    }
}

/// A command that passed the allowlist and is ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
}

impl ParsedCommand {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// Why a command was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{0}")]
    Tokenize(#[from] TokenizeError),

    #[error("'{0}' does not match any allowed command")]
    NotAllowed(String),

    #[error("argument '{0}' is not allowed")]
    DeniedArgument(String),
}

/// Set of allow-listed argv prefixes.
#[derive(Debug, Clone)]
pub struct Allowlist {
    rules: Vec<AllowRule>,
}

impl Allowlist {
    /// Build from space-separated prefixes (`"ls"`, `"git status"`, ...).
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, TokenizeError> {
        let rules = entries
            .iter()
            .map(|s| AllowRule::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Tokenize `command` and check it against the rules.
    pub fn check(&self, command: &str) -> Result<ParsedCommand, Rejection> {
        let argv = tokenize(command)?;
        let rule = self
            .rules
            .iter()
            .filter(|r| r.matches(&argv))
            .max_by_key(|r| r.prefix.len())
            .ok_or_else(|| Rejection::NotAllowed(argv[0].clone()))?;
        if let Some(arg) = rule.denied_arg(&argv) {
            return Err(Rejection::DeniedArgument(arg.to_string()));
        }
        Ok(ParsedCommand { argv })
    }
}
