//! Structural decomposition of bash command lines.
//!
//! A command line such as
//! ```sh
//! cd /repo && (make clean; make) | tee build.log
//! ```
//! is turned into an ordered list of [`AtomicCommand`]s, each carrying the
//! connector that precedes it and whether it ran in a nested context:
//! ```text
//! cd    []          connector: none  subshell: false
//! make  [clean]     connector: &&    subshell: true
//! make  []          connector: ;     subshell: true
//! tee   [build.log] connector: |     subshell: false
//! ```
//!
//! Two backends implement [`ShellParserBackend`]: the tree-sitter grammar
//! (cargo feature `tree-sitter`) and a hand-written lexical scanner that is
//! always available. [`ShellParser::detect`] picks one once at startup.

mod invocation;
mod lexical;
#[cfg(feature = "tree-sitter")]
mod grammar;


use std::path::Path;
use std::sync::OnceLock;

use cmdgate_config::ParserBackendPreference;
use cmdgate_config::constants::defaults;
use serde::{Deserialize, Serialize};

pub(crate) use invocation::invocation_chain;
pub use lexical::LexicalParser;
#[cfg(feature = "tree-sitter")]
pub use grammar::TreeSitterParser;

/// Shell programs whose `-c` payload is parsed as a nested command line.
const SHELL_PROGRAMS: &[&str] = &["bash", "sh", "zsh", "dash", "ksh"];

/// Operator joining an atomic command to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    /// `|` or `|&`
    Pipe,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `;` or a newline
    Semicolon,
}

impl Connector {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipe => "|",
            Self::And => "&&",
            Self::Or => "||",
            Self::Semicolon => ";",
        }
    }
}

impl std::fmt::Display for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One program invocation extracted from a command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicCommand {
    /// Program name, after leading `VAR=value` assignments were stripped
    pub command: String,
    /// Quote-stripped arguments
    pub args: Vec<String>,
    /// Operator preceding this command, if any
    pub connector: Option<Connector>,
    /// Whether the command came from a subshell, substitution or `sh -c` payload
    pub is_subshell: bool,
}

impl AtomicCommand {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            connector: None,
            is_subshell: false,
        }
    }

    pub fn with_connector(mut self, connector: Option<Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn in_subshell(mut self, is_subshell: bool) -> Self {
        self.is_subshell = is_subshell;
        self
    }

    /// Program name without any leading directory (`/usr/bin/rm` -> `rm`).
    pub fn program_name(&self) -> &str {
        program_basename(&self.command)
    }
}

/// Output of a parse: commands in source order plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub commands: Vec<AtomicCommand>,
    pub warnings: Vec<String>,
    /// Which backend produced this result. Diagnostic only.
    pub used_tree_sitter: bool,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Command names in order, duplicates preserved.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.iter().map(|cmd| cmd.command.clone()).collect()
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.warnings.contains(&message) {
            tracing::debug!(warning = %message, "shell parse diagnostic");
            self.warnings.push(message);
        }
    }

    pub(crate) fn warn_depth_exceeded(&mut self, max_depth: usize) {
        self.warn(format!(
            "Maximum nesting depth ({max_depth}) exceeded; nested commands were not analyzed"
        ));
    }
}

/// A shell parsing strategy.
pub trait ShellParserBackend: Send + Sync {
    /// Short identifier used in logs and CLI output.
    fn name(&self) -> &'static str;

    /// Parse a command line. Never fails; problems are reported as warnings.
    fn parse(&self, command: &str) -> ParseResult;
}

/// Front door for command parsing, owning the selected backend.
pub struct ShellParser {
    backend: Box<dyn ShellParserBackend>,
}

impl std::fmt::Debug for ShellParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellParser")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ShellParser {
    /// Probe the compiled-in backends and pick the best one that works.
    pub fn detect(max_depth: usize) -> Self {
        Self::with_preference(ParserBackendPreference::Auto, max_depth)
    }

    pub fn with_preference(preference: ParserBackendPreference, max_depth: usize) -> Self {
        let backend: Box<dyn ShellParserBackend> = match preference {
            ParserBackendPreference::Lexical => Box::new(LexicalParser::new(max_depth)),
            ParserBackendPreference::Auto => Self::probe_grammar(max_depth),
            ParserBackendPreference::TreeSitter => Self::require_grammar(max_depth),
        };
        tracing::debug!(
            backend = backend.name(),
            preference = %preference,
            max_depth,
            "selected shell parser backend"
        );
        Self { backend }
    }

    pub fn from_backend(backend: Box<dyn ShellParserBackend>) -> Self {
        Self { backend }
    }

    #[cfg(feature = "tree-sitter")]
    fn probe_grammar(max_depth: usize) -> Box<dyn ShellParserBackend> {
        let parser = TreeSitterParser::new(max_depth);
        if parser.is_available() {
            Box::new(parser)
        } else {
            tracing::debug!("bash grammar unavailable; using lexical parser");
            Box::new(LexicalParser::new(max_depth))
        }
    }

    #[cfg(not(feature = "tree-sitter"))]
    fn probe_grammar(max_depth: usize) -> Box<dyn ShellParserBackend> {
        Box::new(LexicalParser::new(max_depth))
    }

    #[cfg(feature = "tree-sitter")]
    fn require_grammar(max_depth: usize) -> Box<dyn ShellParserBackend> {
        // An unavailable grammar still degrades per call, with a warning.
        Box::new(TreeSitterParser::new(max_depth))
    }

    #[cfg(not(feature = "tree-sitter"))]
    fn require_grammar(max_depth: usize) -> Box<dyn ShellParserBackend> {
        tracing::warn!("tree-sitter backend requested but not compiled in; using lexical parser");
        Box::new(LexicalParser::new(max_depth))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn parse(&self, command: &str) -> ParseResult {
        self.backend.parse(command)
    }
}

impl Default for ShellParser {
    fn default() -> Self {
        Self::detect(defaults::DEFAULT_MAX_PARSE_DEPTH)
    }
}

static DEFAULT_PARSER: OnceLock<ShellParser> = OnceLock::new();

/// Process-wide parser chosen by [`ShellParser::detect`] on first use.
pub fn default_parser() -> &'static ShellParser {
    DEFAULT_PARSER.get_or_init(ShellParser::default)
}

/// Parse a command line with the process default backend.
pub fn parse_bash_command(command: &str) -> ParseResult {
    default_parser().parse(command)
}

pub(crate) fn program_basename(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program)
}

/// The script passed to `bash -c`, `sh -lc` and friends, including shells
/// reached through wrappers such as `sudo sh -c` or `xargs bash -c`.
pub(crate) fn shell_payload(cmd: &AtomicCommand) -> Option<&str> {
    invocation_chain(cmd)
        .into_iter()
        .filter(|link| SHELL_PROGRAMS.contains(&link.program))
        .find_map(|link| payload_after_command_flag(link.args))
}

fn payload_after_command_flag(args: &[String]) -> Option<&str> {
    let flag_index = args.iter().position(|arg| is_command_flag_cluster(arg))?;
    let mut end_of_options = false;
    args.iter()
        .skip(flag_index + 1)
        .find(|arg| {
            if end_of_options {
                return true;
            }
            if *arg == "--" {
                end_of_options = true;
                return false;
            }
            !arg.starts_with('-')
        })
        .map(String::as_str)
}

/// `-c`, `-lc`, `-xec`: a short-option cluster that includes `c`.
fn is_command_flag_cluster(arg: &str) -> bool {
    arg.strip_prefix('-').is_some_and(|flags| {
        !flags.is_empty()
            && !flags.starts_with('-')
            && flags.chars().all(|ch| ch.is_ascii_alphabetic())
            && flags.contains('c')
    })
}

/// Strip shell quoting from a single word.
///
/// Single quotes are literal, double quotes honour `\"`, `\$`, `` \` `` and
/// `\\`, and a bare backslash escapes the next character. `$'...'` and
/// `$"..."` are treated as their plain quoted forms.
pub(crate) fn unquote_word(word: &str) -> String {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut out = String::with_capacity(word.len());
    let mut quote = Quote::None;
    let mut chars = word.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    out.push(ch);
                }
            }
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' => match chars.peek().copied() {
                    Some(next @ ('"' | '$' | '`' | '\\')) => {
                        out.push(next);
                        chars.next();
                    }
                    Some('\n') => {
                        chars.next();
                    }
                    _ => out.push('\\'),
                },
                _ => out.push(ch),
            },
            Quote::None => match ch {
                '\'' => quote = Quote::Single,
                '"' => quote = Quote::Double,
                '$' if matches!(chars.peek(), Some('\'' | '"')) => {}
                '\\' => match chars.next() {
                    Some('\n') | None => {}
                    Some(next) => out.push(next),
                },
                _ => out.push(ch),
            },
        }
    }

    out
}
