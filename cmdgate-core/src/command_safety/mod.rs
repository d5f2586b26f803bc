//! Shell command parsing and danger classification.

pub mod dangerous_commands;
pub mod shell_parser;

pub use dangerous_commands::{
    DangerCategory, DangerVerdict, classify_parsed, contains_command, contains_dangerous_command,
    extract_command_names, normalize_program,
};
#[cfg(feature = "tree-sitter")]
pub use shell_parser::TreeSitterParser;
pub use shell_parser::{
    AtomicCommand, Connector, LexicalParser, ParseResult, ShellParser, ShellParserBackend,
    default_parser, parse_bash_command,
};
