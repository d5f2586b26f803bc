//! Grammar-based backend built on tree-sitter-bash.
//!
//! Each `command` node becomes an [`AtomicCommand`]. Connectors are read off
//! the anonymous operator tokens between statements. Command substitutions
//! that appear inside another command's arguments are kept as literal
//! argument text rather than flattened into separate commands.

use std::sync::Mutex;

use tree_sitter::{Language, Node, Parser, Tree};

use super::{
    AtomicCommand, Connector, LexicalParser, ParseResult, ShellParserBackend, shell_payload,
    unquote_word,
};

/// Children of a command node that never become arguments.
const SKIPPED_COMMAND_CHILDREN: &[&str] = &[
    "file_redirect",
    "heredoc_redirect",
    "herestring_redirect",
    "comment",
];

/// Nodes whose subtree is never walked for commands.
const OPAQUE_NODES: &[&str] = &[
    "file_redirect",
    "herestring_redirect",
    "heredoc_start",
    "heredoc_body",
    "heredoc_end",
    "comment",
];

/// Nodes that open a nested execution context.
const NESTING_NODES: &[&str] = &["subshell", "command_substitution", "process_substitution"];

/// tree-sitter-bash shell parser.
pub struct TreeSitterParser {
    parser: Result<Mutex<Parser>, String>,
    fallback: LexicalParser,
    max_depth: usize,
}

impl std::fmt::Debug for TreeSitterParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterParser")
            .field("available", &self.is_available())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl TreeSitterParser {
    pub fn new(max_depth: usize) -> Self {
        let mut parser = Parser::new();
        let language: Language = tree_sitter_bash::LANGUAGE.into();
        let parser = match parser.set_language(&language) {
            Ok(()) => Ok(Mutex::new(parser)),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load bash grammar");
                Err(format!("Failed to load bash grammar: {err}"))
            }
        };
        Self {
            parser,
            fallback: LexicalParser::new(max_depth),
            max_depth,
        }
    }

    /// Whether the grammar loaded and the parser lock is usable.
    pub fn is_available(&self) -> bool {
        self.parser
            .as_ref()
            .is_ok_and(|parser| !parser.is_poisoned())
    }

    /// Produce a syntax tree. The lock is released before the tree is walked.
    fn syntax_tree(&self, source: &str) -> Result<Tree, String> {
        let parser = self.parser.as_ref().map_err(|err| err.clone())?;
        let mut guard = parser
            .lock()
            .map_err(|err| format!("Failed to lock bash parser: {err}"))?;
        guard
            .parse(source, None)
            .ok_or_else(|| "bash parser produced no syntax tree".to_string())
    }

    /// Returns `false` when the lexical fallback handled `source`.
    fn parse_into(
        &self,
        source: &str,
        depth: usize,
        nested: bool,
        out: &mut ParseResult,
    ) -> bool {
        if depth > self.max_depth {
            out.warn_depth_exceeded(self.max_depth);
            return true;
        }

        let tree = match self.syntax_tree(source) {
            Ok(tree) => tree,
            Err(reason) => {
                tracing::warn!(%reason, "tree-sitter parse failed; using lexical parser");
                out.warn(format!("{reason}; used lexical parser"));
                if nested {
                    self.fallback.parse_nested(source, depth, out);
                } else {
                    let fallback = self.fallback.parse(source);
                    out.commands.extend(fallback.commands);
                    for warning in fallback.warnings {
                        out.warn(warning);
                    }
                }
                return false;
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            out.warn("Syntax error in command; results may be incomplete");
        }

        Walker {
            backend: self,
            source,
            out,
            pending: None,
        }
        .walk(root, depth, nested);
        true
    }
}

impl ShellParserBackend for TreeSitterParser {
    fn name(&self) -> &'static str {
        "tree-sitter"
    }

    fn parse(&self, command: &str) -> ParseResult {
        let mut out = ParseResult::default();
        let used_grammar = self.parse_into(command, 0, false, &mut out);
        out.used_tree_sitter = used_grammar;
        out
    }
}

struct Walker<'a> {
    backend: &'a TreeSitterParser,
    source: &'a str,
    out: &'a mut ParseResult,
    pending: Option<Connector>,
}

impl Walker<'_> {
    /// Pre-order traversal with an explicit stack; long `&&` chains nest deeply.
    fn walk(&mut self, root: Node<'_>, depth: usize, nested: bool) {
        let mut stack = vec![(root, depth, nested)];
        while let Some((node, depth, nested)) = stack.pop() {
            if !node.is_named() {
                self.operator(node.kind());
                continue;
            }

            let kind = node.kind();
            if OPAQUE_NODES.contains(&kind) {
                continue;
            }

            if kind == "command" || kind == "declaration_command" || kind == "unset_command" {
                self.command(node, depth, nested);
                continue;
            }

            let (depth, nested) = if NESTING_NODES.contains(&kind) {
                if depth + 1 > self.backend.max_depth {
                    self.out.warn_depth_exceeded(self.backend.max_depth);
                    continue;
                }
                (depth + 1, true)
            } else {
                (depth, nested)
            };

            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                stack.push((child, depth, nested));
            }
        }
    }

    fn operator(&mut self, kind: &str) {
        match kind {
            "&&" => self.pending = Some(Connector::And),
            "||" => self.pending = Some(Connector::Or),
            "|" | "|&" => self.pending = Some(Connector::Pipe),
            ";" | ";;" | "\n" => self.pending = Some(Connector::Semicolon),
            "&" => self.pending = None,
            _ => {}
        }
    }

    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source.as_bytes())
            .map(unquote_word)
            .unwrap_or_default()
    }

    fn command(&mut self, node: Node<'_>, depth: usize, nested: bool) {
        let mut name = None;
        let mut args = Vec::new();
        let mut cursor = node.walk();
        // `FOO=1 make` prefixes are dropped; `export FOO=1` keeps them as arguments
        let skip_assignments = node.kind() == "command";

        for child in node.children(&mut cursor) {
            let kind = child.kind();
            if SKIPPED_COMMAND_CHILDREN.contains(&kind)
                || (skip_assignments && kind == "variable_assignment")
            {
                continue;
            }
            if kind == "command_name" {
                name = Some(self.text(child));
            } else if !child.is_named() {
                // `export`, `local`, `unset` keywords name the builtin
                if name.is_none() && kind.chars().all(|ch| ch.is_ascii_alphabetic()) {
                    name = Some(kind.to_string());
                }
            } else {
                args.push(self.text(child));
            }
        }

        let Some(name) = name.filter(|name| !name.is_empty()) else {
            return;
        };

        let command = AtomicCommand::new(name, args)
            .with_connector(self.pending.take())
            .in_subshell(nested);
        let payload = shell_payload(&command).map(str::to_owned);
        self.out.commands.push(command);

        if let Some(payload) = payload {
            self.backend
                .parse_into(&payload, depth + 1, true, &mut *self.out);
        }
    }
}
