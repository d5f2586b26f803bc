//! Hand-written lexical backend.
//!
//! Always compiled. A single left-to-right scan tracks quoting, splits on
//! connectors, drops redirections and pulls nested command text
//! (substitutions, subshell groups, `sh -c` payloads) out for a bounded
//! recursive re-parse.

use std::sync::LazyLock;

use regex::Regex;

use super::{AtomicCommand, Connector, ParseResult, ShellParserBackend, shell_payload};

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\+?=").expect("assignment regex must compile")
});

/// Reserved words that may precede the real program of a segment.
const RESERVED_PREFIXES: &[&str] = &[
    "if", "then", "elif", "else", "do", "while", "until", "!", "{", "}", "time",
];

/// Segments starting with these never name a program.
const TERMINATORS: &[&str] = &["fi", "done", "esac"];
const HEADERS: &[&str] = &["for", "select", "case"];

/// Lexical shell parser.
#[derive(Debug, Clone)]
pub struct LexicalParser {
    max_depth: usize,
}

impl LexicalParser {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse `text` as nested command text; every command is marked as a subshell.
    pub(crate) fn parse_nested(&self, text: &str, depth: usize, out: &mut ParseResult) {
        if depth > self.max_depth {
            out.warn_depth_exceeded(self.max_depth);
            return;
        }
        Scanner::new(self, out, text, depth, true).run();
    }
}

impl ShellParserBackend for LexicalParser {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn parse(&self, command: &str) -> ParseResult {
        let mut out = ParseResult::default();
        Scanner::new(self, &mut out, command, 0, false).run();
        out
    }
}

#[derive(Debug, Default)]
struct Word {
    text: String,
    /// Byte offset in `text` where the first quoted or escaped character landed
    quoted_from: Option<usize>,
    started: bool,
    substituted: bool,
}

impl Word {
    fn push(&mut self, ch: char) {
        self.text.push(ch);
        self.started = true;
    }

    fn push_str(&mut self, value: &str) {
        self.text.push_str(value);
        self.started = true;
    }

    fn mark_quoted(&mut self) {
        if self.quoted_from.is_none() {
            self.quoted_from = Some(self.text.len());
        }
        self.started = true;
    }

    fn push_quoted(&mut self, ch: char) {
        self.mark_quoted();
        self.text.push(ch);
    }

    fn is_plain(&self, value: &str) -> bool {
        self.quoted_from.is_none() && self.text == value
    }

    fn is_plain_any(&self, values: &[&str]) -> bool {
        self.quoted_from.is_none() && values.contains(&self.text.as_str())
    }

    fn is_fd_number(&self) -> bool {
        self.quoted_from.is_none()
            && !self.substituted
            && !self.text.is_empty()
            && self.text.chars().all(|ch| ch.is_ascii_digit())
    }

    fn is_assignment(&self) -> bool {
        ASSIGNMENT
            .find(&self.text)
            .is_some_and(|m| self.quoted_from.is_none_or(|offset| offset >= m.end()))
    }

    fn is_empty(&self) -> bool {
        !self.started && !self.substituted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NestedKind {
    /// `( ... )` at a word boundary
    Group,
    /// `$( ... )`, backticks, `<( ... )`, `>( ... )`
    Substitution,
}

#[derive(Debug)]
struct Nested {
    text: String,
    kind: NestedKind,
}

#[derive(Debug, Default)]
struct Segment {
    words: Vec<Word>,
    nested: Vec<Nested>,
}

impl Segment {
    fn is_empty(&self) -> bool {
        self.words.is_empty() && self.nested.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RedirectTarget {
    None,
    Drop,
    HeredocDelimiter { strip_tabs: bool },
}

#[derive(Debug)]
struct Heredoc {
    delimiter: String,
    strip_tabs: bool,
}

struct Scanner<'p, 'o> {
    parser: &'p LexicalParser,
    out: &'o mut ParseResult,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    nested: bool,
    word: Word,
    segment: Segment,
    connector: Option<Connector>,
    redirect: RedirectTarget,
    heredocs: Vec<Heredoc>,
    case_depth: usize,
}

impl<'p, 'o> Scanner<'p, 'o> {
    fn new(
        parser: &'p LexicalParser,
        out: &'o mut ParseResult,
        text: &str,
        depth: usize,
        nested: bool,
    ) -> Self {
        Self {
            parser,
            out,
            chars: text.chars().collect(),
            pos: 0,
            depth,
            nested,
            word: Word::default(),
            segment: Segment::default(),
            connector: None,
            redirect: RedirectTarget::None,
            heredocs: Vec::new(),
            case_depth: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars
            .get(start..end.min(self.chars.len()))
            .map(|chars| chars.iter().collect())
            .unwrap_or_default()
    }

    fn run(mut self) {
        while let Some(ch) = self.peek(0) {
            match ch {
                '\'' => self.single_quoted(),
                '"' => self.double_quoted(),
                '\\' => self.escape(),
                '`' => self.backtick(),
                '$' => self.dollar(),
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                    self.end_word();
                }
                '\n' => {
                    self.pos += 1;
                    self.newline();
                }
                ';' => {
                    self.pos += 1;
                    self.end_segment(Some(Connector::Semicolon));
                }
                '&' => self.ampersand(),
                '|' => self.pipe(),
                '<' | '>' => self.angle(ch),
                '(' => self.open_paren(),
                ')' => self.close_paren(),
                '#' if self.word.is_empty() => self.comment(),
                _ => {
                    self.word.push(ch);
                    self.pos += 1;
                }
            }
        }

        self.end_segment(None);
        if !self.heredocs.is_empty() {
            let delimiters: Vec<String> = self
                .heredocs
                .drain(..)
                .map(|heredoc| heredoc.delimiter)
                .collect();
            self.out.warn(format!(
                "Unclosed here-document (missing body for {})",
                delimiters.join(", ")
            ));
        }
    }

    fn single_quoted(&mut self) {
        self.pos += 1;
        self.word.mark_quoted();
        while let Some(ch) = self.peek(0) {
            self.pos += 1;
            if ch == '\'' {
                return;
            }
            self.word.text.push(ch);
        }
        self.out.warn("Unclosed single quote");
    }

    fn double_quoted(&mut self) {
        self.pos += 1;
        self.word.mark_quoted();
        while let Some(ch) = self.peek(0) {
            match ch {
                '"' => {
                    self.pos += 1;
                    return;
                }
                '\\' => match self.peek(1) {
                    Some(next @ ('"' | '$' | '`' | '\\')) => {
                        self.word.text.push(next);
                        self.pos += 2;
                    }
                    Some('\n') => self.pos += 2,
                    _ => {
                        self.word.text.push('\\');
                        self.pos += 1;
                    }
                },
                '`' => self.backtick(),
                '$' if self.peek(1) == Some('(') => self.dollar(),
                _ => {
                    self.word.text.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.out.warn("Unclosed double quote");
    }

    fn escape(&mut self) {
        match self.peek(1) {
            Some('\n') => self.pos += 2,
            Some(next) => {
                self.word.push_quoted(next);
                self.pos += 2;
            }
            None => {
                self.word.push('\\');
                self.pos += 1;
            }
        }
    }

    fn dollar(&mut self) {
        match self.peek(1) {
            Some('(') if self.peek(2) == Some('(') => {
                let start = self.pos;
                let (_, end, closed) = self.capture_parens(self.pos + 2);
                let literal = self.slice(start, end);
                self.word.push_str(&literal);
                self.pos = end;
                if !closed {
                    self.out.warn("Unclosed arithmetic expansion");
                }
            }
            Some('(') => {
                let (inner, end, closed) = self.capture_parens(self.pos + 2);
                self.pos = end;
                if !closed {
                    self.out.warn("Unclosed command substitution");
                }
                self.push_nested(inner, NestedKind::Substitution);
            }
            Some('\'') => {
                self.pos += 1;
                self.single_quoted();
            }
            Some('"') => {
                self.pos += 1;
                self.double_quoted();
            }
            _ => {
                self.word.push('$');
                self.pos += 1;
            }
        }
    }

    fn backtick(&mut self) {
        let mut index = self.pos + 1;
        let mut inner = String::new();
        let mut closed = false;
        while let Some(&ch) = self.chars.get(index) {
            match ch {
                '`' => {
                    closed = true;
                    index += 1;
                    break;
                }
                '\\' => match self.chars.get(index + 1) {
                    Some(&next @ ('`' | '\\' | '$')) => {
                        inner.push(next);
                        index += 2;
                        continue;
                    }
                    _ => inner.push('\\'),
                },
                _ => inner.push(ch),
            }
            index += 1;
        }
        self.pos = index;
        if !closed {
            self.out.warn("Unclosed backtick");
        }
        self.push_nested(inner, NestedKind::Substitution);
    }

    fn push_nested(&mut self, text: String, kind: NestedKind) {
        if kind == NestedKind::Substitution {
            self.word.substituted = true;
        }
        self.segment.nested.push(Nested { text, kind });
    }

    /// Scan from `start` (just past an opening paren) to its matching `)`.
    ///
    /// Returns the enclosed text, the index after the closing paren and
    /// whether one was found. Iterative so nesting depth costs no stack.
    fn capture_parens(&self, start: usize) -> (String, usize, bool) {
        let mut depth = 1usize;
        let mut quote: Option<char> = None;
        let mut index = start;
        while let Some(&ch) = self.chars.get(index) {
            match quote {
                Some('\'') => {
                    if ch == '\'' {
                        quote = None;
                    }
                }
                Some(open) => match ch {
                    '\\' => index += 1,
                    _ if ch == open => quote = None,
                    _ => {}
                },
                None => match ch {
                    '\\' => index += 1,
                    '\'' | '"' | '`' => quote = Some(ch),
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            return (self.slice(start, index), index + 1, true);
                        }
                    }
                    _ => {}
                },
            }
            index += 1;
        }
        (
            self.slice(start, self.chars.len()),
            self.chars.len(),
            false,
        )
    }

    fn ampersand(&mut self) {
        match self.peek(1) {
            Some('&') => {
                self.pos += 2;
                self.end_segment(Some(Connector::And));
            }
            Some('>') => {
                // &> and &>> redirect both streams
                self.end_word();
                self.pos += if self.peek(2) == Some('>') { 3 } else { 2 };
                self.redirect = RedirectTarget::Drop;
            }
            _ => {
                self.pos += 1;
                self.end_segment(None);
            }
        }
    }

    fn pipe(&mut self) {
        match self.peek(1) {
            Some('|') => {
                self.pos += 2;
                self.end_segment(Some(Connector::Or));
            }
            Some('&') => {
                self.pos += 2;
                self.end_segment(Some(Connector::Pipe));
            }
            _ => {
                self.pos += 1;
                self.end_segment(Some(Connector::Pipe));
            }
        }
    }

    fn angle(&mut self, ch: char) {
        if self.peek(1) == Some('(') {
            let (inner, end, closed) = self.capture_parens(self.pos + 2);
            self.pos = end;
            if !closed {
                self.out.warn("Unclosed process substitution");
            }
            self.push_nested(inner, NestedKind::Substitution);
            return;
        }

        if self.word.is_fd_number() {
            self.word = Word::default();
        } else {
            self.end_word();
        }

        let next = self.peek(1);
        let target = match (ch, next) {
            ('<', Some('<')) if self.peek(2) == Some('<') => {
                self.pos += 3;
                RedirectTarget::Drop
            }
            ('<', Some('<')) => {
                let strip_tabs = self.peek(2) == Some('-');
                self.pos += if strip_tabs { 3 } else { 2 };
                RedirectTarget::HeredocDelimiter { strip_tabs }
            }
            (_, Some('&')) => {
                self.pos += 2;
                self.duplicate_target()
            }
            ('<', Some('>')) | ('>', Some('>' | '|')) => {
                self.pos += 2;
                RedirectTarget::Drop
            }
            _ => {
                self.pos += 1;
                RedirectTarget::Drop
            }
        };
        self.redirect = target;
    }

    /// `>&2`, `2>&1`, `<&-` carry their target inline.
    fn duplicate_target(&mut self) -> RedirectTarget {
        let start = self.pos;
        while self.peek(0).is_some_and(|ch| ch.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek(0) == Some('-') {
            self.pos += 1;
        }
        if self.pos > start {
            RedirectTarget::None
        } else {
            RedirectTarget::Drop
        }
    }

    fn open_paren(&mut self) {
        if !self.word.is_empty() {
            if self.peek(1) == Some(')') {
                // `name()` starts a function definition
                self.word = Word::default();
                self.pos += 2;
                return;
            }
            // array literal such as `arr=(a b)`
            let start = self.pos;
            let (_, end, closed) = self.capture_parens(self.pos + 1);
            let literal = self.slice(start, end);
            self.word.push_str(&literal);
            self.pos = end;
            if !closed {
                self.out.warn("Unclosed parenthesis");
            }
            return;
        }

        if self.peek(1) == Some('(') {
            // arithmetic command `(( ... ))`
            let (_, end, closed) = self.capture_parens(self.pos + 1);
            self.pos = end;
            if !closed {
                self.out.warn("Unclosed arithmetic command");
            }
            return;
        }

        let (inner, end, closed) = self.capture_parens(self.pos + 1);
        self.pos = end;
        if !closed {
            self.out.warn("Unclosed subshell");
        }
        self.push_nested(inner, NestedKind::Group);
    }

    fn close_paren(&mut self) {
        self.pos += 1;
        if self.case_depth > 0 {
            // end of a case pattern; the pattern itself is not a command
            self.word = Word::default();
            self.segment = Segment::default();
            return;
        }
        self.end_word();
        self.out.warn("Unmatched ')' ignored");
    }

    fn comment(&mut self) {
        while self.peek(0).is_some_and(|ch| ch != '\n') {
            self.pos += 1;
        }
    }

    fn end_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        match std::mem::replace(&mut self.redirect, RedirectTarget::None) {
            RedirectTarget::Drop => {}
            RedirectTarget::HeredocDelimiter { strip_tabs } => self.heredocs.push(Heredoc {
                delimiter: word.text,
                strip_tabs,
            }),
            RedirectTarget::None => {
                if !word.started {
                    return;
                }
                if self.segment.words.is_empty() {
                    if word.is_plain("case") {
                        self.case_depth += 1;
                    } else if word.is_plain("esac") {
                        self.case_depth = self.case_depth.saturating_sub(1);
                    }
                }
                self.segment.words.push(word);
            }
        }
    }

    fn newline(&mut self) {
        self.end_word();
        // a blank line or a trailing `&&` keeps the pending connector
        if !self.segment.is_empty() {
            self.end_segment(Some(Connector::Semicolon));
        }
        self.skip_heredoc_bodies();
    }

    fn skip_heredoc_bodies(&mut self) {
        let pending = std::mem::take(&mut self.heredocs);
        for heredoc in pending {
            let mut found = false;
            while self.pos < self.chars.len() {
                let line_end = self.chars[self.pos..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(self.chars.len(), |offset| self.pos + offset);
                let line = self.slice(self.pos, line_end);
                self.pos = (line_end + 1).min(self.chars.len());
                let candidate = if heredoc.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line.as_str()
                };
                if candidate == heredoc.delimiter {
                    found = true;
                    break;
                }
            }
            if !found {
                self.out.warn(format!(
                    "Unclosed here-document (missing delimiter {})",
                    heredoc.delimiter
                ));
            }
        }
    }

    fn end_segment(&mut self, next: Option<Connector>) {
        self.end_word();
        self.redirect = RedirectTarget::None;
        let segment = std::mem::take(&mut self.segment);
        let connector = std::mem::replace(&mut self.connector, next);
        self.emit(segment, connector);
    }

    fn emit(&mut self, segment: Segment, mut connector: Option<Connector>) {
        if let Some(command) = command_from_words(segment.words) {
            let command = command
                .with_connector(connector.take())
                .in_subshell(self.nested);
            let payload = shell_payload(&command).map(str::to_owned);
            self.out.commands.push(command);
            if let Some(payload) = payload {
                self.parser
                    .parse_nested(&payload, self.depth + 1, &mut *self.out);
            }
        }

        for nested in segment.nested {
            let first = self.out.commands.len();
            self.parser
                .parse_nested(&nested.text, self.depth + 1, &mut *self.out);
            // a group spanning the whole segment inherits its connector
            if nested.kind == NestedKind::Group
                && let Some(command) = self.out.commands.get_mut(first)
                && command.connector.is_none()
            {
                command.connector = connector.take();
            }
        }
    }
}

fn command_from_words(words: Vec<Word>) -> Option<AtomicCommand> {
    let mut start = 0;
    loop {
        while words
            .get(start)
            .is_some_and(|word| word.is_plain_any(RESERVED_PREFIXES))
        {
            start += 1;
        }
        match words.get(start) {
            None => return None,
            Some(word) if word.is_plain_any(TERMINATORS) || word.is_plain_any(HEADERS) => {
                return None;
            }
            Some(word) if word.is_plain("function") => start += 2,
            Some(_) => break,
        }
    }

    while words.get(start).is_some_and(Word::is_assignment) {
        start += 1;
    }

    let mut rest = words.into_iter().skip(start).map(|word| word.text);
    let command = rest.next().filter(|name| !name.is_empty())?;
    Some(AtomicCommand::new(command, rest.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(command: &str) -> ParseResult {
        LexicalParser::new(16).parse(command)
    }

    fn connectors(result: &ParseResult) -> Vec<Option<Connector>> {
        result.commands.iter().map(|cmd| cmd.connector).collect()
    }

    #[test]
    fn assigns_preceding_connector_to_each_command() {
        let result = parse("a | b && c || d; e |& f");
        assert_eq!(result.command_names(), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(
            connectors(&result),
            vec![
                None,
                Some(Connector::Pipe),
                Some(Connector::And),
                Some(Connector::Or),
                Some(Connector::Semicolon),
                Some(Connector::Pipe),
            ]
        );
    }

    #[test]
    fn background_ampersand_separates_without_connector() {
        let result = parse("sleep 10 & echo started");
        assert_eq!(result.command_names(), vec!["sleep", "echo"]);
        assert_eq!(connectors(&result), vec![None, None]);
    }

    #[test]
    fn newlines_split_like_semicolons() {
        let result = parse("cd /repo\n\nmake &&\n  make install");
        assert_eq!(result.command_names(), vec!["cd", "make", "make"]);
        assert_eq!(
            connectors(&result),
            vec![None, Some(Connector::Semicolon), Some(Connector::And)]
        );
    }

    #[test]
    fn consecutive_connectors_are_skipped() {
        let result = parse("ls ;; ; pwd");
        assert_eq!(result.command_names(), vec!["ls", "pwd"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn unclosed_quotes_warn_and_keep_remaining_text() {
        let result = parse("echo 'hello world");
        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.commands[0].args, vec!["hello world"]);
        assert!(result.warnings.iter().any(|w| w.contains("Unclosed")));

        let result = parse("echo \"a | b");
        assert_eq!(result.commands.len(), 1);
        assert_eq!(result.commands[0].args, vec!["a | b"]);
        assert!(result.warnings.iter().any(|w| w.contains("Unclosed")));
    }

    #[test]
    fn unclosed_substitution_and_subshell_warn() {
        for input in ["echo $(whoami", "(cd /tmp && ls", "echo `date"] {
            let result = parse(input);
            assert!(
                result.warnings.iter().any(|w| w.contains("Unclosed")),
                "no warning for {input:?}: {result:?}"
            );
        }
    }

    #[test]
    fn stray_close_paren_warns() {
        let result = parse("ls )");
        assert_eq!(result.command_names(), vec!["ls"]);
        assert!(result.warnings.iter().any(|w| w.contains("Unmatched")));
    }

    #[test]
    fn substitutions_are_flattened_after_their_command() {
        let result = parse("echo $(whoami) `hostname` && ls");
        assert_eq!(result.command_names(), vec!["echo", "whoami", "hostname", "ls"]);
        assert_eq!(result.commands[0].args, Vec::<String>::new());
        assert!(!result.commands[0].is_subshell);
        assert!(result.commands[1].is_subshell);
        assert!(result.commands[2].is_subshell);
        assert!(!result.commands[3].is_subshell);
        assert_eq!(result.commands[3].connector, Some(Connector::And));
    }

    #[test]
    fn substitutions_inside_double_quotes_are_extracted() {
        let result = parse(r#"echo "user: $(id -un)""#);
        assert_eq!(result.command_names(), vec!["echo", "id"]);
        assert_eq!(result.commands[0].args, vec!["user: "]);
        assert_eq!(result.commands[1].args, vec!["-un"]);
    }

    #[test]
    fn single_quotes_hide_substitutions() {
        let result = parse("echo '$(rm -rf /)'");
        assert_eq!(result.command_names(), vec!["echo"]);
        assert_eq!(result.commands[0].args, vec!["$(rm -rf /)"]);
    }

    #[test]
    fn arithmetic_expansion_stays_literal() {
        let result = parse("echo $((1 + 2))");
        assert_eq!(result.command_names(), vec!["echo"]);
        assert_eq!(result.commands[0].args, vec!["$((1 + 2))"]);
    }

    #[test]
    fn process_substitutions_are_parsed() {
        let result = parse("diff <(ls a) <(ls b)");
        assert_eq!(result.command_names(), vec!["diff", "ls", "ls"]);
        assert!(result.commands[0].args.is_empty());
    }

    #[test]
    fn assignment_with_substitution_yields_only_inner_command() {
        let result = parse("OUT=$(rm -rf /tmp/x)");
        assert_eq!(result.command_names(), vec!["rm"]);
        assert!(result.commands[0].is_subshell);
    }

    #[test]
    fn quoted_assignment_name_is_a_command() {
        let result = parse("\"FOO=bar\" baz");
        assert_eq!(result.command_names(), vec!["FOO=bar"]);

        let result = parse("FOO=\"a b\" BAR+=1 make");
        assert_eq!(result.command_names(), vec!["make"]);
    }

    #[test]
    fn group_inherits_segment_connector() {
        let result = parse("make && (cd docs && make)");
        assert_eq!(result.command_names(), vec!["make", "cd", "make"]);
        assert_eq!(
            connectors(&result),
            vec![None, Some(Connector::And), Some(Connector::And)]
        );
    }

    #[test]
    fn redirections_and_targets_are_dropped() {
        let cases = [
            ("cmd > out.txt arg", vec!["arg"]),
            ("cmd 2>/dev/null arg", vec!["arg"]),
            ("cmd 2>&1 arg", vec!["arg"]),
            ("cmd &> all.log arg", vec!["arg"]),
            ("cmd >>log arg 1>&2", vec!["arg"]),
            ("cmd < in.txt arg", vec!["arg"]),
            ("cmd <<< 'text' arg", vec!["arg"]),
            ("cmd >| clobber arg 2>&-", vec!["arg"]),
        ];
        for (input, expected) in cases {
            let result = parse(input);
            assert_eq!(result.command_names(), vec!["cmd"], "input: {input}");
            assert_eq!(result.commands[0].args, expected, "input: {input}");
        }
    }

    #[test]
    fn heredoc_bodies_are_skipped() {
        let result = parse("cat <<EOF > notes.txt\nrm -rf /\nEOF\nls");
        assert_eq!(result.command_names(), vec!["cat", "ls"]);
        assert!(result.commands[0].args.is_empty());
        assert!(result.warnings.is_empty());

        let result = parse("cat <<-'END'\n\tshutdown now\n\tEND\necho ok");
        assert_eq!(result.command_names(), vec!["cat", "echo"]);
    }

    #[test]
    fn missing_heredoc_delimiter_warns() {
        let result = parse("cat <<EOF\nbody");
        assert_eq!(result.command_names(), vec!["cat"]);
        assert!(result.warnings.iter().any(|w| w.contains("Unclosed here-document")));
    }

    #[test]
    fn compound_statements_yield_their_commands() {
        let result = parse("if test -f x; then rm x; else touch x; fi");
        assert_eq!(result.command_names(), vec!["test", "rm", "touch"]);

        let result = parse("for f in *.log; do gzip \"$f\"; done");
        assert_eq!(result.command_names(), vec!["gzip"]);

        let result = parse("while true; do sleep 1; done");
        assert_eq!(result.command_names(), vec!["true", "sleep"]);

        let result = parse("{ ls; pwd; } > out");
        assert_eq!(result.command_names(), vec!["ls", "pwd"]);
    }

    #[test]
    fn case_patterns_are_not_commands() {
        let result = parse("case $x in start) systemctl start app;; *) echo no;; esac");
        assert_eq!(result.command_names(), vec!["systemctl", "echo"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn function_definitions_expose_their_body() {
        let result = parse("cleanup() { rm -rf build; }; cleanup");
        assert_eq!(result.command_names(), vec!["rm", "cleanup"]);

        let result = parse("function deploy { kubectl apply -f k8s; }");
        assert_eq!(result.command_names(), vec!["kubectl"]);
    }

    #[test]
    fn comments_are_ignored() {
        let result = parse("ls # rm -rf /\npwd");
        assert_eq!(result.command_names(), vec!["ls", "pwd"]);
    }

    #[test]
    fn ansi_c_quotes_are_unquoted() {
        let result = parse("printf $'a|b'");
        assert_eq!(result.commands[0].args, vec!["a|b"]);
    }

    #[test]
    fn array_assignment_is_not_a_command() {
        let result = parse("arr=(one two) ls");
        assert_eq!(result.command_names(), vec!["ls"]);
    }

    #[test]
    fn depth_counts_every_nested_level() {
        let parser = LexicalParser::new(2);
        let result = parser.parse("echo $(echo $(echo $(whoami)))");
        assert_eq!(result.command_names(), vec!["echo", "echo", "echo"]);
        assert!(result.warnings.iter().any(|w| w.contains("nesting depth")));
    }
}
