use crate::config::{OverloadPolicy, ParserConfig};
use crate::error::Result;
use crate::identifier::DeclarationKind;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::tree::{DeclarationTree, NodeBuilder};
use std::collections::HashMap;
use std::path::Path;

/// Keywords that open a type declaration
const TYPE_KEYWORDS: &[&str] = &["class", "interface", "enum"];

/// Type bodies nested deeper than this are recorded without their members
const MAX_TYPE_NESTING: usize = 256;

/// Keyword-triggered declaration parser.
///
/// There is no grammar: a type keyword attempts a type declaration, an
/// identifier directly followed by `(` attempts a method, and everything
/// else is skipped at the current scope. Malformed constructs are dropped
/// locally and scanning resumes, so any input yields a tree.
#[derive(Debug, Clone, Default)]
pub struct DeclarationParser {
    config: ParserConfig,
    lexer: Lexer,
}

impl DeclarationParser {
    /// Create a parser, validating the configuration
    pub fn new(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            lexer: Lexer::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one file revision. Files without a package declaration get the
    /// configured placeholder unit name.
    #[must_use]
    pub fn parse(&self, source: &[u8]) -> DeclarationTree {
        self.parse_with_unit_fallback(source, None)
    }

    /// Parse, naming the unit `fallback_unit` when no package is declared
    #[must_use]
    pub fn parse_with_unit_fallback(
        &self,
        source: &[u8],
        fallback_unit: Option<&str>,
    ) -> DeclarationTree {
        let tokens = self.lexer.tokenize(source);
        let scanner = Scanner::new(&tokens, source.len(), self.config.overloads);
        let (package, members) = scanner.parse_file_scope();

        let unit_name = package
            .or_else(|| fallback_unit.map(str::to_string))
            .unwrap_or_else(|| self.config.default_unit_name.clone());

        log::debug!(
            "Parsed unit {unit_name}: {} tokens, {} top-level types",
            tokens.len(),
            members.len()
        );

        NodeBuilder::unit(unit_name, 0..source.len())
            .with_members(members)
            .freeze_unchecked()
    }

    /// Parse a file from disk
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<DeclarationTree> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(self.parse(&bytes))
    }
}

/// Outcome of a declaration attempt: the token index to resume at and the
/// recognized node, if any
type Attempt = (usize, Option<NodeBuilder>);

struct Scanner<'t> {
    tokens: &'t [Token],
    brackets: BracketIndex,
    source_len: usize,
    overloads: OverloadPolicy,
}

impl<'t> Scanner<'t> {
    fn new(tokens: &'t [Token], source_len: usize, overloads: OverloadPolicy) -> Self {
        Self {
            tokens,
            brackets: BracketIndex::build(tokens),
            source_len,
            overloads,
        }
    }

    fn is_type_keyword(token: &Token) -> bool {
        token.kind == TokenKind::Keyword && TYPE_KEYWORDS.contains(&token.text.as_str())
    }

    fn get(&self, pos: usize) -> Option<&Token> {
        self.tokens.get(pos)
    }

    fn is_sep_at(&self, pos: usize, sep: &str) -> bool {
        self.get(pos).is_some_and(|t| t.is_separator(sep))
    }

    fn reject(pos: usize) -> Attempt {
        (pos + 1, None)
    }

    /// File scope: the package name and every top-level type
    fn parse_file_scope(&self) -> (Option<String>, Vec<NodeBuilder>) {
        let mut package = None;
        let mut members = Vec::new();
        let mut pos = 0;

        while let Some(token) = self.get(pos) {
            if token.is_keyword("package") && package.is_none() {
                let (next, name) = self.dotted_name(pos + 1);
                package = name;
                pos = next.max(pos + 1);
                continue;
            }

            if Self::is_type_keyword(token) {
                let (next, node) = self.try_parse_type(pos, 0);
                members.extend(node);
                pos = next;
                continue;
            }

            if token.is_separator("(") && pos > 0 && self.tokens[pos - 1].is_identifier() {
                log::debug!(
                    "Skipping method-shaped `{}` at byte {} outside any type",
                    self.tokens[pos - 1].text,
                    self.tokens[pos - 1].offset
                );
            }
            pos += 1;
        }

        (package, members)
    }

    /// `a.b.c` starting at `pos`, with an optional trailing `;`
    fn dotted_name(&self, pos: usize) -> (usize, Option<String>) {
        let Some(first) = self.get(pos).filter(|t| t.is_identifier()) else {
            return (pos, None);
        };

        let mut name = first.text.clone();
        let mut i = pos + 1;
        while self.is_sep_at(i, ".") {
            match self.get(i + 1) {
                Some(part) if part.is_identifier() => {
                    name.push('.');
                    name.push_str(&part.text);
                    i += 2;
                }
                _ => break,
            }
        }
        if self.is_sep_at(i, ";") {
            i += 1;
        }
        (i, Some(name))
    }

    /// Attempt a type declaration whose keyword sits at `pos`
    fn try_parse_type(&self, pos: usize, depth: usize) -> Attempt {
        let Some(name) = self.get(pos + 1).filter(|t| t.is_identifier()) else {
            return Self::reject(pos);
        };
        // `Foo.class` is a class literal, not a declaration
        if pos > 0 && self.tokens[pos - 1].is_separator(".") {
            return Self::reject(pos);
        }

        let Some(open) = self.find_type_body(pos + 2) else {
            return Self::reject(pos);
        };

        let start = self.tokens[pos].offset;
        if depth >= MAX_TYPE_NESTING {
            log::warn!(
                "Type nesting deeper than {MAX_TYPE_NESTING} at byte {start}; members of {} are not parsed",
                name.text
            );
            let close = self.find_closing_bracket(open);
            let end = close.map_or(self.source_len, |c| self.tokens[c].end());
            let resume = close.map_or(self.tokens.len(), |c| c + 1);
            let node = NodeBuilder::new(DeclarationKind::Type, name.text.clone(), start..end);
            return (resume, Some(node));
        }

        let (close, members) = self.parse_members(open + 1, depth + 1);
        let end = self.get(close).map_or(self.source_len, Token::end);
        let node = NodeBuilder::new(DeclarationKind::Type, name.text.clone(), start..end)
            .with_members(members);
        (close + 1, Some(node))
    }

    /// First top-level `{` of a type header, skipping bracketed groups
    fn find_type_body(&self, from: usize) -> Option<usize> {
        let mut i = from;
        while let Some(token) = self.get(i) {
            if token.is_separator("{") {
                return Some(i);
            }
            if token.is_separator(";") || token.is_separator("}") {
                return None;
            }
            if token.is_separator("(") || token.is_separator("[") {
                i = self.find_closing_bracket(i)?;
            }
            i += 1;
        }
        None
    }

    /// Attempt a method or constructor whose parameter list opens at `open`
    fn try_parse_method(&self, open: usize) -> Attempt {
        if open == 0 || !self.tokens[open - 1].is_identifier() {
            return Self::reject(open);
        }
        let name = &self.tokens[open - 1];
        // Enum constants: `A(1), B(2)` or `{ A(1);`
        let after_list_start = open < 2
            || ["{", "}", ";", ","]
                .iter()
                .any(|sep| self.tokens[open - 2].is_separator(sep));
        if open >= 2 && self.tokens[open - 2].is_separator(",") {
            return Self::reject(open);
        }
        let Some(close) = self.find_closing_bracket(open) else {
            return Self::reject(open);
        };

        let mut seen_throws = false;
        let mut i = close + 1;
        while let Some(token) = self.get(i) {
            if token.is_separator("{") {
                // `(a, b) -> { ... }` is a lambda, not a method header
                if self.tokens[i - 1].is_operator("->") {
                    return Self::reject(open);
                }
                let Some(body_close) = self.find_closing_bracket(i) else {
                    return Self::reject(open);
                };
                let span = name.offset..self.tokens[body_close].end();
                return (
                    body_close + 1,
                    Some(NodeBuilder::new(DeclarationKind::Method, name.text.clone(), span)),
                );
            }
            if token.is_separator(";") {
                // A body-less header needs a return type in front of its name
                if after_list_start {
                    return Self::reject(open);
                }
                let span = name.offset..token.end();
                return (
                    i + 1,
                    Some(NodeBuilder::new(DeclarationKind::Method, name.text.clone(), span)),
                );
            }

            if token.is_separator("}") || Self::is_type_keyword(token) {
                return Self::reject(open);
            }
            // `A(1), B(2);` inside an enum: constants, not a header
            if token.is_separator(",") && !seen_throws {
                return Self::reject(open);
            }
            if token.is_operator("->") && !self.is_sep_at(i + 1, "{") {
                return Self::reject(open);
            }
            if token.is_keyword("throws") {
                seen_throws = true;
            }
            if token.is_separator("(") || token.is_separator("[") {
                match self.find_closing_bracket(i) {
                    Some(c) => i = c,
                    None => return Self::reject(open),
                }
            }
            i += 1;
        }
        Self::reject(open)
    }

    /// Members of a body whose `{` precedes `pos`. Returns the index of the
    /// body's `}` (or `tokens.len()` when it never closes) and the members.
    fn parse_members(&self, pos: usize, depth: usize) -> (usize, Vec<NodeBuilder>) {
        let mut members = Vec::new();
        let mut i = pos;

        let close = loop {
            let Some(token) = self.get(i) else {
                log::debug!("Body opened before token {pos} never closes; keeping partial members");
                break self.tokens.len();
            };

            if token.is_separator("}") {
                break i;
            }

            if Self::is_type_keyword(token) {
                let (next, node) = self.try_parse_type(i, depth);
                members.extend(node);
                i = next;
            } else if token.is_operator("=") {
                i = self.skip_statement(i + 1);
            } else if token.is_separator("@") {
                i = self.skip_annotation(i);
            } else if token.is_separator("(") {
                let (next, node) = self.try_parse_method(i);
                members.extend(node);
                i = next;
            } else if token.is_separator("{") {
                i = self.find_closing_bracket(i).map_or(i + 1, |c| c + 1);
            } else {
                i += 1;
            }
        };

        if self.overloads == OverloadPolicy::Ordinal {
            number_overloads(&mut members);
        }
        (close, members)
    }

    /// Skip a field initializer up to and including its top-level `;`.
    /// Stops before an unmatched `}` so the enclosing body still closes.
    fn skip_statement(&self, from: usize) -> usize {
        let mut i = from;
        while let Some(token) = self.get(i) {
            if token.is_separator(";") {
                return i + 1;
            }
            if token.is_separator("}") {
                return i;
            }
            if token.is_separator("{") || token.is_separator("(") || token.is_separator("[") {
                match self.find_closing_bracket(i) {
                    Some(c) => i = c,
                    None => return i + 1,
                }
            }
            i += 1;
        }
        i
    }

    /// Skip `@Name`, `@a.b.Name` and `@Name(...)`; `@interface` is left
    /// for the type rule
    fn skip_annotation(&self, at: usize) -> usize {
        if self.get(at + 1).is_some_and(|t| t.is_keyword("interface")) {
            return at + 1;
        }
        let (after_name, name) = self.dotted_name(at + 1);
        if name.is_none() {
            return at + 1;
        }
        if self.is_sep_at(after_name, "(") {
            if let Some(close) = self.find_closing_bracket(after_name) {
                return close + 1;
            }
        }
        after_name
    }

    /// Matching close of the bracket at `open`, counting only its own family.
    /// A `(` or `[` group never extends past an unmatched `}`.
    fn find_closing_bracket(&self, open: usize) -> Option<usize> {
        let close = self.brackets.close.get(open).copied().flatten()?;
        match self.brackets.barrier[open] {
            Some(barrier) if barrier < close => None,
            _ => Some(close),
        }
    }
}

/// Bracket pairs of one token stream, resolved in a single pass so that
/// every lookup is `O(1)` no matter how many brackets stay unclosed
struct BracketIndex {
    /// For an opening bracket, the index of its close within its family
    close: Vec<Option<usize>>,
    /// For `(` and `[`, the first `}` closing a brace opened before them
    barrier: Vec<Option<usize>>,
}

impl BracketIndex {
    fn build(tokens: &[Token]) -> Self {
        let mut close = vec![None; tokens.len()];
        let mut enclosing_brace = vec![None; tokens.len()];
        let mut stray_braces = Vec::new();
        let mut parens = Vec::new();
        let mut squares = Vec::new();
        let mut braces: Vec<usize> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if token.kind != TokenKind::Separator {
                continue;
            }
            match token.text.as_str() {
                "(" => {
                    enclosing_brace[i] = Some(braces.last().copied());
                    parens.push(i);
                }
                "[" => {
                    enclosing_brace[i] = Some(braces.last().copied());
                    squares.push(i);
                }
                "{" => braces.push(i),
                ")" => {
                    if let Some(open) = parens.pop() {
                        close[open] = Some(i);
                    }
                }
                "]" => {
                    if let Some(open) = squares.pop() {
                        close[open] = Some(i);
                    }
                }
                "}" => match braces.pop() {
                    Some(open) => close[open] = Some(i),
                    None => stray_braces.push(i),
                },
                _ => {}
            }
        }

        // Inside a brace the barrier is that brace's close (none if it never
        // closes). At file scope it is the next `}` with nothing to close.
        let barrier = enclosing_brace
            .iter()
            .enumerate()
            .map(|(i, enclosing)| match *enclosing {
                None => None,
                Some(Some(brace)) => close[brace],
                Some(None) => {
                    let next = stray_braces.partition_point(|&b| b < i);
                    stray_braces.get(next).copied()
                }
            })
            .collect();

        Self { close, barrier }
    }
}

/// Suffix repeated method names within one scope with their ordinal
fn number_overloads(members: &mut [NodeBuilder]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for member in members
        .iter_mut()
        .filter(|m| m.kind == DeclarationKind::Method)
    {
        let count = seen.entry(member.name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            member.name = format!("{}#{}", member.name, count);
        }
    }
}
