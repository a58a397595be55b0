//! Byte-level tokenizer for Java-like sources.
//!
//! Only the tokens the declaration parser needs are emitted. Comments,
//! whitespace and string/char literal bodies are matched so that braces
//! inside them never reach the parser, then dropped.

use once_cell::sync::Lazy;
use regex::bytes::{CaptureMatches, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reserved words of the host language
pub const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "_",
];

/// Words that lex like identifiers but denote literal values
pub const LITERAL_WORDS: &[&str] = &["true", "false", "null"];

/// Operators kept for disambiguation; every other operator character is skipped
pub const OPERATORS: &[&str] = &["->", "=", ">", "<", "!", "~", "?", ":"];

/// Separators, multi-character ones first
pub const SEPARATORS: &[&str] = &["...", "::", "(", ")", "{", "}", "[", "]", ";", ",", ".", "@"];

// Capture groups in priority order. Alternation is leftmost-first, so the
// discarded classes win over anything that could start inside them.
const TOKEN_PATTERN: &str = r#"(?x)
      (?P<line_comment>//[^\n]*)
    | (?P<block_comment>/\*(?s:.)*?(?:\*/|\z))
    | (?P<whitespace>\s+)
    | (?P<char_lit>'(?:[^'\\\n]|\\.)*')
    | (?P<text_block>"""(?s:.)*?(?:"""|\z))
    | (?P<string_lit>"(?:[^"\\\n]|\\.)*")
    | (?P<word>[A-Za-z_$\x80-\xFF][A-Za-z0-9_$\x80-\xFF]*)
    | (?P<number>[0-9](?:[0-9A-Za-z_]|\.[0-9])*)
    | (?P<long_separator>\.\.\.|::)
    | (?P<operator>->|[=><!~?:])
    | (?P<separator>[(){}\[\];,.@])
"#;

const IGNORED_GROUPS: &[&str] = &[
    "line_comment",
    "block_comment",
    "whitespace",
    "char_lit",
    "text_block",
    "string_lit",
];

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(TOKEN_PATTERN)
        .unicode(false)
        .build()
        .expect("token pattern is a valid byte regex")
});

static KEYWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| KEYWORDS.iter().copied().collect());

static LITERAL_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| LITERAL_WORDS.iter().copied().collect());

/// Class of an emitted token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Literal,
    Separator,
    Operator,
}

/// A lexed token and the source bytes it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Token text; invalid UTF-8 is replaced, so it may be longer than `len`
    pub text: String,
    pub offset: usize,
    /// Length of the token in source bytes
    pub len: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        let text = text.into();
        Self {
            kind,
            len: text.len(),
            text,
            offset,
        }
    }

    fn from_match(kind: TokenKind, m: &regex::bytes::Match<'_>) -> Self {
        Self {
            kind,
            text: String::from_utf8_lossy(m.as_bytes()).into_owned(),
            offset: m.start(),
            len: m.len(),
        }
    }

    /// Byte offset one past the last byte of this token
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    #[must_use]
    pub fn is_separator(&self, sep: &str) -> bool {
        self.kind == TokenKind::Separator && self.text == sep
    }

    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }
}

/// Stateless tokenizer. The compiled tables are shared process-wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer;

impl Lexer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Lazily tokenize `source`. Calling it again restarts from the beginning.
    pub fn tokens<'s>(&self, source: &'s [u8]) -> Tokens<'s> {
        Tokens {
            matches: TOKEN_REGEX.captures_iter(source),
        }
    }

    /// Tokenize the whole input eagerly
    #[must_use]
    pub fn tokenize(&self, source: &[u8]) -> Vec<Token> {
        self.tokens(source).collect()
    }
}

/// Iterator over the significant tokens of one source
pub struct Tokens<'s> {
    matches: CaptureMatches<'static, 's>,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        for caps in self.matches.by_ref() {
            if IGNORED_GROUPS.iter().any(|group| caps.name(group).is_some()) {
                continue;
            }

            if let Some(m) = caps.name("word") {
                let mut token = Token::from_match(TokenKind::Identifier, &m);
                if KEYWORD_SET.contains(token.text.as_str()) {
                    token.kind = TokenKind::Keyword;
                } else if LITERAL_WORD_SET.contains(token.text.as_str()) {
                    token.kind = TokenKind::Literal;
                }
                return Some(token);
            }

            let classified = [
                ("number", TokenKind::Literal),
                ("long_separator", TokenKind::Separator),
                ("operator", TokenKind::Operator),
                ("separator", TokenKind::Separator),
            ]
            .into_iter()
            .find_map(|(group, kind)| caps.name(group).map(|m| (m, kind)));

            if let Some((m, kind)) = classified {
                return Some(Token::from_match(kind, &m));
            }
        }
        None
    }
}
