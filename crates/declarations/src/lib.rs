//! # declmap declarations
//!
//! Grammar-free declaration trees for Java-like sources, plus a
//! forward-only matcher that attributes byte positions to the innermost
//! enclosing declaration.
//!
//! ## Architecture
//!
//! ```text
//! Source bytes
//!     │
//!     ├──> Lexer (byte regex, comments/strings dropped)
//!     │
//!     ├──> DeclarationParser
//!     │    ├─> package name → Unit
//!     │    ├─> class / interface / enum keyword → Type
//!     │    └─> identifier followed by `(` → Method
//!     │
//!     ├──> DeclarationTree (preorder arena, parent links)
//!     │
//!     └──> PositionMatcher
//!          ├─> find(pos)             innermost declaration
//!          └─> find_range(from, to)  declarations touched by an edit
//! ```
//!
//! ## Example
//!
//! ```rust
//! use declmap_declarations::{DeclarationParser, PositionMatcher};
//!
//! let source = b"package com.acme; class A { void run() { go(); } }";
//! let tree = DeclarationParser::default().parse(source);
//!
//! let mut matcher = PositionMatcher::new(&tree);
//! let id = matcher.find(35).unwrap();
//! assert_eq!(tree.identifier(id).to_string(), "com.acme.A.run");
//! ```

mod config;
mod error;
mod identifier;
mod lexer;
mod matcher;
mod parser;
mod tree;

pub use config::{OverloadPolicy, ParserConfig, DEFAULT_UNIT_NAME};
pub use error::{DeclarationError, MatchError, Result};
pub use identifier::{DeclarationKind, Identifier, Segment};
pub use lexer::{Lexer, Token, TokenKind, Tokens, KEYWORDS, LITERAL_WORDS, OPERATORS, SEPARATORS};
pub use matcher::PositionMatcher;
pub use parser::DeclarationParser;
pub use tree::{DeclarationNode, DeclarationTree, NodeBuilder, NodeId};
