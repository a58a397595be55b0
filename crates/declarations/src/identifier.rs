use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Kind of a recognized declaration, from most general to most specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    /// File/package-level container
    Unit,
    /// Class, interface, enum or annotation type
    Type,
    /// Method or constructor
    Method,
}

impl DeclarationKind {
    /// Whether `self` is strictly more general than `other` (Unit > Type > Method)
    #[must_use]
    pub fn is_more_general_than(self, other: Self) -> bool {
        self < other
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Type => "type",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(kind, name)` step of an identifier path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub kind: DeclarationKind,
    pub name: String,
}

impl Segment {
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Path from a declaration up to its outermost container.
///
/// Segments are stored most-specific-first, so `segments()[0]` is the
/// declaration itself and the last segment is the unit. `Display` renders
/// the conventional outermost-first dotted form (`com.foo.A.run`).
/// Ordering compares outermost-first, so a container sorts before its
/// members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Identifier {
    segments: Vec<Segment>,
}

impl Identifier {
    /// Build from segments ordered most-specific-first. Returns `None` for
    /// an empty path.
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// The walk always yields the node itself, so `segments` is non-empty
    pub(crate) fn from_ancestor_walk(segments: Vec<Segment>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    /// Build from `(kind, name)` pairs ordered outermost-first
    pub fn from_outermost<I, S>(path: I) -> Option<Self>
    where
        I: IntoIterator<Item = (DeclarationKind, S)>,
        S: Into<String>,
    {
        let mut segments: Vec<Segment> = path
            .into_iter()
            .map(|(kind, name)| Segment::new(kind, name))
            .collect();
        segments.reverse();
        Self::from_segments(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Kind of the declaration this identifier names
    #[must_use]
    pub fn kind(&self) -> DeclarationKind {
        self.segments[0].kind
    }

    /// Simple name of the declaration this identifier names
    #[must_use]
    pub fn name(&self) -> &str {
        &self.segments[0].name
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Identifier of the nearest enclosing declaration of `kind`.
    ///
    /// Returns `None` when this identifier's own kind is already more general
    /// than `kind` (a type has no enclosing method), or when no segment of
    /// that kind exists.
    #[must_use]
    pub fn project(&self, kind: DeclarationKind) -> Option<Self> {
        if self.kind().is_more_general_than(kind) {
            return None;
        }
        let at = self.segments.iter().position(|s| s.kind == kind)?;
        Some(Self {
            segments: self.segments[at..].to_vec(),
        })
    }

    #[must_use]
    pub fn as_method(&self) -> Option<Self> {
        self.project(DeclarationKind::Method)
    }

    #[must_use]
    pub fn as_type(&self) -> Option<Self> {
        self.project(DeclarationKind::Type)
    }

    #[must_use]
    pub fn as_unit(&self) -> Option<Self> {
        self.project(DeclarationKind::Unit)
    }

    /// Dotted path without the unit segment, e.g. `Outer.Inner.run`
    #[must_use]
    pub fn member_path(&self) -> String {
        join_outermost_first(
            self.segments
                .iter()
                .filter(|s| s.kind != DeclarationKind::Unit),
        )
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.iter().rev().cmp(other.segments.iter().rev())
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<Vec<Segment>> for Identifier {
    type Error = &'static str;

    fn try_from(segments: Vec<Segment>) -> Result<Self, Self::Error> {
        Self::from_segments(segments).ok_or("identifier needs at least one segment")
    }
}

impl From<Identifier> for Vec<Segment> {
    fn from(id: Identifier) -> Self {
        id.segments
    }
}

fn join_outermost_first<'a>(segments: impl DoubleEndedIterator<Item = &'a Segment>) -> String {
    segments
        .rev()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_outermost_first(self.segments.iter()))
    }
}
