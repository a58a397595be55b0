use crate::error::{ChangeError, Result};
use declmap_declarations::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// What happened to a declaration between two revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declaration-level change. Ordered by identifier, then kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Change {
    pub identifier: Identifier,
    pub kind: ChangeKind,
}

impl Change {
    #[must_use]
    pub const fn new(identifier: Identifier, kind: ChangeKind) -> Self {
        Self { identifier, kind }
    }

    #[must_use]
    pub const fn add(identifier: Identifier) -> Self {
        Self::new(identifier, ChangeKind::Add)
    }

    #[must_use]
    pub const fn modify(identifier: Identifier) -> Self {
        Self::new(identifier, ChangeKind::Modify)
    }

    #[must_use]
    pub const fn delete(identifier: Identifier) -> Self {
        Self::new(identifier, ChangeKind::Delete)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.identifier)
    }
}

/// Status of a file between two revisions, as reported by the VCS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Deleted,
    Modified,
    /// Moved, possibly with edits; analysed like a modification
    Renamed,
}

impl FileStatus {
    /// Parse a git status character
    pub fn from_status_char(status: char) -> Result<Self> {
        match status {
            'A' => Ok(Self::Added),
            'D' => Ok(Self::Deleted),
            'M' => Ok(Self::Modified),
            'R' => Ok(Self::Renamed),
            other => Err(ChangeError::UnsupportedStatus(other)),
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Modified => 'M',
            Self::Renamed => 'R',
        }
    }
}

impl TryFrom<char> for FileStatus {
    type Error = ChangeError;

    fn try_from(status: char) -> Result<Self> {
        Self::from_status_char(status)
    }
}

/// Declaration changes found in one file of a revision pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPatch {
    /// Path in the old revision; absent for added files
    pub old_path: Option<String>,
    /// Path in the new revision; absent for deleted files
    pub new_path: Option<String>,
    pub status: FileStatus,
    pub changes: BTreeSet<Change>,
}

impl ParsedPatch {
    /// The path the file is best known by: the new one when it exists
    #[must_use]
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    /// Changes of one kind
    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &Change> + '_ {
        self.changes.iter().filter(move |c| c.kind == kind)
    }
}
