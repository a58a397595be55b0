use crate::error::{ChangeError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Half-open byte range `[start, end)` within one file revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Reject ranges whose end lies before their start
    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(ChangeError::InvalidHunk {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

impl From<Range<usize>> for ByteRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Side of a diff a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineOrigin {
    Context,
    Addition,
    Deletion,
}

impl LineOrigin {
    /// Map a unified-diff origin marker (`' '`, `'+'`, `'-'`)
    #[must_use]
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            ' ' => Some(Self::Context),
            '+' => Some(Self::Addition),
            '-' => Some(Self::Deletion),
            _ => None,
        }
    }
}

/// One line of a diff hunk, located by byte offset in the revision it
/// belongs to (old revision for deletions, new revision for additions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub origin: LineOrigin,
    pub content_offset: usize,
    pub len: usize,
}

impl DiffLine {
    #[must_use]
    pub const fn new(origin: LineOrigin, content_offset: usize, len: usize) -> Self {
        Self {
            origin,
            content_offset,
            len,
        }
    }
}

/// Byte ranges removed from the old revision and inserted into the new one
/// by a single diff hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EditHunk {
    pub deleted: Option<ByteRange>,
    pub added: Option<ByteRange>,
}

impl EditHunk {
    #[must_use]
    pub const fn new(deleted: Option<ByteRange>, added: Option<ByteRange>) -> Self {
        Self { deleted, added }
    }

    #[must_use]
    pub fn deletion(range: Range<usize>) -> Self {
        Self::new(Some(range.into()), None)
    }

    #[must_use]
    pub fn addition(range: Range<usize>) -> Self {
        Self::new(None, Some(range.into()))
    }

    #[must_use]
    pub fn replacement(old: Range<usize>, new: Range<usize>) -> Self {
        Self::new(Some(old.into()), Some(new.into()))
    }

    /// Covering ranges of a hunk's lines: from the first deleted line to the
    /// end of the last one, and likewise for added lines. Context lines only
    /// separate; they never widen a range.
    #[must_use]
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a DiffLine>) -> Self {
        let mut hunk = Self::default();
        for line in lines {
            let side = match line.origin {
                LineOrigin::Addition => &mut hunk.added,
                LineOrigin::Deletion => &mut hunk.deleted,
                LineOrigin::Context => continue,
            };
            let end = line.content_offset + line.len;
            side.get_or_insert(ByteRange::new(line.content_offset, end)).end = end;
        }
        hunk
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.deleted.is_none() && self.added.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        for range in self.deleted.iter().chain(self.added.iter()) {
            range.validate()?;
        }
        Ok(())
    }
}
