use crate::change::FileStatus;
use crate::error::{ChangeError, Result};
use crate::hunk::EditHunk;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provider of historical file content, typically backed by a VCS.
///
/// Implementations are called synchronously, possibly from several worker
/// threads at once.
pub trait RevisionSource: Sync {
    /// Raw bytes of `path` as of `revision`
    fn read(&self, path: &str, revision: &str) -> Result<Vec<u8>>;
}

/// A file path pinned to a revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileVersion {
    pub path: String,
    pub revision: String,
}

impl FileVersion {
    pub fn new(path: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
        }
    }
}

/// Diff metadata for one file between two revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    pub status: FileStatus,
    pub old: Option<FileVersion>,
    pub new: Option<FileVersion>,
    /// Edits in ascending position order on both sides
    #[serde(default)]
    pub hunks: Vec<EditHunk>,
}

impl FilePatch {
    #[must_use]
    pub fn added(new: FileVersion) -> Self {
        Self {
            status: FileStatus::Added,
            old: None,
            new: Some(new),
            hunks: Vec::new(),
        }
    }

    #[must_use]
    pub fn deleted(old: FileVersion) -> Self {
        Self {
            status: FileStatus::Deleted,
            old: Some(old),
            new: None,
            hunks: Vec::new(),
        }
    }

    #[must_use]
    pub fn modified(old: FileVersion, new: FileVersion, hunks: Vec<EditHunk>) -> Self {
        Self {
            status: FileStatus::Modified,
            old: Some(old),
            new: Some(new),
            hunks,
        }
    }

    #[must_use]
    pub fn renamed(old: FileVersion, new: FileVersion, hunks: Vec<EditHunk>) -> Self {
        Self {
            status: FileStatus::Renamed,
            ..Self::modified(old, new, hunks)
        }
    }

    /// Build a patch from a git status character. Unsupported statuses
    /// (copies, type changes, ...) are logged and yield `None`.
    #[must_use]
    pub fn from_status_char(
        status: char,
        old: Option<FileVersion>,
        new: Option<FileVersion>,
        hunks: Vec<EditHunk>,
    ) -> Option<Self> {
        match FileStatus::from_status_char(status) {
            Ok(status) => Some(Self {
                status,
                old,
                new,
                hunks,
            }),
            Err(err) => {
                let path = new.or(old).map(|v| v.path).unwrap_or_default();
                log::warn!("{err} for {path}, skipping");
                None
            }
        }
    }

    /// The path the patch is best known by
    #[must_use]
    pub fn path(&self) -> &str {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map_or("", |v| v.path.as_str())
    }

    pub(crate) fn old_version(&self) -> Result<&FileVersion> {
        self.old
            .as_ref()
            .ok_or_else(|| ChangeError::missing_content(self.path(), "old"))
    }

    pub(crate) fn new_version(&self) -> Result<&FileVersion> {
        self.new
            .as_ref()
            .ok_or_else(|| ChangeError::missing_content(self.path(), "new"))
    }
}

/// Revision source backed by a map, for fixtures and pre-fetched content
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<(String, String), Vec<u8>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        path: impl Into<String>,
        revision: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) {
        self.files
            .insert((path.into(), revision.into()), content.into());
    }

    /// Builder: add a file
    #[must_use]
    pub fn with_file(
        mut self,
        path: impl Into<String>,
        revision: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(path, revision, content);
        self
    }
}

impl RevisionSource for MemorySource {
    fn read(&self, path: &str, revision: &str) -> Result<Vec<u8>> {
        self.files
            .get(&(path.to_string(), revision.to_string()))
            .cloned()
            .ok_or_else(|| ChangeError::read_failed(path, revision, "no such file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_lookup() {
        let source = MemorySource::new().with_file("A.java", "r1", "class A {}");
        assert_eq!(source.read("A.java", "r1").unwrap(), b"class A {}");
        let err = source.read("A.java", "r2").unwrap_err();
        assert!(err.to_string().contains("A.java at r2"));
    }

    #[test]
    fn test_missing_side_is_reported() {
        let patch = FilePatch::added(FileVersion::new("p/A.java", "r2"));
        assert!(patch.new_version().is_ok());
        assert!(matches!(
            patch.old_version(),
            Err(ChangeError::MissingContent { side: "old", .. })
        ));
        assert_eq!(patch.path(), "p/A.java");
    }

    #[test]
    fn test_from_status_char() {
        let patch = FilePatch::from_status_char(
            'M',
            Some(FileVersion::new("A.java", "r1")),
            Some(FileVersion::new("A.java", "r2")),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(patch.status, FileStatus::Modified);

        let copied = FilePatch::from_status_char(
            'C',
            Some(FileVersion::new("A.java", "r1")),
            Some(FileVersion::new("B.java", "r2")),
            Vec::new(),
        );
        assert!(copied.is_none());
    }

    #[test]
    fn test_renamed_keeps_both_sides() {
        let patch = FilePatch::renamed(
            FileVersion::new("Old.java", "r1"),
            FileVersion::new("New.java", "r2"),
            vec![EditHunk::replacement(0..3, 0..4)],
        );
        assert_eq!(patch.status, FileStatus::Renamed);
        assert_eq!(patch.hunks.len(), 1);
        assert_eq!(patch.path(), "New.java");
    }
}
