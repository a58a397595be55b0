use crate::change::{Change, FileStatus, ParsedPatch};
use crate::classifier::{ChangeClassifier, Revision, Revisions};
use crate::config::DetectorConfig;
use crate::error::{ChangeError, Result};
use crate::source::{FilePatch, RevisionSource};
use declmap_declarations::DeclarationParser;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// A patch that could not be analysed
#[derive(Debug)]
pub struct PatchFailure {
    pub path: String,
    pub error: ChangeError,
}

/// Outcome of analysing every patch of one revision pair
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Analysed patches, in input order
    pub patches: Vec<ParsedPatch>,
    /// Patches that failed; the rest of the batch is unaffected
    pub failures: Vec<PatchFailure>,
}

impl BatchReport {
    /// Union of the changes of every analysed patch
    #[must_use]
    pub fn all_changes(&self) -> BTreeSet<Change> {
        self.patches
            .iter()
            .flat_map(|p| p.changes.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives parsing and classification for the patches of a revision pair
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    config: DetectorConfig,
    classifier: ChangeClassifier,
}

impl ChangeDetector {
    /// Create a detector, validating the configuration
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let parser = DeclarationParser::new(config.parser.clone())?;
        Ok(Self {
            config,
            classifier: ChangeClassifier::new(parser),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    #[must_use]
    pub fn classifier(&self) -> &ChangeClassifier {
        &self.classifier
    }

    /// Analyse one patch. Returns `Ok(None)` for files outside the
    /// configured extensions.
    pub fn parse_patch<S>(&self, source: &S, patch: &FilePatch) -> Result<Option<ParsedPatch>>
    where
        S: RevisionSource + ?Sized,
    {
        let analysed = [patch.old.as_ref(), patch.new.as_ref()]
            .into_iter()
            .flatten()
            .any(|v| self.config.is_analyzed(&v.path));
        if !analysed {
            log::debug!("Skipping {} (extension not analysed)", patch.path());
            return Ok(None);
        }

        let changes = match patch.status {
            FileStatus::Added => {
                let new = patch.new_version()?;
                log::debug!("Identifying changes in added file {}", new.path);
                let content = source.read(&new.path, &new.revision)?;
                let hint = self.config.infer_unit_name(&new.path);
                self.classifier.classify(Revisions::Added {
                    new: Revision::new(&content).with_unit_hint(hint.as_deref()),
                })?
            }
            FileStatus::Deleted => {
                let old = patch.old_version()?;
                log::debug!("Identifying changes in deleted file {}", old.path);
                let content = source.read(&old.path, &old.revision)?;
                let hint = self.config.infer_unit_name(&old.path);
                self.classifier.classify(Revisions::Deleted {
                    old: Revision::new(&content).with_unit_hint(hint.as_deref()),
                })?
            }
            FileStatus::Modified | FileStatus::Renamed => {
                let old = patch.old_version()?;
                let new = patch.new_version()?;
                let kind = match patch.status {
                    FileStatus::Renamed => "renamed",
                    _ => "modified",
                };
                log::debug!(
                    "Identifying changes in {kind} file {} ({} hunks)",
                    new.path,
                    patch.hunks.len()
                );
                let old_content = source.read(&old.path, &old.revision)?;
                let new_content = source.read(&new.path, &new.revision)?;
                // Both sides are named from their own path so a move between
                // directories without a package clause still lines up by member
                let old_hint = self.config.infer_unit_name(&old.path);
                let new_hint = self.config.infer_unit_name(&new.path);
                self.classifier.classify(Revisions::Modified {
                    old: Revision::new(&old_content).with_unit_hint(old_hint.as_deref()),
                    new: Revision::new(&new_content).with_unit_hint(new_hint.as_deref()),
                    hunks: &patch.hunks,
                })?
            }
        };

        Ok(Some(ParsedPatch {
            old_path: patch.old.as_ref().map(|v| v.path.clone()),
            new_path: patch.new.as_ref().map(|v| v.path.clone()),
            status: patch.status,
            changes,
        }))
    }

    /// Analyse every patch of a revision pair. A failing patch is logged and
    /// reported in [`BatchReport::failures`]; it never aborts the batch.
    pub fn detect_all<S>(&self, source: &S, patches: &[FilePatch]) -> BatchReport
    where
        S: RevisionSource + ?Sized,
    {
        let outcomes: Vec<_> = if self.config.parallel {
            patches
                .par_iter()
                .map(|patch| (patch, self.parse_patch(source, patch)))
                .collect()
        } else {
            patches
                .iter()
                .map(|patch| (patch, self.parse_patch(source, patch)))
                .collect()
        };

        let mut report = BatchReport::default();
        for (patch, outcome) in outcomes {
            match outcome {
                Ok(Some(parsed)) => report.patches.push(parsed),
                Ok(None) => {}
                Err(error) => {
                    log::warn!("Failed to analyse {}: {}", patch.path(), error);
                    report.failures.push(PatchFailure {
                        path: patch.path().to_string(),
                        error,
                    });
                }
            }
        }

        log::info!(
            "Analysed {} of {} patches ({} failed, {} changes)",
            report.patches.len(),
            patches.len(),
            report.failures.len(),
            report.patches.iter().map(|p| p.changes.len()).sum::<usize>()
        );
        report
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self {
            config: DetectorConfig::default(),
            classifier: ChangeClassifier::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunk::EditHunk;
    use crate::source::{FileVersion, MemorySource};
    use pretty_assertions::assert_eq;

    fn rendered(changes: &BTreeSet<Change>) -> Vec<String> {
        changes.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_non_matching_extension_is_skipped() {
        let detector = ChangeDetector::default();
        let source = MemorySource::new();
        let patch = FilePatch::added(FileVersion::new("docs/README.md", "r2"));
        assert_eq!(detector.parse_patch(&source, &patch).unwrap(), None);
    }

    #[test]
    fn test_added_file_infers_unit_from_path() {
        let detector = ChangeDetector::default();
        let source = MemorySource::new().with_file(
            "app/src/main/java/com/acme/A.java",
            "r2",
            "class A { void f() {} }",
        );
        let patch = FilePatch::added(FileVersion::new("app/src/main/java/com/acme/A.java", "r2"));
        let parsed = detector.parse_patch(&source, &patch).unwrap().unwrap();
        assert_eq!(
            rendered(&parsed.changes),
            vec!["add com.acme", "add com.acme.A", "add com.acme.A.f"]
        );
        assert_eq!(parsed.old_path, None);
    }

    #[test]
    fn test_missing_content_fails() {
        let detector = ChangeDetector::default();
        let patch = FilePatch::deleted(FileVersion::new("A.java", "r1"));
        let err = detector.parse_patch(&MemorySource::new(), &patch).unwrap_err();
        assert!(matches!(err, ChangeError::Source { .. }));
    }

    #[test]
    fn test_renamed_is_treated_as_modified() {
        let old = "package p; class A { void f() { x(); } }";
        let new = "package p; class A { void f() { y(); } }";
        let at = old.find("x()").unwrap();
        let source = MemorySource::new()
            .with_file("a/A.java", "r1", old)
            .with_file("b/A.java", "r2", new);
        let patch = FilePatch::renamed(
            FileVersion::new("a/A.java", "r1"),
            FileVersion::new("b/A.java", "r2"),
            vec![EditHunk::replacement(at..at + 1, at..at + 1)],
        );
        let parsed = ChangeDetector::default()
            .parse_patch(&source, &patch)
            .unwrap()
            .unwrap();
        assert_eq!(parsed.status, FileStatus::Renamed);
        assert_eq!(rendered(&parsed.changes), vec!["modify p.A.f"]);
    }

    #[test]
    fn test_moved_file_without_package_is_named_per_side() {
        let text = "class A { void f() { x(); } }";
        let at = text.find("x()").unwrap();
        let old_path = "src/main/java/com/legacy/A.java";
        let new_path = "src/main/java/com/acme/A.java";
        let source = MemorySource::new()
            .with_file(old_path, "r1", text)
            .with_file(new_path, "r2", text);
        let patch = FilePatch::renamed(
            FileVersion::new(old_path, "r1"),
            FileVersion::new(new_path, "r2"),
            vec![EditHunk::replacement(at..at + 1, at..at + 1)],
        );
        let parsed = ChangeDetector::default()
            .parse_patch(&source, &patch)
            .unwrap()
            .unwrap();
        assert_eq!(
            rendered(&parsed.changes),
            vec!["add com.acme.A.f", "delete com.legacy.A.f"]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DetectorConfig {
            extensions: Vec::new(),
            ..Default::default()
        };
        assert!(ChangeDetector::new(config).is_err());
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let source = MemorySource::new()
            .with_file("A.java", "r2", "package p; class A {}")
            .with_file("B.java", "r2", "package p; class B { int g() { return 1; } }");
        let patches = vec![
            FilePatch::added(FileVersion::new("A.java", "r2")),
            FilePatch::added(FileVersion::new("B.java", "r2")),
        ];
        let parallel = ChangeDetector::default().detect_all(&source, &patches);
        let sequential = ChangeDetector::new(DetectorConfig::sequential())
            .unwrap()
            .detect_all(&source, &patches);
        assert_eq!(parallel.patches, sequential.patches);
        assert_eq!(parallel.all_changes().len(), 4);
    }
}
