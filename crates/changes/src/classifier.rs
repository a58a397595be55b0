use crate::change::Change;
use crate::error::Result;
use crate::hunk::{ByteRange, EditHunk};
use declmap_declarations::{DeclarationParser, DeclarationTree, Identifier, PositionMatcher};
use std::collections::{BTreeSet, HashSet};

/// One side of a revision pair: its content and the unit name to use when
/// it declares no package
#[derive(Debug, Clone, Copy)]
pub struct Revision<'a> {
    pub content: &'a [u8],
    pub unit_hint: Option<&'a str>,
}

impl<'a> Revision<'a> {
    #[must_use]
    pub const fn new(content: &'a [u8]) -> Self {
        Self {
            content,
            unit_hint: None,
        }
    }

    /// Builder: name the unit when no package is declared
    #[must_use]
    pub fn with_unit_hint(mut self, unit_hint: Option<&'a str>) -> Self {
        self.unit_hint = unit_hint;
        self
    }
}

/// File content for one revision pair, shaped by what happened to the file
#[derive(Debug, Clone, Copy)]
pub enum Revisions<'a> {
    Added {
        new: Revision<'a>,
    },
    Deleted {
        old: Revision<'a>,
    },
    /// Also covers renames; each side keeps its own unit hint
    Modified {
        old: Revision<'a>,
        new: Revision<'a>,
        hunks: &'a [EditHunk],
    },
}

/// Attributes file-level edits to declaration-level changes
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier {
    parser: DeclarationParser,
}

impl ChangeClassifier {
    #[must_use]
    pub const fn new(parser: DeclarationParser) -> Self {
        Self { parser }
    }

    #[must_use]
    pub const fn parser(&self) -> &DeclarationParser {
        &self.parser
    }

    /// Parse the given revisions and classify their changes
    pub fn classify(&self, revisions: Revisions<'_>) -> Result<BTreeSet<Change>> {
        match revisions {
            Revisions::Added { new } => Ok(Self::added(&self.parse(new))),
            Revisions::Deleted { old } => Ok(Self::deleted(&self.parse(old))),
            Revisions::Modified { old, new, hunks } => {
                Self::modified(&self.parse(old), &self.parse(new), hunks)
            }
        }
    }

    fn parse(&self, revision: Revision<'_>) -> DeclarationTree {
        self.parser
            .parse_with_unit_fallback(revision.content, revision.unit_hint)
    }

    /// Every declaration of a new file is added
    #[must_use]
    pub fn added(tree: &DeclarationTree) -> BTreeSet<Change> {
        tree.identifiers().map(Change::add).collect()
    }

    /// Every declaration of a removed file is deleted
    #[must_use]
    pub fn deleted(tree: &DeclarationTree) -> BTreeSet<Change> {
        tree.identifiers().map(Change::delete).collect()
    }

    /// Declarations touched on the old side, the new side, or both.
    ///
    /// Each hunk's deleted range is resolved against the old tree and its
    /// added range against the new tree, so hunks must be ordered by
    /// position on both sides.
    pub fn modified(
        old: &DeclarationTree,
        new: &DeclarationTree,
        hunks: &[EditHunk],
    ) -> Result<BTreeSet<Change>> {
        let mut old_matcher = PositionMatcher::new(old);
        let mut new_matcher = PositionMatcher::new(new);
        let mut touched_old = HashSet::new();
        let mut touched_new = HashSet::new();

        for hunk in hunks {
            hunk.validate()?;
            if let Some(range) = hunk.deleted {
                touch(&mut old_matcher, range, &mut touched_old)?;
            }
            if let Some(range) = hunk.added {
                touch(&mut new_matcher, range, &mut touched_new)?;
            }
        }

        let changes = touched_old
            .iter()
            .map(|id| {
                if touched_new.contains(id) {
                    Change::modify(id.clone())
                } else {
                    Change::delete(id.clone())
                }
            })
            .chain(
                touched_new
                    .iter()
                    .filter(|id| !touched_old.contains(*id))
                    .map(|id| Change::add(id.clone())),
            )
            .collect();
        Ok(changes)
    }
}

fn touch(
    matcher: &mut PositionMatcher<'_>,
    range: ByteRange,
    touched: &mut HashSet<Identifier>,
) -> Result<()> {
    let tree = matcher.tree();
    for id in matcher.find_range(range.start, range.end)? {
        touched.insert(tree.identifier(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declmap_declarations::DeclarationKind::{Method, Type, Unit};
    use declmap_declarations::{DeclarationKind, MatchError, NodeBuilder};
    use pretty_assertions::assert_eq;

    fn id(path: &[(DeclarationKind, &str)]) -> Identifier {
        Identifier::from_outermost(path.iter().copied()).unwrap()
    }

    /// Unit F with C1 { m1 [5,40), m2 [41,80) }
    fn c1_tree() -> DeclarationTree {
        NodeBuilder::unit("F", 0..100)
            .with_member(
                NodeBuilder::type_decl("C1", 1..90)
                    .with_member(NodeBuilder::method("m1", 5..40))
                    .with_member(NodeBuilder::method("m2", 41..80)),
            )
            .freeze()
            .unwrap()
    }

    fn rendered(changes: &BTreeSet<Change>) -> Vec<String> {
        changes.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_pure_modify_touches_only_the_method() {
        let old = c1_tree();
        let new = c1_tree();
        let hunks = [EditHunk::replacement(10..20, 10..22)];
        let changes = ChangeClassifier::modified(&old, &new, &hunks).unwrap();
        let expected = Change::modify(id(&[(Unit, "F"), (Type, "C1"), (Method, "m1")]));
        assert_eq!(changes.into_iter().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn test_gap_delete_resolves_to_enclosing_type() {
        let old = c1_tree();
        let new = c1_tree();
        let hunks = [EditHunk::deletion(40..41)];
        let changes = ChangeClassifier::modified(&old, &new, &hunks).unwrap();
        assert_eq!(rendered(&changes), vec!["delete F.C1"]);
    }

    #[test]
    fn test_added_range_only_on_new_side() {
        let old = NodeBuilder::unit("F", 0..20)
            .with_member(NodeBuilder::type_decl("C1", 0..20))
            .freeze()
            .unwrap();
        let new = c1_tree();
        let hunks = [EditHunk::addition(41..80)];
        let changes = ChangeClassifier::modified(&old, &new, &hunks).unwrap();
        assert_eq!(rendered(&changes), vec!["add F.C1.m2"]);
    }

    #[test]
    fn test_edit_spanning_methods() {
        let old = c1_tree();
        let new = c1_tree();
        let hunks = [EditHunk::replacement(30..50, 30..45)];
        let changes = ChangeClassifier::modified(&old, &new, &hunks).unwrap();
        assert_eq!(rendered(&changes), vec!["modify F.C1.m1", "modify F.C1.m2"]);
    }

    #[test]
    fn test_multiple_hunks_in_order() {
        let old = c1_tree();
        let new = c1_tree();
        let hunks = [EditHunk::deletion(6..8), EditHunk::replacement(50..52, 50..51)];
        let changes = ChangeClassifier::modified(&old, &new, &hunks).unwrap();
        assert_eq!(rendered(&changes), vec!["delete F.C1.m1", "modify F.C1.m2"]);
    }

    #[test]
    fn test_out_of_order_hunks_error() {
        let old = c1_tree();
        let hunks = [EditHunk::deletion(50..52), EditHunk::deletion(6..8)];
        let err = ChangeClassifier::modified(&old, &old, &hunks).unwrap_err();
        assert!(matches!(
            err,
            crate::ChangeError::Match(MatchError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_new_file_adds_everything() {
        let classifier = ChangeClassifier::default();
        let changes = classifier
            .classify(Revisions::Added {
                new: Revision::new(b"package p; class A { void f() {} }"),
            })
            .unwrap();
        assert_eq!(rendered(&changes), vec!["add p", "add p.A", "add p.A.f"]);
    }

    #[test]
    fn test_deleted_file_uses_unit_hint() {
        let classifier = ChangeClassifier::default();
        let changes = classifier
            .classify(Revisions::Deleted {
                old: Revision::new(b"class A {}").with_unit_hint(Some("com.acme")),
            })
            .unwrap();
        assert_eq!(rendered(&changes), vec!["delete com.acme", "delete com.acme.A"]);
    }

    #[test]
    fn test_modified_sources_end_to_end() {
        let old = "package p;\nclass A {\n  void f() { a(); }\n  void g() { b(); }\n}\n";
        let new = "package p;\nclass A {\n  void f() { a(); }\n  void g() { c(); }\n}\n";
        let at = old.find("b()").unwrap();
        let hunks = [EditHunk::replacement(at..at + 1, at..at + 1)];
        let changes = ChangeClassifier::default()
            .classify(Revisions::Modified {
                old: Revision::new(old.as_bytes()),
                new: Revision::new(new.as_bytes()),
                hunks: &hunks,
            })
            .unwrap();
        assert_eq!(rendered(&changes), vec!["modify p.A.g"]);
    }

    #[test]
    fn test_moved_file_names_each_side_from_its_own_hint() {
        let text = "class A {\n  void f() { a(); }\n}\n";
        let at = text.find("a()").unwrap();
        let hunks = [EditHunk::replacement(at..at + 1, at..at + 1)];
        let changes = ChangeClassifier::default()
            .classify(Revisions::Modified {
                old: Revision::new(text.as_bytes()).with_unit_hint(Some("old.pkg")),
                new: Revision::new(text.as_bytes()).with_unit_hint(Some("new.pkg")),
                hunks: &hunks,
            })
            .unwrap();
        assert_eq!(
            rendered(&changes),
            vec!["add new.pkg.A.f", "delete old.pkg.A.f"]
        );
    }
}
