use declmap_changes::{
    ChangeDetector, ChangeError, ChangeKind, DetectorConfig, DiffLine, EditHunk, FilePatch,
    FileVersion, LineOrigin, MemorySource, RevisionSource,
};
use declmap_declarations::{DeclarationKind, DeclarationParser, Identifier};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rendered<'a>(changes: impl IntoIterator<Item = &'a declmap_changes::Change>) -> Vec<String> {
    changes.into_iter().map(ToString::to_string).collect()
}

/// Per-line diff of two revisions of equal line count, the way a VCS would
/// report a one-line replacement
fn replace_line_hunk(old: &str, new: &str, line: usize) -> EditHunk {
    let offset = |text: &str| -> (usize, usize) {
        let start: usize = text.split_inclusive('\n').take(line).map(str::len).sum();
        let len = text.split_inclusive('\n').nth(line).map_or(0, str::len);
        (start, len)
    };
    let (old_start, old_len) = offset(old);
    let (new_start, new_len) = offset(new);
    EditHunk::from_lines(&[
        DiffLine::new(LineOrigin::Deletion, old_start, old_len),
        DiffLine::new(LineOrigin::Addition, new_start, new_len),
    ])
}

const OLD_SHAPES: &str = "package geo;

public class Shapes {
    public double area(Circle c) {
        return Math.PI * c.r * c.r;
    }

    public double perimeter(Circle c) {
        return 2 * Math.PI * c.r;
    }
}
";

const NEW_SHAPES: &str = "package geo;

public class Shapes {
    public double area(Circle c) {
        return Math.PI * c.r * c.r * 1.0;
    }

    public double perimeter(Circle c) {
        return 2 * Math.PI * c.r;
    }
}
";

#[test]
fn pure_modify_touches_only_the_edited_method() {
    init_logging();
    let source = MemorySource::new()
        .with_file("geo/Shapes.java", "r1", OLD_SHAPES)
        .with_file("geo/Shapes.java", "r2", NEW_SHAPES);
    let patch = FilePatch::modified(
        FileVersion::new("geo/Shapes.java", "r1"),
        FileVersion::new("geo/Shapes.java", "r2"),
        vec![replace_line_hunk(OLD_SHAPES, NEW_SHAPES, 4)],
    );

    let parsed = ChangeDetector::default()
        .parse_patch(&source, &patch)
        .unwrap()
        .unwrap();
    assert_eq!(rendered(&parsed.changes), vec!["modify geo.Shapes.area"]);
}

#[test]
fn blank_line_removed_between_methods_is_attributed_to_the_type() {
    let new = OLD_SHAPES.replacen(
        "}\n\n    public double perimeter",
        "}\n    public double perimeter",
        1,
    );
    let blank = OLD_SHAPES.find("\n\n    public double perimeter").unwrap() + 1;
    let source = MemorySource::new()
        .with_file("geo/Shapes.java", "r1", OLD_SHAPES)
        .with_file("geo/Shapes.java", "r2", new.as_str());
    let patch = FilePatch::modified(
        FileVersion::new("geo/Shapes.java", "r1"),
        FileVersion::new("geo/Shapes.java", "r2"),
        vec![EditHunk::from_lines(&[DiffLine::new(LineOrigin::Deletion, blank, 1)])],
    );

    let parsed = ChangeDetector::default()
        .parse_patch(&source, &patch)
        .unwrap()
        .unwrap();
    assert_eq!(rendered(&parsed.changes), vec!["delete geo.Shapes"]);
}

/// The added line starts with indentation that still belongs to `A`, so the
/// enclosing type is reported alongside the new method
#[test]
fn new_method_marks_itself_and_its_type() {
    let old = "package p;\nclass A {\n}\n";
    let new = "package p;\nclass A {\n  void f() {}\n}\n";
    let added = new.find("  void f").unwrap();
    let source = MemorySource::new()
        .with_file("A.java", "r1", old)
        .with_file("A.java", "r2", new);
    let hunk = EditHunk::from_lines(&[DiffLine::new(LineOrigin::Addition, added, 14)]);
    let patch = FilePatch::modified(
        FileVersion::new("A.java", "r1"),
        FileVersion::new("A.java", "r2"),
        vec![hunk],
    );

    let parsed = ChangeDetector::default()
        .parse_patch(&source, &patch)
        .unwrap()
        .unwrap();
    assert_eq!(rendered(&parsed.changes), vec!["add p.A", "add p.A.f"]);
}

#[test]
fn new_and_deleted_files_cover_every_declaration() {
    let text = "package p;\nclass A {\n  void f() {}\n}\n";
    let source = MemorySource::new()
        .with_file("A.java", "r2", text)
        .with_file("A.java", "r1", text);

    let detector = ChangeDetector::default();
    let added = detector
        .parse_patch(&source, &FilePatch::added(FileVersion::new("A.java", "r2")))
        .unwrap()
        .unwrap();
    assert_eq!(rendered(&added.changes), vec!["add p", "add p.A", "add p.A.f"]);

    let deleted = detector
        .parse_patch(&source, &FilePatch::deleted(FileVersion::new("A.java", "r1")))
        .unwrap()
        .unwrap();
    assert!(deleted.changes.iter().all(|c| c.kind == ChangeKind::Delete));
    assert_eq!(deleted.changes.len(), 3);
}

#[test]
fn nested_types_yield_dotted_member_paths() {
    let tree = DeclarationParser::default()
        .parse(b"class Outer { static class Inner { void go() {} } }");
    let (go, _) = tree.preorder().last().unwrap();
    let id = tree.identifier(go);

    assert_eq!(id.member_path(), "Outer.Inner.go");
    assert_eq!(id.to_string(), "<default>.Outer.Inner.go");

    let inner = Identifier::from_outermost([
        (DeclarationKind::Unit, "<default>"),
        (DeclarationKind::Type, "Outer"),
        (DeclarationKind::Type, "Inner"),
    ])
    .unwrap();
    assert_eq!(id.as_type(), Some(inner));
}

struct FlakySource {
    inner: MemorySource,
}

impl RevisionSource for FlakySource {
    fn read(&self, path: &str, revision: &str) -> declmap_changes::Result<Vec<u8>> {
        if path.starts_with("broken/") {
            return Err(ChangeError::read_failed(path, revision, "object missing"));
        }
        self.inner.read(path, revision)
    }
}

#[test]
fn batch_isolates_failing_patches() {
    init_logging();
    let source = FlakySource {
        inner: MemorySource::new()
            .with_file("ok/A.java", "r2", "package ok; class A {}")
            .with_file("ok/B.java", "r2", "package ok; class B { void b() {} }"),
    };
    let patches = vec![
        FilePatch::added(FileVersion::new("ok/A.java", "r2")),
        FilePatch::added(FileVersion::new("broken/C.java", "r2")),
        FilePatch::added(FileVersion::new("notes.txt", "r2")),
        FilePatch::added(FileVersion::new("ok/B.java", "r2")),
    ];

    let report = ChangeDetector::default().detect_all(&source, &patches);
    assert!(!report.is_clean());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "broken/C.java");
    assert!(matches!(report.failures[0].error, ChangeError::Source { .. }));

    let paths: Vec<_> = report.patches.iter().map(|p| p.path()).collect();
    assert_eq!(paths, vec!["ok/A.java", "ok/B.java"]);
    assert_eq!(
        rendered(&report.all_changes()),
        vec!["add ok", "add ok.A", "add ok.B", "add ok.B.b"]
    );
}

#[test]
fn malformed_file_degrades_instead_of_failing() {
    let source =
        MemorySource::new().with_file("Bad.java", "r2", "package p; class { ((( }}} void");
    let parsed = ChangeDetector::new(DetectorConfig::sequential())
        .unwrap()
        .parse_patch(&source, &FilePatch::added(FileVersion::new("Bad.java", "r2")))
        .unwrap()
        .unwrap();
    let expected: BTreeSet<String> = ["add p".to_string()].into_iter().collect();
    let got: BTreeSet<String> = parsed.changes.iter().map(ToString::to_string).collect();
    assert_eq!(got, expected);
}

#[test]
fn out_of_order_hunks_fail_the_patch() {
    let text = "package p;\nclass A {\n  void f() {}\n  void g() {}\n}\n";
    let source = MemorySource::new()
        .with_file("A.java", "r1", text)
        .with_file("A.java", "r2", text);
    let patch = FilePatch::modified(
        FileVersion::new("A.java", "r1"),
        FileVersion::new("A.java", "r2"),
        vec![EditHunk::deletion(40..42), EditHunk::deletion(20..22)],
    );
    let err = ChangeDetector::default()
        .parse_patch(&source, &patch)
        .unwrap_err();
    assert!(matches!(err, ChangeError::Match(_)));
}

#[test]
fn ordinal_overloads_are_reported_separately() {
    let config = DetectorConfig::from_toml_str("[parser]\noverloads = \"ordinal\"\n").unwrap();
    let text = "package p; class A { void f() {} void f(int x) {} }";
    let source = MemorySource::new().with_file("A.java", "r2", text);
    let parsed = ChangeDetector::new(config)
        .unwrap()
        .parse_patch(&source, &FilePatch::added(FileVersion::new("A.java", "r2")))
        .unwrap()
        .unwrap();
    assert_eq!(
        rendered(&parsed.changes),
        vec!["add p", "add p.A", "add p.A.f", "add p.A.f#2"]
    );
}
