//! # declmap changes
//!
//! Attribution of file-level diffs to declaration-level changes.
//!
//! ## Architecture
//!
//! ```text
//! FilePatch[] (status, versions, hunks)
//!     │
//!     ├──> RevisionSource::read → old / new bytes
//!     │
//!     ├──> ChangeClassifier
//!     │    ├─> Added    → Add every declaration
//!     │    ├─> Deleted  → Delete every declaration
//!     │    └─> Modified → hunk ranges through one PositionMatcher per side
//!     │                   old ∩ new → Modify, old only → Delete, new only → Add
//!     │
//!     └──> ChangeDetector::detect_all (rayon) → BatchReport
//! ```
//!
//! ## Example
//!
//! ```rust
//! use declmap_changes::{ChangeDetector, FilePatch, FileVersion, MemorySource};
//!
//! let source = MemorySource::new().with_file("A.java", "r2", "package p; class A {}");
//! let patches = vec![FilePatch::added(FileVersion::new("A.java", "r2"))];
//!
//! let report = ChangeDetector::default().detect_all(&source, &patches);
//! let changes: Vec<_> = report.all_changes().iter().map(|c| c.to_string()).collect();
//! assert_eq!(changes, ["add p", "add p.A"]);
//! ```

mod change;
mod classifier;
mod config;
mod detector;
mod error;
mod hunk;
mod source;

pub use change::{Change, ChangeKind, FileStatus, ParsedPatch};
pub use classifier::{ChangeClassifier, Revision, Revisions};
pub use config::DetectorConfig;
pub use detector::{BatchReport, ChangeDetector, PatchFailure};
pub use error::{ChangeError, Result};
pub use hunk::{ByteRange, DiffLine, EditHunk, LineOrigin};
pub use source::{FilePatch, FileVersion, MemorySource, RevisionSource};
