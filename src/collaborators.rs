//! External interfaces the core consumes but does not implement (§6).
//!
//! `ScmTool`, `Cache`, and `FileSource` have no default implementation here —
//! SCM retrieval and persistence are Non-goals (spec.md §1). `PatchApplier`
//! gets one default adapter, [`ProcessPatchApplier`], grounded directly in
//! `patch()` from `diffviewer/diffutils.py`: it's the reference adapter a
//! host can use as-is, not a required part of the core.

use crate::error::Result;

/// Applies a unified diff to file contents, returning the patched content.
pub trait PatchApplier {
    fn apply(&self, diff: &[u8], original: &[u8], filename: &str) -> Result<Vec<u8>>;
}

/// Resolves file revisions against whatever SCM backs a review request.
/// Left unimplemented in this crate (spec.md §1 Non-goal: SCM retrieval).
pub trait ScmTool {
    fn get_file(&self, path: &str, revision: &str) -> Result<Vec<u8>>;
}

/// Memoizes expensive per-file chunk generation. Left unimplemented in this
/// crate (spec.md §1 Non-goal: persistence) — a host wraps [`crate::chunk`]
/// output in whatever cache it already has.
pub trait Cache {
    fn get_or_compute<F>(&self, key: &str, compute: F) -> Vec<u8>
    where
        F: FnOnce() -> Vec<u8>;
}

/// Supplies the raw old/new file content pairs a diff describes, given a
/// [`crate::files::DiffFile`] record. Left unimplemented in this crate.
pub trait FileSource {
    fn old_content(&self, file: &crate::files::DiffFile) -> Result<Vec<u8>>;
    fn new_content(&self, file: &crate::files::DiffFile) -> Result<Vec<u8>>;
}
