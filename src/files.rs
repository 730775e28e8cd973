//! File-record assembly, ordering, and per-file chunk-population stats.
//!
//! Ported from `get_diff_files`/`cmp_file`/`populate_diff_chunks` in
//! `diffviewer/diffutils.py`. SCM retrieval, the diffset/interdiffset models,
//! and the chunk cache are host concerns (Non-goals); this module only keeps
//! the pure bookkeeping: how two files pair up into one record, how records
//! sort for display, and how a file's chunk list rolls up into summary
//! flags.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use crate::chunk::Chunk;
use crate::myers::Tag;

/// One side of a file pairing: `None` means that side doesn't exist (a pure
/// add or delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevision {
    pub path: String,
    pub revision: String,
}

/// A single file entry in a diff's file list, before chunks are populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFile {
    pub index: usize,
    pub depot_filename: String,
    pub dest_filename: String,
    pub basename: String,
    pub basepath: String,
    pub source: Option<FileRevision>,
    pub dest: Option<FileRevision>,
    pub newfile: bool,
    pub deleted: bool,
    pub binary: bool,
    pub moved: bool,
    /// Set when this record exists only because the interdiff reverted a
    /// file back to its original state — still shown, forced to look like a
    /// standalone diff against nothing (§4 "Missing-file in interdiff").
    pub force_interdiff: bool,
}

/// Splits `path` into `(basepath, basename)` the way `os.path.split` does.
fn split_path(path: &str) -> (String, String) {
    let p = Path::new(path);
    let basename = p.file_name().and_then(|s| s.to_str()).unwrap_or(path).to_string();
    let basepath = p
        .parent()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("")
        .to_string();
    (basepath, basename)
}

/// Builds the pre-chunk file record for one depot/dest filename pair.
///
/// `source`/`dest` are `None` for a pure add/delete respectively; `moved` is
/// true when the depot and dest filenames differ and neither side is `None`
/// (a rename/move with no content change still gets a record, per §3, but
/// `populate_diff_chunks` skips generating chunks for it).
pub fn make_diff_file(
    index: usize,
    depot_filename: &str,
    dest_filename: &str,
    source: Option<FileRevision>,
    dest: Option<FileRevision>,
    binary: bool,
    force_interdiff: bool,
) -> DiffFile {
    let (basepath, basename) = split_path(dest_filename);
    let newfile = source.is_none();
    let deleted = dest.is_none();
    let moved = !newfile && !deleted && depot_filename != dest_filename;

    DiffFile {
        index,
        depot_filename: depot_filename.to_string(),
        dest_filename: dest_filename.to_string(),
        basename,
        basepath,
        source,
        dest,
        newfile,
        deleted,
        binary,
        moved,
        force_interdiff,
    }
}

/// One raw file entry before interdiff pairing — the shape a host's diffset
/// storage hands in for one side of a diff, keyed for pairing by
/// `depot_filename` (the pre-change path, same role as `source_file` in
/// `diffutils.py`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffRecord {
    pub depot_filename: String,
    pub dest_filename: String,
    pub source: Option<FileRevision>,
    pub dest: Option<FileRevision>,
    pub binary: bool,
}

/// Pairs a diffset's files against an interdiffset's files the way
/// `get_diff_files` builds `filediff_parts`, producing one `DiffFile` per
/// distinct file across both revisions.
///
/// `interdiffs` empty means there's no interdiffset at all — every
/// `filediffs` entry becomes a plain, non-interdiff record. Otherwise three
/// cases fall out of the pairing, matching the original's three tuple
/// shapes:
///  - a `filediffs` entry whose `depot_filename` has no match in
///    `interdiffs`: still rendered against its own `dest`, but
///    `force_interdiff` is set because an interdiffset is in play.
///  - a `filediffs` entry that *does* match: the interdiff's `dest` takes
///    over as this file's destination content and `force_interdiff` is
///    set, so the renderer treats it as "diff against the interdiff's
///    reverted state" rather than the original two revisions.
///  - an interdiff entry with no match in `filediffs` at all (the file only
///    changed within the interdiff): rendered as a standalone record with
///    `force_interdiff` false.
pub fn build_diff_files(filediffs: &[FileDiffRecord], interdiffs: &[FileDiffRecord]) -> Vec<DiffFile> {
    let has_interdiffset = !interdiffs.is_empty();
    let mut interdiff_map: HashMap<&str, &FileDiffRecord> =
        interdiffs.iter().map(|f| (f.depot_filename.as_str(), f)).collect();

    let mut result = Vec::with_capacity(filediffs.len() + interdiffs.len());
    let mut index = 0;

    for filediff in filediffs {
        let matched = interdiff_map.remove(filediff.depot_filename.as_str());
        let dest_record = matched.unwrap_or(filediff);

        result.push(make_diff_file(
            index,
            &filediff.depot_filename,
            &dest_record.dest_filename,
            filediff.source.clone(),
            dest_record.dest.clone(),
            dest_record.binary,
            has_interdiffset,
        ));
        index += 1;
    }

    if has_interdiffset {
        for interfilediff in interdiffs {
            if interdiff_map.remove(interfilediff.depot_filename.as_str()).is_none() {
                continue;
            }
            result.push(make_diff_file(
                index,
                &interfilediff.depot_filename,
                &interfilediff.dest_filename,
                interfilediff.source.clone(),
                interfilediff.dest.clone(),
                interfilediff.binary,
                false,
            ));
            index += 1;
        }
    }

    result
}

/// Orders files for display: `basepath` ascending, then filename stem
/// ascending, then extension *descending* (so `foo.h` sorts before
/// `foo.c`/`foo.cpp`).
pub fn cmp_file(x: &DiffFile, y: &DiffFile) -> Ordering {
    if x.basepath != y.basepath {
        return x.basepath.cmp(&y.basepath);
    }

    let (x_stem, x_ext) = split_ext(&x.basename);
    let (y_stem, y_ext) = split_ext(&y.basename);

    if x_stem != y_stem {
        x_stem.cmp(&y_stem)
    } else {
        y_ext.cmp(&x_ext)
    }
}

fn split_ext(basename: &str) -> (&str, &str) {
    match basename.rfind('.') {
        Some(0) => (basename, ""), // dotfile with no extension, e.g. ".gitignore"
        Some(idx) => (&basename[..idx], &basename[idx..]),
        None => (basename, ""),
    }
}

/// Sorts `files` in place using [`cmp_file`].
pub fn sort_files(files: &mut [DiffFile]) {
    files.sort_by(cmp_file);
}

/// Per-file chunk summary, computed after chunking (`populate_diff_chunks`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub num_chunks: usize,
    pub changed_chunk_indexes: Vec<usize>,
    pub num_changes: usize,
    /// True iff every non-equal chunk is whitespace-only — a binary/deleted
    /// file (no chunks at all) counts as `true`, matching the original's
    /// default-true-unless-proven-otherwise accumulation.
    pub whitespace_only: bool,
}

/// Re-indexes `chunks` and computes the roll-up stats a file record carries
/// alongside them.
pub fn populate_chunk_stats(chunks: &mut [Chunk]) -> ChunkStats {
    let mut stats = ChunkStats {
        whitespace_only: true,
        ..ChunkStats::default()
    };

    for (i, chunk) in chunks.iter_mut().enumerate() {
        chunk.index = i;

        if chunk.change != Tag::Equal {
            stats.changed_chunk_indexes.push(i);
            if !chunk.meta.whitespace_chunk {
                stats.whitespace_only = false;
            }
        }
    }

    stats.num_chunks = chunks.len();
    stats.num_changes = stats.changed_chunk_indexes.len();
    stats
}
