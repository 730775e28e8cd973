//! C1 — line-level differ.
//!
//! Ported from `MyersDiffer`/`SMDiffer`/`Differ()` in `diffviewer/diffutils.py`.
//! The shortest-edit-script search itself lives in [`crate::myers`], shared
//! with C2's char-level region differ; this module only owns the
//! whitespace-insensitive comparison-key logic and the "interesting line"
//! cache layered on top.

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::error::{DiffCoreError, Result};
use crate::myers;

pub use crate::myers::{Opcode, Tag};

/// Selects the differ behind `Differ()`. Version 0 is the legacy
/// sequence-matcher path, retained only for diffs stored before `ignore_space`
/// existed (spec §9 Open Question); version 1 is the default Myers differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatVersion {
    Legacy,
    Myers,
}

impl CompatVersion {
    pub fn from_u32(version: u32) -> Result<Self> {
        match version {
            0 => {
                warn!("diff compat version 0 (legacy sequence matcher) is deprecated");
                Ok(CompatVersion::Legacy)
            }
            1 => Ok(CompatVersion::Myers),
            other => Err(DiffCoreError::UnsupportedCompatVersion(other)),
        }
    }
}

/// Collapses runs of ASCII/Unicode whitespace to a single space, for
/// whitespace-insensitive comparison only — the stored line is never
/// mutated.
fn whitespace_key(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_run = false;
    for ch in line.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn comparison_keys(lines: &[String], ignore_space: bool) -> Vec<String> {
    if ignore_space {
        lines.iter().map(|l| whitespace_key(l)).collect()
    } else {
        lines.to_vec()
    }
}

/// Runs the line differ and returns opcodes covering `[0,|a|) x [0,|b|)`
/// without gap or overlap (spec §8 invariant).
pub fn diff_lines(a: &[String], b: &[String], ignore_space: bool, compat: CompatVersion) -> Vec<Opcode> {
    // The legacy differ predates `ignore_space`, so it always compares raw
    // lines regardless of the flag (spec §9 Open Question resolution).
    let effective_ignore_space = ignore_space && compat == CompatVersion::Myers;

    let keys_a = comparison_keys(a, effective_ignore_space);
    let keys_b = comparison_keys(b, effective_ignore_space);

    myers::diff(&keys_a, &keys_b)
}

/// A named, compiled "interesting line" watch (used for header scanning, C5)
/// plus the differ state that caches per-side scan results. A name can have
/// several regexes registered against it (e.g. a method-signature pattern
/// and a class-declaration pattern both watched under `"header"`); a line
/// is interesting if any of them match.
pub struct LineDiffer<'a> {
    pub a: &'a [String],
    pub b: &'a [String],
    interesting: HashMap<String, Vec<Regex>>,
    cache: HashMap<(String, bool), Vec<(usize, String)>>,
}

impl<'a> LineDiffer<'a> {
    pub fn new(a: &'a [String], b: &'a [String]) -> Self {
        LineDiffer {
            a,
            b,
            interesting: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    pub fn add_interesting_line_regex(&mut self, name: &str, regex: Regex) {
        self.interesting.entry(name.to_string()).or_default().push(regex);
        self.cache.remove(&(name.to_string(), false));
        self.cache.remove(&(name.to_string(), true));
    }

    /// Scans the requested side once and caches the `(line_index, line_text)`
    /// matches, sorted by line index (they're produced in order already).
    pub fn get_interesting_lines(&mut self, name: &str, new_side: bool) -> Vec<(usize, String)> {
        let key = (name.to_string(), new_side);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let regexes = match self.interesting.get(name) {
            Some(r) if !r.is_empty() => r.clone(),
            _ => return Vec::new(),
        };

        let side = if new_side { self.b } else { self.a };
        let matches: Vec<(usize, String)> = side
            .iter()
            .enumerate()
            .filter(|(_, line)| regexes.iter().any(|r| r.is_match(line)))
            .map(|(i, line)| (i, line.clone()))
            .collect();

        self.cache.insert(key.clone(), matches.clone());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn opcodes_cover_input_without_gaps() {
        let a = lines(&["one", "two", "three"]);
        let b = lines(&["one", "TWO", "three", "four"]);
        let ops = diff_lines(&a, &b, false, CompatVersion::Myers);

        let mut last_i = 0;
        let mut last_j = 0;
        for op in &ops {
            assert_eq!(op.i1, last_i);
            assert_eq!(op.j1, last_j);
            last_i = op.i2;
            last_j = op.j2;
        }
        assert_eq!(last_i, a.len());
        assert_eq!(last_j, b.len());
    }

    #[test]
    fn basic_replace() {
        let a = lines(&["hello"]);
        let b = lines(&["world"]);
        let ops = diff_lines(&a, &b, false, CompatVersion::Myers);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, Tag::Replace);
        assert_eq!((ops[0].i1, ops[0].i2, ops[0].j1, ops[0].j2), (0, 1, 0, 1));
    }

    #[test]
    fn whitespace_only_becomes_equal_when_ignoring_space() {
        let a = lines(&["if(x) {"]);
        let b = lines(&["if ( x ) {"]);

        let with_ignore = diff_lines(&a, &b, true, CompatVersion::Myers);
        assert_eq!(with_ignore.len(), 1);
        assert_eq!(with_ignore[0].tag, Tag::Equal);

        let without_ignore = diff_lines(&a, &b, false, CompatVersion::Myers);
        assert_eq!(without_ignore.len(), 1);
        assert_eq!(without_ignore[0].tag, Tag::Replace);
    }

    #[test]
    fn legacy_compat_ignores_ignore_space_flag() {
        let a = lines(&["if(x) {"]);
        let b = lines(&["if ( x ) {"]);
        let ops = diff_lines(&a, &b, true, CompatVersion::Legacy);
        assert_eq!(ops[0].tag, Tag::Replace);
    }

    #[test]
    fn unsupported_compat_version_errors() {
        assert!(CompatVersion::from_u32(2).is_err());
        assert!(CompatVersion::from_u32(1).is_ok());
        assert!(CompatVersion::from_u32(0).is_ok());
    }

    #[test]
    fn interesting_lines_are_cached_and_sorted_by_index() {
        let a = lines(&["def foo():", "pass", "def bar():"]);
        let b = lines(&["def foo():", "pass"]);
        let mut differ = LineDiffer::new(&a, &b);
        differ.add_interesting_line_regex("header", Regex::new(r"^def ").unwrap());

        let left = differ.get_interesting_lines("header", false);
        assert_eq!(left, vec![(0, "def foo():".to_string()), (2, "def bar():".to_string())]);

        let left_again = differ.get_interesting_lines("header", false);
        assert_eq!(left_again, left);
    }
}
