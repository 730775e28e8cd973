//! C6 — opcode post-processor: whitespace annotation and move-block detection.
//!
//! Ported from `opcodes_with_metadata`/`is_valid_move_range` in
//! `diffviewer/diffutils.py`, including its deliberately asymmetric move-range
//! search (only the first delete range seen for an insert run seeds
//! `r_move_ranges`; after that, only ranges that extend an existing seed are
//! tracked) and its longest-range-wins-with-no-winner-on-tie rule.

use std::collections::HashMap;

use crate::myers::{Opcode, Tag};

/// Per-opcode metadata, attached after the raw line diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMeta {
    /// True if every changed line in a `replace` chunk differs only in
    /// whitespace.
    pub whitespace_chunk: bool,
    /// `(old_linenum, new_linenum)` pairs (1-based) that differ only in
    /// whitespace, within a `replace` chunk.
    pub whitespace_lines: Vec<(usize, usize)>,
    /// Maps a 1-based line number on this side to its destination line
    /// number on the other side, for lines identified as moved.
    pub moved: HashMap<usize, usize>,
}

/// An opcode plus the metadata computed for it.
#[derive(Debug, Clone)]
pub struct AnnotatedOpcode {
    pub opcode: Opcode,
    pub meta: ChunkMeta,
}

/// A line has a real move only if it has at least one run of 4+
/// word characters once surrounding whitespace is stripped — short or
/// punctuation-only lines (closing braces, blank comment continuations)
/// aren't worth flagging as "moved".
fn is_valid_move_range(lines: &[&str]) -> bool {
    // ASCII-only, matching Python 2's un-flagged `\w` (no `re.UNICODE`): a
    // Cyrillic/CJK-only line has no character this counts as "word-like".
    lines.iter().any(|line| {
        let trimmed = line.trim();
        trimmed.chars().count() >= 4 && trimmed.chars().any(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Returns the whitespace metadata for a `replace` opcode spanning equal
/// line counts on both sides.
fn whitespace_meta(a: &[String], b: &[String], op: &Opcode) -> ChunkMeta {
    debug_assert_eq!(op.i2 - op.i1, op.j2 - op.j1);

    let mut whitespace_lines = Vec::new();
    for (i, j) in (op.i1..op.i2).zip(op.j1..op.j2) {
        if strip_whitespace(&a[i]) == strip_whitespace(&b[j]) {
            whitespace_lines.push((i + 1, j + 1));
        }
    }

    let whitespace_chunk = !whitespace_lines.is_empty() && whitespace_lines.len() == (op.i2 - op.i1);

    ChunkMeta { whitespace_chunk, whitespace_lines, moved: HashMap::new() }
}

/// A range `[start, end)` of a deleted block, keyed by the `(i1,i2,j1,j2)`
/// of its enclosing delete opcode so distinct delete groups never merge.
#[derive(Debug, Clone, Copy)]
struct RemoveRange {
    start: usize,
    end: usize,
    group_index: usize,
}

/// Runs whitespace annotation, then move-block detection, over `opcodes`.
///
/// `a`/`b` are the original (unnormalized) line texts the opcodes index
/// into — comparison keys used for the line diff itself are irrelevant here.
pub fn opcodes_with_metadata(a: &[String], b: &[String], opcodes: &[Opcode]) -> Vec<AnnotatedOpcode> {
    let mut annotated: Vec<AnnotatedOpcode> = opcodes
        .iter()
        .map(|op| {
            let meta = if op.tag == Tag::Replace && (op.i2 - op.i1) == (op.j2 - op.j1) {
                whitespace_meta(a, b, op)
            } else {
                ChunkMeta::default()
            };
            AnnotatedOpcode { opcode: *op, meta }
        })
        .collect();

    // line (stripped, non-blank) -> [(line_index, group_index)] of delete
    // opcodes that produced it.
    let mut removes: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
    let mut insert_groups: Vec<usize> = Vec::new();

    for (gi, op) in annotated.iter().map(|ao| ao.opcode).enumerate() {
        match op.tag {
            Tag::Delete => {
                for i in op.i1..op.i2 {
                    let line = a[i].trim();
                    if !line.is_empty() {
                        removes.entry(line.to_string()).or_default().push((i, gi));
                    }
                }
            }
            Tag::Insert => insert_groups.push(gi),
            _ => {}
        }
    }

    for insert_gi in insert_groups {
        let (ij1, ij2) = {
            let op = annotated[insert_gi].opcode;
            (op.j1, op.j2)
        };

        let mut i_move_cur = ij1;
        let mut i_move_range = (i_move_cur, i_move_cur);
        // key -> ranges found so far for that delete group.
        let mut r_move_ranges: HashMap<usize, Vec<RemoveRange>> = HashMap::new();

        while i_move_cur <= ij2 {
            let iline = if i_move_cur < b.len() { Some(b[i_move_cur].trim()) } else { None };
            let candidates = iline.and_then(|l| removes.get(l));

            if let Some(candidates) = candidates {
                for &(ri, remove_gi) in candidates {
                    if r_move_ranges.is_empty() {
                        // No seed yet: start tracking every candidate
                        // delete group that matches this inserted line.
                        // This only happens for the *first* inserted
                        // line in the run that has any match at all —
                        // once any seed exists, later matches only
                        // extend existing seeds (never add new ones).
                        r_move_ranges.entry(remove_gi).or_default().push(RemoveRange {
                            start: ri,
                            end: ri,
                            group_index: remove_gi,
                        });
                    } else if let Some(ranges) = r_move_ranges.get_mut(&remove_gi) {
                        if let Some(range) = ranges.iter_mut().find(|r| r.end + 1 == ri) {
                            range.end = ri;
                        }
                    }
                }
                i_move_cur += 1;
                continue;
            }

            finish_move_range(&mut annotated, a, &r_move_ranges, i_move_range, i_move_cur, insert_gi);

            i_move_cur += 1;
            i_move_range = (i_move_cur, i_move_cur);
            r_move_ranges.clear();
        }

        // The loop above only closes out a move range when it hits a
        // non-matching line; if the insert run ends while still matching,
        // close it out here too (mirrors the Python `while <= ij2` loop,
        // where i_move_cur == ij2 + 1 after the final iteration either way).
        finish_move_range(&mut annotated, a, &r_move_ranges, i_move_range, i_move_cur, insert_gi);
    }

    annotated
}

fn finish_move_range(
    annotated: &mut [AnnotatedOpcode],
    a: &[String],
    r_move_ranges: &HashMap<usize, Vec<RemoveRange>>,
    i_move_range: (usize, usize),
    i_move_cur: usize,
    insert_gi: usize,
) {
    if r_move_ranges.is_empty() {
        return;
    }

    // Faithful to the original's control flow: a tie resets the winner to
    // "none decided yet" rather than eliminating both candidates outright,
    // so if a later range is found it unconditionally becomes the new
    // winner regardless of its own length relative to the tied pair.
    let mut winner: Option<RemoveRange> = None;

    for ranges in r_move_ranges.values() {
        for &range in ranges {
            match winner {
                None => winner = Some(range),
                Some(w) => {
                    let len1 = w.end - w.start;
                    let len2 = range.end - range.start;
                    if len1 < len2 {
                        winner = Some(range);
                    } else if len1 == len2 {
                        winner = None;
                    }
                }
            }
        }
    }

    let Some(winner) = winner else { return };

    let old_lines: Vec<&str> = a[winner.start..=winner.end].iter().map(String::as_str).collect();
    if !is_valid_move_range(&old_lines) {
        return;
    }

    let i_range: Vec<usize> = ((i_move_range.0 + 1)..=i_move_cur).collect();
    let r_range: Vec<usize> = ((winner.start + 1)..=(winner.end + 1)).collect();

    for (r_line, i_line) in r_range.iter().zip(i_range.iter()) {
        annotated[winner.group_index].meta.moved.insert(*r_line, *i_line);
        annotated[insert_gi].meta.moved.insert(*i_line, *r_line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_diff::{diff_lines, CompatVersion};

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn whitespace_only_replace_is_flagged() {
        let a = lines(&["if(x){"]);
        let b = lines(&["if (x) {"]);
        let ops = diff_lines(&a, &b, false, CompatVersion::Myers);
        let annotated = opcodes_with_metadata(&a, &b, &ops);

        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].opcode.tag, Tag::Replace);
        assert!(annotated[0].meta.whitespace_chunk);
        assert_eq!(annotated[0].meta.whitespace_lines, vec![(1, 1)]);
    }

    #[test]
    fn mixed_replace_is_not_a_whitespace_chunk() {
        let a = lines(&["if(x){", "do_a();"]);
        let b = lines(&["if (x) {", "do_b();"]);
        let ops = diff_lines(&a, &b, false, CompatVersion::Myers);
        let annotated = opcodes_with_metadata(&a, &b, &ops);

        let replace = annotated.iter().find(|ao| ao.opcode.tag == Tag::Replace).unwrap();
        assert!(!replace.meta.whitespace_chunk);
        assert_eq!(replace.meta.whitespace_lines, vec![(1, 1)]);
    }

    #[test]
    fn moved_block_is_detected_between_delete_and_insert() {
        let a = lines(&["alpha", "moved line one", "moved line two", "beta"]);
        let b = lines(&["beta", "alpha", "moved line one", "moved line two"]);
        let ops = diff_lines(&a, &b, false, CompatVersion::Myers);
        let annotated = opcodes_with_metadata(&a, &b, &ops);

        let has_move = annotated.iter().any(|ao| !ao.meta.moved.is_empty());
        assert!(has_move, "expected at least one opcode to carry move metadata");
    }

    #[test]
    fn trivial_short_lines_are_not_flagged_as_moved() {
        assert!(!is_valid_move_range(&["}", ")"]));
        assert!(is_valid_move_range(&["}", "return value"]));
    }
}
