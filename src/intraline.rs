//! C2 — intra-line region differ.
//!
//! Ported from `get_line_changed_regions` in `diffviewer/diffutils.py`. Runs
//! a char-level diff over a single replaced line pair and reports the
//! sub-spans that actually changed, so the renderer can bold/underline just
//! those regions instead of the whole line.

use crate::myers;

/// Byte-offset span `[start, end)` into the line it was computed from.
pub type Region = (usize, usize);

const SIMILARITY_THRESHOLD: f64 = 0.6;

/// A run of equal chars shorter than this resets `back`, letting a short
/// equal run get folded into the surrounding changed region instead of
/// splitting it in two (mirrors the Python differ's behavior exactly).
const SHORT_EQUAL_RUN: usize = 3;

fn char_byte_offsets(s: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = s.char_indices().map(|(i, _)| i).collect();
    offsets.push(s.len());
    offsets
}

/// Returns `(old_regions, new_regions)` — byte-offset spans of the parts of
/// `old_line`/`new_line` that changed, or `(None, None)` if the lines are
/// too dissimilar overall (ratio below [`SIMILARITY_THRESHOLD`]) for a
/// region-level diff to be meaningful.
pub fn get_line_changed_regions(old_line: &str, new_line: &str) -> (Option<Vec<Region>>, Option<Vec<Region>>) {
    let old_chars: Vec<char> = old_line.chars().collect();
    let new_chars: Vec<char> = new_line.chars().collect();

    let opcodes = myers::diff(&old_chars, &new_chars);
    if myers::ratio(old_chars.len(), new_chars.len(), &opcodes) < SIMILARITY_THRESHOLD {
        return (None, None);
    }

    // Accumulated in char-index space, since that's what the opcodes and
    // the overlap/merge comparisons are expressed in; converted to byte
    // offsets only once the spans are final.
    let mut old_changes: Vec<Region> = Vec::new();
    let mut new_changes: Vec<Region> = Vec::new();
    // (old_back, new_back): how far to extend the next changed region
    // backward over a short preceding equal run.
    let mut back: (usize, usize) = (0, 0);

    for op in &opcodes {
        if op.tag == myers::Tag::Equal {
            if (op.i2 - op.i1 < SHORT_EQUAL_RUN) || (op.j2 - op.j1 < SHORT_EQUAL_RUN) {
                back = (op.j2 - op.j1, op.i2 - op.i1);
            }
            continue;
        }

        let old_start = op.i1 - back.0;
        let old_end = op.i2;
        let new_start = op.j1 - back.1;
        let new_end = op.j2;

        push_region(&mut old_changes, old_start, old_end, &old_chars);
        push_region(&mut new_changes, new_start, new_end, &new_chars);

        back = (0, 0);
    }

    let old_offsets = char_byte_offsets(old_line);
    let new_offsets = char_byte_offsets(new_line);
    let to_bytes = |changes: Vec<Region>, offsets: &[usize]| -> Vec<Region> {
        changes.into_iter().map(|(s, e)| (offsets[s], offsets[e])).collect()
    };

    (
        Some(to_bytes(old_changes, &old_offsets)),
        Some(to_bytes(new_changes, &new_offsets)),
    )
}

/// Appends `[start, end)` (char indices) to `changes`, merging it into the
/// previous span if they overlap/abut, and dropping it if it covers only
/// whitespace chars.
fn push_region(changes: &mut Vec<Region>, start: usize, end: usize, chars: &[char]) {
    if changes.last().is_some_and(|&(_, last_end)| start <= last_end && last_end < end) {
        let first_start = changes.last().unwrap().0;
        *changes.last_mut().unwrap() = (first_start, end);
        return;
    }

    // Mirrors Python's `str.isspace()`: an *empty* slice is not considered
    // "all whitespace", so a zero-width span (a pure insertion point on the
    // other side) is still recorded rather than dropped.
    let is_space_only = start < end && chars[start..end].iter().all(|c| c.is_whitespace());
    if !is_space_only {
        changes.push((start, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dissimilar_lines_return_none() {
        let (old, new) = get_line_changed_regions("abc", "xyz");
        assert_eq!(old, None);
        assert_eq!(new, None);
    }

    #[test]
    fn single_word_replacement_is_localized() {
        let (old, new) = get_line_changed_regions("the quick fox", "the slow fox");
        let old = old.unwrap();
        let new = new.unwrap();
        assert_eq!(old, vec![(4, 9)]);
        assert_eq!(&"the quick fox"[old[0].0..old[0].1], "quick");
        assert_eq!(new, vec![(4, 8)]);
        assert_eq!(&"the slow fox"[new[0].0..new[0].1], "slow");
    }

    #[test]
    fn identical_lines_produce_no_regions() {
        let (old, new) = get_line_changed_regions("same line", "same line");
        assert_eq!(old, Some(Vec::new()));
        assert_eq!(new, Some(Vec::new()));
    }

    #[test]
    fn short_equal_run_merges_into_surrounding_change() {
        // "X" between "A"/"B" and "C"/"D" is a 1-char equal run, shorter
        // than SHORT_EQUAL_RUN, so the two replace opcodes flanking it get
        // folded into one contiguous region instead of reporting three
        // separate spans. The long shared prefix/suffix keep the overall
        // line similarity above the threshold.
        let (old, new) = get_line_changed_regions("prefix AXB suffix", "prefix CXD suffix");
        let old = old.unwrap();
        assert_eq!(old, vec![(7, 10)]);
        assert_eq!(&"prefix AXB suffix"[old[0].0..old[0].1], "AXB");
        let new = new.unwrap();
        assert_eq!(new, vec![(7, 10)]);
        assert_eq!(&"prefix CXD suffix"[new[0].0..new[0].1], "CXD");
    }

    #[test]
    fn short_preceding_equal_run_extends_region_backward() {
        // Inserting a single space into "a b" leaves a too-short leading
        // equal run ("a ", len 2 < SHORT_EQUAL_RUN), so the reported old
        // region backs up to include it rather than reporting a zero-width
        // insertion point.
        let (old, new) = get_line_changed_regions("a b", "a  b");
        assert_eq!(old.unwrap(), vec![(0, 2)]);
        assert_eq!(new.unwrap(), vec![(0, 3)]);
    }
}
