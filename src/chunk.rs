//! C7 — chunking and collapsing engine.
//!
//! Ported from `get_chunks`/`new_chunk`/`compute_chunk_last_header` in
//! `diffviewer/diffutils.py`. Takes the annotated opcodes from C6 and turns
//! them into the `Chunk`/`RenderedLine` tree the renderer walks, deciding
//! which long equal runs collapse behind a "N unchanged lines" marker and
//! which stay visible as context around a change.

use std::collections::HashMap;

use crate::config::{Config, STYLED_MAX_LINE_LEN};
use crate::headers::{Header, HeaderScanner};
use crate::intraline::{get_line_changed_regions, Region};
use crate::line_diff::{diff_lines, CompatVersion, LineDiffer};
use crate::myers::Tag;
use crate::postprocess::{opcodes_with_metadata, ChunkMeta as OpcodeMeta};

/// One rendered row of the side-by-side view.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLine {
    /// Union line number across both sides — always contiguous within a
    /// file's output, unlike the per-side line numbers.
    pub vlinenum: usize,
    pub old_linenum: Option<usize>,
    pub old_markup: String,
    pub old_region: Option<Vec<Region>>,
    pub new_linenum: Option<usize>,
    pub new_markup: String,
    pub new_region: Option<Vec<Region>>,
    pub whitespace_only: bool,
    /// Destination line number on the other side, for a line identified as
    /// moved (see C6).
    pub moved_to: Option<usize>,
}

/// Chunk-level metadata: whitespace/move bookkeeping inherited from the
/// opcode, plus the header context attached while chunking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub whitespace_chunk: bool,
    pub whitespace_lines: Vec<(usize, usize)>,
    pub moved: HashMap<usize, usize>,
    pub left_headers: Vec<Header>,
    pub right_headers: Vec<Header>,
    /// Set only on a collapsable chunk that isn't the file's last chunk:
    /// the last header seen on each side before this point, carried so a
    /// collapsed range can still say "you're inside `fn foo`".
    pub headers: Option<(Option<Header>, Option<Header>)>,
}

impl From<OpcodeMeta> for Meta {
    fn from(m: OpcodeMeta) -> Self {
        Meta {
            whitespace_chunk: m.whitespace_chunk,
            whitespace_lines: m.whitespace_lines,
            moved: m.moved,
            left_headers: Vec::new(),
            right_headers: Vec::new(),
            headers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub lines: Vec<RenderedLine>,
    pub numlines: usize,
    pub change: Tag,
    pub collapsable: bool,
    pub meta: Meta,
}

/// Per-side source for one file: normalized lines and their rendered
/// (syntax-highlighted or HTML-escaped) markup, produced by C3/C4.
pub struct Side<'a> {
    pub lines: &'a [String],
    pub markup: &'a [String],
}

fn make_line(
    vlinenum: usize,
    old_linenum: Option<usize>,
    new_linenum: Option<usize>,
    old_line: Option<&str>,
    new_line: Option<&str>,
    old_markup: Option<&str>,
    new_markup: Option<&str>,
    meta: &OpcodeMeta,
) -> RenderedLine {
    let (old_region, new_region) = match (old_line, new_line) {
        (Some(old), Some(new))
            if old.len() <= STYLED_MAX_LINE_LEN && new.len() <= STYLED_MAX_LINE_LEN && old != new =>
        {
            get_line_changed_regions(old, new)
        }
        _ => (None, None),
    };

    let whitespace_only = match (old_linenum, new_linenum) {
        (Some(o), Some(n)) => meta.whitespace_lines.contains(&(o, n)),
        _ => false,
    };

    let moved_to = old_linenum
        .and_then(|o| meta.moved.get(&o).copied())
        .or_else(|| new_linenum.and_then(|n| meta.moved.get(&n).copied()));

    RenderedLine {
        vlinenum,
        old_linenum,
        old_markup: old_markup.unwrap_or_default().to_string(),
        old_region,
        new_linenum,
        new_markup: new_markup.unwrap_or_default().to_string(),
        new_region,
        whitespace_only,
        moved_to,
    }
}

struct Chunker<'a, 'b> {
    differ: &'b mut LineDiffer<'a>,
    scanner: HeaderScanner,
    last_header: [Option<Header>; 2],
    chunk_index: usize,
}

impl<'a, 'b> Chunker<'a, 'b> {
    fn new_chunk(
        &mut self,
        all_lines: &[RenderedLine],
        start: usize,
        end: usize,
        collapsable: bool,
        tag: Tag,
        opcode_meta: OpcodeMeta,
    ) -> Chunk {
        let mut meta: Meta = opcode_meta.into();

        if !all_lines.is_empty() {
            let window = &all_lines[start..end];
            if let (Some(first), Some(last)) = (window.first(), window.last()) {
                let old_start = first.old_linenum;
                let old_end = last.old_linenum;
                let new_start = first.new_linenum;
                let new_end = last.new_linenum;

                if let (Some(s), Some(e)) = (old_start, old_end) {
                    meta.left_headers = self.scanner.interesting_headers(self.differ, s, e, false);
                }
                if let (Some(s), Some(e)) = (new_start, new_end) {
                    meta.right_headers = self.scanner.interesting_headers(self.differ, s, e, true);
                }
            }
        }

        let lines: Vec<RenderedLine> = all_lines[start..end].to_vec();
        let numlines = lines.len();

        if let Some(h) = meta.left_headers.last() {
            self.last_header[0] = Some(h.clone());
        }
        if let Some(h) = meta.right_headers.last() {
            self.last_header[1] = Some(h.clone());
        }

        if collapsable && end < all_lines.len() && (self.last_header[0].is_some() || self.last_header[1].is_some()) {
            meta.headers = Some((self.last_header[0].clone(), self.last_header[1].clone()));
        }

        let chunk = Chunk {
            index: self.chunk_index,
            lines,
            numlines,
            change: tag,
            collapsable,
            meta,
        };
        self.chunk_index += 1;
        chunk
    }
}

/// Runs the full C1(diff)->C6(annotate)->C7(chunk) pipeline for one file.
///
/// `filename` drives C5 header detection; `old`/`new` carry both the plain
/// lines (for the line/region differs) and the rendered markup (for
/// display). Returns the chunk list in file order.
#[allow(clippy::too_many_arguments)]
pub fn generate_chunks<'a>(
    filename: &str,
    old: &'a Side<'a>,
    new: &'a Side<'a>,
    config: &Config,
    ignore_space: bool,
    compat: CompatVersion,
) -> Vec<Chunk> {
    let opcodes = diff_lines(old.lines, new.lines, ignore_space, compat);
    let annotated = opcodes_with_metadata(old.lines, new.lines, &opcodes);

    let mut differ = LineDiffer::new(old.lines, new.lines);
    crate::headers::register_interesting_lines_for_filename(&mut differ, filename);

    let mut chunker = Chunker {
        differ: &mut differ,
        scanner: HeaderScanner::new(),
        last_header: [None, None],
        chunk_index: 0,
    };

    let a_num_lines = old.lines.len();
    let b_num_lines = new.lines.len();
    let collapse_threshold = config.collapse_threshold();
    let context = config.context_num_lines;

    let mut chunks = Vec::new();
    let mut vlinenum = 1usize;

    for ao in &annotated {
        let op = ao.opcode;
        let numlines = (op.i2 - op.i1).max(op.j2 - op.j1);

        let all_lines: Vec<RenderedLine> = (0..numlines)
            .map(|k| {
                let old_idx = op.i1 + k;
                let new_idx = op.j1 + k;
                let old_linenum = if old_idx < op.i2 { Some(old_idx + 1) } else { None };
                let new_linenum = if new_idx < op.j2 { Some(new_idx + 1) } else { None };
                let old_line = old_linenum.map(|_| old.lines[old_idx].as_str());
                let new_line = new_linenum.map(|_| new.lines[new_idx].as_str());
                let old_markup = old_linenum.map(|_| old.markup[old_idx].as_str());
                let new_markup = new_linenum.map(|_| new.markup[new_idx].as_str());

                make_line(
                    vlinenum + k,
                    old_linenum,
                    new_linenum,
                    old_line,
                    new_line,
                    old_markup,
                    new_markup,
                    &ao.meta,
                )
            })
            .collect();

        if op.tag == Tag::Equal && numlines > collapse_threshold {
            let last_range_start = numlines - context;

            if vlinenum == 1 {
                chunks.push(chunker.new_chunk(&all_lines, 0, last_range_start, true, op.tag, ao.meta.clone()));
                chunks.push(chunker.new_chunk(&all_lines, last_range_start, numlines, false, op.tag, ao.meta.clone()));
            } else {
                chunks.push(chunker.new_chunk(&all_lines, 0, context, false, op.tag, ao.meta.clone()));

                if op.i2 == a_num_lines && op.j2 == b_num_lines {
                    chunks.push(chunker.new_chunk(&all_lines, context, numlines, true, op.tag, ao.meta.clone()));
                } else {
                    chunks.push(chunker.new_chunk(&all_lines, context, last_range_start, true, op.tag, ao.meta.clone()));
                    chunks.push(chunker.new_chunk(&all_lines, last_range_start, numlines, false, op.tag, ao.meta.clone()));
                }
            }
        } else {
            chunks.push(chunker.new_chunk(&all_lines, 0, numlines, false, op.tag, ao.meta.clone()));
        }

        vlinenum += numlines;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn small_diff_produces_one_chunk_per_opcode_group() {
        let old_lines = lines(&["one", "two", "three"]);
        let new_lines = lines(&["one", "TWO", "three", "four"]);
        let old_markup = old_lines.clone();
        let new_markup = new_lines.clone();

        let old = Side { lines: &old_lines, markup: &old_markup };
        let new = Side { lines: &new_lines, markup: &new_markup };
        let config = Config::default();

        let chunks = generate_chunks("file.txt", &old, &new, &config, false, CompatVersion::Myers);

        assert!(!chunks.is_empty());
        let total_lines: usize = chunks.iter().map(|c| c.numlines).sum();
        assert_eq!(total_lines, chunks.iter().map(|c| c.lines.len()).sum::<usize>());

        let vlinenums: Vec<usize> = chunks.iter().flat_map(|c| c.lines.iter().map(|l| l.vlinenum)).collect();
        let expected: Vec<usize> = (1..=vlinenums.len()).collect();
        assert_eq!(vlinenums, expected);
    }

    #[test]
    fn large_equal_run_collapses_with_context_kept_visible() {
        let mut old_lines: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        old_lines.push("changed".to_string());
        let mut new_lines: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        new_lines.push("different".to_string());

        let old = Side { lines: &old_lines, markup: &old_lines };
        let new = Side { lines: &new_lines, markup: &new_lines };
        let config = Config::default();

        let chunks = generate_chunks("file.txt", &old, &new, &config, false, CompatVersion::Myers);

        // First equal run at the start of the file: split into a collapsable
        // head and a small always-visible tail immediately before the change.
        assert_eq!(chunks[0].change, Tag::Equal);
        assert!(chunks[0].collapsable);
        assert_eq!(chunks[1].change, Tag::Equal);
        assert!(!chunks[1].collapsable);
        assert_eq!(chunks[1].numlines, config.context_num_lines);

        let last = chunks.last().unwrap();
        assert_eq!(last.change, Tag::Replace);
    }
}
