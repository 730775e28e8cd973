//! C8 — range pager.
//!
//! Ported from `get_file_chunks_in_range` in `diffviewer/diffutils.py`. Slices
//! a file's full chunk list down to the window a host wants to render
//! (e.g. "lines 40-80 of this file"), splitting the boundary chunks and
//! carrying forward whatever header context a collapsed chunk captured.

use crate::chunk::{Chunk, Meta, RenderedLine};
use crate::headers::Header;

/// Returns the last header in `headers` whose line number is strictly before
/// `before_line`. `headers` is kept in ascending line order by the chunker,
/// so the last match walking from the end is the most recent one.
fn find_header(headers: &[Header], before_line: usize) -> Option<Header> {
    headers.iter().rev().find(|h| h.line < before_line).cloned()
}

/// Returns the subset of `chunks` whose lines fall within
/// `[first_line, last_line]` (1-based, inclusive, counted against
/// `RenderedLine::vlinenum`), trimming the first/last chunk in the window
/// down to just the requested lines rather than returning whole chunks.
///
/// Every returned chunk's `meta.headers` is replaced with the header
/// context a host should show for it: the chunk's own `left_headers`/
/// `right_headers` entry immediately before the window start (when the
/// window begins partway through a chunk that recorded one), or else
/// whatever header was last seen while walking the file from the start.
/// `left_headers`/`right_headers` are stripped from the output, since
/// they're only meaningful while slicing, not once a chunk is windowed.
pub fn get_file_chunks_in_range(chunks: &[Chunk], first_line: usize, last_line: usize) -> Vec<Chunk> {
    if first_line == 0 || last_line < first_line {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut last_header: (Option<Header>, Option<Header>) = (None, None);
    let mut cursor = first_line;
    let mut remaining = last_line - first_line + 1;

    for chunk in chunks {
        if let Some((left, right)) = &chunk.meta.headers {
            if left.is_some() || right.is_some() {
                last_header = (left.clone(), right.clone());
            }
        }

        let Some(chunk_first) = chunk.lines.first().map(|l| l.vlinenum) else {
            continue;
        };
        let Some(chunk_last) = chunk.lines.last().map(|l| l.vlinenum) else {
            continue;
        };

        if !(chunk_last >= cursor && cursor >= chunk_first) {
            continue;
        }

        let start_index = cursor - chunk_first;
        let lines_left_in_window = remaining.min(chunk.lines.len() - start_index);
        let end_index = start_index + lines_left_in_window;

        let lines: Vec<RenderedLine> = chunk.lines[start_index..end_index].to_vec();
        let numlines = lines.len();

        let left_header = find_header(&chunk.meta.left_headers, cursor);
        let right_header = find_header(&chunk.meta.right_headers, cursor);
        let headers = if left_header.is_some() || right_header.is_some() {
            (left_header, right_header)
        } else {
            last_header.clone()
        };

        result.push(Chunk {
            index: chunk.index,
            lines,
            numlines,
            change: chunk.change,
            collapsable: chunk.collapsable,
            meta: Meta {
                whitespace_chunk: chunk.meta.whitespace_chunk,
                whitespace_lines: chunk.meta.whitespace_lines.clone(),
                moved: chunk.meta.moved.clone(),
                left_headers: Vec::new(),
                right_headers: Vec::new(),
                headers: Some(headers),
            },
        });

        cursor += numlines;
        remaining -= numlines;
        if remaining == 0 {
            break;
        }
    }

    result
}
