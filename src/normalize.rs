//! C3 — encoding + normalization.
//!
//! Ported from `convert_line_endings` and `convert_to_utf8` in
//! `diffviewer/diffutils.py`.

use encoding_rs::Encoding;

use crate::error::{DiffCoreError, Result};

/// Collapses `\r\n` and lone `\r` into `\n`, and strips a trailing lone `\r`
/// (which upstream systems like Perforce emit to mean "no newline at end of
/// file" — turning it into `\n` would break `patch`).
pub fn normalize_newlines(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }

    let data = if data.last() == Some(&b'\r') {
        &data[..data.len() - 1]
    } else {
        data
    };

    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\r' => {
                out.push(b'\n');
                if data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

/// Decodes `bytes` as UTF-8, falling back through `enc_list` in order, and
/// finally to lossy UTF-8 replacement. Only fails if even the replacement
/// decode fails, which in practice never happens for `encoding_rs`'s
/// `UTF_8.decode` — kept as a `Result` to mirror the original's exception
/// path and to leave room for a future strict mode.
pub fn to_utf8(bytes: &[u8], enc_list: &[&str]) -> Result<String> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    for name in enc_list {
        if let Some(encoding) = Encoding::for_label(name.as_bytes()) {
            let (decoded, _, had_errors) = encoding.decode(bytes);
            if !had_errors {
                return Ok(decoded.into_owned());
            }
        }
    }

    let (decoded, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        return Err(DiffCoreError::EncodingFailed {
            attempted: enc_list.join(","),
        });
    }
    Ok(decoded.into_owned())
}

/// Appends a trailing newline if one is missing and the buffer is non-empty.
/// Used only for diffing purposes — the rendered lines never include it.
pub fn ensure_trailing_newline(s: &mut String) {
    if !s.is_empty() && !s.ends_with('\n') {
        s.push('\n');
    }
}

/// Splits normalized text into logical lines, without terminators, dropping
/// the trailing empty element produced by a final `\n`.
pub fn split_lines(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}
