//! Side-by-side diff rendering core: line/region diffing, move detection,
//! chunking and collapsing.
//!
//! This crate is the engine a code-review UI sits on top of. It owns the
//! diffing and chunking math (C1-C8); everything SCM-, HTTP-, or
//! persistence-shaped is left to the host through the traits in
//! [`collaborators`].
//!
//! The top-level entry point is [`generate_file_chunks`], which runs the
//! full C3 (normalize) -> C4 (highlight) -> C1 (line diff) -> C6 (annotate)
//! -> C7 (chunk) pipeline for one file. [`pager::get_file_chunks_in_range`]
//! then windows the result for a host that only wants to render part of a
//! file.

pub mod chunk;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod files;
pub mod headers;
pub mod highlight;
pub mod intraline;
pub mod line_diff;
pub mod myers;
pub mod normalize;
pub mod patch_process;
pub mod postprocess;

pub mod pager;

pub use chunk::{Chunk, Meta as ChunkMeta, RenderedLine};
pub use config::Config;
pub use error::{DiffCoreError, Result};
pub use files::DiffFile;
pub use line_diff::CompatVersion;
pub use myers::{Opcode, Tag};

/// Runs the full per-file diff pipeline: decodes both sides, normalizes line
/// endings, splits into lines, highlights each side, diffs, annotates with
/// whitespace/move metadata, and chunks the result.
///
/// `old_bytes`/`new_bytes` are the raw file content for each revision (pass
/// an empty slice for the add/delete case); `filename` drives both C5
/// header detection and C4 language selection.
#[tracing::instrument(skip(old_bytes, new_bytes, config))]
pub fn generate_file_chunks(
    filename: &str,
    old_bytes: &[u8],
    new_bytes: &[u8],
    config: &Config,
) -> Result<Vec<Chunk>> {
    let enc_list = config.encoding_list();

    let old_text = normalize::to_utf8(&normalize::normalize_newlines(old_bytes), &enc_list)?;
    let new_text = normalize::to_utf8(&normalize::normalize_newlines(new_bytes), &enc_list)?;

    let old_lines: Vec<String> = normalize::split_lines(&old_text).iter().map(|s| s.to_string()).collect();
    let new_lines: Vec<String> = normalize::split_lines(&new_text).iter().map(|s| s.to_string()).collect();

    let (old_markup, new_markup) = highlight::highlight_file(&old_lines, &new_lines, filename, config);

    let ignore_space = !config.is_space_significant(filename);
    let old = chunk::Side { lines: &old_lines, markup: &old_markup };
    let new = chunk::Side { lines: &new_lines, markup: &new_markup };

    Ok(chunk::generate_chunks(filename, &old, &new, config, ignore_space, CompatVersion::Myers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_pipeline_produces_chunks_for_a_simple_change() {
        let config = Config::default();
        let old = b"def greet():\n    print('hi')\n";
        let new = b"def greet():\n    print('hello')\n";

        let chunks = generate_file_chunks("greet.py", old, new, &config).unwrap();
        assert!(!chunks.is_empty());

        let total_lines: usize = chunks.iter().map(|c| c.numlines).sum();
        assert_eq!(total_lines, 2);

        let has_replace = chunks.iter().any(|c| c.change == Tag::Replace);
        assert!(has_replace);
    }

    #[test]
    fn crlf_input_is_normalized_before_diffing() {
        let config = Config::default();
        let old = b"a\r\nb\r\n";
        let new = b"a\r\nb\r\n";

        let chunks = generate_file_chunks("file.txt", old, new, &config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].change, Tag::Equal);
    }

    #[test]
    fn generate_file_chunks_emits_its_instrument_span() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone)]
        struct SharedBuf(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for SharedBuf {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedBuf {
            type Writer = SharedBuf;
            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let buf = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(SharedBuf(buf.clone()))
            .with_ansi(false)
            .finish();

        let config = Config::default();
        tracing::subscriber::with_default(subscriber, || {
            let _ = generate_file_chunks("file.py", b"a\n", b"b\n", &config);
        });

        let output = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(output.contains("generate_file_chunks"));
    }
}
