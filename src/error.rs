//! Error taxonomy for the diff core (spec §7).
//!
//! Highlighter failures are intentionally not a variant here: per spec they
//! are swallowed in-core and the caller only ever sees the plain-text
//! fallback, never an `Err`.

use std::path::PathBuf;

/// Errors the core surfaces synchronously to callers.
#[derive(Debug, thiserror::Error)]
pub enum DiffCoreError {
    #[error("unsupported diff compatibility version: {0}")]
    UnsupportedCompatVersion(u32),

    #[error("patch failed to apply to '{filename}'; temp files preserved at {temp_dir}: {stdout}")]
    PatchFailed {
        filename: String,
        temp_dir: PathBuf,
        stdout: String,
    },

    #[error("could not decode content as UTF-8 using any of: {attempted}")]
    EncodingFailed { attempted: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiffCoreError>;
