//! Default [`PatchApplier`] adapter: shells out to the `patch(1)` binary.
//!
//! Ported from `patch()` in `diffviewer/diffutils.py`. Temp files are
//! cleaned up on success; on failure the temp directory (plus a copy of the
//! diff for inspection) is deliberately left on disk and named in the error,
//! the same debugging aid the original provides.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::collaborators::PatchApplier;
use crate::error::{DiffCoreError, Result};
use crate::normalize::normalize_newlines;

/// Applies diffs via the system `patch` binary.
pub struct ProcessPatchApplier;

impl PatchApplier for ProcessPatchApplier {
    fn apply(&self, diff: &[u8], original: &[u8], filename: &str) -> Result<Vec<u8>> {
        if diff.iter().all(|b| b.is_ascii_whitespace()) {
            // An unchanged file produces an empty diff; nothing to apply.
            return Ok(original.to_vec());
        }

        let tempdir = tempfile::Builder::new().prefix("diffcore.").tempdir()?;
        let oldfile = tempdir.path().join("old");
        let newfile = tempdir.path().join("new");

        std::fs::write(&oldfile, normalize_newlines(original))?;
        let diff = normalize_newlines(diff);

        let mut child = Command::new("patch")
            .arg("-o")
            .arg(&newfile)
            .arg(&oldfile)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        child.stdin.take().expect("patch stdin is piped").write_all(&diff)?;
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let basename = Path::new(filename).file_name().and_then(|s| s.to_str()).unwrap_or(filename);
            std::fs::write(tempdir.path().join(format!("{basename}.diff")), &diff)?;

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let temp_dir = tempdir.into_path();

            return Err(DiffCoreError::PatchFailed {
                filename: filename.to_string(),
                temp_dir,
                stdout,
            });
        }

        let patched = std::fs::read(&newfile)?;
        Ok(patched)
    }
}
