//! Configuration record the core accepts from the host (spec §3).

use glob::Pattern;
use serde::Deserialize;

/// Default fallback encoding list, matching Review Board's historical default.
pub const DEFAULT_ENCODING: &str = "iso-8859-15";

pub const STYLED_MAX_LINE_LEN: usize = 1000;
pub const STYLED_MAX_BYTES: usize = 200_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global syntax-highlighting toggle.
    pub syntax_highlighting: bool,

    /// Disable highlighting if either side exceeds this many lines.
    pub highlighting_threshold: Option<usize>,

    /// Filenames matching any of these globs are diffed with whitespace
    /// significance (i.e. `ignore_space` is forced off for them).
    pub include_space_patterns: Vec<String>,

    /// Context kept around a collapsed equal-run.
    pub context_num_lines: usize,

    /// Comma-separated fallback encodings tried after strict UTF-8.
    pub encoding: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            syntax_highlighting: true,
            highlighting_threshold: None,
            include_space_patterns: Vec::new(),
            context_num_lines: 3,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl Config {
    /// `collapse_threshold = 2 * context_num_lines + 3` (spec §3/§8).
    pub fn collapse_threshold(&self) -> usize {
        2 * self.context_num_lines + 3
    }

    /// Comma-separated fallback encoding list, in order.
    pub fn encoding_list(&self) -> Vec<&str> {
        self.encoding.split(',').map(str::trim).collect()
    }

    /// Whether whitespace should be treated as significant for `filename`,
    /// i.e. whether `ignore_space` must be forced off for it.
    pub fn is_space_significant(&self, filename: &str) -> bool {
        self.include_space_patterns.iter().any(|pattern| {
            Pattern::new(pattern)
                .map(|p| p.matches(filename))
                .unwrap_or(false)
        })
    }
}
