//! C5 — header scanner.
//!
//! Ported from `HEADER_REGEXES`/`HEADER_REGEX_ALIASES` and
//! `register_interesting_lines_for_filename`/`get_interesting_headers` in
//! `diffviewer/diffutils.py`. Watches each side of a diff for lines that
//! look like a function/class/method header, so collapsed chunks can still
//! show "you're inside `fn parse_request`" context.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::line_diff::LineDiffer;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static header regex must compile")
}

static HEADER_REGEXES: Lazy<HashMap<&'static str, Vec<Regex>>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, Vec<Regex>> = HashMap::new();

    m.insert(
        "cs",
        vec![
            re(r"^\s*((public|private|protected|static)\s+)+([a-zA-Z_][a-zA-Z0-9_.\[\]]*\s+)+?[a-zA-Z_][a-zA-Z0-9_]*\s*\("),
            re(r"^\s*((public|static|private|protected|internal|abstract|partial)\s+)*(class|struct)\s+([A-Za-z0-9_])+"),
        ],
    );

    // Matches C/C++/Objective-C header files too, via HEADER_REGEX_ALIASES.
    m.insert("c", vec![re(r"^@(interface|implementation|class|protocol)"), re(r"^[A-Za-z0-9$_]")]);

    m.insert(
        "java",
        vec![
            re(r"^\s*((public|private|protected|static)\s+)+([a-zA-Z_][a-zA-Z0-9_.\[\]]*\s+)+?[a-zA-Z_][a-zA-Z0-9_]*\s*\("),
            re(r"^\s*((public|static|private|protected)\s+)*(class|struct)\s+([A-Za-z0-9_])+"),
        ],
    );

    m.insert("js", vec![re(r"^\s*function [A-Za-z0-9_]+\s*\("), re(r"^\s*(var\s+)?[A-Za-z0-9_]+\s*[=:]\s*function\s*\(")]);

    m.insert(
        "m",
        vec![
            re(r"^@(interface|implementation|class|protocol)"),
            re(r"^[-+]\s+\([^)]+\)\s+[A-Za-z0-9_]+[^;]*$"),
            re(r"^[A-Za-z0-9$_]"),
        ],
    );

    m.insert("php", vec![re(r"^\s*(class|function) [A-Za-z0-9_]+")]);
    m.insert("pl", vec![re(r"^\s*sub [A-Za-z0-9_]+")]);
    m.insert("py", vec![re(r"^\s*(def|class) [A-Za-z0-9_]+\s*\(?")]);
    m.insert("rb", vec![re(r"^\s*(def|class) [A-Za-z0-9_]+\s*\(?")]);

    m
});

/// Maps either a filename suffix ("SConstruct") or an extension ("cc") to
/// the canonical key into [`HEADER_REGEXES`].
static HEADER_REGEX_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("cc", "c"),
        ("cpp", "c"),
        ("cxx", "c"),
        ("c++", "c"),
        ("h", "c"),
        ("hh", "c"),
        ("hpp", "c"),
        ("hxx", "c"),
        ("h++", "c"),
        ("mm", "m"),
        ("pm", "pl"),
        ("SConstruct", "py"),
        ("SConscript", "py"),
        ("pyw", "py"),
        ("sc", "py"),
        ("Rakefile", "rb"),
        ("rbw", "rb"),
        ("rake", "rb"),
        ("gemspec", "rb"),
        ("rbx", "rb"),
    ])
});

/// Returns the header-watch regexes applicable to `filename`, or an empty
/// list if the extension isn't recognized.
fn regexes_for_filename(filename: &str) -> Vec<Regex> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    if let Some(key) = HEADER_REGEX_ALIASES.get(basename) {
        return HEADER_REGEXES.get(key).cloned().unwrap_or_default();
    }

    let ext = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if let Some(regexes) = HEADER_REGEXES.get(ext) {
        return regexes.clone();
    }

    if let Some(key) = HEADER_REGEX_ALIASES.get(ext) {
        return HEADER_REGEXES.get(key).cloned().unwrap_or_default();
    }

    Vec::new()
}

/// Registers the header-watch regexes for `filename` against `differ`, under
/// the watch name `"header"`.
pub fn register_interesting_lines_for_filename(differ: &mut LineDiffer, filename: &str) {
    for regex in regexes_for_filename(filename) {
        differ.add_interesting_line_regex("header", regex);
    }
}

/// A header line found while scanning a diff: 1-based line number and the
/// (untrimmed) line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub line: usize,
    pub text: String,
}

/// Tracks where each side's scan last left off, so successive chunk windows
/// (processed in increasing line-number order) don't rescan from the start
/// every time.
#[derive(Debug, Default)]
pub struct HeaderScanner {
    last_index: [usize; 2],
}

impl HeaderScanner {
    pub fn new() -> Self {
        HeaderScanner { last_index: [0, 0] }
    }

    /// Returns the headers whose 1-based line number falls in
    /// `[start_linenum, end_linenum]` on the requested side.
    pub fn interesting_headers(
        &mut self,
        differ: &mut LineDiffer,
        start_linenum: usize,
        end_linenum: usize,
        new_side: bool,
    ) -> Vec<Header> {
        let possible = differ.get_interesting_lines("header", new_side);
        if possible.is_empty() {
            return Vec::new();
        }

        let side = if new_side { 1 } else { 0 };
        let mut last_index = self.last_index[side];
        let mut found = Vec::new();

        for (i, (idx0, text)) in possible.iter().enumerate().skip(last_index) {
            let linenum = idx0 + 1;
            if linenum > end_linenum {
                break;
            } else if linenum >= start_linenum {
                last_index = i;
                found.push(Header { line: linenum, text: text.clone() });
            }
        }

        self.last_index[side] = last_index;
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_extension_matches_def_and_class() {
        let regexes = regexes_for_filename("models.py");
        assert_eq!(regexes.len(), 1);
        assert!(regexes[0].is_match("def handle_request(self):"));
        assert!(regexes[0].is_match("class Foo:"));
        assert!(!regexes[0].is_match("x = 1"));
    }

    #[test]
    fn header_extension_aliases_to_c() {
        let py = regexes_for_filename("widget.py");
        let h = regexes_for_filename("widget.h");
        let cpp = regexes_for_filename("widget.cpp");
        assert_ne!(py.len(), h.len());
        assert_eq!(h.len(), cpp.len());
    }

    #[test]
    fn filename_alias_without_extension_resolves() {
        let regexes = regexes_for_filename("SConstruct");
        assert_eq!(regexes.len(), 1);
        assert!(regexes[0].is_match("def build():"));
    }

    #[test]
    fn unknown_extension_has_no_regexes() {
        assert!(regexes_for_filename("README.md").is_empty());
    }

    #[test]
    fn scanner_only_returns_headers_within_window_and_advances() {
        let a = vec![
            "def one():".to_string(),
            "    pass".to_string(),
            "def two():".to_string(),
            "    pass".to_string(),
            "def three():".to_string(),
        ];
        let b: Vec<String> = Vec::new();
        let mut differ = LineDiffer::new(&a, &b);
        register_interesting_lines_for_filename(&mut differ, "mod.py");

        let mut scanner = HeaderScanner::new();
        let first = scanner.interesting_headers(&mut differ, 1, 2, false);
        assert_eq!(first, vec![Header { line: 1, text: "def one():".to_string() }]);

        let second = scanner.interesting_headers(&mut differ, 3, 5, false);
        assert_eq!(
            second,
            vec![
                Header { line: 3, text: "def two():".to_string() },
                Header { line: 5, text: "def three():".to_string() },
            ]
        );
    }
}
