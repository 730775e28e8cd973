//! C4 — syntax highlighter facade.
//!
//! Ported from `highlight_code_safely`/`highlight_hunk_lines` in
//! `apdiff-viewer/src/diff/mod.rs`, adapted to the line-at-a-time shape this
//! crate already works in (C7 renders one normalized line at a time rather
//! than a whole hunk's raw text). Four gates — highlighting toggle, line
//! count, total bytes, longest line — are evaluated once across both sides
//! of a file's diff; if any one fails, both sides fall back to
//! HTML-escaped plain text, matching the original's own
//! fallback-on-parse-error behavior rather than surfacing an error (spec §7:
//! highlighter failures are swallowed).

use std::sync::OnceLock;

use syntect::highlighting::{
    FontStyle, HighlightIterator, HighlightState, Highlighter, Style as SyntectStyle, ThemeSet,
};
use syntect::parsing::{ParseState, ScopeStack, SyntaxSet};

use crate::config::{Config, STYLED_MAX_BYTES, STYLED_MAX_LINE_LEN};

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static syntect::highlighting::Theme {
    let themes = THEME_SET.get_or_init(ThemeSet::load_defaults);
    &themes.themes["base16-ocean.dark"]
}

fn escape_line(line: &str) -> String {
    html_escape::encode_text(line).into_owned()
}

fn syntect_style_to_css(style: SyntectStyle) -> String {
    let fg = style.foreground;
    let mut style_parts = Vec::new();
    let mut class_parts: Vec<&str> = Vec::new();

    if fg.a > 0 {
        style_parts.push(format!("color:#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        class_parts.push("b");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        class_parts.push("i");
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        class_parts.push("u");
    }

    let mut result = String::new();
    if !class_parts.is_empty() {
        result.push_str(&format!("class=\"{}\"", class_parts.join(" ")));
    }
    if !style_parts.is_empty() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(&format!("style=\"{}\"", style_parts.join(";")));
    }
    result
}

fn render_spans(style_text_pairs: Vec<(SyntectStyle, &str)>, capacity_hint: usize) -> String {
    let mut html = String::with_capacity(capacity_hint);
    let mut last_style = String::new();
    let mut accumulated = String::new();

    let flush = |html: &mut String, accumulated: &mut String, style: &str| {
        if !accumulated.is_empty() {
            if style.is_empty() {
                html.push_str(accumulated);
            } else {
                html.push_str(&format!("<span {style}>{accumulated}</span>"));
            }
            accumulated.clear();
        }
    };

    for (style, text) in style_text_pairs {
        let css = syntect_style_to_css(style);
        if css == last_style {
            accumulated.push_str(&html_escape::encode_text(text));
        } else {
            flush(&mut html, &mut accumulated, &last_style);
            last_style = css;
            accumulated = html_escape::encode_text(text).into_owned();
        }
    }
    flush(&mut html, &mut accumulated, &last_style);
    html
}

fn is_single_line_comment(scope_str: &str) -> bool {
    scope_str.contains("comment.line")
        || scope_str == "comment"
        || (scope_str.starts_with("comment.") && !scope_str.contains("block"))
}

fn is_invalid_scope(scope_stack: &ScopeStack) -> bool {
    use syntect::parsing::SCOPE_REPO;
    let repo = SCOPE_REPO.lock().unwrap();
    scope_stack.scopes.iter().any(|scope| repo.to_string(*scope).starts_with("invalid."))
}

/// Resets parser state between lines when the current line ended inside a
/// single-line comment scope, so a `#` comment doesn't bleed its scope into
/// the following line while multi-line constructs (triple-quoted strings)
/// still persist.
fn should_reset_parser_state(current_scopes: &ScopeStack) -> bool {
    use syntect::parsing::SCOPE_REPO;
    let repo = SCOPE_REPO.lock().unwrap();
    current_scopes.scopes.iter().any(|scope| is_single_line_comment(&repo.to_string(*scope)))
}

/// Highlights one side's `lines` as `filename`'s language, assuming the
/// whole-file gates have already passed. Never falls back mid-file: a parse
/// error on an individual line still escapes just that line (a real syntect
/// failure, not a size gate), since later lines need the parser to keep
/// advancing regardless.
fn highlight_side(lines: &[String], filename: &str) -> Vec<String> {
    let syntax_set = syntax_set();
    let theme = theme();
    let syntax = syntax_set
        .find_syntax_for_file(filename)
        .unwrap_or(None)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut parse_state = ParseState::new(syntax);
    let highlighter = Highlighter::new(theme);
    let mut highlight_state = HighlightState::new(&highlighter, ScopeStack::new());
    let mut results = Vec::with_capacity(lines.len());

    for line in lines {
        let previous_parse_state = parse_state.clone();
        let scope_stack_before = highlight_state.path.clone();

        let ops = match parse_state.parse_line(line, syntax_set) {
            Ok(ops) => ops,
            Err(_) => {
                results.push(escape_line(line));
                continue;
            }
        };

        if is_invalid_scope(&highlight_state.path) {
            results.push(escape_line(line));
            continue;
        }

        let highlight_iter = HighlightIterator::new(&mut highlight_state, &ops[..], line, &highlighter);
        let style_text_pairs: Vec<(SyntectStyle, &str)> = highlight_iter.collect();
        results.push(render_spans(style_text_pairs, line.len() * 2));

        if should_reset_parser_state(&highlight_state.path) {
            parse_state = previous_parse_state;
            highlight_state = HighlightState::new(&highlighter, scope_stack_before);
        }
    }

    results
}

fn escape_all(lines: &[String]) -> Vec<String> {
    lines.iter().map(|l| escape_line(l)).collect()
}

/// Highlights both sides of one file's diff as `filename`'s language, one
/// line of HTML per input line per side. All four gates — the
/// `syntax_highlighting` toggle, `highlighting_threshold` line count,
/// `STYLED_MAX_BYTES` total size, and per-line `STYLED_MAX_LINE_LEN` — are
/// evaluated once, across both sides combined, before either side is
/// highlighted: a file pair that trips any gate on either side falls back
/// to HTML-escaped plain text on *both* sides, never partially.
pub fn highlight_file(old_lines: &[String], new_lines: &[String], filename: &str, config: &Config) -> (Vec<String>, Vec<String>) {
    if !config.syntax_highlighting {
        return (escape_all(old_lines), escape_all(new_lines));
    }

    if let Some(threshold) = config.highlighting_threshold {
        if old_lines.len() > threshold || new_lines.len() > threshold {
            return (escape_all(old_lines), escape_all(new_lines));
        }
    }

    let total_bytes: usize =
        old_lines.iter().map(|l| l.len()).sum::<usize>() + new_lines.iter().map(|l| l.len()).sum::<usize>();
    if total_bytes > STYLED_MAX_BYTES {
        return (escape_all(old_lines), escape_all(new_lines));
    }

    let max_line_len = old_lines
        .iter()
        .chain(new_lines.iter())
        .map(|l| l.len())
        .max()
        .unwrap_or(0);
    if max_line_len > STYLED_MAX_LINE_LEN {
        return (escape_all(old_lines), escape_all(new_lines));
    }

    (highlight_side(old_lines, filename), highlight_side(new_lines, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_highlighting_falls_back_to_escaped_text() {
        let mut config = Config::default();
        config.syntax_highlighting = false;
        let lines = vec!["<script>".to_string()];
        let (old, new) = highlight_file(&lines, &lines, "file.py", &config);
        assert_eq!(old, vec!["&lt;script&gt;".to_string()]);
        assert_eq!(new, vec!["&lt;script&gt;".to_string()]);
    }

    #[test]
    fn line_count_over_threshold_on_either_side_falls_back_for_both() {
        let mut config = Config::default();
        config.highlighting_threshold = Some(1);
        let small = vec!["<x>".to_string()];
        let big = vec!["<x>".to_string(), "<y>".to_string()];

        // Only the new side crosses the threshold; both sides still fall
        // back to plain escaped text, since the gate is evaluated against
        // the pair as a whole rather than per side.
        let (old, new) = highlight_file(&small, &big, "file.py", &config);
        assert_eq!(old, vec!["&lt;x&gt;".to_string()]);
        assert_eq!(new, vec!["&lt;x&gt;".to_string(), "&lt;y&gt;".to_string()]);
    }

    #[test]
    fn oversized_line_on_either_side_disables_highlighting_for_the_whole_file() {
        let config = Config::default();
        let huge = "x".repeat(STYLED_MAX_LINE_LEN + 1);
        let old_lines = vec!["<a>".to_string(), "<b>".to_string()];
        let new_lines = vec!["<a>".to_string(), huge.clone()];

        let (old, new) = highlight_file(&old_lines, &new_lines, "file.py", &config);

        // Escaped plain text everywhere, including the short, otherwise
        // highlightable lines on both sides — no span markup leaks through.
        assert_eq!(old, vec!["&lt;a&gt;".to_string(), "&lt;b&gt;".to_string()]);
        assert_eq!(new, vec!["&lt;a&gt;".to_string(), huge]);
    }

    #[test]
    fn small_python_snippet_is_highlighted_without_panicking() {
        let config = Config::default();
        let old_lines = vec!["def foo():".to_string(), "    return 1".to_string()];
        let new_lines = vec!["def foo():".to_string(), "    return 2".to_string()];
        let (old, new) = highlight_file(&old_lines, &new_lines, "file.py", &config);
        assert_eq!(old.len(), 2);
        assert_eq!(new.len(), 2);
    }
}
