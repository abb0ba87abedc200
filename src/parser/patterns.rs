/// Regex patterns for tag names and whitespace
///
/// All patterns are compiled once at first use via `LazyLock`.
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. All patterns in this module are
/// constants exercised by the tests below.
fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .unicode(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

/// HTML element name right after `<` or `</`
pub static HTML_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[A-Za-z][A-Za-z0-9_:.\-]*"));

/// Declaration name right after `<!` (doctype)
pub static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^![A-Za-z]+"));

/// Leading statement keyword inside a template tag
pub static STATEMENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[A-Za-z_][A-Za-z0-9_]*"));

/// Handlebars section name (`#each`, `#> layout`, `#*inline`)
pub static HANDLEBARS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[>*]?\s*([A-Za-z_@][A-Za-z0-9_\-./]*)"));

/// Any run of whitespace
pub static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"\s+"));

/// One or more blank lines between two pieces of text
pub static BLANK_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"\n(?:[ \t\r]*\n)+"));

/// Whitespace run that contains a line break
pub static LINE_BREAK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"[ \t\r]*\n\s*"));
