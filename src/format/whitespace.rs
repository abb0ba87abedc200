//! Whitespace normalization for tags and text
//!
//! - [`normalize_tag`]: canonical spelling of a single tag
//! - [`collapse_text`]: whitespace handling for literal text
//! - [`collapse_outside_quotes`]: whitespace runs outside string literals become one space

use crate::parser::patterns::{LINE_BREAK_RUN_RE, WHITESPACE_RE};
use crate::parser::{CharFilter, QuoteRule, Token, TokenKind};
use crate::tags::{DialectProfile, Family, Syntax};

const HTML_QUOTES: &[char] = &['"', '\''];

/// Collapse every whitespace run outside string literals to a single space
#[must_use]
pub fn collapse_outside_quotes(text: &str, quotes: &[char], rule: QuoteRule) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut in_space = false;

    for (pos, c) in CharFilter::new(text, 0, quotes, rule) {
        if pos > last {
            // String literal, copied as is
            out.push_str(&text[last..pos]);
            in_space = false;
        }
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
        last = pos + c.len_utf8();
    }
    out.push_str(&text[last..]);
    out
}

/// Collapse literal text
///
/// Outside preserve-whitespace bodies every whitespace run becomes one space.
/// Inside them only runs holding a line break do.
#[must_use]
pub fn collapse_text(text: &str, preserve: bool) -> String {
    if preserve {
        LINE_BREAK_RUN_RE.replace_all(text, " ").into_owned()
    } else {
        WHITESPACE_RE.replace_all(text, " ").into_owned()
    }
}

/// Drop whitespace before the closing `>` of an HTML tag (`<br />` keeps one space)
fn tidy_html_end(tag: &str) -> String {
    let Some(body) = tag.strip_suffix('>') else {
        return tag.to_string();
    };
    match body.strip_suffix('/') {
        Some(inner) if inner.ends_with(char::is_whitespace) => format!("{} />", inner.trim_end()),
        Some(inner) => format!("{inner}/>"),
        None => format!("{}>", body.trim_end()),
    }
}

/// Pad a Curly-family tag: `{%x%}` -> `{% x %}`, keeping `-`/`+` markers
fn pad_curly(raw: &str, quotes: &[char]) -> String {
    if raw.len() < 4 || !raw.is_char_boundary(2) || !raw.is_char_boundary(raw.len() - 2) {
        return raw.to_string();
    }
    let (open, rest) = raw.split_at(2);
    let (inner, close) = rest.split_at(rest.len() - 2);

    let (left, inner) = match inner.strip_prefix(['-', '+']) {
        Some(after) => (&inner[..1], after),
        None => ("", inner),
    };
    let (inner, right) = match inner.strip_suffix(['-', '+']) {
        Some(before) => (before, &inner[inner.len() - 1..]),
        None => (inner, ""),
    };

    let body = collapse_outside_quotes(inner, quotes, QuoteRule::Anywhere);
    let body = body.trim();
    if body.is_empty() {
        format!("{open}{left} {right}{close}")
    } else {
        format!("{open}{left} {body} {right}{close}")
    }
}

/// Canonical form of a tag token
///
/// Literal text, raw-text runs and comments are returned unchanged.
#[must_use]
pub fn normalize_tag(token: &Token, profile: &DialectProfile) -> String {
    match token.kind {
        TokenKind::Literal | TokenKind::RawTextRun | TokenKind::TagComment => token.raw_text.clone(),
        _ if token.syntax == Syntax::Html => {
            let collapsed = collapse_outside_quotes(&token.raw_text, HTML_QUOTES, QuoteRule::AfterEquals);
            tidy_html_end(&collapsed)
        }
        _ if profile.family == Family::Curly && profile.pad_delimiters => {
            pad_curly(&token.raw_text, profile.quotes)
        }
        _ => collapse_outside_quotes(&token.raw_text, profile.quotes, QuoteRule::Anywhere),
    }
}
