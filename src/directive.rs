//! In-file directives carried by template comments
//!
//! Two kinds of directives are recognized:
//! - ignore markers (`{# tagfmt:off #}` ... `{# tagfmt:on #}`) that protect a span
//! - a settings directive overriding config for one file:
//!   `{# tagfmt: --indent 2 --max-line-length 100 #}`

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{FormatConfig, IgnoreMarkers};

/// Pattern to match a settings directive inside any supported comment form
static SETTINGS_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:<!--|\{#|\{\{!--|\{\{!|\{\{/\*)\s*tagfmt:\s+(.*?)\s*(?:-->|#\}|--\}\}|\*/\}\}|\}\})")
        .unwrap_or_else(|e| panic!("Invalid settings directive pattern: {e}"))
});

/// Which way an ignore marker flips the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Start of a protected span
    IgnoreOn,
    /// End of a protected span
    IgnoreOff,
}

/// Byte offset of `marker` in `text` where it stands as a whole word
fn marker_position(text: &str, marker: &str) -> Option<usize> {
    if marker.is_empty() {
        return None;
    }
    text.match_indices(marker).map(|(pos, _)| pos).find(|&pos| {
        text[pos + marker.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '-'))
    })
}

/// Find an ignore marker in a comment's text
///
/// When both markers occur the longer one wins, so one marker being a prefix
/// of the other does not cause a false match.
#[must_use]
pub fn find_marker(comment: &str, markers: &IgnoreMarkers) -> Option<DirectiveKind> {
    let on = marker_position(comment, &markers.on).map(|_| markers.on.len());
    let off = marker_position(comment, &markers.off).map(|_| markers.off.len());
    match (on, off) {
        (Some(on_len), Some(off_len)) if off_len > on_len => Some(DirectiveKind::IgnoreOff),
        (Some(_), _) => Some(DirectiveKind::IgnoreOn),
        (None, Some(_)) => Some(DirectiveKind::IgnoreOff),
        (None, None) => None,
    }
}

/// Parsed directive options that can override config
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveOverrides {
    pub indent: Option<usize>,
    pub max_line_length: Option<usize>,
    pub preserve_blank_lines: Option<bool>,
}

impl DirectiveOverrides {
    /// Check if any overrides are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indent.is_none() && self.max_line_length.is_none() && self.preserve_blank_lines.is_none()
    }

    /// Copy of `config` with these overrides applied
    #[must_use]
    pub fn apply(&self, config: &FormatConfig) -> FormatConfig {
        let mut merged = config.clone();
        if let Some(indent) = self.indent {
            merged.indent_width = indent;
        }
        if let Some(max) = self.max_line_length {
            merged.max_line_length = max;
        }
        if let Some(preserve) = self.preserve_blank_lines {
            merged.preserve_blank_lines = preserve;
        }
        merged
    }
}

/// Parse the argument part of a settings directive
///
/// # Returns
/// * `Some(DirectiveOverrides)` if at least one known option was given
/// * `None` otherwise
#[must_use]
pub fn parse_directive(args_str: &str) -> Option<DirectiveOverrides> {
    let mut overrides = DirectiveOverrides::default();
    let tokens: Vec<&str> = args_str.split_whitespace().collect();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "-i" | "--indent" => {
                i += 1;
                if i < tokens.len() {
                    overrides.indent = tokens[i].parse().ok();
                }
            }
            "-l" | "--max-line-length" => {
                i += 1;
                if i < tokens.len() {
                    overrides.max_line_length = tokens[i].parse().ok();
                }
            }
            "--preserve-blank-lines" => {
                overrides.preserve_blank_lines = Some(true);
            }
            "--no-preserve-blank-lines" => {
                overrides.preserve_blank_lines = Some(false);
            }
            _ => {
                // Unknown option, skip
            }
        }
        i += 1;
    }

    if overrides.is_empty() {
        None
    } else {
        Some(overrides)
    }
}

/// Scan a source for a settings directive and return the first found
///
/// Only the first directive is used (subsequent ones are ignored).
#[must_use]
pub fn find_directive(source: &str) -> Option<DirectiveOverrides> {
    let caps = SETTINGS_DIRECTIVE_RE.captures(source)?;
    parse_directive(caps.get(1)?.as_str())
}
