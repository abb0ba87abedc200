/// `RegionTracker` - finds token spans that pass through untouched
///
/// Three things protect a span: an explicit ignore directive pair, a raw tag
/// (`<script>`, `<pre>`, `{% verbatim %}`, ...) up to its matching closer, and
/// any comment token. Regions nest as a stack; closing one never closes another.
use std::fmt;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::directive::{find_marker, DirectiveKind};
use crate::parser::{Token, TokenKind};
use crate::tags::{Classification, Syntax, TagTable};

/// Why a span is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionReason {
    ExplicitDirective,
    CommentTag,
    RawElement,
}

impl fmt::Display for RegionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionReason::ExplicitDirective => "explicit-directive",
            RegionReason::CommentTag => "comment-tag",
            RegionReason::RawElement => "raw-element",
        };
        write!(f, "{name}")
    }
}

/// A protected token range, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreRegion {
    pub start_token_index: usize,
    pub end_token_index: usize,
    pub reason: RegionReason,
}

/// Result of region tracking over a token stream
#[derive(Debug, Default)]
pub struct RegionMap {
    /// Every region, in the order it closed
    pub regions: Vec<IgnoreRegion>,
    pub diagnostics: Vec<Diagnostic>,
    /// Per token: index into `regions` of the outermost region starting there
    outer_start: Vec<Option<usize>>,
    protected: Vec<bool>,
}

impl RegionMap {
    /// Whether the token at `index` lies inside any region
    #[must_use]
    pub fn is_protected(&self, index: usize) -> bool {
        self.protected.get(index).copied().unwrap_or(false)
    }

    /// The outermost region beginning at token `index`
    #[must_use]
    pub fn region_starting_at(&self, index: usize) -> Option<&IgnoreRegion> {
        self.outer_start
            .get(index)
            .copied()
            .flatten()
            .map(|r| &self.regions[r])
    }
}

#[derive(Debug)]
enum OpenRegion {
    Directive {
        start: usize,
    },
    Raw {
        start: usize,
        name: String,
        syntax: Syntax,
        depth: usize,
        reason: RegionReason,
    },
}

impl OpenRegion {
    fn start(&self) -> usize {
        match self {
            OpenRegion::Directive { start } | OpenRegion::Raw { start, .. } => *start,
        }
    }
}

/// Whether a comment token carries its closing delimiter
fn comment_is_terminated(raw: &str) -> bool {
    let closed = |open: &str, close: &str| raw.len() >= open.len() + close.len() && raw.ends_with(close);
    if raw.starts_with("<!--") {
        closed("<!--", "-->")
    } else if raw.starts_with("<![CDATA[") {
        closed("<![CDATA[", "]]>")
    } else if raw.starts_with("{#") {
        closed("{#", "#}")
    } else if raw.starts_with("{{!--") {
        closed("{{!--", "--}}")
    } else if raw.starts_with("{{/*") || raw.starts_with("{{-") {
        raw.contains("*/") && closed("{{/*", "}}")
    } else {
        closed("{{!", "}}")
    }
}

fn describe(token: &Token) -> String {
    let first_line = token.raw_text.lines().next().unwrap_or_default();
    let mut text: String = first_line.chars().take(40).collect();
    if text.len() < first_line.len() {
        text.push_str("...");
    }
    text
}

/// Tracks open regions while walking the token stream
pub struct RegionTracker<'a> {
    table: &'a TagTable,
    stack: Vec<OpenRegion>,
    map: RegionMap,
}

impl<'a> RegionTracker<'a> {
    #[must_use]
    pub fn new(table: &'a TagTable) -> Self {
        Self {
            table,
            stack: Vec::new(),
            map: RegionMap::default(),
        }
    }

    fn close(&mut self, start: usize, end: usize, reason: RegionReason) {
        let index = self.map.regions.len();
        self.map.regions.push(IgnoreRegion {
            start_token_index: start,
            end_token_index: end,
            reason,
        });
        for flag in &mut self.map.protected[start..=end] {
            *flag = true;
        }
        if self.stack.is_empty() {
            self.map.outer_start[start] = Some(index);
        }
    }

    /// Feed one token; returns true when it was swallowed by an open raw region
    fn step_raw(&mut self, index: usize, token: &Token) -> bool {
        let Some(OpenRegion::Raw {
            start,
            name,
            syntax,
            depth,
            reason,
        }) = self.stack.last_mut()
        else {
            return false;
        };
        if token.syntax == *syntax && token.tag_name.as_deref() == Some(name.as_str()) {
            match token.kind {
                TokenKind::TagOpen => *depth += 1,
                TokenKind::TagClose => *depth -= 1,
                _ => {}
            }
        }
        if *depth == 0 {
            let (start, reason) = (*start, *reason);
            self.stack.pop();
            self.close(start, index, reason);
        }
        true
    }

    fn step(&mut self, index: usize, token: &Token) {
        if self.step_raw(index, token) {
            return;
        }
        let in_directive = matches!(self.stack.last(), Some(OpenRegion::Directive { .. }));

        match self.table.classify_token(token) {
            Classification::Toggle => {
                match find_marker(&token.raw_text, self.table.markers()) {
                    Some(DirectiveKind::IgnoreOn) if !in_directive => {
                        self.stack.push(OpenRegion::Directive { start: index });
                    }
                    Some(DirectiveKind::IgnoreOff) if in_directive => {
                        if let Some(OpenRegion::Directive { start }) = self.stack.pop() {
                            self.close(start, index, RegionReason::ExplicitDirective);
                        }
                    }
                    _ if in_directive => {}
                    _ => self.close(index, index, RegionReason::CommentTag),
                }
            }
            Classification::RawPreserving => match token.kind {
                TokenKind::TagComment => {
                    if !comment_is_terminated(&token.raw_text) {
                        self.map.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::UnterminatedRawRegion,
                            token.line,
                            format!("comment `{}` is never closed", describe(token)),
                        ));
                    }
                    self.close(index, index, RegionReason::CommentTag);
                }
                TokenKind::TagOpen => {
                    let name = token.tag_name.clone().unwrap_or_default();
                    let reason = if token.syntax == Syntax::Template && name == "comment" {
                        RegionReason::CommentTag
                    } else {
                        RegionReason::RawElement
                    };
                    self.stack.push(OpenRegion::Raw {
                        start: index,
                        name,
                        syntax: token.syntax,
                        depth: 1,
                        reason,
                    });
                }
                _ => {}
            },
            _ => {}
        }
    }

    /// Track regions over a whole token stream
    #[must_use]
    pub fn track(mut self, tokens: &[Token]) -> RegionMap {
        self.map.protected = vec![false; tokens.len()];
        self.map.outer_start = vec![None; tokens.len()];
        for (index, token) in tokens.iter().enumerate() {
            self.step(index, token);
        }

        let last = tokens.len().saturating_sub(1);
        while let Some(open) = self.stack.pop() {
            let start = open.start();
            let token = &tokens[start];
            let (kind, message, reason) = match &open {
                OpenRegion::Directive { .. } => (
                    DiagnosticKind::UnterminatedIgnoreRegion,
                    format!(
                        "`{}` has no `{}`; protected to end of file",
                        describe(token),
                        self.table.markers().off
                    ),
                    RegionReason::ExplicitDirective,
                ),
                OpenRegion::Raw { reason, .. } => (
                    DiagnosticKind::UnterminatedRawRegion,
                    format!("`{}` is never closed; protected to end of file", describe(token)),
                    *reason,
                ),
            };
            self.map
                .diagnostics
                .push(Diagnostic::new(kind, token.line, message));
            self.close(start, last, reason);
        }
        self.map
            .diagnostics
            .sort_by_key(|diagnostic| diagnostic.line);
        self.map
    }
}

/// Find every protected region in a token stream
#[must_use]
pub fn track_regions(tokens: &[Token], table: &TagTable) -> RegionMap {
    RegionTracker::new(table).track(tokens)
}
