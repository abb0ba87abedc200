//! Line composition: single-line vs exploded rendering
//!
//! The [`Composer`] walks the layout tree bottom-up. A container is kept on one
//! line when its flat form fits `max_line_length` and it holds nothing that must
//! start its own line; otherwise it is exploded into opener, indented body and
//! closer. Protected regions are copied from the source untouched, only their
//! first line is re-indented.

use crate::config::FormatConfig;
use crate::parser::patterns::BLANK_SEPARATOR_RE;
use crate::parser::{Token, TokenKind};
use crate::tags::{Classification, Layout, TagTable};

use super::indenter::Annotation;
use super::tree::{build_tree, Element, Node};
use super::whitespace::{collapse_text, normalize_tag};

/// One output line before indentation is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedLine {
    /// Text indented to `indent_level`
    Text { indent_level: usize, text: String },
    /// Rest of a protected region, starting with its own line break and
    /// appended to the previous line as is
    Raw(String),
    Blank,
}

/// Rendering of one node inside its parent's body
enum Unit {
    /// Joins the surrounding inline run
    Inline(String),
    /// Starts its own line(s)
    Lines(Vec<FormattedLine>),
}

/// Renders annotated tokens into lines
pub struct Composer<'a> {
    source: &'a str,
    tokens: &'a [Token],
    annotations: &'a [Annotation],
    table: &'a TagTable,
    config: &'a FormatConfig,
}

impl<'a> Composer<'a> {
    #[must_use]
    pub fn new(
        source: &'a str,
        tokens: &'a [Token],
        annotations: &'a [Annotation],
        table: &'a TagTable,
        config: &'a FormatConfig,
    ) -> Self {
        Self {
            source,
            tokens,
            annotations,
            table,
            config,
        }
    }

    fn tag_text(&self, index: usize) -> String {
        normalize_tag(&self.tokens[index], self.table.profile())
    }

    fn fits(&self, level: usize, text: &str) -> bool {
        level * self.config.indent_width + text.chars().count() <= self.config.max_line_length
    }

    /// Source text of a protected range; trailing whitespace of a region left open at EOF is dropped
    fn verbatim(&self, start: usize, end: usize) -> &'a str {
        self.source[self.tokens[start].span.start..self.tokens[end].span.end].trim_end()
    }

    fn layout(&self, element: &Element) -> Layout {
        let token = &self.tokens[element.open];
        token
            .tag_name
            .as_deref()
            .map_or(Layout::Auto, |name| self.table.layout(token.syntax, name))
    }

    /// Single-line form of a node, `None` when it cannot sit inside a line
    fn flat(&self, node: &Node, preserve: bool) -> Option<String> {
        match node {
            Node::Token(index) => {
                let token = &self.tokens[*index];
                if token.kind == TokenKind::Literal {
                    return Some(collapse_text(&token.raw_text, preserve));
                }
                if self.annotations[*index].class.is_standalone() {
                    return None;
                }
                let text = self.tag_text(*index);
                (!text.contains('\n')).then_some(text)
            }
            Node::Verbatim { start, end } => {
                let text = self.verbatim(*start, *end);
                (!text.contains('\n')).then(|| text.to_string())
            }
            Node::Element(element) => {
                if self.annotations[element.open].class.is_standalone() {
                    return None;
                }
                self.flat_element(element)
            }
        }
    }

    /// `open + content + close` when the element qualifies for one line, ignoring width
    fn flat_element(&self, element: &Element) -> Option<String> {
        let close = element.close?;
        if element.has_branches() || self.layout(element) == Layout::Expanded {
            return None;
        }
        let preserve = self.annotations[element.open].preserve_whitespace;
        let mut content = String::new();
        for child in element.children() {
            content.push_str(&self.flat(child, preserve)?);
        }
        let open = self.tag_text(element.open);
        let close = self.tag_text(close);
        if open.contains('\n') || close.contains('\n') {
            return None;
        }
        Some(format!("{open}{}{close}", content.trim()))
    }

    fn render_element(&self, element: &Element, level: usize) -> Vec<FormattedLine> {
        if let Some(flat) = self.flat_element(element) {
            if self.fits(level, &flat) {
                return vec![FormattedLine::Text {
                    indent_level: level,
                    text: flat,
                }];
            }
        }

        let preserve = self.annotations[element.open].preserve_whitespace;
        let mut lines = vec![FormattedLine::Text {
            indent_level: level,
            text: self.tag_text(element.open),
        }];
        for segment in &element.segments {
            if let Some(branch) = segment.branch {
                lines.push(FormattedLine::Text {
                    indent_level: level,
                    text: self.tag_text(branch),
                });
            }
            lines.extend(self.compose_children(&segment.children, level + 1, preserve));
        }
        if let Some(close) = element.close {
            lines.push(FormattedLine::Text {
                indent_level: level,
                text: self.tag_text(close),
            });
        }
        lines
    }

    /// Protected range: first line re-indented, the rest copied with its own line breaks
    fn verbatim_lines(&self, start: usize, end: usize, level: usize) -> Vec<FormattedLine> {
        let text = self.verbatim(start, end);
        let first_end = text
            .find('\n')
            .map_or(text.len(), |i| if text[..i].ends_with('\r') { i - 1 } else { i });
        let mut lines = vec![FormattedLine::Text {
            indent_level: level,
            text: text[..first_end].to_string(),
        }];
        if first_end < text.len() {
            lines.push(FormattedLine::Raw(text[first_end..].to_string()));
        }
        lines
    }

    fn unit(&self, node: &Node, level: usize, preserve: bool) -> Unit {
        match node {
            Node::Token(index) => {
                let token = &self.tokens[*index];
                if token.kind == TokenKind::Literal {
                    return Unit::Inline(collapse_text(&token.raw_text, preserve));
                }
                let text = self.tag_text(*index);
                if self.annotations[*index].class.is_standalone() {
                    Unit::Lines(vec![FormattedLine::Text {
                        indent_level: level,
                        text,
                    }])
                } else {
                    Unit::Inline(text)
                }
            }
            Node::Verbatim { start, end } => Unit::Lines(self.verbatim_lines(*start, *end, level)),
            Node::Element(element) => {
                if self.annotations[element.open].class == Classification::InlineContainer {
                    if let Some(flat) = self.flat_element(element) {
                        if self.fits(level, &flat) {
                            return Unit::Inline(flat);
                        }
                    }
                }
                Unit::Lines(self.render_element(element, level))
            }
        }
    }

    /// Lay out a body: inline units share a line, everything else starts its own
    fn compose_children(&self, nodes: &[Node], level: usize, preserve: bool) -> Vec<FormattedLine> {
        let blank_lines_allowed = level == 0 || self.config.preserve_blank_lines;
        let mut lines = Vec::new();
        let mut run = String::new();

        let flush = |run: &mut String, lines: &mut Vec<FormattedLine>| {
            let text = run.trim();
            if !text.is_empty() {
                lines.push(FormattedLine::Text {
                    indent_level: level,
                    text: text.to_string(),
                });
            }
            run.clear();
        };

        for node in nodes {
            if let Node::Token(index) = node {
                let token = &self.tokens[*index];
                if token.kind == TokenKind::Literal && blank_lines_allowed {
                    for (piece_index, piece) in BLANK_SEPARATOR_RE.split(&token.raw_text).enumerate() {
                        if piece_index > 0 {
                            flush(&mut run, &mut lines);
                            lines.push(FormattedLine::Blank);
                        }
                        run.push_str(&collapse_text(piece, preserve));
                    }
                    continue;
                }
            }
            match self.unit(node, level, preserve) {
                Unit::Inline(text) => run.push_str(&text),
                Unit::Lines(unit_lines) => {
                    flush(&mut run, &mut lines);
                    lines.extend(unit_lines);
                }
            }
        }
        flush(&mut run, &mut lines);
        squeeze_blank_lines(lines)
    }

    /// Lay out the whole token stream
    #[must_use]
    pub fn compose(&self) -> Vec<FormattedLine> {
        let nodes = build_tree(self.annotations);
        self.compose_children(&nodes, 0, false)
    }
}

/// At most one blank line in a row, none at either end
fn squeeze_blank_lines(lines: Vec<FormattedLine>) -> Vec<FormattedLine> {
    let mut out: Vec<FormattedLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let is_blank = line == FormattedLine::Blank;
        if is_blank && out.last().map_or(true, |last| *last == FormattedLine::Blank) {
            continue;
        }
        out.push(line);
    }
    if out.last() == Some(&FormattedLine::Blank) {
        out.pop();
    }
    out
}

/// Join lines with indentation and the line terminator
///
/// Non-empty output always ends with exactly one terminator.
#[must_use]
pub fn render_lines(lines: &[FormattedLine], indent_width: usize, terminator: &str) -> String {
    let mut physical: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        match line {
            FormattedLine::Text { indent_level, text } => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    let first = first.trim_end_matches('\r');
                    if first.is_empty() {
                        physical.push(String::new());
                    } else {
                        physical.push(format!("{}{first}", " ".repeat(indent_level * indent_width)));
                    }
                }
                physical.extend(parts.map(|part| part.trim_end_matches('\r').to_string()));
            }
            FormattedLine::Raw(text) => match physical.last_mut() {
                Some(last) => last.push_str(text),
                None => physical.push(text.clone()),
            },
            FormattedLine::Blank => physical.push(String::new()),
        }
    }
    if physical.is_empty() {
        return String::new();
    }
    let mut out = physical.join(terminator);
    out.push_str(terminator);
    out
}

/// Compose annotated tokens into the final text
#[must_use]
pub fn compose(
    source: &str,
    tokens: &[Token],
    annotations: &[Annotation],
    table: &TagTable,
    config: &FormatConfig,
    terminator: &str,
) -> String {
    let lines = Composer::new(source, tokens, annotations, table, config).compose();
    render_lines(&lines, config.indent_width, terminator)
}
