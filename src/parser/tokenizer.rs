//! Forward-only tokenizer for HTML mixed with template tags.
//!
//! The [`Tokenizer`] walks the source once with a byte cursor and a line
//! counter, yielding [`Token`]s in source order. Tokenization is lossless:
//! concatenating every `raw_text` gives back the input. Anything that does not
//! form a complete tag is emitted as [`TokenKind::Literal`].

use std::cell::RefCell;
use std::collections::HashMap;

use crate::tags::{is_raw_text_element, Classification, Family, Syntax, TagTable};

use super::char_filter::{find_close, CharFilter, QuoteRule};
use super::patterns::{DECLARATION_RE, HANDLEBARS_NAME_RE, HTML_NAME_RE, STATEMENT_NAME_RE};
use super::token::{Span, Token, TokenKind};

const HTML_QUOTES: &[char] = &['"', '\''];

/// A token recognized at a position, before it is emitted
#[derive(Debug)]
struct Scanned {
    kind: TokenKind,
    end: usize,
    tag_name: Option<String>,
    syntax: Syntax,
}

impl Scanned {
    fn html(kind: TokenKind, end: usize, tag_name: Option<String>) -> Self {
        Self {
            kind,
            end,
            tag_name,
            syntax: Syntax::Html,
        }
    }

    fn template(kind: TokenKind, end: usize, tag_name: Option<String>) -> Self {
        Self {
            kind,
            end,
            tag_name,
            syntax: Syntax::Template,
        }
    }
}

/// Strip one whitespace-control marker from each end, then surrounding whitespace
fn trim_markers<'s>(inner: &'s str, markers: &[char]) -> &'s str {
    let inner = inner.strip_prefix(markers).unwrap_or(inner);
    let inner = inner.strip_suffix(markers).unwrap_or(inner);
    inner.trim()
}

fn lowercase_match(m: Option<regex::Match<'_>>) -> Option<String> {
    m.map(|m| m.as_str().to_ascii_lowercase())
}

/// Iterator over the tokens of a template source
pub struct Tokenizer<'a> {
    text: &'a str,
    table: &'a TagTable,
    pos: usize,
    line: usize,
    /// Raw-text element whose body comes next
    raw_until: Option<String>,
    /// Tag found while scanning the preceding literal
    lookahead: Option<(usize, Scanned)>,
    /// Start of the last occurrence of each closing delimiter, `None` when absent
    last_close: RefCell<HashMap<&'static str, Option<usize>>>,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(text: &'a str, table: &'a TagTable) -> Self {
        Self {
            text,
            table,
            pos: 0,
            line: 1,
            raw_until: None,
            lookahead: None,
            last_close: RefCell::new(HashMap::new()),
        }
    }

    /// Whether `close` occurs anywhere at or after `from`
    ///
    /// Each delimiter is located once from the end of the text, so a tag that
    /// can never be terminated is rejected without scanning forward.
    fn closes_after(&self, from: usize, close: &'static str) -> bool {
        let last = *self
            .last_close
            .borrow_mut()
            .entry(close)
            .or_insert_with(|| self.text.rfind(close));
        last.is_some_and(|last| last >= from)
    }

    /// Start of the first raw `close` at or after `from`
    fn find_raw(&self, from: usize, close: &'static str) -> Option<usize> {
        if !self.closes_after(from, close) {
            return None;
        }
        self.text[from..].find(close).map(|offset| from + offset)
    }

    /// End of `close` searched from `from`, or end of text when missing
    fn find_or_eof(&self, from: usize, close: &'static str) -> usize {
        self.find_raw(from, close)
            .map_or(self.text.len(), |at| at + close.len())
    }

    /// First `close` outside string literals at or after `from`
    fn find_closer(&self, from: usize, close: &'static str) -> Option<usize> {
        if !self.closes_after(from, close) {
            return None;
        }
        find_close(self.text, from, close, self.table.profile().quotes)
    }

    fn emit(&mut self, scanned: Scanned) -> Token {
        let start = self.pos;
        let raw = &self.text[start..scanned.end];
        let token = Token {
            kind: scanned.kind,
            raw_text: raw.to_string(),
            tag_name: scanned.tag_name,
            span: Span::new(start, scanned.end),
            line: self.line,
            syntax: scanned.syntax,
        };
        self.line += token.newlines();
        self.pos = scanned.end;

        if token.kind == TokenKind::TagOpen && token.syntax == Syntax::Html {
            if let Some(name) = token.tag_name.as_deref() {
                if is_raw_text_element(name) {
                    self.raw_until = Some(name.to_string());
                }
            }
        }
        token
    }

    /// Body of a raw-text element, up to its closer or EOF
    fn scan_raw_text(&self, name: &str) -> Option<Scanned> {
        let rest = &self.text[self.pos..];
        let mut end = self.text.len();
        for (offset, _) in rest.match_indices("</") {
            let candidate = &rest[offset + 2..];
            let closes = candidate
                .get(..name.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(name))
                && candidate[name.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            if closes {
                end = self.pos + offset;
                break;
            }
        }
        (end > self.pos).then(|| Scanned::html(TokenKind::RawTextRun, end, None))
    }

    fn scan_at(&self, at: usize) -> Option<Scanned> {
        let rest = &self.text[at..];
        if rest.starts_with('<') {
            return self.scan_html(at);
        }
        if rest.starts_with('{') {
            return match self.table.family() {
                Family::Markup => None,
                Family::Curly => self.scan_curly(at),
                Family::Handlebars => self.scan_handlebars(at),
                Family::Go => self.scan_go(at),
            };
        }
        None
    }

    /// End of the literal starting at the cursor; caches the tag that stops it
    fn scan_literal_end(&mut self) -> usize {
        let rest = &self.text[self.pos..];
        for (offset, c) in rest.char_indices().skip(1) {
            if c == '<' || c == '{' {
                let at = self.pos + offset;
                if let Some(scanned) = self.scan_at(at) {
                    self.lookahead = Some((at, scanned));
                    return at;
                }
            }
        }
        self.text.len()
    }

    // ---- HTML ----

    fn scan_html(&self, at: usize) -> Option<Scanned> {
        let text = self.text;
        let rest = &text[at..];

        if rest.starts_with("<!--") {
            let end = self.find_or_eof(at + 4, "-->");
            return Some(Scanned::html(TokenKind::TagComment, end, None));
        }
        if rest.starts_with("<![CDATA[") {
            let end = self.find_or_eof(at + 9, "]]>");
            return Some(Scanned::html(TokenKind::TagComment, end, None));
        }
        if let Some(body) = rest.strip_prefix("<?") {
            let end = self
                .find_raw(at + 2, "?>")
                .map(|i| i + 2)
                .or_else(|| self.find_raw(at + 2, ">").map(|i| i + 1))?;
            let name = lowercase_match(STATEMENT_NAME_RE.find(body)).map(|n| format!("?{n}"));
            return Some(Scanned::html(TokenKind::TagSelfClosing, end, name));
        }
        if let Some(body) = rest.strip_prefix("</") {
            let name = HTML_NAME_RE.find(body)?;
            let end = self.find_tag_end(at + 2 + name.end())?;
            return Some(Scanned::html(
                TokenKind::TagClose,
                end,
                Some(name.as_str().to_ascii_lowercase()),
            ));
        }
        if rest.starts_with("<!") {
            let name = DECLARATION_RE.find(&rest[1..])?;
            let end = self.find_tag_end(at + 1 + name.end())?;
            return Some(Scanned::html(
                TokenKind::TagSelfClosing,
                end,
                Some(name.as_str().to_ascii_lowercase()),
            ));
        }

        let name = HTML_NAME_RE.find(&rest[1..])?;
        let end = self.find_tag_end(at + 1 + name.end())?;
        let kind = if text[..end].ends_with("/>") {
            TokenKind::TagSelfClosing
        } else {
            TokenKind::TagOpen
        };
        Some(Scanned::html(
            kind,
            end,
            Some(name.as_str().to_ascii_lowercase()),
        ))
    }

    /// Position just past the `>` ending an HTML tag
    ///
    /// Quoted attribute values and embedded template tags are skipped whole.
    /// A new tag starting before the `>` means this one is malformed.
    fn find_tag_end(&self, from: usize) -> Option<usize> {
        if !self.closes_after(from, ">") {
            return None;
        }
        let text = self.text;
        let mut filter = CharFilter::new(text, from, HTML_QUOTES, QuoteRule::AfterEquals);
        while let Some((pos, c)) = filter.next() {
            match c {
                '>' => return Some(pos + 1),
                '<' if text[pos + 1..]
                    .chars()
                    .next()
                    .is_some_and(|n| n.is_ascii_alphabetic() || n == '/' || n == '!') =>
                {
                    return None;
                }
                '{' if self.table.family() != Family::Markup => {
                    if let Some(span) = self.scan_at(pos) {
                        filter.skip_to(span.end);
                    }
                }
                _ => {}
            }
        }
        None
    }

    // ---- Django / Jinja / Nunjucks ----

    fn scan_curly(&self, at: usize) -> Option<Scanned> {
        let text = self.text;
        let rest = &text[at..];

        if rest.starts_with("{#") {
            let end = self.find_or_eof(at + 2, "#}");
            return Some(Scanned::template(TokenKind::TagComment, end, None));
        }
        if rest.starts_with("{%") {
            let close = self.find_closer(at + 2, "%}")?;
            let inner = trim_markers(&text[at + 2..close], &['-', '+']);
            let (kind, name) = self.curly_statement(inner);
            return Some(Scanned::template(kind, close + 2, name));
        }
        if rest.starts_with("{{") {
            let close = self.find_closer(at + 2, "}}")?;
            return Some(Scanned::template(
                TokenKind::ExpressionOutput,
                close + 2,
                None,
            ));
        }
        None
    }

    fn curly_statement(&self, inner: &str) -> (TokenKind, Option<String>) {
        let Some(name) = lowercase_match(STATEMENT_NAME_RE.find(inner)) else {
            return (TokenKind::TagOpen, None);
        };
        if let Some(base) = name.strip_prefix("end") {
            let target = self.table.closer_target(Syntax::Template, base);
            if !target.is_empty() && self.table.is_closable(Syntax::Template, &target) {
                return (TokenKind::TagClose, Some(target));
            }
        }
        (TokenKind::TagOpen, Some(name))
    }

    // ---- Handlebars ----

    fn scan_handlebars(&self, at: usize) -> Option<Scanned> {
        let text = self.text;
        let rest = &text[at..];
        let section_name = |s: &str| {
            HANDLEBARS_NAME_RE
                .captures(s)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_ascii_lowercase())
        };

        if rest.starts_with("{{{{") {
            let close = self.find_raw(at + 4, "}}}}")?;
            let inner = text[at + 4..close].trim();
            let end = close + 4;
            return Some(match inner.strip_prefix('/') {
                Some(name) => Scanned::template(TokenKind::TagClose, end, section_name(name.trim())),
                None => Scanned::template(TokenKind::TagOpen, end, section_name(inner)),
            });
        }
        if rest.starts_with("{{!--") {
            let end = self.find_or_eof(at + 5, "--}}");
            return Some(Scanned::template(TokenKind::TagComment, end, None));
        }
        if rest.starts_with("{{!") {
            let end = self.find_or_eof(at + 3, "}}");
            return Some(Scanned::template(TokenKind::TagComment, end, None));
        }
        if rest.starts_with("{{{") {
            let close = self.find_closer(at + 3, "}}}")?;
            return Some(Scanned::template(
                TokenKind::ExpressionOutput,
                close + 3,
                None,
            ));
        }
        if !rest.starts_with("{{") {
            return None;
        }

        let close = self.find_closer(at + 2, "}}")?;
        let end = close + 2;
        let inner = trim_markers(&text[at + 2..close], &['~']);
        let mut chars = inner.chars();
        let scanned = match chars.next() {
            Some('#') => Scanned::template(TokenKind::TagOpen, end, section_name(chars.as_str().trim_start())),
            Some('^') => {
                let body = chars.as_str().trim();
                let name = if body.is_empty() {
                    Some("else".to_string())
                } else {
                    section_name(body)
                };
                Scanned::template(TokenKind::TagOpen, end, name)
            }
            Some('/') => Scanned::template(TokenKind::TagClose, end, section_name(chars.as_str().trim_start())),
            Some('>') => Scanned::template(TokenKind::TagSelfClosing, end, section_name(chars.as_str().trim_start())),
            _ => match lowercase_match(STATEMENT_NAME_RE.find(inner)) {
                Some(word) if word == "else" => Scanned::template(TokenKind::TagOpen, end, Some(word)),
                _ => Scanned::template(TokenKind::ExpressionOutput, end, None),
            },
        };
        Some(scanned)
    }

    // ---- Go templates ----

    fn scan_go(&self, at: usize) -> Option<Scanned> {
        let text = self.text;
        if !text[at..].starts_with("{{") {
            return None;
        }
        let body_start = at + 2;
        let body = &text[body_start..];
        let unmarked = match body.strip_prefix('-') {
            Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
            _ => body,
        };
        if unmarked.starts_with("/*") {
            let comment_start = text.len() - unmarked.len();
            let end = self
                .find_raw(comment_start, "*/")
                .map_or(text.len(), |i| self.find_or_eof(i + 2, "}}"));
            return Some(Scanned::template(TokenKind::TagComment, end, None));
        }

        let close = self.find_closer(body_start, "}}")?;
        let end = close + 2;
        let inner = trim_markers(&text[body_start..close], &['-']);
        let scanned = match lowercase_match(STATEMENT_NAME_RE.find(inner)) {
            Some(word) if word == "end" => Scanned::template(TokenKind::TagClose, end, None),
            Some(word)
                if self.table.classify_name(Syntax::Template, &word)
                    != Classification::InlineContainer =>
            {
                Scanned::template(TokenKind::TagOpen, end, Some(word))
            }
            _ => Scanned::template(TokenKind::ExpressionOutput, end, None),
        };
        Some(scanned)
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        if let Some(name) = self.raw_until.take() {
            if let Some(scanned) = self.scan_raw_text(&name) {
                return Some(self.emit(scanned));
            }
        }

        let scanned = match self.lookahead.take() {
            Some((at, scanned)) if at == self.pos => Some(scanned),
            _ => self.scan_at(self.pos),
        };
        if let Some(scanned) = scanned {
            return Some(self.emit(scanned));
        }

        let end = self.scan_literal_end();
        Some(self.emit(Scanned::html(TokenKind::Literal, end, None)))
    }
}

/// Tokenize a whole source text
#[must_use]
pub fn tokenize(text: &str, table: &TagTable) -> Vec<Token> {
    Tokenizer::new(text, table).collect()
}
