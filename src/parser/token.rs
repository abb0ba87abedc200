/// Token types produced by the tokenizer
use crate::tags::Syntax;

/// Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Plain text between tags
    Literal,
    /// `<div>`, `{% if %}`, `{{#each}}`
    TagOpen,
    /// `</div>`, `{% endif %}`, `{{/each}}`, `{{ end }}`
    TagClose,
    /// `<br/>`, `<!doctype html>`, `{{> partial}}`
    TagSelfClosing,
    /// `<!-- -->`, `{# #}`, `{{!-- --}}`, `{{/* */}}`
    TagComment,
    /// `{{ value }}`
    ExpressionOutput,
    /// Body of `<script>`, `<style>` or `<textarea>`
    RawTextRun,
}

/// Byte range of a token in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One lexical unit of a template source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text, concatenating all tokens yields the input
    pub raw_text: String,
    /// Lowercased tag name, `None` for text, expressions and nameless closers
    pub tag_name: Option<String>,
    pub span: Span,
    /// 1-based line of the first byte
    pub line: usize,
    pub syntax: Syntax,
}

impl Token {
    /// Number of line breaks inside the token
    #[must_use]
    pub fn newlines(&self) -> usize {
        self.raw_text.matches('\n').count()
    }
}
