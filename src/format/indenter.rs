/// `TagIndenter` - Stack-based indentation tracker
///
/// Uses a stack of open block contexts to assign every token an indent
/// level and a structural role. Openers and their closers share a level;
/// the body sits one level deeper.
use std::collections::HashSet;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::parser::{Token, TokenKind};
use crate::tags::{Classification, Syntax, TagTable};

use super::regions::RegionMap;

/// Deepest level laid out as nested containers; deeper openers render as plain tags
pub const MAX_NESTING: usize = 128;

/// Structural role of a token after indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opener of a container. `close` is its closer when one was found;
    /// its body runs up to `scope_end` (exclusive).
    Open {
        close: Option<usize>,
        scope_end: usize,
    },
    /// Closer matched to an opener
    Close { open: usize },
    /// Intermediate clause owned by the opener at `owner`
    Branch { owner: usize },
    /// Standalone token
    Leaf,
    /// First token of a protected region ending at `end` (inclusive)
    Protected { end: usize },
    /// Token inside a protected region
    Inside,
}

/// Per-token result of indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub level: usize,
    pub role: Role,
    pub class: Classification,
    /// For openers: whether the body keeps literal spacing.
    /// For other tokens: whether the enclosing body does.
    pub preserve_whitespace: bool,
}

/// An open container on the indent stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentContext {
    /// `None` for Go templates, which close every block with `{{ end }}`
    pub tag_name: Option<String>,
    pub syntax: Syntax,
    pub base_indent_level: usize,
    pub preserve_whitespace: bool,
    /// Token index of the opener
    opener: usize,
}

/// `TagIndenter` walks tokens and tracks container nesting
pub struct TagIndenter<'a> {
    table: &'a TagTable,
    /// Stack of open containers
    scope_storage: Vec<IndentContext>,
    /// Tag names whose bodies keep literal spacing
    preserve: HashSet<String>,
    annotations: Vec<Annotation>,
    diagnostics: Vec<Diagnostic>,
}

/// Annotated token stream
#[derive(Debug, Default)]
pub struct Indentation {
    pub annotations: Vec<Annotation>,
    pub diagnostics: Vec<Diagnostic>,
}

fn display_name(token: &Token) -> String {
    token.raw_text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> TagIndenter<'a> {
    /// Create a new `TagIndenter`
    ///
    /// # Arguments
    /// * `table` - Resolved tag table
    /// * `preserve_whitespace` - Tag names whose bodies keep literal spacing
    #[must_use]
    pub fn new(table: &'a TagTable, preserve_whitespace: &[String]) -> Self {
        Self {
            table,
            scope_storage: Vec::new(),
            preserve: preserve_whitespace
                .iter()
                .map(|name| name.to_ascii_lowercase())
                .collect(),
            annotations: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Current nesting depth
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scope_storage.len()
    }

    fn preserving(&self) -> bool {
        self.scope_storage
            .last()
            .is_some_and(|ctx| ctx.preserve_whitespace)
    }

    fn annotate(&mut self, index: usize, level: usize, role: Role, class: Classification) {
        let preserve_whitespace = self.preserving();
        self.annotations[index] = Annotation {
            level,
            role,
            class,
            preserve_whitespace,
        };
    }

    /// Whether an opener pushes a context
    fn opens_container(token: &Token, class: Classification) -> bool {
        if token.kind != TokenKind::TagOpen {
            return false;
        }
        match token.syntax {
            Syntax::Html => matches!(class, Classification::Block | Classification::InlineContainer),
            Syntax::Template => class == Classification::Block,
        }
    }

    fn push(&mut self, index: usize, token: &Token, class: Classification) {
        let level = self.depth();
        if level == MAX_NESTING
            && !self
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::NestingTooDeep)
        {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::NestingTooDeep,
                token.line,
                format!(
                    "`{}` is nested more than {MAX_NESTING} levels deep; deeper tags are not indented",
                    display_name(token)
                ),
            ));
        }
        let own = token
            .tag_name
            .as_deref()
            .is_some_and(|name| self.preserve.contains(name));
        let preserve_whitespace = own || self.preserving();
        self.annotations[index] = Annotation {
            level,
            role: Role::Open {
                close: None,
                scope_end: index + 1,
            },
            class,
            preserve_whitespace,
        };
        self.scope_storage.push(IndentContext {
            tag_name: token.tag_name.clone(),
            syntax: token.syntax,
            base_indent_level: level,
            preserve_whitespace,
            opener: index,
        });
    }

    /// Position on the stack of the context a closer matches
    fn find_match(&self, token: &Token) -> Option<usize> {
        self.scope_storage.iter().rposition(|ctx| {
            ctx.syntax == token.syntax
                && match token.tag_name.as_deref() {
                    Some(name) => ctx.tag_name.as_deref() == Some(name),
                    None => true,
                }
        })
    }

    /// Pop one context, recording where its body stops
    fn pop(&mut self, scope_end: usize, close: Option<usize>) -> Option<IndentContext> {
        let ctx = self.scope_storage.pop()?;
        if let Role::Open {
            close: slot,
            scope_end: end,
        } = &mut self.annotations[ctx.opener].role
        {
            *slot = close;
            *end = scope_end;
        }
        Some(ctx)
    }

    fn close(&mut self, index: usize, token: &Token, tokens: &[Token]) {
        let Some(position) = self.find_match(token) else {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmatchedCloser,
                token.line,
                format!("`{}` has no matching opener", display_name(token)),
            ));
            let level = self.depth();
            self.annotate(index, level, Role::Leaf, Classification::Block);
            return;
        };

        while self.scope_storage.len() > position + 1 {
            if let Some(ctx) = self.pop(index, None) {
                let opener = &tokens[ctx.opener];
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnclosedBlock,
                    opener.line,
                    format!(
                        "`{}` closed implicitly by `{}`",
                        display_name(opener),
                        display_name(token)
                    ),
                ));
            }
        }
        if let Some(ctx) = self.pop(index, Some(index)) {
            let class = self.annotations[ctx.opener].class;
            self.annotate(
                index,
                ctx.base_indent_level,
                Role::Close { open: ctx.opener },
                class,
            );
        }
    }

    fn branch(&mut self, index: usize, class: Classification) {
        match self.scope_storage.last() {
            Some(ctx) if ctx.syntax == Syntax::Template => {
                let (level, owner) = (ctx.base_indent_level, ctx.opener);
                self.annotate(index, level, Role::Branch { owner }, class);
            }
            _ => {
                let level = self.depth();
                self.annotate(index, level, Role::Leaf, class);
            }
        }
    }

    /// Annotate a whole token stream
    #[must_use]
    pub fn process(mut self, tokens: &[Token], regions: &RegionMap) -> Indentation {
        self.annotations = vec![
            Annotation {
                level: 0,
                role: Role::Leaf,
                class: Classification::InlineContainer,
                preserve_whitespace: false,
            };
            tokens.len()
        ];

        let mut index = 0;
        while index < tokens.len() {
            let token = &tokens[index];
            let class = self.table.classify_token(token);

            if let Some(region) = regions.region_starting_at(index) {
                let level = self.depth();
                let end = region.end_token_index;
                self.annotate(index, level, Role::Protected { end }, class);
                for inside in index + 1..=end {
                    let inner_class = self.table.classify_token(&tokens[inside]);
                    self.annotate(inside, level, Role::Inside, inner_class);
                }
                index = end + 1;
                continue;
            }

            if token.kind == TokenKind::TagClose {
                self.close(index, token, tokens);
            } else if class == Classification::Branch && token.kind == TokenKind::TagOpen {
                self.branch(index, class);
            } else if Self::opens_container(token, class) {
                self.push(index, token, class);
            } else {
                let level = self.depth();
                self.annotate(index, level, Role::Leaf, class);
            }
            index += 1;
        }

        while let Some(ctx) = self.pop(tokens.len(), None) {
            let opener = &tokens[ctx.opener];
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnclosedBlock,
                opener.line,
                format!("`{}` is never closed", display_name(opener)),
            ));
        }
        self.diagnostics.sort_by_key(|diagnostic| diagnostic.line);

        Indentation {
            annotations: self.annotations,
            diagnostics: self.diagnostics,
        }
    }
}

/// Assign indent levels and roles to a token stream
#[must_use]
pub fn indent_tokens(
    tokens: &[Token],
    regions: &RegionMap,
    table: &TagTable,
    preserve_whitespace: &[String],
) -> Indentation {
    TagIndenter::new(table, preserve_whitespace).process(tokens, regions)
}
