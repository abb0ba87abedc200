/// Tag classification types shared by every dialect table
use std::fmt;

/// How a tag participates in nesting and layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// No body and no closer (`<br>`, `{% include %}`)
    Void,
    /// Requires a matching closer and indents its body
    Block,
    /// May hold content but never forces indentation (`<span>`, unknown tags)
    InlineContainer,
    /// Body is copied verbatim (`<script>`, `{% comment %}`, comments)
    RawPreserving,
    /// Paired ignore directive that flips the tracker state
    Toggle,
    /// Intermediate clause of a block (`else`, `elif`, `empty`)
    Branch,
}

impl Classification {
    /// Whether this tag has to start its own line when its parent is exploded
    #[must_use]
    pub fn is_standalone(self) -> bool {
        matches!(
            self,
            Classification::Void | Classification::Block | Classification::Branch
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Void => "void",
            Classification::Block => "block",
            Classification::InlineContainer => "inline",
            Classification::RawPreserving => "raw",
            Classification::Toggle => "toggle",
            Classification::Branch => "branch",
        };
        write!(f, "{name}")
    }
}

/// Which markup layer a tag belongs to
///
/// An HTML `<block>` element and a `{% block %}` statement never close each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Html,
    Template,
}

/// Line layout policy for block tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Kept on one line when it fits and holds no structural children
    #[default]
    Auto,
    /// Always exploded into opener / body / closer lines
    Expanded,
}
