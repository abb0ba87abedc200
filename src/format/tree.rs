/// Layout tree built from annotated tokens
///
/// Openers become [`Element`]s owning their body; owned branches split the
/// body into [`Segment`]s; protected regions collapse into one
/// [`Node::Verbatim`]. Openers nested deeper than [`MAX_NESTING`] stay
/// plain tokens so building and rendering never recurse past that depth.
use super::indenter::{Annotation, Role, MAX_NESTING};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text, an expression or a standalone tag
    Token(usize),
    /// Protected token range, both ends inclusive
    Verbatim { start: usize, end: usize },
    Element(Element),
}

/// A container and its body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub open: usize,
    pub close: Option<usize>,
    /// Always at least one; every segment after the first starts with a branch token
    pub segments: Vec<Segment>,
}

impl Element {
    /// Whether the body is split by branches
    #[must_use]
    pub fn has_branches(&self) -> bool {
        self.segments.len() > 1
    }

    /// Every direct child node, across segments
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.segments.iter().flat_map(|segment| segment.children.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Branch token heading this segment
    pub branch: Option<usize>,
    pub children: Vec<Node>,
}

fn build_segments(annotations: &[Annotation], from: usize, to: usize, owner: Option<usize>) -> Vec<Segment> {
    let mut segments = vec![Segment::default()];
    let mut index = from;

    while index < to {
        let next = match annotations[index].role {
            Role::Protected { end } => {
                let end = end.min(to - 1);
                push(&mut segments, Node::Verbatim { start: index, end });
                end + 1
            }
            Role::Open { close, scope_end } if annotations[index].level < MAX_NESTING => {
                let body_end = scope_end.min(to);
                let element = Element {
                    open: index,
                    close: close.filter(|&c| c < to),
                    segments: build_segments(annotations, index + 1, body_end, Some(index)),
                };
                let next = match element.close {
                    Some(close) => close + 1,
                    None => body_end,
                };
                push(&mut segments, Node::Element(element));
                next
            }
            Role::Branch { owner: branch_owner } if Some(branch_owner) == owner => {
                segments.push(Segment {
                    branch: Some(index),
                    children: Vec::new(),
                });
                index + 1
            }
            _ => {
                push(&mut segments, Node::Token(index));
                index + 1
            }
        };
        index = next.max(index + 1);
    }
    segments
}

fn push(segments: &mut [Segment], node: Node) {
    if let Some(segment) = segments.last_mut() {
        segment.children.push(node);
    }
}

/// Build the top-level node list
#[must_use]
pub fn build_tree(annotations: &[Annotation]) -> Vec<Node> {
    build_segments(annotations, 0, annotations.len(), None)
        .into_iter()
        .flat_map(|segment| segment.children)
        .collect()
}
