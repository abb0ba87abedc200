//! Template layout engine.
//!
//! This module contains the core formatting logic organized into submodules:
//! - [`regions`]: Finds ignore directives and raw-preserving tags whose content is copied verbatim
//! - [`indenter`]: Assigns indent levels and structural roles from a stack of open blocks
//! - [`tree`]: Groups annotated tokens into elements, branch segments and verbatim runs
//! - [`whitespace`]: Normalizes spacing inside tags and literal text
//! - [`composer`]: Decides single-line vs exploded layout and renders the final lines

pub mod composer;
pub mod indenter;
pub mod regions;
pub mod tree;
pub mod whitespace;

pub use composer::{compose, render_lines, Composer, FormattedLine};
pub use indenter::{indent_tokens, Annotation, IndentContext, Indentation, Role, TagIndenter};
pub use regions::{track_regions, IgnoreRegion, RegionMap, RegionReason, RegionTracker};
pub use tree::{build_tree, Element, Node, Segment};
pub use whitespace::{collapse_outside_quotes, collapse_text, normalize_tag};
