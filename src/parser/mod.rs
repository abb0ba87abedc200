//! Template source tokenizing.
//!
//! This module turns raw template text into a flat, lossless token stream:
//! - [`Tokenizer`]: forward-only iterator producing [`Token`]s in source order
//! - [`CharFilter`]: iterator adapter that skips string literals while searching
//!   for closing delimiters
//! - [`patterns`]: precompiled regex patterns for tag names and whitespace
//!
//! Delimiters inside quoted strings never end a tag, tags may span several
//! lines, and anything that does not form a complete tag is kept as literal text.

pub mod char_filter;
pub mod patterns;
pub mod token;
pub mod tokenizer;

pub use char_filter::{find_close, CharFilter, QuoteRule};
pub use token::{Span, Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
