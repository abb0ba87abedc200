//! Tag recognition and classification across template dialects.
//!
//! This module answers "what kind of tag is this?" for every dialect:
//! - [`Dialect`] / [`DialectProfile`]: delimiter conventions of each template family
//! - [`Classification`]: how a tag takes part in nesting (block, void, raw, ...)
//! - [`TagTable`]: the static tables resolved against the active configuration
//!
//! HTML elements share one table across dialects; template statements are looked
//! up in the dialect's own table. Lookups are case-insensitive.

pub mod dialect;
pub mod table;
pub mod types;

pub use dialect::{Delimiters, Dialect, DialectProfile, Family};
pub use table::{classify, classify_html, is_raw_text_element, TagTable};
pub use types::{Classification, Layout, Syntax};
