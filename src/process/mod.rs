//! Reformatting entry points.
//!
//! The main entry point is [`reformat`], which takes one source text, a dialect
//! profile and a config and returns the formatted text, whether it changed and
//! the structural warnings found on the way. [`format_source`] additionally
//! resolves the dialect from the config or the file extension.

pub mod change;
pub mod pipeline;

pub use change::detect;
pub use pipeline::{effective_config, format_source, reformat, resolve_dialect, FormatResult};
