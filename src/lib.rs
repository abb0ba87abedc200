//! tagfmt - Structural reformatter for HTML templates
//!
//! Re-indents and re-flows Django, Jinja, Nunjucks, Handlebars and Go
//! templates while copying ignored and raw regions byte for byte.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod directive;
pub mod error;
pub mod format;
pub mod parser;
pub mod process;
pub mod tags;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{FormatConfig, IgnoreMarkers, LineEnding};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use directive::{find_directive, parse_directive, DirectiveOverrides};
pub use error::Result;
pub use process::{detect, format_source, reformat, FormatResult};
pub use tags::{Classification, Dialect, DialectProfile};
