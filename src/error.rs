//! Error types and result aliases for tagfmt.
//!
//! The formatting core is infallible. Config loading, file I/O and the CLI
//! return [`Result<T>`], an alias for `anyhow::Result<T>`.

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;
