/// Structural warnings reported alongside formatted output
use std::fmt;

/// Category of a structural anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A closer with no matching opener
    UnmatchedCloser,
    /// An opener closed implicitly or left open at end of input
    UnclosedBlock,
    /// An ignore-on marker with no ignore-off marker
    UnterminatedIgnoreRegion,
    /// A raw tag or comment with no closer
    UnterminatedRawRegion,
    /// Containers nested past the layout depth limit
    NestingTooDeep,
}

impl DiagnosticKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::UnmatchedCloser => "unmatched-closer",
            DiagnosticKind::UnclosedBlock => "unclosed-block",
            DiagnosticKind::UnterminatedIgnoreRegion => "unterminated-ignore-region",
            DiagnosticKind::UnterminatedRawRegion => "unterminated-raw-region",
            DiagnosticKind::NestingTooDeep => "nesting-too-deep",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An informational warning, never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based source line
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.line, self.kind, self.message)
    }
}
