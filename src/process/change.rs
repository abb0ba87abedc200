/// Change detection between an input and its formatted form
///
/// A single trailing line terminator is not a change: `a` and `a\n` compare equal.
fn strip_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Whether formatting changed the text
#[must_use]
pub fn detect(original: &str, formatted: &str) -> bool {
    strip_terminator(original) != strip_terminator(formatted)
}
