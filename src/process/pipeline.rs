//! Reformatting pipeline
//!
//! Runs the stages in order over one source text:
//! - Tokenize with the dialect's tag table
//! - Mark ignore regions (directives, raw-preserving tags)
//! - Assign indent levels from the block stack
//! - Compose lines and join them with the configured terminator

use std::path::Path;

use tracing::{debug, warn};

use crate::config::FormatConfig;
use crate::diagnostic::Diagnostic;
use crate::directive::find_directive;
use crate::format::{compose, indent_tokens, track_regions};
use crate::parser::tokenize;
use crate::tags::{Dialect, DialectProfile, TagTable};

use super::change::detect;

/// Outcome of reformatting one source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    pub formatted_text: String,
    /// Whether `formatted_text` differs from the input beyond one trailing line terminator
    pub changed: bool,
    /// Structural anomalies found along the way, ordered by line
    pub warnings: Vec<Diagnostic>,
}

/// Config with the file's own settings directive applied
///
/// An override that would make the config invalid is dropped with a warning.
#[must_use]
pub fn effective_config(source: &str, config: &FormatConfig) -> FormatConfig {
    let Some(overrides) = find_directive(source) else {
        return config.clone();
    };
    let merged = overrides.apply(config);
    if let Some(error) = merged.validate() {
        warn!("ignoring settings directive: {error}");
        return config.clone();
    }
    debug!(?overrides, "applying settings directive");
    merged
}

/// Reformat one template source
///
/// Never fails: malformed markup is formatted best-effort and reported in
/// `warnings`. The caller is responsible for passing a validated config.
#[must_use]
pub fn reformat(source: &str, profile: &DialectProfile, config: &FormatConfig) -> FormatResult {
    let config = effective_config(source, config);
    let table = TagTable::new(profile.dialect, &config);

    let tokens = tokenize(source, &table);
    debug!(dialect = %profile.dialect, tokens = tokens.len(), "tokenized");

    let regions = track_regions(&tokens, &table);
    debug!(regions = regions.regions.len(), "ignore regions tracked");

    let indentation = indent_tokens(&tokens, &regions, &table, &config.preserve_whitespace);

    let terminator = config.line_ending.resolve(source);
    let formatted_text = compose(
        source,
        &tokens,
        &indentation.annotations,
        &table,
        &config,
        terminator,
    );

    let mut warnings = regions.diagnostics;
    warnings.extend(indentation.diagnostics);
    warnings.sort_by_key(|diagnostic| diagnostic.line);

    FormatResult {
        changed: detect(source, &formatted_text),
        formatted_text,
        warnings,
    }
}

/// Dialect for a file: the configured profile, else the extension, else Django
#[must_use]
pub fn resolve_dialect(config: &FormatConfig, path: Option<&Path>) -> Dialect {
    config
        .profile
        .or_else(|| path.and_then(Dialect::from_path))
        .unwrap_or_default()
}

/// Reformat a source with the dialect resolved from `config` and `path`
#[must_use]
pub fn format_source(source: &str, path: Option<&Path>, config: &FormatConfig) -> FormatResult {
    let dialect = resolve_dialect(config, path);
    reformat(source, &dialect.profile(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn django(source: &str) -> FormatResult {
        reformat(source, &Dialect::Django.profile(), &FormatConfig::default())
    }

    #[test]
    fn test_reformat_include() {
        let result = django(r#"{% include "this" %}"#);
        assert_eq!(result.formatted_text, "{% include \"this\" %}\n");
        assert!(!result.changed);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_reformat_reports_change() {
        let result = django("{{x}}");
        assert_eq!(result.formatted_text, "{{ x }}\n");
        assert!(result.changed);
    }

    #[test]
    fn test_unmatched_closer_is_a_warning() {
        let result = django("<div>a</div></div>\n<p>b</p>");
        assert_eq!(result.formatted_text, "<div>a</div>\n</div>\n<p>b</p>\n");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, DiagnosticKind::UnmatchedCloser);
        assert_eq!(result.warnings[0].line, 1);
    }

    #[test]
    fn test_settings_directive() {
        let source = "{# tagfmt: --indent 2 #}\n<ul><li><b>a</b><br></li></ul>";
        let result = django(source);
        assert_eq!(
            result.formatted_text,
            "{# tagfmt: --indent 2 #}\n<ul>\n  <li>\n    <b>a</b>\n    <br>\n  </li>\n</ul>\n"
        );
    }

    #[test]
    fn test_invalid_directive_ignored() {
        let config = effective_config("{# tagfmt: --indent 99 #}", &FormatConfig::default());
        assert_eq!(config, FormatConfig::default());
    }

    #[test]
    fn test_crlf_input_keeps_crlf() {
        let result = django("<div>\r\n<br>\r\n</div>\r\n");
        assert_eq!(result.formatted_text, "<div>\r\n    <br>\r\n</div>\r\n");
    }

    #[test]
    fn test_forced_line_ending_leaves_protected_bytes() {
        let config = FormatConfig {
            line_ending: crate::config::LineEnding::Lf,
            ..FormatConfig::default()
        };
        let source = "<div>\r\n<!-- a\r\n   b -->\r\n</div>\r\n";
        let result = reformat(source, &Dialect::Django.profile(), &config);
        assert_eq!(result.formatted_text, "<div>\n    <!-- a\r\n   b -->\n</div>\n");
        let again = reformat(&result.formatted_text, &Dialect::Django.profile(), &config);
        assert_eq!(again.formatted_text, result.formatted_text);
    }

    #[test]
    fn test_resolve_dialect() {
        let config = FormatConfig::default();
        assert_eq!(resolve_dialect(&config, Some(Path::new("a.hbs"))), Dialect::Handlebars);
        assert_eq!(resolve_dialect(&config, Some(Path::new("a.txt"))), Dialect::Django);
        assert_eq!(resolve_dialect(&config, None), Dialect::Django);
        let config = FormatConfig {
            profile: Some(Dialect::Jinja),
            ..FormatConfig::default()
        };
        assert_eq!(resolve_dialect(&config, Some(Path::new("a.hbs"))), Dialect::Jinja);
    }
}
