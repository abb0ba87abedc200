//! Template dialects and their delimiter conventions

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A template syntax family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Plain HTML, no template syntax
    Html,
    #[default]
    Django,
    Jinja,
    Nunjucks,
    Handlebars,
    #[serde(alias = "go")]
    GoTemplate,
}

/// How template tags are spelled inside a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// No template layer at all
    Markup,
    /// `{% stmt %}`, `{{ expr }}`, `{# comment #}`
    Curly,
    /// `{{#open}}`, `{{/close}}`, `{{!-- comment --}}`
    Handlebars,
    /// `{{ if }}` ... `{{ end }}`, `{{/* comment */}}`
    Go,
}

/// An opening/closing delimiter pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: &'static str,
    pub close: &'static str,
}

impl Delimiters {
    const fn new(open: &'static str, close: &'static str) -> Self {
        Self { open, close }
    }
}

/// Immutable description of the active template syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    pub dialect: Dialect,
    pub family: Family,
    /// Statement delimiters (`{% %}` for the Curly family)
    pub statement: Option<Delimiters>,
    /// Expression output delimiters
    pub expression: Option<Delimiters>,
    /// Comment delimiters
    pub comment: Option<Delimiters>,
    /// Characters that open string literals inside template tags
    pub quotes: &'static [char],
    /// Whether tag contents are padded with exactly one space on output
    pub pad_delimiters: bool,
}

const CURLY_STATEMENT: Delimiters = Delimiters::new("{%", "%}");
const CURLY_EXPRESSION: Delimiters = Delimiters::new("{{", "}}");
const CURLY_COMMENT: Delimiters = Delimiters::new("{#", "#}");
const MUSTACHE: Delimiters = Delimiters::new("{{", "}}");

impl Dialect {
    /// All supported dialects
    pub const ALL: [Dialect; 6] = [
        Dialect::Html,
        Dialect::Django,
        Dialect::Jinja,
        Dialect::Nunjucks,
        Dialect::Handlebars,
        Dialect::GoTemplate,
    ];

    /// The delimiter profile for this dialect
    #[must_use]
    pub fn profile(self) -> DialectProfile {
        match self {
            Dialect::Html => DialectProfile {
                dialect: self,
                family: Family::Markup,
                statement: None,
                expression: None,
                comment: None,
                quotes: &['"', '\''],
                pad_delimiters: false,
            },
            Dialect::Django | Dialect::Jinja => DialectProfile {
                dialect: self,
                family: Family::Curly,
                statement: Some(CURLY_STATEMENT),
                expression: Some(CURLY_EXPRESSION),
                comment: Some(CURLY_COMMENT),
                quotes: &['"', '\''],
                pad_delimiters: true,
            },
            Dialect::Nunjucks => DialectProfile {
                dialect: self,
                family: Family::Curly,
                statement: Some(CURLY_STATEMENT),
                expression: Some(CURLY_EXPRESSION),
                comment: Some(CURLY_COMMENT),
                quotes: &['"', '\'', '`'],
                pad_delimiters: true,
            },
            Dialect::Handlebars => DialectProfile {
                dialect: self,
                family: Family::Handlebars,
                statement: Some(MUSTACHE),
                expression: Some(MUSTACHE),
                comment: Some(Delimiters::new("{{!", "}}")),
                quotes: &['"', '\''],
                pad_delimiters: false,
            },
            Dialect::GoTemplate => DialectProfile {
                dialect: self,
                family: Family::Go,
                statement: Some(MUSTACHE),
                expression: Some(MUSTACHE),
                comment: Some(Delimiters::new("{{/*", "*/}}")),
                quotes: &['"', '`', '\''],
                pad_delimiters: false,
            },
        }
    }

    /// Guess the dialect from a file extension (case-insensitive)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "djhtml" | "dtl" | "django" => Some(Dialect::Django),
            "jinja" | "jinja2" | "j2" => Some(Dialect::Jinja),
            "njk" | "nunjucks" => Some(Dialect::Nunjucks),
            "hbs" | "handlebars" | "mustache" => Some(Dialect::Handlebars),
            "tmpl" | "gotmpl" | "gohtml" => Some(Dialect::GoTemplate),
            "xhtml" | "svg" => Some(Dialect::Html),
            _ => None,
        }
    }

    /// Guess the dialect from a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical name used in config files and on the command line
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Html => "html",
            Dialect::Django => "django",
            Dialect::Jinja => "jinja",
            Dialect::Nunjucks => "nunjucks",
            Dialect::Handlebars => "handlebars",
            Dialect::GoTemplate => "go-template",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Dialect::Html),
            "django" => Ok(Dialect::Django),
            "jinja" | "jinja2" => Ok(Dialect::Jinja),
            "nunjucks" => Ok(Dialect::Nunjucks),
            "handlebars" | "hbs" | "mustache" => Ok(Dialect::Handlebars),
            "go-template" | "gotemplate" | "go" => Ok(Dialect::GoTemplate),
            other => Err(format!(
                "unknown profile `{other}` (expected one of: html, django, jinja, nunjucks, handlebars, go-template)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Dialect::from_extension("html"), Some(Dialect::Django));
        assert_eq!(Dialect::from_extension("J2"), Some(Dialect::Jinja));
        assert_eq!(Dialect::from_extension("njk"), Some(Dialect::Nunjucks));
        assert_eq!(Dialect::from_extension("hbs"), Some(Dialect::Handlebars));
        assert_eq!(Dialect::from_extension("gohtml"), Some(Dialect::GoTemplate));
        assert_eq!(Dialect::from_extension("rs"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Dialect::from_path(Path::new("templates/base.jinja")),
            Some(Dialect::Jinja)
        );
        assert_eq!(Dialect::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_from_str_roundtrips_names() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>(), Ok(dialect));
        }
        assert!("erb".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_profiles() {
        assert_eq!(Dialect::Html.profile().family, Family::Markup);
        assert!(Dialect::Django.profile().pad_delimiters);
        assert!(!Dialect::Handlebars.profile().pad_delimiters);
        assert_eq!(
            Dialect::GoTemplate.profile().comment.map(|d| d.open),
            Some("{{/*")
        );
    }
}
