//! Configuration management for tagfmt.
//!
//! This module provides the [`FormatConfig`] struct which controls all formatting behavior.
//! Configuration can be loaded from:
//! - TOML files (`tagfmt.toml`, or the `[tool.tagfmt]` table of `pyproject.toml`)
//! - CLI arguments (which override file settings)
//! - In-file directives (`{# tagfmt: --indent 2 #}`)
//!
//! Config files are auto-discovered in the user's home directory and then in every
//! directory from the filesystem root down to the file being formatted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::tags::Dialect;

/// Config file names searched in each directory (later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["pyproject.toml", "tagfmt.toml"];

const PYPROJECT: &str = "pyproject.toml";

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

// Serde default functions
fn default_indent() -> usize {
    4
}
fn default_max_line_length() -> usize {
    120
}

/// Paired comment markers that switch formatting off and back on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreMarkers {
    /// Marker that starts an ignored span
    pub on: String,
    /// Marker that ends an ignored span
    pub off: String,
}

impl Default for IgnoreMarkers {
    fn default() -> Self {
        Self {
            on: "tagfmt:off".to_string(),
            off: "tagfmt:on".to_string(),
        }
    }
}

/// Line terminator used when joining output lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Same as the first terminator found in the input, `\n` if none
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl LineEnding {
    /// Concrete terminator for a given source text
    #[must_use]
    pub fn resolve(self, source: &str) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Auto => match source.find('\n') {
                Some(pos) if source[..pos].ends_with('\r') => "\r\n",
                _ => "\n",
            },
        }
    }
}

impl std::str::FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(LineEnding::Auto),
            "lf" | "unix" => Ok(LineEnding::Lf),
            "crlf" | "windows" => Ok(LineEnding::Crlf),
            other => Err(format!("unknown line ending `{other}` (expected auto, lf or crlf)")),
        }
    }
}

/// Main configuration struct for tagfmt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Number of spaces per indent level (default: 4)
    #[serde(default = "default_indent", alias = "indent")]
    pub indent_width: usize,

    /// Longest line a block may be collapsed into (default: 120)
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Tags whose contents are always copied verbatim
    #[serde(default)]
    pub preserve_tags: Vec<String>,

    /// Comment markers that protect a span from formatting
    #[serde(default)]
    pub ignore_directive_markers: IgnoreMarkers,

    /// Extra template block tags, closed by `end<name>`
    #[serde(default)]
    pub custom_blocks: Vec<String>,

    /// Extra HTML elements formatted as blocks
    #[serde(default)]
    pub custom_html: Vec<String>,

    /// Blocks whose literal text keeps its horizontal spacing
    #[serde(default)]
    pub preserve_whitespace: Vec<String>,

    /// Keep single blank lines at every nesting level (default: false)
    #[serde(default)]
    pub preserve_blank_lines: bool,

    /// Output line terminator (default: auto)
    #[serde(default)]
    pub line_ending: LineEnding,

    /// Template dialect; detected from the file extension when unset
    #[serde(default)]
    pub profile: Option<Dialect>,

    /// Skip files matched by the repository's `.gitignore` (default: false)
    #[serde(default)]
    pub use_gitignore: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            indent_width: default_indent(),
            max_line_length: default_max_line_length(),
            preserve_tags: Vec::new(),
            ignore_directive_markers: IgnoreMarkers::default(),
            custom_blocks: Vec::new(),
            custom_html: Vec::new(),
            preserve_whitespace: Vec::new(),
            preserve_blank_lines: false,
            line_ending: LineEnding::Auto,
            profile: None,
            use_gitignore: false,
        }
    }
}

/// A tag-name list written either as a TOML array or a comma-separated string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NameList {
    Csv(String),
    List(Vec<String>),
}

impl NameList {
    fn into_names(self) -> Vec<String> {
        match self {
            NameList::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            NameList::List(list) => list,
        }
    }
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    #[serde(alias = "indent")]
    pub indent_width: Option<usize>,
    pub max_line_length: Option<usize>,
    pub preserve_tags: Option<NameList>,
    pub ignore_directive_markers: Option<IgnoreMarkers>,
    pub custom_blocks: Option<NameList>,
    pub custom_html: Option<NameList>,
    pub preserve_whitespace: Option<NameList>,
    pub preserve_blank_lines: Option<bool>,
    pub line_ending: Option<LineEnding>,
    pub profile: Option<Dialect>,
    pub use_gitignore: Option<bool>,
}

impl FormatConfig {
    /// Maximum reasonable indent size
    const MAX_INDENT: usize = 16;
    /// Minimum reasonable line length
    const MIN_LINE_LENGTH: usize = 20;
    /// Maximum reasonable line length
    const MAX_LINE_LENGTH: usize = 1000;

    /// Validate configuration values are within reasonable bounds
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.indent_width == 0 {
            return Some("indent must be at least 1".to_string());
        }
        if self.indent_width > Self::MAX_INDENT {
            return Some(format!(
                "indent {} exceeds maximum of {}",
                self.indent_width,
                Self::MAX_INDENT
            ));
        }
        if self.max_line_length < Self::MIN_LINE_LENGTH {
            return Some(format!(
                "max_line_length {} is below minimum of {}",
                self.max_line_length,
                Self::MIN_LINE_LENGTH
            ));
        }
        if self.max_line_length > Self::MAX_LINE_LENGTH {
            return Some(format!(
                "max_line_length {} exceeds maximum of {}",
                self.max_line_length,
                Self::MAX_LINE_LENGTH
            ));
        }
        let markers = &self.ignore_directive_markers;
        if markers.on.trim().is_empty() || markers.off.trim().is_empty() {
            return Some("ignore_directive_markers must not be empty".to_string());
        }
        if markers.on == markers.off {
            return Some(format!(
                "ignore_directive_markers on and off are both `{}`",
                markers.on
            ));
        }
        None
    }

    /// Load configuration from a TOML file
    ///
    /// A `pyproject.toml` without a `[tool.tagfmt]` table yields the defaults.
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(partial) = read_partial(path)? {
            config.apply_partial(partial);
        }
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.indent_width {
            self.indent_width = v;
        }
        if let Some(v) = partial.max_line_length {
            self.max_line_length = v;
        }
        if let Some(v) = partial.preserve_tags {
            self.preserve_tags = v.into_names();
        }
        if let Some(v) = partial.ignore_directive_markers {
            self.ignore_directive_markers = v;
        }
        if let Some(v) = partial.custom_blocks {
            self.custom_blocks = v.into_names();
        }
        if let Some(v) = partial.custom_html {
            self.custom_html = v.into_names();
        }
        if let Some(v) = partial.preserve_whitespace {
            self.preserve_whitespace = v.into_names();
        }
        if let Some(v) = partial.preserve_blank_lines {
            self.preserve_blank_lines = v;
        }
        if let Some(v) = partial.line_ending {
            self.line_ending = v;
        }
        if partial.profile.is_some() {
            self.profile = partial.profile;
        }
        if let Some(v) = partial.use_gitignore {
            self.use_gitignore = v;
        }
    }

    /// Discover config files for a given path
    ///
    /// Home directory config first, then every directory from the root down to
    /// the file's directory. Returns paths least specific first.
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Unreadable files are logged and skipped.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in Self::discover_config_files(start_path) {
            match read_partial(&path) {
                Ok(Some(partial)) => {
                    debug!(path = %path.display(), "applying config file");
                    config.apply_partial(partial);
                }
                Ok(None) => {}
                Err(e) => warn!("failed to load {}: {e}", path.display()),
            }
        }
        config
    }
}

/// Parse the tagfmt settings of one config file, `None` when the file has none
fn read_partial(path: &Path) -> anyhow::Result<Option<PartialConfig>> {
    let contents = std::fs::read_to_string(path)?;
    let is_pyproject = path.file_name().is_some_and(|name| name == PYPROJECT);
    if !is_pyproject {
        return Ok(Some(toml::from_str(&contents)?));
    }

    let document: toml::Table = toml::from_str(&contents)?;
    match document.get("tool").and_then(|tool| tool.get("tagfmt")) {
        Some(section) => Ok(Some(section.clone().try_into()?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = FormatConfig::default();
        assert_eq!(config.indent_width, 4);
        assert_eq!(config.max_line_length, 120);
        assert_eq!(config.ignore_directive_markers.on, "tagfmt:off");
        assert_eq!(config.ignore_directive_markers.off, "tagfmt:on");
        assert!(!config.preserve_blank_lines);
        assert_eq!(config.profile, None);
    }

    #[test]
    fn test_line_ending_resolve() {
        assert_eq!(LineEnding::Auto.resolve("a\r\nb\n"), "\r\n");
        assert_eq!(LineEnding::Auto.resolve("a\nb\r\n"), "\n");
        assert_eq!(LineEnding::Auto.resolve("no newline"), "\n");
        assert_eq!(LineEnding::Crlf.resolve("a\nb"), "\r\n");
        assert_eq!("LF".parse::<LineEnding>(), Ok(LineEnding::Lf));
    }

    #[test]
    fn test_config_apply_partial() {
        let mut base = FormatConfig::default();
        let partial = PartialConfig {
            indent_width: Some(2),
            max_line_length: Some(80),
            ..Default::default()
        };
        base.apply_partial(partial);
        assert_eq!(base.indent_width, 2);
        assert_eq!(base.max_line_length, 80);
        assert_eq!(base.line_ending, LineEnding::Auto);
    }

    #[test]
    fn test_config_apply_partial_preserves_unset() {
        let mut base = FormatConfig {
            indent_width: 2,
            ..Default::default()
        };
        let partial = PartialConfig {
            preserve_blank_lines: Some(true),
            ..Default::default()
        };
        base.apply_partial(partial);
        assert_eq!(base.indent_width, 2);
        assert!(base.preserve_blank_lines);
    }

    #[test]
    fn test_partial_accepts_comma_separated_names() {
        let partial: PartialConfig =
            toml::from_str("custom_blocks = \"toc, example\"\ncustom_html = [\"my-card\"]\nindent = 2")
                .unwrap();
        let mut config = FormatConfig::default();
        config.apply_partial(partial);
        assert_eq!(config.custom_blocks, vec!["toc", "example"]);
        assert_eq!(config.custom_html, vec!["my-card"]);
        assert_eq!(config.indent_width, 2);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagfmt.toml");
        fs::write(
            &path,
            "max_line_length = 80\nprofile = \"jinja\"\nline_ending = \"crlf\"\n\n[ignore_directive_markers]\non = \"fmt:off\"\noff = \"fmt:on\"\n",
        )
        .unwrap();
        let config = FormatConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_line_length, 80);
        assert_eq!(config.profile, Some(Dialect::Jinja));
        assert_eq!(config.line_ending, LineEnding::Crlf);
        assert_eq!(config.ignore_directive_markers.on, "fmt:off");
    }

    #[test]
    fn test_use_gitignore_key() {
        assert!(!FormatConfig::default().use_gitignore);
        let partial: PartialConfig = toml::from_str("use_gitignore = true").unwrap();
        let mut config = FormatConfig::default();
        config.apply_partial(partial);
        assert!(config.use_gitignore);
    }

    #[test]
    fn test_pyproject_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(
            &path,
            "[project]\nname = \"site\"\n\n[tool.tagfmt]\nindent = 2\npreserve_blank_lines = true\n",
        )
        .unwrap();
        let config = FormatConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.indent_width, 2);
        assert!(config.preserve_blank_lines);
    }

    #[test]
    fn test_pyproject_without_section_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, "[project]\nname = \"site\"\n").unwrap();
        let config = FormatConfig::from_toml_file(&path).unwrap();
        assert_eq!(config, FormatConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagfmt.toml");
        fs::write(&path, "indent = \"four\"").unwrap();
        assert!(FormatConfig::from_toml_file(&path).is_err());
    }

    #[test]
    fn test_discovery_nearest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("templates/pages");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("tagfmt.toml"), "indent = 2\nmax_line_length = 80").unwrap();
        fs::write(nested.join("tagfmt.toml"), "indent = 3").unwrap();
        let file = nested.join("index.html");
        fs::write(&file, "").unwrap();

        let files = FormatConfig::discover_config_files(&file);
        let root_pos = files.iter().position(|p| p == &dir.path().join("tagfmt.toml"));
        let nested_pos = files.iter().position(|p| p == &nested.join("tagfmt.toml"));
        assert!(root_pos < nested_pos);

        let config = FormatConfig::from_discovered_files(&file);
        assert_eq!(config.indent_width, 3);
        assert_eq!(config.max_line_length, 80);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(FormatConfig::default().validate().is_none());
    }

    #[test]
    fn test_validate_indent() {
        for indent in [0, 17] {
            let config = FormatConfig {
                indent_width: indent,
                ..Default::default()
            };
            assert!(config.validate().is_some_and(|e| e.contains("indent")));
        }
    }

    #[test]
    fn test_validate_line_length() {
        for length in [10, 5000] {
            let config = FormatConfig {
                max_line_length: length,
                ..Default::default()
            };
            assert!(config.validate().is_some_and(|e| e.contains("max_line_length")));
        }
    }

    #[test]
    fn test_validate_markers() {
        let empty = FormatConfig {
            ignore_directive_markers: IgnoreMarkers {
                on: String::new(),
                off: "x".to_string(),
            },
            ..Default::default()
        };
        assert!(empty.validate().is_some());
        let same = FormatConfig {
            ignore_directive_markers: IgnoreMarkers {
                on: "x".to_string(),
                off: "x".to_string(),
            },
            ..Default::default()
        };
        assert!(same.validate().is_some());
    }
}
