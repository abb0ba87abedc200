//! Command-line interface for tagfmt.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::config::LineEnding;
use crate::tags::Dialect;

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to format
    pub inputs: Vec<PathBuf>,

    /// Number of spaces per indent level
    pub indent: Option<usize>,

    /// Longest line a block may be collapsed into
    pub max_line_length: Option<usize>,

    /// Template dialect, overriding config and extension detection
    pub profile: Option<Dialect>,

    /// Output line terminator
    pub line_ending: Option<LineEnding>,

    /// Keep single blank lines at every nesting level
    pub preserve_blank_lines: bool,

    /// Report files that would change without writing them
    pub check: bool,

    /// Show a unified diff without modifying files
    pub diff: bool,

    /// Output to stdout instead of in-place
    pub stdout: bool,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Recursive directory processing
    pub recursive: bool,

    /// Quiet mode (no summaries or diagnostics)
    pub quiet: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Template file extensions to pick up when walking directories
    pub extensions: Vec<String>,

    /// Skip files matched by `.gitignore`
    pub use_gitignore: bool,

    /// Enable debug logging
    pub debug: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("tagfmt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Structural reformatter for HTML templates (Django, Jinja, Nunjucks, Handlebars, Go)")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to format, `-` for stdin")
                .value_name("INPUT")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("indent")
                .short('i')
                .long("indent")
                .help("Number of spaces per indent level [default: 4]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("max-line-length")
                .short('l')
                .long("max-line-length")
                .help("Longest line a block may be collapsed into [default: 120]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .help("Template dialect: html, django, jinja, nunjucks, handlebars, go-template [default: from extension]")
                .value_name("PROFILE")
                .value_parser(clap::builder::ValueParser::new(|s: &str| s.parse::<Dialect>())),
        )
        .arg(
            Arg::new("line-ending")
                .long("line-ending")
                .help("Output line terminator: auto, lf, crlf [default: auto]")
                .value_name("EOL")
                .value_parser(clap::builder::ValueParser::new(|s: &str| s.parse::<LineEnding>())),
        )
        .arg(
            Arg::new("preserve-blank-lines")
                .long("preserve-blank-lines")
                .help("Keep single blank lines inside blocks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("Do not write files; exit with status 1 if any file would change")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("diff")
                .short('d')
                .long("diff")
                .help("Show a unified diff without modifying files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Output to stdout instead of modifying files in-place")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively format directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("extension")
                .long("extension")
                .help("Template file extension to format (can be repeated, e.g., --extension njk)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("use-gitignore")
                .long("use-gitignore")
                .help("Skip files ignored by .gitignore")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug logging (config discovery, pipeline steps)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Quiet mode (no summary or diagnostics, for editor integration)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

fn strings(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default()
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        indent: matches.get_one::<usize>("indent").copied(),
        max_line_length: matches.get_one::<usize>("max-line-length").copied(),
        profile: matches.get_one::<Dialect>("profile").copied(),
        line_ending: matches.get_one::<LineEnding>("line-ending").copied(),
        preserve_blank_lines: matches.get_flag("preserve-blank-lines"),
        check: matches.get_flag("check"),
        diff: matches.get_flag("diff"),
        stdout: matches.get_flag("stdout"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        recursive: matches.get_flag("recursive"),
        quiet: matches.get_flag("quiet"),
        jobs: matches.get_one::<usize>("jobs").copied(),
        exclude: strings(matches, "exclude"),
        extensions: strings(matches, "extension"),
        use_gitignore: matches.get_flag("use-gitignore"),
        debug: matches.get_flag("debug"),
    }
}
