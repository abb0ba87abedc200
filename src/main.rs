//! tagfmt - Structural reformatter for HTML templates

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};

use glob::Pattern;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use rayon::prelude::*;
use similar::TextDiff;
use tagfmt::{build_cli, format_source, parse_args, CliArgs, FormatConfig, FormatResult, Result};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Template file extensions picked up when walking directories
const TEMPLATE_EXTENSIONS: &[&str] = &[
    "html", "htm", "djhtml", "dtl", "jinja", "jinja2", "j2", "njk", "nunjucks", "hbs",
    "handlebars", "mustache", "tmpl", "gotmpl", "gohtml",
];

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are skipped to prevent memory exhaustion
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Per-run tallies, shared across worker threads
#[derive(Default)]
struct Counters {
    changed: AtomicUsize,
    unchanged: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn record(&self, path: &Path, outcome: Result<bool>) {
        match outcome {
            Ok(true) => {
                self.changed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {
                self.unchanged.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error formatting {}: {e:#}", path.display());
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = parse_args();
    init_logging(args.debug);

    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    // No inputs on an interactive terminal: nothing to read, show help
    if args.inputs.is_empty() && io::stdin().is_terminal() {
        build_cli().print_help()?;
        return Ok(ExitCode::SUCCESS);
    }

    if use_stdin {
        let config = build_config(&args, None)?;
        return process_stdin(&config, &args);
    }

    // An explicit config file applies to every file; otherwise discover per file
    let base_config = if args.config.is_some() {
        Some(build_config(&args, None)?)
    } else {
        None
    };

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                warn!("failed to configure thread pool: {e}");
            }
        }
    }

    let files = collect_files(&args, base_config.as_ref())?;
    if files.is_empty() {
        if !args.quiet {
            eprintln!("No template files found to format.");
        }
        return Ok(ExitCode::SUCCESS);
    }
    debug!(count = files.len(), "collected files");

    let counters = Counters::default();
    let run_one = |path: &PathBuf| {
        let outcome = match base_config.as_ref() {
            Some(config) => process_single_file(path, config, &args),
            None => build_config(&args, Some(path))
                .and_then(|config| process_single_file(path, &config, &args)),
        };
        counters.record(path, outcome);
    };

    if args.stdout || args.jobs == Some(1) {
        files.iter().for_each(run_one);
    } else {
        files.par_iter().for_each(run_one);
    }

    let changed = counters.changed.load(Ordering::Relaxed);
    let unchanged = counters.unchanged.load(Ordering::Relaxed);
    let failed = counters.failed.load(Ordering::Relaxed);

    if !args.quiet {
        print_summary(&args, changed, unchanged, failed);
    }

    if failed > 0 || (args.check && changed > 0) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Install the stderr log subscriber: `warn` by default, `debug` with `-D`, `RUST_LOG` wins
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Build configuration from CLI args and config files
///
/// If `for_path` is provided and no explicit config file is specified,
/// config files are discovered from the path's directory.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<FormatConfig> {
    let mut config = if let Some(config_path) = &args.config {
        debug!(path = %config_path.display(), "using explicit config file");
        FormatConfig::from_toml_file(config_path)?
    } else {
        let start = match for_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?,
        };
        FormatConfig::from_discovered_files(&start)
    };

    if let Some(indent) = args.indent {
        config.indent_width = indent;
    }
    if let Some(max_line_length) = args.max_line_length {
        config.max_line_length = max_line_length;
    }
    if let Some(profile) = args.profile {
        config.profile = Some(profile);
    }
    if let Some(line_ending) = args.line_ending {
        config.line_ending = line_ending;
    }
    if args.preserve_blank_lines {
        config.preserve_blank_lines = true;
    }
    if args.use_gitignore {
        config.use_gitignore = true;
    }

    debug!(?config, "resolved configuration");

    if let Some(error) = config.validate() {
        anyhow::bail!("Invalid configuration: {error}");
    }

    Ok(config)
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs, base_config: Option<&FormatConfig>) -> Result<Vec<PathBuf>> {
    let mut exclude_patterns = Vec::with_capacity(args.exclude.len());
    for pattern in &args.exclude {
        match Pattern::new(pattern) {
            Ok(compiled) => exclude_patterns.push(compiled),
            Err(e) => anyhow::bail!("invalid exclude pattern `{pattern}`: {e}"),
        }
    }

    let mut files = Vec::new();

    for input in &args.inputs {
        if !input.exists() {
            eprintln!("Skipping {}: no such file or directory", input.display());
            continue;
        }

        let absolute = std::path::absolute(input)?;
        let gitignore = if gitignore_enabled(args, base_config, input) {
            build_gitignore(&absolute)
        } else {
            Gitignore::empty()
        };

        if input.is_file() {
            if !is_excluded(input, &exclude_patterns) && !is_gitignored(&gitignore, &absolute, false) {
                files.push(input.clone());
            }
            continue;
        }

        let max_depth = if args.recursive { 256 } else { 1 };

        // WalkDir reports symlink loops as errors, which are skipped
        let walker = WalkDir::new(input)
            .follow_links(true)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| {
                let full = match entry.path().strip_prefix(input) {
                    Ok(relative) if !relative.as_os_str().is_empty() => absolute.join(relative),
                    _ => absolute.clone(),
                };
                !is_gitignored(&gitignore, &full, entry.file_type().is_dir())
            })
            .filter_map(std::result::Result::ok);

        for entry in walker {
            let path = entry.path();
            if path.is_file()
                && is_template_file(path, &args.extensions)
                && !is_excluded(path, &exclude_patterns)
            {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// `--use-gitignore`, else the `use_gitignore` setting that applies to `input`
fn gitignore_enabled(args: &CliArgs, base_config: Option<&FormatConfig>, input: &Path) -> bool {
    args.use_gitignore
        || base_config.map_or_else(
            || FormatConfig::from_discovered_files(input).use_gitignore,
            |config| config.use_gitignore,
        )
}

/// Nearest directory at or above `path` that holds a `.git` entry
fn find_git_root(path: &Path) -> Option<&Path> {
    path.ancestors().find(|dir| dir.join(".git").exists())
}

/// Matcher for the `.gitignore` of the repository containing `path`
///
/// Outside a repository the `.gitignore` next to `path` is used.
fn build_gitignore(path: &Path) -> Gitignore {
    let fallback = if path.is_dir() { Some(path) } else { path.parent() };
    let Some(root) = find_git_root(path).or(fallback) else {
        return Gitignore::empty();
    };
    debug!(root = %root.display(), "gitignore root");

    let mut builder = GitignoreBuilder::new(root);
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.is_file() {
        if let Some(e) = builder.add(&gitignore_path) {
            warn!("failed to read {}: {e}", gitignore_path.display());
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("ignoring {}: {e}", gitignore_path.display());
        Gitignore::empty()
    })
}

/// Whether an absolute path, or a directory above it, is git-ignored
fn is_gitignored(gitignore: &Gitignore, path: &Path, is_dir: bool) -> bool {
    !gitignore.is_empty()
        && path.starts_with(gitignore.path())
        && gitignore.matched_path_or_any_parents(path, is_dir).is_ignore()
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if pattern.matches(&path_str) {
            return true;
        }

        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Directory patterns match any component
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

/// Check if a file has a template extension
///
/// `--extension` values replace the default list; a leading dot is optional.
fn is_template_file(path: &Path, custom_extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            if custom_extensions.is_empty() {
                TEMPLATE_EXTENSIONS.contains(&ext.as_str())
            } else {
                custom_extensions.iter().any(|custom| {
                    custom.strip_prefix('.').unwrap_or(custom).eq_ignore_ascii_case(&ext)
                })
            }
        })
}

/// Print one file's warnings as `path:line: kind: message`
fn report_warnings(name: &str, result: &FormatResult, args: &CliArgs) {
    if args.quiet {
        return;
    }
    for warning in &result.warnings {
        eprintln!("{name}:{warning}");
    }
}

fn unified_diff(name: &str, original: &str, formatted: &str) -> String {
    TextDiff::from_lines(original, formatted)
        .unified_diff()
        .context_radius(3)
        .header(name, name)
        .to_string()
}

/// Process a single file; `Ok(true)` when it needed reformatting
fn process_single_file(path: &Path, config: &FormatConfig, args: &CliArgs) -> Result<bool> {
    // Check file size BEFORE reading to prevent memory exhaustion
    let file_size = std::fs::metadata(path)?.len();
    if file_size > DEFAULT_MAX_FILE_SIZE {
        if !args.quiet {
            eprintln!(
                "Skipping {} ({} MB exceeds limit of {} MB)",
                path.display(),
                file_size / (1024 * 1024),
                DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
            );
        }
        return Ok(false);
    }

    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;

    let name = path.display().to_string();
    debug!(path = %name, "formatting");
    let result = format_source(&contents, Some(path), config);
    report_warnings(&name, &result, args);

    if args.diff && result.changed {
        print!("{}", unified_diff(&name, &contents, &result.formatted_text));
    }

    if args.check {
        if result.changed && !args.quiet {
            eprintln!("would reformat {name}");
        }
    } else if args.stdout {
        io::stdout().write_all(result.formatted_text.as_bytes())?;
    } else if !args.diff && result.changed {
        std::fs::write(path, &result.formatted_text)?;
        if !args.quiet {
            eprintln!("reformatted {name}");
        }
    }

    Ok(result.changed)
}

/// Process input from stdin, output to stdout
fn process_stdin(config: &FormatConfig, args: &CliArgs) -> Result<ExitCode> {
    let mut contents = String::new();
    io::stdin().read_to_string(&mut contents)?;

    #[allow(clippy::cast_possible_truncation)]
    let size = contents.len() as u64;
    if size > DEFAULT_MAX_FILE_SIZE {
        anyhow::bail!(
            "stdin input too large ({} MB exceeds limit of {} MB)",
            size / (1024 * 1024),
            DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
        );
    }

    let result = format_source(&contents, None, config);
    report_warnings("stdin", &result, args);

    if args.diff {
        if result.changed {
            print!("{}", unified_diff("stdin", &contents, &result.formatted_text));
        }
    } else if !args.check {
        io::stdout().write_all(result.formatted_text.as_bytes())?;
    }

    if args.check && result.changed {
        if !args.quiet {
            eprintln!("would reformat stdin");
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(args: &CliArgs, changed: usize, unchanged: usize, failed: usize) {
    let plural = |n: usize| if n == 1 { "file" } else { "files" };
    let verb = if args.check || args.diff {
        "would be reformatted"
    } else {
        "reformatted"
    };
    let mut summary = format!("{changed} {} {verb}, {unchanged} unchanged", plural(changed));
    if failed > 0 {
        summary.push_str(&format!(", {failed} failed"));
    }
    eprintln!("{summary}.");
}
