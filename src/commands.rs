//! CLI commands for code2map: build, symbols, lookup, info.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::diagnostics;
use crate::error::Error;
use crate::frontend::{FrontEnd, TreeSitterFrontEnd};
use crate::map;
use crate::pipeline::{self, FileReport, OutputLayout, RunOptions};
use crate::reader;

/// Exit code when a batch finished but some files failed.
const PARTIAL_FAILURE: u8 = 2;

/// Arguments of `code2map build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    /// Tolerate files with no symbols.
    pub allow_empty: bool,
    /// Plan and print, write nothing.
    pub dry_run: bool,
    /// Output root; defaults to the configured `output_dir` under the analysis root.
    pub out: Option<PathBuf>,
    /// Source file or directory.
    pub path: PathBuf,
    /// Analysis root for a single file; recorded source paths are relative to it.
    pub root: Option<PathBuf>,
}

/// Generate fragments, catalogs and maps for a file or a directory.
///
/// # Errors
///
/// Returns config errors, and for a single file any error from the pipeline.
/// Per-file errors in a directory run are reported and turn into exit code 2.
pub fn build(args: &BuildArgs) -> Result<ExitCode, Error> {
    if args.path.is_dir() {
        return build_directory(args);
    }

    let (root, source_path) = split_root(&args.path, args.root.as_deref());
    let config = Config::load(&root)?;
    let output_dir = resolve_output_dir(args, &root, &config);
    let layout = OutputLayout::single(&output_dir);

    let report = pipeline::run_file(&root, &source_path, &layout, run_options(args, &config))?;
    print_file_report(&report, args.dry_run);
    return Ok(ExitCode::SUCCESS);
}

/// Batch run over every supported file under the directory.
fn build_directory(args: &BuildArgs) -> Result<ExitCode, Error> {
    let root = args.path.clone();
    let config = Config::load(&root)?;
    let output_dir = resolve_output_dir(args, &root, &config);

    let report = pipeline::run_batch(&root, &config, &output_dir, run_options(args, &config));
    for file in &report.files {
        print_file_report(file, args.dry_run);
    }
    for (path, e) in &report.failures {
        eprintln!("failed: {}", path.display());
        diagnostics::print_error(e);
    }

    let total = report.files.len().saturating_add(report.failures.len());
    if report.has_failures() {
        eprintln!("{} of {total} files failed", report.failures.len());
        return Ok(ExitCode::from(PARTIAL_FAILURE));
    }
    eprintln!("Processed {total} files into {}", output_dir.display());
    return Ok(ExitCode::SUCCESS);
}

/// Output a reference document for code2map.
pub fn info(json: bool) {
    return crate::info::run(json);
}

/// Print the fragment path and range recorded for one symbol in a map.
///
/// # Errors
///
/// Returns `Error::UnknownSymbol` with suggestions when the symbol is absent,
/// or any error from loading the map.
pub fn lookup(map_path: &Path, symbol: &str) -> Result<(), Error> {
    let entry = map::lookup(map_path, symbol)?;
    println!(
        "{}\t{}\t{}-{}",
        entry.output_path, entry.kind, entry.start_line, entry.end_line
    );
    return Ok(());
}

/// Print the fragments a file produced, or would produce in a dry run.
fn print_file_report(report: &FileReport, dry_run: bool) {
    let output_dir = &report.layout.output_dir;
    if dry_run {
        for fragment in &report.outcome.fragments {
            println!("{}", output_dir.join(&fragment.output_path).display());
        }
        return;
    }
    println!(
        "{}: {} fragments, {} warnings -> {}",
        report.table.source_path().display(),
        report.outcome.fragments.len(),
        report.table.warnings().len(),
        report.layout.index_path.display()
    );
}

/// Resolve the output root: `--out` as given, else the configured directory under `root`.
fn resolve_output_dir(args: &BuildArgs, root: &Path, config: &Config) -> PathBuf {
    return args.out.clone().unwrap_or_else(|| return root.join(&config.output_dir));
}

/// Combine config values with command-line overrides.
const fn run_options(args: &BuildArgs, config: &Config) -> RunOptions {
    let base = RunOptions::from_config(config);
    return RunOptions {
        allow_empty_map: base.allow_empty_map || args.allow_empty,
        dry_run: args.dry_run,
        max_file_bytes: base.max_file_bytes,
    };
}

/// Split a single-file argument into analysis root and root-relative source path.
///
/// With `--root`, the path is made relative to it when possible. Without it,
/// a relative path is kept as given under `.`, and an absolute path is split
/// at its parent directory.
fn split_root(path: &Path, root: Option<&Path>) -> (PathBuf, PathBuf) {
    if let Some(root) = root {
        let relative = path.strip_prefix(root).unwrap_or(path);
        return (root.to_path_buf(), relative.to_path_buf());
    }
    if path.is_relative() {
        return (PathBuf::from("."), path.to_path_buf());
    }
    let parent = path.parent().map_or_else(|| return PathBuf::from("/"), Path::to_path_buf);
    let name = path.file_name().map_or_else(PathBuf::new, PathBuf::from);
    return (parent, name);
}

/// List the symbols and warnings of one file without writing anything.
///
/// # Errors
///
/// Returns errors from language detection, reading, or parsing.
pub fn symbols(file: &Path) -> Result<(), Error> {
    let frontend = TreeSitterFrontEnd::for_path(file)?;
    let lines = reader::read_lines(file, reader::MAX_FILE_SIZE)?;
    let table = frontend.parse_lines(file, &lines)?;

    for symbol in table.symbols() {
        println!(
            "{}\t{}\t{}-{}",
            symbol.qualified_name, symbol.kind, symbol.start_line, symbol.end_line
        );
    }
    for warning in table.warnings() {
        let kind = warning.kind.label();
        match warning.line {
            Some(line) => eprintln!("warning: line {line} ({kind}): {}", warning.message),
            None => eprintln!("warning: unknown line ({kind}): {}", warning.message),
        }
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_root_strips_explicit_root() {
        let (root, source) = split_root(Path::new("repo/src/app.py"), Some(Path::new("repo")));
        assert_eq!(root, PathBuf::from("repo"));
        assert_eq!(source, PathBuf::from("src/app.py"));
    }

    #[test]
    fn split_root_keeps_relative_paths() {
        let (root, source) = split_root(Path::new("src/app.py"), None);
        assert_eq!(root, PathBuf::from("."));
        assert_eq!(source, PathBuf::from("src/app.py"));
    }

    #[test]
    fn split_root_splits_absolute_paths_at_parent() {
        let (root, source) = split_root(Path::new("/work/src/app.py"), None);
        assert_eq!(root, PathBuf::from("/work/src"));
        assert_eq!(source, PathBuf::from("app.py"));
    }

    #[test]
    fn flags_override_config() {
        let args = BuildArgs {
            allow_empty: true,
            dry_run: true,
            out: None,
            path: PathBuf::from("x.py"),
            root: None,
        };
        let options = run_options(&args, &Config::default());
        assert!(options.allow_empty_map, "--allow-empty ignored");
        assert!(options.dry_run, "--dry-run ignored");
    }
}
