//! End-to-end runs: one source file, or every supported file under a root.
//!
//! Each file is planned completely (symbols, fragments, catalog, map) before
//! anything is written, so a file that fails leaves no partial output behind.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::error::Error;
use crate::frontend::{FrontEnd, TreeSitterFrontEnd};
use crate::parts::{self, PartsOutcome};
use crate::reader::{self, MAX_FILE_SIZE, SourceLines};
use crate::scanner::{self, normalize_path};
use crate::symbols::SymbolTable;
use crate::types::MapEntry;
use crate::{index, map};

/// Catalog file name for a single-file run.
pub const SINGLE_INDEX: &str = "INDEX.md";

/// Map file name for a single-file run.
pub const SINGLE_MAP: &str = "MAP.json";

/// Knobs shared by single-file and batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Log and skip the map instead of failing when a file has no fragments.
    pub allow_empty_map: bool,
    /// Plan everything, write nothing.
    pub dry_run: bool,
    /// Size limit per source file.
    pub max_file_bytes: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        return Self {
            allow_empty_map: false,
            dry_run: false,
            max_file_bytes: MAX_FILE_SIZE,
        };
    }
}

impl RunOptions {
    /// Options taken from a loaded config.
    pub const fn from_config(config: &Config) -> Self {
        return Self {
            allow_empty_map: config.allow_empty_map,
            dry_run: false,
            max_file_bytes: config.max_file_bytes,
        };
    }
}

/// Where one file's documents go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Catalog document.
    pub index_path: PathBuf,
    /// Map document.
    pub map_path: PathBuf,
    /// Output root; fragments go below `output_dir/parts`.
    pub output_dir: PathBuf,
}

impl OutputLayout {
    /// Batch layout: `index/<source>.md` and `map/<source>.json` under the output root.
    pub fn batch(output_dir: &Path, source_path: &Path) -> Self {
        let relative = mirrored(source_path);
        return Self {
            index_path: output_dir.join("index").join(with_suffix(&relative, ".md")),
            map_path: output_dir.join("map").join(with_suffix(&relative, ".json")),
            output_dir: output_dir.to_path_buf(),
        };
    }

    /// Single-file layout: `INDEX.md` and `MAP.json` at the output root.
    pub fn single(output_dir: &Path) -> Self {
        return Self {
            index_path: output_dir.join(SINGLE_INDEX),
            map_path: output_dir.join(SINGLE_MAP),
            output_dir: output_dir.to_path_buf(),
        };
    }
}

/// What one file produced.
#[derive(Debug)]
pub struct FileReport {
    /// Where the documents were (or would have been) written.
    pub layout: OutputLayout,
    /// Map entries; empty when an empty map was tolerated.
    pub map_entries: Vec<MapEntry>,
    /// Fragments and skipped symbols.
    pub outcome: PartsOutcome,
    /// Symbols and warnings, skipped symbols included as warnings.
    pub table: SymbolTable,
}

/// What a batch run produced. One file failing never stops the others.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files that failed, with their error.
    pub failures: Vec<(PathBuf, Error)>,
    /// Files that succeeded.
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Whether any file failed.
    pub const fn has_failures(&self) -> bool {
        return !self.failures.is_empty();
    }
}

/// Process one source file: parse, slice, catalog and map it.
///
/// Nothing is written when `options.dry_run` is set or when any step fails.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage`, `Error::UnreadableSource`,
/// `Error::FileTooLarge` or `Error::ParseFailed` for an unprocessable file,
/// `Error::EmptyMapRejected` when there are no fragments and empty maps are
/// not allowed, and `Error::Io`/`Error::Json` when writing fails.
pub fn run_file(
    root: &Path,
    source_path: &Path,
    layout: &OutputLayout,
    options: RunOptions,
) -> Result<FileReport, Error> {
    let source_path = normalize_path(source_path);
    let frontend = TreeSitterFrontEnd::for_path(&source_path)?;
    tracing::debug!(
        file = %source_path.display(),
        language = frontend.language_name(),
        "reading"
    );
    let lines = reader::read_lines(&root.join(&source_path), options.max_file_bytes)?;
    let table = frontend.parse_lines(&source_path, &lines)?;
    return generate_from_table(table, &lines, layout, options);
}

/// Slice, catalog and map an already parsed file.
///
/// Skipped symbols become warnings on `table` before the catalog is rendered.
fn generate_from_table(
    mut table: SymbolTable,
    lines: &SourceLines,
    layout: &OutputLayout,
    options: RunOptions,
) -> Result<FileReport, Error> {
    let source_path = table.source_path().to_path_buf();
    let outcome = parts::plan(table.symbols(), lines);
    for warning in outcome.skipped_warnings() {
        table.push_warning(warning);
    }

    let map_entries = match map::render(&outcome.fragments, &layout.map_path) {
        Ok(_) => map::entries(&outcome.fragments),
        Err(e @ Error::EmptyMapRejected { .. }) if options.allow_empty_map => {
            tracing::warn!(file = %source_path.display(), "{e}; continuing without a map");
            Vec::new()
        },
        Err(e) => return Err(e),
    };

    if options.dry_run {
        tracing::info!(
            file = %source_path.display(),
            fragments = outcome.fragments.len(),
            "dry run"
        );
    } else {
        parts::write(&outcome, &layout.output_dir)?;
        index::generate(&table, lines, &layout.index_path)?;
        if !map_entries.is_empty() {
            map::generate(&outcome.fragments, &layout.map_path)?;
        }
        tracing::info!(
            file = %source_path.display(),
            fragments = outcome.fragments.len(),
            warnings = table.warnings().len(),
            "generated"
        );
    }

    return Ok(FileReport {
        layout: layout.clone(),
        map_entries,
        outcome,
        table,
    });
}

/// Process every supported file under `root` into `output_dir`.
///
/// Files are handled one after another; a failure is recorded and the
/// batch moves on.
pub fn run_batch(
    root: &Path,
    config: &Config,
    output_dir: &Path,
    options: RunOptions,
) -> BatchReport {
    let mut report = BatchReport::default();
    for source_path in scanner::scan(root, config, output_dir) {
        let layout = OutputLayout::batch(output_dir, &source_path);
        match run_file(root, &source_path, &layout, options) {
            Ok(file) => report.files.push(file),
            Err(e) => {
                tracing::error!(file = %source_path.display(), "{e}");
                report.failures.push((source_path, e));
            },
        }
    }

    tracing::info!(
        succeeded = report.files.len(),
        failed = report.failures.len(),
        "batch finished"
    );
    return report;
}

/// Source path as a relative path that cannot climb out of its parent directory.
fn mirrored(source_path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in normalize_path(source_path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => out.push("%2E%2E"),
            Component::CurDir | Component::Prefix(_) | Component::RootDir => {},
        }
    }
    return out;
}

/// `path` with `suffix` appended to its final component (`a/b.py` to `a/b.py.md`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    return PathBuf::from(raw);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::types::{Symbol, SymbolKind, WarningKind};

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn batch_layout_mirrors_source_path() {
        let layout = OutputLayout::batch(Path::new("out"), Path::new("src/app.py"));
        assert_eq!(layout.index_path, PathBuf::from("out/index/src/app.py.md"));
        assert_eq!(layout.map_path, PathBuf::from("out/map/src/app.py.json"));

        let escaped = OutputLayout::batch(Path::new("out"), Path::new("../x.py"));
        assert_eq!(escaped.index_path, PathBuf::from("out/index/%2E%2E/x.py.md"));
    }

    #[test]
    fn single_file_run_writes_three_kinds_of_output() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "app.py",
            "def f():\n    return 1\n\nclass C:\n    def m(self):\n        pass\n",
        );
        let out = dir.path().join("out");

        let layout = OutputLayout::single(&out);
        let report =
            run_file(dir.path(), Path::new("app.py"), &layout, RunOptions::default()).unwrap();
        assert_eq!(report.map_entries.len(), 3);
        assert!(out.join("INDEX.md").is_file(), "index missing");
        assert!(out.join("MAP.json").is_file(), "map missing");
        assert!(out.join("parts/app/C.m.py").is_file(), "fragment missing");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.py", "def f():\n    return 1\n");
        let out = dir.path().join("out");
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let layout = OutputLayout::single(&out);
        let report = run_file(dir.path(), Path::new("app.py"), &layout, options).unwrap();
        assert_eq!(report.outcome.fragments.len(), 1);
        assert!(!out.exists(), "dry run created the output root");
    }

    #[test]
    fn empty_map_is_fatal_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.py", "# nothing here\n");
        let out = dir.path().join("out");
        let layout = OutputLayout::single(&out);

        let options = RunOptions::default();
        let err = run_file(dir.path(), Path::new("empty.py"), &layout, options).unwrap_err();
        assert!(matches!(err, Error::EmptyMapRejected { .. }), "got {err:?}");
        assert!(!out.exists(), "rejected run wrote output");

        let options = RunOptions {
            allow_empty_map: true,
            ..RunOptions::default()
        };
        let report = run_file(dir.path(), Path::new("empty.py"), &layout, options).unwrap();
        assert!(report.map_entries.is_empty(), "no entries expected");
        assert!(out.join("INDEX.md").is_file(), "index missing");
        assert!(!out.join("MAP.json").exists(), "empty map was written");
    }

    #[test]
    fn batch_continues_past_failing_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/good.py", "def ok():\n    pass\n");
        write(dir.path(), "src/bad.py", "\u{0}binary\n");
        write(dir.path(), "src/Other.java", "class Other {\n  void run() {}\n}\n");
        let out = dir.path().join("out");

        let report = run_batch(dir.path(), &Config::default(), &out, RunOptions::default());
        assert!(report.has_failures(), "bad.py should fail");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, PathBuf::from("src/bad.py"));
        assert_eq!(report.files.len(), 2);
        assert!(out.join("index/src/good.py.md").is_file(), "good.py index missing");
        assert!(out.join("map/src/Other.java.json").is_file(), "Other.java map missing");
        assert!(
            out.join("parts/src/Other/Other.run.java").is_file(),
            "Other.run fragment missing"
        );
    }

    #[test]
    fn second_batch_into_absolute_output_processes_the_same_sources() {
        let cwd = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir_in(&cwd).unwrap();
        let root = dir.path().strip_prefix(&cwd).unwrap();
        write(root, "src/app.py", "def f():\n    pass\n");
        let out = cwd.join(root).join("out");

        let sources = |report: &BatchReport| -> Vec<PathBuf> {
            report.files.iter().map(|f| f.table.source_path().to_path_buf()).collect()
        };
        let first = run_batch(root, &Config::default(), &out, RunOptions::default());
        let second = run_batch(root, &Config::default(), &out, RunOptions::default());
        assert_eq!(sources(&first), [PathBuf::from("src/app.py")]);
        assert_eq!(sources(&second), sources(&first));
        assert!(!out.join("parts/out").exists(), "output root was sliced");
    }

    fn symbol(qualified_name: &str, start_line: usize, end_line: usize) -> Symbol {
        Symbol {
            calls: BTreeSet::new(),
            end_line,
            kind: SymbolKind::Function,
            name: qualified_name.to_string(),
            parent: None,
            qualified_name: qualified_name.to_string(),
            references: BTreeSet::new(),
            source_path: PathBuf::from("app.py"),
            start_line,
        }
    }

    #[test]
    fn skipped_symbols_reach_the_written_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let lines = SourceLines::from_text("def f():\n    pass\n");
        let mut table = SymbolTable::new(Path::new("app.py"), 2);
        table.insert(symbol("f", 1, 2));
        table.insert(symbol("ghost", 5, 9));
        table.insert(symbol("phantom", 5, 7));

        let layout = OutputLayout::single(&out);
        let report = generate_from_table(table, &lines, &layout, RunOptions::default()).unwrap();
        assert_eq!(report.outcome.fragments.len(), 1);
        assert_eq!(report.map_entries.len(), 1);
        let skipped: Vec<_> = report
            .table
            .warnings()
            .iter()
            .filter(|w| w.kind == WarningKind::SkippedSymbol)
            .collect();
        assert_eq!(skipped.len(), 2, "{:?}", report.table.warnings());

        let index = std::fs::read_to_string(out.join("INDEX.md")).unwrap();
        assert!(index.contains("- Warnings: 2\n"), "index:\n{index}");
        assert!(index.contains("- line 5 (skipped-symbol): skipped `ghost`"), "index:\n{index}");
        assert!(index.contains("- line 5 (skipped-symbol): skipped `phantom`"), "index:\n{index}");
        assert!(
            index.contains("- `ghost` function, lines 5-9 (skipped: range outside source)\n"),
            "index:\n{index}"
        );
        assert!(!out.join("parts/app/ghost.py").exists(), "skipped symbol was written");
    }
}
