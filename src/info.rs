use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};

/// Output the comprehensive code2map reference document.
pub fn run(json: bool) {
    let root = PathBuf::from(".");
    let state = gather_state(&root);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

/// What the current directory's configuration looks like.
struct CurrentState {
    /// Whether `.code2map.toml` exists.
    config_found: bool,
    /// `Some(reason)` when the config exists but cannot be loaded.
    config_error: Option<String>,
    /// Effective output root.
    output_dir: PathBuf,
}

/// Inspect `root` for a config file and the output root it selects.
fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    return match Config::load(root) {
        Ok(config) => CurrentState {
            config_found,
            config_error: None,
            output_dir: config.output_dir,
        },
        Err(e) => CurrentState {
            config_found,
            config_error: Some(e.to_string()),
            output_dir: Config::default().output_dir,
        },
    };
}

// ── Markdown output ───────────────────────────────────────────────────

/// Full reference document as markdown.
fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

/// Static part of the reference document.
fn print_markdown_header(version: &str) {
    print!(
        "\
# code2map {version}

Slice source files into one fragment per symbol, with a catalog (INDEX) and a
machine-readable map (MAP) so reviewers and agents can read code piecemeal.

## Workflow

    code2map build <FILE>              Fragments, INDEX.md and MAP.json for one file
    code2map build <DIR>               Every supported file; index/ and map/ per source
    code2map build <PATH> --dry-run    Print planned fragment paths, write nothing
    code2map symbols <FILE>            List symbols and warnings
    code2map lookup <MAP> <SYMBOL>     Fragment path and range for one symbol

## Output Layout

    OUT/INDEX.md, OUT/MAP.json               single file
    OUT/index/<src>.md, OUT/map/<src>.json   directory
    OUT/parts/<dirs>/<stem>/<Owner.member>.<ext>

## Supported Languages

| Extension                          | Language   |
|------------------------------------|------------|
| .py .pyi                           | Python     |
| .java                              | Java       |
| .rs                                | Rust       |
| .ts .tsx .js .jsx .mjs .cjs .mts .cts | TypeScript |
| .go                                | Go         |

## Configuration ({CONFIG_FILE})

    output_dir = \"code2map-out\"       # output root
    include = [\"src/\"]                # only scan these paths
    exclude = [\"src/generated/\"]      # skip these paths
    max_file_bytes = 16777216         # larger files fail
    allow_empty_map = false           # tolerate files without symbols

## Current State

"
    );
}

/// Config file status and effective output root.
fn print_markdown_state(state: &CurrentState) {
    match (&state.config_error, state.config_found) {
        (Some(reason), _) => println!("Config:     {CONFIG_FILE} (invalid: {reason})"),
        (None, true) => println!("Config:     {CONFIG_FILE} (found)"),
        (None, false) => println!("Config:     {CONFIG_FILE} (not found)"),
    }
    println!("Output dir: {}", state.output_dir.display());
}

/// Exit code table.
fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success |
| 1    | Fatal error |
| 2    | Directory run finished, some files failed |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

/// Reference document as JSON.
#[derive(Serialize)]
struct InfoJson {
    /// Current directory state.
    current_state: StateJson,
    /// Exit code meanings.
    exit_codes: Vec<ExitCodeInfo>,
    /// Extensions per language.
    supported_languages: Vec<LanguageInfo>,
    /// Crate version.
    version: String,
}

/// One supported language.
#[derive(Serialize)]
struct LanguageInfo {
    /// Extensions with the leading dot.
    extensions: Vec<String>,
    /// Display name.
    language: String,
}

/// One exit code.
#[derive(Serialize)]
struct ExitCodeInfo {
    /// Process exit code.
    code: u8,
    /// What it means.
    meaning: String,
}

/// Current directory state.
#[derive(Serialize)]
struct StateJson {
    /// Whether `.code2map.toml` exists.
    config_found: bool,
    /// Load error, if any.
    config_error: Option<String>,
    /// Effective output root.
    output_dir: String,
}

/// Build a language entry from string slices.
fn language(name: &str, extensions: &[&str]) -> LanguageInfo {
    return LanguageInfo {
        extensions: extensions.iter().map(|e| return (*e).to_string()).collect(),
        language: name.to_string(),
    };
}

/// Print the JSON reference document.
fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config_found: state.config_found,
            config_error: state.config_error.clone(),
            output_dir: state.output_dir.display().to_string(),
        },
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success".to_string() },
            ExitCodeInfo { code: 1, meaning: "Fatal error".to_string() },
            ExitCodeInfo {
                code: 2,
                meaning: "Directory run finished, some files failed".to_string(),
            },
        ],
        supported_languages: vec![
            language("Python", &[".py", ".pyi"]),
            language("Java", &[".java"]),
            language("Rust", &[".rs"]),
            language("TypeScript", &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts"]),
            language("Go", &[".go"]),
        ],
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
