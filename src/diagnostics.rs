use std::fmt::Write as _;
use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;

/// ANSI bold, used for markdown headings on stderr.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it. Readable by both humans and LLM agents.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::EmptyMapRejected { path } => render_empty_map(path),
        Error::FileTooLarge { file, max_bytes, size_bytes } => {
            render_file_too_large(file, *size_bytes, *max_bytes)
        },
        Error::UnknownSymbol { map, suggestions, symbol } => {
            render_unknown_symbol(map, symbol, suggestions)
        },
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        Error::Io(_)
        | Error::Json(_)
        | Error::ParseFailed { .. }
        | Error::RangeOutOfBounds { .. }
        | Error::TomlDe(_)
        | Error::UnreadableSource { .. } => render_generic(e),
    };
}

/// Variants with a short what-happened block.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(inner) => format!("\
# Error: I/O

{inner}
"),

        Error::Json(inner) => format!("\
# Error: Invalid Map Document

{inner}

## Fix

Regenerate the map:

    code2map build <PATH>
"),

        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),

        Error::RangeOutOfBounds { end_line, file, line_count, start_line, symbol } => format!("\
# Error: Range Out Of Bounds

`{symbol}` claims lines {start_line}-{end_line} but `{}` has {line_count} lines.
", file.display()),

        Error::TomlDe(inner) => format!("\
# Error: Invalid TOML

{inner}

## Fix

Check `{CONFIG_FILE}`.
"),

        Error::UnreadableSource { path, reason } => format!("\
# Error: Unreadable Source

`{}` cannot be read as text: {reason}
", path.display()),

        Error::EmptyMapRejected { .. }
        | Error::FileTooLarge { .. }
        | Error::UnknownSymbol { .. }
        | Error::UnsupportedLanguage { .. } => format!("\
# Error

{e}
"),
    };
}

/// Diagnostic for a file without any slicable symbol.
fn render_empty_map(path: &Path) -> String {
    return format!("\
# Error: Empty Map

No symbols were sliced, so `{}` was not written.

## Fix

Accept files without symbols:

    code2map build <PATH> --allow-empty

Or set `allow_empty_map = true` in `{CONFIG_FILE}`.
", path.display());
}

/// Diagnostic for a source over the size limit.
fn render_file_too_large(file: &Path, size_bytes: u64, max_bytes: u64) -> String {
    return format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).

## Fix

Raise `max_file_bytes` in `{CONFIG_FILE}`.
", file.display());
}

/// Diagnostic for a lookup miss, with similar names when there are any.
fn render_unknown_symbol(map: &Path, symbol: &str, suggestions: &[String]) -> String {
    let mut out = format!("\
# Error: Symbol Not Found

Symbol `{symbol}` is not in `{}`.
", map.display());

    if let [only] = suggestions {
        let _ = write!(out, "\n## Did you mean `{only}`?\n\n");
        let _ = writeln!(out, "    code2map lookup {} {only}", map.display());
    } else if !suggestions.is_empty() {
        out.push_str("\n## Similar symbols\n\n");
        for s in suggestions {
            let _ = writeln!(out, "- `{s}`");
        }
    }

    return out;
}

/// Diagnostic listing the extensions that do have a front-end.
fn render_unsupported_language(ext: &str) -> String {
    return format!(
        "\
# Error: Unsupported Language

No front-end for `.{ext}` files.

## Supported extensions

- `.py`, `.pyi`: Python
- `.java`: Java
- `.rs`: Rust
- `.ts`, `.tsx`, `.js`, `.jsx`, `.mjs`, `.cjs`, `.mts`, `.cts`: TypeScript / JavaScript
- `.go`: Go
"
    );
}
