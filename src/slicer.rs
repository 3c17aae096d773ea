//! Fragment slicing: verbatim line ranges plus a provenance header, and the
//! deterministic on-disk location of each fragment.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use crate::error::Error;
use crate::grammar;
use crate::reader::SourceLines;
use crate::scanner::normalize_path;
use crate::types::{Fragment, SCOPE_SEPARATOR, Symbol};

/// Directory under the output root that holds every fragment.
pub const PARTS_DIR: &str = "parts";

/// Slice one symbol out of its source lines.
///
/// # Errors
///
/// Returns `Error::RangeOutOfBounds` if the symbol's range is empty, starts
/// at 0 or runs past the last line.
pub fn slice(symbol: &Symbol, lines: &SourceLines) -> Result<Fragment, Error> {
    let Some(range) = lines.range(symbol.start_line, symbol.end_line) else {
        return Err(Error::RangeOutOfBounds {
            end_line: symbol.end_line,
            file: symbol.source_path.clone(),
            line_count: lines.len(),
            start_line: symbol.start_line,
            symbol: symbol.qualified_name.clone(),
        });
    };

    return Ok(Fragment {
        header: header(symbol),
        output_path: output_path(&symbol.source_path, &symbol.qualified_name),
        symbol: symbol.clone(),
        text: range.concat(),
    });
}

/// The labeled metadata block prepended to a fragment, one comment line per field.
pub fn header(symbol: &Symbol) -> String {
    let comment = grammar::line_comment_for_path(&symbol.source_path);
    let mut out = String::new();
    let _ = writeln!(out, "{comment} code2map fragment (non-buildable)");
    let _ = writeln!(out, "{comment} original: {}", to_slash(&symbol.source_path));
    let _ = writeln!(out, "{comment} lines: {}-{}", symbol.start_line, symbol.end_line);
    let _ = writeln!(out, "{comment} symbol: {}", symbol.qualified_name);
    let _ = writeln!(out, "{comment} notes: {}", notes(symbol));
    return out;
}

/// `references a, b; calls C`, either half omitted when empty, or `none`.
pub fn notes(symbol: &Symbol) -> String {
    if symbol.has_no_notes() {
        return "none".to_string();
    }

    let mut parts = Vec::new();
    if !symbol.references.is_empty() {
        let listed: Vec<&str> = symbol.references.iter().map(String::as_str).collect();
        parts.push(format!("references {}", listed.join(", ")));
    }
    if !symbol.calls.is_empty() {
        let listed: Vec<&str> = symbol.calls.iter().map(String::as_str).collect();
        parts.push(format!("calls {}", listed.join(", ")));
    }
    return parts.join("; ");
}

/// Where a symbol's fragment lives, relative to the output root:
/// `parts/<source dirs>/<source stem>/<encoded name>.<source extension>`.
///
/// Pure in `(source_path, qualified_name)`. The encoding is reversible, so
/// two distinct symbols never share a path.
pub fn output_path(source_path: &Path, qualified_name: &str) -> PathBuf {
    let normalized = normalize_path(source_path);
    let mut path = PathBuf::from(PARTS_DIR);

    if let Some(parent) = normalized.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(part) => {
                    path.push(escape_path_component(&part.to_string_lossy()));
                },
                Component::ParentDir => path.push("%2E%2E"),
                Component::CurDir | Component::Prefix(_) | Component::RootDir => {},
            }
        }
    }
    if let Some(stem) = normalized.file_stem() {
        path.push(escape_path_component(&stem.to_string_lossy()));
    }

    let mut file_name = escape_symbol_name(qualified_name);
    if let Some(ext) = normalized.extension() {
        file_name.push('.');
        file_name.push_str(&escape_path_component(&ext.to_string_lossy()));
    }
    path.push(file_name);
    return path;
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| return c.as_os_str().to_string_lossy().into_owned())
        .collect();
    return parts.join("/");
}

/// Characters copied into file names as-is.
fn is_plain(c: char) -> bool {
    return c.is_alphanumeric() || matches!(c, '_' | '-' | '~' | '$');
}

/// Percent-encode every byte of `c`.
fn push_escaped(out: &mut String, c: char) {
    let mut buf = [0_u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        let _ = write!(out, "%{byte:02X}");
    }
}

/// Encode a directory or stem component; dots are kept.
fn escape_path_component(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        if is_plain(c) || c == '.' {
            out.push(c);
        } else {
            push_escaped(&mut out, c);
        }
    }
    return out;
}

/// Encode a qualified name: the scope separator becomes `.`, literal dots
/// and every other unsafe character are percent-encoded.
fn escape_symbol_name(qualified_name: &str) -> String {
    let mut out = String::with_capacity(qualified_name.len());
    for c in qualified_name.chars() {
        if c == SCOPE_SEPARATOR {
            out.push('.');
        } else if is_plain(c) {
            out.push(c);
        } else {
            push_escaped(&mut out, c);
        }
    }
    return out;
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use super::*;
    use crate::types::SymbolKind;

    fn symbol(path: &str, qualified_name: &str, start_line: usize, end_line: usize) -> Symbol {
        Symbol {
            calls: BTreeSet::new(),
            end_line,
            kind: SymbolKind::Method,
            name: qualified_name.rsplit('#').next().unwrap().to_string(),
            parent: None,
            qualified_name: qualified_name.to_string(),
            references: BTreeSet::new(),
            source_path: PathBuf::from(path),
            start_line,
        }
    }

    #[test]
    fn text_is_verbatim_including_indentation_and_crlf() {
        let lines =
            SourceLines::from_text("class A:\r\n    def f(self):\r\n\t\treturn 1  \r\nx = 1\r\n");
        let fragment = slice(&symbol("a.py", "A#f", 2, 3), &lines).unwrap();
        assert_eq!(fragment.text, "    def f(self):\r\n\t\treturn 1  \r\n");
    }

    #[test]
    fn last_line_without_newline_is_kept_as_is() {
        let lines = SourceLines::from_text("a\nb");
        let fragment = slice(&symbol("a.py", "b", 2, 2), &lines).unwrap();
        assert_eq!(fragment.text, "b");
    }

    #[test]
    fn out_of_range_symbol_is_rejected() {
        let lines = SourceLines::from_text("a\nb\n");
        for (start, end) in [(0, 1), (2, 3), (2, 1)] {
            let err = slice(&symbol("a.py", "x", start, end), &lines).unwrap_err();
            assert!(
                matches!(err, Error::RangeOutOfBounds { line_count: 2, .. }),
                "({start}, {end}) gave {err:?}"
            );
        }
    }

    #[test]
    fn python_header_matches_fragment_format() {
        let mut s = symbol(
            "docs/user_management_service.py",
            "UserManagementService#_validate_age",
            223,
            225,
        );
        s.references = ["re", "typing.Optional"].iter().map(|r| r.to_string()).collect();
        s.calls = ["ValueError"].iter().map(|r| r.to_string()).collect();
        assert_eq!(
            header(&s),
            "\
# code2map fragment (non-buildable)
# original: docs/user_management_service.py
# lines: 223-225
# symbol: UserManagementService#_validate_age
# notes: references re, typing.Optional; calls ValueError
"
        );
    }

    #[test]
    fn java_header_uses_line_comments() {
        let s = symbol("src/Main.java", "Main#run", 1, 2);
        let text = header(&s);
        assert!(text.starts_with("// code2map fragment (non-buildable)\n"));
        assert!(text.ends_with("// notes: none\n"));
    }

    #[test]
    fn output_path_mirrors_source_path() {
        assert_eq!(
            output_path(Path::new("src/app/service.py"), "Service#run"),
            PathBuf::from("parts/src/app/service/Service.run.py")
        );
        assert_eq!(
            output_path(Path::new("./lib.rs"), "Config"),
            PathBuf::from("parts/lib/Config.rs")
        );
    }

    #[test]
    fn output_path_escapes_unsafe_characters() {
        assert_eq!(
            output_path(Path::new("a.py"), "weird.name/x"),
            PathBuf::from("parts/a/weird%2Ename%2Fx.py")
        );
        assert_eq!(
            output_path(Path::new("../up.py"), "f"),
            PathBuf::from("parts/%2E%2E/up/f.py")
        );
    }

    #[test]
    fn output_path_is_injective_on_lookalike_names() {
        let names = [
            "Owner#_x", "Owner_#x", "Owner#x", "Owner.x", "Owner#x~2", "Owner#x#y", "Owner#x.y",
        ];
        let paths: HashSet<PathBuf> =
            names.iter().map(|n| output_path(Path::new("m.py"), n)).collect();
        assert_eq!(paths.len(), names.len());
    }

    #[test]
    fn same_stem_different_extension_do_not_collide() {
        assert_ne!(
            output_path(Path::new("app.py"), "main"),
            output_path(Path::new("app.rs"), "main")
        );
    }

    #[test]
    fn slash_rendering() {
        assert_eq!(to_slash(Path::new("parts/a/b.py")), "parts/a/b.py");
    }
}
