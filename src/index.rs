//! Human-readable catalog of one file's symbols and warnings.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;
use crate::reader::SourceLines;
use crate::slicer;
use crate::symbols::SymbolTable;
use crate::types::Symbol;

/// Heading of the section holding top-level symbols.
const MODULE_SCOPE: &str = "<module>";

/// Symbols grouped by the scope that encloses them.
struct Scopes<'a> {
    /// Members of each named scope, ordered for display.
    members: HashMap<&'a str, Vec<&'a Symbol>>,
    /// Top-level symbols, ordered for display.
    module: Vec<&'a Symbol>,
}

impl<'a> Scopes<'a> {
    /// Group `symbols` by parent and order every group.
    fn build(symbols: &'a [Symbol]) -> Self {
        let mut members: HashMap<&str, Vec<&Symbol>> = HashMap::new();
        let mut module = Vec::new();
        for symbol in symbols {
            match &symbol.parent {
                Some(parent) => members.entry(parent.as_str()).or_default().push(symbol),
                None => module.push(symbol),
            }
        }

        sort_siblings(&mut module);
        for group in members.values_mut() {
            sort_siblings(group);
        }
        return Self { members, module };
    }

    /// Depth-first list of `(scope, members)` below `symbols`, skipping scopes without members.
    fn descend(&self, symbols: &[&'a Symbol], out: &mut Vec<(&'a str, Vec<&'a Symbol>)>) {
        for &symbol in symbols {
            let scope = symbol.qualified_name.as_str();
            if let Some(children) = self.members.get(scope) {
                out.push((scope, children.clone()));
                self.descend(children, out);
            }
        }
    }

    /// All sections: module scope, declared scopes depth-first, then external scopes.
    fn sections(&self, symbols: &'a [Symbol]) -> Vec<(&'a str, Vec<&'a Symbol>)> {
        let mut out = vec![(MODULE_SCOPE, self.module.clone())];
        self.descend(&self.module, &mut out);

        let declared: HashSet<&str> =
            symbols.iter().map(|s| return s.qualified_name.as_str()).collect();
        let mut external_seen = HashSet::new();
        for symbol in symbols {
            let Some(parent) = symbol.parent.as_deref() else {
                continue;
            };
            if declared.contains(parent) || !external_seen.insert(parent) {
                continue;
            }
            if let Some(children) = self.members.get(parent) {
                out.push((parent, children.clone()));
                self.descend(children, &mut out);
            }
        }
        return out;
    }
}

/// Render the catalog for one file.
///
/// Deterministic: identical tables and lines always render identical text.
pub fn render(table: &SymbolTable, lines: &SourceLines) -> String {
    let source = slicer::to_slash(table.source_path());
    let mut out = String::new();

    let _ = writeln!(out, "# code2map index: `{source}`");
    out.push('\n');
    let _ = writeln!(out, "- Source: `{source}`");
    let _ = writeln!(out, "- Total lines: {}", table.line_count());
    let _ = writeln!(out, "- Symbols: {}", table.symbols().len());
    let _ = writeln!(out, "- Warnings: {}", table.warnings().len());

    out.push_str("\n## Symbols\n");
    let scopes = Scopes::build(table.symbols());
    for (scope, members) in scopes.sections(table.symbols()) {
        let _ = write!(out, "\n### `{scope}`\n\n");
        if members.is_empty() {
            out.push_str("No symbols.\n");
        }
        for symbol in members {
            render_symbol_line(&mut out, symbol, lines);
        }
    }

    out.push_str("\n## Warnings\n\n");
    if table.warnings().is_empty() {
        out.push_str("None.\n");
    }
    for warning in table.warnings() {
        let kind = warning.kind.label();
        match warning.line {
            Some(line) => {
                let _ = writeln!(out, "- line {line} ({kind}): {}", warning.message);
            },
            None => {
                let _ = writeln!(out, "- unknown line ({kind}): {}", warning.message);
            },
        }
    }

    return out;
}

/// Render the catalog and write it to `index_path`, creating parent directories.
///
/// # Errors
///
/// Returns `Error::Io` if the directory or file cannot be written.
pub fn generate(table: &SymbolTable, lines: &SourceLines, index_path: &Path) -> Result<(), Error> {
    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(index_path, render(table, lines))?;
    tracing::info!(path = %index_path.display(), "wrote index");
    return Ok(());
}

/// One catalog line: name, kind, range and fragment path, or a skipped note.
fn render_symbol_line(out: &mut String, symbol: &Symbol, lines: &SourceLines) {
    let name = &symbol.qualified_name;
    let kind = symbol.kind;
    let (start, end) = (symbol.start_line, symbol.end_line);
    if lines.range(start, end).is_some() {
        let path = slicer::to_slash(&slicer::output_path(&symbol.source_path, name));
        let _ = writeln!(out, "- `{name}` {kind}, lines {start}-{end} -> `{path}`");
    } else {
        let _ = writeln!(
            out,
            "- `{name}` {kind}, lines {start}-{end} (skipped: range outside source)"
        );
    }
}

/// Start line ascending, wider range first on ties, then appearance order.
fn sort_siblings(group: &mut [&Symbol]) {
    group.sort_by_key(|s| return (s.start_line, Reverse(s.end_line)));
}
