//! Language front-ends: turn source lines into a [`SymbolTable`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::{Node, Parser, Tree};

use crate::collector::{self, Declaration, Owner};
use crate::error::Error;
use crate::grammar::Language;
use crate::reader::{self, SourceLines};
use crate::references;
use crate::symbols::SymbolTable;
use crate::types::{SCOPE_SEPARATOR, Symbol, Warning, WarningKind};

/// Longest construct excerpt quoted in an unparsable-construct warning.
const SNIPPET_CHARS: usize = 60;

/// PEP 263 coding declaration.
static CODING_COOKIE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    return Regex::new(r"^[ \t\f]*#.*?coding[:=][ \t]*([-\w.]+)").ok();
});

/// The capability every language front-end provides.
///
/// Implementations must not fail on isolated malformed constructs: they
/// record a [`Warning`] and keep scanning. Symbols come back in appearance
/// order, outer before inner, with 1-indexed inclusive line ranges.
pub trait FrontEnd {
    /// Name of the language this front-end understands.
    fn language_name(&self) -> &'static str;

    /// Parse `root/source_path` from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnreadableSource` or `Error::FileTooLarge` when the file
    /// cannot be read, and whatever [`FrontEnd::parse_lines`] returns.
    fn parse(&self, root: &Path, source_path: &Path, max_bytes: u64) -> Result<SymbolTable, Error> {
        let lines = reader::read_lines(&root.join(source_path), max_bytes)?;
        return self.parse_lines(source_path, &lines);
    }

    /// Parse already-read lines of `source_path`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the whole file is unprocessable.
    fn parse_lines(&self, source_path: &Path, lines: &SourceLines) -> Result<SymbolTable, Error>;
}

/// Front-end backed by a tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSitterFrontEnd {
    /// Language whose grammar and declaration rules are used.
    language: Language,
}

impl TreeSitterFrontEnd {
    /// Front-end for the language of `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown extensions.
    pub fn for_path(path: &Path) -> Result<Self, Error> {
        return Ok(Self::new(Language::for_path(path)?));
    }

    /// Front-end for `language`.
    pub const fn new(language: Language) -> Self {
        return Self { language };
    }
}

impl FrontEnd for TreeSitterFrontEnd {
    fn language_name(&self) -> &'static str {
        return self.language.name();
    }

    fn parse_lines(&self, source_path: &Path, lines: &SourceLines) -> Result<SymbolTable, Error> {
        let source = lines.text();
        let tree = parse_source(source_path, &source, self.language)?;
        let root = tree.root_node();

        let mut table = SymbolTable::new(source_path, lines.len());
        record_encoding_warnings(self.language, lines, &mut table);
        record_syntax_warnings(root, &source, &mut table);

        let declarations = collector::collect_declarations(self.language, root, &source);
        let imports = references::import_bindings(self.language, root, &source);
        let local_names: HashSet<&str> =
            declarations.iter().map(|d| return d.name.as_str()).collect();

        // Stored (possibly renamed) qualified name of each declaration, by index.
        let mut stored: Vec<String> = Vec::with_capacity(declarations.len());
        for declaration in &declarations {
            let parent = parent_name(declaration, &stored);
            let qualified_name = match &parent {
                Some(scope) => format!("{scope}{SCOPE_SEPARATOR}{}", declaration.name),
                None => declaration.name.clone(),
            };
            let notes = references::collect_notes(
                self.language,
                declaration.node,
                &source,
                &imports,
                &local_names,
            );

            let name = table.insert(Symbol {
                calls: notes.calls,
                end_line: declaration.end_line,
                kind: declaration.kind,
                name: declaration.name.clone(),
                parent,
                qualified_name,
                references: notes.references,
                source_path: source_path.to_path_buf(),
                start_line: declaration.start_line,
            });
            stored.push(name);
        }

        tracing::debug!(
            file = %source_path.display(),
            language = self.language.name(),
            symbols = table.symbols().len(),
            warnings = table.warnings().len(),
            "parsed"
        );
        return Ok(table);
    }
}

/// Qualified name of a declaration's enclosing scope.
fn parent_name(declaration: &Declaration<'_>, stored: &[String]) -> Option<String> {
    return match declaration.owner.as_ref()? {
        Owner::Declared(index) => stored.get(*index).cloned(),
        Owner::External { name, within } => match within.and_then(|i| return stored.get(i)) {
            Some(scope) => Some(format!("{scope}{SCOPE_SEPARATOR}{name}")),
            None => Some(name.clone()),
        },
    };
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
fn parse_source(file_path: &Path, source: &str, language: Language) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter())
        .map_err(|e| {
            return Error::ParseFailed {
                file: file_path.to_path_buf(),
                reason: e.to_string(),
            };
        })?;

    return parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: file_path.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Note a stripped byte order mark and, for Python, a non-UTF-8 coding declaration.
fn record_encoding_warnings(language: Language, lines: &SourceLines, table: &mut SymbolTable) {
    if lines.had_bom() {
        table.push_warning(Warning {
            kind: WarningKind::Encoding,
            line: Some(1),
            message: "UTF-8 byte order mark stripped".to_string(),
        });
    }

    if language != Language::Python {
        return;
    }
    let Some(pattern) = CODING_COOKIE.as_ref() else {
        return;
    };
    // The declaration only counts on the first two lines.
    for number in 1..=2 {
        let Some(line) = lines.get(number) else {
            break;
        };
        let Some(encoding) = pattern.captures(line).and_then(|c| return c.get(1)) else {
            continue;
        };
        let declared = encoding.as_str();
        let normalized = declared.to_ascii_lowercase().replace('_', "-");
        if !matches!(normalized.as_str(), "ascii" | "us-ascii" | "utf-8" | "utf8") {
            table.push_warning(Warning {
                kind: WarningKind::Encoding,
                line: Some(number),
                message: format!("file declares `{declared}` encoding; decoded as UTF-8"),
            });
        }
        break;
    }
}

/// Whether a syntax warning was already recorded on `line`.
fn has_syntax_warning(table: &SymbolTable, line: usize) -> bool {
    return table.warnings().iter().any(|w| {
        return w.line == Some(line)
            && matches!(w.kind, WarningKind::Truncated | WarningKind::Unparsable);
    });
}

/// Record one warning per line holding unparsable (`ERROR`) or invented
/// (`MISSING`) nodes. Subtrees without errors are not entered.
fn record_syntax_warnings(node: Node<'_>, source: &str, table: &mut SymbolTable) {
    let line = node.start_position().row.saturating_add(1);
    let flagged = node.is_error() || node.is_missing();
    if flagged && has_syntax_warning(table, line) {
        return;
    }

    if node.is_error() {
        let text = collector::node_text(node, source).unwrap_or("");
        let snippet: String = text
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .chars()
            .take(SNIPPET_CHARS)
            .collect();
        let message = if snippet.is_empty() {
            "unparsable construct".to_string()
        } else {
            format!("unparsable construct `{snippet}`")
        };
        table.push_warning(Warning {
            kind: WarningKind::Unparsable,
            line: Some(line),
            message,
        });
        return;
    }

    if node.is_missing() {
        table.push_warning(Warning {
            kind: WarningKind::Truncated,
            line: Some(line),
            message: format!("truncated block: expected `{}`", node.kind()),
        });
        return;
    }

    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        record_syntax_warnings(child, source, table);
    }
}
