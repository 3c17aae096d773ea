/// Core domain types: symbols, warnings, fragments and map entries.
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Separator between an enclosing scope and one of its members (`Owner#member`).
pub const SCOPE_SEPARATOR: char = '#';

/// What sort of declaration a symbol is. Front-ends map their own node kinds
/// onto this closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Class-like scope: class, struct, enum, interface, trait, record.
    Class,
    /// Field or property declared in a class-like scope.
    Field,
    /// Free function.
    Function,
    /// Function declared inside (or attached to) a class-like scope.
    Method,
    /// Namespace-like scope: Rust `mod`, TypeScript `namespace`.
    Module,
    /// Anything else worth slicing: constants, type aliases, macros.
    Other,
}

impl SymbolKind {
    /// Lowercase label used in headers, the catalog and the map.
    pub const fn label(self) -> &'static str {
        return match self {
            SymbolKind::Class => "class",
            SymbolKind::Field => "field",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Module => "module",
            SymbolKind::Other => "other",
        };
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.label());
    }
}

/// A named, line-located unit of source code discovered by a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Names the body invokes or instantiates that are neither imported nor
    /// declared in the file (`ValueError`, `IllegalArgumentException`).
    pub calls: BTreeSet<String>,
    /// Last line of the declaration, 1-indexed, inclusive.
    pub end_line: usize,
    /// Declaration kind.
    pub kind: SymbolKind,
    /// Unqualified name as written in the source.
    pub name: String,
    /// Qualified name of the enclosing scope. The scope may live in another file.
    pub parent: Option<String>,
    /// Unique name within the file, scopes joined with [`SCOPE_SEPARATOR`].
    pub qualified_name: String,
    /// Full import paths of imported names the body mentions.
    pub references: BTreeSet<String>,
    /// Originating file, relative to the analysis root.
    pub source_path: PathBuf,
    /// First line of the declaration, 1-indexed.
    pub start_line: usize,
}

impl Symbol {
    /// Whether the symbol has neither import references nor external calls.
    pub fn has_no_notes(&self) -> bool {
        return self.references.is_empty() && self.calls.is_empty();
    }
}

/// Category of a non-fatal anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WarningKind {
    /// The file declares or carries an encoding marker the reader had to work around.
    Encoding,
    /// A symbol was reported with a line range outside the file and was not sliced.
    SkippedSymbol,
    /// The parser had to invent a missing token to close a block.
    Truncated,
    /// The parser could not make sense of a construct.
    Unparsable,
}

impl WarningKind {
    /// Short label used in the catalog.
    pub const fn label(self) -> &'static str {
        return match self {
            WarningKind::Encoding => "encoding",
            WarningKind::SkippedSymbol => "skipped-symbol",
            WarningKind::Truncated => "truncated",
            WarningKind::Unparsable => "unparsable",
        };
    }
}

/// A recorded, non-fatal parse anomaly. Processing of the file continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Category of the anomaly.
    pub kind: WarningKind,
    /// 1-indexed line, when known.
    pub line: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

/// The externally consumable slice of one symbol.
/// Built fresh on every run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Generated metadata block, one labeled line per field.
    pub header: String,
    /// Path relative to the output root. Pure function of source path and qualified name.
    pub output_path: PathBuf,
    /// The symbol this fragment slices.
    pub symbol: Symbol,
    /// The original source lines, terminators included, byte-for-byte.
    pub text: String,
}

impl Fragment {
    /// On-disk representation: header followed by the verbatim slice.
    pub fn contents(&self) -> String {
        let mut out = String::with_capacity(self.header.len().saturating_add(self.text.len()));
        out.push_str(&self.header);
        out.push_str(&self.text);
        return out;
    }
}

/// One record of the aggregate map: symbol identity to fragment location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// Last line of the symbol.
    pub end_line: usize,
    /// Declaration kind.
    pub kind: SymbolKind,
    /// Fragment path relative to the output root, `/`-separated.
    pub output_path: String,
    /// Key of the entry.
    pub qualified_name: String,
    /// First line of the symbol.
    pub start_line: usize,
}
