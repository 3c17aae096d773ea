//! Per-file symbol table: the structure every generator reads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::types::{Symbol, Warning, WarningKind};

/// Symbols and warnings discovered in one source file.
///
/// Each run builds its own table. Qualified names are unique: inserting a
/// duplicate renames it with a `~N` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    /// Number of lines in the source file.
    line_count: usize,
    /// Qualified names already taken.
    names: HashSet<String>,
    /// Originating file, relative to the analysis root.
    source_path: PathBuf,
    /// Symbols in appearance order, outer before inner.
    symbols: Vec<Symbol>,
    /// Warnings in discovery order.
    warnings: Vec<Warning>,
}

impl SymbolTable {
    /// Append a symbol and return the qualified name it was stored under.
    ///
    /// If the name is taken, `~2`, `~3`, ... is appended until it is free.
    pub fn insert(&mut self, mut symbol: Symbol) -> String {
        if self.names.contains(&symbol.qualified_name) {
            let base = symbol.qualified_name.clone();
            let mut n = 2_usize;
            while self.names.contains(&format!("{base}~{n}")) {
                n = n.saturating_add(1);
            }
            symbol.qualified_name = format!("{base}~{n}");
            tracing::debug!(
                original = %base,
                renamed = %symbol.qualified_name,
                "duplicate symbol name"
            );
        }

        let stored = symbol.qualified_name.clone();
        self.names.insert(stored.clone());
        self.symbols.push(symbol);
        return stored;
    }

    /// Number of lines in the source file.
    pub const fn line_count(&self) -> usize {
        return self.line_count;
    }

    /// Create an empty table for `source_path`.
    pub fn new(source_path: &Path, line_count: usize) -> Self {
        return Self {
            line_count,
            names: HashSet::new(),
            source_path: source_path.to_path_buf(),
            symbols: Vec::new(),
            warnings: Vec::new(),
        };
    }

    /// Record a warning. A second warning of the same kind on the same known
    /// line is dropped so one broken construct yields one warning. Skipped
    /// symbols are always kept: each one names a different symbol.
    pub fn push_warning(&mut self, warning: Warning) {
        let duplicate = warning.line.is_some()
            && warning.kind != WarningKind::SkippedSymbol
            && self
                .warnings
                .iter()
                .any(|w| return w.kind == warning.kind && w.line == warning.line);
        if duplicate {
            return;
        }
        tracing::debug!(line = ?warning.line, kind = warning.kind.label(), "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Originating file, relative to the analysis root.
    pub fn source_path(&self) -> &Path {
        return &self.source_path;
    }

    /// Symbols in appearance order.
    pub fn symbols(&self) -> &[Symbol] {
        return &self.symbols;
    }

    /// Warnings in discovery order.
    pub fn warnings(&self) -> &[Warning] {
        return &self.warnings;
    }
}
