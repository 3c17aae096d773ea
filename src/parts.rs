//! Parts generation: one fragment file per symbol under the output root.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;
use crate::reader::SourceLines;
use crate::slicer;
use crate::types::{Fragment, Symbol, Warning, WarningKind};

/// Result of slicing every symbol of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsOutcome {
    /// Fragments in symbol order.
    pub fragments: Vec<Fragment>,
    /// Symbols whose range did not fit the source, with the reason.
    pub skipped: Vec<(Symbol, String)>,
}

impl PartsOutcome {
    /// Pairs of qualified names whose fragment paths differ only by ASCII case.
    ///
    /// Both fragments are kept, but on a case-insensitive filesystem the later
    /// one overwrites the earlier.
    pub fn case_clashes(&self) -> Vec<(String, String)> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        let mut clashes = Vec::new();
        for fragment in &self.fragments {
            let folded = slicer::to_slash(&fragment.output_path).to_ascii_lowercase();
            let name = fragment.symbol.qualified_name.as_str();
            match seen.get(folded.as_str()) {
                Some(&earlier) => clashes.push((earlier.to_string(), name.to_string())),
                None => {
                    seen.insert(folded, name);
                },
            }
        }
        return clashes;
    }

    /// The skipped symbols as `skipped-symbol` warnings, ready to append to a table.
    pub fn skipped_warnings(&self) -> Vec<Warning> {
        return self
            .skipped
            .iter()
            .map(|(symbol, reason)| {
                return Warning {
                    kind: WarningKind::SkippedSymbol,
                    line: (symbol.start_line > 0).then_some(symbol.start_line),
                    message: format!("skipped `{}`: {reason}", symbol.qualified_name),
                };
            })
            .collect();
    }
}

/// Slice every symbol without touching the filesystem.
///
/// An out-of-range symbol is recorded in `skipped`; its siblings are unaffected.
pub fn plan(symbols: &[Symbol], lines: &SourceLines) -> PartsOutcome {
    let mut outcome = PartsOutcome {
        fragments: Vec::with_capacity(symbols.len()),
        skipped: Vec::new(),
    };

    for symbol in symbols {
        match slicer::slice(symbol, lines) {
            Ok(fragment) => outcome.fragments.push(fragment),
            Err(e) => {
                tracing::warn!(symbol = %symbol.qualified_name, "{e}");
                outcome.skipped.push((symbol.clone(), e.to_string()));
            },
        }
    }

    for (earlier, later) in outcome.case_clashes() {
        tracing::warn!(%earlier, %later, "fragment paths differ only by case");
    }
    return outcome;
}

/// Plan all fragments, then write them below `output_dir` unless `dry_run`.
///
/// Existing fragment files are replaced. The returned outcome is the same
/// whether or not anything was written.
///
/// # Errors
///
/// Returns `Error::Io` if a directory cannot be created or a fragment cannot be written.
pub fn generate(
    symbols: &[Symbol],
    lines: &SourceLines,
    output_dir: &Path,
    dry_run: bool,
) -> Result<PartsOutcome, Error> {
    let outcome = plan(symbols, lines);
    if dry_run {
        tracing::info!(fragments = outcome.fragments.len(), "dry run, no fragments written");
        return Ok(outcome);
    }

    write(&outcome, output_dir)?;
    tracing::info!(
        fragments = outcome.fragments.len(),
        skipped = outcome.skipped.len(),
        dir = %output_dir.display(),
        "wrote fragments"
    );
    return Ok(outcome);
}

/// Write each planned fragment to `output_dir/<output_path>`, creating parent directories.
///
/// # Errors
///
/// Returns `Error::Io` if a directory cannot be created or a fragment cannot be written.
pub fn write(outcome: &PartsOutcome, output_dir: &Path) -> Result<(), Error> {
    for fragment in &outcome.fragments {
        let target = output_dir.join(&fragment.output_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, fragment.contents())?;
        tracing::debug!(path = %target.display(), "wrote fragment");
    }
    return Ok(());
}
