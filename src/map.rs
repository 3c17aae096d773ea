//! Machine-readable map: qualified name to fragment location.
//!
//! The document is a JSON object keyed by qualified name, in fragment order:
//!
//! ```json
//! {
//!   "Service#run": {
//!     "end_line": 9,
//!     "kind": "method",
//!     "output_path": "parts/app/Service.run.py",
//!     "start_line": 8
//!   }
//! }
//! ```

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;
use crate::slicer;
use crate::types::{Fragment, MapEntry, SymbolKind};

/// Most suggestions offered when a lookup misses.
const MAX_SUGGESTIONS: usize = 5;

/// Value stored under each qualified name.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    /// Last line of the symbol.
    end_line: usize,
    /// Declaration kind.
    kind: SymbolKind,
    /// Fragment path relative to the output root.
    output_path: String,
    /// First line of the symbol.
    start_line: usize,
}

/// Whole document; serialized as one JSON object that keeps entry order.
struct Document(Vec<MapEntry>);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        return deserializer.deserialize_map(DocumentVisitor);
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.collect_map(self.0.iter().map(|entry| {
            let record = Record {
                end_line: entry.end_line,
                kind: entry.kind,
                output_path: entry.output_path.clone(),
                start_line: entry.start_line,
            };
            return (&entry.qualified_name, record);
        }));
    }
}

/// Reads map entries in document order.
struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str("an object keyed by qualified name");
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((qualified_name, record)) = access.next_entry::<String, Record>()? {
            entries.push(MapEntry {
                end_line: record.end_line,
                kind: record.kind,
                output_path: record.output_path,
                qualified_name,
                start_line: record.start_line,
            });
        }
        return Ok(Document(entries));
    }
}

/// One entry per fragment, in fragment order.
pub fn entries(fragments: &[Fragment]) -> Vec<MapEntry> {
    return fragments
        .iter()
        .map(|fragment| {
            return MapEntry {
                end_line: fragment.symbol.end_line,
                kind: fragment.symbol.kind,
                output_path: slicer::to_slash(&fragment.output_path),
                qualified_name: fragment.symbol.qualified_name.clone(),
                start_line: fragment.symbol.start_line,
            };
        })
        .collect();
}

/// Render the map document for `fragments`.
///
/// # Errors
///
/// Returns `Error::EmptyMapRejected` if `fragments` is empty, or
/// `Error::Json` if serialization fails.
pub fn render(fragments: &[Fragment], map_path: &Path) -> Result<String, Error> {
    if fragments.is_empty() {
        return Err(Error::EmptyMapRejected {
            path: map_path.to_path_buf(),
        });
    }
    let mut text = serde_json::to_string_pretty(&Document(entries(fragments)))?;
    text.push('\n');
    return Ok(text);
}

/// Render the map and write it to `map_path`, creating parent directories.
/// Nothing is written when the map would be empty.
///
/// # Errors
///
/// Returns `Error::EmptyMapRejected` for zero fragments, `Error::Json` on
/// serialization failure, or `Error::Io` if the file cannot be written.
pub fn generate(fragments: &[Fragment], map_path: &Path) -> Result<Vec<MapEntry>, Error> {
    let text = render(fragments, map_path)?;
    if let Some(parent) = map_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(map_path, text)?;
    tracing::info!(path = %map_path.display(), entries = fragments.len(), "wrote map");
    return Ok(entries(fragments));
}

/// Read a map document back, preserving entry order.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read or `Error::Json` if it is not a map document.
pub fn load(map_path: &Path) -> Result<Vec<MapEntry>, Error> {
    let text = std::fs::read_to_string(map_path)?;
    let document: Document = serde_json::from_str(&text)?;
    return Ok(document.0);
}

/// Find one symbol in a map document.
///
/// # Errors
///
/// Returns `Error::UnknownSymbol` with similar names if there is no entry for
/// `symbol`, or any error from [`load`].
pub fn lookup(map_path: &Path, symbol: &str) -> Result<MapEntry, Error> {
    let entries = load(map_path)?;
    if let Some(found) = entries.iter().find(|e| return e.qualified_name == symbol) {
        return Ok(found.clone());
    }

    return Err(Error::UnknownSymbol {
        map: map_path.to_path_buf(),
        suggestions: suggest(&entries, symbol),
        symbol: symbol.to_string(),
    });
}

/// Names that share the missing symbol's last segment, or contain it.
fn suggest(entries: &[MapEntry], symbol: &str) -> Vec<String> {
    let wanted = symbol.rsplit(['#', '.']).next().unwrap_or(symbol).to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }

    return entries
        .iter()
        .filter(|e| {
            let name = e.qualified_name.to_lowercase();
            let last = name.rsplit('#').next().unwrap_or(&name);
            let base = last.split('~').next().unwrap_or(last);
            return base == wanted || name.contains(&wanted);
        })
        .take(MAX_SUGGESTIONS)
        .map(|e| return e.qualified_name.clone())
        .collect();
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use super::*;
    use crate::types::Symbol;

    fn fragment(
        qualified_name: &str,
        kind: SymbolKind,
        start_line: usize,
        end_line: usize,
    ) -> Fragment {
        let source_path = PathBuf::from("src/app.py");
        return Fragment {
            header: String::new(),
            output_path: slicer::output_path(&source_path, qualified_name),
            symbol: Symbol {
                calls: BTreeSet::new(),
                end_line,
                kind,
                name: qualified_name.to_string(),
                parent: None,
                qualified_name: qualified_name.to_string(),
                references: BTreeSet::new(),
                source_path,
                start_line,
            },
            text: String::new(),
        };
    }

    fn sample() -> Vec<Fragment> {
        return vec![
            fragment("zeta", SymbolKind::Function, 1, 3),
            fragment("Service", SymbolKind::Class, 5, 9),
            fragment("Service#run", SymbolKind::Method, 6, 9),
        ];
    }

    #[test]
    fn empty_map_is_rejected_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MAP.json");
        let err = generate(&[], &path).unwrap_err();
        assert!(matches!(err, Error::EmptyMapRejected { .. }), "got {err:?}");
        assert!(!path.exists(), "empty map was written");
    }

    #[test]
    fn document_is_keyed_by_name_in_fragment_order() {
        let text = render(&sample(), Path::new("MAP.json")).unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        let service = text.find("\"Service\"").unwrap();
        assert!(zeta < service, "fragment order lost:\n{text}");

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 3);
        assert_eq!(value["Service#run"]["output_path"], "parts/src/app/Service.run.py");
        assert_eq!(value["Service#run"]["kind"], "method");
        assert_eq!(value["Service#run"]["start_line"], 6);
    }

    #[test]
    fn load_returns_what_generate_wrote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map/src/app.py.json");
        let written = generate(&sample(), &path).unwrap();
        assert_eq!(load(&path).unwrap(), written);
    }

    #[test]
    fn lookup_misses_suggest_similar_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MAP.json");
        generate(&sample(), &path).unwrap();

        assert_eq!(lookup(&path, "Service").unwrap().end_line, 9);
        match lookup(&path, "Other#run") {
            Err(Error::UnknownSymbol { suggestions, .. }) => {
                assert_eq!(suggestions, ["Service#run"]);
            },
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
    }

    #[test]
    fn non_map_document_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MAP.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load(&path), Err(Error::Json(_))), "expected Json error");
    }
}
