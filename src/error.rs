/// Crate-level error types for code2map diagnostics.
use std::path::PathBuf;

/// All errors in code2map carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, symbol, or reason for failure.
///
/// Parse anomalies are not errors: front-ends record them as
/// [`Warning`](crate::types::Warning)s and keep going.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as code2map::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The map generator received zero fragments. Callers decide whether this is fatal.
    #[error("refusing to write an empty map: {}", path.display())]
    EmptyMapRejected {
        /// Map document that would have been written.
        path: PathBuf,
    },

    /// Source file exceeds the configured size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization of a map document failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Tree-sitter could not be initialised for, or returned no tree for, a source file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A symbol's line range does not fit inside its source file.
    #[error(
        "symbol `{symbol}` spans lines {start_line}-{end_line} but {} has {line_count} lines",
        file.display()
    )]
    RangeOutOfBounds {
        /// Last line claimed by the symbol.
        end_line: usize,
        /// File the symbol was reported for.
        file: PathBuf,
        /// Number of lines in the file.
        line_count: usize,
        /// First line claimed by the symbol.
        start_line: usize,
        /// Qualified name of the offending symbol.
        symbol: String,
    },

    /// TOML deserialization of `.code2map.toml` failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A map document has no entry for the requested symbol.
    #[error("symbol not found: `{symbol}` in {}", map.display())]
    UnknownSymbol {
        /// Map document that was searched.
        map: PathBuf,
        /// Qualified names present in the map that look similar.
        suggestions: Vec<String>,
        /// Qualified name that was not found.
        symbol: String,
    },

    /// The source file cannot be opened or decoded as text.
    #[error("unreadable source: {}: {reason}", path.display())]
    UnreadableSource {
        /// File that could not be read.
        path: PathBuf,
        /// Why the file could not be read.
        reason: String,
    },

    /// No front-end registered for this file extension.
    #[error("no front-end for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },
}
