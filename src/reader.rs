//! Line reader: file contents as an ordered, 1-indexed sequence of lines.
//!
//! Lines keep their terminators (`\n` or `\r\n`) so that joining a range
//! reproduces the original bytes exactly.

use std::path::Path;

use crate::error::Error;

/// Default maximum source file size (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// UTF-8 byte order mark.
const BOM: char = '\u{feff}';

/// The lines of one source file. Read-only once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    /// Whether a leading UTF-8 byte order mark was stripped.
    had_bom: bool,
    /// Lines in order, each with its original terminator (the last may have none).
    lines: Vec<String>,
}

impl SourceLines {
    /// Split in-memory text into lines. A leading byte order mark is dropped.
    pub fn from_text(text: &str) -> Self {
        let (had_bom, body) = match text.strip_prefix(BOM) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let lines = body.split_inclusive('\n').map(String::from).collect();
        return Self { had_bom, lines };
    }

    /// Line `number` (1-indexed) with its terminator.
    pub fn get(&self, number: usize) -> Option<&str> {
        let index = number.checked_sub(1)?;
        return self.lines.get(index).map(String::as_str);
    }

    /// Whether a byte order mark was stripped from the first line.
    pub const fn had_bom(&self) -> bool {
        return self.had_bom;
    }

    /// Whether the file has no lines at all.
    pub const fn is_empty(&self) -> bool {
        return self.lines.is_empty();
    }

    /// Number of lines.
    pub const fn len(&self) -> usize {
        return self.lines.len();
    }

    /// Lines `start..=end` (1-indexed, inclusive), or `None` if the range
    /// is empty, starts at 0 or runs past the last line.
    pub fn range(&self, start: usize, end: usize) -> Option<&[String]> {
        if start == 0 || start > end {
            return None;
        }
        let first = start.checked_sub(1)?;
        return self.lines.get(first..end);
    }

    /// The whole file (without the byte order mark) as one string.
    pub fn text(&self) -> String {
        return self.lines.concat();
    }
}

/// Read a file as lines.
///
/// # Errors
///
/// Returns `Error::UnreadableSource` if the file cannot be opened, is not
/// valid UTF-8 or contains NUL bytes, and `Error::FileTooLarge` if it is
/// bigger than `max_bytes`.
pub fn read_lines(path: &Path, max_bytes: u64) -> Result<SourceLines, Error> {
    let unreadable = |reason: String| {
        return Error::UnreadableSource {
            path: path.to_path_buf(),
            reason,
        };
    };

    let metadata = std::fs::metadata(path).map_err(|e| return unreadable(e.to_string()))?;
    if metadata.len() > max_bytes {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes,
            size_bytes: metadata.len(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| return unreadable(e.to_string()))?;
    if bytes.contains(&0) {
        return Err(unreadable("binary content (NUL byte)".to_string()));
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| return unreadable(format!("not valid UTF-8 ({e})")))?;

    return Ok(SourceLines::from_text(&text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_terminators() {
        let lines = SourceLines::from_text("a\r\nb\nc");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.get(1), Some("a\r\n"));
        assert_eq!(lines.get(3), Some("c"));
        assert_eq!(lines.text(), "a\r\nb\nc");
    }

    #[test]
    fn empty_text_has_no_lines() {
        let lines = SourceLines::from_text("");
        assert!(lines.is_empty());
        assert_eq!(lines.get(1), None);
    }

    #[test]
    fn range_is_one_indexed_and_inclusive() {
        let lines = SourceLines::from_text("1\n2\n3\n");
        let slice = lines.range(2, 3).unwrap();
        assert_eq!(slice.concat(), "2\n3\n");
        assert!(lines.range(0, 1).is_none());
        assert!(lines.range(3, 4).is_none());
        assert!(lines.range(3, 2).is_none());
    }

    #[test]
    fn strips_byte_order_mark() {
        let lines = SourceLines::from_text("\u{feff}x = 1\n");
        assert!(lines.had_bom());
        assert_eq!(lines.get(1), Some("x = 1\n"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.py");
        std::fs::write(&path, [b'x', b'=', 0xE9, b'\n']).unwrap();
        let err = read_lines(&path, MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, Error::UnreadableSource { .. }), "got {err:?}");
    }

    #[test]
    fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.py");
        std::fs::write(&path, "x = 1\n").unwrap();
        let err = read_lines(&path, 2).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { size_bytes: 6, .. }), "got {err:?}");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = read_lines(Path::new("does/not/exist.py"), MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, Error::UnreadableSource { .. }), "got {err:?}");
    }
}
