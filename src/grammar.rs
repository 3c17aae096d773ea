/// Source language detection and tree-sitter grammar resolution by file extension.
use std::path::Path;

use crate::error::Error;

/// Languages with a front-end. Adding a language means adding a variant here
/// plus its declaration and import rules; nothing downstream changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Go (`.go`).
    Go,
    /// Java (`.java`).
    Java,
    /// Python (`.py`, `.pyi`).
    Python,
    /// Rust (`.rs`).
    Rust,
    /// TypeScript with JSX (`.tsx`, `.jsx`).
    Tsx,
    /// TypeScript and plain JavaScript (`.ts`, `.mts`, `.cts`, `.js`, `.mjs`, `.cjs`).
    TypeScript,
}

impl Language {
    /// Map a file extension to its language.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown extensions.
    pub fn for_path(path: &Path) -> Result<Self, Error> {
        let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

        return match ext {
            "go" => Ok(Self::Go),
            "java" => Ok(Self::Java),
            "js" | "mjs" | "cjs" | "ts" | "mts" | "cts" => Ok(Self::TypeScript),
            "jsx" | "tsx" => Ok(Self::Tsx),
            "py" | "pyi" => Ok(Self::Python),
            "rs" => Ok(Self::Rust),
            _ => Err(Error::UnsupportedLanguage {
                ext: ext.to_string(),
            }),
        };
    }

    /// Line-comment marker used to prefix fragment headers.
    pub const fn line_comment(self) -> &'static str {
        return match self {
            Self::Python => "#",
            Self::Go | Self::Java | Self::Rust | Self::Tsx | Self::TypeScript => "//",
        };
    }

    /// Human-readable language name.
    pub const fn name(self) -> &'static str {
        return match self {
            Self::Go => "go",
            Self::Java => "java",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Tsx => "tsx",
            Self::TypeScript => "typescript",
        };
    }

    /// The tree-sitter grammar for this language.
    pub fn tree_sitter(self) -> tree_sitter::Language {
        return match self {
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::Java => tree_sitter_java::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        };
    }
}

/// Comment marker for fragment headers of `path`; `#` when the language is unknown.
pub fn line_comment_for_path(path: &Path) -> &'static str {
    return Language::for_path(path).map_or("#", Language::line_comment);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(Language::for_path(Path::new("a/b.py")).unwrap(), Language::Python);
        assert_eq!(Language::for_path(Path::new("Main.java")).unwrap(), Language::Java);
        assert_eq!(Language::for_path(Path::new("lib.rs")).unwrap(), Language::Rust);
        assert_eq!(Language::for_path(Path::new("app.tsx")).unwrap(), Language::Tsx);
        assert_eq!(Language::for_path(Path::new("app.js")).unwrap(), Language::TypeScript);
        assert_eq!(Language::for_path(Path::new("main.go")).unwrap(), Language::Go);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = Language::for_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage { ref ext } if ext == "txt"));
    }

    #[test]
    fn comment_markers() {
        assert_eq!(line_comment_for_path(Path::new("x.py")), "#");
        assert_eq!(line_comment_for_path(Path::new("X.java")), "//");
        assert_eq!(line_comment_for_path(Path::new("README")), "#");
    }

    #[test]
    fn every_grammar_loads() {
        for language in [
            Language::Go,
            Language::Java,
            Language::Python,
            Language::Rust,
            Language::Tsx,
            Language::TypeScript,
        ] {
            let mut parser = tree_sitter::Parser::new();
            assert!(parser.set_language(&language.tree_sitter()).is_ok(), "{}", language.name());
        }
    }
}
