use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::reader::MAX_FILE_SIZE;

/// Name of the optional config file at the analysis root.
pub const CONFIG_FILE: &str = ".code2map.toml";

/// Default output root, relative to the analysis root.
pub const DEFAULT_OUTPUT_DIR: &str = "code2map-out";

/// Project configuration loaded from `.code2map.toml`.
/// Include/exclude patterns are path prefixes applied to source files in batch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tolerate files that yield zero fragments instead of failing them.
    pub allow_empty_map: bool,
    /// Prefixes skipped even when included.
    exclude: Vec<String>,
    /// Prefixes scanned; empty means everything.
    include: Vec<String>,
    /// Size limit per source file.
    pub max_file_bytes: u64,
    /// Output root, relative to the analysis root unless absolute.
    pub output_dir: PathBuf,
}

/// Raw TOML structure for `.code2map.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Code2mapTomlConfig {
    /// See [`Config::allow_empty_map`].
    #[serde(default)]
    allow_empty_map: bool,
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::max_file_bytes`].
    max_file_bytes: Option<u64>,
    /// See [`Config::output_dir`].
    output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            allow_empty_map: false,
            exclude: Vec::new(),
            include: Vec::new(),
            max_file_bytes: MAX_FILE_SIZE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        };
    }
}

impl Config {
    /// Load config from `.code2map.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote is never silently replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: Code2mapTomlConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        let defaults = Self::default();
        return Ok(Self {
            allow_empty_map: raw.allow_empty_map,
            exclude: raw.exclude,
            include: raw.include,
            max_file_bytes: raw.max_file_bytes.unwrap_or(defaults.max_file_bytes),
            output_dir: raw.output_dir.unwrap_or(defaults.output_dir),
        });
    }

    /// Check whether a source file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
