//! Engine configuration loaded from YAML
//!
//! ```yaml
//! ingest:
//!   delimiter: "|"
//!   missing_marker: "-"
//! classify:
//!   level: L3
//!   hops: 2
//!   max_hops: 4
//! export:
//!   keyword_delimiter: ", "
//! ```
//!
//! Every section and field is optional; absent values take their defaults.

use crate::ingest::RowFormat;
use crate::query::ClassifyParams;
use crate::taxonomy::DEFAULT_KEYWORD_DELIMITER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Row format settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub delimiter: char,
    pub missing_marker: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let format = RowFormat::default();
        Self {
            delimiter: format.delimiter,
            missing_marker: format.missing_marker,
        }
    }
}

impl IngestConfig {
    pub fn row_format(&self) -> RowFormat {
        RowFormat {
            delimiter: self.delimiter,
            missing_marker: self.missing_marker.clone(),
        }
    }
}

/// Taxonomy export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub keyword_delimiter: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            keyword_delimiter: DEFAULT_KEYWORD_DELIMITER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ingest: IngestConfig,
    pub classify: ClassifyParams,
    pub export: ExportConfig,
}

impl EngineConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.check()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if a file
    /// exists there, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::load(path),
                None => Ok(Self::default()),
            },
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.ingest.missing_marker.contains(self.ingest.delimiter) {
            return Err(ConfigError::Invalid(format!(
                "missing_marker {:?} contains the delimiter {:?}",
                self.ingest.missing_marker, self.ingest.delimiter
            )));
        }
        if !(0.0..=1.0).contains(&self.classify.hop_decay) {
            return Err(ConfigError::Invalid(format!(
                "hop_decay must be within 0..=1, got {}",
                self.classify.hop_decay
            )));
        }
        Ok(())
    }
}

/// Default config location (~/.config/fosgraph/config.yaml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fosgraph").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Level;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_yaml("{}").unwrap();
        assert_eq!(config.ingest.delimiter, '|');
        assert_eq!(config.ingest.missing_marker, "-");
        assert_eq!(config.export.keyword_delimiter, ", ");
        assert_eq!(config.classify.hops, 1);
        assert_eq!(config.classify.max_hops, crate::query::MAX_HOPS);
    }

    #[test]
    fn hop_cap_is_configurable() {
        let config = EngineConfig::from_yaml("classify:\n  hops: 6\n  max_hops: 8\n").unwrap();
        assert_eq!(config.classify.max_hops, 8);
        assert_eq!(config.classify.hops, 6);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EngineConfig::from_yaml("classify:\n  level: L3\n  hops: 2\n").unwrap();
        assert_eq!(config.classify.level, Level::L3);
        assert_eq!(config.classify.hops, 2);
        assert_eq!(config.classify.hop_decay, 0.5);
        assert_eq!(config.ingest, IngestConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ingest:\n  delimiter: \",\"\nexport:\n  keyword_delimiter: \"; \"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.ingest.row_format().delimiter, ',');
        assert_eq!(config.export.keyword_delimiter, "; ");
    }

    #[test]
    fn unreadable_and_invalid_files_are_errors() {
        assert!(matches!(
            EngineConfig::load("/nonexistent/fosgraph.yaml"),
            Err(ConfigError::Io { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "classify:\n  hops: many").unwrap();
        assert!(matches!(EngineConfig::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_marker_containing_delimiter() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ingest:\n  missing_marker: \"a|b\"").unwrap();
        assert!(matches!(EngineConfig::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn explicit_path_is_required_to_exist() {
        let missing = Path::new("/nonexistent/config.yaml");
        assert!(EngineConfig::load_or_default(Some(missing)).is_err());
    }
}
