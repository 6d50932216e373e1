use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::model::DecimalSeparator;
use crate::error::ConfigError;

/// Engine settings.  Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub decimal_separator: DecimalSeparator,
    /// Recognised file-name suffixes, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Rows sampled per file when deciding whether a column is numeric.
    pub sample_rows: usize,
    /// Rows read when only headers are of interest.
    pub header_sample_rows: usize,
    /// Header fragments marking a time/date column.
    pub time_tokens: Vec<String>,
    pub scan_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decimal_separator: DecimalSeparator::Dot,
            extensions: vec![".txt".into(), ".tsv".into()],
            sample_rows: 10,
            header_sample_rows: 5,
            time_tokens: vec!["time".into(), "zaman".into(), "date".into()],
            scan_timeout_secs: 60,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}
