//! Store configuration.
//!
//! Controls how a source table is tokenized, which cells count as missing,
//! and the limits applied when building chart data.

use std::path::Path;

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::error::{Error, Result};

/// Configuration for loading and presenting a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Field delimiter.
    /// Default: ','
    pub delimiter: char,

    /// Cell values (compared case-insensitively after trimming) treated as missing.
    /// Default: "", "nan", "na", "n/a", "null"
    pub missing_tokens: Vec<String>,

    /// Maximum number of continuous columns charted at once.
    /// Default: 20
    pub max_charts: usize,

    /// Longest column name used verbatim as a chart label.
    /// Default: 25
    pub label_max_len: usize,

    /// UTC offset, in whole hours, assumed for date/time cells without one.
    /// Default: 0
    pub utc_offset_hours: i8,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            missing_tokens: ["", "nan", "na", "n/a", "null"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_charts: 20,
            label_max_len: 25,
            utc_offset_hours: 0,
        }
    }
}

impl StoreConfig {
    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StoreConfig = serde_json::from_slice(&data)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(Error::Config(format!(
                "delimiter must be a single ascii character, got {:?}",
                self.delimiter
            )));
        }
        if self.max_charts == 0 {
            return Err(Error::Config("max_charts must be at least 1".to_string()));
        }
        self.utc_offset()?;
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub(crate) fn utc_offset(&self) -> Result<UtcOffset> {
        UtcOffset::from_hms(self.utc_offset_hours, 0, 0).map_err(|_| {
            Error::Config(format!("invalid utc offset: {} hours", self.utc_offset_hours))
        })
    }

    pub(crate) fn is_missing(&self, cell: &str) -> bool {
        let cell = cell.trim();
        self.missing_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(cell))
    }
}
