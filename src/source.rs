//! Tabular source reading.
//!
//! A source is a delimited text table whose first row is the header. Paths
//! ending in `.gz` are decompressed on the fly when the `gzip` feature is on.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Identity of the file a snapshot was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub path: PathBuf,
    /// blake3 hex digest of the raw file bytes.
    pub hash: String,
    pub bytes: u64,
}

impl SourceInfo {
    /// Identity of `bytes` as read from `path`.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Self {
        Self {
            path: path.to_path_buf(),
            hash: blake3::hash(bytes).to_hex().to_string(),
            bytes: bytes.len() as u64,
        }
    }

    /// Stream the file at `path` through blake3 without keeping it.
    pub fn fingerprint(path: &Path) -> Result<Self> {
        let (hash, bytes) = hash_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            hash,
            bytes,
        })
    }
}

/// Header plus raw records, before any typing.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `col`). Short rows read as empty cells.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|record| record.get(col))
            .unwrap_or("")
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        (0..self.rows.len()).map(move |row| self.cell(row, col))
    }
}

/// Read `path` once, fingerprint those bytes and parse the same buffer, so
/// the returned identity always describes the returned table.
pub fn read_source(path: &Path, config: &StoreConfig) -> Result<(SourceInfo, RawTable)> {
    let bytes = std::fs::read(path).map_err(|source| Error::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let info = SourceInfo::from_bytes(path, &bytes);
    let table = if is_gzip(path) {
        parse_table(gzip_reader(path, &bytes)?, config)?
    } else {
        parse_table(bytes.as_slice(), config)?
    };
    Ok((info, table))
}

pub fn parse_table<R: Read>(reader: R, config: &StoreConfig) -> Result<RawTable> {
    let mut csv = ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(record);
    }
    Ok(RawTable { headers, rows })
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(feature = "gzip")]
fn gzip_reader<'a>(_path: &Path, bytes: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    Ok(Box::new(flate2::read::GzDecoder::new(bytes)))
}

#[cfg(not(feature = "gzip"))]
fn gzip_reader<'a>(path: &Path, _bytes: &'a [u8]) -> Result<Box<dyn Read + 'a>> {
    Err(Error::SourceRead {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "gzip input requires the `gzip` feature",
        ),
    })
}

fn hash_file(path: &Path) -> Result<(String, u64)> {
    let mut file = File::open(path).map_err(|source| Error::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        total += read as u64;
        hasher.update(&buf[..read]);
    }
    Ok((hasher.finalize().to_hex().to_string(), total))
}
