//! Time-series store.
//!
//! Holds one immutable snapshot of a loaded table: the date column plus every
//! classified data column, all sharing the same row order and length. Queries
//! borrow the snapshot; `update` builds a replacement off to the side and
//! swaps it in only once it is complete.
//!
//! # Example
//!
//! ```no_run
//! use tracking_series::TimeSeriesStore;
//!
//! let store = TimeSeriesStore::load("tracking.csv")?;
//! for line in store.continuous_series() {
//!     let points = store.mask(&line.values)?;
//!     for event in store.event_series() {
//!         let marks = store.align_events_to_series(&line.values, &event.values)?;
//!         println!("{} on {}: {} marks", event.name, line.name, marks.len());
//!     }
//!     println!("{}: {} points", line.name, points.len());
//! }
//! # Ok::<(), tracking_series::Error>(())
//! ```

use std::path::Path;

use crate::classify::{classify_table, Column};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::series::{self, Masked};
use crate::source::{read_source, RawTable, SourceInfo};
use crate::timestamp::{parse_epoch_seconds, IntoTimestamp};

/// A named column of row-aligned values.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries<T> {
    pub name: String,
    pub values: Vec<T>,
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    source: Option<SourceInfo>,
    dates: Vec<i64>,
    continuous: Vec<NamedSeries<Option<f64>>>,
    events: Vec<NamedSeries<bool>>,
}

impl Snapshot {
    fn from_table(table: &RawTable, config: &StoreConfig) -> Result<Self> {
        let Some(date_header) = table.headers.first() else {
            return Err(Error::Column("table has no header row".to_string()));
        };
        if table.headers.len() < 2 {
            return Err(Error::Column(format!(
                "no data columns after timestamp column {date_header:?}"
            )));
        }

        let offset = config.utc_offset()?;
        let mut dates = Vec::with_capacity(table.row_count());
        for (row, cell) in table.column(0).enumerate() {
            let ts = parse_epoch_seconds(cell, offset).map_err(|err| {
                Error::Column(format!("{date_header:?} row {}: {err}", row + 1))
            })?;
            dates.push(ts);
        }

        let columns = classify_table(table, config)?;
        Self::from_parts(dates, columns)
    }

    fn from_parts(dates: Vec<i64>, columns: Vec<(String, Column)>) -> Result<Self> {
        let mut snapshot = Snapshot {
            source: None,
            dates,
            ..Snapshot::default()
        };
        for (name, column) in columns {
            if column.len() != snapshot.dates.len() {
                return Err(Error::LengthMismatch {
                    expected: snapshot.dates.len(),
                    actual: column.len(),
                });
            }
            if snapshot.has_column(&name) {
                return Err(Error::Column(format!("duplicate column header: {name}")));
            }
            match column {
                Column::Continuous(values) => snapshot.continuous.push(NamedSeries { name, values }),
                Column::Event(values) => snapshot.events.push(NamedSeries { name, values }),
            }
        }
        if !snapshot.dates.windows(2).all(|w| w[0] <= w[1]) {
            log::warn!("timestamp column is not in ascending order");
        }
        Ok(snapshot)
    }

    fn has_column(&self, name: &str) -> bool {
        self.continuous.iter().any(|s| s.name == name) || self.events.iter().any(|s| s.name == name)
    }
}

/// Loaded, classified time-series table.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    config: StoreConfig,
    snapshot: Snapshot,
}

impl TimeSeriesStore {
    /// Load a table with the default configuration.
    ///
    /// # Errors
    ///
    /// - `Error::SourceRead`, `Error::Csv`: the file cannot be read as a table
    /// - `Error::Column`: the first column is not timestamps, there are no data
    ///   columns, or a header is empty or repeated
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, StoreConfig::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let snapshot = load_snapshot(path.as_ref(), &config)?;
        Ok(Self { config, snapshot })
    }

    /// Build a store from already-typed columns.
    ///
    /// Every column must have one value per date.
    pub fn from_columns(dates: Vec<i64>, columns: Vec<(String, Column)>) -> Result<Self> {
        Ok(Self {
            config: StoreConfig::default(),
            snapshot: Snapshot::from_parts(dates, columns)?,
        })
    }

    /// Replace the whole snapshot with the contents of `path`.
    ///
    /// On error the previous snapshot stays in place.
    pub fn update(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = load_snapshot(path.as_ref(), &self.config)?;
        self.snapshot = snapshot;
        Ok(())
    }

    /// True when the loaded file still has the fingerprint it had at load time.
    /// Stores built from columns have no file and are never current.
    pub fn is_current(&self) -> Result<bool> {
        let Some(source) = &self.snapshot.source else {
            return Ok(false);
        };
        let now = SourceInfo::fingerprint(&source.path)?;
        Ok(now.hash == source.hash)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.snapshot.source.as_ref()
    }

    /// Number of rows; every series has exactly this length.
    pub fn data_scale(&self) -> usize {
        self.snapshot.dates.len()
    }

    pub fn dates(&self) -> &[i64] {
        &self.snapshot.dates
    }

    pub fn continuous_series(&self) -> &[NamedSeries<Option<f64>>] {
        &self.snapshot.continuous
    }

    pub fn event_series(&self) -> &[NamedSeries<bool>] {
        &self.snapshot.events
    }

    pub fn continuous(&self, name: &str) -> Option<&[Option<f64>]> {
        self.snapshot
            .continuous
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn events(&self, name: &str) -> Option<&[bool]> {
        self.snapshot
            .events
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    pub fn continuous_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.snapshot.continuous.iter().map(|s| s.name.as_str())
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.snapshot.events.iter().map(|s| s.name.as_str())
    }

    /// Finite `(date, value)` pairs of `series`, in row order.
    pub fn mask(&self, series: &[Option<f64>]) -> Result<Masked> {
        series::mask(&self.snapshot.dates, series)
    }

    pub fn mask_column(&self, name: &str) -> Result<Masked> {
        let values = self
            .continuous(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        self.mask(values)
    }

    /// Where on `line` each marked row's event landed.
    ///
    /// Exact date hits take the line's stored value; other dates are linearly
    /// interpolated and clamped at the ends.
    ///
    /// # Errors
    ///
    /// - `Error::InsufficientData`: events occur but `line` has no finite points
    /// - `Error::LengthMismatch`: an input is not `data_scale` long
    pub fn align_events_to_series(&self, line: &[Option<f64>], markers: &[bool]) -> Result<Masked> {
        series::align_events(&self.snapshot.dates, line, markers)
    }

    pub fn align_columns(&self, line: &str, event: &str) -> Result<Masked> {
        let values = self
            .continuous(line)
            .ok_or_else(|| Error::UnknownColumn(line.to_string()))?;
        let markers = self
            .events(event)
            .ok_or_else(|| Error::UnknownColumn(event.to_string()))?;
        self.align_events_to_series(values, markers)
    }

    /// Convert epoch seconds (scalar or sequence) to UTC date-times.
    pub fn to_timestamp<T: IntoTimestamp>(&self, value: T) -> Result<T::Output> {
        value.into_timestamp()
    }
}

fn load_snapshot(path: &Path, config: &StoreConfig) -> Result<Snapshot> {
    let (source, table) = read_source(path, config)?;
    let mut snapshot = Snapshot::from_table(&table, config)?;
    log::info!(
        "loaded {} rows={} continuous={} events={}",
        path.display(),
        snapshot.dates.len(),
        snapshot.continuous.len(),
        snapshot.events.len()
    );
    snapshot.source = Some(source);
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> TimeSeriesStore {
        TimeSeriesStore::from_columns(
            vec![0, 1, 2, 3, 4],
            vec![
                (
                    "weight".to_string(),
                    Column::Continuous(vec![Some(10.0), None, Some(20.0), Some(30.0), None]),
                ),
                (
                    "note".to_string(),
                    Column::Event(vec![false, true, false, false, true]),
                ),
            ],
        )
        .expect("store")
    }

    #[test]
    fn scenario_mask_and_align() {
        let store = scenario();
        let masked = store.mask_column("weight").unwrap();
        assert_eq!(masked.dates, vec![0, 2, 3]);
        assert_eq!(masked.values, vec![10.0, 20.0, 30.0]);

        let aligned = store.align_columns("weight", "note").unwrap();
        assert_eq!(aligned.dates, vec![1, 4]);
        assert_eq!(aligned.values, vec![15.0, 30.0]);
    }

    #[test]
    fn accessors_expose_header_order() {
        let store = scenario();
        assert_eq!(store.data_scale(), 5);
        assert_eq!(store.continuous_names().collect::<Vec<_>>(), vec!["weight"]);
        assert_eq!(store.event_names().collect::<Vec<_>>(), vec!["note"]);
        assert!(store.source().is_none());
        assert!(!store.is_current().unwrap());
    }

    #[test]
    fn unknown_columns_are_reported() {
        let store = scenario();
        assert!(matches!(store.mask_column("note"), Err(Error::UnknownColumn(_))));
        assert!(matches!(
            store.align_columns("weight", "missing"),
            Err(Error::UnknownColumn(name)) if name == "missing"
        ));
    }

    #[test]
    fn from_columns_rejects_misaligned_columns() {
        let err = TimeSeriesStore::from_columns(
            vec![0, 1],
            vec![("a".to_string(), Column::Event(vec![true]))],
        )
        .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn query_inputs_must_match_row_count() {
        let store = scenario();
        assert!(matches!(
            store.mask(&[Some(1.0)]),
            Err(Error::LengthMismatch { expected: 5, actual: 1 })
        ));
    }

    #[test]
    fn to_timestamp_preserves_shape() {
        let store = scenario();
        let one = store.to_timestamp(60i64).unwrap();
        assert_eq!(one.minute(), 1);
        let many = store.to_timestamp(store.dates()).unwrap();
        assert_eq!(many.len(), 5);
        assert_eq!(many[4].unix_timestamp(), 4);
    }

    #[test]
    fn store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TimeSeriesStore>();
    }
}
