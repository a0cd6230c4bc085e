//! Time-series ingestion and alignment.
//!
//! Loads a table whose first column holds timestamps, splits the remaining
//! columns into continuous readings and event markers, and produces
//! gap-free, index-aligned arrays for plotting: masked lines and event
//! positions projected onto those lines.

pub mod chart;
pub mod classify;
pub mod config;
pub mod error;
pub mod series;
pub mod source;
pub mod store;
pub mod timestamp;

pub use chart::{build_charts, ChartData, Overlay};
pub use classify::{Column, ColumnKind};
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use series::Masked;
pub use source::SourceInfo;
pub use store::{NamedSeries, TimeSeriesStore};
pub use timestamp::IntoTimestamp;
