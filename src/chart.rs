//! Chart data assembly.
//!
//! One chart per continuous column: its masked line plus every event column
//! aligned onto it. Produces plain arrays for a renderer to draw.

use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::series::Masked;
use crate::store::TimeSeriesStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub event: String,
    pub points: Masked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub name: String,
    /// Menu label: the column name, or `Graph N` when the name is too long.
    pub label: String,
    pub line: Masked,
    pub overlays: Vec<Overlay>,
}

/// Label for the chart at zero-based `index`.
pub fn chart_label(name: &str, index: usize, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else {
        format!("Graph {}", index + 1)
    }
}

pub fn build_charts(store: &TimeSeriesStore, config: &StoreConfig) -> Result<Vec<ChartData>> {
    let lines = store.continuous_series();
    if lines.len() > config.max_charts {
        return Err(Error::TooManyCharts {
            count: lines.len(),
            max: config.max_charts,
        });
    }

    let mut charts = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let mut overlays = Vec::with_capacity(store.event_series().len());
        for event in store.event_series() {
            let points = store.align_events_to_series(&line.values, &event.values)?;
            overlays.push(Overlay {
                event: event.name.clone(),
                points,
            });
        }
        charts.push(ChartData {
            name: line.name.clone(),
            label: chart_label(&line.name, index, config.label_max_len),
            line: store.mask(&line.values)?,
            overlays,
        });
    }
    Ok(charts)
}
