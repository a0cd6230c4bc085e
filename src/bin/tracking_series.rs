use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use tracking_series::timestamp::format_epoch_seconds;
use tracking_series::{build_charts, ChartData, Masked, StoreConfig, TimeSeriesStore};

#[derive(Parser)]
#[command(name = "tracking-series", version)]
#[command(about = "Inspect, mask and align time-series tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Input CSV or CSV.GZ path
    #[arg(long)]
    input: PathBuf,

    /// JSON store config (delimiter, missing tokens, limits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render dates as RFC 3339 strings instead of epoch seconds
    #[arg(long)]
    iso: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print row count, date range and column roles
    Summary {
        #[command(flatten)]
        common: Common,
    },
    /// Print the finite points of one continuous column
    Mask {
        #[command(flatten)]
        common: Common,

        /// Continuous column name
        #[arg(long)]
        column: String,
    },
    /// Print where an event column lands on a continuous column
    Align {
        #[command(flatten)]
        common: Common,

        /// Continuous column name
        #[arg(long)]
        line: String,

        /// Event column name
        #[arg(long)]
        event: String,
    },
    /// Print chart data for every continuous column
    Charts {
        #[command(flatten)]
        common: Common,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Dates {
    Epoch(Vec<i64>),
    Iso(Vec<String>),
}

#[derive(Serialize)]
struct Points {
    dates: Dates,
    values: Vec<f64>,
}

#[derive(Serialize)]
struct OverlayOut {
    event: String,
    points: Points,
}

#[derive(Serialize)]
struct ChartOut {
    name: String,
    label: String,
    line: Points,
    overlays: Vec<OverlayOut>,
}

#[derive(Serialize)]
struct Summary {
    rows: usize,
    first: Option<String>,
    last: Option<String>,
    continuous: Vec<String>,
    events: Vec<String>,
    hash: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut out = io::BufWriter::new(io::stdout());

    match cli.command {
        Commands::Summary { common } => {
            let store = open_store(&common)?;
            let summary = summarize(&store)?;
            write_json(&mut out, &summary)?;
        }
        Commands::Mask { common, column } => {
            let store = open_store(&common)?;
            let masked = store
                .mask_column(&column)
                .with_context(|| format!("mask column {column}"))?;
            write_json(&mut out, &points(masked, common.iso)?)?;
        }
        Commands::Align {
            common,
            line,
            event,
        } => {
            let store = open_store(&common)?;
            let aligned = store
                .align_columns(&line, &event)
                .with_context(|| format!("align {event} onto {line}"))?;
            write_json(&mut out, &points(aligned, common.iso)?)?;
        }
        Commands::Charts { common } => {
            let store = open_store(&common)?;
            let charts = build_charts(&store, store.config()).context("build charts")?;
            let charts = charts
                .into_iter()
                .map(|chart| chart_out(chart, common.iso))
                .collect::<Result<Vec<_>>>()?;
            write_json(&mut out, &charts)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn open_store(common: &Common) -> Result<TimeSeriesStore> {
    let config = match &common.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let store = TimeSeriesStore::load_with_config(&common.input, config)
        .with_context(|| format!("load {}", common.input.display()))?;
    info!(
        "{} rows from {}",
        store.data_scale(),
        display_name(&common.input)
    );
    Ok(store)
}

fn summarize(store: &TimeSeriesStore) -> Result<Summary> {
    let first = store.dates().iter().min().copied();
    let last = store.dates().iter().max().copied();
    Ok(Summary {
        rows: store.data_scale(),
        first: first.map(format_epoch_seconds).transpose()?,
        last: last.map(format_epoch_seconds).transpose()?,
        continuous: store.continuous_names().map(str::to_string).collect(),
        events: store.event_names().map(str::to_string).collect(),
        hash: store.source().map(|s| s.hash.clone()),
    })
}

fn points(masked: Masked, iso: bool) -> Result<Points> {
    let dates = if iso {
        Dates::Iso(
            masked
                .dates
                .iter()
                .map(|&ts| format_epoch_seconds(ts))
                .collect::<tracking_series::Result<Vec<_>>>()?,
        )
    } else {
        Dates::Epoch(masked.dates)
    };
    Ok(Points {
        dates,
        values: masked.values,
    })
}

fn chart_out(chart: ChartData, iso: bool) -> Result<ChartOut> {
    let overlays = chart
        .overlays
        .into_iter()
        .map(|overlay| {
            Ok(OverlayOut {
                event: overlay.event,
                points: points(overlay.points, iso)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ChartOut {
        name: chart.name,
        label: chart.label,
        line: points(chart.line, iso)?,
        overlays,
    })
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
