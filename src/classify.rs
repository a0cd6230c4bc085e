//! Column classification.
//!
//! Every data column is typed exactly once per load. The first pass decides
//! the role from the dominant cell type, the second pass materializes the
//! column in that role.

use std::collections::HashSet;

use time::UtcOffset;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::source::RawTable;
use crate::timestamp::parse_epoch_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Numeric readings, possibly with gaps.
    Continuous,
    /// Text labels whose presence marks an occurrence.
    Event,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Continuous(Vec<Option<f64>>),
    Event(Vec<bool>),
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Continuous(_) => ColumnKind::Continuous,
            Column::Event(_) => ColumnKind::Event,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Continuous(values) => values.len(),
            Column::Event(markers) => markers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decide a column's role. A column is continuous when every present cell
/// parses as a float, which includes a column with no present cells.
///
/// # Errors
///
/// A column whose present cells are all date/time values fits neither role
/// and is rejected with [`Error::Column`].
pub fn infer_kind<'a>(
    cells: impl IntoIterator<Item = &'a str>,
    config: &StoreConfig,
) -> Result<ColumnKind> {
    let present: Vec<&str> = cells.into_iter().filter(|cell| !config.is_missing(cell)).collect();
    if present.iter().all(|cell| parse_number(cell).is_some()) {
        return Ok(ColumnKind::Continuous);
    }
    if present
        .iter()
        .all(|cell| parse_epoch_seconds(cell, UtcOffset::UTC).is_ok())
    {
        return Err(Error::Column("column holds timestamps, not readings or labels".to_string()));
    }
    Ok(ColumnKind::Event)
}

pub fn build_column<'a>(
    kind: ColumnKind,
    cells: impl IntoIterator<Item = &'a str>,
    config: &StoreConfig,
) -> Result<Column> {
    match kind {
        ColumnKind::Continuous => {
            let mut values = Vec::new();
            for cell in cells {
                if config.is_missing(cell) {
                    values.push(None);
                    continue;
                }
                let value = parse_number(cell)
                    .ok_or_else(|| Error::Column(format!("non-numeric cell {cell:?} in continuous column")))?;
                values.push(if value.is_nan() { None } else { Some(value) });
            }
            Ok(Column::Continuous(values))
        }
        ColumnKind::Event => Ok(Column::Event(
            cells.into_iter().map(|cell| !config.is_missing(cell)).collect(),
        )),
    }
}

/// Classify every column after the first. Returns columns in header order.
pub fn classify_table(table: &RawTable, config: &StoreConfig) -> Result<Vec<(String, Column)>> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(table.headers.len().saturating_sub(1));
    for (idx, name) in table.headers.iter().enumerate().skip(1) {
        if name.is_empty() {
            return Err(Error::Column(format!("column {idx} has an empty header")));
        }
        if !seen.insert(name.as_str()) {
            return Err(Error::Column(format!("duplicate column header: {name}")));
        }
        let kind = infer_kind(table.column(idx), config)
            .map_err(|err| Error::Column(format!("{name:?}: {err}")))?;
        let column = build_column(kind, table.column(idx), config)?;
        log::debug!("classified column {name:?} as {kind:?}");
        columns.push((name.clone(), column));
    }
    Ok(columns)
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::parse_table;

    fn table(data: &str) -> RawTable {
        parse_table(data.as_bytes(), &StoreConfig::default()).expect("parse")
    }

    #[test]
    fn numeric_columns_are_continuous_with_gaps() {
        let config = StoreConfig::default();
        let column = build_column(
            infer_kind(["1.5", "", "NaN", "-2", "1e3"], &config).unwrap(),
            ["1.5", "", "NaN", "-2", "1e3"],
            &config,
        )
        .unwrap();
        assert_eq!(
            column,
            Column::Continuous(vec![Some(1.5), None, None, Some(-2.0), Some(1000.0)])
        );
    }

    #[test]
    fn text_columns_are_events() {
        let config = StoreConfig::default();
        let cells = ["", "ran", "", "12"];
        assert_eq!(infer_kind(cells, &config).unwrap(), ColumnKind::Event);
        let column = build_column(ColumnKind::Event, cells, &config).unwrap();
        assert_eq!(column, Column::Event(vec![false, true, false, true]));
    }

    #[test]
    fn empty_column_is_continuous() {
        let config = StoreConfig::default();
        assert_eq!(infer_kind(["", "", "n/a"], &config).unwrap(), ColumnKind::Continuous);
    }

    #[test]
    fn date_columns_fit_neither_role() {
        let config = StoreConfig::default();
        let err = infer_kind(["2024-05-03", "", "2024-05-04T10:00:00Z"], &config).unwrap_err();
        assert!(matches!(err, Error::Column(_)));

        // a single label among the dates makes it an event column
        let kind = infer_kind(["2024-05-03", "rest day"], &config).unwrap();
        assert_eq!(kind, ColumnKind::Event);

        let t = table("date,w,ended\n2024-05-01,1,2024-05-03\n2024-05-02,2,\n");
        match classify_table(&t, &config) {
            Err(Error::Column(msg)) => assert!(msg.contains("ended"), "{msg}"),
            other => panic!("expected column error, got {other:?}"),
        }
    }

    #[test]
    fn infinite_literals_stay_present() {
        let config = StoreConfig::default();
        let column = build_column(ColumnKind::Continuous, ["inf", "1"], &config).unwrap();
        assert_eq!(column, Column::Continuous(vec![Some(f64::INFINITY), Some(1.0)]));
    }

    #[test]
    fn classify_table_keeps_header_order() {
        let t = table("date,weight,note,reps\n2024-01-01,1,,3\n2024-01-02,2,x,\n");
        let columns = classify_table(&t, &StoreConfig::default()).unwrap();
        let summary: Vec<_> = columns.iter().map(|(n, c)| (n.as_str(), c.kind())).collect();
        assert_eq!(
            summary,
            vec![
                ("weight", ColumnKind::Continuous),
                ("note", ColumnKind::Event),
                ("reps", ColumnKind::Continuous),
            ]
        );
        assert!(columns.iter().all(|(_, c)| c.len() == 2));
    }

    #[test]
    fn bad_headers_fail_loudly() {
        let t = table("date,a,a\n2024-01-01,1,2\n");
        assert!(matches!(classify_table(&t, &StoreConfig::default()), Err(Error::Column(_))));

        let t = table("date,,b\n2024-01-01,1,2\n");
        assert!(matches!(classify_table(&t, &StoreConfig::default()), Err(Error::Column(_))));
    }
}
