//! Masking and event alignment over row-aligned slices.
//!
//! These functions take the date column explicitly so they can be applied to
//! any index-consistent pair, not only to a loaded store.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};

/// Gap-free, index-aligned `(dates, values)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Masked {
    pub dates: Vec<i64>,
    pub values: Vec<f64>,
}

impl Masked {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Keep only the positions where `values` holds a finite number.
pub fn mask(dates: &[i64], values: &[Option<f64>]) -> Result<Masked> {
    check_len(dates.len(), values.len())?;
    let mut out = Masked::default();
    for (&date, value) in dates.iter().zip(values) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            out.dates.push(date);
            out.values.push(v);
        }
    }
    Ok(out)
}

/// Linear interpolation table over a masked line, sorted by date.
#[derive(Debug, Clone)]
pub struct InterpTable {
    xs: Vec<i64>,
    ys: Vec<f64>,
    exact: HashMap<i64, f64>,
}

impl InterpTable {
    /// Build from a masked line. Returns `None` when the line is empty.
    pub fn new(line: &Masked) -> Option<Self> {
        if line.is_empty() {
            return None;
        }
        let mut exact = HashMap::with_capacity(line.len());
        for (date, value) in line.iter() {
            // first row wins on duplicate dates
            exact.entry(date).or_insert(value);
        }
        let mut points: Vec<(i64, f64)> = line.iter().collect();
        points.sort_by_key(|&(date, _)| date);
        let (xs, ys) = points.into_iter().unzip();
        Some(Self { xs, ys, exact })
    }

    /// Value at `x`: the line's own reading when `x` is one of its dates,
    /// otherwise interpolated, clamped to the end values outside the range.
    pub fn value_at(&self, x: i64) -> f64 {
        if let Some(&value) = self.exact.get(&x) {
            return value;
        }
        self.interp(x)
    }

    fn interp(&self, x: i64) -> f64 {
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[last] {
            return self.ys[last];
        }
        // xs[hi - 1] <= x < xs[hi]
        let hi = self.xs.partition_point(|&v| v <= x);
        let lo = hi - 1;
        let (x0, x1) = (self.xs[lo], self.xs[hi]);
        let (y0, y1) = (self.ys[lo], self.ys[hi]);
        // the span may exceed i64::MAX
        let t = (i128::from(x) - i128::from(x0)) as f64 / (i128::from(x1) - i128::from(x0)) as f64;
        y0 + (y1 - y0) * t
    }
}

/// Place every event occurrence onto the continuous line.
///
/// Output follows row order. Fails with `InsufficientData` only when at least
/// one event occurs and the line has no finite points.
pub fn align_events(dates: &[i64], line: &[Option<f64>], markers: &[bool]) -> Result<Masked> {
    check_len(dates.len(), markers.len())?;
    let masked = mask(dates, line)?;

    let occurrences: Vec<i64> = dates
        .iter()
        .zip(markers)
        .filter(|&(_, &marked)| marked)
        .map(|(&date, _)| date)
        .collect();
    if occurrences.is_empty() {
        return Ok(Masked::default());
    }

    let table = InterpTable::new(&masked).ok_or(Error::InsufficientData)?;
    let values = occurrences.iter().map(|&date| table.value_at(date)).collect();
    Ok(Masked {
        dates: occurrences,
        values,
    })
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}
