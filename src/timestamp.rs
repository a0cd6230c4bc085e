//! Date/time cell parsing and epoch-second conversion.
//!
//! Cells are reduced to whole UTC epoch seconds at load time. Accepted forms:
//! RFC 3339 with an explicit offset, `YYYY-MM-DD[ HH:MM[:SS[.fff]]]` (also
//! with `T` or `/` separators, interpreted at the configured offset), basic
//! `YYYYMMDD` dates, and bare integer epoch seconds within the range a
//! calendar timestamp can represent.

use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Error, Result};

/// Parse one timestamp cell into epoch seconds.
///
/// Fractional seconds are dropped, which floors toward negative infinity for
/// every accepted form.
pub fn parse_epoch_seconds(value: &str, offset: UtcOffset) -> Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Column("empty timestamp cell".to_string()));
    }
    if let Some(date) = parse_basic_date(value) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT)
            .assume_offset(offset)
            .unix_timestamp());
    }
    if is_integer(value) {
        return value
            .parse::<i64>()
            .ok()
            .filter(|&secs| OffsetDateTime::from_unix_timestamp(secs).is_ok())
            .ok_or_else(|| Error::Column(format!("epoch seconds out of range: {value}")));
    }
    if let Ok(odt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(odt.unix_timestamp());
    }
    let pdt = parse_naive(value)
        .ok_or_else(|| Error::Column(format!("unrecognized timestamp: {value}")))?;
    Ok(pdt.assume_offset(offset).unix_timestamp())
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYYMMDD`. Eight digits that are not a calendar date fall through to
/// epoch seconds.
fn parse_basic_date(value: &str) -> Option<Date> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[..4].parse::<i32>().ok()?;
    let month = Month::try_from(value[4..6].parse::<u8>().ok()?).ok()?;
    let day = value[6..].parse::<u8>().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_naive(value: &str) -> Option<PrimitiveDateTime> {
    let (date_part, time_part) = match value.find(['T', ' ']) {
        Some(idx) => (&value[..idx], Some(value[idx + 1..].trim())),
        None => (value, None),
    };
    let date = parse_date(date_part)?;
    let time = match time_part {
        Some(part) if !part.is_empty() => parse_time(part)?,
        _ => Time::MIDNIGHT,
    };
    Some(PrimitiveDateTime::new(date, time))
}

fn parse_date(value: &str) -> Option<Date> {
    let sep = if value.contains('-') { '-' } else { '/' };
    let mut parts = value.split(sep);
    let year_str = parts.next()?;
    if year_str.len() != 4 {
        return None;
    }
    let year = year_str.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_time(value: &str) -> Option<Time> {
    let (clock, _fraction) = match value.split_once('.') {
        Some((clock, fraction)) if fraction.bytes().all(|b| b.is_ascii_digit()) => {
            (clock, Some(fraction))
        }
        Some(_) => return None,
        None => (value, None),
    };
    let mut parts = clock.split(':');
    let hour = parts.next()?.parse::<u8>().ok()?;
    let minute = parts.next()?.parse::<u8>().ok()?;
    let second = match parts.next() {
        Some(s) => s.parse::<u8>().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Time::from_hms(hour, minute, second).ok()
}

/// Conversion from epoch seconds to calendar timestamps, preserving shape.
pub trait IntoTimestamp {
    type Output;

    fn into_timestamp(self) -> Result<Self::Output>;
}

impl IntoTimestamp for i64 {
    type Output = OffsetDateTime;

    fn into_timestamp(self) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self)
            .map_err(|_| Error::TimestampRange(format!("{self} seconds")))
    }
}

impl IntoTimestamp for f64 {
    type Output = OffsetDateTime;

    fn into_timestamp(self) -> Result<OffsetDateTime> {
        if !self.is_finite() {
            return Err(Error::TimestampRange(format!("{self} seconds")));
        }
        let nanos = (self * 1e9).round();
        if nanos.abs() >= i128::MAX as f64 {
            return Err(Error::TimestampRange(format!("{self} seconds")));
        }
        OffsetDateTime::from_unix_timestamp_nanos(nanos as i128)
            .map_err(|_| Error::TimestampRange(format!("{self} seconds")))
    }
}

impl<T: IntoTimestamp + Copy> IntoTimestamp for &[T] {
    type Output = Vec<T::Output>;

    fn into_timestamp(self) -> Result<Self::Output> {
        self.iter().map(|value| value.into_timestamp()).collect()
    }
}

impl<T: IntoTimestamp + Copy> IntoTimestamp for &Vec<T> {
    type Output = Vec<T::Output>;

    fn into_timestamp(self) -> Result<Self::Output> {
        self.as_slice().into_timestamp()
    }
}

impl<T: IntoTimestamp + Copy> IntoTimestamp for Vec<T> {
    type Output = Vec<T::Output>;

    fn into_timestamp(self) -> Result<Self::Output> {
        self.as_slice().into_timestamp()
    }
}

/// Render epoch seconds as an RFC 3339 string.
pub fn format_epoch_seconds(seconds: i64) -> Result<String> {
    seconds
        .into_timestamp()?
        .format(&Rfc3339)
        .map_err(|err| Error::TimestampRange(format!("{seconds} seconds: {err}")))
}
