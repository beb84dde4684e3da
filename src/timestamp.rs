//! Calendar timestamp used for DATETIME binds and fetched temporal values.
//!
//! Text form is either `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`; rendering always
//! uses the full form. Calendar validation is done by [`normalize`], a pure
//! function over explicit fields, so no process-wide time zone state is
//! consulted.

use crate::error::{Error, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// Length of the full `YYYY-MM-DD HH:MM:SS` format.
pub const FULL_FORMAT_LEN: usize = 19;

/// A calendar date-time without time zone.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    year: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl Timestamp {
    /// Build a timestamp from explicit fields.
    ///
    /// Fails with a parse error if the fields do not name a real calendar instant.
    pub fn new(
        year: u32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        normalize(
            i64::from(year),
            i64::from(month),
            i64::from(day),
            i64::from(hour),
            i64::from(minute),
            i64::from(second),
        )
        .ok_or_else(|| {
            Error::parse(format!(
                "invalid calendar value {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        })
    }

    /// Build a date-only timestamp (time fields zero).
    pub fn from_date(year: u32, month: u32, day: u32) -> Result<Self> {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    ///
    /// # Example
    ///
    /// ```
    /// use mysql_thin_rs::Timestamp;
    ///
    /// let ts = Timestamp::from_text("2024-02-29").unwrap();
    /// assert_eq!(ts.to_text(), "2024-02-29 00:00:00");
    /// assert!(Timestamp::from_text("2023-02-29").is_err());
    /// ```
    pub fn from_text(s: &str) -> Result<Self> {
        if s.len() > FULL_FORMAT_LEN {
            return Err(Error::parse(format!(
                "'{}' is longer than {} characters",
                s, FULL_FORMAT_LEN
            )));
        }

        let fields = scan_fields(s)
            .ok_or_else(|| Error::parse(format!("'{}' is not a date or date-time", s)))?;

        let ts = match fields.as_slice() {
            [y, mo, d] => normalize(*y, *mo, *d, 0, 0, 0),
            [y, mo, d, h, mi, se] => normalize(*y, *mo, *d, *h, *mi, *se),
            other => {
                return Err(Error::parse(format!(
                    "'{}' has {} fields, expected 3 or 6",
                    s,
                    other.len()
                )))
            }
        };

        ts.ok_or_else(|| Error::parse(format!("'{}' is not a valid calendar value", s)))
    }

    /// Render as `YYYY-MM-DD HH:MM:SS`.
    pub fn to_text(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// Current local wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        // Local time always lies inside the four-digit year range.
        Self::from_naive(&now).unwrap_or(Self {
            year: 1970,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        })
    }

    /// Convert from a chrono value. Sub-second precision is dropped.
    pub fn from_naive(dt: &NaiveDateTime) -> Result<Self> {
        let mut ts = Self {
            year: 1970,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        };
        ts.set_time(dt)?;
        Ok(ts)
    }

    /// Replace every field from an already-normalized calendar value.
    pub fn set_time(&mut self, dt: &NaiveDateTime) -> Result<()> {
        if !(1..=9999).contains(&dt.year()) {
            return Err(Error::parse(format!(
                "year {} outside the four-digit range",
                dt.year()
            )));
        }
        self.year = dt.year() as u32;
        self.month = dt.month();
        self.day = dt.day();
        self.hour = dt.hour();
        self.minute = dt.minute();
        self.second = dt.second();
        Ok(())
    }

    /// Convert to a chrono value.
    pub fn to_naive(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.year as i32, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, self.second))
            .unwrap_or_default()
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s)
    }
}

impl From<Timestamp> for NaiveDateTime {
    fn from(ts: Timestamp) -> Self {
        ts.to_naive()
    }
}

impl TryFrom<NaiveDateTime> for Timestamp {
    type Error = Error;

    fn try_from(dt: NaiveDateTime) -> Result<Self> {
        Self::from_naive(&dt)
    }
}

/// Validate explicit calendar fields.
///
/// Returns `None` unless every field is inside its calendar range: year
/// 1..=9999, month 1..=12, day within the month (leap years included), hour
/// 0..=23, minute and second 0..=59.
pub fn normalize(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Option<Timestamp> {
    if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    if day < 1 || day > i64::from(days_in_month(year as u32, month as u32)) {
        return None;
    }
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) || !(0..=59).contains(&second) {
        return None;
    }
    Some(Timestamp {
        year: year as u32,
        month: month as u32,
        day: day as u32,
        hour: hour as u32,
        minute: minute as u32,
        second: second as u32,
    })
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-based) of `year`.
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Scan `%d-%d-%d %d:%d:%d` and return the fields read before the first
/// mismatch. Returns `None` when anything but whitespace trails the last field.
fn scan_fields(s: &str) -> Option<Vec<i64>> {
    const SEPARATORS: [Option<u8>; 6] = [
        None,
        Some(b'-'),
        Some(b'-'),
        Some(b' '),
        Some(b':'),
        Some(b':'),
    ];

    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut fields = Vec::with_capacity(6);

    for sep in SEPARATORS {
        let mark = pos;
        match sep {
            None => {}
            // A space in the pattern matches any run of whitespace, even an empty one.
            Some(b' ') => {
                while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
            }
            Some(c) => {
                if bytes.get(pos) != Some(&c) {
                    break;
                }
                pos += 1;
            }
        }
        match scan_int(bytes, pos) {
            Some((value, next)) => {
                fields.push(value);
                pos = next;
            }
            None => {
                pos = mark;
                break;
            }
        }
    }

    if bytes[pos..].iter().all(|b| b.is_ascii_whitespace()) {
        Some(fields)
    } else {
        None
    }
}

/// Scan one `%d`: optional leading whitespace, optional sign, one or more digits.
fn scan_int(bytes: &[u8], mut pos: usize) -> Option<(i64, usize)> {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let start = pos;
    let mut value: i64 = 0;
    while let Some(b) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
        pos += 1;
    }
    if pos == start {
        return None;
    }
    Some((if negative { -value } else { value }, pos))
}
