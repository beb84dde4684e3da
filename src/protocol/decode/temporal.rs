//! Binary-protocol temporal decoders.
//!
//! DATE, DATETIME and TIMESTAMP are sent as a length byte (0, 4, 7 or 11)
//! followed by:
//! - year: u16 LE
//! - month, day: u8
//! - hour, minute, second: u8 (length >= 7)
//! - microseconds: u32 LE (length 11)
//!
//! TIME is sent as a length byte (0, 8 or 12) followed by:
//! - negative: u8 (1 if negative)
//! - days: u32 LE
//! - hour, minute, second: u8
//! - microseconds: u32 LE (length 12)
//!
//! Both decode into a [`TemporalValue`], which is stored in a column buffer as
//! a normalized 16-byte record so that every temporal column has a fixed
//! buffer width.

use crate::error::{Error, Result};
use crate::protocol::types::TEMPORAL_BUFFER_LEN;
use std::fmt;

/// A decoded DATE/DATETIME/TIMESTAMP or TIME value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemporalValue {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// Hours; for TIME this includes `days * 24` and may exceed 23.
    pub hours: u32,
    pub minute: u8,
    pub second: u8,
    /// Set for negative TIME values.
    pub negative: bool,
    pub micros: u32,
}

impl TemporalValue {
    /// Serialize into the fixed column buffer layout.
    pub fn to_buffer(&self) -> [u8; TEMPORAL_BUFFER_LEN] {
        let mut out = [0u8; TEMPORAL_BUFFER_LEN];
        out[0..2].copy_from_slice(&self.year.to_le_bytes());
        out[2] = self.month;
        out[3] = self.day;
        out[4..8].copy_from_slice(&self.hours.to_le_bytes());
        out[8] = self.minute;
        out[9] = self.second;
        out[10] = self.negative as u8;
        out[12..16].copy_from_slice(&self.micros.to_le_bytes());
        out
    }

    /// Read back a value written by [`TemporalValue::to_buffer`].
    pub fn from_buffer(data: &[u8]) -> Result<Self> {
        if data.len() < TEMPORAL_BUFFER_LEN {
            return Err(Error::fetch(format!(
                "temporal buffer must be {} bytes, got {}",
                TEMPORAL_BUFFER_LEN,
                data.len()
            )));
        }
        Ok(Self {
            year: u16::from_le_bytes([data[0], data[1]]),
            month: data[2],
            day: data[3],
            hours: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            minute: data[8],
            second: data[9],
            negative: data[10] != 0,
            micros: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
        })
    }

    /// Render as `[-]HH:MM:SS`.
    pub fn time_text(&self) -> String {
        format!(
            "{}{:02}:{:02}:{:02}",
            if self.negative { "-" } else { "" },
            self.hours,
            self.minute,
            self.second
        )
    }

    /// Render as `YYYY-MM-DD HH:MM:SS`.
    pub fn datetime_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hours, self.minute, self.second
        )
    }
}

/// Decode a DATE, DATETIME or TIMESTAMP value (without its length byte).
///
/// # Errors
/// Returns `Error::Protocol` if the length is not 0, 4, 7 or 11 or a field is
/// out of range. The all-zero date `0000-00-00` is accepted.
pub fn decode_datetime(data: &[u8]) -> Result<TemporalValue> {
    let mut value = TemporalValue::default();
    match data.len() {
        0 => return Ok(value),
        4 | 7 | 11 => {}
        n => {
            return Err(Error::protocol(format!(
                "DATETIME value must be 0, 4, 7 or 11 bytes, got {}",
                n
            )))
        }
    }

    value.year = u16::from_le_bytes([data[0], data[1]]);
    value.month = data[2];
    value.day = data[3];
    if data.len() >= 7 {
        value.hours = data[4] as u32;
        value.minute = data[5];
        value.second = data[6];
    }
    if data.len() == 11 {
        value.micros = u32::from_le_bytes([data[7], data[8], data[9], data[10]]);
    }

    if value.month > 12 {
        return Err(Error::protocol(format!("Invalid month: {}", value.month)));
    }
    if value.day > 31 {
        return Err(Error::protocol(format!("Invalid day: {}", value.day)));
    }
    if value.hours > 23 {
        return Err(Error::protocol(format!("Invalid hour: {}", value.hours)));
    }
    check_minute_second(&value)?;
    Ok(value)
}

/// Decode a TIME value (without its length byte).
///
/// # Errors
/// Returns `Error::Protocol` if the length is not 0, 8 or 12 or a field is out
/// of range.
pub fn decode_time(data: &[u8]) -> Result<TemporalValue> {
    let mut value = TemporalValue::default();
    match data.len() {
        0 => return Ok(value),
        8 | 12 => {}
        n => {
            return Err(Error::protocol(format!(
                "TIME value must be 0, 8 or 12 bytes, got {}",
                n
            )))
        }
    }

    value.negative = data[0] == 1;
    let days = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    if data[5] > 23 {
        return Err(Error::protocol(format!("Invalid hour: {}", data[5])));
    }
    value.hours = days
        .checked_mul(24)
        .and_then(|h| h.checked_add(data[5] as u32))
        .ok_or_else(|| Error::protocol(format!("TIME value out of range: {} days", days)))?;
    value.minute = data[6];
    value.second = data[7];
    if data.len() == 12 {
        value.micros = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    }
    check_minute_second(&value)?;
    Ok(value)
}

fn check_minute_second(value: &TemporalValue) -> Result<()> {
    if value.minute > 59 {
        return Err(Error::protocol(format!("Invalid minute: {}", value.minute)));
    }
    if value.second > 59 {
        return Err(Error::protocol(format!("Invalid second: {}", value.second)));
    }
    if value.micros > 999_999 {
        return Err(Error::protocol(format!(
            "Invalid microseconds: {}",
            value.micros
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_date_only() {
        // 2024-10-21
        let value = decode_datetime(&[0xE8, 0x07, 10, 21]).unwrap();
        assert_eq!((value.year, value.month, value.day), (2024, 10, 21));
        assert_eq!(value.hours, 0);
        assert_eq!(value.to_string(), "2024-10-21 00:00:00");
    }

    #[test]
    fn test_decode_datetime_with_micros() {
        // 2024-10-21 12:36:05.000250
        let data = [0xE8, 0x07, 10, 21, 12, 36, 5, 0xFA, 0, 0, 0];
        let value = decode_datetime(&data).unwrap();
        assert_eq!(value.hours, 12);
        assert_eq!(value.minute, 36);
        assert_eq!(value.second, 5);
        assert_eq!(value.micros, 250);
        assert_eq!(value.datetime_text(), "2024-10-21 12:36:05");
    }

    #[test]
    fn test_decode_zero_datetime() {
        let value = decode_datetime(&[]).unwrap();
        assert_eq!(value.to_string(), "0000-00-00 00:00:00");
    }

    #[test]
    fn test_decode_datetime_wrong_length() {
        assert!(decode_datetime(&[0xE8, 0x07, 10]).is_err());
    }

    #[test]
    fn test_decode_datetime_invalid_month() {
        assert!(decode_datetime(&[0xE8, 0x07, 13, 1]).is_err());
    }

    #[test]
    fn test_decode_negative_time_with_days() {
        // -1 day 02:03:04 => -26:03:04
        let value = decode_time(&[1, 1, 0, 0, 0, 2, 3, 4]).unwrap();
        assert!(value.negative);
        assert_eq!(value.hours, 26);
        assert_eq!(value.time_text(), "-26:03:04");
    }

    #[test]
    fn test_decode_zero_time() {
        assert_eq!(decode_time(&[]).unwrap().time_text(), "00:00:00");
    }

    #[test]
    fn test_buffer_layout() {
        let value = TemporalValue {
            year: 1999,
            month: 6,
            day: 15,
            hours: 838,
            minute: 59,
            second: 58,
            negative: true,
            micros: 123_456,
        };
        let buffer = value.to_buffer();
        assert_eq!(&buffer[0..2], &1999u16.to_le_bytes());
        assert_eq!(buffer[10], 1);
        assert_eq!(TemporalValue::from_buffer(&buffer).unwrap(), value);
        assert!(TemporalValue::from_buffer(&buffer[..8]).is_err());
    }
}
