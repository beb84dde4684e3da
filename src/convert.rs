//! Conversions between column buffers, bound parameters and Rust types.
//!
//! Reading goes through [`WireValue`], a borrowed view of one non-NULL column
//! value tagged by its wire kind. [`FromColumn`] turns it into the requested
//! type; the pair (wire kind, requested type) selects the conversion:
//!
//! | Wire kind | Integers | Floats | `String` | `Timestamp` |
//! |-----------|----------|--------|----------|-------------|
//! | integer | `as` cast | `as` cast | decimal | error |
//! | float / double | truncating cast | `as` cast | decimal | error |
//! | DATE / DATETIME | error | error | `YYYY-MM-DD HH:MM:SS` | value |
//! | TIME | error | error | `[-]HH:MM:SS` | error |
//! | text / decimal | parsed | parsed | as-is | parsed |
//! | blob | error | error | lossy UTF-8 | error |
//!
//! Writing goes through [`ToParam`], which picks the wire type of a bound
//! parameter from the Rust type.

use crate::column::Column;
use crate::error::{Error, Result};
use crate::protocol::decode::TemporalValue;
use crate::protocol::types::{ParamValue, ValueKind};
use crate::timestamp::Timestamp;
use chrono::{NaiveDate, NaiveDateTime};

/// A borrowed, non-NULL column value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireValue<'a> {
    Signed(i64),
    Unsigned(u64),
    Float(f32),
    Double(f64),
    DateTime(TemporalValue),
    Time(TemporalValue),
    Text(&'a [u8]),
    Blob(&'a [u8]),
}

impl<'a> WireValue<'a> {
    /// Decode the current value of `column`. Returns `None` for NULL.
    pub fn from_column(column: &'a Column) -> Result<Option<Self>> {
        if column.is_null() {
            return Ok(None);
        }
        let data = column.data();
        let value = match column.kind() {
            ValueKind::Integer { width } => {
                let mut bytes = [0u8; 8];
                bytes[..width].copy_from_slice(&data[..width]);
                let raw = u64::from_le_bytes(bytes);
                if column.is_unsigned() {
                    WireValue::Unsigned(raw)
                } else {
                    // Sign-extend from the column width.
                    let shift = 64 - 8 * width as u32;
                    WireValue::Signed(((raw << shift) as i64) >> shift)
                }
            }
            ValueKind::Float => WireValue::Float(f32::from_le_bytes(fixed(data)?)),
            ValueKind::Double => WireValue::Double(f64::from_le_bytes(fixed(data)?)),
            ValueKind::DateTime => WireValue::DateTime(TemporalValue::from_buffer(data)?),
            ValueKind::Time => WireValue::Time(TemporalValue::from_buffer(data)?),
            ValueKind::Text => WireValue::Text(data),
            ValueKind::Blob => WireValue::Blob(data),
            ValueKind::Null => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Short name of the wire kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Signed(_) => "signed integer",
            WireValue::Unsigned(_) => "unsigned integer",
            WireValue::Float(_) => "float",
            WireValue::Double(_) => "double",
            WireValue::DateTime(_) => "datetime",
            WireValue::Time(_) => "time",
            WireValue::Text(_) => "text",
            WireValue::Blob(_) => "blob",
        }
    }

    /// Canonical text form of the value.
    pub fn to_text(&self) -> String {
        match self {
            WireValue::Signed(v) => v.to_string(),
            WireValue::Unsigned(v) => v.to_string(),
            WireValue::Float(v) => v.to_string(),
            WireValue::Double(v) => v.to_string(),
            WireValue::DateTime(t) => t.datetime_text(),
            WireValue::Time(t) => t.time_text(),
            WireValue::Text(b) | WireValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

fn fixed<const N: usize>(data: &[u8]) -> Result<[u8; N]> {
    data.try_into()
        .map_err(|_| Error::fetch(format!("expected {} bytes, got {}", N, data.len())))
}

#[track_caller]
fn unsupported<T>(value: &WireValue<'_>, target: &str) -> Result<T> {
    Err(Error::type_conversion(format!(
        "cannot convert {} to {}",
        value.kind_name(),
        target
    )))
}

fn text_of<'a>(bytes: &'a [u8], target: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map(str::trim)
        .map_err(|_| Error::type_conversion(format!("text is not valid UTF-8 for {}", target)))
}

/// Types a column value can be read as.
pub trait FromColumn: Sized {
    /// Convert a non-NULL value.
    fn from_wire(value: WireValue<'_>) -> Result<Self>;

    /// Value for SQL NULL; fails unless the type can represent it.
    #[track_caller]
    fn from_null(column: &str) -> Result<Self> {
        Err(Error::null_value(column))
    }
}

macro_rules! impl_from_column_int {
    ($($t:ty),*) => {$(
        impl FromColumn for $t {
            fn from_wire(value: WireValue<'_>) -> Result<Self> {
                match value {
                    WireValue::Signed(v) => Ok(v as $t),
                    WireValue::Unsigned(v) => Ok(v as $t),
                    WireValue::Float(v) => Ok(v as $t),
                    WireValue::Double(v) => Ok(v as $t),
                    WireValue::Text(b) => {
                        let s = text_of(b, stringify!($t))?;
                        if let Ok(v) = s.parse::<$t>() {
                            return Ok(v);
                        }
                        // Decimals such as "12.50" truncate toward zero.
                        s.parse::<f64>().map(|v| v as $t).map_err(|_| {
                            Error::type_conversion(format!(
                                "cannot parse {:?} as {}",
                                s,
                                stringify!($t)
                            ))
                        })
                    }
                    other => unsupported(&other, stringify!($t)),
                }
            }
        }
    )*};
}

impl_from_column_int!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);

macro_rules! impl_from_column_float {
    ($($t:ty),*) => {$(
        impl FromColumn for $t {
            fn from_wire(value: WireValue<'_>) -> Result<Self> {
                match value {
                    WireValue::Signed(v) => Ok(v as $t),
                    WireValue::Unsigned(v) => Ok(v as $t),
                    WireValue::Float(v) => Ok(v as $t),
                    WireValue::Double(v) => Ok(v as $t),
                    WireValue::Text(b) => {
                        let s = text_of(b, stringify!($t))?;
                        s.parse::<$t>().map_err(|_| {
                            Error::type_conversion(format!(
                                "cannot parse {:?} as {}",
                                s,
                                stringify!($t)
                            ))
                        })
                    }
                    other => unsupported(&other, stringify!($t)),
                }
            }
        }
    )*};
}

impl_from_column_float!(f32, f64);

impl FromColumn for bool {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        match value {
            WireValue::Signed(v) => Ok(v != 0),
            WireValue::Unsigned(v) => Ok(v != 0),
            WireValue::Text(_) => i64::from_wire(value).map(|v| v != 0),
            other => unsupported(&other, "bool"),
        }
    }
}

impl FromColumn for String {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        Ok(value.to_text())
    }
}

impl FromColumn for Vec<u8> {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        match value {
            WireValue::Text(b) | WireValue::Blob(b) => Ok(b.to_vec()),
            other => Ok(other.to_text().into_bytes()),
        }
    }
}

impl FromColumn for Timestamp {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        match value {
            WireValue::DateTime(t) => Timestamp::new(
                t.year as u32,
                t.month as u32,
                t.day as u32,
                t.hours,
                t.minute as u32,
                t.second as u32,
            )
            .map_err(|_| Error::type_conversion(format!("{} is not a valid timestamp", t))),
            WireValue::Text(b) => {
                let s = text_of(b, "Timestamp")?;
                Timestamp::from_text(s).map_err(|_| {
                    Error::type_conversion(format!("{:?} is not a valid timestamp", s))
                })
            }
            other => unsupported(&other, "Timestamp"),
        }
    }
}

impl FromColumn for NaiveDateTime {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        match value {
            WireValue::DateTime(t) => {
                NaiveDate::from_ymd_opt(t.year as i32, t.month as u32, t.day as u32)
                    .and_then(|d| {
                        d.and_hms_micro_opt(t.hours, t.minute as u32, t.second as u32, t.micros)
                    })
                    .ok_or_else(|| {
                        Error::type_conversion(format!("{} is not a valid date-time", t))
                    })
            }
            WireValue::Text(_) => Timestamp::from_wire(value).map(|ts| ts.to_naive()),
            other => unsupported(&other, "NaiveDateTime"),
        }
    }
}

impl<T: FromColumn> FromColumn for Option<T> {
    fn from_wire(value: WireValue<'_>) -> Result<Self> {
        T::from_wire(value).map(Some)
    }

    fn from_null(_column: &str) -> Result<Self> {
        Ok(None)
    }
}

/// Types that can be bound to a statement placeholder.
pub trait ToParam {
    /// Convert into a bound value.
    ///
    /// Fails with a bind error when the value has no MySQL representation.
    fn to_param(self) -> Result<ParamValue>;
}

macro_rules! impl_to_param {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl ToParam for $t {
            fn to_param(self) -> Result<ParamValue> {
                Ok(ParamValue::$variant(self))
            }
        }
    )*};
}

impl_to_param!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => Text,
    Timestamp => DateTime,
);

impl ToParam for bool {
    fn to_param(self) -> Result<ParamValue> {
        Ok(ParamValue::Int8(self as i8))
    }
}

impl ToParam for &str {
    fn to_param(self) -> Result<ParamValue> {
        Ok(ParamValue::Text(self.to_string()))
    }
}

impl ToParam for &String {
    fn to_param(self) -> Result<ParamValue> {
        Ok(ParamValue::Text(self.clone()))
    }
}

impl ToParam for &Timestamp {
    fn to_param(self) -> Result<ParamValue> {
        Ok(ParamValue::DateTime(*self))
    }
}

impl ToParam for NaiveDateTime {
    /// Only years 1..=9999 fit a DATETIME.
    fn to_param(self) -> Result<ParamValue> {
        Timestamp::from_naive(&self)
            .map(ParamValue::DateTime)
            .map_err(|_| Error::bind(format!("{} is outside the DATETIME range", self)))
    }
}

impl ToParam for ParamValue {
    fn to_param(self) -> Result<ParamValue> {
        Ok(self)
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(self) -> Result<ParamValue> {
        match self {
            Some(v) => v.to_param(),
            None => Ok(ParamValue::Null),
        }
    }
}
