//! Bound parameter values for `COM_STMT_EXECUTE`.
//!
//! Each placeholder of a prepared statement is described to the server by a
//! type tag plus an unsigned flag, followed by its binary value. SQL NULL is
//! carried in the null bitmap and sends no value bytes.

use crate::protocol::constants::*;
use crate::protocol::message::{lenenc_bytes_wire_size, WriteExt};
use crate::timestamp::Timestamp;

/// Wire length of a DATETIME value without fractional seconds.
const DATETIME_WIRE_LEN: u8 = 7;

/// A value bound to one statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Character data, sent as VAR_STRING.
    Text(String),
    /// Opaque bytes, sent as BLOB.
    Blob(Vec<u8>),
    /// Calendar value, sent as DATETIME.
    DateTime(Timestamp),
}

impl ParamValue {
    /// Wire type tag announced for this value.
    pub fn type_tag(&self) -> u8 {
        match self {
            ParamValue::Null => MYSQL_TYPE_NULL,
            ParamValue::Int8(_) | ParamValue::UInt8(_) => MYSQL_TYPE_TINY,
            ParamValue::Int16(_) | ParamValue::UInt16(_) => MYSQL_TYPE_SHORT,
            ParamValue::Int32(_) | ParamValue::UInt32(_) => MYSQL_TYPE_LONG,
            ParamValue::Int64(_) | ParamValue::UInt64(_) => MYSQL_TYPE_LONGLONG,
            ParamValue::Float(_) => MYSQL_TYPE_FLOAT,
            ParamValue::Double(_) => MYSQL_TYPE_DOUBLE,
            ParamValue::Text(_) => MYSQL_TYPE_VAR_STRING,
            ParamValue::Blob(_) => MYSQL_TYPE_BLOB,
            ParamValue::DateTime(_) => MYSQL_TYPE_DATETIME,
        }
    }

    /// Whether the value is an unsigned integer.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ParamValue::UInt8(_)
                | ParamValue::UInt16(_)
                | ParamValue::UInt32(_)
                | ParamValue::UInt64(_)
        )
    }

    /// Whether the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Flag byte sent after the type tag.
    pub fn flag_byte(&self) -> u8 {
        if self.is_unsigned() {
            PARAM_UNSIGNED_FLAG
        } else {
            0
        }
    }

    /// Byte length of the payload for variable-length values, `None` otherwise.
    pub fn length(&self) -> Option<usize> {
        match self {
            ParamValue::Text(s) => Some(s.len()),
            ParamValue::Blob(b) => Some(b.len()),
            _ => None,
        }
    }

    /// Size of the encoded value in the execute packet.
    pub fn value_wire_size(&self) -> usize {
        match self {
            ParamValue::Null => 0,
            ParamValue::Int8(_) | ParamValue::UInt8(_) => 1,
            ParamValue::Int16(_) | ParamValue::UInt16(_) => 2,
            ParamValue::Int32(_) | ParamValue::UInt32(_) | ParamValue::Float(_) => 4,
            ParamValue::Int64(_) | ParamValue::UInt64(_) | ParamValue::Double(_) => 8,
            ParamValue::Text(s) => lenenc_bytes_wire_size(s.len()),
            ParamValue::Blob(b) => lenenc_bytes_wire_size(b.len()),
            ParamValue::DateTime(_) => 1 + DATETIME_WIRE_LEN as usize,
        }
    }

    /// Append the binary encoding of the value.
    pub fn write_value(&self, buf: &mut Vec<u8>) {
        match self {
            ParamValue::Null => {}
            ParamValue::Int8(v) => buf.write_u8(*v as u8),
            ParamValue::UInt8(v) => buf.write_u8(*v),
            ParamValue::Int16(v) => buf.write_u16_le(*v as u16),
            ParamValue::UInt16(v) => buf.write_u16_le(*v),
            ParamValue::Int32(v) => buf.write_u32_le(*v as u32),
            ParamValue::UInt32(v) => buf.write_u32_le(*v),
            ParamValue::Int64(v) => buf.write_u64_le(*v as u64),
            ParamValue::UInt64(v) => buf.write_u64_le(*v),
            ParamValue::Float(v) => buf.write_bytes(&v.to_le_bytes()),
            ParamValue::Double(v) => buf.write_bytes(&v.to_le_bytes()),
            ParamValue::Text(s) => buf.write_lenenc_bytes(s.as_bytes()),
            ParamValue::Blob(b) => buf.write_lenenc_bytes(b),
            ParamValue::DateTime(ts) => {
                buf.write_u8(DATETIME_WIRE_LEN);
                buf.write_u16_le(ts.year() as u16);
                buf.write_u8(ts.month() as u8);
                buf.write_u8(ts.day() as u8);
                buf.write_u8(ts.hour() as u8);
                buf.write_u8(ts.minute() as u8);
                buf.write_u8(ts.second() as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &ParamValue) -> Vec<u8> {
        let mut buf = Vec::new();
        value.write_value(&mut buf);
        assert_eq!(buf.len(), value.value_wire_size());
        buf
    }

    #[test]
    fn test_integer_tags_and_flags() {
        assert_eq!(ParamValue::Int8(-1).type_tag(), MYSQL_TYPE_TINY);
        assert_eq!(ParamValue::UInt16(1).type_tag(), MYSQL_TYPE_SHORT);
        assert_eq!(ParamValue::UInt16(1).flag_byte(), PARAM_UNSIGNED_FLAG);
        assert_eq!(ParamValue::Int64(1).flag_byte(), 0);
        assert_eq!(ParamValue::UInt64(1).type_tag(), MYSQL_TYPE_LONGLONG);
    }

    #[test]
    fn test_blob_and_null_tags() {
        assert_eq!(ParamValue::Blob(vec![1]).type_tag(), MYSQL_TYPE_BLOB);
        assert_eq!(ParamValue::Blob(vec![1]).flag_byte(), 0);
        assert_eq!(ParamValue::Null.type_tag(), MYSQL_TYPE_NULL);
    }

    #[test]
    fn test_signed_values_are_twos_complement() {
        assert_eq!(encoded(&ParamValue::Int8(-1)), vec![0xFF]);
        assert_eq!(encoded(&ParamValue::Int32(-2)), vec![0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_text_is_length_prefixed() {
        let value = ParamValue::Text("abc".to_string());
        assert_eq!(value.length(), Some(3));
        assert_eq!(encoded(&value), vec![3, b'a', b'b', b'c']);
        assert_eq!(ParamValue::Blob(vec![0; 300]).value_wire_size(), 303);
    }

    #[test]
    fn test_datetime_encoding() {
        let ts = Timestamp::new(2024, 2, 29, 13, 5, 9).unwrap();
        assert_eq!(
            encoded(&ParamValue::DateTime(ts)),
            vec![7, 0xE8, 0x07, 2, 29, 13, 5, 9]
        );
    }

    #[test]
    fn test_null_sends_nothing() {
        assert!(ParamValue::Null.is_null());
        assert_eq!(ParamValue::Null.type_tag(), MYSQL_TYPE_NULL);
        assert!(encoded(&ParamValue::Null).is_empty());
    }
}
