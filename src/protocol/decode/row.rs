//! Binary result row decoder.
//!
//! A binary row is laid out as:
//! - header byte `0x00`
//! - NULL bitmap of `(columns + 7 + 2) / 8` bytes, with the first two bits reserved
//! - the values of the non-NULL columns, in column order
//!
//! Fixed-width values take their natural width, temporal values carry a
//! one-byte length prefix and everything else is length-encoded.

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::OK_HEADER;
use crate::protocol::types::ValueKind;
use bytes::Bytes;

/// Bit offset of the first column in a result-row NULL bitmap.
const NULL_BITMAP_OFFSET: usize = 2;

/// Size of a result-row NULL bitmap for `num_columns` columns.
pub fn null_bitmap_len(num_columns: usize) -> usize {
    (num_columns + 7 + NULL_BITMAP_OFFSET) / 8
}

/// Split a binary row into per-column raw values.
///
/// Each entry is `None` for SQL NULL. For temporal columns the value excludes
/// the length prefix, for variable-length columns it excludes the lenenc
/// length.
pub fn split_binary_row(payload: Bytes, kinds: &[ValueKind]) -> Result<Vec<Option<Bytes>>> {
    let mut buf = ReadBuffer::new(payload);
    let header = buf.read_u8()?;
    if header != OK_HEADER {
        return Err(Error::protocol(format!(
            "Binary row must start with 0x00, got 0x{:02X}",
            header
        )));
    }

    let bitmap = buf.read_bytes(null_bitmap_len(kinds.len()))?;
    let mut values = Vec::with_capacity(kinds.len());
    for (idx, kind) in kinds.iter().enumerate() {
        let bit = idx + NULL_BITMAP_OFFSET;
        if bitmap[bit / 8] & (1 << (bit % 8)) != 0 {
            values.push(None);
            continue;
        }
        let value = match kind {
            ValueKind::Null => None,
            ValueKind::DateTime | ValueKind::Time => {
                let len = buf.read_u8()? as usize;
                Some(buf.read_bytes(len)?)
            }
            ValueKind::Text | ValueKind::Blob => Some(
                buf.read_lenenc_bytes()?
                    .ok_or_else(|| Error::protocol("NULL length inside a binary row"))?,
            ),
            fixed => {
                // Only integer and float kinds remain; both have a fixed size.
                let width = fixed.fixed_size().unwrap_or_default();
                Some(buf.read_bytes(width)?)
            }
        };
        values.push(value);
    }

    if buf.has_remaining(1) {
        return Err(Error::protocol(format!(
            "{} trailing bytes after binary row",
            buf.remaining()
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_bitmap_len() {
        assert_eq!(null_bitmap_len(1), 1);
        assert_eq!(null_bitmap_len(6), 1);
        assert_eq!(null_bitmap_len(7), 2);
        assert_eq!(null_bitmap_len(14), 2);
        assert_eq!(null_bitmap_len(15), 3);
    }

    #[test]
    fn test_split_int_and_text() {
        let payload = Bytes::from_static(&[0x00, 0x00, 5, 0, 0, 0, 1, b'x']);
        let values = split_binary_row(
            payload,
            &[ValueKind::Integer { width: 4 }, ValueKind::Text],
        )
        .unwrap();
        assert_eq!(values[0].as_deref(), Some(&[5u8, 0, 0, 0][..]));
        assert_eq!(values[1].as_deref(), Some(&b"x"[..]));
    }

    #[test]
    fn test_split_with_nulls() {
        // Columns 0 and 2 NULL: bits 2 and 4.
        let payload = Bytes::from_static(&[0x00, 0b0001_0100, 7, 4, 0xE8, 0x07, 1, 2]);
        let values = split_binary_row(
            payload,
            &[
                ValueKind::Text,
                ValueKind::Integer { width: 1 },
                ValueKind::Double,
                ValueKind::DateTime,
            ],
        )
        .unwrap();
        assert!(values[0].is_none());
        assert_eq!(values[1].as_deref(), Some(&[7u8][..]));
        assert!(values[2].is_none());
        assert_eq!(values[3].as_deref(), Some(&[0xE8, 0x07, 1, 2][..]));
    }

    #[test]
    fn test_short_row_is_error() {
        let payload = Bytes::from_static(&[0x00, 0x00, 5, 0]);
        assert!(split_binary_row(payload, &[ValueKind::Integer { width: 4 }]).is_err());
    }

    #[test]
    fn test_bad_header() {
        let payload = Bytes::from_static(&[0xFE, 0x00]);
        assert!(split_binary_row(payload, &[]).is_err());
    }
}
