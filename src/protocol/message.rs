//! Message traits and builders for MySQL protocol serialization.
//!
//! Messages implement the `Message` trait which allows calculating wire size
//! before allocation, enabling single-allocation serialization.

use crate::error::Result;
use crate::protocol::constants::*;

// ============================================================================
// Core Traits
// ============================================================================

/// A message that can calculate its wire size and serialize to bytes.
///
/// Implementing this trait allows messages to be serialized with a single allocation:
/// 1. Call `wire_size()` to determine buffer capacity needed
/// 2. Allocate buffer with exact capacity
/// 3. Call `write_to()` to serialize directly into buffer
pub trait Message {
    /// Calculate the serialized payload size in bytes (excluding packet header).
    fn wire_size(&self) -> usize;

    /// Write message content to buffer.
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()>;
}

// ============================================================================
// Size Calculation Helpers
// ============================================================================

/// Calculate wire size for a length-encoded integer.
///
/// - 0-250: 1 byte
/// - 251-65535: 3 bytes (0xFC + u16)
/// - 65536-16777215: 4 bytes (0xFD + u24)
/// - larger: 9 bytes (0xFE + u64)
#[inline]
pub const fn lenenc_int_wire_size(val: u64) -> usize {
    if val < 251 {
        1
    } else if val < 1 << 16 {
        3
    } else if val < 1 << 24 {
        4
    } else {
        9
    }
}

/// Calculate wire size for bytes with a length-encoded prefix.
#[inline]
pub const fn lenenc_bytes_wire_size(len: usize) -> usize {
    lenenc_int_wire_size(len as u64) + len
}

/// Calculate wire size for a NUL-terminated string.
#[inline]
pub const fn null_terminated_wire_size(s: &str) -> usize {
    s.len() + 1
}

// ============================================================================
// Write Helpers
// ============================================================================

/// Extension trait for writing MySQL protocol data to `Vec<u8>`.
pub trait WriteExt {
    /// Write a single byte.
    fn write_u8(&mut self, val: u8);

    /// Write a little-endian u16.
    fn write_u16_le(&mut self, val: u16);

    /// Write a little-endian 3-byte integer.
    fn write_u24_le(&mut self, val: u32);

    /// Write a little-endian u32.
    fn write_u32_le(&mut self, val: u32);

    /// Write a little-endian u64.
    fn write_u64_le(&mut self, val: u64);

    /// Write raw bytes.
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write zeros.
    fn write_zeros(&mut self, count: usize);

    /// Write a length-encoded integer.
    fn write_lenenc_int(&mut self, val: u64);

    /// Write bytes with a length-encoded prefix.
    fn write_lenenc_bytes(&mut self, bytes: &[u8]);

    /// Write a NUL-terminated string.
    fn write_null_terminated(&mut self, s: &str);
}

impl WriteExt for Vec<u8> {
    #[inline]
    fn write_u8(&mut self, val: u8) {
        self.push(val);
    }

    #[inline]
    fn write_u16_le(&mut self, val: u16) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_u24_le(&mut self, val: u32) {
        self.extend_from_slice(&val.to_le_bytes()[..3]);
    }

    #[inline]
    fn write_u32_le(&mut self, val: u32) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_u64_le(&mut self, val: u64) {
        self.extend_from_slice(&val.to_le_bytes());
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    #[inline]
    fn write_zeros(&mut self, count: usize) {
        self.resize(self.len() + count, 0);
    }

    fn write_lenenc_int(&mut self, val: u64) {
        if val < 251 {
            self.push(val as u8);
        } else if val < 1 << 16 {
            self.push(LENENC_U16);
            self.write_u16_le(val as u16);
        } else if val < 1 << 24 {
            self.push(LENENC_U24);
            self.write_u24_le(val as u32);
        } else {
            self.push(LENENC_U64);
            self.write_u64_le(val);
        }
    }

    fn write_lenenc_bytes(&mut self, bytes: &[u8]) {
        self.write_lenenc_int(bytes.len() as u64);
        self.extend_from_slice(bytes);
    }

    fn write_null_terminated(&mut self, s: &str) {
        self.extend_from_slice(s.as_bytes());
        self.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_lenenc(val: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_lenenc_int(val);
        buf
    }

    #[test]
    fn test_lenenc_boundaries() {
        assert_eq!(encode_lenenc(0), vec![0]);
        assert_eq!(encode_lenenc(250), vec![250]);
        assert_eq!(encode_lenenc(251), vec![0xFC, 251, 0]);
        assert_eq!(encode_lenenc(0xFFFF), vec![0xFC, 0xFF, 0xFF]);
        assert_eq!(encode_lenenc(0x10000), vec![0xFD, 0, 0, 1]);
        assert_eq!(encode_lenenc(1 << 24), vec![0xFE, 0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_lenenc_wire_size_matches_encoding() {
        for val in [0u64, 250, 251, 0xFFFF, 0x10000, 0xFF_FFFF, 1 << 24, u64::MAX] {
            assert_eq!(encode_lenenc(val).len(), lenenc_int_wire_size(val));
        }
    }

    #[test]
    fn test_null_terminated() {
        let mut buf = Vec::new();
        buf.write_null_terminated("root");
        assert_eq!(buf, b"root\0");
        assert_eq!(buf.len(), null_terminated_wire_size("root"));
    }
}
