//! Buffer utilities for reading MySQL protocol data.
//!
//! All multi-byte integers on the wire are little-endian. Variable-length
//! values use the length-encoded integer format (`lenenc`).

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use bytes::Bytes;

/// A buffer for reading a packet payload.
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new read buffer from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Get a slice of the remaining data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[track_caller]
    fn ensure(&self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(())
    }

    /// Skip `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read a little-endian u16.
    #[track_caller]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let val = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    /// Read a little-endian 3-byte integer.
    #[track_caller]
    pub fn read_u24_le(&mut self) -> Result<u32> {
        self.ensure(3)?;
        let val = u32::from_le_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            0,
        ]);
        self.pos += 3;
        Ok(val)
    }

    /// Read a little-endian u32.
    #[track_caller]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read a little-endian u64.
    #[track_caller]
    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.ensure(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read raw bytes.
    #[track_caller]
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read everything left in the buffer.
    pub fn read_rest(&mut self) -> Bytes {
        let bytes = self.data.slice(self.pos..);
        self.pos = self.data.len();
        bytes
    }

    /// Read a length-encoded integer. Returns `None` for the NULL marker (0xFB).
    #[track_caller]
    pub fn read_lenenc_int(&mut self) -> Result<Option<u64>> {
        let first = self.read_u8()?;
        match first {
            LENENC_NULL => Ok(None),
            LENENC_U16 => Ok(Some(self.read_u16_le()? as u64)),
            LENENC_U24 => Ok(Some(self.read_u24_le()? as u64)),
            LENENC_U64 => Ok(Some(self.read_u64_le()?)),
            0xFF => Err(Error::protocol("Invalid length-encoded integer prefix 0xFF")),
            n => Ok(Some(n as u64)),
        }
    }

    /// Read a length-encoded integer where NULL is not allowed.
    #[track_caller]
    pub fn read_lenenc_u64(&mut self) -> Result<u64> {
        self.read_lenenc_int()?
            .ok_or_else(|| Error::protocol("Unexpected NULL length-encoded integer"))
    }

    /// Read length-prefixed bytes. Returns `None` for the NULL marker.
    #[track_caller]
    pub fn read_lenenc_bytes(&mut self) -> Result<Option<Bytes>> {
        match self.read_lenenc_int()? {
            Some(len) => Ok(Some(self.read_bytes(len as usize)?)),
            None => Ok(None),
        }
    }

    /// Read a length-prefixed string.
    /// Uses lossy UTF-8 conversion to handle binary data gracefully.
    #[track_caller]
    pub fn read_lenenc_str(&mut self) -> Result<String> {
        let bytes = self.read_lenenc_bytes()?.unwrap_or_default();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a NUL-terminated string. A missing terminator consumes the rest.
    pub fn read_null_terminated(&mut self) -> Result<String> {
        let rest = self.as_slice();
        let (len, consumed) = match rest.iter().position(|&b| b == 0) {
            Some(idx) => (idx, idx + 1),
            None => (rest.len(), rest.len()),
        };
        let s = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += consumed;
        Ok(s)
    }
}
