//! Result column descriptor and its value buffer.
//!
//! A `Column` pairs the wire metadata of one result column with the buffer
//! the current row's value is materialized into. Fixed-width types get a
//! buffer of their natural size up front. Variable-length types start with an
//! empty buffer that grows the first time a value does not fit.

use crate::error::{Error, Result};
use crate::protocol::decode::{decode_datetime, decode_time};
use crate::protocol::types::{ColumnMetadata, ColumnType, ValueKind};

/// A column in a result set.
#[derive(Debug, Clone)]
pub struct Column {
    metadata: ColumnMetadata,
    column_type: ColumnType,
    kind: ValueKind,
    buffer: Vec<u8>,
    length: usize,
    is_null: bool,
    truncated: bool,
}

impl Column {
    /// Create a column from metadata, allocating its buffer.
    ///
    /// Returns error if the wire type is not supported.
    pub fn from_metadata(metadata: ColumnMetadata) -> Result<Self> {
        let column_type = metadata.column_type()?;
        let kind = column_type.kind(metadata.is_binary());
        let buffer = vec![0u8; kind.fixed_size().unwrap_or(0)];
        Ok(Self {
            metadata,
            column_type,
            kind,
            buffer,
            length: 0,
            is_null: true,
            truncated: false,
        })
    }

    /// Column name (or alias).
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Column data type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Raw wire type tag.
    pub fn type_tag(&self) -> u8 {
        self.metadata.type_tag
    }

    /// How values of this column are stored.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Full wire metadata.
    pub fn metadata(&self) -> &ColumnMetadata {
        &self.metadata
    }

    /// Whether the column holds unsigned integers.
    pub fn is_unsigned(&self) -> bool {
        self.metadata.is_unsigned()
    }

    /// Whether the current value is SQL NULL.
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    /// Whether the last probe copy did not fit the buffer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// True byte length of the current value.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Current buffer size.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes of the current value held in the buffer.
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.length.min(self.buffer.len())]
    }

    /// Copy a raw row value into the buffer.
    ///
    /// Variable-length values are cut to the current buffer size; `length`
    /// still reports the full size and `is_truncated` is set when they do
    /// not fit.
    pub(crate) fn load(&mut self, raw: Option<&[u8]>) -> Result<()> {
        self.truncated = false;
        let raw = match raw {
            Some(raw) if self.kind != ValueKind::Null => raw,
            _ => {
                self.is_null = true;
                self.length = 0;
                return Ok(());
            }
        };
        self.is_null = false;

        match self.kind {
            ValueKind::DateTime => self.store_fixed(&decode_datetime(raw)?.to_buffer()),
            ValueKind::Time => self.store_fixed(&decode_time(raw)?.to_buffer()),
            ValueKind::Text | ValueKind::Blob => {
                let n = raw.len().min(self.buffer.len());
                self.buffer[..n].copy_from_slice(&raw[..n]);
                self.length = raw.len();
                self.truncated = raw.len() > self.buffer.len();
                Ok(())
            }
            _ => self.store_fixed(raw),
        }
    }

    /// Grow the buffer to the reported length and copy the value again.
    pub(crate) fn reload(&mut self, raw: &[u8]) -> Result<()> {
        if self.length > self.buffer.len() {
            tracing::trace!(
                column = %self.name(),
                from = self.buffer.len(),
                to = self.length,
                "growing column buffer"
            );
            self.buffer.resize(self.length, 0);
        }
        self.load(Some(raw))
    }

    fn store_fixed(&mut self, value: &[u8]) -> Result<()> {
        if value.len() != self.buffer.len() {
            return Err(Error::fetch(format!(
                "column {} expects {} bytes, got {}",
                self.name(),
                self.buffer.len(),
                value.len()
            )));
        }
        self.buffer.copy_from_slice(value);
        self.length = value.len();
        Ok(())
    }
}
