//! Column metadata from the wire format.
//!
//! This struct preserves the raw column definition packet.
//! For the user-facing API, use `Column` which also owns the value buffer.

use crate::error::Result;
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::types::column_type::{ColumnType, ValueKind};
use bytes::Bytes;

/// Column definition (`Protocol::ColumnDefinition41`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Catalog, always `def`.
    pub catalog: String,
    /// Schema name.
    pub schema: String,
    /// Virtual table name (alias).
    pub table: String,
    /// Physical table name.
    pub org_table: String,
    /// Column name or alias.
    pub name: String,
    /// Physical column name.
    pub org_name: String,
    /// Collation id.
    pub charset: u16,
    /// Maximum display length.
    pub column_length: u32,
    /// MySQL type tag (raw wire format).
    pub type_tag: u8,
    /// Field flags.
    pub flags: u16,
    /// Number of decimals for numeric and fractional-second types.
    pub decimals: u8,
}

impl ColumnMetadata {
    /// Create new column metadata with minimal info.
    pub fn new(name: impl Into<String>, type_tag: u8) -> Self {
        Self {
            catalog: "def".to_string(),
            schema: String::new(),
            table: String::new(),
            org_table: String::new(),
            name: name.into(),
            org_name: String::new(),
            charset: 33,
            column_length: 0,
            type_tag,
            flags: 0,
            decimals: 0,
        }
    }

    /// Parse a column definition packet payload.
    pub fn parse(payload: Bytes) -> Result<Self> {
        let mut buf = ReadBuffer::new(payload);
        let catalog = buf.read_lenenc_str()?;
        let schema = buf.read_lenenc_str()?;
        let table = buf.read_lenenc_str()?;
        let org_table = buf.read_lenenc_str()?;
        let name = buf.read_lenenc_str()?;
        let org_name = buf.read_lenenc_str()?;
        // Length of the fixed-size block that follows, always 0x0c.
        let _fixed_len = buf.read_lenenc_u64()?;
        let charset = buf.read_u16_le()?;
        let column_length = buf.read_u32_le()?;
        let type_tag = buf.read_u8()?;
        let flags = buf.read_u16_le()?;
        let decimals = buf.read_u8()?;

        Ok(Self {
            catalog,
            schema,
            table,
            org_table,
            name,
            org_name,
            charset,
            column_length,
            type_tag,
            flags,
            decimals,
        })
    }

    /// Decoded column type.
    pub fn column_type(&self) -> Result<ColumnType> {
        ColumnType::from_raw(self.type_tag)
    }

    /// Semantic kind of the column's values.
    pub fn kind(&self) -> Result<ValueKind> {
        Ok(self.column_type()?.kind(self.is_binary()))
    }

    /// Whether the column is an unsigned integer.
    pub fn is_unsigned(&self) -> bool {
        self.flags & UNSIGNED_FLAG != 0
    }

    /// Whether the column uses the `binary` collation.
    pub fn is_binary(&self) -> bool {
        self.charset == BINARY_COLLATION_ID
    }

    /// Whether NULL values are allowed.
    pub fn is_nullable(&self) -> bool {
        self.flags & NOT_NULL_FLAG == 0
    }
}
