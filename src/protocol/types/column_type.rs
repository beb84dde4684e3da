//! MySQL wire type tags and their semantic kinds.
//!
//! The tag values are fixed by the server's binary protocol; [`ValueKind`]
//! groups them by how a value is laid out in a binary row and in a column
//! buffer.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use std::fmt;

/// Size of the normalized buffer used for DATE, DATETIME, TIMESTAMP and TIME.
pub const TEMPORAL_BUFFER_LEN: usize = 16;

/// MySQL column type (`enum_field_types`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Decimal,
    Tiny,
    Short,
    Long,
    Float,
    Double,
    Null,
    Timestamp,
    LongLong,
    Int24,
    Date,
    Time,
    DateTime,
    Year,
    VarChar,
    Bit,
    Json,
    NewDecimal,
    Enum,
    Set,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    VarString,
    String,
    Geometry,
}

/// How a value of a given wire type is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Fixed-width little-endian integer of `width` bytes.
    Integer { width: usize },
    /// IEEE-754 single precision.
    Float,
    /// IEEE-754 double precision.
    Double,
    /// DATE, DATETIME or TIMESTAMP.
    DateTime,
    /// TIME (a signed duration).
    Time,
    /// Variable-length character data (strings, decimals, JSON, enums, sets).
    Text,
    /// Variable-length opaque bytes.
    Blob,
    /// The NULL type; never carries a value.
    Null,
}

impl ValueKind {
    /// Buffer size allocated up front, or `None` for variable-length kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ValueKind::Integer { width } => Some(*width),
            ValueKind::Float => Some(4),
            ValueKind::Double => Some(8),
            ValueKind::DateTime | ValueKind::Time => Some(TEMPORAL_BUFFER_LEN),
            ValueKind::Null => Some(0),
            ValueKind::Text | ValueKind::Blob => None,
        }
    }

    /// Whether values of this kind may be truncated by a short buffer.
    pub fn is_variable(&self) -> bool {
        self.fixed_size().is_none()
    }
}

impl ColumnType {
    /// Create from a raw wire type tag.
    ///
    /// Returns `Err(Error::UnsupportedType)` for tags the server never sends in
    /// result metadata.
    pub fn from_raw(tag: u8) -> Result<Self> {
        Ok(match tag {
            MYSQL_TYPE_DECIMAL => ColumnType::Decimal,
            MYSQL_TYPE_TINY => ColumnType::Tiny,
            MYSQL_TYPE_SHORT => ColumnType::Short,
            MYSQL_TYPE_LONG => ColumnType::Long,
            MYSQL_TYPE_FLOAT => ColumnType::Float,
            MYSQL_TYPE_DOUBLE => ColumnType::Double,
            MYSQL_TYPE_NULL => ColumnType::Null,
            MYSQL_TYPE_TIMESTAMP => ColumnType::Timestamp,
            MYSQL_TYPE_LONGLONG => ColumnType::LongLong,
            MYSQL_TYPE_INT24 => ColumnType::Int24,
            MYSQL_TYPE_DATE => ColumnType::Date,
            MYSQL_TYPE_TIME => ColumnType::Time,
            MYSQL_TYPE_DATETIME => ColumnType::DateTime,
            MYSQL_TYPE_YEAR => ColumnType::Year,
            MYSQL_TYPE_VARCHAR => ColumnType::VarChar,
            MYSQL_TYPE_BIT => ColumnType::Bit,
            MYSQL_TYPE_JSON => ColumnType::Json,
            MYSQL_TYPE_NEWDECIMAL => ColumnType::NewDecimal,
            MYSQL_TYPE_ENUM => ColumnType::Enum,
            MYSQL_TYPE_SET => ColumnType::Set,
            MYSQL_TYPE_TINY_BLOB => ColumnType::TinyBlob,
            MYSQL_TYPE_MEDIUM_BLOB => ColumnType::MediumBlob,
            MYSQL_TYPE_LONG_BLOB => ColumnType::LongBlob,
            MYSQL_TYPE_BLOB => ColumnType::Blob,
            MYSQL_TYPE_VAR_STRING => ColumnType::VarString,
            MYSQL_TYPE_STRING => ColumnType::String,
            MYSQL_TYPE_GEOMETRY => ColumnType::Geometry,
            _ => return Err(Error::UnsupportedType { type_tag: tag }),
        })
    }

    /// Get the wire type tag.
    pub fn type_tag(&self) -> u8 {
        match self {
            ColumnType::Decimal => MYSQL_TYPE_DECIMAL,
            ColumnType::Tiny => MYSQL_TYPE_TINY,
            ColumnType::Short => MYSQL_TYPE_SHORT,
            ColumnType::Long => MYSQL_TYPE_LONG,
            ColumnType::Float => MYSQL_TYPE_FLOAT,
            ColumnType::Double => MYSQL_TYPE_DOUBLE,
            ColumnType::Null => MYSQL_TYPE_NULL,
            ColumnType::Timestamp => MYSQL_TYPE_TIMESTAMP,
            ColumnType::LongLong => MYSQL_TYPE_LONGLONG,
            ColumnType::Int24 => MYSQL_TYPE_INT24,
            ColumnType::Date => MYSQL_TYPE_DATE,
            ColumnType::Time => MYSQL_TYPE_TIME,
            ColumnType::DateTime => MYSQL_TYPE_DATETIME,
            ColumnType::Year => MYSQL_TYPE_YEAR,
            ColumnType::VarChar => MYSQL_TYPE_VARCHAR,
            ColumnType::Bit => MYSQL_TYPE_BIT,
            ColumnType::Json => MYSQL_TYPE_JSON,
            ColumnType::NewDecimal => MYSQL_TYPE_NEWDECIMAL,
            ColumnType::Enum => MYSQL_TYPE_ENUM,
            ColumnType::Set => MYSQL_TYPE_SET,
            ColumnType::TinyBlob => MYSQL_TYPE_TINY_BLOB,
            ColumnType::MediumBlob => MYSQL_TYPE_MEDIUM_BLOB,
            ColumnType::LongBlob => MYSQL_TYPE_LONG_BLOB,
            ColumnType::Blob => MYSQL_TYPE_BLOB,
            ColumnType::VarString => MYSQL_TYPE_VAR_STRING,
            ColumnType::String => MYSQL_TYPE_STRING,
            ColumnType::Geometry => MYSQL_TYPE_GEOMETRY,
        }
    }

    /// Semantic kind of this type.
    ///
    /// `binary` is true when the column uses the `binary` collation; it turns
    /// the BLOB family into opaque bytes, otherwise they carry TEXT.
    pub fn kind(&self, binary: bool) -> ValueKind {
        match self {
            ColumnType::Tiny => ValueKind::Integer { width: 1 },
            ColumnType::Short | ColumnType::Year => ValueKind::Integer { width: 2 },
            ColumnType::Long | ColumnType::Int24 => ValueKind::Integer { width: 4 },
            ColumnType::LongLong => ValueKind::Integer { width: 8 },
            ColumnType::Float => ValueKind::Float,
            ColumnType::Double => ValueKind::Double,
            ColumnType::Date | ColumnType::DateTime | ColumnType::Timestamp => {
                ValueKind::DateTime
            }
            ColumnType::Time => ValueKind::Time,
            ColumnType::Null => ValueKind::Null,
            ColumnType::Bit | ColumnType::Geometry => ValueKind::Blob,
            ColumnType::TinyBlob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Blob
            | ColumnType::VarString
            | ColumnType::String
            | ColumnType::VarChar
                if binary =>
            {
                ValueKind::Blob
            }
            ColumnType::Decimal
            | ColumnType::NewDecimal
            | ColumnType::Json
            | ColumnType::Enum
            | ColumnType::Set
            | ColumnType::TinyBlob
            | ColumnType::MediumBlob
            | ColumnType::LongBlob
            | ColumnType::Blob
            | ColumnType::VarString
            | ColumnType::String
            | ColumnType::VarChar => ValueKind::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Tiny => "TINYINT",
            ColumnType::Short => "SMALLINT",
            ColumnType::Long => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Null => "NULL",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::LongLong => "BIGINT",
            ColumnType::Int24 => "MEDIUMINT",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Year => "YEAR",
            ColumnType::VarChar => "VARCHAR",
            ColumnType::Bit => "BIT",
            ColumnType::Json => "JSON",
            ColumnType::NewDecimal => "DECIMAL",
            ColumnType::Enum => "ENUM",
            ColumnType::Set => "SET",
            ColumnType::TinyBlob => "TINYBLOB",
            ColumnType::MediumBlob => "MEDIUMBLOB",
            ColumnType::LongBlob => "LONGBLOB",
            ColumnType::Blob => "BLOB",
            ColumnType::VarString => "VARCHAR",
            ColumnType::String => "CHAR",
            ColumnType::Geometry => "GEOMETRY",
        };
        f.write_str(name)
    }
}
