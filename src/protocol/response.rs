//! Response packet parsing.

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::packet::Packet;

/// OK packet (`0x00`, or `0xFE` in place of EOF).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OkPacket {
    /// Rows affected by the statement.
    pub affected_rows: u64,
    /// Last auto-increment id.
    pub last_insert_id: u64,
    /// Server status flags.
    pub status_flags: u16,
    /// Number of warnings.
    pub warnings: u16,
    /// Human-readable info, if any.
    pub info: String,
}

impl OkPacket {
    /// Whether another result set follows.
    pub fn more_results(&self) -> bool {
        self.status_flags & SERVER_MORE_RESULTS_EXISTS != 0
    }
}

/// EOF packet (`0xFE` with a payload shorter than 9 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EofPacket {
    /// Number of warnings.
    pub warnings: u16,
    /// Server status flags.
    pub status_flags: u16,
}

impl EofPacket {
    /// Whether another result set follows.
    pub fn more_results(&self) -> bool {
        self.status_flags & SERVER_MORE_RESULTS_EXISTS != 0
    }
}

/// Reply to `COM_STMT_PREPARE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOk {
    /// Server-side statement id.
    pub statement_id: u32,
    /// Number of result columns (0 for statements without rows).
    pub num_columns: u16,
    /// Number of `?` placeholders.
    pub num_params: u16,
    /// Number of warnings.
    pub warnings: u16,
}

/// Parse an OK packet payload.
pub fn parse_ok(packet: &Packet) -> Result<OkPacket> {
    let mut buf = ReadBuffer::new(packet.payload.clone());
    let header = buf.read_u8()?;
    if header != OK_HEADER && header != EOF_HEADER {
        return Err(Error::protocol(format!(
            "Expected OK packet, got header 0x{:02X}",
            header
        )));
    }
    let affected_rows = buf.read_lenenc_u64()?;
    let last_insert_id = buf.read_lenenc_u64()?;
    let status_flags = buf.read_u16_le()?;
    let warnings = buf.read_u16_le()?;
    let info = String::from_utf8_lossy(&buf.read_rest()).into_owned();
    Ok(OkPacket {
        affected_rows,
        last_insert_id,
        status_flags,
        warnings,
        info,
    })
}

/// Parse an ERR packet payload into `Error::Server`.
///
/// Returns the server error itself; a malformed packet becomes a protocol
/// error instead.
pub fn parse_err(packet: &Packet) -> Error {
    match try_parse_err(packet) {
        Ok(err) => err,
        Err(e) => e,
    }
}

fn try_parse_err(packet: &Packet) -> Result<Error> {
    let mut buf = ReadBuffer::new(packet.payload.clone());
    let header = buf.read_u8()?;
    if header != ERR_HEADER {
        return Err(Error::protocol(format!(
            "Expected ERR packet, got header 0x{:02X}",
            header
        )));
    }
    let code = buf.read_u16_le()?;
    let sql_state = if buf.peek_u8() == Some(b'#') {
        buf.skip(1)?;
        String::from_utf8_lossy(&buf.read_bytes(5)?).into_owned()
    } else {
        "HY000".to_string()
    };
    let message = String::from_utf8_lossy(&buf.read_rest()).into_owned();
    tracing::debug!(code, %sql_state, %message, "server error packet");
    Ok(Error::Server {
        code,
        sql_state,
        message,
    })
}

/// Parse an EOF packet payload.
pub fn parse_eof(packet: &Packet) -> Result<EofPacket> {
    if !packet.is_eof() {
        return Err(Error::protocol("Expected EOF packet"));
    }
    let mut buf = ReadBuffer::new(packet.payload.clone());
    buf.skip(1)?;
    // Pre-4.1 servers send a bare 0xFE.
    if !buf.has_remaining(4) {
        return Ok(EofPacket::default());
    }
    Ok(EofPacket {
        warnings: buf.read_u16_le()?,
        status_flags: buf.read_u16_le()?,
    })
}

/// Parse the reply to `COM_STMT_PREPARE`.
pub fn parse_prepare_ok(packet: &Packet) -> Result<PrepareOk> {
    if packet.is_err() {
        return Err(parse_err(packet));
    }
    let mut buf = ReadBuffer::new(packet.payload.clone());
    let header = buf.read_u8()?;
    if header != OK_HEADER {
        return Err(Error::protocol(format!(
            "Expected COM_STMT_PREPARE_OK, got header 0x{:02X}",
            header
        )));
    }
    let statement_id = buf.read_u32_le()?;
    let num_columns = buf.read_u16_le()?;
    let num_params = buf.read_u16_le()?;
    buf.skip(1)?; // filler
    let warnings = if buf.has_remaining(2) {
        buf.read_u16_le()?
    } else {
        0
    };
    Ok(PrepareOk {
        statement_id,
        num_columns,
        num_params,
        warnings,
    })
}

/// Parse the column count that opens a result set.
pub fn parse_column_count(packet: &Packet) -> Result<u64> {
    let mut buf = ReadBuffer::new(packet.payload.clone());
    let count = buf.read_lenenc_u64()?;
    if count == 0 {
        return Err(Error::protocol("Result set with zero columns"));
    }
    Ok(count)
}

/// Turn an OK/ERR reply into a result.
pub fn expect_ok(packet: &Packet) -> Result<OkPacket> {
    if packet.is_err() {
        return Err(parse_err(packet));
    }
    parse_ok(packet)
}
