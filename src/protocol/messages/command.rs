//! Simple command messages: ping, quit and prepared-statement lifecycle.

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{Message, WriteExt};

/// Command with no arguments (`COM_PING`, `COM_QUIT`).
pub struct SimpleCommand {
    /// Command byte.
    pub command: u8,
}

impl SimpleCommand {
    /// `COM_PING`.
    pub fn ping() -> Self {
        Self { command: COM_PING }
    }

    /// `COM_QUIT`.
    pub fn quit() -> Self {
        Self { command: COM_QUIT }
    }
}

impl Message for SimpleCommand {
    fn wire_size(&self) -> usize {
        1
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(self.command);
        Ok(())
    }
}

/// `COM_STMT_PREPARE` with the statement text.
pub struct PrepareMessage<'a> {
    /// SQL text with `?` placeholders.
    pub sql: &'a str,
}

impl Message for PrepareMessage<'_> {
    fn wire_size(&self) -> usize {
        1 + self.sql.len()
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(COM_STMT_PREPARE);
        buf.write_bytes(self.sql.as_bytes());
        Ok(())
    }
}

/// Command addressed to a prepared statement (`COM_STMT_CLOSE`, `COM_STMT_RESET`).
pub struct StatementCommand {
    /// Command byte.
    pub command: u8,
    /// Server-side statement id.
    pub statement_id: u32,
}

impl StatementCommand {
    /// `COM_STMT_CLOSE`; the server sends no reply.
    pub fn close(statement_id: u32) -> Self {
        Self {
            command: COM_STMT_CLOSE,
            statement_id,
        }
    }

    /// `COM_STMT_RESET`; the server replies with OK or ERR.
    pub fn reset(statement_id: u32) -> Self {
        Self {
            command: COM_STMT_RESET,
            statement_id,
        }
    }
}

impl Message for StatementCommand {
    fn wire_size(&self) -> usize {
        5
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(self.command);
        buf.write_u32_le(self.statement_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<M: Message>(msg: &M) -> Vec<u8> {
        let mut buf = Vec::with_capacity(msg.wire_size());
        msg.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), msg.wire_size());
        buf
    }

    #[test]
    fn test_prepare_message() {
        let buf = encode(&PrepareMessage {
            sql: "SELECT ?",
        });
        assert_eq!(buf[0], COM_STMT_PREPARE);
        assert_eq!(&buf[1..], b"SELECT ?");
    }

    #[test]
    fn test_statement_commands() {
        assert_eq!(encode(&StatementCommand::close(7)), vec![COM_STMT_CLOSE, 7, 0, 0, 0]);
        assert_eq!(
            encode(&StatementCommand::reset(0x0102)),
            vec![COM_STMT_RESET, 2, 1, 0, 0]
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(encode(&SimpleCommand::ping()), vec![COM_PING]);
        assert_eq!(encode(&SimpleCommand::quit()), vec![COM_QUIT]);
    }
}
