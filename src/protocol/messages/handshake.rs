//! Connection-phase messages sent by the client.

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{
    lenenc_bytes_wire_size, lenenc_int_wire_size, null_terminated_wire_size, Message, WriteExt,
};

// ============================================================================
// HandshakeResponseMessage - Protocol::HandshakeResponse41
// ============================================================================

/// Reply to the server greeting.
///
/// Carries the negotiated capabilities, the user name, the scrambled password
/// and the connection attributes.
pub struct HandshakeResponseMessage<'a> {
    /// Negotiated capability flags.
    pub capabilities: u32,
    /// Collation id of the session character set.
    pub charset: u8,
    /// User name.
    pub username: &'a str,
    /// Auth plugin response (scrambled password).
    pub auth_response: &'a [u8],
    /// Initial database, sent when `CLIENT_CONNECT_WITH_DB` is set.
    pub database: Option<&'a str>,
    /// Auth plugin the response was computed with.
    pub auth_plugin: &'a str,
    /// Connection attributes, sent when `CLIENT_CONNECT_ATTRS` is set.
    pub attributes: &'a [(String, String)],
}

impl HandshakeResponseMessage<'_> {
    fn attributes_size(&self) -> usize {
        self.attributes
            .iter()
            .map(|(k, v)| lenenc_bytes_wire_size(k.len()) + lenenc_bytes_wire_size(v.len()))
            .sum()
    }
}

impl Message for HandshakeResponseMessage<'_> {
    fn wire_size(&self) -> usize {
        let mut size = 0;
        size += 4; // capabilities
        size += 4; // max packet size
        size += 1; // charset
        size += 23; // reserved
        size += null_terminated_wire_size(self.username);
        size += lenenc_bytes_wire_size(self.auth_response.len());
        if self.capabilities & CLIENT_CONNECT_WITH_DB != 0 {
            size += null_terminated_wire_size(self.database.unwrap_or_default());
        }
        if self.capabilities & CLIENT_PLUGIN_AUTH != 0 {
            size += null_terminated_wire_size(self.auth_plugin);
        }
        if self.capabilities & CLIENT_CONNECT_ATTRS != 0 {
            let attrs = self.attributes_size();
            size += lenenc_int_wire_size(attrs as u64) + attrs;
        }
        size
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u32_le(self.capabilities);
        buf.write_u32_le(MAX_PACKET_SIZE);
        buf.write_u8(self.charset);
        buf.write_zeros(23);
        buf.write_null_terminated(self.username);
        buf.write_lenenc_bytes(self.auth_response);

        if self.capabilities & CLIENT_CONNECT_WITH_DB != 0 {
            buf.write_null_terminated(self.database.unwrap_or_default());
        }
        if self.capabilities & CLIENT_PLUGIN_AUTH != 0 {
            buf.write_null_terminated(self.auth_plugin);
        }
        if self.capabilities & CLIENT_CONNECT_ATTRS != 0 {
            buf.write_lenenc_int(self.attributes_size() as u64);
            for (key, value) in self.attributes {
                buf.write_lenenc_bytes(key.as_bytes());
                buf.write_lenenc_bytes(value.as_bytes());
            }
        }
        Ok(())
    }
}

// ============================================================================
// AuthDataMessage - raw auth plugin data (auth switch / more data replies)
// ============================================================================

/// Raw authentication data sent after an auth switch request.
pub struct AuthDataMessage<'a> {
    /// Plugin-specific payload.
    pub data: &'a [u8],
}

impl Message for AuthDataMessage<'_> {
    fn wire_size(&self) -> usize {
        self.data.len()
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_bytes(self.data);
        Ok(())
    }
}
