//! MySQL packet framing and blocking I/O.
//!
//! Every packet carries a 4-byte header: a 3-byte little-endian payload length
//! and a 1-byte sequence id. Payloads of `0xFFFFFF` bytes or more are split
//! across consecutive packets, the last one shorter than `0xFFFFFF` (possibly
//! empty).

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::message::Message;
use bytes::{Bytes, BytesMut};
use std::io::{Read, Write};

/// Byte stream a session runs over.
///
/// Implemented for anything that is `Read + Write + Send`, which covers
/// `std::net::TcpStream` and in-memory streams used by tests.
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// A reassembled MySQL packet.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Sequence id of the last frame of this packet.
    pub sequence_id: u8,
    /// Packet payload (excluding headers).
    pub payload: Bytes,
}

impl Packet {
    /// First payload byte, if any.
    pub fn header(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Check if this is an OK packet.
    pub fn is_ok(&self) -> bool {
        self.header() == Some(OK_HEADER)
    }

    /// Check if this is an ERR packet.
    pub fn is_err(&self) -> bool {
        self.header() == Some(ERR_HEADER)
    }

    /// Check if this is an EOF packet (0xFE with a short payload).
    pub fn is_eof(&self) -> bool {
        self.header() == Some(EOF_HEADER) && self.payload.len() < EOF_MAX_PAYLOAD
    }
}

/// Packet reader/writer for a byte stream.
pub struct PacketStream {
    stream: Box<dyn Transport>,
    /// Sequence id expected on the next frame in either direction.
    sequence_id: u8,
}

impl PacketStream {
    /// Create a new packet stream.
    pub fn new(stream: Box<dyn Transport>) -> Self {
        Self {
            stream,
            sequence_id: 0,
        }
    }

    /// Restart sequence numbering; every command starts at zero.
    pub fn reset_sequence(&mut self) {
        self.sequence_id = 0;
    }

    /// Sequence id the next frame will carry.
    pub fn sequence_id(&self) -> u8 {
        self.sequence_id
    }

    /// Read one logical packet, joining continuation frames.
    pub fn read_packet(&mut self) -> Result<Packet> {
        let mut payload = BytesMut::new();
        loop {
            let mut header = [0u8; PACKET_HEADER_SIZE];
            self.read_exact(&mut header)?;

            let len = u32::from_le_bytes([header[0], header[1], header[2], 0]) as usize;
            let seq = header[3];
            if seq != self.sequence_id {
                return Err(Error::PacketOutOfOrder {
                    expected: self.sequence_id,
                    actual: seq,
                });
            }
            self.sequence_id = seq.wrapping_add(1);

            let start = payload.len();
            payload.resize(start + len, 0);
            self.read_exact(&mut payload[start..])?;

            if len < MAX_PACKET_PAYLOAD {
                return Ok(Packet {
                    sequence_id: seq,
                    payload: payload.freeze(),
                });
            }
        }
    }

    /// Write a payload, splitting it into frames when it exceeds the frame limit.
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        let mut buf = Vec::with_capacity(payload.len() + PACKET_HEADER_SIZE);
        let mut chunks = payload.chunks(MAX_PACKET_PAYLOAD);
        loop {
            let chunk: &[u8] = chunks.next().unwrap_or_default();
            self.push_frame(&mut buf, chunk);
            if chunk.len() < MAX_PACKET_PAYLOAD {
                break;
            }
        }
        self.stream.write_all(&buf)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Serialize and send a message as one packet.
    ///
    /// Uses the Message trait to size the buffer in a single allocation.
    pub fn send_message<M: Message>(&mut self, msg: &M) -> Result<()> {
        let mut payload = Vec::with_capacity(msg.wire_size());
        msg.write_to(&mut payload)?;
        self.write_payload(&payload)
    }

    /// Send a command message, restarting the sequence first.
    pub fn send_command<M: Message>(&mut self, msg: &M) -> Result<()> {
        self.reset_sequence();
        self.send_message(msg)
    }

    fn push_frame(&mut self, buf: &mut Vec<u8>, chunk: &[u8]) {
        buf.extend_from_slice(&(chunk.len() as u32).to_le_bytes()[..3]);
        buf.push(self.sequence_id);
        buf.extend_from_slice(chunk);
        self.sequence_id = self.sequence_id.wrapping_add(1);
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.stream.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::ConnectionClosed)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
