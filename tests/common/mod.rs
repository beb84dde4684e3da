//! Scripted in-memory MySQL server for integration tests.
//!
//! The server side of a conversation is deterministic, so a test lays out
//! every reply up front and the client reads them in order. Everything the
//! client writes is captured for inspection.

#![allow(dead_code)]

use mysql_thin_rs::protocol::constants::*;
use mysql_thin_rs::protocol::WriteExt;
use mysql_thin_rs::{ConnectParams, Session};
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex};

/// Nonce announced in every scripted greeting.
pub const NONCE: [u8; 20] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20,
];

/// Server half of a scripted conversation.
struct ScriptedStream {
    input: Cursor<Vec<u8>>,
    output: Arc<Mutex<Vec<u8>>>,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Column description used to build definitions and rows.
#[derive(Debug, Clone)]
pub struct Col {
    pub name: &'static str,
    pub type_tag: u8,
    pub flags: u16,
    pub charset: u16,
}

impl Col {
    pub fn new(name: &'static str, type_tag: u8) -> Self {
        let charset = match type_tag {
            MYSQL_TYPE_VAR_STRING | MYSQL_TYPE_STRING | MYSQL_TYPE_VARCHAR => 33,
            _ => BINARY_COLLATION_ID,
        };
        Self {
            name,
            type_tag,
            flags: 0,
            charset,
        }
    }

    pub fn unsigned(mut self) -> Self {
        self.flags |= UNSIGNED_FLAG;
        self
    }

    pub fn with_charset(mut self, charset: u16) -> Self {
        self.charset = charset;
        self
    }
}

/// One value of a scripted binary row.
#[derive(Debug, Clone)]
pub enum Val {
    Null,
    /// Raw fixed-width bytes (integers, floats).
    Fixed(Vec<u8>),
    /// Temporal value without its length byte.
    Temporal(Vec<u8>),
    /// Length-encoded bytes.
    Bytes(Vec<u8>),
}

impl Val {
    pub fn i32(v: i32) -> Self {
        Val::Fixed(v.to_le_bytes().to_vec())
    }

    pub fn i64(v: i64) -> Self {
        Val::Fixed(v.to_le_bytes().to_vec())
    }

    pub fn f64(v: f64) -> Self {
        Val::Fixed(v.to_le_bytes().to_vec())
    }

    pub fn str(s: &str) -> Self {
        Val::Bytes(s.as_bytes().to_vec())
    }

    pub fn datetime(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> Self {
        let mut buf = Vec::new();
        buf.write_u16_le(y);
        buf.extend_from_slice(&[mo, d, h, mi, s]);
        Val::Temporal(buf)
    }
}

// ============================================================================
// Payload builders
// ============================================================================

pub fn greeting(plugin: &str) -> Vec<u8> {
    let caps = CLIENT_LONG_PASSWORD
        | CLIENT_LONG_FLAG
        | CLIENT_CONNECT_WITH_DB
        | CLIENT_PROTOCOL_41
        | CLIENT_TRANSACTIONS
        | CLIENT_SECURE_CONNECTION
        | CLIENT_MULTI_RESULTS
        | CLIENT_PS_MULTI_RESULTS
        | CLIENT_PLUGIN_AUTH
        | CLIENT_CONNECT_ATTRS
        | CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA;
    let mut buf = Vec::new();
    buf.write_u8(HANDSHAKE_PROTOCOL_VERSION);
    buf.write_null_terminated("8.0.36-scripted");
    buf.write_u32_le(77);
    buf.write_bytes(&NONCE[..8]);
    buf.write_u8(0);
    buf.write_u16_le(caps as u16);
    buf.write_u8(45);
    buf.write_u16_le(SERVER_STATUS_AUTOCOMMIT);
    buf.write_u16_le((caps >> 16) as u16);
    buf.write_u8(21);
    buf.write_zeros(10);
    buf.write_bytes(&NONCE[8..]);
    buf.write_u8(0);
    buf.write_null_terminated(plugin);
    buf
}

pub fn ok(affected_rows: u64, last_insert_id: u64, status: u16) -> Vec<u8> {
    let mut buf = vec![OK_HEADER];
    buf.write_lenenc_int(affected_rows);
    buf.write_lenenc_int(last_insert_id);
    buf.write_u16_le(status);
    buf.write_u16_le(0);
    buf
}

pub fn err(code: u16, sql_state: &str, message: &str) -> Vec<u8> {
    let mut buf = vec![ERR_HEADER];
    buf.write_u16_le(code);
    buf.write_u8(b'#');
    buf.write_bytes(sql_state.as_bytes());
    buf.write_bytes(message.as_bytes());
    buf
}

pub fn eof(status: u16) -> Vec<u8> {
    let mut buf = vec![EOF_HEADER];
    buf.write_u16_le(0);
    buf.write_u16_le(status);
    buf
}

pub fn column_definition(col: &Col) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_lenenc_bytes(b"def");
    buf.write_lenenc_bytes(b"test");
    buf.write_lenenc_bytes(b"t");
    buf.write_lenenc_bytes(b"t");
    buf.write_lenenc_bytes(col.name.as_bytes());
    buf.write_lenenc_bytes(col.name.as_bytes());
    buf.write_lenenc_int(0x0c);
    buf.write_u16_le(col.charset);
    buf.write_u32_le(255);
    buf.write_u8(col.type_tag);
    buf.write_u16_le(col.flags);
    buf.write_u8(0);
    buf.write_zeros(2);
    buf
}

pub fn binary_row(values: &[Val]) -> Vec<u8> {
    let mut buf = vec![0x00];
    let mut bitmap = vec![0u8; (values.len() + 9) / 8];
    for (idx, v) in values.iter().enumerate() {
        if matches!(v, Val::Null) {
            let bit = idx + 2;
            bitmap[bit / 8] |= 1 << (bit % 8);
        }
    }
    buf.write_bytes(&bitmap);
    for v in values {
        match v {
            Val::Null => {}
            Val::Fixed(b) => buf.write_bytes(b),
            Val::Temporal(b) => {
                buf.write_u8(b.len() as u8);
                buf.write_bytes(b);
            }
            Val::Bytes(b) => buf.write_lenenc_bytes(b),
        }
    }
    buf
}

/// Reply to `COM_STMT_PREPARE`.
pub fn prepare_reply(statement_id: u32, num_params: usize, columns: &[Col]) -> Vec<Vec<u8>> {
    let mut head = vec![OK_HEADER];
    head.write_u32_le(statement_id);
    head.write_u16_le(columns.len() as u16);
    head.write_u16_le(num_params as u16);
    head.write_u8(0);
    head.write_u16_le(0);

    let mut packets = vec![head];
    if num_params > 0 {
        for _ in 0..num_params {
            packets.push(column_definition(&Col::new("?", MYSQL_TYPE_VAR_STRING)));
        }
        packets.push(eof(SERVER_STATUS_AUTOCOMMIT));
    }
    if !columns.is_empty() {
        packets.extend(columns.iter().map(column_definition));
        packets.push(eof(SERVER_STATUS_AUTOCOMMIT));
    }
    packets
}

/// A binary result set as returned by `COM_STMT_EXECUTE`.
pub fn result_set(columns: &[Col], rows: &[Vec<Val>], status: u16) -> Vec<Vec<u8>> {
    let mut count = Vec::new();
    count.write_lenenc_int(columns.len() as u64);
    let mut packets = vec![count];
    packets.extend(columns.iter().map(column_definition));
    packets.push(eof(SERVER_STATUS_AUTOCOMMIT));
    packets.extend(rows.iter().map(|r| binary_row(r)));
    packets.push(eof(status));
    packets
}

// ============================================================================
// Script
// ============================================================================

/// Builder for the server's side of a conversation.
pub struct Script {
    input: Vec<u8>,
}

impl Script {
    /// A script that starts with a successful `mysql_native_password` login.
    pub fn new() -> Self {
        Self::empty()
            .frame(0, &greeting(AUTH_NATIVE_PASSWORD))
            .frame(2, &ok(0, 0, SERVER_STATUS_AUTOCOMMIT))
    }

    /// A script with no packets at all.
    pub fn empty() -> Self {
        Self { input: Vec::new() }
    }

    /// Append one frame with an explicit sequence id.
    pub fn frame(mut self, sequence_id: u8, payload: &[u8]) -> Self {
        self.input.write_u24_le(payload.len() as u32);
        self.input.write_u8(sequence_id);
        self.input.write_bytes(payload);
        self
    }

    /// Append the reply to one command; sequence ids start at 1.
    pub fn reply(mut self, packets: Vec<Vec<u8>>) -> Self {
        for (idx, payload) in packets.iter().enumerate() {
            self = self.frame(idx as u8 + 1, payload);
        }
        self
    }

    /// Open a session against this script.
    pub fn connect(self) -> (mysql_thin_rs::Result<Session>, Sent) {
        self.connect_with(&params())
    }

    /// Open a session against this script with custom parameters.
    pub fn connect_with(self, params: &ConnectParams) -> (mysql_thin_rs::Result<Session>, Sent) {
        let output = Arc::new(Mutex::new(Vec::new()));
        let stream = ScriptedStream {
            input: Cursor::new(self.input),
            output: Arc::clone(&output),
        };
        let session = Session::with_transport(Box::new(stream), params);
        (session, Sent { output })
    }
}

/// Parameters used by scripted sessions.
pub fn params() -> ConnectParams {
    ConnectParams::new("scripted", "app", "secret", "test")
}

/// Everything the client has written so far.
#[derive(Clone)]
pub struct Sent {
    output: Arc<Mutex<Vec<u8>>>,
}

impl Sent {
    /// Payloads of every packet written, in order.
    pub fn packets(&self) -> Vec<Vec<u8>> {
        let data = self.output.lock().unwrap();
        let mut packets = Vec::new();
        let mut pos = 0;
        while pos + 4 <= data.len() {
            let len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], 0]) as usize;
            packets.push(data[pos + 4..pos + 4 + len].to_vec());
            pos += 4 + len;
        }
        packets
    }

    /// Command packets written after the handshake response.
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.packets().into_iter().skip(1).collect()
    }

    /// Command bytes written after the handshake response.
    pub fn command_bytes(&self) -> Vec<u8> {
        self.commands().iter().map(|p| p[0]).collect()
    }
}
