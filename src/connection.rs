//! Blocking wire connection to a MySQL server.
//!
//! `Connection` speaks the command phase of the protocol: ping, quit and the
//! prepared-statement commands. Result sets are read to completion as soon as
//! a statement executes, so the caller always knows the row count up front.

use crate::error::{Error, Result};
use crate::protocol::connect::{handshake, ConnectParams, ServerInfo};
use crate::protocol::constants::*;
use crate::protocol::messages::{ExecuteMessage, PrepareMessage, SimpleCommand, StatementCommand};
use crate::protocol::packet::{PacketStream, Transport};
use crate::protocol::response::{
    expect_ok, parse_column_count, parse_eof, parse_err, parse_ok, parse_prepare_ok, OkPacket,
};
use crate::protocol::types::{ColumnMetadata, ParamValue};
use bytes::Bytes;
use std::net::{TcpStream, ToSocketAddrs};

/// A statement prepared on the server.
#[derive(Debug, Clone)]
pub struct PreparedHandle {
    /// Server-side statement id.
    pub statement_id: u32,
    /// Placeholder definitions (mostly opaque; servers send VAR_STRING).
    pub params: Vec<ColumnMetadata>,
    /// Result column definitions, empty for statements without rows.
    pub columns: Vec<ColumnMetadata>,
    /// Warnings raised while preparing.
    pub warnings: u16,
}

impl PreparedHandle {
    /// Number of `?` placeholders.
    pub fn num_params(&self) -> usize {
        self.params.len()
    }
}

/// A fully read binary result set.
#[derive(Debug, Clone, Default)]
pub struct StoredResult {
    /// Column definitions.
    pub columns: Vec<ColumnMetadata>,
    /// Raw binary row packets, in order.
    pub rows: Vec<Bytes>,
    /// Warnings reported by the closing EOF packet.
    pub warnings: u16,
    /// Status flags reported by the closing EOF packet.
    pub status_flags: u16,
}

/// Outcome of `COM_STMT_EXECUTE`.
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// The statement produced no rows.
    Ok(OkPacket),
    /// The statement produced a result set.
    Rows(StoredResult),
}

/// A MySQL database connection.
pub struct Connection {
    /// Packet stream for communication.
    stream: PacketStream,
    /// Parameters the connection was opened with.
    params: ConnectParams,
    /// Server details from the handshake.
    server: ServerInfo,
    /// Whether further result sets are still queued on the wire.
    pending_results: bool,
    /// Set once `COM_QUIT` has been sent.
    closed: bool,
}

impl Connection {
    /// Connect over TCP and authenticate.
    ///
    /// DNS failures are reported as `Error::DnsResolutionFailed`, a connect
    /// attempt that exceeds `params.connect_timeout` as
    /// `Error::ConnectionTimeout`. Each resolved address is tried in turn.
    pub fn connect(params: &ConnectParams) -> Result<Self> {
        // Step 1: DNS resolution
        let addrs: Vec<_> = (params.host.as_str(), params.port)
            .to_socket_addrs()
            .map_err(|e| Error::DnsResolutionFailed {
                hostname: params.host.clone(),
                message: e.to_string(),
            })?
            .collect();

        // Step 2: Try each resolved address with timeout
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, params.connect_timeout) {
                Ok(tcp_stream) => {
                    tcp_stream.set_nodelay(true)?;
                    tracing::debug!(%addr, "TCP connection established");
                    return Self::with_transport(Box::new(tcp_stream), params);
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    return Err(Error::ConnectionTimeout {
                        host: params.host.clone(),
                        port: params.port,
                        timeout: params.connect_timeout,
                    });
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "TCP connect failed");
                    last_error = Some(Error::Io(e));
                }
            }
        }

        // If we exhausted all addresses without success, return the last error
        Err(last_error.unwrap_or_else(|| Error::DnsResolutionFailed {
            hostname: params.host.clone(),
            message: "No addresses returned".to_string(),
        }))
    }

    /// Run the handshake over an already open transport.
    pub fn with_transport(transport: Box<dyn Transport>, params: &ConnectParams) -> Result<Self> {
        let mut stream = PacketStream::new(transport);
        let server = handshake(&mut stream, params)?;
        tracing::debug!(
            host = %params.host,
            connection_id = server.connection_id,
            "session authenticated"
        );
        Ok(Self {
            stream,
            params: params.clone(),
            server,
            pending_results: false,
            closed: false,
        })
    }

    /// Parameters the connection was opened with.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Server version string from the greeting.
    pub fn server_version(&self) -> &str {
        &self.server.server_version
    }

    /// Server thread id.
    pub fn connection_id(&self) -> u32 {
        self.server.connection_id
    }

    /// Whether `COM_QUIT` has been sent.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether unread result sets are queued behind the last one.
    pub fn has_pending_results(&self) -> bool {
        self.pending_results
    }

    /// Check that the server answers.
    pub fn ping(&mut self) -> Result<()> {
        self.begin_command()?;
        self.stream.send_command(&SimpleCommand::ping())?;
        let packet = self.stream.read_packet()?;
        expect_ok(&packet).map(|_| ())
    }

    /// Prepare a statement.
    pub fn prepare(&mut self, sql: &str) -> Result<PreparedHandle> {
        self.begin_command()?;
        self.stream.send_command(&PrepareMessage { sql })?;

        let ok = parse_prepare_ok(&self.stream.read_packet()?)?;
        let params = self.read_definitions(ok.num_params as usize)?;
        let columns = self.read_definitions(ok.num_columns as usize)?;
        tracing::debug!(
            statement_id = ok.statement_id,
            num_params = ok.num_params,
            num_columns = ok.num_columns,
            "statement prepared"
        );
        Ok(PreparedHandle {
            statement_id: ok.statement_id,
            params,
            columns,
            warnings: ok.warnings,
        })
    }

    /// Execute a prepared statement and read its first result.
    pub fn execute(&mut self, statement_id: u32, params: &[ParamValue]) -> Result<ExecuteOutcome> {
        self.begin_command()?;
        self.stream
            .send_command(&ExecuteMessage::new(statement_id, params))?;
        tracing::debug!(statement_id, num_params = params.len(), "statement executed");
        self.read_result()
    }

    /// Deallocate a prepared statement. The server sends no reply.
    pub fn close_statement(&mut self, statement_id: u32) -> Result<()> {
        self.begin_command()?;
        self.stream
            .send_command(&StatementCommand::close(statement_id))?;
        tracing::debug!(statement_id, "statement closed");
        Ok(())
    }

    /// Reset a prepared statement's server-side state.
    pub fn reset_statement(&mut self, statement_id: u32) -> Result<OkPacket> {
        self.begin_command()?;
        self.stream
            .send_command(&StatementCommand::reset(statement_id))?;
        expect_ok(&self.stream.read_packet()?)
    }

    /// Read and discard every result still queued on the wire.
    ///
    /// Returns the number of results discarded.
    pub fn drain_pending_results(&mut self) -> Result<usize> {
        let mut drained = 0;
        while self.pending_results {
            self.read_result()?;
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(drained, "discarded trailing results");
        }
        Ok(drained)
    }

    /// Send `COM_QUIT`. Later calls are no-ops.
    pub fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.send_command(&SimpleCommand::quit())
    }

    fn begin_command(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::use_after_close("connection"));
        }
        self.drain_pending_results()?;
        Ok(())
    }

    /// Read `count` column definitions followed by an EOF packet.
    fn read_definitions(&mut self, count: usize) -> Result<Vec<ColumnMetadata>> {
        let mut defs = Vec::with_capacity(count);
        if count == 0 {
            return Ok(defs);
        }
        for _ in 0..count {
            let packet = self.stream.read_packet()?;
            if packet.is_err() {
                return Err(parse_err(&packet));
            }
            defs.push(ColumnMetadata::parse(packet.payload)?);
        }
        let eof = self.stream.read_packet()?;
        parse_eof(&eof)?;
        Ok(defs)
    }

    /// Read one result: an OK packet or a whole binary result set.
    fn read_result(&mut self) -> Result<ExecuteOutcome> {
        self.pending_results = false;
        let first = self.stream.read_packet()?;
        match first.header() {
            Some(ERR_HEADER) => Err(parse_err(&first)),
            Some(OK_HEADER) => {
                let ok = parse_ok(&first)?;
                self.pending_results = ok.more_results();
                Ok(ExecuteOutcome::Ok(ok))
            }
            Some(LOCAL_INFILE_HEADER) => {
                Err(Error::protocol("LOAD DATA LOCAL INFILE is not supported"))
            }
            _ => {
                let count = parse_column_count(&first)? as usize;
                let columns = self.read_definitions(count)?;
                let mut result = self.read_rows(columns)?;
                self.pending_results = result.status_flags & SERVER_MORE_RESULTS_EXISTS != 0;
                result.rows.shrink_to_fit();
                Ok(ExecuteOutcome::Rows(result))
            }
        }
    }

    fn read_rows(&mut self, columns: Vec<ColumnMetadata>) -> Result<StoredResult> {
        let mut result = StoredResult {
            columns,
            ..StoredResult::default()
        };
        loop {
            let packet = self.stream.read_packet()?;
            if packet.is_eof() {
                let eof = parse_eof(&packet)?;
                result.warnings = eof.warnings;
                result.status_flags = eof.status_flags;
                return Ok(result);
            }
            if packet.is_err() {
                return Err(parse_err(&packet).in_fetch());
            }
            result.rows.push(packet.payload);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            tracing::warn!(error = %e, "failed to send COM_QUIT while dropping connection");
        }
    }
}
