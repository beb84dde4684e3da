//! Client sessions.

use crate::connection::Connection;
use crate::error::{Error, ErrorKind, Result};
use crate::protocol::connect::ConnectParams;
use crate::protocol::packet::Transport;
use crate::statement::Statement;
use crate::timestamp::Timestamp;

/// A live connection plus the bookkeeping a pool needs.
///
/// # Example
///
/// ```no_run
/// use mysql_thin_rs::{Result, Session};
///
/// fn main() -> Result<()> {
///     let mut session = Session::open("localhost", "app", "secret", "shop")?;
///     assert!(session.ping());
///     session.close()
/// }
/// ```
pub struct Session {
    conn: Connection,
    pooled: bool,
    last_released: Timestamp,
}

impl Session {
    /// Open a session with explicit connection parameters.
    ///
    /// # Errors
    /// Any failure to reach or authenticate with the server is reported with
    /// kind `Connect`.
    pub fn connect(params: &ConnectParams) -> Result<Self> {
        let conn = Connection::connect(params).map_err(into_connect_error)?;
        Ok(Self::from_connection(conn, params))
    }

    /// Open a session on the default port with the default character set.
    pub fn open(host: &str, user: &str, password: &str, database: &str) -> Result<Self> {
        Self::connect(&ConnectParams::new(host, user, password, database))
    }

    /// Open a session over an already connected transport.
    pub fn with_transport(transport: Box<dyn Transport>, params: &ConnectParams) -> Result<Self> {
        let conn = Connection::with_transport(transport, params).map_err(into_connect_error)?;
        Ok(Self::from_connection(conn, params))
    }

    fn from_connection(conn: Connection, params: &ConnectParams) -> Self {
        Self {
            conn,
            pooled: params.pooled,
            last_released: Timestamp::now(),
        }
    }

    /// Check that the server is still reachable.
    pub fn ping(&mut self) -> bool {
        match self.conn.ping() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "ping failed");
                false
            }
        }
    }

    /// Prepare a statement on this session.
    ///
    /// # Errors
    /// `Prepare` if the server rejects the SQL.
    pub fn prepare(&mut self, sql: &str) -> Result<Statement<'_>> {
        Statement::prepare(self, sql)
    }

    /// When the session was last handed back to its pool.
    pub fn last_released(&self) -> Timestamp {
        self.last_released
    }

    /// Record when the session was handed back to its pool.
    pub fn set_released(&mut self, at: Timestamp) {
        self.last_released = at;
    }

    /// Whether the session belongs to a pool.
    pub fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// Mark whether the session belongs to a pool.
    pub fn set_pooled(&mut self, pooled: bool) {
        self.pooled = pooled;
    }

    /// Server version string.
    pub fn server_version(&self) -> &str {
        self.conn.server_version()
    }

    /// Server thread id of this session.
    pub fn connection_id(&self) -> u32 {
        self.conn.connection_id()
    }

    /// Parameters the session was opened with.
    pub fn params(&self) -> &ConnectParams {
        self.conn.params()
    }

    /// Close the session, sending `COM_QUIT`.
    pub fn close(mut self) -> Result<()> {
        self.conn.quit()
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.conn.params().host)
            .field("connection_id", &self.conn.connection_id())
            .field("pooled", &self.pooled)
            .field("last_released", &self.last_released)
            .finish()
    }
}

fn into_connect_error(err: Error) -> Error {
    match err.kind() {
        ErrorKind::Connect => err,
        _ => Error::connect(err.to_string()),
    }
}
