//! Prepared statements with positional parameter binding.

use crate::connection::{ExecuteOutcome, PreparedHandle};
use crate::convert::ToParam;
use crate::error::{Error, Result};
use crate::protocol::response::OkPacket;
use crate::protocol::types::ParamValue;
use crate::result::ResultSet;
use crate::session::Session;

/// A statement prepared on the server.
///
/// Parameters are bound positionally with [`param`](Statement::param) and
/// consumed by the next [`execute`](Statement::execute) or
/// [`query`](Statement::query), whether it succeeds or not.
///
/// # Example
///
/// ```no_run
/// use mysql_thin_rs::{Result, Session};
///
/// fn rename(session: &mut Session, id: u32, name: &str) -> Result<u64> {
///     let mut stmt = session.prepare("UPDATE items SET name = ? WHERE id = ?")?;
///     stmt.param(name)?.param(id)?;
///     stmt.execute()
/// }
/// ```
pub struct Statement<'s> {
    session: &'s mut Session,
    handle: PreparedHandle,
    sql: String,
    binds: Vec<ParamValue>,
    last_ok: OkPacket,
    closed: bool,
}

impl<'s> Statement<'s> {
    pub(crate) fn prepare(session: &'s mut Session, sql: &str) -> Result<Self> {
        let handle = session
            .connection_mut()
            .prepare(sql)
            .map_err(Error::in_prepare)?;
        Ok(Self {
            session,
            binds: Vec::with_capacity(handle.num_params()),
            handle,
            sql: sql.to_string(),
            last_ok: OkPacket::default(),
            closed: false,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::use_after_close("statement"));
        }
        Ok(())
    }

    /// SQL text the statement was prepared from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of `?` placeholders reported by the server.
    pub fn param_count(&self) -> usize {
        self.handle.num_params()
    }

    /// Number of placeholders bound so far.
    pub fn bound_count(&self) -> usize {
        self.binds.len()
    }

    /// Bind the next placeholder.
    ///
    /// The wire type follows the Rust type; `None` binds SQL NULL.
    ///
    /// # Errors
    /// `Bind` if every placeholder is already bound or the value has no
    /// MySQL representation. A failed bind leaves the position unchanged.
    pub fn param<T: ToParam>(&mut self, value: T) -> Result<&mut Self> {
        self.ensure_open()?;
        let value = value.to_param()?;
        self.push(value)
    }

    /// Bind the next placeholder as a BLOB.
    pub fn param_blob(&mut self, value: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.push(ParamValue::Blob(value.into()))
    }

    /// Bind the next placeholder as SQL NULL.
    pub fn param_null(&mut self) -> Result<&mut Self> {
        self.push(ParamValue::Null)
    }

    fn push(&mut self, value: ParamValue) -> Result<&mut Self> {
        self.ensure_open()?;
        if self.binds.len() >= self.handle.num_params() {
            return Err(Error::bind(format!(
                "statement has {} placeholders, cannot bind parameter {}",
                self.handle.num_params(),
                self.binds.len() + 1
            )));
        }
        self.binds.push(value);
        Ok(self)
    }

    /// Take the bound values, checking that every placeholder is filled.
    fn take_binds(&mut self) -> Result<Vec<ParamValue>> {
        let binds = std::mem::take(&mut self.binds);
        if binds.len() != self.handle.num_params() {
            return Err(Error::bind(format!(
                "statement has {} placeholders but {} parameters were bound",
                self.handle.num_params(),
                binds.len()
            )));
        }
        Ok(binds)
    }

    /// Run the statement and return the number of affected rows.
    ///
    /// A statement that unexpectedly returns rows has them discarded and
    /// reports 0.
    pub fn execute(&mut self) -> Result<u64> {
        self.ensure_open()?;
        let binds = self.take_binds()?;
        let outcome = self
            .session
            .connection_mut()
            .execute(self.handle.statement_id, &binds)
            .map_err(Error::in_execute)?;
        match outcome {
            ExecuteOutcome::Ok(ok) => {
                let affected = ok.affected_rows;
                self.last_ok = ok;
                Ok(affected)
            }
            ExecuteOutcome::Rows(stored) => {
                tracing::debug!(
                    rows = stored.rows.len(),
                    "execute discarded an unexpected result set"
                );
                self.last_ok = OkPacket {
                    warnings: stored.warnings,
                    status_flags: stored.status_flags,
                    ..OkPacket::default()
                };
                Ok(0)
            }
        }
    }

    /// Run a row-returning statement.
    ///
    /// # Errors
    /// `Execute` if the server rejects the statement or if it produces no
    /// result set.
    pub fn query(&mut self) -> Result<ResultSet<'_>> {
        self.ensure_open()?;
        let binds = self.take_binds()?;
        // Procedure calls only describe their results once executed.
        if self.handle.columns.is_empty() && !is_call(&self.sql) {
            return Err(Error::execute("statement does not return a result set"));
        }
        let outcome = self
            .session
            .connection_mut()
            .execute(self.handle.statement_id, &binds)
            .map_err(Error::in_execute)?;
        match outcome {
            ExecuteOutcome::Rows(stored) => {
                self.last_ok = OkPacket {
                    warnings: stored.warnings,
                    status_flags: stored.status_flags,
                    ..OkPacket::default()
                };
                Ok(ResultSet::new(self.session.connection_mut(), stored))
            }
            ExecuteOutcome::Ok(ok) => {
                self.last_ok = ok;
                Err(Error::execute("statement produced no result set"))
            }
        }
    }

    /// Clear the bound values and the server-side statement state.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.binds.clear();
        self.session
            .connection_mut()
            .reset_statement(self.handle.statement_id)
            .map_err(Error::in_execute)?;
        Ok(())
    }

    /// Auto-increment id generated by the last `execute`.
    pub fn last_insert_id(&self) -> u64 {
        self.last_ok.last_insert_id
    }

    /// Warnings raised by the last execution.
    pub fn warning_count(&self) -> u16 {
        self.last_ok.warnings
    }

    /// Deallocate the statement on the server.
    ///
    /// Any later operation fails with `UseAfterClose`.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.binds.clear();
        self.session
            .connection_mut()
            .close_statement(self.handle.statement_id)
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let id = self.handle.statement_id;
        if let Err(e) = self.session.connection_mut().close_statement(id) {
            tracing::warn!(statement_id = id, error = %e, "failed to close statement");
        }
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("statement_id", &self.handle.statement_id)
            .field("sql", &self.sql)
            .field("param_count", &self.handle.num_params())
            .field("bound", &self.binds.len())
            .field("closed", &self.closed)
            .finish()
    }
}

fn is_call(sql: &str) -> bool {
    let head = sql.trim_start();
    head.len() >= 4
        && head.as_bytes()[..4].eq_ignore_ascii_case(b"CALL")
        && head[4..].starts_with(|c: char| c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_call() {
        assert!(is_call("CALL p()"));
        assert!(is_call("  call\tp(?)"));
        assert!(!is_call("CALLER"));
        assert!(!is_call("SELECT 1"));
        assert!(!is_call("cal"));
    }
}
