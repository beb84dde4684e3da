//! Result sets returned by [`Statement::query`](crate::Statement::query).
//!
//! Rows are read from the server when the statement executes and kept as raw
//! binary row packets. `fetch` materializes one row at a time into the column
//! buffers; typed accessors convert the current row on demand.

use crate::column::Column;
use crate::connection::{Connection, StoredResult};
use crate::convert::{FromColumn, WireValue};
use crate::error::{Error, Result};
use crate::protocol::decode::split_binary_row;
use crate::protocol::types::{ColumnMetadata, ValueKind};
use bytes::Bytes;
use std::collections::HashMap;

/// Something that identifies a column: its ordinal or its name.
pub trait ColumnIndex {
    /// Resolve to an ordinal within `columns`.
    fn index_in(&self, columns: &[Column], names: &HashMap<String, usize>) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn index_in(&self, columns: &[Column], _names: &HashMap<String, usize>) -> Result<usize> {
        if *self < columns.len() {
            Ok(*self)
        } else {
            Err(Error::ColumnIndexOutOfBounds {
                index: *self,
                count: columns.len(),
            })
        }
    }
}

impl ColumnIndex for &str {
    fn index_in(&self, _columns: &[Column], names: &HashMap<String, usize>) -> Result<usize> {
        names
            .get(*self)
            .copied()
            .ok_or_else(|| Error::ColumnNotFound {
                name: self.to_string(),
            })
    }
}

impl ColumnIndex for &String {
    fn index_in(&self, columns: &[Column], names: &HashMap<String, usize>) -> Result<usize> {
        self.as_str().index_in(columns, names)
    }
}

/// Rows produced by one execution of a statement.
///
/// Borrows the statement's session for its whole lifetime, so the statement
/// cannot be re-executed or closed while a result is alive.
pub struct ResultSet<'r> {
    conn: &'r mut Connection,
    metadata: Vec<ColumnMetadata>,
    rows: Vec<Bytes>,
    columns: Vec<Column>,
    kinds: Vec<ValueKind>,
    names: HashMap<String, usize>,
    /// Number of rows fetched so far.
    position: usize,
    has_row: bool,
    exhausted: bool,
    bound: bool,
    closed: bool,
    warnings: u16,
}

impl<'r> ResultSet<'r> {
    pub(crate) fn new(conn: &'r mut Connection, stored: StoredResult) -> Self {
        Self {
            conn,
            metadata: stored.columns,
            rows: stored.rows,
            columns: Vec::new(),
            kinds: Vec::new(),
            names: HashMap::new(),
            position: 0,
            has_row: false,
            exhausted: false,
            bound: false,
            closed: false,
            warnings: stored.warnings,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::use_after_close("result set"));
        }
        Ok(())
    }

    /// Discover the result columns and allocate their buffers.
    ///
    /// Idempotent; `fetch` calls it on first use. When two columns share a
    /// name, lookups by that name resolve to the first one.
    pub fn bind(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.bound {
            return Ok(());
        }
        let mut columns = Vec::with_capacity(self.metadata.len());
        for meta in &self.metadata {
            columns.push(Column::from_metadata(meta.clone()).map_err(Error::in_fetch)?);
        }
        let mut names = HashMap::with_capacity(columns.len());
        for (idx, col) in columns.iter().enumerate() {
            names.entry(col.name().to_string()).or_insert(idx);
        }
        self.kinds = columns.iter().map(Column::kind).collect();
        self.columns = columns;
        self.names = names;
        self.bound = true;
        tracing::debug!(
            columns = self.columns.len(),
            rows = self.rows.len(),
            "result set bound"
        );
        Ok(())
    }

    /// Advance to the next row.
    ///
    /// Returns `false` once the rows are exhausted, and keeps returning
    /// `false` afterwards. With `is_proc` set, the trailing results a stored
    /// procedure call leaves on the wire are drained when the rows run out.
    pub fn fetch(&mut self, is_proc: bool) -> Result<bool> {
        self.bind()?;
        if self.exhausted {
            return Ok(false);
        }
        if self.position >= self.rows.len() {
            self.exhausted = true;
            self.has_row = false;
            if is_proc {
                self.conn.drain_pending_results().map_err(Error::in_fetch)?;
            }
            return Ok(false);
        }

        let row = self.rows[self.position].clone();
        self.position += 1;
        self.has_row = false;
        let values = split_binary_row(row, &self.kinds).map_err(Error::in_fetch)?;
        for (col, raw) in self.columns.iter_mut().zip(values.iter()) {
            col.load(raw.as_deref()).map_err(Error::in_fetch)?;
            if col.is_truncated() {
                if let Some(raw) = raw {
                    col.reload(raw).map_err(Error::in_fetch)?;
                }
            }
        }
        self.has_row = true;
        Ok(true)
    }

    /// Total number of rows in the result.
    pub fn num_rows(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Number of rows fetched so far.
    pub fn row_position(&self) -> u64 {
        self.position as u64
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.metadata.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.metadata.iter().map(|m| m.name.as_str()).collect()
    }

    /// Column descriptors; empty until the result is bound.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Warnings reported at the end of the result.
    pub fn warning_count(&self) -> u16 {
        self.warnings
    }

    fn current_column<I: ColumnIndex>(&self, index: I) -> Result<&Column> {
        self.ensure_open()?;
        // Columns are only bound by the first fetch.
        if !self.has_row {
            return Err(Error::fetch("no current row; call fetch first"));
        }
        let idx = index.index_in(&self.columns, &self.names)?;
        Ok(&self.columns[idx])
    }

    /// Read a column of the current row.
    ///
    /// # Errors
    /// - `NullValue` if the column is NULL and `T` is not an `Option`
    /// - `ColumnNotFound` / `ColumnIndexOutOfBounds` for an unknown column
    /// - `TypeConversion` if the value cannot be converted to `T`
    pub fn get<T: FromColumn, I: ColumnIndex>(&self, index: I) -> Result<T> {
        let col = self.current_column(index)?;
        match WireValue::from_column(col)? {
            Some(value) => T::from_wire(value),
            None => T::from_null(col.name()),
        }
    }

    /// Whether a column of the current row is NULL.
    pub fn is_null<I: ColumnIndex>(&self, index: I) -> Result<bool> {
        Ok(self.current_column(index)?.is_null())
    }

    /// Release the result early, discarding any results still on the wire.
    ///
    /// Any later operation fails with `UseAfterClose`.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.has_row = false;
        self.rows.clear();
        self.conn.drain_pending_results().map(|_| ())
    }
}

impl Drop for ResultSet<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.conn.drain_pending_results() {
            tracing::warn!(error = %e, "failed to drain pending results");
        }
    }
}

impl std::fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("columns", &self.column_names())
            .field("num_rows", &self.rows.len())
            .field("position", &self.position)
            .field("exhausted", &self.exhausted)
            .field("closed", &self.closed)
            .finish()
    }
}
