//! MySQL Thin Client for Rust
//!
//! A pure Rust client for MySQL's binary prepared-statement protocol. It binds
//! typed parameters into a statement, executes it and materializes typed rows
//! without manual buffer management and without `libmysqlclient`.
//!
//! # Example
//!
//! ```no_run
//! use mysql_thin_rs::{Result, Session, Timestamp};
//!
//! fn main() -> Result<()> {
//!     // Connect to the database
//!     let mut session = Session::open("localhost", "app", "secret", "shop")?;
//!
//!     // Insert a row
//!     let mut insert = session.prepare("INSERT INTO orders (item, placed) VALUES (?, ?)")?;
//!     insert.param("widget")?.param(Timestamp::from_text("2024-01-15 10:30:00")?)?;
//!     assert_eq!(insert.execute()?, 1);
//!     drop(insert);
//!
//!     // Read it back
//!     let mut select = session.prepare("SELECT id, item FROM orders WHERE item = ?")?;
//!     select.param("widget")?;
//!     let mut rows = select.query()?;
//!     while rows.fetch(false)? {
//!         let id: u64 = rows.get("id")?;
//!         let item: String = rows.get(1)?;
//!         println!("{} {}", id, item);
//!     }
//!     drop(rows);
//!     drop(select);
//!
//!     // Close connection
//!     session.close()
//! }
//! ```

pub mod column;
pub mod connection;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod result;
pub mod session;
pub mod statement;
pub mod timestamp;

// Re-export main types
pub use column::Column;
pub use connection::Connection;
pub use convert::{FromColumn, ToParam, WireValue};
pub use error::{Error, ErrorKind, Result};
pub use protocol::connect::ConnectParams;
pub use protocol::packet::Transport;
pub use protocol::types::{ColumnMetadata, ColumnType, ParamValue, ValueKind};
pub use result::{ColumnIndex, ResultSet};
pub use session::Session;
pub use statement::Statement;
pub use timestamp::Timestamp;
