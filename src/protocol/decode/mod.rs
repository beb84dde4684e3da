//! Data decoders for the MySQL binary protocol.
//!
//! ## Currently Supported
//!
//! | Wire data | Module |
//! |-----------|--------|
//! | Binary result rows | `row` |
//! | DATE / DATETIME / TIMESTAMP | `temporal` |
//! | TIME | `temporal` |
//!
//! Integers, floats and strings are copied from the row as-is and don't
//! require dedicated decoders.

mod row;
mod temporal;

pub use row::{null_bitmap_len, split_binary_row};
pub use temporal::{decode_datetime, decode_time, TemporalValue};
