//! MySQL client messages using the builder pattern.
//!
//! Each message implements the `Message` trait for single-allocation
//! serialization.

pub mod command;
pub mod execute;
pub mod handshake;

pub use command::{PrepareMessage, SimpleCommand, StatementCommand};
pub use execute::ExecuteMessage;
pub use handshake::{AuthDataMessage, HandshakeResponseMessage};
