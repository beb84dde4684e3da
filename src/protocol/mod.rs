//! MySQL client/server protocol implementation for the thin client.

pub mod auth;
pub mod buffer;
pub mod connect;
pub mod constants;
pub mod crypto;
pub mod decode;
pub mod message;
pub mod messages;
pub mod packet;
pub mod response;
pub mod types;

pub use buffer::ReadBuffer;
pub use message::{Message, WriteExt};
pub use messages::{
    AuthDataMessage, ExecuteMessage, HandshakeResponseMessage, PrepareMessage, SimpleCommand,
    StatementCommand,
};
pub use packet::{Packet, PacketStream, Transport};
pub use types::{ColumnMetadata, ColumnType, ParamValue, ValueKind};
