//! Execute message for prepared statements.

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{Message, WriteExt};
use crate::protocol::types::ParamValue;

/// `COM_STMT_EXECUTE` for a prepared statement.
///
/// Parameters are always sent with `new_params_bound = 1`, so the server
/// receives the type of every placeholder on every execution.
pub struct ExecuteMessage<'a> {
    /// Server-side statement id.
    pub statement_id: u32,
    /// Bound values, one per placeholder.
    pub params: &'a [ParamValue],
}

impl<'a> ExecuteMessage<'a> {
    /// Create a new execute message.
    pub fn new(statement_id: u32, params: &'a [ParamValue]) -> Self {
        Self {
            statement_id,
            params,
        }
    }

    fn null_bitmap_len(&self) -> usize {
        (self.params.len() + 7) / 8
    }
}

impl Message for ExecuteMessage<'_> {
    fn wire_size(&self) -> usize {
        let mut size = 0;
        size += 1; // command
        size += 4; // statement id
        size += 1; // flags
        size += 4; // iteration count
        if !self.params.is_empty() {
            size += self.null_bitmap_len();
            size += 1; // new_params_bound
            size += 2 * self.params.len(); // types
            size += self
                .params
                .iter()
                .map(ParamValue::value_wire_size)
                .sum::<usize>();
        }
        size
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(COM_STMT_EXECUTE);
        buf.write_u32_le(self.statement_id);
        buf.write_u8(CURSOR_TYPE_NO_CURSOR);
        buf.write_u32_le(1); // iteration count

        if self.params.is_empty() {
            return Ok(());
        }

        let mut bitmap = vec![0u8; self.null_bitmap_len()];
        for (idx, param) in self.params.iter().enumerate() {
            if param.is_null() {
                bitmap[idx / 8] |= 1 << (idx % 8);
            }
        }
        buf.write_bytes(&bitmap);
        buf.write_u8(NEW_PARAMS_BOUND);

        for param in self.params {
            buf.write_u8(param.type_tag());
            buf.write_u8(param.flag_byte());
        }
        for param in self.params {
            param.write_value(buf);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(msg: &ExecuteMessage<'_>) -> Vec<u8> {
        let mut buf = Vec::with_capacity(msg.wire_size());
        msg.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), msg.wire_size());
        buf
    }

    #[test]
    fn test_execute_without_params() {
        let buf = encode(&ExecuteMessage::new(3, &[]));
        assert_eq!(buf, vec![COM_STMT_EXECUTE, 3, 0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_execute_with_params() {
        let params = vec![
            ParamValue::UInt32(5),
            ParamValue::Null,
            ParamValue::Text("x".to_string()),
        ];
        let buf = encode(&ExecuteMessage::new(1, &params));
        // header (10) + bitmap (1) + bound flag (1) + types (6)
        assert_eq!(buf[10], 0b0000_0010);
        assert_eq!(buf[11], NEW_PARAMS_BOUND);
        assert_eq!(
            &buf[12..18],
            &[
                MYSQL_TYPE_LONG,
                PARAM_UNSIGNED_FLAG,
                MYSQL_TYPE_NULL,
                0,
                MYSQL_TYPE_VAR_STRING,
                0
            ]
        );
        assert_eq!(&buf[18..], &[5, 0, 0, 0, 1, b'x']);
    }

    #[test]
    fn test_null_bitmap_spans_bytes() {
        let mut params = vec![ParamValue::Int8(0); 9];
        params[8] = ParamValue::Null;
        let buf = encode(&ExecuteMessage::new(1, &params));
        assert_eq!(&buf[10..12], &[0, 1]);
    }
}
