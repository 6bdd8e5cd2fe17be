//! Jute binary writer.

use crate::error::Result;
use bytes::{BufMut, BytesMut};

/// A buffer-backed writer producing Jute-encoded bytes.
///
/// All multi-byte values are written in big-endian byte order. Strings,
/// buffers and vectors are length-prefixed with an `i32`.
#[derive(Debug, Default)]
pub struct JuteOutput {
    buffer: BytesMut,
}

impl JuteOutput {
    /// Creates a new `JuteOutput` with default capacity.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
        }
    }

    /// Creates a new `JuteOutput` with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Returns the written bytes as a slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the writer and returns the underlying buffer.
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Writes a boolean as a single byte (0 for false, 1 for true).
    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.buffer.put_u8(v as u8);
        Ok(())
    }

    /// Writes a 32-bit signed integer in big-endian order.
    pub fn write_int(&mut self, v: i32) -> Result<()> {
        self.buffer.put_i32(v);
        Ok(())
    }

    /// Writes a 64-bit signed integer in big-endian order.
    pub fn write_long(&mut self, v: i64) -> Result<()> {
        self.buffer.put_i64(v);
        Ok(())
    }

    /// Writes a byte buffer with its length prefix.
    pub fn write_buffer(&mut self, v: &[u8]) -> Result<()> {
        self.write_int(v.len() as i32)?;
        self.buffer.put_slice(v);
        Ok(())
    }

    /// Writes a string with its length prefix.
    pub fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_buffer(v.as_bytes())
    }

    /// Writes a vector of strings with its count prefix.
    pub fn write_string_vector(&mut self, v: &[String]) -> Result<()> {
        self.write_int(v.len() as i32)?;
        for s in v {
            self.write_string(s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_output_is_empty() {
        let output = JuteOutput::new();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
    }

    #[test]
    fn test_write_bool() {
        let mut output = JuteOutput::new();
        output.write_bool(true).unwrap();
        output.write_bool(false).unwrap();
        assert_eq!(output.as_bytes(), &[1, 0]);
    }

    #[test]
    fn test_write_int_big_endian() {
        let mut output = JuteOutput::new();
        output.write_int(0x01020304).unwrap();
        assert_eq!(output.as_bytes(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_write_int_negative() {
        let mut output = JuteOutput::new();
        output.write_int(-2).unwrap();
        assert_eq!(output.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_write_long_big_endian() {
        let mut output = JuteOutput::new();
        output.write_long(0x0102030405060708).unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }

    #[test]
    fn test_write_buffer() {
        let mut output = JuteOutput::new();
        output.write_buffer(&[1, 2, 3]).unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn test_write_string() {
        let mut output = JuteOutput::new();
        output.write_string("test").unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 4, b't', b'e', b's', b't']);
    }

    #[test]
    fn test_write_empty_string() {
        let mut output = JuteOutput::new();
        output.write_string("").unwrap();
        assert_eq!(output.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_write_string_vector() {
        let mut output = JuteOutput::new();
        output
            .write_string_vector(&["a".to_string(), "bc".to_string()])
            .unwrap();
        assert_eq!(
            output.as_bytes(),
            &[0, 0, 0, 2, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'b', b'c']
        );
    }
}
