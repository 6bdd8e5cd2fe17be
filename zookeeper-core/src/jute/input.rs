//! Jute binary reader.

use crate::error::{Result, ZkError};
use bytes::Buf;
use std::io::Cursor;

/// A bounds-checked reader over Jute-encoded bytes.
///
/// All multi-byte values are read in big-endian byte order. Strings,
/// buffers and vectors are length-prefixed with an `i32`; a negative
/// length denotes a null buffer/vector and decodes to an empty one.
#[derive(Debug)]
pub struct JuteInput<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> JuteInput<'a> {
    /// Creates a new `JuteInput` over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the current position in the buffer.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.cursor.remaining() < n {
            Err(ZkError::Serialization(format!(
                "insufficient data: need {} bytes, have {}",
                n,
                self.cursor.remaining()
            )))
        } else {
            Ok(())
        }
    }

    /// Reads a boolean from a single byte.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.ensure_remaining(1)?;
        Ok(self.cursor.get_u8() != 0)
    }

    /// Reads a 32-bit signed integer in big-endian order.
    pub fn read_int(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(self.cursor.get_i32())
    }

    /// Reads a 64-bit signed integer in big-endian order.
    pub fn read_long(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(self.cursor.get_i64())
    }

    /// Reads a length-prefixed byte buffer.
    ///
    /// A negative length encodes a null buffer and decodes to an empty one.
    pub fn read_buffer(&mut self) -> Result<Vec<u8>> {
        let len = self.read_int()?;
        if len < 0 {
            return Ok(Vec::new());
        }
        self.ensure_remaining(len as usize)?;
        let mut buf = vec![0u8; len as usize];
        self.cursor.copy_to_slice(&mut buf);
        Ok(buf)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_int()?;
        if len < 0 {
            return Err(ZkError::Serialization(format!(
                "invalid string length: {}",
                len
            )));
        }
        self.ensure_remaining(len as usize)?;
        let mut buf = vec![0u8; len as usize];
        self.cursor.copy_to_slice(&mut buf);
        String::from_utf8(buf)
            .map_err(|e| ZkError::Serialization(format!("invalid UTF-8 string: {}", e)))
    }

    /// Reads a count-prefixed vector of strings.
    ///
    /// A negative count encodes a null vector and decodes to an empty one.
    pub fn read_string_vector(&mut self) -> Result<Vec<String>> {
        let count = self.read_int()?;
        if count < 0 {
            return Ok(Vec::new());
        }
        let mut strings = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            strings.push(self.read_string()?);
        }
        Ok(strings)
    }
}
