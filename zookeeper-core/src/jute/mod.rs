//! Jute binary serialization, the record format used by ZooKeeper.
//!
//! Jute encodes primitives in big-endian byte order and prefixes strings,
//! buffers and vectors with an `i32` length. Records are concatenations of
//! their fields in declaration order with no tags between them.

mod input;
mod output;

pub use input::JuteInput;
pub use output::JuteOutput;

use crate::error::Result;

/// Trait for record types that can be serialized to Jute's binary format.
pub trait JuteSerialize: Send + Sync {
    /// Serializes this record to the given output.
    fn serialize(&self, output: &mut JuteOutput) -> Result<()>;

    /// Convenience method: serializes this record to a byte vector.
    fn to_bytes(&self) -> Result<Vec<u8>>
    where
        Self: Sized,
    {
        let mut output = JuteOutput::new();
        self.serialize(&mut output)?;
        Ok(output.into_bytes().to_vec())
    }
}

/// Trait for record types that can be deserialized from Jute's binary format.
pub trait JuteDeserialize: Sized {
    /// Deserializes a record from the given input.
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self>;

    /// Convenience method: deserializes a record from a byte slice.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = JuteInput::new(data);
        Self::deserialize(&mut input)
    }
}
