//! ZooKeeper wire protocol: records, opcodes and framing.

pub mod codec;
pub mod constants;
pub mod records;

pub use codec::{encode_records, FrameCodec};
