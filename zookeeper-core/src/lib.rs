//! Core types and protocol plumbing for the ZooKeeper wire protocol.
//!
//! This crate holds everything the async client needs below the socket:
//! the error taxonomy, the Jute record codec, the protocol record structs,
//! opcodes, and the length-prefixed frame codec.

#![warn(missing_docs)]

pub mod error;
pub mod jute;
pub mod protocol;

pub use error::{ErrorCode, Result, ZkError};
pub use jute::{JuteDeserialize, JuteInput, JuteOutput, JuteSerialize};
