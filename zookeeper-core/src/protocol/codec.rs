//! Length-prefixed framing around the Jute record codec.
//!
//! Every packet on the wire is one frame: a 4-byte big-endian length
//! followed by that many bytes of Jute-encoded payload. The frame is the
//! atomic unit of both read and write; record decoding always happens on
//! the extracted payload so a short record can never consume bytes of the
//! next frame.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::constants::SIZE_OF_FRAME_LENGTH_FIELD;
use crate::error::{Result, ZkError};
use crate::jute::{JuteOutput, JuteSerialize};

/// Serializes records positionally into a single frame payload.
///
/// There is no tag or separator between records; the result is the inner
/// payload of one frame, to be framed by [`FrameCodec`].
pub fn encode_records(records: &[&dyn JuteSerialize]) -> Result<Bytes> {
    let mut output = JuteOutput::new();
    for record in records {
        record.serialize(&mut output)?;
    }
    Ok(output.into_bytes().freeze())
}

/// Codec turning a byte stream into frame payloads and back.
///
/// Implements `tokio_util::codec::{Encoder, Decoder}`: the encoder
/// prepends the length field to a payload, the decoder strips it and
/// yields exactly the payload bytes of one frame.
#[derive(Debug, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates a new codec instance.
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ZkError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        if payload.len() > i32::MAX as usize {
            return Err(ZkError::Serialization(format!(
                "frame payload too large: {} bytes",
                payload.len()
            )));
        }
        dst.reserve(SIZE_OF_FRAME_LENGTH_FIELD + payload.len());
        dst.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = ZkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        if src.len() < SIZE_OF_FRAME_LENGTH_FIELD {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        let total_frame_size = SIZE_OF_FRAME_LENGTH_FIELD + length;

        if src.len() < total_frame_size {
            src.reserve(total_frame_size - src.len());
            return Ok(None);
        }

        src.advance(SIZE_OF_FRAME_LENGTH_FIELD);
        Ok(Some(src.split_to(length)))
    }
}
