//! The Jute records exchanged with a ZooKeeper server.
//!
//! Field order matches the ZooKeeper protocol definitions; a record on the
//! wire is its fields concatenated in declaration order.

use super::constants::{PASSWORD_SIZE, PROTOCOL_VERSION};
use crate::error::Result;
use crate::jute::{JuteDeserialize, JuteInput, JuteOutput, JuteSerialize};

/// The session handshake request, sent before any other frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Protocol version, always 0.
    pub protocol_version: i32,
    /// Last zxid observed by the client; zero for a new session.
    pub last_zxid_seen: i64,
    /// Requested session timeout in milliseconds.
    pub time_out: i32,
    /// Session id to resume; zero for a new session.
    pub session_id: i64,
    /// Session password; all-zero for a new session.
    pub passwd: Vec<u8>,
}

impl ConnectRequest {
    /// Creates an anonymous new-session handshake request with the given
    /// timeout in milliseconds.
    pub fn new(time_out_ms: i32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            last_zxid_seen: 0,
            time_out: time_out_ms,
            session_id: 0,
            passwd: vec![0; PASSWORD_SIZE],
        }
    }
}

impl JuteSerialize for ConnectRequest {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_int(self.protocol_version)?;
        output.write_long(self.last_zxid_seen)?;
        output.write_int(self.time_out)?;
        output.write_long(self.session_id)?;
        output.write_buffer(&self.passwd)?;
        Ok(())
    }
}

impl JuteDeserialize for ConnectRequest {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            protocol_version: input.read_int()?,
            last_zxid_seen: input.read_long()?,
            time_out: input.read_int()?,
            session_id: input.read_long()?,
            passwd: input.read_buffer()?,
        })
    }
}

/// The session handshake response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResponse {
    /// Protocol version, always 0.
    pub protocol_version: i32,
    /// Session timeout granted by the server, in milliseconds.
    pub time_out: i32,
    /// Server-assigned session id.
    pub session_id: i64,
    /// Server-assigned session password.
    pub passwd: Vec<u8>,
}

impl JuteSerialize for ConnectResponse {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_int(self.protocol_version)?;
        output.write_int(self.time_out)?;
        output.write_long(self.session_id)?;
        output.write_buffer(&self.passwd)?;
        Ok(())
    }
}

impl JuteDeserialize for ConnectResponse {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            protocol_version: input.read_int()?,
            time_out: input.read_int()?,
            session_id: input.read_long()?,
            passwd: input.read_buffer()?,
        })
    }
}

/// The header preceding every request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Per-session request id used to correlate the reply.
    pub xid: i32,
    /// Request type code (see [`super::constants`]).
    pub type_: i32,
}

impl JuteSerialize for RequestHeader {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_int(self.xid)?;
        output.write_int(self.type_)?;
        Ok(())
    }
}

impl JuteDeserialize for RequestHeader {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            xid: input.read_int()?,
            type_: input.read_int()?,
        })
    }
}

/// The header preceding every reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    /// The xid of the request this reply answers.
    pub xid: i32,
    /// Server transaction id; opaque to this client.
    pub zxid: i64,
    /// Zero on success, otherwise a ZooKeeper error code.
    pub err: i32,
}

impl JuteSerialize for ReplyHeader {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_int(self.xid)?;
        output.write_long(self.zxid)?;
        output.write_int(self.err)?;
        Ok(())
    }
}

impl JuteDeserialize for ReplyHeader {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            xid: input.read_int()?,
            zxid: input.read_long()?,
            err: input.read_int()?,
        })
    }
}

/// Node metadata carried alongside node data.
///
/// Carried through to the caller without interpretation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    /// zxid of the change that created the node.
    pub czxid: i64,
    /// zxid of the change that last modified the node.
    pub mzxid: i64,
    /// Creation time in epoch milliseconds.
    pub ctime: i64,
    /// Last-modified time in epoch milliseconds.
    pub mtime: i64,
    /// Number of changes to the data of the node.
    pub version: i32,
    /// Number of changes to the children of the node.
    pub cversion: i32,
    /// Number of changes to the ACL of the node.
    pub aversion: i32,
    /// Session id of the owner if ephemeral, zero otherwise.
    pub ephemeral_owner: i64,
    /// Length of the data field of the node.
    pub data_length: i32,
    /// Number of children of the node.
    pub num_children: i32,
    /// Last modified children.
    pub pzxid: i64,
}

impl JuteSerialize for Stat {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_long(self.czxid)?;
        output.write_long(self.mzxid)?;
        output.write_long(self.ctime)?;
        output.write_long(self.mtime)?;
        output.write_int(self.version)?;
        output.write_int(self.cversion)?;
        output.write_int(self.aversion)?;
        output.write_long(self.ephemeral_owner)?;
        output.write_int(self.data_length)?;
        output.write_int(self.num_children)?;
        output.write_long(self.pzxid)?;
        Ok(())
    }
}

impl JuteDeserialize for Stat {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            czxid: input.read_long()?,
            mzxid: input.read_long()?,
            ctime: input.read_long()?,
            mtime: input.read_long()?,
            version: input.read_int()?,
            cversion: input.read_int()?,
            aversion: input.read_int()?,
            ephemeral_owner: input.read_long()?,
            data_length: input.read_int()?,
            num_children: input.read_int()?,
            pzxid: input.read_long()?,
        })
    }
}

/// Request body for fetching the data of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataRequest {
    /// Absolute path of the node.
    pub path: String,
    /// Whether to leave a watch on the node; this client never does.
    pub watch: bool,
}

impl JuteSerialize for GetDataRequest {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_string(&self.path)?;
        output.write_bool(self.watch)?;
        Ok(())
    }
}

impl JuteDeserialize for GetDataRequest {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            path: input.read_string()?,
            watch: input.read_bool()?,
        })
    }
}

/// Reply body for a [`GetDataRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetDataResponse {
    /// The data stored at the node.
    pub data: Vec<u8>,
    /// Node metadata, passed through untouched.
    pub stat: Stat,
}

impl JuteSerialize for GetDataResponse {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_buffer(&self.data)?;
        self.stat.serialize(output)?;
        Ok(())
    }
}

impl JuteDeserialize for GetDataResponse {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            data: input.read_buffer()?,
            stat: Stat::deserialize(input)?,
        })
    }
}

/// Request body for listing the children of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetChildrenRequest {
    /// Absolute path of the node.
    pub path: String,
}

impl JuteSerialize for GetChildrenRequest {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_string(&self.path)
    }
}

impl JuteDeserialize for GetChildrenRequest {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            path: input.read_string()?,
        })
    }
}

/// Reply body for a [`GetChildrenRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetChildrenResponse {
    /// Names of the node's children.
    pub children: Vec<String>,
}

impl JuteSerialize for GetChildrenResponse {
    fn serialize(&self, output: &mut JuteOutput) -> Result<()> {
        output.write_string_vector(&self.children)
    }
}

impl JuteDeserialize for GetChildrenResponse {
    fn deserialize(input: &mut JuteInput<'_>) -> Result<Self> {
        Ok(Self {
            children: input.read_string_vector()?,
        })
    }
}
