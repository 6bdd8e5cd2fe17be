//! Protocol constants for the ZooKeeper wire protocol.

/// Size of the frame length field in bytes.
pub const SIZE_OF_FRAME_LENGTH_FIELD: usize = 4;

/// Protocol version sent in the connect handshake.
pub const PROTOCOL_VERSION: i32 = 0;

/// Size of the session password carried in the connect handshake.
pub const PASSWORD_SIZE: usize = 16;

/// Mask keeping xids in the nonnegative 31-bit space.
///
/// Masking on increment means the counter can never turn negative and can
/// never collide with the reserved ping xid.
pub const XID_MASK: i32 = 0x7FFF_FFFF;

/// Reserved xid used in ping/keepalive packet headers.
pub const PING_XID: i32 = -2;

// Request type codes, as defined by ZooKeeper's OpCode table.

/// Fetch the data of a node.
pub const OP_GET_DATA: i32 = 4;

/// List the children of a node.
pub const OP_GET_CHILDREN: i32 = 8;

/// Session keepalive.
pub const OP_PING: i32 = 11;
