//! Error types for ZooKeeper operations.

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// An error code returned by a ZooKeeper server in a `ReplyHeader`.
///
/// The numeric value is preserved verbatim so that codes outside the
/// well-known table still round-trip to the caller. Well-known codes map
/// to the standard ZooKeeper error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    /// System error.
    pub const SYSTEM_ERROR: Self = Self(-1);
    /// Runtime inconsistency found.
    pub const RUNTIME_INCONSISTENCY: Self = Self(-2);
    /// Data inconsistency found.
    pub const DATA_INCONSISTENCY: Self = Self(-3);
    /// Connection to the server has been lost.
    pub const CONNECTION_LOSS: Self = Self(-4);
    /// Error while marshalling or unmarshalling data.
    pub const MARSHALLING_ERROR: Self = Self(-5);
    /// Operation is unimplemented.
    pub const UNIMPLEMENTED: Self = Self(-6);
    /// Operation timeout.
    pub const OPERATION_TIMEOUT: Self = Self(-7);
    /// Invalid arguments.
    pub const BAD_ARGUMENTS: Self = Self(-8);
    /// Invalid handle state.
    pub const INVALID_STATE: Self = Self(-9);
    /// No quorum of the new config is connected.
    pub const NEW_CONFIG_NO_QUORUM: Self = Self(-13);
    /// Another reconfiguration is currently in progress.
    pub const RECONFIG_IN_PROGRESS: Self = Self(-14);
    /// SSL connection error.
    pub const SSL_ERROR: Self = Self(-15);
    /// Generic API error.
    pub const API_ERROR: Self = Self(-100);
    /// Node does not exist.
    pub const NO_NODE: Self = Self(-101);
    /// Not authenticated.
    pub const NO_AUTH: Self = Self(-102);
    /// Version conflict.
    pub const BAD_VERSION: Self = Self(-103);
    /// Ephemeral nodes may not have children.
    pub const NO_CHILDREN_FOR_EPHEMERALS: Self = Self(-108);
    /// Node already exists.
    pub const NODE_EXISTS: Self = Self(-110);
    /// Node has children.
    pub const NOT_EMPTY: Self = Self(-111);
    /// Session has been expired by the server.
    pub const SESSION_EXPIRED: Self = Self(-112);
    /// Invalid callback specified.
    pub const INVALID_CALLBACK: Self = Self(-113);
    /// Invalid ACL specified.
    pub const INVALID_ACL: Self = Self(-114);
    /// Client authentication failed.
    pub const AUTH_FAILED: Self = Self(-115);
    /// ZooKeeper is closing.
    pub const CLOSING: Self = Self(-116);
    /// No server responses to process.
    pub const NOTHING: Self = Self(-117);
    /// Session moved to another server, so the operation is ignored.
    pub const SESSION_MOVED: Self = Self(-118);
    /// State-changing request passed to a read-only server.
    pub const NOT_READ_ONLY: Self = Self(-119);
    /// Attempt to create an ephemeral node on a local session.
    pub const EPHEMERAL_ON_LOCAL_SESSION: Self = Self(-120);
    /// The watcher could not be found.
    pub const NO_WATCHER: Self = Self(-121);
    /// Reconfiguration operation attempted while it is disabled.
    pub const RECONFIG_DISABLED: Self = Self(-123);
    /// Server requires a configured authentication scheme.
    pub const AUTH_SCHEME_REQUIRED: Self = Self(-124);
    /// Operation was throttled and not executed at all.
    pub const THROTTLED: Self = Self(-127);

    /// Creates an `ErrorCode` from its wire protocol value.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the numeric wire protocol value.
    pub fn value(self) -> i32 {
        self.0
    }

    /// Returns the standard ZooKeeper error string, if the code is known.
    pub fn message(self) -> Option<&'static str> {
        match self.0 {
            -1 => Some("system error"),
            -2 => Some("runtime inconsistency found"),
            -3 => Some("data inconsistency found"),
            -4 => Some("connection to the server has been lost"),
            -5 => Some("error while marshalling or unmarshalling data"),
            -6 => Some("operation is unimplemented"),
            -7 => Some("operation timeout"),
            -8 => Some("invalid arguments"),
            -9 => Some("invalid zhandle state"),
            -13 => Some("no quorum of new config is connected"),
            -14 => Some("reconfiguration requested while another is currently in progress"),
            -15 => Some("SSL connection error"),
            -100 => Some("api error"),
            -101 => Some("node does not exist"),
            -102 => Some("not authenticated"),
            -103 => Some("version conflict"),
            -108 => Some("ephemeral nodes may not have children"),
            -110 => Some("node already exists"),
            -111 => Some("node has children"),
            -112 => Some("session has been expired by the server"),
            -113 => Some("invalid callback specified"),
            -114 => Some("invalid ACL specified"),
            -115 => Some("client authentication failed"),
            -116 => Some("zookeeper is closing"),
            -117 => Some("no server responses to process"),
            -118 => Some("session moved to another server, so operation is ignored"),
            -119 => Some("state-changing request is passed to read-only server"),
            -120 => Some("attempt to create ephemeral node on a local session"),
            -121 => Some("the watcher couldn't be found"),
            -123 => Some("attempts to perform a reconfiguration operation when it is disabled"),
            -124 => Some("server requires configured authentication scheme"),
            -127 => Some("operation was throttled and not executed at all"),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}", message),
            None => write!(f, "unknown error code: {}", self.0),
        }
    }
}

/// The main error type for ZooKeeper operations.
///
/// This enum covers both client-side failures (dial errors, broken
/// streams, timeouts) and server-side errors returned in a `ReplyHeader`.
#[derive(Debug, Error, Clone)]
pub enum ZkError {
    /// A server-side error returned in a `ReplyHeader`.
    ///
    /// Server errors are deterministic with respect to the request and are
    /// never retried.
    #[error("server returned error: {code}")]
    Server {
        /// The error code from the reply header.
        code: ErrorCode,
    },

    /// Connection-related errors (dial failures, broken pipes, unexpected
    /// EOF, short reads).
    #[error("connection error: {0}")]
    Connection(String),

    /// Record encoding/decoding errors.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The session transitioned to Closed, locally or because the server
    /// went away.
    #[error("session closed")]
    SessionClosed,

    /// The per-call deadline elapsed before a reply arrived.
    #[error("timed out waiting on response for xid {xid}")]
    Timeout {
        /// The request id whose reply never arrived.
        xid: i32,
    },

    /// The retryable client gave up after exhausting its attempts.
    #[error("connection failed after {attempts} retries: {source}")]
    MaxRetries {
        /// The configured retry bound (additional attempts after the first).
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<ZkError>,
    },

    /// The caller's cancellation token fired before the attempt started.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O errors from the standard library (wrapped in `Arc` for `Clone`).
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for ZkError {
    fn from(err: io::Error) -> Self {
        ZkError::Io(Arc::new(err))
    }
}

impl ZkError {
    /// Returns `true` if this error is retryable.
    ///
    /// Retryable errors are transient failures where repeating the
    /// operation against a (possibly different) ensemble member may
    /// succeed. Server errors are deterministic rejections and are not
    /// retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server { .. } => false,
            Self::Connection(_) => true,
            Self::Serialization(_) => true,
            Self::SessionClosed => true,
            Self::Timeout { .. } => true,
            Self::Io(_) => true,
            Self::MaxRetries { .. } => false,
            Self::Cancelled => false,
        }
    }

    /// Returns the server error code if this is a server error.
    pub fn server_error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server { code } => Some(*code),
            _ => None,
        }
    }
}

/// A specialized `Result` type for ZooKeeper operations.
pub type Result<T> = std::result::Result<T, ZkError>;
