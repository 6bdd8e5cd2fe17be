//! Connection handling: dialing, ensemble selection, and the session engine.

mod dialer;
pub(crate) mod ensemble;
mod session;

pub use dialer::{Dialer, TcpDialer};
pub use session::Session;

use std::time::Duration;

use zookeeper_core::Result;

/// Default requested session timeout for directly dialed sessions.
const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(2);
/// Default TCP connect timeout for directly dialed sessions.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Dials a single server and opens a session with default timeouts.
///
/// This is the non-retrying entry point: the caller owns the returned
/// [`Session`] and is expected to [`close`](Session::close) it. For
/// ensemble selection and retries, use [`ZkClient`](crate::ZkClient).
pub async fn dial(address: &str) -> Result<Session> {
    let stream = TcpDialer.dial(address, DEFAULT_CONNECT_TIMEOUT).await?;
    Session::handshake(stream, DEFAULT_SESSION_TIMEOUT).await
}
