//! Dialer abstraction for opening TCP streams to ensemble members.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use zookeeper_core::{Result, ZkError};

/// Capability to open a byte stream to a `host:port` address.
///
/// The default implementation is [`TcpDialer`]; tests substitute dialers
/// that fail or record their calls.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Opens a TCP stream to the given address within the given timeout.
    async fn dial(&self, address: &str, connect_timeout: Duration) -> Result<TcpStream>;
}

/// The default [`Dialer`] backed by `tokio::net::TcpStream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, address: &str, connect_timeout: Duration) -> Result<TcpStream> {
        let stream = timeout(connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                ZkError::Connection(format!(
                    "connection to {} timed out after {:?}",
                    address, connect_timeout
                ))
            })?
            .map_err(|e| ZkError::Connection(format!("failed to connect to {}: {}", address, e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| ZkError::Connection(format!("failed to set TCP_NODELAY: {}", e)))?;

        tracing::debug!(address = %address, "established connection");
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let stream = TcpDialer
            .dial(&address, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap().to_string(), address);
    }

    #[tokio::test]
    async fn test_dial_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = TcpDialer.dial(&address, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ZkError::Connection(_))));
    }

    #[tokio::test]
    async fn test_dial_timeout() {
        // RFC 5737 TEST-NET address, guaranteed unroutable
        let result = TcpDialer
            .dial("192.0.2.1:2181", Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(ZkError::Connection(_))));
    }

    #[test]
    fn test_dialer_is_object_safe() {
        fn assert_dialer(_: &dyn Dialer) {}
        assert_dialer(&TcpDialer);
    }
}
