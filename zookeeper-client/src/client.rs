//! Retryable client facade over the session engine.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use zookeeper_core::{Result, ZkError};

use crate::config::ClientConfig;
use crate::connection::{ensemble, Dialer, Session, TcpDialer};

/// A ZooKeeper client that retries transient failures.
///
/// The client lazily opens a session against a shuffled ensemble member
/// and caches it across calls; once the session reports not-alive it is
/// replaced, never reused. Server-side errors are returned to the caller
/// on the first attempt; only transport-class failures consume retries.
///
/// # Example
///
/// ```rust,no_run
/// use tokio_util::sync::CancellationToken;
/// use zookeeper_client::{ClientConfig, ZkClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::builder()
///         .ensemble("zk1:2181,zk2:2181,zk3:2181")
///         .max_retries(5)
///         .build()?;
///     let client = ZkClient::new(config);
///
///     let cancel = CancellationToken::new();
///     let children = client.get_children(&cancel, "/").await?;
///     println!("{:?}", children);
///     Ok(())
/// }
/// ```
pub struct ZkClient {
    config: ClientConfig,
    dialer: Arc<dyn Dialer>,
    session: Mutex<Option<Arc<Session>>>,
}

impl std::fmt::Debug for ZkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkClient")
            .field("ensemble", &self.config.ensemble())
            .field("max_retries", &self.config.max_retries())
            .finish()
    }
}

impl ZkClient {
    /// Creates a client with the default TCP dialer.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_dialer(config, TcpDialer)
    }

    /// Creates a client with a custom dialer.
    pub fn with_dialer(config: ClientConfig, dialer: impl Dialer + 'static) -> Self {
        Self {
            config,
            dialer: Arc::new(dialer),
            session: Mutex::new(None),
        }
    }

    /// Fetches the data of the node at `path`, retrying transient failures.
    pub async fn get_data(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<u8>> {
        self.do_retry(cancel, |session| async move { session.get_data(path).await })
            .await
    }

    /// Lists the children of the node at `path`, retrying transient failures.
    pub async fn get_children(&self, cancel: &CancellationToken, path: &str) -> Result<Vec<String>> {
        self.do_retry(cancel, |session| async move {
            session.get_children(path).await
        })
        .await
    }

    /// Closes the cached session, cancelling any calls currently in flight.
    ///
    /// The next call re-establishes a session against the ensemble.
    pub async fn reset(&self) {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.take() {
            session.close();
        }
    }

    /// Runs `call` with a live session, retrying up to the configured bound.
    ///
    /// `max_retries` counts additional attempts after the first. A
    /// cancelled token never consumes an attempt, and a server-side error
    /// is returned without retrying: it is deterministic with respect to
    /// the request, so repeating it would only waste attempts.
    async fn do_retry<T, F, Fut>(&self, cancel: &CancellationToken, mut call: F) -> Result<T>
    where
        F: FnMut(Arc<Session>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;
        for attempt in 0..=self.config.max_retries() {
            if cancel.is_cancelled() {
                return Err(ZkError::Cancelled);
            }

            let session = match self.ensure_session().await {
                Ok(session) => session,
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "could not obtain a session");
                    last_error = Some(err);
                    continue;
                }
            };

            match call(Arc::clone(&session)).await {
                Ok(value) => return Ok(value),
                Err(err @ ZkError::Server { .. }) => {
                    tracing::debug!(error = %err, "server rejected the request");
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "attempt failed, dropping session");
                    self.invalidate_session(&session).await;
                    last_error = Some(err);
                }
            }
        }

        // the loop body runs at least once, so an error was recorded
        let source = last_error.unwrap_or(ZkError::SessionClosed);
        Err(ZkError::MaxRetries {
            attempts: self.config.max_retries(),
            source: Box::new(source),
        })
    }

    /// Returns the cached session, opening a new one if there is none or
    /// the cached one has died.
    async fn ensure_session(&self) -> Result<Arc<Session>> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            if session.is_alive() {
                return Ok(Arc::clone(session));
            }
        }

        let session = Arc::new(self.connect().await?);
        *cached = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Tries every ensemble member in a freshly shuffled order; the first
    /// endpoint that completes the handshake wins.
    async fn connect(&self) -> Result<Session> {
        let endpoints = ensemble::shuffled(self.config.ensemble());
        let mut last_error = None;

        for address in &endpoints {
            match self.try_connect(address).await {
                Ok(session) => {
                    tracing::debug!(address = %address, session_id = session.session_id(), "connected to ensemble member");
                    return Ok(session);
                }
                Err(err) => {
                    tracing::warn!(address = %address, error = %err, "could not connect to ensemble member");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ZkError::Connection("ensemble contains no endpoints".to_string())))
    }

    async fn try_connect(&self, address: &str) -> Result<Session> {
        let stream = self
            .dialer
            .dial(address, self.config.connect_timeout())
            .await?;
        Session::handshake(stream, self.config.session_timeout()).await
    }

    /// Drops the cached session if it is still the one that just failed.
    async fn invalidate_session(&self, failed: &Arc<Session>) {
        let mut cached = self.session.lock().await;
        if let Some(current) = cached.as_ref() {
            if Arc::ptr_eq(current, failed) {
                current.close();
                *cached = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpStream;

    struct CountingDialer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Dialer for CountingDialer {
        async fn dial(&self, _address: &str, _connect_timeout: Duration) -> Result<TcpStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ZkError::Connection("dial refused".to_string()))
        }
    }

    fn client_with_counting_dialer(max_retries: u32) -> (ZkClient, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ClientConfig::builder()
            .ensemble("127.0.0.1:2181")
            .max_retries(max_retries)
            .build()
            .unwrap();
        let client = ZkClient::with_dialer(
            config,
            CountingDialer {
                calls: Arc::clone(&calls),
            },
        );
        (client, calls)
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_all_attempts() {
        let (client, calls) = client_with_counting_dialer(5);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.get_data(&cancel, "/").await;
        assert!(matches!(result, Err(ZkError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let (client, calls) = client_with_counting_dialer(2);

        let cancel = CancellationToken::new();
        let result = client.get_children(&cancel, "/").await;

        match result {
            Err(ZkError::MaxRetries { attempts, source }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*source, ZkError::Connection(_)));
            }
            other => panic!("expected MaxRetries, got {:?}", other),
        }
        // one dial per attempt: the first plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_one_attempt() {
        let (client, calls) = client_with_counting_dialer(0);

        let cancel = CancellationToken::new();
        let result = client.get_data(&cancel, "/").await;

        assert!(matches!(result, Err(ZkError::MaxRetries { attempts: 0, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_without_session_is_a_no_op() {
        let (client, _calls) = client_with_counting_dialer(0);
        client.reset().await;
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ZkClient>();
    }
}
