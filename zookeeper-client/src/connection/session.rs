//! Session engine: one live connection to a ZooKeeper ensemble member.
//!
//! A [`Session`] owns a TCP socket and multiplexes concurrent calls over
//! it. Every request carries a fresh xid; a reader task correlates each
//! reply to the waiter that sent the matching request, a writer task
//! serializes frames onto the socket, and a keepalive task pings the
//! server at half the negotiated session timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::codec::{Decoder, Encoder};

use zookeeper_core::protocol::codec::{encode_records, FrameCodec};
use zookeeper_core::protocol::constants::{
    OP_GET_CHILDREN, OP_GET_DATA, OP_PING, PING_XID, XID_MASK,
};
use zookeeper_core::protocol::records::{
    ConnectRequest, ConnectResponse, GetChildrenRequest, GetChildrenResponse, GetDataRequest,
    GetDataResponse, ReplyHeader, RequestHeader,
};
use zookeeper_core::{ErrorCode, JuteDeserialize, JuteInput, JuteSerialize, Result, ZkError};

/// Capacity of the outbound frame queue drained by the writer task.
///
/// Senders apply cooperative backpressure once the queue is full.
const WRITE_QUEUE_SIZE: usize = 10;

/// A reply handed to a waiter: the undecoded body bytes on success, or
/// the error attached by the reader.
type ReplyResult = Result<Bytes>;

/// Waiters for in-flight requests, keyed by xid.
///
/// Once `closed` flips, the map is empty and stays empty; registration is
/// refused under the same lock that the close path drains.
struct PendingRequests {
    waiters: HashMap<i32, oneshot::Sender<ReplyResult>>,
    closed: bool,
}

/// State shared between the session handle and its background tasks.
struct Shared {
    pending: Mutex<PendingRequests>,
    shutdown: watch::Sender<bool>,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, PendingRequests> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_alive(&self) -> bool {
        !self.pending().closed
    }

    /// One-shot transition to Closed: refuses new waiters, fails every
    /// in-flight waiter, and tells the background tasks to exit.
    fn close(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending();
            if pending.closed {
                return;
            }
            pending.closed = true;
            pending.waiters.drain().collect()
        };

        tracing::debug!(in_flight = drained.len(), "session closing");
        for (_, waiter) in drained {
            let _ = waiter.send(Err(ZkError::SessionClosed));
        }

        let _ = self.shutdown.send(true);
    }
}

/// A live session with one ZooKeeper ensemble member.
///
/// Obtained through [`Session::handshake`] on a freshly dialed stream.
/// All methods take `&self`; concurrent calls are multiplexed over the
/// single underlying socket and may complete in any order. Dropping the
/// session closes it.
pub struct Session {
    shared: Arc<Shared>,
    write_tx: mpsc::Sender<Bytes>,
    next_xid: AtomicI32,
    session_timeout: Duration,
    session_id: i64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("session_timeout", &self.session_timeout)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Session {
    /// Performs the protocol handshake on an established stream and, on
    /// success, starts the session's background tasks.
    ///
    /// The handshake sends an anonymous new-session `ConnectRequest`
    /// carrying `requested_timeout` and adopts the server's granted
    /// timeout when it is positive. Any handshake failure is fatal: the
    /// stream is dropped and no tasks are spawned.
    pub async fn handshake(mut stream: TcpStream, requested_timeout: Duration) -> Result<Self> {
        let request = ConnectRequest::new(requested_timeout.as_millis() as i32);
        let payload = encode_records(&[&request])?;

        let mut codec = FrameCodec::new();
        let mut frame_buf = BytesMut::new();
        codec.encode(payload, &mut frame_buf)?;
        stream
            .write_all(&frame_buf)
            .await
            .map_err(|e| ZkError::Connection(format!("could not write connect request: {}", e)))?;

        let mut read_buf = BytesMut::with_capacity(8192);
        let frame = read_frame(&mut stream, &mut codec, &mut read_buf)
            .await?
            .ok_or_else(|| {
                ZkError::Connection("connection closed during handshake".to_string())
            })?;

        let mut input = JuteInput::new(&frame);
        let response = ConnectResponse::deserialize(&mut input)?;

        let session_timeout = if response.time_out > 0 {
            Duration::from_millis(response.time_out as u64)
        } else {
            requested_timeout
        };

        tracing::debug!(
            session_id = response.session_id,
            timeout = ?session_timeout,
            "session established"
        );

        let (shutdown, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            pending: Mutex::new(PendingRequests {
                waiters: HashMap::new(),
                closed: false,
            }),
            shutdown,
        });

        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_SIZE);
        let ping = encode_records(&[&RequestHeader {
            xid: PING_XID,
            type_: OP_PING,
        }])?;

        let (read_half, write_half) = stream.into_split();
        spawn_reader(Arc::clone(&shared), read_half, read_buf);
        spawn_writer(Arc::clone(&shared), write_half, write_rx);
        spawn_keepalive(Arc::clone(&shared), write_tx.clone(), ping, session_timeout / 2);

        Ok(Self {
            shared,
            write_tx,
            next_xid: AtomicI32::new(0),
            session_timeout,
            session_id: response.session_id,
        })
    }

    /// Fetches the data of the node at `path`.
    pub async fn get_data(&self, path: &str) -> Result<Vec<u8>> {
        let request = GetDataRequest {
            path: path.to_string(),
            watch: false,
        };
        let response: GetDataResponse = self.rpc(OP_GET_DATA, &request).await?;
        Ok(response.data)
    }

    /// Lists the children of the node at `path`.
    pub async fn get_children(&self, path: &str) -> Result<Vec<String>> {
        let request = GetChildrenRequest {
            path: path.to_string(),
        };
        let response: GetChildrenResponse = self.rpc(OP_GET_CHILDREN, &request).await?;
        Ok(response.children)
    }

    /// Returns `true` if the session has not transitioned to Closed.
    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    /// Closes the session.
    ///
    /// Idempotent. Every in-flight call completes with
    /// [`ZkError::SessionClosed`] promptly, the background tasks stop, and
    /// the socket is shut down by the writer task on its way out. New
    /// calls fail immediately without touching the socket.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Returns the negotiated session timeout.
    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Returns the server-assigned session id.
    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    /// Issues one request and waits for its correlated reply.
    ///
    /// Completes when the reader matches the reply, the session closes, or
    /// the negotiated timeout elapses, whichever comes first. Every failure
    /// path removes the waiter so a late reply is discarded.
    async fn rpc<R: JuteDeserialize>(&self, opcode: i32, request: &dyn JuteSerialize) -> Result<R> {
        if !self.is_alive() {
            return Err(ZkError::SessionClosed);
        }

        let xid = self.next_xid();
        let header = RequestHeader { xid, type_: opcode };
        let payload = encode_records(&[&header, request])?;

        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.shared.pending();
            if pending.closed {
                return Err(ZkError::SessionClosed);
            }
            pending.waiters.insert(xid, reply_tx);
        }

        if self.write_tx.send(payload).await.is_err() {
            self.remove_waiter(xid);
            return Err(ZkError::SessionClosed);
        }

        let reply = tokio::select! {
            reply = reply_rx => reply.map_err(|_| ZkError::SessionClosed)?,
            _ = tokio::time::sleep(self.session_timeout) => {
                self.remove_waiter(xid);
                return Err(ZkError::Timeout { xid });
            }
        };
        let body = reply?;

        let mut input = JuteInput::new(&body);
        match R::deserialize(&mut input) {
            Ok(response) => Ok(response),
            Err(err) => {
                // a mid-frame decode failure means the stream lost sync
                tracing::error!(xid, error = %err, "could not decode reply body, closing session");
                self.shared.close();
                Err(err)
            }
        }
    }

    /// Returns the next request id, masked into the nonnegative 31-bit
    /// space so it can never collide with the reserved ping xid.
    fn next_xid(&self) -> i32 {
        self.next_xid
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
            & XID_MASK
    }

    fn remove_waiter(&self, xid: i32) {
        self.shared.pending().waiters.remove(&xid);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.close();
    }
}

/// Reads one frame payload, filling `buffer` from `stream` as needed.
///
/// Returns `Ok(None)` on clean EOF at a frame boundary; EOF mid-frame is
/// a connection error.
async fn read_frame<S>(
    stream: &mut S,
    codec: &mut FrameCodec,
    buffer: &mut BytesMut,
) -> Result<Option<BytesMut>>
where
    S: AsyncRead + Unpin,
{
    loop {
        if let Some(frame) = codec.decode(buffer)? {
            return Ok(Some(frame));
        }

        let bytes_read = stream.read_buf(buffer).await?;
        if bytes_read == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Err(ZkError::Connection(
                "connection closed mid-frame".to_string(),
            ));
        }
    }
}

/// Decodes one reply frame and completes the matching waiter.
///
/// Error replies carry no body; successful replies hand the undecoded
/// body bytes to the waiter, which deserializes into its typed response.
fn dispatch_reply(shared: &Shared, frame: &[u8]) -> Result<()> {
    let mut input = JuteInput::new(frame);
    let header = ReplyHeader::deserialize(&mut input)?;

    if header.xid == PING_XID {
        tracing::trace!("ping acknowledged");
        return Ok(());
    }

    let waiter = shared.pending().waiters.remove(&header.xid);
    let Some(waiter) = waiter else {
        tracing::warn!(xid = header.xid, err = header.err, "no matching request for reply");
        return Ok(());
    };

    let reply = if header.err != 0 {
        Err(ZkError::Server {
            code: ErrorCode::new(header.err),
        })
    } else {
        Ok(Bytes::copy_from_slice(&frame[input.position()..]))
    };

    let _ = waiter.send(reply);
    Ok(())
}

fn spawn_reader(shared: Arc<Shared>, mut read_half: OwnedReadHalf, mut buffer: BytesMut) {
    let mut shutdown_rx = shared.shutdown.subscribe();
    tokio::spawn(async move {
        let mut codec = FrameCodec::new();
        loop {
            let frame = tokio::select! {
                frame = read_frame(&mut read_half, &mut codec, &mut buffer) => frame,
                _ = shutdown_rx.changed() => break,
            };

            match frame {
                Ok(Some(frame)) if !frame.is_empty() => {
                    if let Err(err) = dispatch_reply(&shared, &frame) {
                        tracing::error!(error = %err, "could not decode reply header");
                        break;
                    }
                }
                Ok(Some(_)) => {
                    tracing::warn!("received empty frame");
                    break;
                }
                Ok(None) => {
                    tracing::debug!("server closed the connection");
                    break;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "could not read reply frame");
                    break;
                }
            }
        }
        shared.close();
    });
}

fn spawn_writer(shared: Arc<Shared>, mut write_half: OwnedWriteHalf, mut write_rx: mpsc::Receiver<Bytes>) {
    let mut shutdown_rx = shared.shutdown.subscribe();
    tokio::spawn(async move {
        let mut codec = FrameCodec::new();
        let mut frame = BytesMut::new();
        loop {
            let payload = tokio::select! {
                payload = write_rx.recv() => match payload {
                    Some(payload) => payload,
                    None => break,
                },
                _ = shutdown_rx.changed() => break,
            };

            frame.clear();
            if let Err(err) = codec.encode(payload, &mut frame) {
                tracing::error!(error = %err, "could not encode frame");
                break;
            }
            if let Err(err) = write_half.write_all(&frame).await {
                tracing::warn!(error = %err, "could not write frame");
                break;
            }
        }
        shared.close();
        let _ = write_half.shutdown().await;
    });
}

fn spawn_keepalive(
    shared: Arc<Shared>,
    write_tx: mpsc::Sender<Bytes>,
    ping: Bytes,
    period: Duration,
) {
    let mut shutdown_rx = shared.shutdown.subscribe();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately; the session was just opened
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if write_tx.send(ping.clone()).await.is_err() {
                        break;
                    }
                    tracing::trace!("ping enqueued");
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });
}
