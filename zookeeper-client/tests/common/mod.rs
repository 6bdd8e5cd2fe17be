//! Common test utilities: a mock ZooKeeper server over real local TCP.
//!
//! The mock answers the handshake, replies to pings, and lets each test
//! decide per request whether to answer normally, return a wire error
//! code, or stay silent. `get_data` replies echo the requested path as
//! the node data so correlation bugs show up as wrong payloads.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::{Decoder, Encoder};

use zookeeper_core::protocol::codec::{encode_records, FrameCodec};
use zookeeper_core::protocol::constants::{OP_GET_CHILDREN, OP_GET_DATA, PING_XID};
use zookeeper_core::protocol::records::{
    ConnectRequest, ConnectResponse, GetChildrenResponse, GetDataRequest, GetDataResponse,
    ReplyHeader, RequestHeader, Stat,
};
use zookeeper_core::{JuteDeserialize, JuteInput};

/// What the mock server should do with one request.
#[derive(Debug, Clone, Copy)]
pub enum MockReply {
    /// Answer with the default response for the opcode.
    Ok,
    /// Answer with the given error code and no body.
    Err(i32),
    /// Never answer.
    Silent,
}

/// Per-request decision: `(opcode, zero-based request index)` → reply.
pub type MockBehavior = Arc<dyn Fn(i32, usize) -> MockReply + Send + Sync>;

pub struct MockServer {
    address: SocketAddr,
    requests: Arc<AtomicUsize>,
    xids: Arc<Mutex<HashSet<i32>>>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    /// Starts a server that answers every request normally.
    pub async fn start() -> Self {
        Self::start_with(Arc::new(|_, _| MockReply::Ok)).await
    }

    /// Starts a server with the given per-request behavior.
    pub async fn start_with(behavior: MockBehavior) -> Self {
        Self::start_with_options(behavior, 0).await
    }

    /// Starts a server that drops the first `drop_first_connects` accepted
    /// connections before the handshake, then serves normally.
    pub async fn start_with_options(behavior: MockBehavior, drop_first_connects: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let xids = Arc::new(Mutex::new(HashSet::new()));

        let accept_task = tokio::spawn({
            let requests = Arc::clone(&requests);
            let xids = Arc::clone(&xids);
            async move {
                let mut accepted = 0usize;
                loop {
                    let Ok((socket, _)) = listener.accept().await else {
                        break;
                    };
                    accepted += 1;
                    if accepted <= drop_first_connects {
                        drop(socket);
                        continue;
                    }
                    tokio::spawn(handle_connection(
                        socket,
                        Arc::clone(&behavior),
                        Arc::clone(&requests),
                        Arc::clone(&xids),
                    ));
                }
            }
        });

        Self {
            address,
            requests,
            xids,
            accept_task,
        }
    }

    /// Returns the `host:port` endpoint the server listens on.
    pub fn endpoint(&self) -> String {
        self.address.to_string()
    }

    /// Returns the number of non-ping requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Returns the distinct xids observed on the wire.
    pub fn seen_xids(&self) -> Vec<i32> {
        self.xids.lock().unwrap().iter().copied().collect()
    }

    /// Stops accepting connections and releases the port.
    pub fn shutdown(&self) {
        self.accept_task.abort();
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_connection(
    mut socket: TcpStream,
    behavior: MockBehavior,
    requests: Arc<AtomicUsize>,
    xids: Arc<Mutex<HashSet<i32>>>,
) {
    let mut codec = FrameCodec::new();
    let mut buffer = BytesMut::new();

    let Some(frame) = read_one_frame(&mut socket, &mut codec, &mut buffer).await else {
        return;
    };
    let Ok(connect) = ConnectRequest::from_bytes(&frame) else {
        return;
    };

    let response = ConnectResponse {
        protocol_version: 0,
        time_out: connect.time_out,
        session_id: 0x1000,
        passwd: vec![0; 16],
    };
    let payload = encode_records(&[&response]).unwrap();
    if write_one_frame(&mut socket, &mut codec, payload).await.is_err() {
        return;
    }

    loop {
        let Some(frame) = read_one_frame(&mut socket, &mut codec, &mut buffer).await else {
            return;
        };
        let mut input = JuteInput::new(&frame);
        let Ok(header) = RequestHeader::deserialize(&mut input) else {
            return;
        };

        if header.xid == PING_XID {
            let reply = ReplyHeader {
                xid: PING_XID,
                zxid: 0,
                err: 0,
            };
            let payload = encode_records(&[&reply]).unwrap();
            if write_one_frame(&mut socket, &mut codec, payload).await.is_err() {
                return;
            }
            continue;
        }

        let index = requests.fetch_add(1, Ordering::SeqCst);
        xids.lock().unwrap().insert(header.xid);

        let payload = match behavior(header.type_, index) {
            MockReply::Silent => continue,
            MockReply::Err(code) => {
                let reply = ReplyHeader {
                    xid: header.xid,
                    zxid: 1,
                    err: code,
                };
                encode_records(&[&reply]).unwrap()
            }
            MockReply::Ok => {
                let reply = ReplyHeader {
                    xid: header.xid,
                    zxid: 1,
                    err: 0,
                };
                match header.type_ {
                    OP_GET_DATA => {
                        let request = GetDataRequest::deserialize(&mut input)
                            .expect("malformed get_data request");
                        let body = GetDataResponse {
                            data: request.path.into_bytes(),
                            stat: Stat::default(),
                        };
                        encode_records(&[&reply, &body]).unwrap()
                    }
                    OP_GET_CHILDREN => {
                        let body = GetChildrenResponse {
                            children: vec!["test".to_string()],
                        };
                        encode_records(&[&reply, &body]).unwrap()
                    }
                    other => {
                        eprintln!("mock server: unsupported opcode {}", other);
                        let reply = ReplyHeader {
                            xid: header.xid,
                            zxid: 1,
                            err: -6,
                        };
                        encode_records(&[&reply]).unwrap()
                    }
                }
            }
        };

        if write_one_frame(&mut socket, &mut codec, payload).await.is_err() {
            return;
        }
    }
}

async fn read_one_frame(
    socket: &mut TcpStream,
    codec: &mut FrameCodec,
    buffer: &mut BytesMut,
) -> Option<BytesMut> {
    loop {
        match codec.decode(buffer) {
            Ok(Some(frame)) => return Some(frame),
            Ok(None) => {}
            Err(_) => return None,
        }
        match socket.read_buf(buffer).await {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

async fn write_one_frame(
    socket: &mut TcpStream,
    codec: &mut FrameCodec,
    payload: Bytes,
) -> std::io::Result<()> {
    let mut frame = BytesMut::new();
    codec.encode(payload, &mut frame).unwrap();
    socket.write_all(&frame).await
}
