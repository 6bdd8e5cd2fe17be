//! Async Rust client for [Apache ZooKeeper](https://zookeeper.apache.org/).
//!
//! This crate speaks the ZooKeeper wire protocol (protocol version 0,
//! Jute-encoded) to an ensemble over a persistent session. It is built on
//! [Tokio](https://tokio.rs/) and exposes the two read operations as
//! `async fn`s: fetch the data of a node and list the children of a node.
//!
//! Underneath, a session engine owns one TCP connection to an ensemble
//! member and multiplexes concurrent calls over it: every request carries
//! a monotonically increasing xid, a reader task routes each reply to the
//! waiter that sent the matching request, and a keepalive task pings the
//! server at half the negotiated session timeout. Around the engine sits
//! [`ZkClient`], a thin facade that shuffles the ensemble, caches one live
//! session, and retries transient failures up to a configured bound.
//! Server-side errors (such as "node does not exist") are never retried.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use zookeeper_client::{ClientConfig, ZkClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .ensemble("127.0.0.1:2181")
//!         .max_retries(3)
//!         .build()?;
//!     let client = ZkClient::new(config);
//!
//!     let cancel = CancellationToken::new();
//!     let data = client.get_data(&cancel, "/").await?;
//!     let children = client.get_children(&cancel, "/").await?;
//!     println!("{} bytes, children: {:?}", data.len(), children);
//!     Ok(())
//! }
//! ```
//!
//! For direct, non-retrying use, [`dial`] opens a single [`Session`]:
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = zookeeper_client::dial("127.0.0.1:2181").await?;
//! let children = session.get_children("/").await?;
//! session.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
pub mod config;
pub mod connection;

pub use client::ZkClient;
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use connection::{dial, Dialer, Session, TcpDialer};

pub use zookeeper_core::{ErrorCode, Result, ZkError};
