//! # pushcast-core
//!
//! Broadcast one Apple Push Notification to many devices over a shared,
//! mutually-authenticated HTTP/2 connection.
//!
//! - [`notification`]: payload and header model
//! - [`payload`]: `{"aps": {...}}` encoding
//! - [`config`]: environment hosts and connection settings
//! - [`connection`]: [`PushServer`], the reusable TLS client
//! - [`dispatch`]: concurrent fan-out with join-before-return
//! - [`outcome`]: optional per-device results
//! - [`logging`]: subscriber setup

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod errors;
pub mod logging;
pub mod notification;
pub mod outcome;
pub mod payload;

pub use config::{ConnectionConfig, Environment, load_config_from_path};
pub use connection::{PushServer, TlsMaterial};
pub use dispatch::send_push;
pub use errors::{PushError, Result};
pub use notification::{Headers, Notification, Payload};
pub use outcome::{DeliveryOutcome, DeliveryStatus};
pub use tokio_util::sync::CancellationToken;
