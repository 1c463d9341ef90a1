//! Push error types.

use thiserror::Error;

/// Minimum length of an `apns-id` header value (a hyphenated UUID).
pub const MIN_APNS_ID_LEN: usize = 36;

/// Errors surfaced to callers of the push client.
///
/// Per-device delivery failures are never represented here; they are logged
/// and, when requested, reported through
/// [`DeliveryOutcome`](crate::outcome::DeliveryOutcome).
#[derive(Debug, Error)]
pub enum PushError {
    /// The `apns-id` header is too short to be a UUID.
    #[error("apns-id must be a valid uuid (got {len} characters, need at least 36)")]
    InvalidApnsId {
        /// Length of the rejected value in bytes.
        len: usize,
    },
    /// The `apns-expiration` header is empty.
    #[error("apns-expiration must be a valid time interval")]
    MissingExpiration,
    /// The payload could not be serialized.
    #[error("failed to encode notification payload: {reason}")]
    Encode {
        /// Error description.
        reason: String,
    },
    /// A certificate, key, or CA file could not be read.
    #[error("failed to read {what} at {path}: {reason}")]
    CredentialRead {
        /// Which credential ("certificate", "private key", "CA bundle").
        what: &'static str,
        /// File path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// The client certificate/key pair could not be parsed.
    #[error("invalid client identity: {reason}")]
    Identity {
        /// Error description.
        reason: String,
    },
    /// The custom trust root bundle could not be parsed.
    #[error("invalid trust root: {reason}")]
    TrustRoot {
        /// Error description.
        reason: String,
    },
    /// The HTTP/2 client could not be built.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Error description.
        reason: String,
    },
    /// The connection configuration is unusable.
    #[error("invalid push configuration: {0}")]
    Config(String),
}

/// Result type for push operations.
pub type Result<T> = std::result::Result<T, PushError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
