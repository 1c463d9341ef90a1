//! Per-device delivery outcomes.

use serde::Serialize;

/// What happened to the request for a single device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeliveryStatus {
    /// The server answered. The status code is not interpreted.
    Responded {
        /// HTTP status code.
        status: u16,
    },
    /// No response arrived (connection, TLS, or protocol failure).
    TransportFailed {
        /// Error description.
        error: String,
    },
    /// The request deadline elapsed.
    TimedOut,
    /// The dispatch was cancelled before this request completed.
    Cancelled,
}

/// Outcome of one per-device request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    /// The device token targeted.
    pub device_token: String,
    /// How the request ended.
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    /// Whether the server answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self.status, DeliveryStatus::Responded { status } if (200..300).contains(&status))
    }
}
