//! Concurrent fan-out of one notification to many device tokens.
//!
//! Headers are validated and the payload is encoded once, before any
//! request is issued. Each token then gets its own `POST /3/device/{token}`
//! over the shared client, and the call returns only after every request
//! has finished. Per-token failures are logged and never abort the others.

use bytes::Bytes;
use futures::StreamExt;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::PushServer;
use crate::errors::Result;
use crate::notification::{Headers, Notification};
use crate::outcome::{DeliveryOutcome, DeliveryStatus};
use crate::payload;

/// Header carrying the delivery identifier.
pub const APNS_ID_HEADER: &str = "apns-id";
/// Header carrying the expiration.
pub const APNS_EXPIRATION_HEADER: &str = "apns-expiration";

/// Broadcast `notification` to every token over `server`.
///
/// Only header validation and payload encoding errors are returned; see
/// [`PushServer::send`].
pub async fn send_push(
    notification: &Notification,
    server: &PushServer,
    device_tokens: &[String],
) -> Result<()> {
    server.send(notification, device_tokens).await
}

impl PushServer {
    /// Send a notification to every device token and wait for all of them.
    ///
    /// Fire-and-forget: once validation passes, individual delivery failures
    /// are logged and swallowed. Use [`send_with_outcomes`](Self::send_with_outcomes)
    /// to observe them.
    pub async fn send(&self, notification: &Notification, device_tokens: &[String]) -> Result<()> {
        let never = CancellationToken::new();
        let _ = self
            .send_with_outcomes(notification, device_tokens, &never)
            .await?;
        Ok(())
    }

    /// Send a notification to every device token and report each outcome.
    ///
    /// Outcomes are returned in the order of `device_tokens`. Cancelling
    /// `cancel` drops requests still in flight and marks them
    /// [`DeliveryStatus::Cancelled`].
    pub async fn send_with_outcomes(
        &self,
        notification: &Notification,
        device_tokens: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<DeliveryOutcome>> {
        notification.headers.validate()?;
        let body = payload::encode(&notification.payload)?;

        info!(
            apns_id = %notification.headers.apns_id,
            devices = device_tokens.len(),
            payload_bytes = body.len(),
            max_in_flight = ?self.max_in_flight(),
            "dispatching push"
        );

        let deliveries = device_tokens
            .iter()
            .map(|token| self.deliver(token, &notification.headers, body.clone(), cancel));

        let outcomes = match self.max_in_flight() {
            Some(limit) if limit < device_tokens.len() => {
                let mut indexed: Vec<(usize, DeliveryOutcome)> =
                    futures::stream::iter(deliveries.enumerate().map(|(i, d)| async move {
                        (i, d.await)
                    }))
                    .buffer_unordered(limit)
                    .collect()
                    .await;
                indexed.sort_unstable_by_key(|(i, _)| *i);
                indexed.into_iter().map(|(_, outcome)| outcome).collect()
            }
            _ => join_all(deliveries).await,
        };

        let delivered = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            apns_id = %notification.headers.apns_id,
            devices = outcomes.len(),
            delivered,
            "push dispatch complete"
        );

        Ok(outcomes)
    }

    async fn deliver(
        &self,
        device_token: &str,
        headers: &Headers,
        body: Bytes,
        cancel: &CancellationToken,
    ) -> DeliveryOutcome {
        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(token_prefix = token_prefix(device_token), "push cancelled");
                DeliveryStatus::Cancelled
            }
            status = self.post(device_token, headers, body) => status,
        };

        DeliveryOutcome {
            device_token: device_token.to_string(),
            status,
        }
    }

    async fn post(&self, device_token: &str, headers: &Headers, body: Bytes) -> DeliveryStatus {
        let url = self.device_url(device_token);
        let prefix = token_prefix(device_token);

        let result = self
            .client()
            .post(&url)
            .header(APNS_ID_HEADER, &headers.apns_id)
            .header(APNS_EXPIRATION_HEADER, &headers.apns_expiration)
            .body(body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                warn!(
                    error = %e,
                    token_prefix = prefix,
                    "push request not sent: invalid apns-id or apns-expiration header value"
                );
                return DeliveryStatus::TransportFailed {
                    error: format!("invalid request headers: {e}"),
                };
            }
            Err(e) if e.is_timeout() => {
                warn!(token_prefix = prefix, url = %url, "push request timed out");
                return DeliveryStatus::TimedOut;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    token_prefix = prefix,
                    url = %url,
                    "push request failed (no response)"
                );
                return DeliveryStatus::TransportFailed {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status();
        let http_version = format!("{:?}", response.version());

        // Read the body to the end so the stream is released on the shared connection.
        match response.bytes().await {
            Ok(drained) => debug!(token_prefix = prefix, bytes = drained.len(), "response drained"),
            Err(e) => warn!(error = %e, token_prefix = prefix, "failed to drain response body"),
        }

        if status.is_success() {
            info!(
                status = status.as_u16(),
                http_version = %http_version,
                token_prefix = prefix,
                "push delivered"
            );
        } else {
            warn!(
                status = status.as_u16(),
                http_version = %http_version,
                token_prefix = prefix,
                "push rejected"
            );
        }

        DeliveryStatus::Responded {
            status: status.as_u16(),
        }
    }
}

/// First 8 characters of a token, for logs.
fn token_prefix(device_token: &str) -> &str {
    match device_token.char_indices().nth(8) {
        Some((idx, _)) => &device_token[..idx],
        None => device_token,
    }
}
