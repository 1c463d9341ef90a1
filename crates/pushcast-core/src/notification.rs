//! Notification model: payload content plus delivery headers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{MIN_APNS_ID_LEN, PushError, Result};

/// Sound name that plays the system default alert sound.
pub const DEFAULT_SOUND: &str = "default";

/// User-visible content of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Alert text. Becomes the alert `body` when a title is present.
    pub alert: String,
    /// Alert title. Empty is treated the same as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Badge count. Always sent, even when zero.
    #[serde(default)]
    pub badge: u32,
    /// Sound name. Always sent, even when empty.
    #[serde(default = "default_sound")]
    pub sound: String,
    /// Wake the app for a background update.
    #[serde(default, rename = "content-available")]
    pub content_available: bool,
}

fn default_sound() -> String {
    DEFAULT_SOUND.to_string()
}

impl Payload {
    /// Payload with the given alert text, badge 0 and the default sound.
    pub fn new(alert: impl Into<String>) -> Self {
        Self {
            alert: alert.into(),
            title: None,
            badge: 0,
            sound: default_sound(),
            content_available: false,
        }
    }

    /// Set the alert title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the badge count.
    #[must_use]
    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = badge;
        self
    }

    /// Set the sound name.
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    /// Set the content-available flag.
    #[must_use]
    pub fn with_content_available(mut self, content_available: bool) -> Self {
        self.content_available = content_available;
        self
    }

    /// The title, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// Per-notification request headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    /// Delivery identifier sent as `apns-id`.
    #[serde(rename = "apns-id")]
    pub apns_id: String,
    /// Expiration sent as `apns-expiration`.
    #[serde(rename = "apns-expiration")]
    pub apns_expiration: String,
}

impl Headers {
    /// Headers with an explicit identifier and expiration.
    pub fn new(apns_id: impl Into<String>, apns_expiration: impl Into<String>) -> Self {
        Self {
            apns_id: apns_id.into(),
            apns_expiration: apns_expiration.into(),
        }
    }

    /// Headers with a freshly generated UUID v7 identifier.
    pub fn generate(apns_expiration: impl Into<String>) -> Self {
        Self::new(Uuid::now_v7().to_string(), apns_expiration)
    }

    /// Check the header preconditions that gate any network activity.
    ///
    /// The identifier check is a length check only: any string of at least
    /// 36 bytes passes, and an unhyphenated 32-character UUID fails.
    pub fn validate(&self) -> Result<()> {
        if self.apns_id.len() < MIN_APNS_ID_LEN {
            return Err(PushError::InvalidApnsId {
                len: self.apns_id.len(),
            });
        }
        if self.apns_expiration.is_empty() {
            return Err(PushError::MissingExpiration);
        }
        Ok(())
    }
}

/// A notification to broadcast to one or more devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Content encoded into the request body.
    pub payload: Payload,
    /// Values sent as request headers.
    pub headers: Headers,
}

impl Notification {
    /// Pair a payload with its headers.
    pub fn new(payload: Payload, headers: Headers) -> Self {
        Self { payload, headers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    const VALID_ID: &str = "0192b7a4-6c1e-7f3a-9d2b-4e5f6a7b8c9d";

    #[test]
    fn payload_new_uses_default_sound() {
        let payload = Payload::new("hi");
        assert_eq!(payload.sound, "default");
        assert_eq!(payload.badge, 0);
        assert!(payload.title.is_none());
        assert!(!payload.content_available);
    }

    #[test]
    fn empty_title_is_absent() {
        assert_eq!(Payload::new("a").with_title("").title(), None);
        assert_eq!(Payload::new("a").with_title("T").title(), Some("T"));
    }

    #[test]
    fn validate_accepts_hyphenated_uuid() {
        assert!(Headers::new(VALID_ID, "0").validate().is_ok());
    }

    #[test]
    fn validate_accepts_generated_id() {
        assert!(Headers::generate("0").validate().is_ok());
    }

    #[test]
    fn validate_accepts_any_long_enough_string() {
        let id = "x".repeat(36);
        assert!(Headers::new(id, "1700000000").validate().is_ok());
    }

    #[test]
    fn validate_rejects_unhyphenated_uuid() {
        let simple = Uuid::now_v7().simple().to_string();
        assert_matches!(
            Headers::new(simple, "0").validate(),
            Err(PushError::InvalidApnsId { len: 32 })
        );
    }

    #[test]
    fn validate_rejects_empty_expiration() {
        assert_matches!(
            Headers::new(VALID_ID, "").validate(),
            Err(PushError::MissingExpiration)
        );
    }

    #[test]
    fn id_is_checked_before_expiration() {
        assert_matches!(
            Headers::new("short", "").validate(),
            Err(PushError::InvalidApnsId { len: 5 })
        );
    }

    #[test]
    fn notification_deserializes_wire_names() {
        let json = r#"{
            "payload": {"alert": "Simple message", "title": "T", "content-available": true},
            "headers": {"apns-id": "0192b7a4-6c1e-7f3a-9d2b-4e5f6a7b8c9d", "apns-expiration": "0"}
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.payload.alert, "Simple message");
        assert_eq!(n.payload.sound, "default");
        assert!(n.payload.content_available);
        assert_eq!(n.headers.apns_id, VALID_ID);
        assert_eq!(n.headers.apns_expiration, "0");
    }

    proptest! {
        #[test]
        fn short_ids_always_rejected(id in "[a-f0-9-]{0,35}") {
            let result = Headers::new(id, "0").validate();
            let rejected = matches!(result, Err(PushError::InvalidApnsId { .. }));
            prop_assert!(rejected);
        }
    }
}
