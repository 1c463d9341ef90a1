//! APNs JSON payload encoding.
//!
//! Produces `{"aps": {...}}` bytes from a [`Payload`]. The alert is a bare
//! string unless a title is set, in which case it becomes a
//! `{"title", "body"}` dictionary. `badge` and `sound` are always present;
//! `content-available` is either `1` or absent.

use bytes::Bytes;
use serde::Serialize;

use crate::errors::{PushError, Result};
use crate::notification::Payload;

#[derive(Serialize)]
struct Envelope<'a> {
    aps: Aps<'a>,
}

#[derive(Serialize)]
struct Aps<'a> {
    alert: Alert<'a>,
    badge: u32,
    sound: &'a str,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    content_available: Option<u8>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Alert<'a> {
    Text(&'a str),
    Titled { title: &'a str, body: &'a str },
}

/// Encode a payload into the request body sent to every device.
pub fn encode(payload: &Payload) -> Result<Bytes> {
    let alert = match payload.title() {
        Some(title) => Alert::Titled {
            title,
            body: &payload.alert,
        },
        None => Alert::Text(&payload.alert),
    };

    let envelope = Envelope {
        aps: Aps {
            alert,
            badge: payload.badge,
            sound: &payload.sound,
            content_available: payload.content_available.then_some(1),
        },
    };

    serde_json::to_vec(&envelope)
        .map(Bytes::from)
        .map_err(|e| PushError::Encode {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn decode(payload: &Payload) -> Value {
        serde_json::from_slice(&encode(payload).unwrap()).unwrap()
    }

    #[test]
    fn titled_alert_matches_reference_body() {
        let payload = Payload::new("Simple message")
            .with_title("This is the title")
            .with_badge(0)
            .with_sound("default");
        assert_eq!(
            decode(&payload),
            json!({
                "aps": {
                    "alert": {"title": "This is the title", "body": "Simple message"},
                    "badge": 0,
                    "sound": "default"
                }
            })
        );
    }

    #[test]
    fn untitled_alert_is_bare_string() {
        let value = decode(&Payload::new("hello"));
        assert_eq!(value["aps"]["alert"], "hello");
    }

    #[test]
    fn empty_title_encodes_bare_string() {
        let value = decode(&Payload::new("hello").with_title(""));
        assert_eq!(value["aps"]["alert"], "hello");
    }

    #[test]
    fn badge_and_sound_always_present() {
        let value = decode(&Payload::new("x").with_sound(""));
        let aps = value["aps"].as_object().unwrap();
        assert_eq!(aps["badge"], 0);
        assert_eq!(aps["sound"], "");
    }

    #[test]
    fn content_available_true_is_integer_one() {
        let value = decode(&Payload::new("x").with_content_available(true));
        assert_eq!(value["aps"]["content-available"], json!(1));
    }

    #[test]
    fn content_available_false_is_absent() {
        let value = decode(&Payload::new("x"));
        assert!(!value["aps"].as_object().unwrap().contains_key("content-available"));
    }

    #[test]
    fn only_aps_at_top_level() {
        let value = decode(&Payload::new("x").with_badge(3));
        let root = value.as_object().unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(value["aps"]["badge"], 3);
    }

    #[test]
    fn alert_text_is_escaped() {
        let value = decode(&Payload::new("say \"hi\"\n").with_title("ü"));
        assert_eq!(value["aps"]["alert"]["body"], "say \"hi\"\n");
        assert_eq!(value["aps"]["alert"]["title"], "ü");
    }
}
