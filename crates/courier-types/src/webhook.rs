//! Inbound webhook envelope from the conversational messaging platform.
//!
//! Meta nests the interesting part several levels deep:
//! `entry[0].changes[0].value.messages[0]`. Status-only callbacks omit
//! the `messages` array entirely and must be treated as a no-op.

use serde::Deserialize;
use serde_json::Value;

/// Webhook verification handshake: `GET` with three query parameters.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

/// A text message extracted from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub from: String,
    pub body: String,
}

/// Pull the first text message out of a webhook body, if there is one.
///
/// Returns `None` both for status-only callbacks (no `messages` array)
/// and for non-text message types; neither is an error.
pub fn extract_inbound_text(body: &Value) -> Option<InboundText> {
    let message = body
        .get("entry")?
        .get(0)?
        .get("changes")?
        .get(0)?
        .get("value")?
        .get("messages")?
        .get(0)?;

    if message.get("type")?.as_str()? != "text" {
        return None;
    }

    let from = message.get("from")?.as_str()?.to_string();
    let body = message.get("text")?.get("body")?.as_str()?.to_string();

    Some(InboundText { from, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delivery(messages: Value) -> Value {
        json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "metadata": { "phone_number_id": "1234567890" },
                        "messages": messages
                    }
                }]
            }]
        })
    }

    #[test]
    fn extracts_text_message() {
        let body = delivery(json!([{
            "type": "text",
            "from": "50760000000",
            "text": { "body": "hola" }
        }]));

        let inbound = extract_inbound_text(&body).unwrap();
        assert_eq!(inbound.from, "50760000000");
        assert_eq!(inbound.body, "hola");
    }

    #[test]
    fn status_only_callback_is_none() {
        // Delivery receipts carry `statuses` instead of `messages`.
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "statuses": [{ "status": "delivered" }]
                    }
                }]
            }]
        });
        assert!(extract_inbound_text(&body).is_none());
    }

    #[test]
    fn non_text_message_is_none() {
        let body = delivery(json!([{
            "type": "image",
            "from": "50760000000",
            "image": { "id": "abc" }
        }]));
        assert!(extract_inbound_text(&body).is_none());
    }

    #[test]
    fn empty_body_is_none() {
        assert!(extract_inbound_text(&json!({})).is_none());
    }
}
