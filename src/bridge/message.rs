use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Payload handed to the host's post-message primitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub message: String,
    #[serde(rename = "useLLM")]
    pub use_llm: bool,
    #[serde(rename = "wantsR1Response")]
    pub wants_spoken_response: bool,
    #[serde(rename = "wantsJournalEntry")]
    pub wants_journal_entry: bool,
    #[serde(rename = "imageBase64", skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl OutboundMessage {
    pub fn new(prompt: &str, image_base64: Option<String>, wants_spoken_response: bool) -> Self {
        Self {
            message: prompt.to_string(),
            use_llm: true,
            wants_spoken_response,
            wants_journal_entry: false,
            image_base64,
        }
    }
}

/// Where an inbound delivery came from. Only used for logging; no channel is
/// more authoritative than another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum InboundChannel {
    Callback(String),
    WindowMessage,
    DocumentMessage,
    CustomEvent(String),
}

impl fmt::Display for InboundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundChannel::Callback(alias) => write!(f, "callback:{alias}"),
            InboundChannel::WindowMessage => write!(f, "window-message"),
            InboundChannel::DocumentMessage => write!(f, "document-message"),
            InboundChannel::CustomEvent(name) => write!(f, "custom-event:{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel: InboundChannel,
    pub payload: Value,
}

/// Hosts that broadcast on generic channels often echo our own outbound
/// message back to us.
pub fn is_outbound_echo(payload: &Value) -> bool {
    payload
        .as_object()
        .is_some_and(|map| map.contains_key("useLLM") || map.contains_key("wantsR1Response"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_uses_host_field_names() {
        let message = OutboundMessage::new("What is this?", Some("abc".into()), true);
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "message": "What is this?",
                "useLLM": true,
                "wantsR1Response": true,
                "wantsJournalEntry": false,
                "imageBase64": "abc"
            })
        );
    }

    #[test]
    fn image_is_omitted_when_absent() {
        let message = OutboundMessage::new("hi", None, false);
        let value = serde_json::to_value(&message).unwrap();
        assert!(value.get("imageBase64").is_none());
    }

    #[test]
    fn detects_echoed_requests() {
        let echo = serde_json::to_value(OutboundMessage::new("hi", None, false)).unwrap();
        assert!(is_outbound_echo(&echo));
        assert!(!is_outbound_echo(&json!({"message": "A mug."})));
    }
}
