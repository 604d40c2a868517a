use anyhow::Result;

use crate::events::EventSink;

use super::message::{InboundChannel, OutboundMessage};

/// Names under which the inbound handler is exposed to the host. The host
/// may call any of them, so all are bound.
pub const HANDLER_ALIASES: &[&str] = &["onPluginMessage", "onMessage", "onR1Message", "handleResponse"];

/// Custom event name some hosts dispatch replies under.
pub const REPLY_EVENT: &str = "pluginMessage";

/// Outbound half of the host transport. Posting is synchronous and may fail
/// outright; the reply, if any, arrives later through a `CallbackHost`.
pub trait Transport: Send + Sync {
    fn post_message(&self, message: &OutboundMessage) -> Result<()>;
}

/// Inbound half of the host transport.
pub trait CallbackHost: Send + Sync {
    /// (Re-)binds a named callback. Hosts may silently drop earlier bindings.
    fn bind(&self, alias: &str, sink: EventSink) -> Result<()>;

    /// Subscribes to a generic message-passing channel.
    fn listen(&self, channel: InboundChannel, sink: EventSink) -> Result<()>;
}

pub fn generic_channels() -> Vec<InboundChannel> {
    vec![
        InboundChannel::WindowMessage,
        InboundChannel::DocumentMessage,
        InboundChannel::CustomEvent(REPLY_EVENT.to_string()),
    ]
}
