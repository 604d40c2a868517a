pub mod adapter;
pub mod host;
pub mod message;

pub use adapter::BridgeAdapter;
pub use host::{generic_channels, CallbackHost, Transport, HANDLER_ALIASES, REPLY_EVENT};
pub use message::{is_outbound_echo, InboundChannel, InboundMessage, OutboundMessage};
