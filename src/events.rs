use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::bridge::{InboundChannel, InboundMessage};
use crate::normalizer::parse_raw;

/// Ambient hardware signals delivered by the device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HardwareEvent {
    ScrollUp,
    ScrollDown,
    SideClick,
    LongPressEnd,
}

impl HardwareEvent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scrollUp" => Some(HardwareEvent::ScrollUp),
            "scrollDown" => Some(HardwareEvent::ScrollDown),
            "sideClick" => Some(HardwareEvent::SideClick),
            "longPressEnd" => Some(HardwareEvent::LongPressEnd),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareEvent::ScrollUp => "scrollUp",
            HardwareEvent::ScrollDown => "scrollDown",
            HardwareEvent::SideClick => "sideClick",
            HardwareEvent::LongPressEnd => "longPressEnd",
        }
    }
}

/// Actions the on-screen UI can request directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    Capture,
    Back,
    OpenSettings,
    CloseSettings,
    ToggleVoiceResponse,
    ToggleHotdogMode,
    NextPage,
    PreviousPage,
}

impl UserAction {
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Hardware(HardwareEvent),
    Action(UserAction),
    Inbound(InboundMessage),
    WatchdogFired { request_id: String },
    Shutdown,
}

/// The controller's single event queue. Every host registration, timer and
/// input source forwards into a clone of this sink.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Returns false once the controller has stopped.
    pub fn send(&self, event: ControllerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn deliver(&self, channel: InboundChannel, payload: Value) -> bool {
        self.send(ControllerEvent::Inbound(InboundMessage { channel, payload }))
    }

    pub fn deliver_raw(&self, channel: InboundChannel, raw: &str) -> bool {
        self.deliver(channel, parse_raw(raw))
    }

    pub fn hardware(&self, event: HardwareEvent) -> bool {
        self.send(ControllerEvent::Hardware(event))
    }

    pub fn action(&self, action: UserAction) -> bool {
        self.send(ControllerEvent::Action(action))
    }

    pub fn shutdown(&self) -> bool {
        self.send(ControllerEvent::Shutdown)
    }

    pub(crate) fn watchdog_fired(&self, request_id: String) -> bool {
        self.send(ControllerEvent::WatchdogFired { request_id })
    }
}
