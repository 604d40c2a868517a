//! Line-oriented host: stdin carries device and host events in, stdout carries
//! outbound posts and UI events out as JSON lines. Logs go to stderr.

use std::{
    collections::HashMap,
    io::Write,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    border::{BorderColor, BorderIndicator},
    bridge::{CallbackHost, InboundChannel, OutboundMessage, Transport, REPLY_EVENT},
    capture::{ConstraintSet, ImageFileSource, VideoSource, VideoStream},
    config::AppConfig,
    db::Database,
    events::{EventSink, HardwareEvent, UserAction},
    machine::{CaptureController, ControllerDeps},
    storage::{KeyValueStore, MemoryStore},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const DB_FILE_NAME: &str = "identify-cam.sqlite3";

fn write_line(value: &serde_json::Value) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{value}").context("failed to write to stdout")?;
    stdout.flush().context("failed to flush stdout")
}

pub struct StdoutTransport;

impl Transport for StdoutTransport {
    fn post_message(&self, message: &OutboundMessage) -> Result<()> {
        write_line(&json!({ "outbound": message }))
    }
}

pub struct StdoutBorder;

impl BorderIndicator for StdoutBorder {
    fn set_color(&self, color: BorderColor) {
        if let Err(err) = write_line(&json!({ "border": color.hex() })) {
            log_warn!("Border update dropped: {err:#}");
        }
    }
}

/// Stands in when no still image is configured; every open fails.
pub struct NoCamera;

#[async_trait]
impl VideoSource for NoCamera {
    async fn open(&self, constraints: &ConstraintSet) -> Result<Arc<dyn VideoStream>> {
        Err(anyhow!("no camera attached ({constraints})"))
    }
}

/// Remembers which sink each alias and channel was last bound to, mirroring a
/// host that lets later registrations replace earlier ones.
#[derive(Default)]
pub struct StdioCallbackHost {
    callbacks: Mutex<HashMap<String, EventSink>>,
    listeners: Mutex<HashMap<InboundChannel, EventSink>>,
}

impl StdioCallbackHost {
    fn sink_for(&self, channel: &InboundChannel) -> Result<Option<EventSink>> {
        let sink = match channel {
            InboundChannel::Callback(alias) => self
                .callbacks
                .lock()
                .map_err(|_| anyhow!("callback registry poisoned"))?
                .get(alias)
                .cloned(),
            other => self
                .listeners
                .lock()
                .map_err(|_| anyhow!("listener registry poisoned"))?
                .get(other)
                .cloned(),
        };
        Ok(sink)
    }

    pub fn deliver(&self, channel: InboundChannel, raw: &str) -> Result<()> {
        match self.sink_for(&channel)? {
            Some(sink) => {
                if !sink.deliver_raw(channel, raw) {
                    bail!("controller is no longer running");
                }
                Ok(())
            }
            None => {
                log_warn!("Nothing registered for {channel}; dropping delivery");
                Ok(())
            }
        }
    }
}

impl CallbackHost for StdioCallbackHost {
    fn bind(&self, alias: &str, sink: EventSink) -> Result<()> {
        self.callbacks
            .lock()
            .map_err(|_| anyhow!("callback registry poisoned"))?
            .insert(alias.to_string(), sink);
        Ok(())
    }

    fn listen(&self, channel: InboundChannel, sink: EventSink) -> Result<()> {
        self.listeners
            .lock()
            .map_err(|_| anyhow!("listener registry poisoned"))?
            .insert(channel, sink);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Hardware(HardwareEvent),
    Action(UserAction),
    Deliver {
        channel: InboundChannel,
        payload: String,
    },
    Quit,
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

pub fn parse_command(line: &str) -> Result<Option<HostCommand>> {
    let (verb, rest) = split_word(line);
    let command = match verb {
        "" => return Ok(None),
        "quit" | "exit" => HostCommand::Quit,
        "event" => HostCommand::Hardware(
            HardwareEvent::from_name(rest).ok_or_else(|| anyhow!("unknown hardware event '{rest}'"))?,
        ),
        "action" => HostCommand::Action(
            UserAction::from_name(rest).ok_or_else(|| anyhow!("unknown action '{rest}'"))?,
        ),
        "callback" => {
            let (alias, payload) = split_word(rest);
            if alias.is_empty() {
                bail!("callback needs an alias");
            }
            HostCommand::Deliver {
                channel: InboundChannel::Callback(alias.to_string()),
                payload: payload.to_string(),
            }
        }
        "message" => HostCommand::Deliver {
            channel: InboundChannel::WindowMessage,
            payload: rest.to_string(),
        },
        "document" => HostCommand::Deliver {
            channel: InboundChannel::DocumentMessage,
            payload: rest.to_string(),
        },
        "custom" => {
            let (name, payload) = split_word(rest);
            let name = if name.is_empty() { REPLY_EVENT } else { name };
            HostCommand::Deliver {
                channel: InboundChannel::CustomEvent(name.to_string()),
                payload: payload.to_string(),
            }
        }
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(command))
}

fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    match Database::new(config.data_dir.join(DB_FILE_NAME)) {
        Ok(database) => Arc::new(database),
        Err(err) => {
            log_warn!("Settings will not persist: {err:#}");
            Arc::new(MemoryStore::new())
        }
    }
}

async fn read_commands(host: Arc<StdioCallbackHost>, sink: EventSink) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                log_warn!("{err:#}");
                continue;
            }
        };

        let delivered = match command {
            HostCommand::Hardware(event) => sink.hardware(event),
            HostCommand::Action(action) => sink.action(action),
            HostCommand::Deliver { channel, payload } => {
                if let Err(err) = host.deliver(channel, &payload) {
                    log_warn!("{err:#}");
                    false
                } else {
                    true
                }
            }
            HostCommand::Quit => {
                sink.shutdown();
                return Ok(());
            }
        };

        if !delivered {
            log_debug!("Controller gone; stopping input loop");
            return Ok(());
        }
    }

    sink.shutdown();
    Ok(())
}

pub async fn run(config: AppConfig) -> Result<()> {
    let store = open_store(&config);
    let video: Arc<dyn VideoSource> = match &config.still_image {
        Some(path) => Arc::new(ImageFileSource::new(path.clone())),
        None => Arc::new(NoCamera),
    };
    let host = Arc::new(StdioCallbackHost::default());

    let controller = CaptureController::new(
        ControllerDeps {
            video,
            transport: Arc::new(StdoutTransport),
            host: host.clone(),
            store,
            border: Arc::new(StdoutBorder),
        },
        &config,
    )
    .await;

    let mut ui_events = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match ui_events.recv().await {
                Ok(event) => {
                    if let Err(err) = write_line(&json!({ "ui": event })) {
                        log_error!("UI event dropped: {err:#}");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    log_warn!("Renderer lagged, {missed} UI events skipped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let input = tokio::spawn(read_commands(host, controller.sink()));

    log_info!("Ready; reading commands from stdin");
    controller.run().await?;
    input.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_and_action_commands() {
        assert_eq!(
            parse_command("event sideClick").unwrap(),
            Some(HostCommand::Hardware(HardwareEvent::SideClick))
        );
        assert_eq!(
            parse_command("action open-settings").unwrap(),
            Some(HostCommand::Action(UserAction::OpenSettings))
        );
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("quit").unwrap(), Some(HostCommand::Quit));
    }

    #[test]
    fn parses_deliveries_with_json_payloads() {
        assert_eq!(
            parse_command("callback onPluginMessage {\"data\": \"hi there\"}").unwrap(),
            Some(HostCommand::Deliver {
                channel: InboundChannel::Callback("onPluginMessage".into()),
                payload: "{\"data\": \"hi there\"}".into(),
            })
        );
        assert_eq!(
            parse_command("custom").unwrap(),
            Some(HostCommand::Deliver {
                channel: InboundChannel::CustomEvent(REPLY_EVENT.into()),
                payload: String::new(),
            })
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse_command("event shake").is_err());
        assert!(parse_command("teleport now").is_err());
        assert!(parse_command("callback").is_err());
    }

    #[test]
    fn later_binding_replaces_earlier_one() {
        let host = StdioCallbackHost::default();
        let (first, mut first_rx) = EventSink::channel();
        let (second, mut second_rx) = EventSink::channel();

        host.bind("onMessage", first).unwrap();
        host.bind("onMessage", second).unwrap();
        host.deliver(InboundChannel::Callback("onMessage".into()), "hello")
            .unwrap();

        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_ok());
    }
}
