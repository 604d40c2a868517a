use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::Frame,
    events::EventSink,
    machine::UiState,
    models::{Request, RequestMode},
};

use super::{
    host::{generic_channels, CallbackHost, Transport, HANDLER_ALIASES},
    message::OutboundMessage,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Owns the one in-flight request and its advisory watchdog.
///
/// Whether a request is pending and whether its watchdog has fired are kept
/// apart: the watchdog only informs the user, it never cancels the request.
pub struct BridgeAdapter {
    transport: Arc<dyn Transport>,
    host: Arc<dyn CallbackHost>,
    sink: EventSink,
    watchdog_after: Duration,
    active: Option<Request>,
    watchdog: Option<CancellationToken>,
    watchdog_fired: bool,
}

impl BridgeAdapter {
    pub fn new(
        transport: Arc<dyn Transport>,
        host: Arc<dyn CallbackHost>,
        sink: EventSink,
        watchdog_after: Duration,
    ) -> Self {
        Self {
            transport,
            host,
            sink,
            watchdog_after,
            active: None,
            watchdog: None,
            watchdog_fired: false,
        }
    }

    /// Subscribes to the catch-all channels. Called once at startup.
    pub fn attach_listeners(&self) {
        for channel in generic_channels() {
            if let Err(err) = self.host.listen(channel.clone(), self.sink.clone()) {
                log_warn!("Could not listen on {channel}: {err:#}");
            }
        }
        self.bind_aliases();
    }

    fn bind_aliases(&self) {
        for alias in HANDLER_ALIASES {
            if let Err(err) = self.host.bind(alias, self.sink.clone()) {
                log_warn!("Could not bind handler alias {alias}: {err:#}");
            }
        }
    }

    pub fn active(&self) -> Option<&Request> {
        self.active.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    pub fn watchdog_fired(&self) -> bool {
        self.watchdog_fired
    }

    /// Posts a new request, replacing any pending one. On a synchronous post
    /// failure nothing stays pending and the error is returned.
    pub fn send(
        &mut self,
        prompt: &str,
        frame: &Frame,
        mode: RequestMode,
        wants_spoken_response: bool,
    ) -> Result<Request> {
        self.supersede();
        self.bind_aliases();

        let request = Request::new(mode, prompt.len(), frame.image_base64.len());
        let message = OutboundMessage::new(
            prompt,
            Some(frame.image_base64.clone()),
            wants_spoken_response,
        );

        self.transport
            .post_message(&message)
            .with_context(|| format!("failed to post request {}", request.id))?;

        log_info!(
            "Posted request {} (mode={}, prompt={} chars, image={} bytes)",
            request.id,
            request.mode.as_str(),
            request.prompt_len,
            request.image_len
        );

        self.arm_watchdog(request.id.clone());
        self.active = Some(request.clone());
        Ok(request)
    }

    fn arm_watchdog(&mut self, request_id: String) {
        self.cancel_watchdog();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let sink = self.sink.clone();
        let after = self.watchdog_after;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    sink.watchdog_fired(request_id);
                }
            }
        });

        self.watchdog = Some(token);
        self.watchdog_fired = false;
    }

    fn cancel_watchdog(&mut self) {
        if let Some(token) = self.watchdog.take() {
            token.cancel();
        }
    }

    /// Records a watchdog expiry. Returns false for stale timers.
    pub fn mark_watchdog_fired(&mut self, request_id: &str) -> bool {
        match &self.active {
            Some(request) if request.id == request_id => {
                self.watchdog = None;
                self.watchdog_fired = true;
                true
            }
            _ => {
                log_debug!("Ignoring watchdog for stale request {request_id}");
                false
            }
        }
    }

    /// The mode an inbound message should be read under, or `None` when it
    /// must be discarded. Accepted while analyzing, or while a request is
    /// still pending after the state moved on.
    pub fn accepts(&self, state: UiState) -> Option<RequestMode> {
        match (&self.active, state.analyzing_mode()) {
            (Some(request), _) => Some(request.mode),
            (None, Some(mode)) => Some(mode),
            (None, None) => None,
        }
    }

    /// Clears the pending request after its response was processed.
    pub fn complete(&mut self) -> Option<Request> {
        self.cancel_watchdog();
        self.watchdog_fired = false;
        self.active.take()
    }

    /// Drops a pending request without a response; used when a newer capture
    /// starts.
    pub fn supersede(&mut self) {
        if let Some(previous) = self.complete() {
            log_info!(
                "Request {} superseded after {}ms",
                previous.id,
                previous.elapsed().as_millis()
            );
        }
    }
}

impl Drop for BridgeAdapter {
    fn drop(&mut self) {
        self.cancel_watchdog();
    }
}
