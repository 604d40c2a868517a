use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use crate::{
    border::{BorderColor, BorderIndicator},
    bridge::{is_outbound_echo, BridgeAdapter, CallbackHost, InboundMessage, Transport},
    capture::{default_cascade, CapturedFrame, FrameCapture, StreamStatus, VideoSource},
    config::AppConfig,
    events::{ControllerEvent, EventSink, HardwareEvent, UserAction},
    models::ResultPayload,
    normalizer::normalize,
    prompts::prompt_for,
    settings::{Settings, SettingsStore},
    storage::KeyValueStore,
    ui::{UiEmitter, UiEvent},
};

use super::{
    result_view::ResultView,
    state::{next_state, Trigger, UiState},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const UI_EVENT_CAPACITY: usize = 64;

pub const CAMERA_UNAVAILABLE: &str = "Camera unavailable. Check permissions.";
pub const FRAME_NOT_READY: &str = "Camera is not ready yet. Try again.";
pub const SEND_FAILED: &str = "Could not send the photo. Try again.";
pub const STILL_WAITING: &str = "Still waiting for a response...";

/// Host capabilities the controller drives.
pub struct ControllerDeps {
    pub video: Arc<dyn VideoSource>,
    pub transport: Arc<dyn Transport>,
    pub host: Arc<dyn CallbackHost>,
    pub store: Arc<dyn KeyValueStore>,
    pub border: Arc<dyn BorderIndicator>,
}

/// Mutable app state, owned by exactly one controller.
pub struct ControllerContext {
    pub state: UiState,
    pub settings: SettingsStore,
    pub result: Option<ResultView>,
}

pub struct CaptureController {
    ctx: ControllerContext,
    bridge: BridgeAdapter,
    capture: FrameCapture,
    border: Arc<dyn BorderIndicator>,
    ui: UiEmitter,
    sink: EventSink,
    events: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl CaptureController {
    pub async fn new(deps: ControllerDeps, config: &AppConfig) -> Self {
        let (sink, events) = EventSink::channel();
        let settings = SettingsStore::load(deps.store).await;
        let bridge = BridgeAdapter::new(deps.transport, deps.host, sink.clone(), config.watchdog);
        bridge.attach_listeners();

        let capture = FrameCapture::new(
            deps.video,
            default_cascade(),
            config.metadata_grace,
            config.jpeg_quality,
        );

        Self {
            ctx: ControllerContext {
                state: UiState::default(),
                settings,
                result: None,
            },
            bridge,
            capture,
            border: deps.border,
            ui: UiEmitter::new(UI_EVENT_CAPACITY),
            sink,
            events,
        }
    }

    /// Handle for feeding hardware events, UI actions and host messages.
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.ui.subscribe()
    }

    pub fn state(&self) -> UiState {
        self.ctx.state
    }

    pub fn settings(&self) -> Settings {
        self.ctx.settings.current()
    }

    pub fn result_view(&self) -> Option<&ResultView> {
        self.ctx.result.as_ref()
    }

    pub fn bridge(&self) -> &BridgeAdapter {
        &self.bridge
    }

    /// Opens the camera and shows the initial screen.
    pub async fn start(&mut self) {
        if self.capture.start().await == StreamStatus::Unavailable {
            self.ui.toast(CAMERA_UNAVAILABLE);
        }
        self.enter(self.ctx.state);
        self.ui.emit(UiEvent::SettingsChanged {
            settings: self.ctx.settings.current(),
        });
    }

    pub async fn run(mut self) -> Result<()> {
        self.start().await;
        while self.step().await {}
        log_info!("Controller stopped in state {}", self.ctx.state.as_str());
        Ok(())
    }

    /// Processes the next queued event. Returns false on shutdown.
    pub async fn step(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => self.dispatch(event).await,
            None => false,
        }
    }

    pub async fn dispatch(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::Hardware(hardware) => {
                if let Some(action) = action_for(self.ctx.state, hardware) {
                    self.perform(action).await;
                } else {
                    log_debug!(
                        "Ignoring {} in state {}",
                        hardware.as_str(),
                        self.ctx.state.as_str()
                    );
                }
            }
            ControllerEvent::Action(action) => self.perform(action).await,
            ControllerEvent::Inbound(message) => self.on_inbound(message),
            ControllerEvent::WatchdogFired { request_id } => self.on_watchdog(&request_id),
            ControllerEvent::Shutdown => return false,
        }
        true
    }

    async fn perform(&mut self, action: UserAction) {
        match action {
            UserAction::Capture => self.capture(),
            UserAction::Back => self.back(),
            UserAction::OpenSettings => self.apply(Trigger::OpenSettings),
            UserAction::CloseSettings => self.apply(Trigger::CloseSettings),
            UserAction::ToggleVoiceResponse | UserAction::ToggleHotdogMode => {
                self.toggle_setting(action).await
            }
            UserAction::NextPage | UserAction::PreviousPage => self.turn_page(action),
        }
    }

    fn capture(&mut self) {
        let hotdog = self.ctx.settings.hotdog_unlocked();
        let Some(analyzing) = next_state(self.ctx.state, Trigger::Capture, hotdog) else {
            log_debug!("Capture ignored in state {}", self.ctx.state.as_str());
            return;
        };
        let Some(mode) = analyzing.analyzing_mode() else {
            return;
        };

        self.bridge.supersede();
        self.enter(analyzing);

        let frame = match self.capture.capture_frame() {
            CapturedFrame::Ready(frame) => frame,
            CapturedFrame::NotReady => {
                log_warn!("Capture requested before the camera produced a frame");
                self.ui.toast(FRAME_NOT_READY);
                self.apply(Trigger::CaptureFailed);
                return;
            }
        };

        let wants_voice = self.ctx.settings.voice_response();
        if let Err(err) = self.bridge.send(prompt_for(mode), &frame, mode, wants_voice) {
            log_error!("Send failed: {err:#}");
            self.ui.toast(SEND_FAILED);
            self.apply(Trigger::CaptureFailed);
        }
    }

    fn back(&mut self) {
        let state = self.ctx.state;
        if state.is_result() {
            self.apply(Trigger::Dismiss);
        } else if state == UiState::Settings {
            self.apply(Trigger::CloseSettings);
        } else if state.is_analyzing() && self.bridge.watchdog_fired() {
            // The request stays pending; a late answer still shows up.
            self.apply(Trigger::Abandon);
        } else {
            log_debug!("Back ignored in state {}", state.as_str());
        }
    }

    async fn toggle_setting(&mut self, action: UserAction) {
        if self.ctx.state != UiState::Settings {
            log_debug!("Settings toggle ignored outside the settings screen");
            return;
        }

        match action {
            UserAction::ToggleVoiceResponse => {
                self.ctx.settings.toggle_voice_response().await;
            }
            UserAction::ToggleHotdogMode => {
                self.ctx.settings.toggle_hotdog_unlocked().await;
            }
            _ => return,
        }

        self.ui.emit(UiEvent::SettingsChanged {
            settings: self.ctx.settings.current(),
        });
    }

    fn turn_page(&mut self, action: UserAction) {
        if !self.ctx.state.is_result() {
            return;
        }
        let Some(view) = self.ctx.result.as_mut() else {
            return;
        };

        let moved = match action {
            UserAction::NextPage => view.next_page(),
            _ => view.previous_page(),
        };
        if moved {
            self.ui.emit(UiEvent::PageChanged {
                page: view.page,
                page_count: view.page_count,
                lines: view.lines(),
            });
        }
    }

    fn on_inbound(&mut self, message: InboundMessage) {
        if is_outbound_echo(&message.payload) {
            log_debug!("Ignoring echoed request on {}", message.channel);
            return;
        }

        let Some(mode) = self.bridge.accepts(self.ctx.state) else {
            log_debug!(
                "Discarding message on {} in state {}",
                message.channel,
                self.ctx.state.as_str()
            );
            return;
        };

        let Some(payload) = normalize(&message.payload, mode) else {
            log_debug!("No usable result in message on {}", message.channel);
            return;
        };

        match self.bridge.complete() {
            Some(request) => log_info!(
                "Request {} answered via {} in {}ms (mode={}, prompt={} chars, image={} bytes)",
                request.id,
                message.channel,
                request.elapsed().as_millis(),
                request.mode.as_str(),
                request.prompt_len,
                request.image_len
            ),
            None => log_info!("Answer via {} with no request on record", message.channel),
        }

        let hotdog = self.ctx.settings.hotdog_unlocked();
        let target = next_state(self.ctx.state, Trigger::ResultReady, hotdog)
            .unwrap_or_else(|| UiState::result_for(mode));
        self.show_result(payload, target);
    }

    fn show_result(&mut self, payload: ResultPayload, target: UiState) {
        if let ResultPayload::HotDog(verdict) = &payload {
            self.border.set_color(BorderColor::for_verdict(verdict.is_hot_dog));
        }

        let view = ResultView::new(payload);
        let lines = view.lines();
        self.ctx.result = Some(view.clone());
        self.enter(target);
        self.ui.emit(UiEvent::ResultShown { view, lines });
    }

    fn on_watchdog(&mut self, request_id: &str) {
        if !self.bridge.mark_watchdog_fired(request_id) {
            return;
        }
        if self.ctx.state.is_analyzing() {
            log_warn!("No response to request {request_id} yet");
            self.ui.emit(UiEvent::StillWaiting {
                request_id: request_id.to_string(),
            });
            self.ui.toast(STILL_WAITING);
        }
    }

    fn apply(&mut self, trigger: Trigger) {
        let hotdog = self.ctx.settings.hotdog_unlocked();
        match next_state(self.ctx.state, trigger, hotdog) {
            Some(next) => self.enter(next),
            None => log_debug!(
                "Trigger {trigger:?} not valid in state {}",
                self.ctx.state.as_str()
            ),
        }
    }

    fn enter(&mut self, next: UiState) {
        let previous = self.ctx.state;
        if previous == UiState::HdResult && next != UiState::HdResult {
            self.border.set_color(BorderColor::Black);
        }
        if previous.is_result() && !next.is_result() {
            self.ctx.result = None;
        }

        self.ctx.state = next;
        log_debug!("{} -> {}", previous.as_str(), next.as_str());
        self.ui.emit(UiEvent::StateChanged {
            state: next,
            surfaces: next.surfaces().to_vec(),
        });
    }
}

/// Maps a device button to what it means on the current screen.
pub fn action_for(state: UiState, event: HardwareEvent) -> Option<UserAction> {
    match (event, state) {
        (HardwareEvent::SideClick, UiState::Camera | UiState::HdCamera) => Some(UserAction::Capture),
        (HardwareEvent::SideClick, UiState::Analyzing | UiState::HdAnalyzing) => {
            Some(UserAction::Back)
        }
        (HardwareEvent::SideClick | HardwareEvent::LongPressEnd, UiState::Result | UiState::HdResult) => {
            Some(UserAction::Back)
        }
        (HardwareEvent::SideClick | HardwareEvent::LongPressEnd, UiState::Settings) => {
            Some(UserAction::CloseSettings)
        }
        (HardwareEvent::LongPressEnd, UiState::Camera | UiState::HdCamera) => {
            Some(UserAction::OpenSettings)
        }
        (HardwareEvent::ScrollDown, UiState::Result | UiState::HdResult) => {
            Some(UserAction::NextPage)
        }
        (HardwareEvent::ScrollUp, UiState::Result | UiState::HdResult) => {
            Some(UserAction::PreviousPage)
        }
        _ => None,
    }
}
