mod border;
mod bridge;
mod capture;
mod config;
mod db;
mod events;
mod host;
mod machine;
mod models;
mod normalizer;
mod prompts;
mod settings;
mod storage;
mod ui;
mod utils;

pub use border::{BorderColor, BorderIndicator, NoopBorder};
pub use bridge::{
    BridgeAdapter, CallbackHost, InboundChannel, InboundMessage, OutboundMessage, Transport,
    HANDLER_ALIASES, REPLY_EVENT,
};
pub use capture::{
    ConstraintSet, Facing, Frame, ImageFileSource, StreamStatus, VideoSource, VideoStream,
};
pub use config::AppConfig;
pub use db::Database;
pub use events::{ControllerEvent, EventSink, HardwareEvent, UserAction};
pub use machine::{
    action_for, next_state, CaptureController, ControllerDeps, ResultView, Surface, Trigger,
    UiState,
};
pub use models::{HotDogResult, Request, RequestMode, ResultPayload, StandardResult};
pub use normalizer::{normalize, parse_raw};
pub use settings::{Settings, SettingsStore, SETTINGS_KEY};
pub use storage::{KeyValueStore, MemoryStore};
pub use ui::UiEvent;

pub mod toasts {
    pub use crate::machine::controller::{
        CAMERA_UNAVAILABLE, FRAME_NOT_READY, SEND_FAILED, STILL_WAITING,
    };
}

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if config.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    log::info!("identify-cam starting up...");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(host::stdio::run(config));
    // A stdin read may still be parked on the blocking pool.
    runtime.shutdown_background();
    result
}
