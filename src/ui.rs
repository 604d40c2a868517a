use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    machine::{result_view::ResultLine, ResultView, Surface, UiState},
    settings::Settings,
};

/// Everything a renderer needs to draw the app.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    #[serde(rename_all = "camelCase")]
    StateChanged {
        state: UiState,
        surfaces: Vec<Surface>,
    },
    #[serde(rename_all = "camelCase")]
    ResultShown {
        view: ResultView,
        lines: Vec<ResultLine>,
    },
    #[serde(rename_all = "camelCase")]
    PageChanged {
        page: usize,
        page_count: usize,
        lines: Vec<ResultLine>,
    },
    SettingsChanged {
        settings: Settings,
    },
    #[serde(rename_all = "camelCase")]
    StillWaiting {
        request_id: String,
    },
    Toast {
        message: String,
    },
}

#[derive(Clone)]
pub struct UiEmitter {
    tx: broadcast::Sender<UiEvent>,
}

impl UiEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Fire and forget; no renderer attached is not an error.
    pub fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    pub fn toast(&self, message: impl Into<String>) {
        self.emit(UiEvent::Toast {
            message: message.into(),
        });
    }
}
