use std::sync::Arc;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Fixed key under which the settings blob is stored.
pub const SETTINGS_KEY: &str = "identify-cam.settings";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub voice_response: bool,
    pub hotdog_unlocked: bool,
}

impl Settings {
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(blob: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(blob.trim())
            .context("settings blob is not base64")?;
        let json = String::from_utf8(bytes).context("settings blob is not UTF-8")?;
        serde_json::from_str(&json).context("settings blob is not valid JSON")
    }
}

/// In-memory settings backed by a host key-value store. The in-memory copy is
/// authoritative; persistence is best effort in both directions.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    data: Settings,
}

impl SettingsStore {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let data = match store.get(SETTINGS_KEY).await {
            Ok(Some(blob)) => Settings::decode(&blob).unwrap_or_else(|err| {
                log_warn!("Stored settings unreadable, using defaults: {err:#}");
                Settings::default()
            }),
            Ok(None) => Settings::default(),
            Err(err) => {
                log_warn!("Failed to read settings, using defaults: {err:#}");
                Settings::default()
            }
        };

        Self { store, data }
    }

    pub fn current(&self) -> Settings {
        self.data
    }

    pub fn voice_response(&self) -> bool {
        self.data.voice_response
    }

    pub fn hotdog_unlocked(&self) -> bool {
        self.data.hotdog_unlocked
    }

    pub async fn toggle_voice_response(&mut self) -> bool {
        self.data.voice_response = !self.data.voice_response;
        self.persist().await;
        self.data.voice_response
    }

    pub async fn toggle_hotdog_unlocked(&mut self) -> bool {
        self.data.hotdog_unlocked = !self.data.hotdog_unlocked;
        self.persist().await;
        self.data.hotdog_unlocked
    }

    async fn persist(&self) {
        let result = match self.data.encode() {
            Ok(blob) => self.store.set(SETTINGS_KEY, &blob).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            log_warn!("Failed to persist settings: {err:#}");
        }
    }
}
