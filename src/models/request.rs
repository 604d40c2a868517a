use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RequestMode {
    Standard,
    HotDog,
}

impl RequestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Standard => "standard",
            RequestMode::HotDog => "hotdog",
        }
    }
}

impl Default for RequestMode {
    fn default() -> Self {
        RequestMode::Standard
    }
}

/// The single in-flight identification request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub mode: RequestMode,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub started_at: Instant,
    pub prompt_len: usize,
    pub image_len: usize,
}

impl Request {
    pub fn new(mode: RequestMode, prompt_len: usize, image_len: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode,
            created_at: Utc::now(),
            started_at: Instant::now(),
            prompt_len,
            image_len,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
