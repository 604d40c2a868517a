use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};

use super::constraints::ConstraintSet;

/// Something that can open a live video stream under negotiable constraints.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn open(&self, constraints: &ConstraintSet) -> Result<Arc<dyn VideoStream>>;
}

#[async_trait]
pub trait VideoStream: Send + Sync {
    /// Resolves once the stream knows its frame size. May never resolve on
    /// some hosts.
    async fn metadata_loaded(&self);

    /// Starts playback. Calling it more than once must be harmless.
    async fn play(&self) -> Result<()>;

    /// Decoded frame size, `None` until the first frame is available.
    fn dimensions(&self) -> Option<(u32, u32)>;

    fn current_frame(&self) -> Option<RgbImage>;
}

/// Serves a still image from disk as if it were a camera feed.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl VideoSource for ImageFileSource {
    async fn open(&self, constraints: &ConstraintSet) -> Result<Arc<dyn VideoStream>> {
        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .context("image decode worker join failed")?
            .with_context(|| format!("failed to open still image {}", self.path.display()))?;

        let mut frame = decoded.to_rgb8();
        if let Some((width, height)) = constraints.resolution() {
            frame = image::imageops::resize(&frame, width, height, FilterType::Triangle);
        }

        Ok(Arc::new(StillStream {
            frame,
            playing: AtomicBool::new(false),
        }))
    }
}

struct StillStream {
    frame: RgbImage,
    playing: AtomicBool,
}

#[async_trait]
impl VideoStream for StillStream {
    async fn metadata_loaded(&self) {}

    async fn play(&self) -> Result<()> {
        self.playing.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.playing
            .load(Ordering::Relaxed)
            .then(|| self.frame.dimensions())
    }

    fn current_frame(&self) -> Option<RgbImage> {
        self.playing
            .load(Ordering::Relaxed)
            .then(|| self.frame.clone())
    }
}
