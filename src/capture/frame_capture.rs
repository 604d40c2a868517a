use std::{io::Cursor, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, RgbImage};
use serde::Serialize;
use tokio::task::JoinHandle;

use super::{
    constraints::ConstraintSet,
    source::{VideoSource, VideoStream},
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Live,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTrigger {
    MetadataLoaded,
    GraceElapsed,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub image_base64: String,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedFrame {
    Ready(Frame),
    NotReady,
}

pub struct FrameCapture {
    source: Arc<dyn VideoSource>,
    cascade: Vec<ConstraintSet>,
    stream: Option<Arc<dyn VideoStream>>,
    metadata_grace: Duration,
    jpeg_quality: u8,
}

impl FrameCapture {
    pub fn new(
        source: Arc<dyn VideoSource>,
        cascade: Vec<ConstraintSet>,
        metadata_grace: Duration,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            source,
            cascade,
            stream: None,
            metadata_grace,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Opens the first constraint set the source accepts and starts playback.
    /// Never fails: when nothing opens, the surface stays empty and the caller
    /// gets `Unavailable`.
    pub async fn start(&mut self) -> StreamStatus {
        for constraints in &self.cascade {
            match self.source.open(constraints).await {
                Ok(stream) => {
                    log_info!("Camera opened with {constraints}");
                    match start_playback(stream.clone(), self.metadata_grace).await {
                        Ok(trigger) => log_info!("Playback started ({trigger:?})"),
                        Err(err) => log_warn!("Playback did not start: {err:#}"),
                    }
                    self.stream = Some(stream);
                    return StreamStatus::Live;
                }
                Err(err) => {
                    log_warn!("Camera rejected {constraints}: {err:#}");
                }
            }
        }

        log_error!("No camera constraint set could be satisfied");
        StreamStatus::Unavailable
    }

    /// Grabs the current frame as base64 JPEG at the stream's decoded size.
    pub fn capture_frame(&self) -> CapturedFrame {
        let Some(stream) = &self.stream else {
            return CapturedFrame::NotReady;
        };
        let Some((width, height)) = stream.dimensions().filter(|(w, h)| *w > 0 && *h > 0) else {
            return CapturedFrame::NotReady;
        };
        let Some(mut frame) = stream.current_frame() else {
            return CapturedFrame::NotReady;
        };

        if frame.dimensions() != (width, height) {
            frame = image::imageops::resize(&frame, width, height, FilterType::Triangle);
        }

        match encode_jpeg(&frame, self.jpeg_quality) {
            Ok(bytes) => CapturedFrame::Ready(Frame {
                byte_len: bytes.len(),
                image_base64: STANDARD.encode(&bytes),
                width,
                height,
            }),
            Err(err) => {
                log_warn!("Frame encode failed: {err:#}");
                CapturedFrame::NotReady
            }
        }
    }
}

/// Races "metadata then play" against "grace period then play". Both tasks
/// keep running; the first successful one decides the trigger. Once one side
/// has failed, the other gets at most two more grace periods before playback
/// is given up on and left running detached.
async fn start_playback(stream: Arc<dyn VideoStream>, grace: Duration) -> Result<PlaybackTrigger> {
    let mut on_metadata: JoinHandle<Result<()>> = tokio::spawn({
        let stream = stream.clone();
        async move {
            stream.metadata_loaded().await;
            stream.play().await
        }
    });
    let mut on_grace: JoinHandle<Result<()>> = tokio::spawn({
        let stream = stream.clone();
        async move {
            tokio::time::sleep(grace).await;
            stream.play().await
        }
    });

    tokio::select! {
        joined = &mut on_metadata => match flatten(joined) {
            Ok(()) => Ok(PlaybackTrigger::MetadataLoaded),
            Err(err) => {
                log_warn!("Play after metadata failed: {err:#}");
                await_fallback(on_grace, grace, PlaybackTrigger::GraceElapsed).await
            }
        },
        joined = &mut on_grace => match flatten(joined) {
            Ok(()) => Ok(PlaybackTrigger::GraceElapsed),
            Err(err) => {
                log_warn!("Play after grace period failed: {err:#}");
                await_fallback(on_metadata, grace, PlaybackTrigger::MetadataLoaded).await
            }
        },
    }
}

async fn await_fallback(
    handle: JoinHandle<Result<()>>,
    grace: Duration,
    trigger: PlaybackTrigger,
) -> Result<PlaybackTrigger> {
    let limit = grace.saturating_mul(2);
    match tokio::time::timeout(limit, handle).await {
        Ok(joined) => flatten(joined).map(|()| trigger),
        Err(_) => Err(anyhow!("no playback within {}ms of the first failure", limit.as_millis())),
    }
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|err| anyhow!("playback task failed: {err}"))?
}

fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(frame)
        .context("jpeg encode failed")?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::constraints::{default_cascade, Facing};
    use anyhow::bail;
    use async_trait::async_trait;
    use image::Rgb;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    };

    struct FakeStream {
        metadata_fires: bool,
        failing_plays: usize,
        plays: AtomicUsize,
        decoded: AtomicBool,
    }

    impl FakeStream {
        fn new(metadata_fires: bool, failing_plays: usize) -> Self {
            Self {
                metadata_fires,
                failing_plays,
                plays: AtomicUsize::new(0),
                decoded: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl VideoStream for FakeStream {
        async fn metadata_loaded(&self) {
            if !self.metadata_fires {
                std::future::pending::<()>().await;
            }
        }

        async fn play(&self) -> Result<()> {
            let attempt = self.plays.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failing_plays {
                bail!("autoplay blocked");
            }
            self.decoded.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            self.decoded.load(Ordering::SeqCst).then_some((32, 24))
        }

        fn current_frame(&self) -> Option<RgbImage> {
            Some(RgbImage::from_pixel(64, 48, Rgb([200, 120, 40])))
        }
    }

    struct PickySource {
        accept: Option<Facing>,
        metadata_fires: bool,
        tried: Mutex<Vec<ConstraintSet>>,
        opened: Mutex<Option<Arc<FakeStream>>>,
    }

    impl PickySource {
        fn new(accept: Option<Facing>, metadata_fires: bool) -> Self {
            Self {
                accept,
                metadata_fires,
                tried: Mutex::new(Vec::new()),
                opened: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl VideoSource for PickySource {
        async fn open(&self, constraints: &ConstraintSet) -> Result<Arc<dyn VideoStream>> {
            self.tried.lock().unwrap().push(*constraints);
            if constraints.facing != self.accept || constraints.resolution().is_some() {
                bail!("overconstrained");
            }
            let stream = Arc::new(FakeStream::new(self.metadata_fires, 0));
            *self.opened.lock().unwrap() = Some(stream.clone());
            Ok(stream)
        }
    }

    #[tokio::test]
    async fn falls_through_cascade_until_one_opens() {
        let source = Arc::new(PickySource::new(None, true));
        let mut capture =
            FrameCapture::new(source.clone(), default_cascade(), Duration::from_millis(2000), 80);

        assert_eq!(capture.start().await, StreamStatus::Live);
        assert_eq!(source.tried.lock().unwrap().len(), 4);
        assert!(matches!(capture.capture_frame(), CapturedFrame::Ready(_)));
    }

    #[tokio::test]
    async fn unavailable_when_every_set_fails() {
        let source = Arc::new(PickySource::new(Some(Facing::User), true));
        let mut capture =
            FrameCapture::new(source, default_cascade(), Duration::from_millis(2000), 80);

        assert_eq!(capture.start().await, StreamStatus::Unavailable);
        assert_eq!(capture.capture_frame(), CapturedFrame::NotReady);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_period_plays_when_metadata_never_fires() {
        let source = Arc::new(PickySource::new(Some(Facing::Environment), false));
        let mut capture =
            FrameCapture::new(source.clone(), default_cascade(), Duration::from_millis(2000), 80);

        let started = tokio::time::Instant::now();
        assert_eq!(capture.start().await, StreamStatus::Live);
        assert!(started.elapsed() >= Duration::from_millis(2000));

        let stream = source.opened.lock().unwrap().clone().unwrap();
        assert_eq!(stream.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_play_after_metadata_falls_back_to_grace() {
        let stream = Arc::new(FakeStream::new(true, 1));

        let trigger = start_playback(stream.clone(), Duration::from_millis(2000))
            .await
            .unwrap();
        assert_eq!(trigger, PlaybackTrigger::GraceElapsed);
        assert_eq!(stream.plays.load(Ordering::SeqCst), 2);
        assert!(stream.dimensions().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_grace_play_with_silent_metadata_gives_up() {
        let stream = Arc::new(FakeStream::new(false, usize::MAX));

        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(600),
            start_playback(stream.clone(), Duration::from_millis(2000)),
        )
        .await
        .expect("playback race must settle");

        assert!(outcome.is_err());
        assert!(started.elapsed() <= Duration::from_millis(6000));
        assert_eq!(stream.plays.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_autoplay_still_reports_live() {
        struct BlockedSource;

        #[async_trait]
        impl VideoSource for BlockedSource {
            async fn open(&self, _constraints: &ConstraintSet) -> Result<Arc<dyn VideoStream>> {
                Ok(Arc::new(FakeStream::new(false, usize::MAX)))
            }
        }

        let mut capture = FrameCapture::new(
            Arc::new(BlockedSource),
            default_cascade(),
            Duration::from_millis(2000),
            80,
        );
        let status = tokio::time::timeout(Duration::from_secs(600), capture.start())
            .await
            .expect("start must return");

        assert_eq!(status, StreamStatus::Live);
        assert_eq!(capture.capture_frame(), CapturedFrame::NotReady);
    }

    #[tokio::test]
    async fn frame_is_sized_to_decoded_dimensions() {
        let source = Arc::new(PickySource::new(None, true));
        let mut capture =
            FrameCapture::new(source, default_cascade(), Duration::from_millis(2000), 80);
        capture.start().await;

        let CapturedFrame::Ready(frame) = capture.capture_frame() else {
            panic!("expected a frame");
        };
        assert_eq!((frame.width, frame.height), (32, 24));
        assert!(frame.byte_len > 0);

        let bytes = STANDARD.decode(&frame.image_base64).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn not_ready_before_start() {
        let source = Arc::new(PickySource::new(None, true));
        let capture = FrameCapture::new(source, default_cascade(), Duration::from_millis(10), 80);
        assert_eq!(capture.capture_frame(), CapturedFrame::NotReady);
    }
}
