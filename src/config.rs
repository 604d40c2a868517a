use std::{path::PathBuf, time::Duration};

pub const DEFAULT_WATCHDOG_MS: u64 = 20_000;
pub const DEFAULT_METADATA_GRACE_MS: u64 = 2_000;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
const DEFAULT_DATA_DIR: &str = ".identify-cam";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Still image served as the camera feed by the stdio host.
    pub still_image: Option<PathBuf>,
    pub watchdog: Duration,
    pub metadata_grace: Duration,
    pub jpeg_quality: u8,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            still_image: None,
            watchdog: Duration::from_millis(DEFAULT_WATCHDOG_MS),
            metadata_grace: Duration::from_millis(DEFAULT_METADATA_GRACE_MS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };

        Self {
            data_dir: lookup("IDCAM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            still_image: lookup("IDCAM_IMAGE").map(PathBuf::from),
            watchdog: millis("IDCAM_WATCHDOG_MS", defaults.watchdog),
            metadata_grace: millis("IDCAM_METADATA_GRACE_MS", defaults.metadata_grace),
            jpeg_quality: lookup("IDCAM_JPEG_QUALITY")
                .and_then(|value| value.trim().parse::<u8>().ok())
                .filter(|quality| (1..=100).contains(quality))
                .unwrap_or(defaults.jpeg_quality),
            debug: lookup("IDCAM_DEBUG")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
