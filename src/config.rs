//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `gallery.toml`. Stock defaults
//! reproduce the gallery's historical behavior, so the file is optional and
//! only needs the keys you want to change.
//!
//! ## Config File Location
//!
//! By default the file is read from the project root:
//!
//! ```text
//! project/
//! ├── gallery.toml             # optional
//! ├── public/
//! │   ├── photos/<album>/...   # sources
//! │   ├── thumbs/              # generated
//! │   └── generated/           # generated
//! └── src/assets/photos.json   # manifest
//! ```
//!
//! `--config <file>` points at a different file.
//!
//! ## Configuration Options
//!
//! ```toml
//! [paths]
//! public_dir = "public"                  # holds photos/, thumbs/, generated/
//! manifest = "src/assets/photos.json"    # manifest output
//!
//! [thumbnails]
//! max_width = 400           # never upscaled
//! quality = 80              # JPEG quality (1-100)
//! frame_offset_secs = 1.0   # where video thumbnails are grabbed
//!
//! [heic]
//! quality = 90              # JPEG quality of converted HEIC/HEIF
//!
//! [video]
//! codec = "libx264"
//! preset = "fast"
//! crf = 23
//! audio_codec = "aac"
//! audio_bitrate = "128k"
//! faststart = true
//!
//! [tools]
//! ffmpeg = "ffmpeg"
//! ffprobe = "ffprobe"
//! timeout_secs = 600        # per external invocation
//!
//! [processing]
//! max_processes = 4         # omit for auto = CPU cores
//! refresh_stale = false     # regenerate when the source is newer
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::naming::{GENERATED_PREFIX, PHOTOS_PREFIX, THUMBS_PREFIX};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILENAME: &str = "gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `gallery.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Where sources live and where outputs go.
    pub paths: PathsConfig,
    /// Thumbnail size and encoding.
    pub thumbnails: ThumbnailsConfig,
    /// HEIC/HEIF conversion.
    pub heic: HeicConfig,
    /// Video transcode preset, passed through to the encoder.
    pub video: VideoConfig,
    /// External media programs.
    pub tools: ToolsConfig,
    /// Parallelism and regeneration policy.
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.max_width == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_width must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if !(1..=100).contains(&self.heic.quality) {
            return Err(ConfigError::Validation("heic.quality must be 1-100".into()));
        }
        if !self.thumbnails.frame_offset_secs.is_finite() || self.thumbnails.frame_offset_secs < 0.0
        {
            return Err(ConfigError::Validation(
                "thumbnails.frame_offset_secs must be a non-negative number".into(),
            ));
        }
        if self.video.crf > 51 {
            return Err(ConfigError::Validation("video.crf must be 0-51".into()));
        }
        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "tools.timeout_secs must be non-zero".into(),
            ));
        }
        if self.paths.manifest.trim().is_empty() {
            return Err(ConfigError::Validation(
                "paths.manifest must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Source and output locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory holding `photos/`, `thumbs/` and `generated/`.
    pub public_dir: String,
    /// Manifest file written at the end of a scan.
    pub manifest: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            manifest: "src/assets/photos.json".to_string(),
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Maximum thumbnail width in pixels. Smaller sources keep their size.
    pub max_width: u32,
    /// JPEG quality (1-100).
    pub quality: u32,
    /// Seconds into a video where the thumbnail frame is taken.
    pub frame_offset_secs: f64,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            max_width: 400,
            quality: 80,
            frame_offset_secs: 1.0,
        }
    }
}

/// HEIC/HEIF conversion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeicConfig {
    /// JPEG quality (1-100) of the converted still.
    pub quality: u32,
}

impl Default for HeicConfig {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// Video transcode preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    pub codec: String,
    pub preset: String,
    /// Constant rate factor (0-51, lower = better).
    pub crf: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Move the moov atom to the front for progressive playback.
    pub faststart: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            faststart: true,
        }
    }
}

/// External media programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// `ffmpeg` binary (name on PATH or absolute path).
    pub ffmpeg: String,
    /// `ffprobe` binary (name on PATH or absolute path).
    pub ffprobe: String,
    /// Per-invocation timeout. A process still running after this is killed.
    pub timeout_secs: u64,
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            timeout_secs: 600,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel file workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Regenerate a derived file when its source has a newer mtime.
    /// Off by default: existence alone means "done".
    pub refresh_stale: bool,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Absolute locations of everything the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub public_dir: PathBuf,
    pub manifest: PathBuf,
}

impl ProjectLayout {
    /// Resolve configured paths against the project root.
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            public_dir: root.join(&paths.public_dir),
            manifest: root.join(&paths.manifest),
        }
    }

    /// Source tree: `<public>/photos`.
    pub fn photos_dir(&self) -> PathBuf {
        self.public_dir.join(PHOTOS_PREFIX)
    }

    pub fn thumbs_dir(&self) -> PathBuf {
        self.public_dir.join(THUMBS_PREFIX)
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.public_dir.join(GENERATED_PREFIX)
    }

    /// Turn a `/`-separated public-relative path into a filesystem path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.public_dir.clone(), |acc, part| acc.join(part))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `file`, falling back to stock defaults when it is absent.
pub fn load_config(file: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(file)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `gallery.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-scan configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Locations (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
# Holds photos/ (sources), thumbs/ and generated/ (outputs).
public_dir = "public"

# The JSON manifest read by the front-end.
manifest = "src/assets/photos.json"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Maximum width in pixels. Height follows the aspect ratio; never upscaled.
max_width = 400

# JPEG quality (1-100).
quality = 80

# Seconds into a video where the thumbnail frame is taken.
# Skips the black frame many recordings start with.
frame_offset_secs = 1.0

# ---------------------------------------------------------------------------
# HEIC / HEIF
# ---------------------------------------------------------------------------
[heic]
# JPEG quality (1-100) of the converted still.
quality = 90

# ---------------------------------------------------------------------------
# Video transcoding (non-mp4 sources only)
# ---------------------------------------------------------------------------
[video]
codec = "libx264"
preset = "fast"
crf = 23
audio_codec = "aac"
audio_bitrate = "128k"
# Streaming-friendly container layout.
faststart = true

# ---------------------------------------------------------------------------
# External tools
# ---------------------------------------------------------------------------
[tools]
ffmpeg = "ffmpeg"
ffprobe = "ffprobe"
# A single ffmpeg/ffprobe run is killed after this many seconds.
timeout_secs = 600

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel file workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Regenerate thumbnails/conversions whose source file is newer.
refresh_stale = false
"##
}
