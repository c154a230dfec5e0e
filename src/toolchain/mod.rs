//! External media programs behind a trait.
//!
//! Video transcoding, frame extraction, HEIC decoding and container probing
//! all need a real media toolchain. The [`MediaToolchain`] trait is the only
//! thing the pipeline knows about it; [`FfmpegToolchain`] is the production
//! implementation and tests substitute a recording mock.
//!
//! | Operation | Purpose | ffmpeg implementation |
//! |---|---|---|
//! | `transcode` | non-mp4 video → H.264/AAC mp4 | `ffmpeg -c:v … -crf … -movflags +faststart` |
//! | `extract_frame` | one still from a video | `ffmpeg -ss <t> -frames:v 1` |
//! | `decode_still` | HEIC/HEIF → PNG | `ffmpeg -frames:v 1` |
//! | `probe` | dimensions, rotation, duration | `ffprobe -print_format json` |

mod ffmpeg;

pub use ffmpeg::{FfmpegToolchain, parse_probe_output};

use crate::config::VideoConfig;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
    #[error("no output written to {}", .0.display())]
    NoOutput(PathBuf),
    #[error("unreadable probe output: {0}")]
    Probe(String),
}

/// What a container probe reports about the primary video stream.
///
/// Dimensions are the raw pixel buffer size, before any rotation hint is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
    /// Display rotation in degrees, as stored in the container (may be negative).
    pub rotation: f64,
    /// Container duration in seconds.
    pub duration: f64,
}

/// External media capabilities the pipeline depends on.
///
/// Implementations write exactly to the paths they are given and report
/// failure through [`ToolchainError`]; they never decide whether work is
/// needed. `Sync` so one instance can serve the rayon worker pool.
pub trait MediaToolchain: Sync {
    /// Re-encode a video into the delivery format.
    fn transcode(
        &self,
        source: &Path,
        output: &Path,
        settings: &VideoConfig,
    ) -> Result<(), ToolchainError>;

    /// Write a single frame taken `offset_secs` into the video as an image.
    fn extract_frame(
        &self,
        source: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<(), ToolchainError>;

    /// Decode a still the image backend cannot read (HEIC/HEIF) into a
    /// lossless intermediate.
    fn decode_still(&self, source: &Path, output: &Path) -> Result<(), ToolchainError>;

    /// Read stream dimensions, rotation and duration.
    fn probe(&self, source: &Path) -> Result<ProbeResult, ToolchainError>;
}
