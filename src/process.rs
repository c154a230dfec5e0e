//! Derived-asset generation.
//!
//! Every source file can need up to three derived files, each written under
//! the public directory at a path fixed by [`naming`](crate::naming):
//!
//! | Source | Derived file | How |
//! |---|---|---|
//! | non-mp4 video | `generated/<album>/<file>.mp4` | toolchain transcode |
//! | HEIC/HEIF | `generated/<album>/<file>.jpg` | toolchain decode → backend JPEG |
//! | any still | `thumbs/<album>/<file>.jpg` | backend bounded resize → JPEG |
//! | any video | `thumbs/<album>/<file>.jpg` | toolchain frame grab → same resize |
//!
//! ## Idempotence
//!
//! Each operation first asks [`cache::freshness`] about its target. A fresh
//! target means no toolchain or backend call at all, so a second scan over
//! an unchanged library does no encoding work.
//!
//! ## Failure model
//!
//! Per-file failures are *outcomes*, not errors: they are logged and reported
//! as [`Outcome::Failed`], and the caller falls back (serve the original,
//! skip the thumbnail). The only [`ProcessError`] is failing to create an
//! output directory, which means nothing else can succeed either and aborts
//! the run.
//!
//! Intermediate files (decoded HEIC, extracted frames) and in-progress
//! outputs live next to their target as hidden siblings and are removed on
//! every path out of the operation.

use crate::cache::{self, Freshness};
use crate::config::GalleryConfig;
use crate::imaging::{self, ImageBackend, Quality, ThumbnailConfig};
use crate::naming::MediaKind;
use crate::toolchain::MediaToolchain;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cannot create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What one derive operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Target was written by this run.
    Created,
    /// Target already existed and was fresh.
    Reused,
    /// Generation was attempted and failed; the target does not exist.
    Failed,
    /// Nothing to derive from (e.g. HEIC conversion failed, so no thumbnail).
    Skipped,
}

impl Outcome {
    /// Whether the target exists after the operation.
    pub fn is_available(self) -> bool {
        matches!(self, Outcome::Created | Outcome::Reused)
    }

    pub fn record(self, stats: &mut cache::GenerationStats) {
        match self {
            Outcome::Created => stats.created(),
            Outcome::Reused => stats.reused(),
            Outcome::Failed => stats.failed(),
            Outcome::Skipped => {}
        }
    }
}

/// One derived file in a progress report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub label: &'static str,
    pub outcome: Outcome,
}

/// Progress events emitted while scanning, consumed by the CLI printer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    AlbumStarted {
        album: String,
        file_count: usize,
    },
    AlbumSkipped {
        album: String,
        reason: String,
    },
    FileProcessed {
        /// 1-based position within the album.
        index: usize,
        filename: String,
        kind: MediaKind,
        steps: Vec<StepReport>,
    },
}

/// Create the parent directory of `target`.
fn ensure_parent(target: &Path) -> Result<(), ProcessError> {
    let Some(dir) = target.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(dir).map_err(|source| ProcessError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Hidden intermediate beside `target`: `.<name>.<suffix>`.
fn scratch_path(target: &Path, suffix: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}", name, suffix))
}

/// Common skeleton: directory, freshness check, partial write, commit.
///
/// `produce` writes the finished file to the partial path it is given.
fn derive(
    label: &str,
    source: &Path,
    target: &Path,
    refresh_stale: bool,
    produce: impl FnOnce(&Path) -> Result<(), String>,
) -> Result<Outcome, ProcessError> {
    ensure_parent(target)?;

    let state = cache::freshness(source, target, refresh_stale);
    if !state.needs_work() {
        return Ok(Outcome::Reused);
    }
    if state == Freshness::Stale {
        log::info!("{} is older than {}, regenerating", target.display(), source.display());
    }

    let partial = cache::partial_path(target);
    let result = produce(&partial).and_then(|()| {
        cache::commit_partial(&partial, target).map_err(|e| format!("cannot move into place: {e}"))
    });

    match result {
        Ok(()) => Ok(Outcome::Created),
        Err(reason) => {
            cache::discard(&partial);
            log::warn!("{} failed for {}: {}", label, source.display(), reason);
            Ok(Outcome::Failed)
        }
    }
}

/// Transcode a video into the delivery format.
///
/// mp4 sources are served as-is and report [`Outcome::Skipped`].
pub fn transcode_video(
    toolchain: &impl MediaToolchain,
    config: &GalleryConfig,
    source: &Path,
    filename: &str,
    target: &Path,
) -> Result<Outcome, ProcessError> {
    if !crate::naming::needs_transcode(filename) {
        return Ok(Outcome::Skipped);
    }
    derive(
        "transcode",
        source,
        target,
        config.processing.refresh_stale,
        |partial| {
            toolchain
                .transcode(source, partial, &config.video)
                .map_err(|e| e.to_string())
        },
    )
}

/// Convert a HEIC/HEIF still into a JPEG the browser can show.
pub fn convert_heic(
    toolchain: &impl MediaToolchain,
    backend: &impl ImageBackend,
    config: &GalleryConfig,
    source: &Path,
    target: &Path,
) -> Result<Outcome, ProcessError> {
    derive(
        "HEIC conversion",
        source,
        target,
        config.processing.refresh_stale,
        |partial| {
            let decoded = scratch_path(target, "decoded.png");
            let result = toolchain
                .decode_still(source, &decoded)
                .map_err(|e| e.to_string())
                .and_then(|()| {
                    imaging::convert_to_jpeg(
                        backend,
                        &decoded,
                        partial,
                        Quality::new(config.heic.quality),
                    )
                    .map(|_| ())
                    .map_err(|e| e.to_string())
                });
            cache::discard(&decoded);
            result
        },
    )
}

/// Width-bounded JPEG thumbnail of a still.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    config: &GalleryConfig,
    source: &Path,
    target: &Path,
) -> Result<Outcome, ProcessError> {
    let thumb_config = ThumbnailConfig::from(&config.thumbnails);
    derive(
        "thumbnail",
        source,
        target,
        config.processing.refresh_stale,
        |partial| {
            imaging::create_thumbnail(backend, source, partial, &thumb_config)
                .map(|_| ())
                .map_err(|e| e.to_string())
        },
    )
}

/// Thumbnail of a video: grab one frame, then the still thumbnail path.
///
/// Clips shorter than the configured offset have no frame there; the grab is
/// retried at the first frame before giving up.
pub fn create_video_thumbnail(
    toolchain: &impl MediaToolchain,
    backend: &impl ImageBackend,
    config: &GalleryConfig,
    source: &Path,
    target: &Path,
) -> Result<Outcome, ProcessError> {
    let thumb_config = ThumbnailConfig::from(&config.thumbnails);
    let offset = config.thumbnails.frame_offset_secs;
    derive(
        "video thumbnail",
        source,
        target,
        config.processing.refresh_stale,
        |partial| {
            let frame = scratch_path(target, "frame.jpg");
            let grabbed = toolchain.extract_frame(source, &frame, offset).or_else(|e| {
                if offset > 0.0 {
                    log::debug!("no frame at {}s in {}: {}", offset, source.display(), e);
                    cache::discard(&frame);
                    toolchain.extract_frame(source, &frame, 0.0)
                } else {
                    Err(e)
                }
            });
            let result = grabbed.map_err(|e| e.to_string()).and_then(|()| {
                imaging::create_thumbnail(backend, &frame, partial, &thumb_config)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });
            cache::discard(&frame);
            result
        },
    )
}
