//! Library scanning: albums → files → manifest records.
//!
//! Drives the pipeline over the source tree. For each album, in name order,
//! every media file goes through [`process_file`]: derive names, generate
//! missing derived files, extract metadata, build a [`MediaAsset`].
//!
//! ## Directory Structure
//!
//! ```text
//! public/photos/               # media root
//! ├── 2023-japan/              # album → `category`
//! │   ├── IMG_0001.HEIC
//! │   ├── IMG_0002.jpg
//! │   └── IMG_0003.MOV
//! ├── family/
//! │   └── dinner.webp
//! ├── .thumbnails-cache/       # hidden → ignored
//! └── notes.txt                # not a directory → ignored
//! ```
//!
//! Only immediate subdirectories are albums and only their immediate files
//! are scanned; nested folders are not descended into. Files are accepted by
//! extension (see [`naming::classify`]); everything else is ignored silently.
//!
//! ## Failure isolation
//!
//! - Missing media root: empty outcome, not an error.
//! - Album that cannot be listed: skipped with a warning, recorded in
//!   [`ScanOutcome::skipped_albums`].
//! - File whose filesystem metadata cannot be read: skipped with a warning.
//! - Anything else going wrong for a file (corrupt image, failed transcode,
//!   unreadable EXIF) degrades that record and nothing else.
//! - Output directory creation failure: aborts the scan.
//!
//! ## Parallelism
//!
//! Albums run one after another; files within an album run on the rayon
//! pool. Results are collected in listing order, so the record order before
//! sorting is deterministic.

use crate::cache::GenerationStats;
use crate::config::{GalleryConfig, ProjectLayout};
use crate::imaging::{ImageBackend, get_dimensions};
use crate::metadata::{self, StillMetadata};
use crate::naming::{self, MediaKind};
use crate::process::{self, Outcome, ProcessError, ProcessEvent, StepReport};
use crate::toolchain::MediaToolchain;
use crate::types::{AssetType, MediaAsset};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot list {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Everything a scan produced. Records are in encounter order (albums by
/// name, files by name); sorting is the manifest's job.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub assets: Vec<MediaAsset>,
    pub stats: GenerationStats,
    pub skipped_albums: Vec<String>,
    /// `album/filename` of files that were listed but could not be read.
    pub skipped_files: Vec<String>,
}

/// One file after processing, with the per-step report for progress output.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    pub asset: MediaAsset,
    pub steps: Vec<StepReport>,
}

/// Result of a dry run: what a scan would pick up.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// False when the media root does not exist.
    pub root_exists: bool,
    pub albums: Vec<AlbumListing>,
}

#[derive(Debug)]
pub struct AlbumListing {
    pub name: String,
    pub files: Vec<(String, MediaKind)>,
    /// Set when the album could not be listed.
    pub error: Option<String>,
}

/// UTF-8 name of a non-hidden directory entry.
fn visible_name(entry: &walkdir::DirEntry) -> Option<String> {
    let name = entry.file_name().to_str();
    if name.is_none() {
        log::warn!("skipping non UTF-8 name {}", entry.path().display());
    }
    name.filter(|n| !n.starts_with('.')).map(str::to_string)
}

/// Immediate, non-hidden children of `dir`, sorted by name.
fn list_children(
    dir: &Path,
    keep: impl Fn(&walkdir::DirEntry) -> bool,
) -> Result<Vec<String>, ScanError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    let mut names = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 is `dir` itself: the whole listing failed.
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                log::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if keep(&entry)
            && let Some(name) = visible_name(&entry)
        {
            names.push(name);
        }
    }
    Ok(names)
}

/// Album names: immediate subdirectories of the media root, sorted.
pub fn list_albums(photos_dir: &Path) -> Result<Vec<String>, ScanError> {
    list_children(photos_dir, |e| e.file_type().is_dir())
}

/// Media files directly inside an album, sorted by name.
pub fn list_media_files(album_dir: &Path) -> Result<Vec<String>, ScanError> {
    let names = list_children(album_dir, |e| e.file_type().is_file())?;
    Ok(names
        .into_iter()
        .filter(|name| naming::classify(name).is_some())
        .collect())
}

/// Scan the library, generating derived files as needed.
///
/// `events`, when given, receives progress as files complete. The sender is
/// dropped on return, which ends a printer loop reading from it.
pub fn scan(
    layout: &ProjectLayout,
    config: &GalleryConfig,
    toolchain: &impl MediaToolchain,
    backend: &impl ImageBackend,
    events: Option<Sender<ProcessEvent>>,
) -> Result<ScanOutcome, ScanError> {
    scan_albums(layout, config, toolchain, backend, events, list_media_files)
}

/// [`scan`] with the per-album file listing supplied by the caller.
fn scan_albums(
    layout: &ProjectLayout,
    config: &GalleryConfig,
    toolchain: &impl MediaToolchain,
    backend: &impl ImageBackend,
    events: Option<Sender<ProcessEvent>>,
    list_files: impl Fn(&Path) -> Result<Vec<String>, ScanError>,
) -> Result<ScanOutcome, ScanError> {
    let photos_dir = layout.photos_dir();
    let mut outcome = ScanOutcome::default();

    if !photos_dir.is_dir() {
        log::info!(
            "media root {} does not exist, nothing to scan",
            photos_dir.display()
        );
        return Ok(outcome);
    }

    let emit = |event: ProcessEvent| {
        if let Some(tx) = &events {
            // A closed receiver only means nobody is watching progress.
            let _ = tx.send(event);
        }
    };

    for album in list_albums(&photos_dir)? {
        let files = match list_files(&photos_dir.join(&album)) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("skipping album {}: {}", album, e);
                emit(ProcessEvent::AlbumSkipped {
                    album: album.clone(),
                    reason: e.to_string(),
                });
                outcome.skipped_albums.push(album);
                continue;
            }
        };

        emit(ProcessEvent::AlbumStarted {
            album: album.clone(),
            file_count: files.len(),
        });

        let processed = files
            .par_iter()
            .enumerate()
            .map(|(i, filename)| {
                let result = process_file(layout, config, toolchain, backend, &album, filename)?;
                if let Some(file) = &result {
                    emit(ProcessEvent::FileProcessed {
                        index: i + 1,
                        filename: filename.clone(),
                        kind: naming::classify(filename).unwrap_or(MediaKind::Image),
                        steps: file.steps.clone(),
                    });
                }
                Ok::<_, ProcessError>(result)
            })
            .collect::<Result<Vec<_>, ProcessError>>()?;

        for (filename, file) in files.iter().zip(processed) {
            match file {
                Some(file) => {
                    for step in &file.steps {
                        step.outcome.record(&mut outcome.stats);
                    }
                    outcome.assets.push(file.asset);
                }
                None => outcome.skipped_files.push(format!("{}/{}", album, filename)),
            }
        }
    }

    Ok(outcome)
}

/// Run one file through the pipeline.
///
/// Returns `Ok(None)` when the file cannot even be stat'ed (it vanished or
/// is unreadable); every other per-file problem yields a degraded record.
pub fn process_file(
    layout: &ProjectLayout,
    config: &GalleryConfig,
    toolchain: &impl MediaToolchain,
    backend: &impl ImageBackend,
    album: &str,
    filename: &str,
) -> Result<Option<ProcessedFile>, ProcessError> {
    let Some(kind) = naming::classify(filename) else {
        return Ok(None);
    };
    let paths = naming::derive_paths(album, filename);
    let source = layout.resolve(&paths.served);

    let fs_meta = match std::fs::metadata(&source) {
        Ok(meta) => meta,
        Err(e) => {
            log::warn!("skipping {}: {}", source.display(), e);
            return Ok(None);
        }
    };
    let mtime: DateTime<Utc> = fs_meta
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let thumb_target = layout.resolve(&paths.thumbnail);

    let mut steps = Vec::new();
    let mut url = paths.served.clone();
    let mut duration = None;

    let still = match kind {
        MediaKind::Video => {
            if naming::needs_transcode(filename) {
                let target = layout.resolve(&paths.transcoded);
                let transcode =
                    process::transcode_video(toolchain, config, &source, filename, &target)?;
                if transcode.is_available() {
                    url = paths.transcoded.clone();
                }
                steps.push(StepReport {
                    label: "transcode",
                    outcome: transcode,
                });
            }

            let probe = toolchain
                .probe(&source)
                .inspect_err(|e| log::warn!("cannot probe {}: {}", source.display(), e))
                .ok();
            let video = metadata::video_metadata(probe);
            duration = video.duration;

            let thumb = process::create_video_thumbnail(
                toolchain,
                backend,
                config,
                &source,
                &thumb_target,
            )?;
            steps.push(StepReport {
                label: "thumbnail",
                outcome: thumb,
            });

            StillMetadata {
                date: mtime,
                width: video.width,
                height: video.height,
                exif: None,
            }
        }
        MediaKind::Heic => {
            let converted = layout.resolve(&paths.converted);
            let conversion = process::convert_heic(toolchain, backend, config, &source, &converted)?;
            steps.push(StepReport {
                label: "heic",
                outcome: conversion,
            });

            let thumb = if conversion.is_available() {
                url = paths.converted.clone();
                process::create_thumbnail(backend, config, &converted, &thumb_target)?
            } else {
                Outcome::Skipped
            };
            steps.push(StepReport {
                label: "thumbnail",
                outcome: thumb,
            });

            let viewable = conversion.is_available().then_some(converted);
            metadata::extract_still(
                &source,
                || viewable.and_then(|p| get_dimensions(backend, &p).ok()),
                mtime,
            )
        }
        MediaKind::Image => {
            let thumb = process::create_thumbnail(backend, config, &source, &thumb_target)?;
            steps.push(StepReport {
                label: "thumbnail",
                outcome: thumb,
            });

            metadata::extract_still(&source, || get_dimensions(backend, &source).ok(), mtime)
        }
    };

    let asset = MediaAsset {
        id: paths.id,
        url,
        thumb: paths.thumbnail,
        name: filename.to_string(),
        category: album.to_string(),
        display_time: metadata::format_display_time(&still.date),
        date: still.date,
        size: metadata::format_file_size(fs_meta.len()),
        width: still.width,
        height: still.height,
        asset_type: AssetType::from(kind),
        duration,
        exif: still.exif,
        source,
    };

    Ok(Some(ProcessedFile { asset, steps }))
}

/// List what a scan would process without writing anything.
pub fn check(layout: &ProjectLayout) -> Result<CheckReport, ScanError> {
    let photos_dir = layout.photos_dir();
    if !photos_dir.is_dir() {
        return Ok(CheckReport::default());
    }

    let albums = list_albums(&photos_dir)?
        .into_iter()
        .map(|name| match list_media_files(&photos_dir.join(&name)) {
            Ok(files) => AlbumListing {
                files: files
                    .into_iter()
                    .filter_map(|f| naming::classify(&f).map(|kind| (f, kind)))
                    .collect(),
                name,
                error: None,
            },
            Err(e) => AlbumListing {
                name,
                files: Vec::new(),
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(CheckReport {
        root_exists: true,
        albums,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::*;
    use crate::toolchain::ProbeResult;
    use crate::toolchain::tests::MockToolchain;
    use chrono::TimeZone;
    use std::fs;

    fn upright_probe() -> ProbeResult {
        ProbeResult {
            width: 1920,
            height: 1080,
            rotation: 0.0,
            duration: 4.5,
        }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    #[test]
    fn albums_sorted_hidden_and_files_ignored() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path();
        for dir in ["zoo", "alps", ".cache", "beach"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("notes.txt"), "x").unwrap();

        assert_eq!(list_albums(root).unwrap(), vec!["alps", "beach", "zoo"]);
    }

    #[test]
    fn media_files_filtered_and_sorted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let album = tmp.path();
        for name in ["b.JPG", "a.mov", "c.heic", "notes.txt", ".hidden.jpg", "d.webm"] {
            fs::write(album.join(name), "x").unwrap();
        }
        fs::create_dir(album.join("nested.jpg")).unwrap();

        assert_eq!(
            list_media_files(album).unwrap(),
            vec!["a.mov", "b.JPG", "c.heic", "d.webm"]
        );
    }

    #[test]
    fn listing_missing_album_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(list_media_files(&tmp.path().join("gone")).is_err());
    }

    // =========================================================================
    // Whole scans
    // =========================================================================

    #[test]
    fn missing_root_yields_empty_outcome() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        assert!(outcome.assets.is_empty());
        assert!(outcome.skipped_albums.is_empty());
        assert!(!layout.thumbs_dir().exists());
    }

    #[test]
    fn records_in_album_then_file_order() {
        let tmp = setup_library(&[
            ("trip", &["b.jpg", "a.jpg"]),
            ("home", &["c.png"]),
        ]);
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        assert_eq!(
            asset_keys(&outcome.assets),
            vec!["home/c.png", "trip/a.jpg", "trip/b.jpg"]
        );
    }

    #[test]
    fn image_record_fields() {
        let tmp = setup_library(&[("trip", &["a.jpg"])]);
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "a.jpg");
        assert_eq!(asset.id, naming::asset_id("trip", "a.jpg"));
        assert_eq!(asset.url, "photos/trip/a.jpg");
        assert_eq!(asset.thumb, "thumbs/trip/a.jpg.jpg");
        assert_eq!(asset.category, "trip");
        assert_eq!(asset.asset_type, AssetType::Image);
        assert_eq!((asset.width, asset.height), (LIBRARY_IMAGE_SIZE.0, LIBRARY_IMAGE_SIZE.1));
        assert_eq!(asset.duration, None);
        assert!(layout.resolve(&asset.thumb).exists());
        assert_eq!(outcome.stats.created, 1);
    }

    #[test]
    fn image_record_takes_date_and_camera_from_exif() {
        let tmp = setup_library(&[("trip", &["nikon.jpg", "plain.jpg"])]);
        let layout = test_layout(tmp.path());
        write_exif_jpeg(&layout.photos_dir().join("trip/nikon.jpg"), &camera_fields());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "nikon.jpg");
        let taken = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(asset.date, taken);
        assert_eq!(asset.display_time, metadata::format_display_time(&taken));
        assert_eq!((asset.width, asset.height), (6048, 4024));
        let exif = asset.exif.as_ref().unwrap();
        assert_eq!((exif.make.as_str(), exif.model.as_str()), ("NIKON", "Z 6"));
        assert_eq!(exif.iso, Some(400));
        let gps = exif.gps.unwrap();
        assert!((gps.lat - 35.5).abs() < 1e-9);
        assert!((gps.lng + 139.75).abs() < 1e-9);
        assert!(layout.resolve(&asset.thumb).exists());

        let plain = find_asset(&outcome.assets, "plain.jpg");
        assert_eq!(plain.exif, None);
        assert_eq!((plain.width, plain.height), LIBRARY_IMAGE_SIZE);
    }

    #[test]
    fn corrupt_file_does_not_affect_others() {
        let tmp = setup_library(&[("trip", &["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"])]);
        let layout = test_layout(tmp.path());
        let corrupt = layout.photos_dir().join("trip/3.jpg");
        fs::write(&corrupt, b"this is not a jpeg").unwrap();

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.assets.len(), 5);
        for name in ["1.jpg", "2.jpg", "4.jpg", "5.jpg"] {
            let asset = find_asset(&outcome.assets, name);
            assert_eq!(asset.width, LIBRARY_IMAGE_SIZE.0, "{name}");
            assert!(layout.resolve(&asset.thumb).exists(), "{name}");
        }

        let broken = find_asset(&outcome.assets, "3.jpg");
        assert_eq!((broken.width, broken.height), (0, 0));
        assert_eq!(broken.url, "photos/trip/3.jpg");
        assert_eq!(broken.exif, None);
        let mtime: DateTime<Utc> = fs::metadata(&corrupt).unwrap().modified().unwrap().into();
        assert_eq!(broken.date, mtime);
        assert!(!layout.resolve(&broken.thumb).exists());
        assert!(leftover_scratch_files(&layout).is_empty());
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.stats.created, 4);
    }

    #[test]
    fn second_run_does_no_encoding() {
        let tmp = setup_library(&[("trip", &["a.jpg", "clip.mov", "IMG.HEIC", "b.mp4"])]);
        let layout = test_layout(tmp.path());
        let config = GalleryConfig::default();
        let backend = RustBackend::new();

        let first_tools = MockToolchain::with_probe(upright_probe());
        let first = scan(&layout, &config, &first_tools, &backend, None).unwrap();
        assert!(first_tools.encode_count() > 0);
        assert!(leftover_scratch_files(&layout).is_empty());
        let snapshot = snapshot_outputs(&layout);

        let second_tools = MockToolchain::with_probe(upright_probe());
        let second = scan(&layout, &config, &second_tools, &backend, None).unwrap();

        assert_eq!(second_tools.encode_count(), 0);
        assert_eq!(second.stats.created, 0);
        assert_eq!(second.stats.reused, first.stats.created);
        assert_eq!(snapshot_outputs(&layout), snapshot);
        assert_eq!(asset_keys(&first.assets), asset_keys(&second.assets));
        for (a, b) in first.assets.iter().zip(&second.assets) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.url, b.url);
        }
    }

    #[test]
    fn video_record_uses_transcode_and_rotated_dimensions() {
        let tmp = setup_library(&[("trip", &["clip.MOV"])]);
        let layout = test_layout(tmp.path());
        let tools = MockToolchain::with_probe(ProbeResult {
            width: 1080,
            height: 1920,
            rotation: 90.0,
            duration: 12.5,
        });

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &tools,
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "clip.MOV");
        assert_eq!(asset.asset_type, AssetType::Video);
        assert_eq!(asset.url, "generated/trip/clip.MOV.mp4");
        assert_eq!(asset.thumb, "thumbs/trip/clip.MOV.jpg");
        assert_eq!((asset.width, asset.height), (1920, 1080));
        assert_eq!(asset.duration, Some(12.5));
        assert_eq!(asset.exif, None);
        assert!(layout.resolve(&asset.url).exists());
        assert!(layout.resolve(&asset.thumb).exists());
    }

    #[test]
    fn mp4_served_directly() {
        let tmp = setup_library(&[("trip", &["clip.mp4"])]);
        let layout = test_layout(tmp.path());
        let tools = MockToolchain::with_probe(upright_probe());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &tools,
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "clip.mp4");
        assert_eq!(asset.url, "photos/trip/clip.mp4");
        assert!(!layout.generated_dir().join("trip/clip.mp4.mp4").exists());
    }

    #[test]
    fn failed_transcode_serves_original_with_zero_dims() {
        let tmp = setup_library(&[("trip", &["clip.mov"])]);
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::failing(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "clip.mov");
        assert_eq!(asset.url, "photos/trip/clip.mov");
        assert_eq!((asset.width, asset.height), (0, 0));
        assert_eq!(asset.duration, None);
    }

    #[test]
    fn heic_record_served_as_converted_jpeg() {
        let tmp = setup_library(&[("trip", &["IMG_0001.HEIC"])]);
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "IMG_0001.HEIC");
        assert_eq!(asset.asset_type, AssetType::Image);
        assert_eq!(asset.url, "generated/trip/IMG_0001.HEIC.jpg");
        // No EXIF in the placeholder: dimensions come from the converted file.
        assert_eq!((asset.width, asset.height), (1920, 1080));
        assert!(layout.resolve(&asset.thumb).exists());
    }

    #[test]
    fn heic_conversion_failure_skips_thumbnail() {
        let tmp = setup_library(&[("trip", &["IMG_0001.HEIC"])]);
        let layout = test_layout(tmp.path());

        let outcome = scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::failing(),
            &RustBackend::new(),
            None,
        )
        .unwrap();

        let asset = find_asset(&outcome.assets, "IMG_0001.HEIC");
        assert_eq!(asset.url, "photos/trip/IMG_0001.HEIC");
        assert!(!layout.resolve(&asset.thumb).exists());
        assert_eq!(outcome.stats.failed, 1);
    }

    #[test]
    fn progress_events_cover_every_file() {
        let tmp = setup_library(&[("a", &["1.jpg", "2.jpg"]), ("b", &["3.jpg"])]);
        let layout = test_layout(tmp.path());
        let (tx, rx) = std::sync::mpsc::channel();

        scan(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::new(),
            &RustBackend::new(),
            Some(tx),
        )
        .unwrap();

        let events: Vec<ProcessEvent> = rx.iter().collect();
        let started = events
            .iter()
            .filter(|e| matches!(e, ProcessEvent::AlbumStarted { .. }))
            .count();
        let files = events
            .iter()
            .filter(|e| matches!(e, ProcessEvent::FileProcessed { .. }))
            .count();
        assert_eq!((started, files), (2, 3));
        assert!(matches!(
            &events[0],
            ProcessEvent::AlbumStarted { album, file_count: 2 } if album == "a"
        ));
    }

    #[test]
    fn unlistable_album_is_skipped_and_others_kept() {
        let tmp = setup_library(&[
            ("alps", &["a.jpg"]),
            ("locked", &["secret.jpg"]),
            ("zoo", &["z.jpg", "clip.mp4"]),
        ]);
        let layout = test_layout(tmp.path());
        let (tx, rx) = std::sync::mpsc::channel();
        let denied = |dir: &Path| {
            if dir.ends_with("locked") {
                Err(ScanError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                )))
            } else {
                list_media_files(dir)
            }
        };

        let outcome = scan_albums(
            &layout,
            &GalleryConfig::default(),
            &MockToolchain::with_probe(upright_probe()),
            &RustBackend::new(),
            Some(tx),
            denied,
        )
        .unwrap();

        assert_eq!(
            asset_keys(&outcome.assets),
            vec!["alps/a.jpg", "zoo/clip.mp4", "zoo/z.jpg"]
        );
        assert_eq!(outcome.skipped_albums, vec!["locked"]);
        assert!(outcome.skipped_files.is_empty());
        assert!(!layout.thumbs_dir().join("locked").exists());

        let events: Vec<ProcessEvent> = rx.iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            ProcessEvent::AlbumSkipped { album, reason }
                if album == "locked" && reason.contains("permission denied")
        )));
        assert!(!events.iter().any(|e| matches!(
            e,
            ProcessEvent::AlbumStarted { album, .. } if album == "locked"
        )));
    }

    #[test]
    fn check_lists_without_writing() {
        let tmp = setup_library(&[("trip", &["a.jpg", "clip.mov"])]);
        let layout = test_layout(tmp.path());
        fs::write(layout.photos_dir().join("trip/readme.md"), "x").unwrap();

        let report = check(&layout).unwrap();

        assert!(report.root_exists);
        assert_eq!(report.albums.len(), 1);
        assert_eq!(
            report.albums[0].files,
            vec![
                ("a.jpg".to_string(), MediaKind::Image),
                ("clip.mov".to_string(), MediaKind::Video),
            ]
        );
        assert!(!layout.thumbs_dir().exists());
        assert!(!layout.generated_dir().exists());
    }

    #[test]
    fn check_missing_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let report = check(&test_layout(tmp.path())).unwrap();
        assert!(!report.root_exists);
        assert!(report.albums.is_empty());
    }
}
