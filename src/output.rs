//! CLI output formatting for every command.
//!
//! # Album-First Display
//!
//! Output mirrors the library on disk: albums are headers, files are
//! indexed lines beneath them, and per-file detail (derived-file status,
//! classification) is indented context. Scan progress, `check`, and the
//! final summary all use the same shapes so one file looks the same
//! wherever it appears.
//!
//! # Output Format
//!
//! ## Scan progress
//!
//! ```text
//! 2023-japan (3 files)
//!     001 IMG_0001.HEIC
//!         heic: generated
//!         thumbnail: generated
//!     002 IMG_0002.jpg
//!         thumbnail: cached
//!     003 IMG_0003.MOV
//!         transcode: failed
//!         thumbnail: generated
//! family: skipped (permission denied)
//! ```
//!
//! ## Check
//!
//! ```text
//! Albums
//! 001 2023-japan (3 files)
//!     001 IMG_0001.HEIC (heic)
//!     002 IMG_0002.jpg (image)
//!     003 IMG_0003.MOV (video, transcode)
//! ```
//!
//! ## Report
//!
//! ```text
//! Manifest: src/assets/photos.json
//! Records: 120 (112 images, 8 videos)
//!
//! Categories
//!     2023-japan: 80
//!     family: 40
//!
//! Integrity
//!     category: 120/120 (100%)
//!     display time: 120/120 (100%)
//!     camera: 97/120 (81%)
//!     gps: 12/120 (10%)
//!     dimensions: 119/120 (99%)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::manifest::ManifestSummary;
use crate::naming::{self, MediaKind};
use crate::process::{Outcome, ProcessEvent};
use crate::scan::{CheckReport, ScanOutcome};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Album header with its file count.
///
/// ```text
/// 2023-japan (3 files)
/// ```
fn album_header(album: &str, count: usize) -> String {
    format!("{} ({})", album, plural(count, "file"))
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Created => "generated",
        Outcome::Reused => "cached",
        Outcome::Failed => "failed",
        Outcome::Skipped => "skipped",
    }
}

/// `part/total (pct%)`, rounded to the nearest percent.
fn ratio(part: usize, total: usize) -> String {
    let pct = if total == 0 {
        0
    } else {
        (part as f64 / total as f64 * 100.0).round() as u32
    };
    format!("{}/{} ({}%)", part, total, pct)
}

// ============================================================================
// scan
// ============================================================================

/// Format a single scan progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::AlbumStarted { album, file_count } => {
            vec![album_header(album, *file_count)]
        }
        ProcessEvent::AlbumSkipped { album, reason } => {
            vec![format!("{}: skipped ({})", album, reason)]
        }
        ProcessEvent::FileProcessed {
            index,
            filename,
            steps,
            ..
        } => {
            let mut lines = vec![format!("{}{} {}", indent(1), format_index(*index), filename)];
            for step in steps {
                lines.push(format!(
                    "{}{}: {}",
                    indent(2),
                    step.label,
                    outcome_label(step.outcome)
                ));
            }
            lines
        }
    }
}

/// Format the end-of-scan summary.
///
/// ```text
/// Scanned 120 files in 2 albums
/// Derived files: 110 cached, 9 generated (120 total), 1 failed
/// Manifest: src/assets/photos.json
/// ```
pub fn format_scan_summary(outcome: &ScanOutcome, manifest_path: &Path) -> Vec<String> {
    let albums = outcome
        .assets
        .iter()
        .map(|a| a.category.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let mut lines = vec![
        format!(
            "Scanned {} in {}",
            plural(outcome.assets.len(), "file"),
            plural(albums, "album")
        ),
        format!("Derived files: {}", outcome.stats),
    ];
    if !outcome.skipped_albums.is_empty() {
        lines.push(format!(
            "Skipped albums: {}",
            outcome.skipped_albums.join(", ")
        ));
    }
    if !outcome.skipped_files.is_empty() {
        lines.push("Skipped files:".to_string());
        for file in &outcome.skipped_files {
            lines.push(format!("{}{}", indent(1), file));
        }
    }
    lines.push(format!("Manifest: {}", manifest_path.display()));
    lines
}

pub fn print_scan_summary(outcome: &ScanOutcome, manifest_path: &Path) {
    for line in format_scan_summary(outcome, manifest_path) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Classification detail shown after a file name in `check` output.
fn kind_detail(filename: &str, kind: MediaKind) -> String {
    if kind.is_video() && naming::needs_transcode(filename) {
        format!("{}, transcode", kind.label())
    } else {
        kind.label().to_string()
    }
}

/// Format the dry-run listing of what a scan would process.
pub fn format_check_output(report: &CheckReport, photos_dir: &Path) -> Vec<String> {
    if !report.root_exists {
        return vec![format!(
            "No media root at {}; nothing to scan",
            photos_dir.display()
        )];
    }
    if report.albums.is_empty() {
        return vec![format!("No albums in {}", photos_dir.display())];
    }

    let mut lines = vec!["Albums".to_string()];
    for (i, album) in report.albums.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), album.name);
        if let Some(error) = &album.error {
            lines.push(format!("{}: unreadable ({})", header, error));
            continue;
        }
        lines.push(format!(
            "{} ({})",
            header,
            plural(album.files.len(), "file")
        ));
        for (j, (filename, kind)) in album.files.iter().enumerate() {
            lines.push(format!(
                "{}{} {} ({})",
                indent(1),
                format_index(j + 1),
                filename,
                kind_detail(filename, *kind)
            ));
        }
    }
    lines
}

pub fn print_check_output(report: &CheckReport, photos_dir: &Path) {
    for line in format_check_output(report, photos_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// report
// ============================================================================

/// Format the manifest integrity and category report.
pub fn format_report(summary: &ManifestSummary, manifest_path: &Path) -> Vec<String> {
    let total = summary.total;
    let mut lines = vec![
        format!("Manifest: {}", manifest_path.display()),
        format!(
            "Records: {} ({}, {})",
            total,
            plural(summary.images, "image"),
            plural(summary.videos, "video")
        ),
    ];

    if !summary.categories.is_empty() {
        lines.push(String::new());
        lines.push("Categories".to_string());
        for (category, count) in &summary.categories {
            lines.push(format!("{}{}: {}", indent(1), category, count));
        }
    }

    lines.push(String::new());
    lines.push("Integrity".to_string());
    let checks = [
        ("category", summary.with_category),
        ("display time", summary.with_display_time),
        ("camera", summary.with_camera),
        ("gps", summary.with_gps),
        ("dimensions", total - summary.missing_dimensions),
    ];
    for (label, count) in checks {
        lines.push(format!("{}{}: {}", indent(1), label, ratio(count, total)));
    }
    lines
}

pub fn print_report(summary: &ManifestSummary, manifest_path: &Path) {
    for line in format_report(summary, manifest_path) {
        println!("{}", line);
    }
}
