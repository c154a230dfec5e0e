//! Derived-file cache for incremental runs.
//!
//! Transcoding and thumbnailing dominate a scan: one phone video can take
//! minutes through the encoder. The files already sitting in `thumbs/` and
//! `generated/` *are* the cache. There is no separate index; a derived file
//! that exists is considered done.
//!
//! # Freshness
//!
//! [`freshness`] classifies a target relative to its source:
//!
//! - [`Freshness::Missing`]: no target on disk, generate it.
//! - [`Freshness::Fresh`]: target exists, skip all work.
//! - [`Freshness::Stale`]: target exists but the source was modified after
//!   it. Only reported when `processing.refresh_stale` is on; by default an
//!   existing target is always fresh.
//!
//! # Partial outputs
//!
//! Encoders write to a hidden sibling (see [`partial_path`]) and the result is
//! renamed over the target only on success. A crashed or timed-out run can
//! leave a `.partial` file behind but never a truncated target, so the
//! existence check stays trustworthy.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Cache state of one derived file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    Fresh,
    Stale,
}

impl Freshness {
    pub fn needs_work(self) -> bool {
        self != Freshness::Fresh
    }
}

/// Decide whether `target` must be (re)generated from `source`.
///
/// Only existence counts unless `refresh_stale` is set, in which case a
/// source with a newer mtime than the target makes it [`Freshness::Stale`].
/// Unreadable mtimes never force regeneration.
pub fn freshness(source: &Path, target: &Path, refresh_stale: bool) -> Freshness {
    let Ok(target_meta) = fs::metadata(target) else {
        return Freshness::Missing;
    };
    if !refresh_stale {
        return Freshness::Fresh;
    }

    let source_mtime = fs::metadata(source).and_then(|m| m.modified());
    let target_mtime = target_meta.modified();
    match (source_mtime, target_mtime) {
        (Ok(src), Ok(tgt)) if src > tgt => Freshness::Stale,
        _ => Freshness::Fresh,
    }
}

/// Hidden in-progress sibling of `target`, keeping its extension so encoders
/// that pick a format from the filename still do the right thing.
///
/// `thumbs/trip/a.jpg.jpg` → `thumbs/trip/.a.jpg.jpg.partial.jpg`
pub fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    target.with_file_name(format!(".{}.partial{}", name, ext))
}

/// Move a finished partial file over its target.
pub fn commit_partial(partial: &Path, target: &Path) -> io::Result<()> {
    fs::rename(partial, target)
}

/// Remove a leftover partial or temporary file, ignoring absence.
pub fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        log::warn!("could not remove {}: {}", path.display(), e);
    }
}

/// Summary of derived-file work for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationStats {
    pub created: u32,
    pub reused: u32,
    pub failed: u32,
}

impl GenerationStats {
    pub fn created(&mut self) {
        self.created += 1;
    }

    pub fn reused(&mut self) {
        self.reused += 1;
    }

    pub fn failed(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.created + self.reused + self.failed
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "nothing to generate");
        }
        if self.reused > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.reused,
                self.created,
                self.total()
            )?;
        } else {
            write!(f, "{} generated", self.created)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}
