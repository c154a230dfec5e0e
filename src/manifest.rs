//! The published manifest: ordering, atomic write, read-back, summary.
//!
//! The manifest is a pretty-printed JSON array of [`MediaAsset`] records,
//! newest first. It is the only durable output of a scan; derived files are
//! a cache, the manifest is the product.
//!
//! Writes go to `<path>.tmp` in the same directory and are renamed over the
//! destination, so readers see either the previous manifest or the new one,
//! never a truncated file.

use crate::types::MediaAsset;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot write manifest {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Order records by `date`, newest first. Stable: equal dates keep their
/// scan order.
pub fn sort_assets(assets: &mut [MediaAsset]) {
    assets.sort_by(|a, b| b.date.cmp(&a.date));
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace the manifest at `path` with `assets`.
pub fn write_manifest(path: &Path, assets: &[MediaAsset]) -> Result<(), ManifestError> {
    let write_err = |source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(assets)?;
    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, path)) {
        crate::cache::discard(&tmp);
        return Err(write_err(e));
    }
    log::debug!("wrote {} records to {}", assets.len(), path.display());
    Ok(())
}

/// Load a previously written manifest.
pub fn read_manifest(path: &Path) -> Result<Vec<MediaAsset>, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Integrity and category counts over a set of records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub total: usize,
    /// Records per album, by album name.
    pub categories: BTreeMap<String, usize>,
    pub images: usize,
    pub videos: usize,
    pub with_category: usize,
    pub with_display_time: usize,
    pub with_camera: usize,
    pub with_gps: usize,
    /// Records whose dimensions could not be determined.
    pub missing_dimensions: usize,
}

pub fn summarize(assets: &[MediaAsset]) -> ManifestSummary {
    let mut summary = ManifestSummary {
        total: assets.len(),
        ..Default::default()
    };

    for asset in assets {
        if asset.is_video() {
            summary.videos += 1;
        } else {
            summary.images += 1;
        }
        if !asset.category.is_empty() {
            summary.with_category += 1;
            *summary
                .categories
                .entry(asset.category.clone())
                .or_default() += 1;
        }
        if !asset.display_time.is_empty() {
            summary.with_display_time += 1;
        }
        if let Some(exif) = &asset.exif {
            summary.with_camera += 1;
            if exif.gps.is_some() {
                summary.with_gps += 1;
            }
        }
        if asset.width == 0 || asset.height == 0 {
            summary.missing_dimensions += 1;
        }
    }
    summary
}
