//! # gallery-scan
//!
//! Build-time media pipeline for a personal photo gallery. The filesystem is
//! the data source: every directory under `public/photos/` is an album, every
//! photo or video inside it becomes one record in a JSON manifest that a
//! static front-end reads.
//!
//! # Pipeline
//!
//! ```text
//! public/photos/<album>/<file>
//!   │
//!   ├─ naming     id + every derived path, from (album, filename) alone
//!   ├─ process    thumbnail / transcode / HEIC→JPEG, skipped when present
//!   ├─ metadata   EXIF or probe → date, dimensions, camera bag
//!   ▼
//! MediaAsset ──► manifest (sorted newest first, atomic write)
//! ```
//!
//! Albums are visited one at a time; files within an album run on the rayon
//! pool. A scan returns an explicit [`scan::ScanOutcome`] and touches no
//! global state.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | File classification, asset ids, derived path rules |
//! | [`scan`] | Album/file listing and the per-file pipeline |
//! | [`process`] | Derived-file operations with cache checks and outcomes |
//! | [`cache`] | Freshness of derived files, partial-write commit, run stats |
//! | [`imaging`] | `image` crate backend: identify, thumbnail, JPEG conversion |
//! | [`toolchain`] | External ffmpeg/ffprobe behind the [`toolchain::MediaToolchain`] trait |
//! | [`metadata`] | EXIF reading, video rotation rule, display formatting |
//! | [`manifest`] | Sorting, atomic write, read-back and summary |
//! | [`config`] | `gallery.toml` loading, merging and validation |
//! | [`types`] | The [`types::MediaAsset`] record and its JSON shape |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Derived Files Are the Cache
//!
//! A thumbnail, transcode or conversion that exists on disk is done. There is
//! no index file to drift out of sync, and deleting `thumbs/` is a complete
//! cache reset. Outputs are written to a hidden partial file and renamed into
//! place, so an interrupted run never leaves a truncated file that would pass
//! the existence check.
//!
//! ## Append-Only Naming
//!
//! Derived names append an extension to the full original filename
//! (`a.HEIC` → `a.HEIC.jpg`). `a.jpg` and `a.jpeg` in one album therefore
//! never collide on a thumbnail.
//!
//! ## Stable Identity
//!
//! Asset ids hash `album/filename`, so links into the gallery survive
//! re-scans, machine moves and reordering.
//!
//! ## Degrade, Don't Abort
//!
//! A corrupt photo or a video ffmpeg cannot read still gets a record, with
//! zero dimensions, no camera data and its modification time as date. Only
//! problems that would make the whole output wrong (unwritable output
//! directories, an unwritable manifest, an invalid config) stop a run.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod toolchain;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
