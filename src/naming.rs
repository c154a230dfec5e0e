//! Stable identity and output naming for media files.
//!
//! Every path the pipeline writes or publishes is derived here from the pair
//! `(album, filename)`. Nothing in this module touches the filesystem.
//!
//! ## Naming rules
//!
//! | Artifact | Relative path |
//! |----------|---------------|
//! | Original | `photos/<album>/<filename>` |
//! | Thumbnail | `thumbs/<album>/<filename>.jpg` |
//! | Transcoded video | `generated/<album>/<filename>.mp4` |
//! | Converted HEIC | `generated/<album>/<filename>.jpg` |
//!
//! Derived names always *append* an extension to the full original filename.
//! `IMG_01.HEIC.mov` becomes `IMG_01.HEIC.mov.jpg`, never `IMG_01.HEIC.jpg`,
//! so two sources in the same album can never share a derived path.
//!
//! ## Identifiers
//!
//! The asset id is the first [`ID_LEN`] hex characters of
//! SHA-256(`"<album>/<filename>"`). Deep links in the front-end survive
//! re-scans as long as the file keeps its name and album.

use sha2::{Digest, Sha256};

/// Length of the hex asset identifier.
pub const ID_LEN: usize = 12;

pub const PHOTOS_PREFIX: &str = "photos";
pub const THUMBS_PREFIX: &str = "thumbs";
pub const GENERATED_PREFIX: &str = "generated";

const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "webm"];
const HEIC_EXTENSIONS: &[&str] = &["heic", "heif"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// What kind of processing a source file needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Browser-viewable still (jpg, jpeg, png, webp).
    Image,
    /// HEIC/HEIF still, served through a JPEG conversion.
    Heic,
    /// Video, served as mp4 (transcoded unless already mp4).
    Video,
}

impl MediaKind {
    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Heic => "heic",
            MediaKind::Video => "video",
        }
    }
}

/// Lowercased final extension of a filename, if any.
fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classify a filename by its extension (case-insensitive).
///
/// Returns `None` for files the pipeline ignores.
pub fn classify(filename: &str) -> Option<MediaKind> {
    let ext = extension(filename)?;
    let ext = ext.as_str();
    if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if HEIC_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Heic)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Whether a video must be transcoded before it can be served.
///
/// mp4 is the delivery format; everything else goes through the encoder.
pub fn needs_transcode(filename: &str) -> bool {
    extension(filename).as_deref() != Some("mp4")
}

/// Deterministic asset id for `(album, filename)`.
pub fn asset_id(album: &str, filename: &str) -> String {
    let digest = Sha256::digest(format!("{}/{}", album, filename).as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(ID_LEN);
    hex
}

/// All relative paths derived from one source file.
///
/// Paths use `/` separators; they double as URLs relative to the public
/// directory and as filesystem paths once joined onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub id: String,
    /// Original file, served when no derived asset replaces it.
    pub served: String,
    pub thumbnail: String,
    /// Target of a video transcode.
    pub transcoded: String,
    /// Target of a HEIC → JPEG conversion.
    pub converted: String,
}

/// Derive the id and every output path for a source file.
pub fn derive_paths(album: &str, filename: &str) -> AssetPaths {
    AssetPaths {
        id: asset_id(album, filename),
        served: format!("{}/{}/{}", PHOTOS_PREFIX, album, filename),
        thumbnail: format!("{}/{}/{}.jpg", THUMBS_PREFIX, album, filename),
        transcoded: format!("{}/{}/{}.mp4", GENERATED_PREFIX, album, filename),
        converted: format!("{}/{}/{}.jpg", GENERATED_PREFIX, album, filename),
    }
}
