//! Shared test utilities for the gallery-scan test suite.
//!
//! Builds throwaway libraries on disk and looks records up by name.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_library(&[
//!     ("2023-japan", &["IMG_0001.HEIC", "IMG_0002.jpg"]),
//!     ("family", &["clip.mov"]),
//! ]);
//! let layout = test_layout(tmp.path());
//! let outcome = scan(&layout, &config, &toolchain, &backend, None).unwrap();
//!
//! let asset = find_asset(&outcome.assets, "IMG_0002.jpg");
//! assert_eq!(asset.category, "2023-japan");
//! ```

use exif::{Field, In, Rational, Tag, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::{PathsConfig, ProjectLayout};
use crate::naming::{self, MediaKind};
use crate::toolchain::tests::write_test_jpeg;
use crate::types::MediaAsset;

/// Pixel size of every generated library still.
pub const LIBRARY_IMAGE_SIZE: (u32, u32) = (64, 48);

// =========================================================================
// Fixture setup
// =========================================================================

/// Layout with the default `public/` and manifest locations under `root`.
pub fn test_layout(root: &Path) -> ProjectLayout {
    ProjectLayout::new(root, &PathsConfig::default())
}

/// Create a temp project with `public/photos/<album>/<file>` for each entry.
///
/// Browser stills are real images in the format their extension names, so
/// decoding and thumbnailing work on them. HEIC and video files are opaque
/// placeholders; only a toolchain can read those.
pub fn setup_library(albums: &[(&str, &[&str])]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let photos = test_layout(tmp.path()).photos_dir();
    for (album, files) in albums {
        let dir = photos.join(album);
        fs::create_dir_all(&dir).unwrap();
        for file in *files {
            write_media(&dir.join(file));
        }
    }
    tmp
}

/// Write a file whose content matches what its name claims to be.
pub fn write_media(path: &Path) {
    let name = path.file_name().unwrap().to_str().unwrap();
    let (w, h) = LIBRARY_IMAGE_SIZE;
    match naming::classify(name) {
        Some(MediaKind::Image) => {
            let lower = name.to_ascii_lowercase();
            if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
                write_test_jpeg(path, w, h);
            } else {
                let format = image::ImageFormat::from_path(path).unwrap();
                image::RgbImage::from_pixel(w, h, image::Rgb([200, 80, 40]))
                    .save_with_format(path, format)
                    .unwrap();
            }
        }
        Some(MediaKind::Heic) => fs::write(path, b"placeholder heic").unwrap(),
        Some(MediaKind::Video) => fs::write(path, b"placeholder video").unwrap(),
        None => fs::write(path, b"not media").unwrap(),
    }
}

// =========================================================================
// EXIF fixtures
// =========================================================================

/// Write a library-sized JPEG carrying `fields` in an APP1 EXIF segment.
pub fn write_exif_jpeg(path: &Path, fields: &[Field]) {
    let (w, h) = LIBRARY_IMAGE_SIZE;
    write_test_jpeg(path, w, h);
    let jpeg = fs::read(path).unwrap();

    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    // SOI, then APP1: marker, big-endian length (itself included), payload.
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&u16::try_from(2 + 6 + tiff.len()).unwrap().to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    fs::write(path, out).unwrap();
}

pub fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

pub fn rational_field(tag: Tag, parts: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            parts
                .iter()
                .map(|&(num, denom)| Rational { num, denom })
                .collect(),
        ),
    }
}

pub fn uint_field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

/// A Nikon Z 6 frame taken 2021-03-04 05:06:07 UTC at 35°30′N 139°45′W.
pub fn camera_fields() -> Vec<Field> {
    vec![
        ascii_field(Tag::Make, "NIKON CORPORATION"),
        ascii_field(Tag::Model, "NIKON Z 6"),
        ascii_field(Tag::DateTimeOriginal, "2021:03:04 05:06:07"),
        ascii_field(Tag::OffsetTimeOriginal, "+00:00"),
        ascii_field(Tag::DateTimeDigitized, "2020:01:01 00:00:00"),
        rational_field(Tag::ExposureTime, &[(1, 200)]),
        rational_field(Tag::FNumber, &[(18, 10)]),
        rational_field(Tag::FocalLength, &[(354, 10)]),
        uint_field(Tag::PhotographicSensitivity, Value::Short(vec![400])),
        uint_field(Tag::PixelXDimension, Value::Long(vec![6048])),
        uint_field(Tag::PixelYDimension, Value::Long(vec![4024])),
        ascii_field(Tag::GPSLatitudeRef, "N"),
        rational_field(Tag::GPSLatitude, &[(35, 1), (30, 1), (0, 1)]),
        ascii_field(Tag::GPSLongitudeRef, "W"),
        rational_field(Tag::GPSLongitude, &[(139, 1), (45, 1), (0, 1)]),
    ]
}

/// [`camera_fields`] with `tag` replaced by `field`, or dropped when `None`.
pub fn camera_fields_with(tag: Tag, field: Option<Field>) -> Vec<Field> {
    let mut fields: Vec<Field> = camera_fields().into_iter().filter(|f| f.tag != tag).collect();
    fields.extend(field);
    fields
}

// =========================================================================
// Record lookups: panic with a clear message on miss
// =========================================================================

/// Find a record by original filename. Panics if not found.
pub fn find_asset<'a>(assets: &'a [MediaAsset], name: &str) -> &'a MediaAsset {
    assets.iter().find(|a| a.name == name).unwrap_or_else(|| {
        panic!("asset '{name}' not found. Available: {:?}", asset_keys(assets))
    })
}

/// `category/name` of each record, in order.
pub fn asset_keys(assets: &[MediaAsset]) -> Vec<String> {
    assets
        .iter()
        .map(|a| format!("{}/{}", a.category, a.name))
        .collect()
}

// =========================================================================
// Output snapshots
// =========================================================================

/// Contents of every file under `thumbs/` and `generated/`, keyed by path.
///
/// Equal snapshots before and after a run mean nothing was rewritten.
pub fn snapshot_outputs(layout: &ProjectLayout) -> BTreeMap<PathBuf, Vec<u8>> {
    [layout.thumbs_dir(), layout.generated_dir()]
        .iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(Result::ok))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let bytes = fs::read(entry.path()).unwrap();
            (entry.into_path(), bytes)
        })
        .collect()
}

/// Hidden leftovers (partials, scratch frames) under the output trees.
pub fn leftover_scratch_files(layout: &ProjectLayout) -> Vec<PathBuf> {
    snapshot_outputs(layout)
        .into_keys()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect()
}
