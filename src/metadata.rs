//! Metadata extraction and display formatting.
//!
//! Stills and videos get their manifest fields from different places:
//!
//! ## Stills (image and HEIC)
//!
//! Embedded EXIF is read with `kamadak-exif` straight from the container
//! (JPEG, PNG, WebP, TIFF and HEIF all work). Each field falls back
//! independently:
//!
//! - **date**: `DateTimeOriginal` → `DateTimeDigitized` → file mtime.
//!   EXIF stores wall-clock time; the matching `OffsetTime*` tag is applied
//!   when present, otherwise the local time zone of the machine running the
//!   scan.
//! - **dimensions**: `PixelXDimension`/`PixelYDimension` → `ImageWidth`/
//!   `ImageLength` → decoded size of the served file → 0.
//! - **camera bag**: make, model, ISO, focal length, aperture, shutter, GPS.
//!   A file without readable EXIF gets no bag at all (`{}` in the manifest).
//!
//! ## Videos
//!
//! Dimensions and duration come from a container probe. Phone footage is
//! often stored landscape with a rotation hint; for a ±90° or ±270° hint
//! (within 1°) width and height are swapped so the manifest carries display
//! dimensions. Videos never get a camera bag.
//!
//! ## Formatting
//!
//! Values are pre-formatted for display so the front-end prints them
//! verbatim: `35mm`, `f/1.8`, `1/200`, `2s`, `3.5 MB`, `2023-01-02 10:00`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use exif::{Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::toolchain::ProbeResult;
use crate::types::{CameraExif, GpsPoint};

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
/// Placeholder for optics values the camera did not record.
const MISSING: &str = "-";

/// Everything read from a still's EXIF block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifSummary {
    pub captured: Option<DateTime<Utc>>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub camera: CameraExif,
}

/// Resolved metadata for an image or HEIC record.
#[derive(Debug, Clone, PartialEq)]
pub struct StillMetadata {
    pub date: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub exif: Option<CameraExif>,
}

/// Display dimensions and length of a video.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Seconds; `None` when the probe did not report a usable duration.
    pub duration: Option<f64>,
}

// =============================================================================
// EXIF
// =============================================================================

/// Read the EXIF block of a still. Any failure means "no EXIF".
pub fn read_exif(path: &Path) -> Option<ExifSummary> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("no EXIF in {}: {}", path.display(), e);
            return None;
        }
    };
    Some(summarize_exif(&exif))
}

fn summarize_exif(exif: &Exif) -> ExifSummary {
    let captured = exif_date(exif, Tag::DateTimeOriginal, Tag::OffsetTimeOriginal)
        .or_else(|| exif_date(exif, Tag::DateTimeDigitized, Tag::OffsetTimeDigitized));

    let width = uint(exif, Tag::PixelXDimension).or_else(|| uint(exif, Tag::ImageWidth));
    let height = uint(exif, Tag::PixelYDimension).or_else(|| uint(exif, Tag::ImageLength));

    let make = clean_make(&ascii(exif, Tag::Make).unwrap_or_default());
    let model = clean_model(&ascii(exif, Tag::Model).unwrap_or_default(), &make);

    let camera = CameraExif {
        make,
        model,
        iso: uint(exif, Tag::PhotographicSensitivity),
        focal: format_focal(rational(exif, Tag::FocalLength)),
        fstop: format_fstop(rational(exif, Tag::FNumber)),
        shutter: format_shutter(rational(exif, Tag::ExposureTime)),
        gps: gps(exif),
    };

    ExifSummary {
        captured,
        width,
        height,
        camera,
    }
}

/// First ASCII value of a tag, trimmed of padding and NULs.
fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref v) => v.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string()
        }),
        _ => None,
    }
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .filter(|v| *v > 0)
}

/// First rational value as a positive finite float.
fn rational(exif: &Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let value = match field.value {
        Value::Rational(ref v) => v.first().map(|r| r.to_f64()),
        _ => None,
    };
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn exif_date(exif: &Exif, tag: Tag, offset_tag: Tag) -> Option<DateTime<Utc>> {
    let raw = ascii(exif, tag)?;
    parse_exif_datetime(&raw, ascii(exif, offset_tag).as_deref())
}

/// Parse `YYYY:MM:DD HH:MM:SS`, applying an `±HH:MM` offset when given and
/// the local time zone otherwise.
pub fn parse_exif_datetime(raw: &str, offset: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(offset) = offset.map(str::trim).filter(|o| !o.is_empty())
        && let Ok(dt) =
            DateTime::parse_from_str(&format!("{} {}", raw, offset), "%Y:%m:%d %H:%M:%S %:z")
    {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, EXIF_DATE_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decimal degrees from the GPS IFD, south and west negative.
fn gps(exif: &Exif) -> Option<GpsPoint> {
    let mut lat = dms(exif, Tag::GPSLatitude)?;
    let mut lng = dms(exif, Tag::GPSLongitude)?;

    if ascii(exif, Tag::GPSLatitudeRef).is_some_and(|r| r.starts_with('S')) {
        lat = -lat;
    }
    if ascii(exif, Tag::GPSLongitudeRef).is_some_and(|r| r.starts_with('W')) {
        lng = -lng;
    }

    // A zeroed GPS block is what many cameras write when they had no fix.
    if lat == 0.0 || lng == 0.0 {
        return None;
    }
    Some(GpsPoint { lat, lng })
}

fn dms(exif: &Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Rational(ref v) if v.len() >= 3 => {
            let deg = v[0].to_f64() + v[1].to_f64() / 60.0 + v[2].to_f64() / 3600.0;
            deg.is_finite().then_some(deg)
        }
        _ => None,
    }
}

// =============================================================================
// Resolution with fallbacks
// =============================================================================

/// Resolve date, dimensions and camera bag for a still.
///
/// `fallback_dims` is only consulted when EXIF carries no dimensions; it
/// typically decodes the header of the served file.
pub fn extract_still(
    source: &Path,
    fallback_dims: impl FnOnce() -> Option<(u32, u32)>,
    mtime: DateTime<Utc>,
) -> StillMetadata {
    let summary = read_exif(source);

    let exif_dims = summary.as_ref().and_then(|s| s.width.zip(s.height));
    let (width, height) = exif_dims.or_else(fallback_dims).unwrap_or((0, 0));

    match summary {
        Some(summary) => StillMetadata {
            date: summary.captured.unwrap_or(mtime),
            width,
            height,
            exif: Some(summary.camera),
        },
        None => StillMetadata {
            date: mtime,
            width,
            height,
            exif: None,
        },
    }
}

/// Display dimensions and duration from a probe result.
///
/// A failed probe (`None`) yields zeros.
pub fn video_metadata(probe: Option<ProbeResult>) -> VideoMetadata {
    let Some(probe) = probe else {
        return VideoMetadata::default();
    };

    let (width, height) = if is_quarter_turn(probe.rotation) {
        (probe.height, probe.width)
    } else {
        (probe.width, probe.height)
    };

    VideoMetadata {
        width,
        height,
        duration: (probe.duration > 0.0).then_some(probe.duration),
    }
}

/// Whether a rotation hint is within 1° of 90 or 270 (sign-insensitive).
fn is_quarter_turn(rotation: f64) -> bool {
    if !rotation.is_finite() {
        return false;
    }
    let normalized = rotation.rem_euclid(360.0);
    (normalized - 90.0).abs() < 1.0 || (normalized - 270.0).abs() < 1.0
}

// =============================================================================
// Display formatting
// =============================================================================

/// Drop the `CORPORATION` token some vendors put in `Make`.
pub fn clean_make(make: &str) -> String {
    make.replacen("CORPORATION", "", 1).trim().to_string()
}

/// Drop a make the model starts with (`Canon EOS R5` → `EOS R5`).
pub fn clean_model(model: &str, make: &str) -> String {
    let model = model.trim();
    if make.is_empty() {
        return model.to_string();
    }
    model.strip_prefix(make).unwrap_or(model).trim().to_string()
}

/// `35mm`, rounded to whole millimetres.
pub fn format_focal(mm: Option<f64>) -> String {
    match mm {
        Some(mm) => format!("{}mm", mm.round()),
        None => MISSING.to_string(),
    }
}

/// `f/1.8`, `f/2`.
pub fn format_fstop(f_number: Option<f64>) -> String {
    match f_number {
        Some(f) => format!("f/{}", trim_decimals(f, 2)),
        None => MISSING.to_string(),
    }
}

/// `1/200` below one second, `2s` or `1.5s` at or above it.
pub fn format_shutter(seconds: Option<f64>) -> String {
    match seconds {
        Some(t) if t >= 1.0 => format!("{}s", trim_decimals(t, 1)),
        Some(t) => format!("1/{}", (1.0 / t).round()),
        None => MISSING.to_string(),
    }
}

/// Human-readable size in base 1024: `0 B`, `1.5 KB`, `3.25 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(value, 2), SIZE_UNITS[unit])
}

/// `date` in the local time zone as `YYYY-MM-DD HH:MM`.
pub fn format_display_time(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format(DISPLAY_TIME_FORMAT)
        .to_string()
}

/// Fixed decimals with trailing zeros (and a bare point) removed.
fn trim_decimals(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}
