//! Manifest record types.
//!
//! [`MediaAsset`] is the one external contract of the pipeline: the front-end
//! reads an array of them from the manifest, indexes by `id`, groups by
//! `category` and by `date`. Field names and shapes here are that contract.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use crate::naming::MediaKind;

/// How the front-end renders an asset. HEIC sources are plain images once
/// converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Video,
}

impl From<MediaKind> for AssetType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Video => AssetType::Video,
            MediaKind::Image | MediaKind::Heic => AssetType::Image,
        }
    }
}

/// GPS position in decimal degrees (south/west negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Camera settings shown on the photo detail view.
///
/// Missing optics values are rendered as `"-"` so the front-end can print
/// them without null checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraExif {
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    pub focal: String,
    pub fstop: String,
    #[serde(deserialize_with = "shutter::deserialize")]
    pub shutter: String,
    pub gps: Option<GpsPoint>,
}

/// One photo or video in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,
    /// Viewable/playable file, relative to the public directory.
    pub url: String,
    pub thumb: String,
    /// Original filename.
    pub name: String,
    /// Album the file was found in.
    pub category: String,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
    /// `date` in local time as `YYYY-MM-DD HH:MM`, ready for display.
    /// Empty in manifests written before the field existed.
    #[serde(default)]
    pub display_time: String,
    pub size: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// Video length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Camera metadata; serialized as `{}` when there is none.
    #[serde(default, with = "empty_object")]
    pub exif: Option<CameraExif>,
    /// Absolute source path. Scan-local, never written.
    #[serde(skip)]
    pub source: PathBuf,
}

impl MediaAsset {
    pub fn is_video(&self) -> bool {
        self.asset_type == AssetType::Video
    }
}

/// `DateTime<Utc>` as `2023-01-02T10:00:00.000Z`, the same shape
/// `Date.prototype.toJSON` produces.
mod iso_millis {
    use super::*;

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Shutter text, also accepting the bare number of seconds older manifests
/// stored for exposures of a second or more.
mod shutter {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(f64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Raw::deserialize(d)? {
            Raw::Text(text) => text,
            Raw::Seconds(secs) if secs > 0.0 => crate::metadata::format_shutter(Some(secs)),
            Raw::Seconds(_) => crate::metadata::format_shutter(None),
        })
    }
}

/// `Option<CameraExif>` where `None` is the empty object `{}` rather than
/// `null`, matching what the front-end has always received.
mod empty_object {
    use super::*;
    use serde::ser::SerializeMap;

    pub fn serialize<S: Serializer>(exif: &Option<CameraExif>, s: S) -> Result<S::Ok, S::Error> {
        match exif {
            Some(exif) => exif.serialize(s),
            None => s.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CameraExif>, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
            other => CameraExif::deserialize(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
