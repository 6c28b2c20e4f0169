use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::ConfigError;

/// Runtime hosting the picked file, which decides how it is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser-hosted runtime: the file is a fetchable URI
    Web,
    /// Native mobile runtime: the file is read through the OS file API
    Native,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Native => "native",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Native
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "native" | "ios" | "android" => Ok(Platform::Native),
            _ => Err(ConfigError::InvalidValue {
                key: "platform".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Kind of media being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extension appended to generated names
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    /// Content type sent with the stored object
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Collection existing objects of this kind live in
    pub fn default_collection(&self) -> &'static str {
        match self {
            MediaKind::Image => "imagens",
            MediaKind::Video => "videos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Whether a picked path looks like this kind of media
    pub fn accepts_path(&self, path: &str) -> bool {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let Some(ext) = ext else {
            return false;
        };

        match self {
            MediaKind::Image => matches!(ext.as_str(), "jpg" | "jpeg" | "png"),
            MediaKind::Video => matches!(ext.as_str(), "mp4" | "mov" | "m4v" | "webm"),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MediaKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "images" => Ok(MediaKind::Image),
            "video" | "videos" => Ok(MediaKind::Video),
            _ => Err(ConfigError::InvalidValue {
                key: "kind".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Handle to a file on the invoking device, as returned by a picker.
///
/// Deliberately not `Copy`: handing it to the pipeline consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileRef {
    pub path_or_uri: String,
    pub platform: Platform,
    pub kind: MediaKind,
}

impl LocalFileRef {
    pub fn new<S: Into<String>>(path_or_uri: S, platform: Platform, kind: MediaKind) -> Self {
        Self {
            path_or_uri: path_or_uri.into(),
            platform,
            kind,
        }
    }

    pub fn native<S: Into<String>>(path: S, kind: MediaKind) -> Self {
        Self::new(path, Platform::Native, kind)
    }

    pub fn web<S: Into<String>>(uri: S, kind: MediaKind) -> Self {
        Self::new(uri, Platform::Web, kind)
    }
}

/// A single named blob headed for one collection
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub collection: String,
    pub generated_name: String,
    pub content_type: String,
    pub payload: Bytes,
}

impl UploadRequest {
    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}
