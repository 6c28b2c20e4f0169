use async_trait::async_trait;
use tracing::debug;

use crate::{LocalFileRef, MediaKind, PickError, Platform};

/// Lets the user choose one file of a given kind
#[async_trait]
pub trait FilePicker: Send + Sync {
    /// `Ok(None)` means the user cancelled the selection
    async fn pick_one(&self, kind: MediaKind) -> Result<Option<LocalFileRef>, PickError>;
}

/// Picker over a path chosen ahead of time (command line, config, test)
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    path: Option<String>,
    platform: Platform,
}

impl PathPicker {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: Some(path.into()),
            platform: Platform::Native,
        }
    }

    /// A picker the user always cancels
    pub fn cancelled() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

#[async_trait]
impl FilePicker for PathPicker {
    async fn pick_one(&self, kind: MediaKind) -> Result<Option<LocalFileRef>, PickError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        if !kind.accepts_path(path) {
            debug!("Ignoring {} for {} selection", path, kind);
            return Ok(None);
        }

        let local = path.strip_prefix("file://").unwrap_or(path);
        match tokio::fs::metadata(local).await {
            Ok(meta) if meta.is_file() => Ok(Some(LocalFileRef::new(path.clone(), self.platform, kind))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(PickError::PermissionDenied {
                    detail: format!("cannot access {}: {}", path, e),
                })
            }
            Err(e) => Err(PickError::Io { source: e }),
        }
    }
}
