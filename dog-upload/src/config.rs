//! Pipeline configuration.
//!
//! Values can be layered from the environment using the DogRS convention:
//! strip the prefix, lowercase, and map `__` to `.`:
//!
//! ```bash
//! export DOG_UPLOAD__PLATFORM=web
//! export DOG_UPLOAD__IMAGE_COLLECTION=imagens
//! export DOG_UPLOAD__NOTIFY_ON_COMPLETION=false
//! ```

use crate::{ConfigError, MediaKind, Platform};

/// Configuration for upload operations
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Runtime the pipeline is hosted on. Read-only and shared by all uploads.
    pub platform: Platform,

    /// Collection images are stored in
    pub image_collection: String,

    /// Collection videos are stored in
    pub video_collection: String,

    /// Send a best-effort notification after a successful upload
    pub notify_on_completion: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Native,
            image_collection: MediaKind::Image.default_collection().to_string(),
            video_collection: MediaKind::Video.default_collection().to_string(),
            notify_on_completion: true,
        }
    }
}

impl UploadConfig {
    pub const ENV_PREFIX: &'static str = "DOG_UPLOAD__";

    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DOG_UPLOAD__*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults overridden by prefixed key/value pairs; other keys are ignored
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(stripped) = key.as_ref().strip_prefix(Self::ENV_PREFIX) else {
                continue;
            };
            let normalized = stripped.to_lowercase().replace("__", ".");
            config.apply(&normalized, value.as_ref())?;
        }

        Ok(config)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "platform" => self.platform = value.parse().map_err(|_| invalid())?,
            "image_collection" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.image_collection = value.trim().to_string();
            }
            "video_collection" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.video_collection = value.trim().to_string();
            }
            "notify_on_completion" => {
                self.notify_on_completion = value.trim().parse::<bool>().map_err(|_| invalid())?
            }
            _ => {}
        }

        Ok(())
    }

    /// Set the host platform
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Set the collection for one media kind
    pub fn with_collection<S: Into<String>>(mut self, kind: MediaKind, collection: S) -> Self {
        match kind {
            MediaKind::Image => self.image_collection = collection.into(),
            MediaKind::Video => self.video_collection = collection.into(),
        }
        self
    }

    /// Turn off completion notifications
    pub fn without_notifications(mut self) -> Self {
        self.notify_on_completion = false;
        self
    }

    /// Collection configured for `kind`
    pub fn collection_for(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.image_collection,
            MediaKind::Video => &self.video_collection,
        }
    }
}
