use async_trait::async_trait;

use crate::{StoreError, UploadRequest};

/// Remote object storage the pipeline writes to
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Store one named blob in a collection.
    ///
    /// With `overwrite == false` an existing object under the same name must
    /// not be replaced; the store reports a conflict instead.
    async fn put(&self, request: UploadRequest, overwrite: bool) -> Result<PutResult, StoreError>;

    /// Public address of `name` within `collection`
    fn public_url(&self, collection: &str, name: &str) -> String;

    /// Get store capabilities
    fn capabilities(&self) -> StoreCapabilities;
}

/// Result of a successful put operation
#[derive(Debug, Clone, Default)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: u64,
}

impl PutResult {
    pub fn new(size_bytes: u64) -> Self {
        Self {
            etag: None,
            size_bytes,
        }
    }

    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Store capabilities
#[derive(Debug, Clone, Default)]
pub struct StoreCapabilities {
    /// The store enforces `overwrite == false` itself
    pub supports_conditional_put: bool,
    pub max_object_bytes: Option<u64>,
}

impl StoreCapabilities {
    pub fn basic() -> Self {
        Self {
            supports_conditional_put: false,
            max_object_bytes: None,
        }
    }

    pub fn with_conditional_put(mut self) -> Self {
        self.supports_conditional_put = true;
        self
    }

    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = Some(bytes);
        self
    }
}

/// Join a public base URL, a collection and an object name
pub(crate) fn join_public_url(base_url: &str, collection: &str, name: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), collection, name)
}
