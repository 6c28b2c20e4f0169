use serde::{Deserialize, Serialize};

/// Receipt returned after a blob was stored and its public URL minted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub public_url: String,
    pub collection: String,
    pub name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub etag: Option<String>,
    pub created_at: i64,
}

impl UploadReceipt {
    /// Create a new upload receipt
    pub fn new<S: Into<String>>(public_url: S, collection: S, name: S, size_bytes: u64) -> Self {
        Self {
            public_url: public_url.into(),
            collection: collection.into(),
            name: name.into(),
            content_type: "application/octet-stream".to_string(),
            size_bytes,
            etag: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Set content type
    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set etag
    pub fn with_etag<S: Into<String>>(mut self, etag: S) -> Self {
        self.etag = Some(etag.into());
        self
    }
}
