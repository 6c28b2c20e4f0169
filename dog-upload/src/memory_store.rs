use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::store::join_public_url;
use crate::{PutResult, RemoteStore, StoreCapabilities, StoreError, UploadRequest};

/// Object held by [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub payload: Bytes,
}

/// In-process remote store for tests, demos and dry runs.
///
/// Rejections use the same messages a hosted storage API returns, so callers
/// see identical details either way.
pub struct MemoryStore {
    base_url: String,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    buckets: Option<BTreeSet<String>>,
    max_object_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
            buckets: None,
            max_object_bytes: None,
        }
    }

    /// Only accept puts into the given collections
    pub fn with_buckets<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets = Some(buckets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_object_bytes(mut self, bytes: u64) -> Self {
        self.max_object_bytes = Some(bytes);
        self
    }

    pub fn get(&self, collection: &str, name: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .get(&(collection.to_string(), name.to_string()))
            .cloned()
    }

    pub fn contains(&self, collection: &str, name: &str) -> bool {
        self.objects
            .read()
            .contains_key(&(collection.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn put(&self, request: UploadRequest, overwrite: bool) -> Result<PutResult, StoreError> {
        if let Some(buckets) = &self.buckets {
            if !buckets.contains(&request.collection) {
                return Err(StoreError::rejected("Bucket not found"));
            }
        }

        if let Some(max) = self.max_object_bytes {
            if request.size_bytes() > max {
                return Err(StoreError::rejected("Payload too large"));
            }
        }

        let key = (request.collection, request.generated_name);
        let mut objects = self.objects.write();
        if !overwrite && objects.contains_key(&key) {
            return Err(StoreError::conflict());
        }

        let size_bytes = request.payload.len() as u64;
        objects.insert(
            key,
            StoredObject {
                content_type: request.content_type,
                payload: request.payload,
            },
        );

        Ok(PutResult::new(size_bytes))
    }

    fn public_url(&self, collection: &str, name: &str) -> String {
        join_public_url(&self.base_url, collection, name)
    }

    fn capabilities(&self) -> StoreCapabilities {
        let caps = StoreCapabilities::basic().with_conditional_put();
        match self.max_object_bytes {
            Some(max) => caps.with_max_object_bytes(max),
            None => caps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, payload: &'static [u8]) -> UploadRequest {
        UploadRequest {
            collection: "imagens".to_string(),
            generated_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            payload: Bytes::from_static(payload),
        }
    }

    #[tokio::test]
    async fn put_without_overwrite_refuses_existing_names() {
        let store = MemoryStore::new("https://cdn.test/public");
        store.put(request("a.jpg", b"one"), false).await.unwrap();

        let err = store.put(request("a.jpg", b"two"), false).await.unwrap_err();
        assert_eq!(err.message(), "The resource already exists");
        assert_eq!(&store.get("imagens", "a.jpg").unwrap().payload[..], b"one");
    }

    #[tokio::test]
    async fn size_limit_and_bucket_list_are_enforced() {
        let store = MemoryStore::new("https://cdn.test/public")
            .with_buckets(["videos"])
            .with_max_object_bytes(2);

        let err = store.put(request("a.jpg", b"abc"), false).await.unwrap_err();
        assert_eq!(err.message(), "Bucket not found");

        let mut req = request("b.mp4", b"abc");
        req.collection = "videos".to_string();
        let err = store.put(req, false).await.unwrap_err();
        assert_eq!(err.message(), "Payload too large");
        assert!(store.is_empty());
    }

    #[test]
    fn public_url_joins_segments() {
        let store = MemoryStore::new("https://cdn.test/public/");
        assert_eq!(
            store.public_url("videos", "x.mp4"),
            "https://cdn.test/public/videos/x.mp4"
        );
    }
}
