use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::notifier::spawn_notification;
use crate::{
    BlobEncoder, CompletionNotice, LocalFileRef, MediaKind, NameStrategy, Notifier, PlatformEncoder,
    RandomNameStrategy, RemoteStore, UploadConfig, UploadError, UploadReceipt, UploadRequest,
    UploadResult,
};

/// Turns one picked file into a stored, publicly addressable object.
///
/// The pipeline holds no per-upload state, so a single instance can serve
/// any number of concurrent calls.
pub struct UploadPipeline {
    store: Arc<dyn RemoteStore>,
    encoder: Arc<dyn BlobEncoder>,
    names: Arc<dyn NameStrategy>,
    notifier: Option<Arc<dyn Notifier>>,
    notifications: Mutex<Vec<JoinHandle<()>>>,
    config: UploadConfig,
}

impl UploadPipeline {
    /// Create a pipeline over `store` with the local file encoder and random names
    pub fn new<S: RemoteStore + 'static>(store: S, config: UploadConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a pipeline over a store the caller keeps a handle to
    pub fn from_shared(store: Arc<dyn RemoteStore>, config: UploadConfig) -> Self {
        if !store.capabilities().supports_conditional_put {
            warn!("Remote store cannot refuse overwrites; name collisions will not be detected");
        }

        Self {
            store,
            encoder: Arc::new(PlatformEncoder::local()),
            names: Arc::new(RandomNameStrategy),
            notifier: None,
            notifications: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Replace the blob encoder
    pub fn with_encoder<E: BlobEncoder + 'static>(mut self, encoder: E) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Replace the name strategy
    pub fn with_name_strategy<N: NameStrategy + 'static>(mut self, names: N) -> Self {
        self.names = Arc::new(names);
        self
    }

    /// Send a best-effort notification after each successful upload
    pub fn with_notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Upload a picked file into `collection`.
    ///
    /// Every failure comes back as a classified [`UploadError`]; nothing
    /// raised by a collaborator escapes this call.
    #[instrument(skip(self, file))]
    pub async fn upload(&self, file: Option<LocalFileRef>, collection: &str) -> UploadResult {
        let Some(file) = file else {
            debug!("Upload requested without a selected file");
            return Err(UploadError::NoFileSelected);
        };

        let kind = file.kind;
        let receipt = match AssertUnwindSafe(self.run(file, collection)).catch_unwind().await {
            Ok(result) => result?,
            Err(panic) => {
                let detail = panic_detail(&*panic);
                error!("Unexpected failure while uploading to {}: {}", collection, detail);
                return Err(UploadError::unexpected(detail));
            }
        };

        // The object is stored; nothing past this point may fail the upload.
        self.notify(kind);
        Ok(receipt)
    }

    /// Upload into the collection configured for the file's media kind
    pub async fn upload_to_default(&self, file: Option<LocalFileRef>) -> UploadResult {
        let collection = match &file {
            Some(file) => self.config.collection_for(file.kind).to_string(),
            None => return Err(UploadError::NoFileSelected),
        };
        self.upload(file, &collection).await
    }

    async fn run(&self, file: LocalFileRef, collection: &str) -> UploadResult {
        let kind = file.kind;

        let payload = self.encoder.encode(&file).await.map_err(|e| {
            warn!("Failed to encode {}: {}", file.path_or_uri, e);
            UploadError::from(e)
        })?;
        // The handle is spent once its bytes are read.
        drop(file);

        let name = self.names.generate(kind);
        let request = UploadRequest {
            collection: collection.to_string(),
            generated_name: name.clone(),
            content_type: kind.content_type().to_string(),
            payload,
        };
        debug!("Storing {} bytes as {}/{}", request.size_bytes(), collection, name);

        let stored = self.store.put(request, false).await.map_err(|e| {
            warn!("Store rejected {}/{}: {}", collection, name, e);
            UploadError::from(e)
        })?;

        let public_url = self.store.public_url(collection, &name);
        info!("Uploaded {} to {}", kind, public_url);

        let mut receipt = UploadReceipt::new(public_url, collection.to_string(), name, stored.size_bytes)
            .with_content_type(kind.content_type());
        if let Some(etag) = stored.etag {
            receipt = receipt.with_etag(etag);
        }
        Ok(receipt)
    }

    fn notify(&self, kind: MediaKind) {
        if !self.config.notify_on_completion {
            return;
        }
        let Some(notifier) = &self.notifier else {
            return;
        };

        if let Some(handle) = spawn_notification(notifier.clone(), CompletionNotice::for_kind(kind)) {
            let mut pending = self.notifications.lock();
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Wait up to `limit` for completion notices that are still running.
    ///
    /// Returns `false` if some were still pending when the limit ran out;
    /// those keep running detached.
    pub async fn wait_for_notifications(&self, limit: Duration) -> bool {
        let pending = std::mem::take(&mut *self.notifications.lock());
        if pending.is_empty() {
            return true;
        }
        match tokio::time::timeout(limit, futures::future::join_all(pending)).await {
            Ok(_) => true,
            Err(_) => {
                warn!("Completion notices still pending after {:?}", limit);
                false
            }
        }
    }

    /// Get configuration
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EncodeError, ErrorKind, MediaKind, MemoryStore};
    use async_trait::async_trait;
    use bytes::Bytes;
    use tracing_test::traced_test;

    struct PanickingEncoder;

    #[async_trait]
    impl BlobEncoder for PanickingEncoder {
        async fn encode(&self, _file: &LocalFileRef) -> Result<Bytes, EncodeError> {
            panic!("decoder state corrupted")
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn panics_become_logged_unexpected_failures() {
        let pipeline = UploadPipeline::new(MemoryStore::new("https://cdn.test"), UploadConfig::default())
            .with_encoder(PanickingEncoder);

        let err = pipeline
            .upload(Some(LocalFileRef::native("a.jpg", MediaKind::Image)), "imagens")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedFailure);
        assert_eq!(err.detail(), "decoder state corrupted");
        assert!(logs_contain("decoder state corrupted"));
    }

    struct StaticEncoder;

    #[async_trait]
    impl BlobEncoder for StaticEncoder {
        async fn encode(&self, _file: &LocalFileRef) -> Result<Bytes, EncodeError> {
            Ok(Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]))
        }
    }

    struct SlowNotifier(Arc<std::sync::atomic::AtomicBool>);

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn notify_completion(&self, _title: &str, _body: &str) -> Result<(), crate::NotifyError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.0.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    #[traced_test]
    fn stored_upload_succeeds_without_a_runtime_for_the_notice() {
        let store = Arc::new(MemoryStore::new("https://cdn.test"));
        let pipeline = UploadPipeline::from_shared(store.clone(), UploadConfig::default())
            .with_encoder(StaticEncoder)
            .with_notifier(crate::LogNotifier);

        let receipt = futures::executor::block_on(
            pipeline.upload(Some(LocalFileRef::native("a.jpg", MediaKind::Image)), "imagens"),
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains("imagens", &receipt.name));
        assert!(logs_contain("Skipping completion notification"));
    }

    #[tokio::test]
    async fn pending_notices_can_be_awaited() {
        let delivered = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let pipeline = UploadPipeline::new(MemoryStore::new("https://cdn.test"), UploadConfig::default())
            .with_encoder(StaticEncoder)
            .with_notifier(SlowNotifier(delivered.clone()));

        pipeline
            .upload(Some(LocalFileRef::native("a.jpg", MediaKind::Image)), "imagens")
            .await
            .unwrap();

        assert!(pipeline.wait_for_notifications(Duration::from_secs(5)).await);
        assert!(delivered.load(std::sync::atomic::Ordering::SeqCst));
        assert!(pipeline.wait_for_notifications(Duration::from_millis(1)).await);
    }

    #[test]
    fn panic_detail_reads_string_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_detail(&*owned), "owned");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_detail(&*other), "panic with a non-string payload");
    }
}
