//! # dog-upload: single-shot media uploads
//!
//! `dog-upload` takes a file the user picked on a device and turns it into a
//! durable, publicly addressable object in remote storage, or a classified
//! failure the UI can show.
//!
//! ## Pipeline
//!
//! ```text
//! pick ─▶ validate ─▶ encode ─▶ name ─▶ store (no overwrite) ─▶ public URL
//!                                                    └─▶ notify (detached)
//! ```
//!
//! - **Encode** dispatches once on the file's [`Platform`]: browser runtimes
//!   fetch the URI as a blob, native runtimes read base64 text and decode it.
//! - **Name** is always freshly generated (`<uuid>.jpg` / `<uuid>.mp4`), so a
//!   retry never clobbers an earlier attempt.
//! - **Store** always passes `overwrite = false`; a conflict is a failure.
//! - **Notify** runs on a detached task and can never fail the upload.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_upload::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = MemoryStore::new("https://cdn.example.com/storage/v1/object/public");
//! let pipeline = UploadPipeline::new(store, UploadConfig::default())
//!     .with_notifier(LogNotifier);
//!
//! let file = LocalFileRef::native("/sdcard/DCIM/photo.jpg", MediaKind::Image);
//! match pipeline.upload(Some(file), "imagens").await {
//!     Ok(receipt) => println!("stored at {}", receipt.public_url),
//!     Err(e) => eprintln!("{} ({})", e.user_message(), e.detail()),
//! }
//! # }
//! ```
//!
//! Callers that need UI-style state (current selection, re-entry guard) can
//! wrap the pipeline in an [`UploadController`].

mod config;
mod controller;
pub mod encoder;
mod error;
mod memory_store;
pub mod naming;
mod notifier;
mod pipeline;
pub mod picker;
mod receipt;
mod s3_store;
pub mod store;
mod types;

// Re-export main types for clean API
pub use config::UploadConfig;
pub use controller::{Submission, UploadController};
pub use encoder::{BlobEncoder, EncodingStrategy, FileSource, LocalFileSource, PlatformEncoder};
pub use error::{
    ConfigError, EncodeError, ErrorKind, NotifyError, PickError, StoreError, UploadError, UploadResult,
};
pub use memory_store::{MemoryStore, StoredObject};
pub use naming::{NameStrategy, RandomNameStrategy};
pub use notifier::{CompletionNotice, LogNotifier, Notifier};
pub use picker::{FilePicker, PathPicker};
pub use pipeline::UploadPipeline;
pub use receipt::UploadReceipt;
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{PutResult, RemoteStore, StoreCapabilities};
pub use types::{LocalFileRef, MediaKind, Platform, UploadRequest};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ErrorKind, LocalFileRef, LogNotifier, MediaKind, MemoryStore, Platform, UploadConfig,
        UploadError, UploadPipeline, UploadReceipt, UploadResult,
    };
}
