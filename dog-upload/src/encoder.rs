use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::{EncodeError, LocalFileRef, Platform};

/// Turns a local file handle into bytes ready for transfer
#[async_trait]
pub trait BlobEncoder: Send + Sync {
    async fn encode(&self, file: &LocalFileRef) -> Result<Bytes, EncodeError>;
}

/// How a platform exposes file content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingStrategy {
    /// Fetch the URI and read the response as a binary blob
    FetchBlob,
    /// Read the file as base64 text, then decode it
    Base64Read,
}

impl EncodingStrategy {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Web => EncodingStrategy::FetchBlob,
            Platform::Native => EncodingStrategy::Base64Read,
        }
    }
}

/// File APIs the encoding strategies are built on
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Fetch a URI and return its body
    async fn fetch_blob(&self, uri: &str) -> Result<Bytes, EncodeError>;

    /// Read a file as standard base64 text
    async fn read_base64(&self, path: &str) -> Result<String, EncodeError>;
}

/// Host file source backed by tokio fs and a reqwest client.
///
/// `fetch_blob` understands bare paths, `file://`, `data:` and `http(s)://`
/// URIs. `blob:` URLs only exist inside a browser and are refused.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSource {
    client: Client,
}

impl LocalFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn is_remote(uri: &str) -> bool {
        uri.starts_with("http://") || uri.starts_with("https://")
    }

    async fn fetch_remote(&self, uri: &str) -> Result<Bytes, EncodeError> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| EncodeError::fetch(uri, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EncodeError::fetch(uri, format!("server answered {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| EncodeError::fetch(uri, e.to_string()))
    }

    fn local_path(uri: &str) -> Result<&str, EncodeError> {
        if let Some(path) = uri.strip_prefix("file://") {
            if path.is_empty() {
                return Err(EncodeError::malformed("file URI without a path"));
            }
            return Ok(path);
        }
        if uri.starts_with("blob:") || uri.contains("://") {
            return Err(EncodeError::unsupported_uri(uri));
        }
        Ok(uri)
    }

    fn decode_data_uri(uri: &str) -> Result<Bytes, EncodeError> {
        let rest = &uri["data:".len()..];
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EncodeError::malformed("data URI without a payload separator"))?;

        if header.ends_with(";base64") {
            decode_base64_text(payload)
        } else {
            Ok(Bytes::copy_from_slice(payload.as_bytes()))
        }
    }
}

#[async_trait]
impl FileSource for LocalFileSource {
    async fn fetch_blob(&self, uri: &str) -> Result<Bytes, EncodeError> {
        if uri.starts_with("data:") {
            return Self::decode_data_uri(uri);
        }
        if Self::is_remote(uri) {
            return self.fetch_remote(uri).await;
        }
        let path = Self::local_path(uri)?;
        let data = tokio::fs::read(path).await?;
        Ok(Bytes::from(data))
    }

    async fn read_base64(&self, path: &str) -> Result<String, EncodeError> {
        let path = Self::local_path(path)?;
        let data = tokio::fs::read(path).await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(data))
    }
}

/// Encoder that picks one strategy per file from its platform tag
#[derive(Debug, Clone, Default)]
pub struct PlatformEncoder<F = LocalFileSource> {
    source: F,
}

impl PlatformEncoder<LocalFileSource> {
    pub fn local() -> Self {
        Self {
            source: LocalFileSource::new(),
        }
    }
}

impl<F: FileSource> PlatformEncoder<F> {
    pub fn new(source: F) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<F: FileSource> BlobEncoder for PlatformEncoder<F> {
    async fn encode(&self, file: &LocalFileRef) -> Result<Bytes, EncodeError> {
        let location = file.path_or_uri.trim();
        if location.is_empty() {
            return Err(EncodeError::malformed("empty path"));
        }

        let strategy = EncodingStrategy::for_platform(file.platform);
        debug!("Encoding {} with {:?}", location, strategy);

        match strategy {
            EncodingStrategy::FetchBlob => self.source.fetch_blob(location).await,
            EncodingStrategy::Base64Read => {
                let text = self.source.read_base64(location).await?;
                decode_base64_text(&text)
            }
        }
    }
}

/// Decode standard base64, ignoring embedded whitespace and line breaks
fn decode_base64_text(text: &str) -> Result<Bytes, EncodeError> {
    let compact: String = text.split_ascii_whitespace().collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
    Ok(Bytes::from(bytes))
}
