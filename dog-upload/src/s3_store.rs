use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::Client;
use std::collections::HashMap;
use tracing::debug;

use crate::store::join_public_url;
use crate::{ConfigError, PutResult, RemoteStore, StoreCapabilities, StoreError, UploadRequest};

/// Connection settings for an S3-compatible object store
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base of public object URLs, e.g. `https://<project>.supabase.co/storage/v1/object/public`
    pub public_base_url: String,
    pub force_path_style: bool,
}

impl S3Config {
    pub const REGION: &'static str = "DOG_UPLOAD_S3_REGION";
    pub const ENDPOINT_URL: &'static str = "DOG_UPLOAD_S3_ENDPOINT_URL";
    pub const ACCESS_KEY_ID: &'static str = "DOG_UPLOAD_S3_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &'static str = "DOG_UPLOAD_S3_SECRET_ACCESS_KEY";
    pub const PUBLIC_BASE_URL: &'static str = "DOG_UPLOAD_PUBLIC_BASE_URL";

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Read settings from key/value pairs named like the environment variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let required = |key: &str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::Missing {
                    key: key.to_string(),
                })
        };

        let endpoint_url = vars.get(Self::ENDPOINT_URL).filter(|v| !v.is_empty()).cloned();

        Ok(Self {
            region: required(Self::REGION)?,
            force_path_style: endpoint_url.is_some(),
            endpoint_url,
            access_key_id: required(Self::ACCESS_KEY_ID)?,
            secret_access_key: required(Self::SECRET_ACCESS_KEY)?,
            public_base_url: required(Self::PUBLIC_BASE_URL)?,
        })
    }
}

/// Remote store backed by any S3-compatible API.
///
/// Each collection is a bucket and the generated name is the object key.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    public_base_url: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let public_base_url = config.public_base_url.clone();
        let client = Self::create_client(config).await;
        Self {
            client,
            public_base_url,
        }
    }

    pub async fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    /// Wrap a client the caller has already configured
    pub fn from_client<S: Into<String>>(client: Client, public_base_url: S) -> Self {
        Self {
            client,
            public_base_url: public_base_url.into(),
        }
    }

    async fn create_client(config: S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "dog-upload",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        if let Some(endpoint_url) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    /// Surface the service's own message when there is one
    fn map_put_error<E, R>(err: SdkError<E, R>) -> StoreError
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let message = err
            .as_service_error()
            .and_then(|e| e.message().or_else(|| e.code()))
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        StoreError::rejected(message)
    }
}

#[async_trait]
impl RemoteStore for S3CompatibleStore {
    async fn put(&self, request: UploadRequest, overwrite: bool) -> Result<PutResult, StoreError> {
        let size_bytes = request.size_bytes();

        let mut put = self
            .client
            .put_object()
            .bucket(&request.collection)
            .key(&request.generated_name)
            .content_type(&request.content_type)
            .body(AwsByteStream::from(request.payload));

        if !overwrite {
            put = put.if_none_match("*");
        }

        let result = put.send().await.map_err(Self::map_put_error)?;
        debug!(
            "Stored {}/{} ({} bytes)",
            request.collection, request.generated_name, size_bytes
        );

        let mut put_result = PutResult::new(size_bytes);
        if let Some(etag) = result.e_tag {
            put_result = put_result.with_etag(etag);
        }
        Ok(put_result)
    }

    fn public_url(&self, collection: &str, name: &str) -> String {
        join_public_url(&self.public_base_url, collection, name)
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_conditional_put()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, UploadError};
    use aws_smithy_runtime::client::http::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_runtime_api::client::orchestrator::{HttpRequest, HttpResponse};
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;
    use bytes::Bytes;

    const PRECONDITION_FAILED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>PreconditionFailed</Code><Message>At least one of the pre-conditions you specified did not hold</Message><Condition>If-None-Match</Condition><RequestId>4442587FB7D0A2F9</RequestId></Error>"#;

    fn reply(status: u16, body: &'static str) -> HttpResponse {
        let mut response = HttpResponse::new(
            StatusCode::try_from(status).unwrap(),
            SdkBody::from(body),
        );
        if status == 200 {
            response.headers_mut().insert("etag", "\"9b2cf535f27731c9\"");
        } else {
            response.headers_mut().insert("content-type", "application/xml");
        }
        response
    }

    fn replay_store(status: u16, body: &'static str) -> (S3CompatibleStore, StaticReplayClient) {
        let http_client = StaticReplayClient::new(vec![ReplayEvent::new(
            HttpRequest::new(SdkBody::empty()),
            reply(status, body),
        )]);

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("key", "secret", None, None, "test"))
            .endpoint_url("http://localhost:9000")
            .force_path_style(true)
            .http_client(http_client.clone())
            .build();

        let store = S3CompatibleStore::from_client(Client::from_conf(config), "https://cdn.test/public");
        (store, http_client)
    }

    fn jpeg_request() -> UploadRequest {
        UploadRequest {
            collection: "imagens".to_string(),
            generated_name: "3f2b8c1d.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            payload: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
        }
    }

    #[tokio::test]
    async fn put_without_overwrite_sends_if_none_match() {
        let (store, http_client) = replay_store(200, "");

        let stored = store.put(jpeg_request(), false).await.unwrap();

        assert_eq!(stored.size_bytes, 4);
        assert_eq!(stored.etag.as_deref(), Some("\"9b2cf535f27731c9\""));

        let requests: Vec<_> = http_client.actual_requests().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers().get("if-none-match"), Some("*"));
        assert_eq!(requests[0].headers().get("content-type"), Some("image/jpeg"));
        assert!(requests[0]
            .uri()
            .starts_with("http://localhost:9000/imagens/3f2b8c1d.jpg"));
    }

    #[tokio::test]
    async fn put_with_overwrite_is_unconditional() {
        let (store, http_client) = replay_store(200, "");

        store.put(jpeg_request(), true).await.unwrap();

        let requests: Vec<_> = http_client.actual_requests().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers().get("if-none-match"), None);
    }

    #[tokio::test]
    async fn precondition_failure_message_is_kept_verbatim() {
        let (store, _http_client) = replay_store(412, PRECONDITION_FAILED);

        let err = store.put(jpeg_request(), false).await.unwrap_err();
        assert_eq!(
            err.message(),
            "At least one of the pre-conditions you specified did not hold"
        );

        let err = UploadError::from(err);
        assert_eq!(err.kind(), ErrorKind::StoreRejected);
        assert_eq!(
            err.detail(),
            "At least one of the pre-conditions you specified did not hold"
        );
    }

    #[test]
    fn public_url_joins_collection_and_name() {
        let store = S3CompatibleStore::from_client(
            Client::from_conf(
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new("us-east-1"))
                    .build(),
            ),
            "https://cdn.test/public/",
        );
        assert_eq!(
            store.public_url("imagens", "a.jpg"),
            "https://cdn.test/public/imagens/a.jpg"
        );
    }

    fn vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (S3Config::REGION, "us-east-1"),
            (S3Config::ACCESS_KEY_ID, "key"),
            (S3Config::SECRET_ACCESS_KEY, "secret"),
            (S3Config::PUBLIC_BASE_URL, "https://cdn.test/public"),
        ]
    }

    #[test]
    fn config_reads_required_keys() {
        let config = S3Config::from_vars(vars()).unwrap();
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        assert!(!config.force_path_style);
    }

    #[test]
    fn custom_endpoint_switches_to_path_style() {
        let mut vars = vars();
        vars.push((S3Config::ENDPOINT_URL, "http://localhost:9000"));
        let config = S3Config::from_vars(vars).unwrap();
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.force_path_style);
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let err = S3Config::from_vars(vec![(S3Config::REGION, "us-east-1")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                key: S3Config::ACCESS_KEY_ID.to_string()
            }
        );
    }
}
