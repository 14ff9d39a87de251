//! Storage operations over the request/response pipeline.
//!
//! # Design
//! `StorageClient` holds an immutable [`StorageConfig`] and a shared
//! [`Transport`]; it carries no mutable state between calls, so one client
//! can serve many threads at once. Each operation is the same four steps:
//! build a request, execute it, [`resolve`] the raw result, and decode the
//! body into the endpoint's record. Every operation returns an [`Outcome`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::config::StorageConfig;
use crate::error::InvalidRequestError;
use crate::http::HttpResponse;
use crate::outcome::{resolve, Outcome};
use crate::request::{RequestBuilder, Resource};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Bucket, CreateBucket, FileEntry, FileInfo, HealthStatus, ListFilesBody, ListOptions, MoveRequest,
    ObjectIdentity, UpdateBucket,
};

/// Synchronous client for the storage API.
#[derive(Clone)]
pub struct StorageClient {
    config: Arc<StorageConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// Client talking HTTP through [`UreqTransport`].
    pub fn new(config: StorageConfig) -> Self {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: StorageConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// A builder seeded with this client's base URL and credential.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(self.config.base_url()).api_key(self.config.api_key().cloned())
    }

    /// Builds, executes and resolves one request.
    pub fn send(&self, builder: RequestBuilder) -> Outcome<Vec<u8>> {
        let request = match builder.build() {
            Ok(request) => request,
            Err(err) => {
                tracing::error!(error = %err, "failed to build storage request");
                return Outcome::TransportFailure(format!("invalid request: {err}"));
            }
        };

        tracing::debug!(method = %request.method, url = %request.url, "sending storage request");
        let result = self.transport.execute(&request);
        if let Ok(HttpResponse { status, .. }) = &result {
            tracing::debug!(method = %request.method, url = %request.url, status, "storage response received");
        }
        resolve(result)
    }

    fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Outcome<T> {
        self.send(builder).try_map(|raw| codec::decode::<T>(&raw))
    }

    fn send_for_field(&self, builder: RequestBuilder, field: &'static str) -> Outcome<String> {
        self.send(builder).try_map(|raw| codec::decode_field(&raw, field))
    }

    /// Attaches `payload` as a JSON body, or describes why it could not be encoded.
    fn with_json<P: Serialize>(builder: RequestBuilder, payload: &P) -> Result<RequestBuilder, String> {
        match codec::encode(payload) {
            Ok(json) => Ok(builder.text_body(json).json_content()),
            Err(err) => {
                let err = InvalidRequestError::from(err);
                tracing::error!(error = %err, "failed to encode storage request payload");
                Err(format!("invalid request: {err}"))
            }
        }
    }

    // --- service ---

    /// `GET /health`
    pub fn health(&self) -> Outcome<bool> {
        self.send_json::<HealthStatus>(self.request().path("health"))
            .map(|status| status.healthy)
    }

    // --- buckets ---

    /// `GET /bucket`
    pub fn list_buckets(&self) -> Outcome<Vec<Bucket>> {
        self.send_json(self.request().resource(Resource::Bucket))
    }

    /// `GET /bucket/{id}`
    pub fn get_bucket(&self, bucket_id: &str) -> Outcome<Bucket> {
        self.send_json(self.request().resource(Resource::Bucket).path(bucket_id))
    }

    /// `POST /bucket`, returning the name of the created bucket.
    pub fn create_bucket(&self, bucket: &CreateBucket) -> Outcome<String> {
        let builder = self.request().resource(Resource::Bucket).post();
        match Self::with_json(builder, bucket) {
            Ok(builder) => self.send_for_field(builder, "name"),
            Err(failure) => Outcome::TransportFailure(failure),
        }
    }

    /// `PUT /bucket/{id}`, returning the service's confirmation message.
    pub fn update_bucket(&self, bucket_id: &str, changes: &UpdateBucket) -> Outcome<String> {
        let builder = self.request().resource(Resource::Bucket).path(bucket_id).put();
        match Self::with_json(builder, changes) {
            Ok(builder) => self.send_for_field(builder, "message"),
            Err(failure) => Outcome::TransportFailure(failure),
        }
    }

    /// `DELETE /bucket/{id}`
    pub fn delete_bucket(&self, bucket_id: &str) -> Outcome<String> {
        self.send_for_field(
            self.request().resource(Resource::Bucket).path(bucket_id).delete(),
            "message",
        )
    }

    /// `POST /bucket/{id}/empty`
    pub fn empty_bucket(&self, bucket_id: &str) -> Outcome<String> {
        self.send_for_field(
            self.request()
                .resource(Resource::Bucket)
                .path(format!("{bucket_id}/empty"))
                .post(),
            "message",
        )
    }

    // --- objects ---

    /// `POST /object/list/{bucket_id}`
    pub fn list_files(&self, bucket_id: &str, options: &ListOptions) -> Outcome<Vec<FileEntry>> {
        let builder = self
            .request()
            .resource(Resource::Object)
            .path(format!("list/{bucket_id}"))
            .post();
        match Self::with_json(builder, &ListFilesBody::from(options)) {
            Ok(builder) => self.send_json(builder),
            Err(failure) => Outcome::TransportFailure(failure),
        }
    }

    /// `GET /object/info/authenticated/{bucket_id}/{path}`
    pub fn get_file_info(&self, bucket_id: &str, path: &str) -> Outcome<FileInfo> {
        self.send_json(
            self.request()
                .resource(Resource::Object)
                .path(format!("info/authenticated/{bucket_id}/{path}")),
        )
    }

    /// `GET /object/{bucket_id}/{path}`, as UTF-8 text.
    pub fn download_file(&self, bucket_id: &str, path: &str) -> Outcome<String> {
        self.download_file_bytes(bucket_id, path).try_map(codec::decode_text)
    }

    /// `GET /object/{bucket_id}/{path}`, as raw bytes.
    pub fn download_file_bytes(&self, bucket_id: &str, path: &str) -> Outcome<Vec<u8>> {
        self.send(self.object(bucket_id, path))
    }

    /// `POST /object/{bucket_id}/{path}`
    pub fn upload_file(&self, bucket_id: &str, path: &str, bytes: impl Into<Vec<u8>>) -> Outcome<ObjectIdentity> {
        self.send_json(self.object(bucket_id, path).post().binary_body(bytes))
    }

    /// `PUT /object/{bucket_id}/{path}`
    pub fn update_file(&self, bucket_id: &str, path: &str, bytes: impl Into<Vec<u8>>) -> Outcome<ObjectIdentity> {
        self.send_json(self.object(bucket_id, path).put().binary_body(bytes))
    }

    /// `DELETE /object/{bucket_id}/{path}`
    pub fn delete_file(&self, bucket_id: &str, path: &str) -> Outcome<String> {
        self.send_for_field(self.object(bucket_id, path).delete(), "message")
    }

    /// `POST /object/move`
    pub fn move_file(&self, request: &MoveRequest) -> Outcome<String> {
        let builder = self.request().resource(Resource::Object).path("move").post();
        match Self::with_json(builder, request) {
            Ok(builder) => self.send_for_field(builder, "message"),
            Err(failure) => Outcome::TransportFailure(failure),
        }
    }

    fn object(&self, bucket_id: &str, path: &str) -> RequestBuilder {
        self.request()
            .resource(Resource::Object)
            .path(format!("{bucket_id}/{path}"))
    }
}
