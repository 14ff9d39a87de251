//! Synchronous, typed client for an object-storage REST API.
//!
//! # Overview
//! Bucket and object operations are plain method calls on [`StorageClient`].
//! Every call returns an [`Outcome`]: a success body, a structured API error,
//! or a transport failure. Callers handle all three the same way at every
//! call site, whatever the endpoint.
//!
//! # Design
//! - [`RequestBuilder`] assembles a request as plain data ([`HttpRequest`]).
//! - A [`Transport`] performs the blocking round trip. [`UreqTransport`] is
//!   the production implementation; tests inject closures instead.
//! - [`outcome::resolve`] is the single place that interprets status codes.
//! - [`codec`] maps JSON to the typed records in [`types`], enforcing their
//!   invariants while decoding.
//! - The client is immutable after construction and can be shared across
//!   threads without synchronization.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod outcome;
pub mod request;
pub mod transport;
pub mod types;

pub use client::StorageClient;
pub use config::{ApiKey, StorageConfig};
pub use error::{ConfigError, DecodeError, InvalidRequestError, StorageError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use outcome::Outcome;
pub use request::{RequestBuilder, Resource};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Bucket, CreateBucket, ErrorInfo, FileEntry, FileInfo, FileMetadata, ListOptions, MoveRequest,
    ObjectIdentity, UpdateBucket,
};
