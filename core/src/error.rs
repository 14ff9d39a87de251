//! Error types for the storage client.
//!
//! # Design
//! None of these errors escape a storage operation as control flow: every
//! operation folds them into an [`Outcome`](crate::Outcome). They stay typed
//! at the component boundaries (codec, builder, transport) so each component
//! can be tested on its own, and so callers composing the primitives by hand
//! can still match on the failure.

use thiserror::Error;

use crate::http::HttpMethod;
use crate::types::ErrorInfo;

/// A payload could not be turned into the requested typed record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The JSON was malformed, mistyped, or violated a record invariant.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// An ad-hoc field lookup found no string under the given key.
    #[error("field `{0}` is missing or is not a string")]
    MissingField(&'static str),

    /// A text body was not valid UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A request could not be materialized.
#[derive(Debug, Error)]
pub enum InvalidRequestError {
    /// `GET` and `DELETE` requests must not carry a body.
    #[error("{0} requests cannot carry a body")]
    BodyNotAllowed(HttpMethod),

    /// The JSON payload could not be encoded.
    #[error("failed to encode request payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The HTTP round trip did not produce a status code and body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP stack reported a failure before a response was received.
    #[error("{method} {url} failed: {source}")]
    Request {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] ureq::Error),

    /// Raw I/O failure, e.g. connection refused.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The failure arms of an [`Outcome`](crate::Outcome), for callers that prefer `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The remote service rejected the request.
    #[error("storage API error: {0}")]
    Api(ErrorInfo),

    /// The request never completed, or the response broke the wire contract.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Client configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),

    #[error("environment variable `{name}` has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
