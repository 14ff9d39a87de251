//! The three-way result of a storage call and the resolver that produces it.
//!
//! # Design
//! Every storage operation ends in [`resolve`], which is the only place that
//! interprets status codes: no status means a transport failure, `>= 400`
//! means an API error decoded from the body, anything else is success. An
//! error body that is not a valid [`ErrorInfo`] breaks the remote contract
//! and is reported as a transport failure, as is a success body that does
//! not decode into the operation's record (see [`Outcome::try_map`]).

use std::fmt;

use crate::codec;
use crate::error::{StorageError, TransportError};
use crate::http::HttpResponse;
use crate::types::ErrorInfo;

/// Lowest status code treated as an API error.
pub const ERROR_STATUS_THRESHOLD: u16 = 400;

/// Exactly one of: a success body, a structured API error, or a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    Body(T),
    ApiError(ErrorInfo),
    TransportFailure(String),
}

impl<T> Outcome<T> {
    pub fn body(&self) -> Option<&T> {
        match self {
            Outcome::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn api_error(&self) -> Option<&ErrorInfo> {
        match self {
            Outcome::ApiError(info) => Some(info),
            _ => None,
        }
    }

    pub fn transport_failure(&self) -> Option<&str> {
        match self {
            Outcome::TransportFailure(description) => Some(description),
            _ => None,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Outcome::Body(_))
    }

    pub fn is_api_error(&self) -> bool {
        matches!(self, Outcome::ApiError(_))
    }

    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Outcome::TransportFailure(_))
    }

    pub fn into_body(self) -> Option<T> {
        match self {
            Outcome::Body(body) => Some(body),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Body(body) => Outcome::Body(f(body)),
            Outcome::ApiError(info) => Outcome::ApiError(info),
            Outcome::TransportFailure(description) => Outcome::TransportFailure(description),
        }
    }

    /// Applies a fallible step to the body; a failure becomes a transport failure.
    pub fn try_map<U, E: fmt::Display>(self, f: impl FnOnce(T) -> Result<U, E>) -> Outcome<U> {
        match self {
            Outcome::Body(body) => match f(body) {
                Ok(value) => Outcome::Body(value),
                Err(err) => {
                    tracing::warn!(error = %err, "response body does not match the expected shape");
                    Outcome::TransportFailure(format!("unexpected response body: {err}"))
                }
            },
            Outcome::ApiError(info) => Outcome::ApiError(info),
            Outcome::TransportFailure(description) => Outcome::TransportFailure(description),
        }
    }

    pub fn into_result(self) -> Result<T, StorageError> {
        match self {
            Outcome::Body(body) => Ok(body),
            Outcome::ApiError(info) => Err(StorageError::Api(info)),
            Outcome::TransportFailure(description) => Err(StorageError::Transport(description)),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, StorageError> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}

/// Decides what a raw transport result means.
pub fn resolve(result: Result<HttpResponse, TransportError>) -> Outcome<Vec<u8>> {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(error = %err, "storage request failed in transport");
            return Outcome::TransportFailure(err.to_string());
        }
    };

    if response.status < ERROR_STATUS_THRESHOLD {
        return Outcome::Body(response.body);
    }

    match codec::decode::<ErrorInfo>(&response.body) {
        Ok(info) => Outcome::ApiError(info),
        Err(err) => {
            tracing::warn!(status = response.status, error = %err, "unrecognised error response");
            Outcome::TransportFailure(format!(
                "HTTP {} with unrecognised error body: {err}",
                response.status
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    const ERROR_BODY: &str = r#"{"statusCode":"404","error":"not_found","message":"Bucket not found"}"#;

    fn populated<T>(outcome: &Outcome<T>) -> usize {
        [outcome.is_body(), outcome.is_api_error(), outcome.is_transport_failure()]
            .into_iter()
            .filter(|set| *set)
            .count()
    }

    #[test]
    fn exactly_one_arm_is_populated() {
        let bodies = [
            ERROR_BODY,
            r#"{"message":"x"}"#,
            r#"{"statusCode":null,"error":null,"message":null}"#,
            "not json",
            "",
            r#"{"healthy":true}"#,
        ];
        for status in [100, 200, 201, 204, 301, 399, 400, 401, 404, 409, 413, 499, 500, 503] {
            for body in bodies {
                let outcome = resolve(Ok(HttpResponse::new(status, body)));
                assert_eq!(populated(&outcome), 1, "status {status} body {body:?}");
            }
        }
        let outcome = resolve(Err(io::Error::from(io::ErrorKind::TimedOut).into()));
        assert_eq!(populated(&outcome), 1);
    }

    #[test]
    fn status_399_is_success() {
        let outcome = resolve(Ok(HttpResponse::new(399, ERROR_BODY)));
        assert_eq!(outcome, Outcome::Body(ERROR_BODY.as_bytes().to_vec()));
    }

    #[test]
    fn status_400_is_error() {
        let outcome = resolve(Ok(HttpResponse::new(400, ERROR_BODY)));
        let info = outcome.api_error().unwrap();
        assert_eq!(info.status_code(), Some("404"));
        assert_eq!(info.error_code(), Some("not_found"));
        assert_eq!(info.message(), Some("Bucket not found"));
    }

    #[test]
    fn unparseable_error_body_is_transport_failure() {
        let outcome = resolve(Ok(HttpResponse::new(502, "<html>Bad Gateway</html>")));
        let description = outcome.transport_failure().unwrap();
        assert!(description.starts_with("HTTP 502"));
    }

    #[test]
    fn all_null_error_body_is_transport_failure() {
        let outcome = resolve(Ok(HttpResponse::new(
            500,
            r#"{"statusCode":null,"error":null,"message":null}"#,
        )));
        assert!(outcome.is_transport_failure());
    }

    #[test]
    fn connection_refused_is_transport_failure() {
        let outcome = resolve(Err(io::Error::from(io::ErrorKind::ConnectionRefused).into()));
        assert!(outcome.body().is_none());
        assert!(outcome.api_error().is_none());
        assert!(outcome.transport_failure().is_some());
    }

    #[test]
    fn try_map_turns_decode_failure_into_transport_failure() {
        let outcome: Outcome<Vec<u8>> = Outcome::Body(b"nope".to_vec());
        let decoded = outcome.try_map(|raw| codec::decode::<bool>(&raw));
        assert!(decoded.transport_failure().unwrap().starts_with("unexpected response body"));
    }

    #[test]
    fn map_preserves_failures() {
        let info = ErrorInfo::new(None, None, Some("gone".into())).unwrap();
        let outcome: Outcome<u8> = Outcome::ApiError(info.clone());
        assert_eq!(outcome.map(|n| n + 1), Outcome::ApiError(info));
    }

    #[test]
    fn into_result_splits_arms() {
        assert_eq!(Outcome::Body(3).into_result().unwrap(), 3);
        let err = Outcome::<u8>::TransportFailure("down".into()).into_result().unwrap_err();
        assert_eq!(err, StorageError::Transport("down".into()));
    }
}
