//! Blocking HTTP transport.
//!
//! # Design
//! The [`Transport`] trait is the seam between the client and the network.
//! [`UreqTransport`] is the production implementation. Any
//! `Fn(&HttpRequest) -> Result<HttpResponse, TransportError>` closure is
//! also a transport, which is how tests substitute a fake server.
//!
//! A transport reports status codes as data: a 404 is a successful round
//! trip. Only failures that leave no status code are errors.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestBody};

/// Performs exactly one request/response round trip, blocking the caller.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Transport backed by a `ureq` agent. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds the whole round trip; `None` keeps ureq's defaults.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();

        let result = match (request.method, &request.body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, RequestBody::Empty) => {
                with_headers(self.agent.post(url), headers).send_empty()
            }
            (HttpMethod::Post, body) => {
                with_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, RequestBody::Empty) => {
                with_headers(self.agent.put(url), headers).send_empty()
            }
            (HttpMethod::Put, body) => {
                with_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
        };

        let mut response = result.map_err(|source| TransportError::Request {
            method: request.method,
            url: request.url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(TransportError::Body)?;

        Ok(HttpResponse { status, body })
    }
}
