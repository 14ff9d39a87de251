//! Builder for storage API requests.
//!
//! # Design
//! `RequestBuilder` is an owned value: every configuration call consumes it
//! and returns the updated builder, so a builder is never shared between
//! calls. Configuration calls may come in any order; all validation happens
//! once in [`RequestBuilder::build`], which produces an [`HttpRequest`].

use crate::config::ApiKey;
use crate::error::InvalidRequestError;
use crate::http::{HttpMethod, HttpRequest, RequestBody};

/// Path prefix shared by every storage endpoint.
pub const STORAGE_PATH: &str = "/storage/v1";

pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";
pub const APPLICATION_JSON: &str = "application/json";

/// Top-level path family of the storage API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Bucket,
    Object,
}

impl Resource {
    fn segment(self) -> &'static str {
        match self {
            Resource::Bucket => "/bucket",
            Resource::Object => "/object",
        }
    }
}

/// Accumulates method, resource, path, headers and body for one request.
#[derive(Debug, Clone)]
#[must_use]
pub struct RequestBuilder {
    base_url: String,
    api_key: Option<ApiKey>,
    resource: Option<Resource>,
    path: Option<String>,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl RequestBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            resource: None,
            path: None,
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Credential sent as a bearer token. `None` makes the request anonymous.
    pub fn api_key(mut self, api_key: Option<ApiKey>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Suffix appended after the resource segment. Not escaped.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn get(self) -> Self {
        self.method(HttpMethod::Get)
    }

    pub fn post(self) -> Self {
        self.method(HttpMethod::Post)
    }

    pub fn put(self) -> Self {
        self.method(HttpMethod::Put)
    }

    pub fn delete(self) -> Self {
        self.method(HttpMethod::Delete)
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn text_body(self, text: impl Into<String>) -> Self {
        self.body(RequestBody::Text(text.into()))
    }

    pub fn binary_body(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body(RequestBody::Binary(bytes.into()))
    }

    /// Sets a header, replacing any earlier value under the same name.
    /// An explicit `Authorization` header takes precedence over the api key.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn json_content(self) -> Self {
        self.header(CONTENT_TYPE, APPLICATION_JSON)
    }

    /// Validates the configuration and materializes the request.
    pub fn build(self) -> Result<HttpRequest, InvalidRequestError> {
        if !self.body.is_empty() && !self.method.allows_body() {
            return Err(InvalidRequestError::BodyNotAllowed(self.method));
        }

        let mut url = format!("{}{STORAGE_PATH}", self.base_url);
        if let Some(resource) = self.resource {
            url.push_str(resource.segment());
        }
        if let Some(path) = &self.path {
            url.push('/');
            url.push_str(path);
        }

        let explicit_auth = self
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION));
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        if let (Some(key), false) = (&self.api_key, explicit_auth) {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {}", key.expose())));
        }
        headers.extend(self.headers);

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "http://localhost:3000";

    fn builder() -> RequestBuilder {
        RequestBuilder::new(BASE_URL)
    }

    #[test]
    fn defaults_to_anonymous_get_without_body() {
        let req = builder().path("health").build().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/storage/v1/health");
        assert!(req.headers.is_empty());
        assert!(req.body.is_empty());
    }

    #[test]
    fn resource_and_path_are_concatenated() {
        let req = builder()
            .resource(Resource::Object)
            .path("info/authenticated/b/folder/file.txt")
            .build()
            .unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/storage/v1/object/info/authenticated/b/folder/file.txt"
        );
    }

    #[test]
    fn resource_without_path_has_no_trailing_slash() {
        let req = builder().resource(Resource::Bucket).build().unwrap();
        assert_eq!(req.url, "http://localhost:3000/storage/v1/bucket");
    }

    #[test]
    fn trailing_slash_on_base_url_is_stripped() {
        let req = RequestBuilder::new("http://localhost:3000/")
            .resource(Resource::Bucket)
            .build()
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/storage/v1/bucket");
    }

    #[test]
    fn api_key_is_sent_as_bearer() {
        let req = builder()
            .api_key(Some(ApiKey::from("secret")))
            .resource(Resource::Bucket)
            .build()
            .unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer secret"));
    }

    #[test]
    fn explicit_authorization_header_replaces_bearer() {
        let req = RequestBuilder::new("http://x")
            .api_key(Some(ApiKey::from("secret")))
            .header("authorization", "Bearer other")
            .build()
            .unwrap();
        assert_eq!(req.headers, vec![("authorization".to_string(), "Bearer other".to_string())]);
    }

    #[test]
    fn configuration_order_does_not_matter() {
        let a = builder()
            .resource(Resource::Bucket)
            .put()
            .text_body("{}")
            .json_content()
            .path("b")
            .build()
            .unwrap();
        let b = builder()
            .json_content()
            .path("b")
            .text_body("{}")
            .put()
            .resource(Resource::Bucket)
            .build()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_content_sets_header_once() {
        let req = builder()
            .post()
            .text_body("{}")
            .json_content()
            .json_content()
            .build()
            .unwrap();
        assert_eq!(
            req.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn binary_body_is_kept_verbatim() {
        let req = builder().post().binary_body(b"hi".to_vec()).build().unwrap();
        assert_eq!(req.body, RequestBody::Binary(b"hi".to_vec()));
        assert_eq!(req.body.as_bytes(), b"hi");
    }

    #[test]
    fn get_with_body_is_rejected() {
        let err = builder().text_body("x").build().unwrap_err();
        assert!(matches!(err, InvalidRequestError::BodyNotAllowed(HttpMethod::Get)));
    }

    #[test]
    fn delete_with_body_is_rejected() {
        let err = builder().delete().binary_body(vec![1]).build().unwrap_err();
        assert!(matches!(err, InvalidRequestError::BodyNotAllowed(HttpMethod::Delete)));
    }

    #[test]
    fn post_without_body_is_allowed() {
        let req = builder().resource(Resource::Bucket).path("b/empty").post().build().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.body.is_empty());
    }
}
