//! Typed records exchanged with the storage API.
//!
//! # Design
//! Wire names are mapped with `#[serde(rename)]`; unknown fields are ignored
//! so the client keeps working when the service grows new fields. Absent
//! optional request fields are omitted from the JSON rather than sent as
//! `null`. Invariants are enforced while decoding, so a value of one of these
//! types is always valid: `ErrorInfo` goes through `try_from`, and
//! `ObjectIdentity::id` is a `Uuid`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message carried by an `ErrorInfo` decoded with no populated field.
pub const EMPTY_ERROR_INFO_MESSAGE: &str = "error response is missing statusCode, error and message";

/// Structured error returned by the API for any status >= 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawErrorInfo")]
pub struct ErrorInfo {
    #[serde(rename = "statusCode", skip_serializing_if = "Option::is_none")]
    status_code: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Deserialize)]
struct RawErrorInfo {
    #[serde(rename = "statusCode", default)]
    status_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<RawErrorInfo> for ErrorInfo {
    type Error = &'static str;

    fn try_from(raw: RawErrorInfo) -> Result<Self, Self::Error> {
        Self::new(raw.status_code, raw.error, raw.message).ok_or(EMPTY_ERROR_INFO_MESSAGE)
    }
}

impl ErrorInfo {
    /// Returns `None` when all three fields are absent.
    pub fn new(
        status_code: Option<String>,
        error_code: Option<String>,
        message: Option<String>,
    ) -> Option<Self> {
        if status_code.is_none() && error_code.is_none() && message.is_none() {
            return None;
        }
        Some(Self {
            status_code,
            error_code,
            message,
        })
    }

    pub fn status_code(&self) -> Option<&str> {
        self.status_code.as_deref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [&self.status_code, &self.error_code, &self.message];
        let mut first = true;
        for part in parts.into_iter().flatten() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

/// A storage bucket as returned by the bucket endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub owner: String,
    #[serde(rename = "public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucket {
    pub id: String,
    pub name: String,
    #[serde(rename = "public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
}

impl CreateBucket {
    /// A private bucket whose name equals its id, with no limits.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            is_public: false,
            file_size_limit: None,
            allowed_mime_types: None,
        }
    }
}

/// Partial payload for updating a bucket. Only the fields present are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBucket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "public", default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
}

/// One entry of a file listing. Folder-like entries have no id and no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub last_accessed_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<FileMetadata>,
}

impl FileEntry {
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub e_tag: String,
    pub size: u64,
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    pub cache_control: String,
    pub last_modified: String,
    pub content_length: u64,
    pub http_status_code: u16,
}

/// Per-object descriptor returned by the authenticated info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub name: String,
    pub version: String,
    pub size: u64,
    pub content_type: String,
    pub cache_control: String,
    #[serde(rename = "etag")]
    pub e_tag: String,
    pub created_at: String,
}

/// Key and id of an object that was just written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectIdentity {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Id")]
    pub id: Uuid,
}

/// Payload for moving an object, possibly across buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "bucketId")]
    pub source_bucket_id: String,
    #[serde(rename = "sourceKey")]
    pub source_file_path: String,
    #[serde(rename = "destinationBucket")]
    pub destination_bucket_id: String,
    #[serde(rename = "destinationKey")]
    pub destination_file_path: String,
}

/// Options for listing files. `None` fields fall back to `("", 0, 100)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub folder_prefix: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl ListOptions {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn in_folder(prefix: impl Into<String>) -> Self {
        Self {
            folder_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }
}

/// Wire body of the list-files request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ListFilesBody<'a> {
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "sortBy")]
    pub sort_by: SortBy,
    pub prefix: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SortBy {
    pub column: &'static str,
    pub order: &'static str,
}

impl<'a> From<&'a ListOptions> for ListFilesBody<'a> {
    fn from(options: &'a ListOptions) -> Self {
        Self {
            limit: options.limit.unwrap_or(ListOptions::DEFAULT_LIMIT),
            offset: options.offset.unwrap_or(0),
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
            prefix: options.folder_prefix.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HealthStatus {
    pub healthy: bool,
}
