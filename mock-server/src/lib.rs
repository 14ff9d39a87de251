//! In-memory implementation of the storage REST API under `/storage/v1`.
//!
//! Mirrors the behavior the client depends on: the error shape
//! `{statusCode, error, message}`, bucket and object lifecycles, folder-style
//! listings and optional bearer-key enforcement.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const STORAGE_PATH: &str = "/storage/v1";

const DEFAULT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
const CACHE_CONTROL: &str = "no-cache";

/// First segments under `/object` taken by static routes. A bucket with one
/// of these ids could not be reached through `/object/{bucket_id}/...`.
pub const RESERVED_BUCKET_IDS: [&str; 3] = ["list", "info", "move"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub public: bool,
    pub file_size_limit: Option<u64>,
    pub allowed_mime_types: Option<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct CreateBucket {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    pub file_size_limit: Option<u64>,
    pub allowed_mime_types: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct UpdateBucket {
    pub name: Option<String>,
    pub public: Option<bool>,
    pub file_size_limit: Option<u64>,
    pub allowed_mime_types: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct ListObjects {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub prefix: String,
}

fn default_limit() -> usize {
    100
}

#[derive(Deserialize)]
pub struct SortBy {
    pub column: String,
    pub order: String,
}

#[derive(Deserialize)]
pub struct MoveObject {
    #[serde(rename = "bucketId")]
    pub bucket_id: String,
    #[serde(rename = "sourceKey")]
    pub source_key: String,
    #[serde(rename = "destinationBucket")]
    pub destination_bucket: Option<String>,
    #[serde(rename = "destinationKey")]
    pub destination_key: String,
}

#[derive(Clone, Debug)]
struct StoredObject {
    id: Uuid,
    version: Uuid,
    data: Bytes,
    content_type: String,
    created_at: String,
    updated_at: String,
    last_accessed_at: String,
}

impl StoredObject {
    fn etag(&self) -> String {
        format!("\"{}\"", self.version.simple())
    }
}

struct BucketEntry {
    bucket: Bucket,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Default)]
struct Store {
    buckets: BTreeMap<String, BucketEntry>,
}

impl Store {
    fn bucket(&self, id: &str) -> Result<&BucketEntry, ApiFailure> {
        self.buckets.get(id).ok_or_else(ApiFailure::bucket_not_found)
    }

    fn bucket_mut(&mut self, id: &str) -> Result<&mut BucketEntry, ApiFailure> {
        self.buckets.get_mut(id).ok_or_else(ApiFailure::bucket_not_found)
    }
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
    api_key: Option<Arc<str>>,
}

/// Error response in the service's wire shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    fn bucket_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Bucket not found", "Bucket not found")
    }

    fn object_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "Object not found")
    }

    fn duplicate() -> Self {
        Self::new(StatusCode::CONFLICT, "Duplicate", "The resource already exists")
    }

    fn bucket_not_empty() -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "Bucket not empty",
            "The bucket you tried to delete is not empty",
        )
    }

    fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload too large",
            "The object exceeded the maximum allowed size",
        )
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "InvalidRequest", message)
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Unauthorized", "Invalid or missing API key")
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, error = self.error, "rejecting request");
        let body = json!({
            "statusCode": self.status.as_u16().to_string(),
            "error": self.error,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiFailure::invalid_request(e.to_string()))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub fn app() -> Router {
    router(None)
}

/// Like [`app`], but every request must carry `Authorization: Bearer {api_key}`.
pub fn app_with_api_key(api_key: &str) -> Router {
    router(Some(api_key))
}

fn router(api_key: Option<&str>) -> Router {
    let state = AppState {
        store: Arc::new(RwLock::new(Store::default())),
        api_key: api_key.map(Arc::from),
    };
    let api = Router::new()
        .route("/health", get(health))
        .route("/bucket", get(list_buckets).post(create_bucket))
        .route(
            "/bucket/{id}",
            get(get_bucket).put(update_bucket).delete(delete_bucket),
        )
        .route("/bucket/{id}/empty", post(empty_bucket))
        .route("/object/list/{bucket_id}", post(list_objects))
        .route("/object/info/authenticated/{bucket_id}/{*path}", get(object_info))
        .route("/object/move", post(move_object))
        .route(
            "/object/{bucket_id}/{*path}",
            get(download_object)
                .post(upload_object)
                .put(replace_object)
                .delete(delete_object),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state);
    Router::new().nest(STORAGE_PATH, api)
}

pub async fn run(listener: TcpListener, api_key: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, router(api_key.as_deref())).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(key) = &state.api_key {
        let expected = format!("Bearer {key}");
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected.as_str()) {
            return ApiFailure::unauthorized().into_response();
        }
    }
    next.run(request).await
}

async fn health() -> Json<Value> {
    Json(json!({ "healthy": true }))
}

// --- buckets ---

async fn list_buckets(State(state): State<AppState>) -> Json<Vec<Bucket>> {
    let store = state.store.read().await;
    Json(store.buckets.values().map(|entry| entry.bucket.clone()).collect())
}

async fn get_bucket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Bucket>> {
    let store = state.store.read().await;
    Ok(Json(store.bucket(&id)?.bucket.clone()))
}

async fn create_bucket(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let input: CreateBucket = parse_json(&body)?;
    if input.name.trim().is_empty() {
        return Err(ApiFailure::invalid_request("Bucket name is required"));
    }
    let id = input.id.unwrap_or_else(|| input.name.clone());
    if RESERVED_BUCKET_IDS.contains(&id.as_str()) {
        return Err(ApiFailure::invalid_request(format!("Bucket id `{id}` is reserved")));
    }
    let mut store = state.store.write().await;
    if store.buckets.contains_key(&id) {
        return Err(ApiFailure::duplicate());
    }
    let timestamp = now();
    let bucket = Bucket {
        id: id.clone(),
        name: input.name.clone(),
        owner: String::new(),
        public: input.public,
        file_size_limit: input.file_size_limit,
        allowed_mime_types: input.allowed_mime_types,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };
    store.buckets.insert(
        id,
        BucketEntry {
            bucket,
            objects: BTreeMap::new(),
        },
    );
    tracing::info!(bucket = %input.name, "bucket created");
    Ok(Json(json!({ "name": input.name })))
}

async fn update_bucket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let input: UpdateBucket = parse_json(&body)?;
    let mut store = state.store.write().await;
    let bucket = &mut store.bucket_mut(&id)?.bucket;
    if let Some(name) = input.name {
        bucket.name = name;
    }
    if let Some(public) = input.public {
        bucket.public = public;
    }
    if let Some(limit) = input.file_size_limit {
        bucket.file_size_limit = Some(limit);
    }
    if let Some(types) = input.allowed_mime_types {
        bucket.allowed_mime_types = Some(types);
    }
    bucket.updated_at = now();
    Ok(message("Successfully updated"))
}

async fn delete_bucket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    if !store.bucket(&id)?.objects.is_empty() {
        return Err(ApiFailure::bucket_not_empty());
    }
    store.buckets.remove(&id);
    tracing::info!(bucket = %id, "bucket deleted");
    Ok(message("Successfully deleted"))
}

async fn empty_bucket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    store.bucket_mut(&id)?.objects.clear();
    Ok(message("Successfully emptied"))
}

// --- objects ---

/// Immediate children of `prefix`: objects directly inside it, and one
/// folder entry per sub-folder. Sorted by name, then paged. A file and a
/// folder sharing a name are both listed.
fn list_entries(objects: &BTreeMap<String, StoredObject>, query: &ListObjects) -> Vec<Value> {
    let prefix = query.prefix.trim_matches('/');
    let dir = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    };

    let mut children: BTreeMap<(&str, bool), Option<&StoredObject>> = BTreeMap::new();
    for (key, object) in objects {
        let Some(rest) = key.strip_prefix(dir.as_str()) else {
            continue;
        };
        match rest.split_once('/') {
            Some((folder, _)) => {
                children.entry((folder, true)).or_insert(None);
            }
            None => {
                children.insert((rest, false), Some(object));
            }
        }
    }

    let descending = query
        .sort_by
        .as_ref()
        .is_some_and(|sort| sort.column == "name" && sort.order.eq_ignore_ascii_case("desc"));
    let mut ordered: Vec<_> = children.into_iter().collect();
    if descending {
        ordered.reverse();
    }

    ordered
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .map(|((name, _), object)| match object {
            None => json!({
                "name": name,
                "id": null,
                "updated_at": null,
                "created_at": null,
                "last_accessed_at": null,
                "metadata": null,
            }),
            Some(object) => json!({
                "name": name,
                "id": object.id,
                "updated_at": object.updated_at,
                "created_at": object.created_at,
                "last_accessed_at": object.last_accessed_at,
                "metadata": {
                    "eTag": object.etag(),
                    "size": object.data.len(),
                    "mimetype": object.content_type,
                    "cacheControl": CACHE_CONTROL,
                    "lastModified": object.updated_at,
                    "contentLength": object.data.len(),
                    "httpStatusCode": 200,
                },
            }),
        })
        .collect()
}

async fn list_objects(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Vec<Value>>> {
    let query: ListObjects = parse_json(&body)?;
    let store = state.store.read().await;
    Ok(Json(list_entries(&store.bucket(&bucket_id)?.objects, &query)))
}

async fn object_info(
    State(state): State<AppState>,
    Path((bucket_id, path)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let store = state.store.read().await;
    let object = store
        .bucket(&bucket_id)?
        .objects
        .get(&path)
        .ok_or_else(ApiFailure::object_not_found)?;
    Ok(Json(json!({
        "id": object.id,
        "name": path,
        "version": object.version,
        "size": object.data.len(),
        "content_type": object.content_type,
        "cache_control": CACHE_CONTROL,
        "etag": object.etag(),
        "metadata": {},
        "created_at": object.created_at,
    })))
}

async fn download_object(
    State(state): State<AppState>,
    Path((bucket_id, path)): Path<(String, String)>,
) -> ApiResult<Response> {
    let mut store = state.store.write().await;
    let object = store
        .bucket_mut(&bucket_id)?
        .objects
        .get_mut(&path)
        .ok_or_else(ApiFailure::object_not_found)?;
    object.last_accessed_at = now();
    Ok((
        [(header::CONTENT_TYPE, object.content_type.clone())],
        object.data.clone(),
    )
        .into_response())
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

fn check_size(bucket: &Bucket, data: &Bytes) -> ApiResult<()> {
    match bucket.file_size_limit {
        Some(limit) if limit > 0 && data.len() as u64 > limit => Err(ApiFailure::payload_too_large()),
        _ => Ok(()),
    }
}

async fn upload_object(
    State(state): State<AppState>,
    Path((bucket_id, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let entry = store.bucket_mut(&bucket_id)?;
    if entry.objects.contains_key(&path) {
        return Err(ApiFailure::duplicate());
    }
    check_size(&entry.bucket, &body)?;
    let timestamp = now();
    let object = StoredObject {
        id: Uuid::new_v4(),
        version: Uuid::new_v4(),
        data: body,
        content_type: content_type(&headers),
        created_at: timestamp.clone(),
        updated_at: timestamp.clone(),
        last_accessed_at: timestamp,
    };
    let id = object.id;
    entry.objects.insert(path.clone(), object);
    tracing::info!(bucket = %bucket_id, key = %path, "object uploaded");
    Ok(Json(json!({ "Key": format!("{bucket_id}/{path}"), "Id": id })))
}

async fn replace_object(
    State(state): State<AppState>,
    Path((bucket_id, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    let entry = store.bucket_mut(&bucket_id)?;
    check_size(&entry.bucket, &body)?;
    let object = entry
        .objects
        .get_mut(&path)
        .ok_or_else(ApiFailure::object_not_found)?;
    object.version = Uuid::new_v4();
    object.data = body;
    object.content_type = content_type(&headers);
    object.updated_at = now();
    Ok(Json(json!({ "Key": format!("{bucket_id}/{path}"), "Id": object.id })))
}

async fn delete_object(
    State(state): State<AppState>,
    Path((bucket_id, path)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    store
        .bucket_mut(&bucket_id)?
        .objects
        .remove(&path)
        .ok_or_else(ApiFailure::object_not_found)?;
    Ok(message("Successfully deleted"))
}

async fn move_object(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let input: MoveObject = parse_json(&body)?;
    let destination_bucket = input
        .destination_bucket
        .unwrap_or_else(|| input.bucket_id.clone());
    let mut store = state.store.write().await;

    store
        .bucket(&input.bucket_id)?
        .objects
        .get(&input.source_key)
        .ok_or_else(ApiFailure::object_not_found)?;
    if store
        .bucket(&destination_bucket)?
        .objects
        .contains_key(&input.destination_key)
    {
        return Err(ApiFailure::duplicate());
    }

    let mut object = store
        .bucket_mut(&input.bucket_id)?
        .objects
        .remove(&input.source_key)
        .ok_or_else(ApiFailure::object_not_found)?;
    object.updated_at = now();
    store
        .bucket_mut(&destination_bucket)?
        .objects
        .insert(input.destination_key, object);
    Ok(message("Successfully moved"))
}
