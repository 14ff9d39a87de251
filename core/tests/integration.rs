//! Full storage lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP through `UreqTransport`.

use storage_core::{
    CreateBucket, ListOptions, MoveRequest, Outcome, StorageClient, StorageConfig, UpdateBucket,
};

const API_KEY: &str = "integration-key";

/// Start the mock server on a background runtime and return its base URL.
fn start_server(api_key: Option<&str>) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let api_key = api_key.map(str::to_string);

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, api_key).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn storage_lifecycle() {
    let base_url = start_server(Some(API_KEY));
    let client = StorageClient::new(StorageConfig::new(&base_url).with_api_key(API_KEY));

    // Step 1: health.
    assert_eq!(client.health(), Outcome::Body(true));

    // Step 2: no buckets yet.
    assert_eq!(client.list_buckets(), Outcome::Body(Vec::new()));

    // Step 3: create a bucket, then a duplicate.
    let bucket = CreateBucket {
        file_size_limit: Some(1024),
        ..CreateBucket::new("docs")
    };
    assert_eq!(client.create_bucket(&bucket), Outcome::Body("docs".to_string()));
    let duplicate = client.create_bucket(&bucket);
    assert_eq!(duplicate.api_error().and_then(|e| e.status_code()), Some("409"));

    // Step 4: get, update, get again.
    let fetched = client.get_bucket("docs").into_body().unwrap();
    assert_eq!(fetched.id, "docs");
    assert!(!fetched.is_public);
    assert_eq!(fetched.file_size_limit, Some(1024));

    let changes = UpdateBucket {
        is_public: Some(true),
        ..UpdateBucket::default()
    };
    assert!(client.update_bucket("docs", &changes).is_body());
    let fetched = client.get_bucket("docs").into_body().unwrap();
    assert!(fetched.is_public);
    assert_eq!(fetched.file_size_limit, Some(1024));

    // Step 5: missing bucket is an API error, not a failure.
    let missing = client.get_bucket("missing");
    let info = missing.api_error().unwrap();
    assert_eq!(info.status_code(), Some("404"));
    assert_eq!(info.message(), Some("Bucket not found"));

    // Step 6: upload, duplicate upload, oversized upload.
    let identity = client.upload_file("docs", "notes/a.txt", "hello").into_body().unwrap();
    assert_eq!(identity.key, "docs/notes/a.txt");
    let again = client.upload_file("docs", "notes/a.txt", "hello");
    assert_eq!(again.api_error().and_then(|e| e.error_code()), Some("Duplicate"));
    let oversized = client.upload_file("docs", "big.bin", vec![0u8; 2048]);
    assert_eq!(oversized.api_error().and_then(|e| e.status_code()), Some("413"));

    // Step 7: update keeps identity, download sees new contents.
    let updated = client.update_file("docs", "notes/a.txt", "hello again").into_body().unwrap();
    assert_eq!(updated.id, identity.id);
    assert_eq!(
        client.download_file("docs", "notes/a.txt"),
        Outcome::Body("hello again".to_string())
    );
    assert_eq!(
        client.download_file_bytes("docs", "notes/a.txt"),
        Outcome::Body(b"hello again".to_vec())
    );

    // Step 8: file info.
    let info = client.get_file_info("docs", "notes/a.txt").into_body().unwrap();
    assert_eq!(info.id, identity.id.to_string());
    assert_eq!(info.size, 11);

    // Step 9: listings at the root and inside the folder.
    let root = client.list_files("docs", &ListOptions::default()).into_body().unwrap();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].name, "notes");
    assert!(root[0].is_folder());

    let notes = client.list_files("docs", &ListOptions::in_folder("notes")).into_body().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].name, "a.txt");
    assert_eq!(notes[0].metadata.as_ref().map(|m| m.size), Some(11));

    // Step 10: move, then the old key is gone.
    let request = MoveRequest {
        source_bucket_id: "docs".into(),
        source_file_path: "notes/a.txt".into(),
        destination_bucket_id: "docs".into(),
        destination_file_path: "a.txt".into(),
    };
    assert!(client.move_file(&request).is_body());
    let gone = client.download_file("docs", "notes/a.txt");
    assert_eq!(gone.api_error().and_then(|e| e.error_code()), Some("not_found"));

    // Step 11: a non-empty bucket cannot be deleted until emptied.
    assert!(client.delete_bucket("docs").is_api_error());
    assert!(client.delete_file("docs", "a.txt").is_body());
    assert!(client.delete_file("docs", "a.txt").is_api_error());
    assert!(client.upload_file("docs", "b.txt", "b").is_body());
    assert!(client.empty_bucket("docs").is_body());
    assert!(client.delete_bucket("docs").is_body());

    // Step 12: back to no buckets.
    assert_eq!(client.list_buckets(), Outcome::Body(Vec::new()));
}

#[test]
fn missing_api_key_is_rejected_as_api_error() {
    let base_url = start_server(Some(API_KEY));
    let client = StorageClient::new(StorageConfig::new(&base_url));
    let outcome = client.list_buckets();
    assert_eq!(outcome.api_error().and_then(|e| e.status_code()), Some("403"));
}

#[test]
fn unreachable_server_is_transport_failure() {
    // Bind and immediately drop a listener so the port is closed.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = StorageClient::new(StorageConfig::new(&format!("http://{addr}")));
    let outcome = client.health();
    assert!(outcome.body().is_none());
    assert!(outcome.api_error().is_none());
    assert!(outcome.transport_failure().is_some());
}
