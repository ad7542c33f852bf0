//! Dataset and Command Mock Tests
//!
//! Tests for the feature modules layered on a connected `MsxClient`:
//! multipart dataset upload and remote command execution.

use std::io::Write;

use msx_sdk::{Configuration, Identity, MsxClient, MsxError, UNAUTHORIZED_PHRASE};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn run_blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Start a server that accepts token `T1` for organization `O1`
async fn connected_server() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "T1", "organization_id": "O1"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/validate"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&mock_server)
        .await;

    mock_server
}

fn connect(base_url: &str, min_stream_size: u64) -> MsxClient {
    let config = Configuration {
        base_url: base_url.to_string(),
        min_stream_size,
        ..Default::default()
    };
    MsxClient::with_config(Identity::from_credentials("a@b.com", "x"), config).unwrap()
}

fn write_dataset(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let file_path = dir.path().join(name);
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file_path
}

const CSV: &str = "text,label\nhello world,1\ngoodbye world,0\n";

// ============================================================================
// Dataset Tests
// ============================================================================

#[tokio::test]
async fn test_dataset_upload_with_pass_through_fields() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .and(header("Authorization", "Bearer T1"))
        .and(header("X-Org-Id", "O1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "O1/datasets/nlp_train.csv",
            "test_field1": "test_value1",
            "test_field2": "test_value2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_dataset(&dir, "nlp_train.csv", CSV);

    let uri = mock_server.uri();
    run_blocking(move || {
        let client = connect(&uri, 1024 * 1024);
        let upload = client
            .datasets()
            .add(
                &file_path,
                [("test_field1", "test_value1"), ("test_field2", "test_value2")],
            )
            .unwrap();

        assert_eq!(upload.path, "O1/datasets/nlp_train.csv");
        assert_eq!(upload.fields["test_field1"], "test_value1");
        assert_eq!(upload.fields["test_field2"], "test_value2");
    })
    .await;

    let requests = mock_server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/datasets")
        .unwrap();
    let content_type = upload.headers["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("name=\"test_field1\""));
    assert!(body.contains("test_value1"));
    assert!(body.contains("filename=\"nlp_train.csv\""));
    assert!(body.contains("hello world,1"));
}

#[tokio::test]
async fn test_dataset_upload_streams_large_files() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"path": "O1/datasets/big.csv"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_dataset(&dir, "big.csv", CSV);

    let uri = mock_server.uri();
    run_blocking(move || {
        // Every file is at least one byte, so this always takes the streaming path
        let client = connect(&uri, 1);
        let upload = client
            .datasets()
            .add(&file_path, Vec::<(String, String)>::new())
            .unwrap();
        assert_eq!(upload.path, "O1/datasets/big.csv");
        assert!(upload.fields.is_empty());
    })
    .await;

    let requests = mock_server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/datasets")
        .unwrap();
    assert!(String::from_utf8_lossy(&upload.body).contains("goodbye world,0"));
}

#[tokio::test]
async fn test_dataset_upload_rejects_disallowed_extension() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": "never"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_dataset(&dir, "notes.txt", "not a dataset");

    let uri = mock_server.uri();
    let result = run_blocking(move || {
        let client = connect(&uri, 1024);
        client
            .datasets()
            .add(&file_path, [("k", "v")])
            .map(|u| u.path)
    })
    .await;

    assert!(matches!(result, Err(MsxError::UnsupportedFile(_))));
}

#[tokio::test]
async fn test_dataset_upload_missing_file() {
    let mock_server = connected_server().await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("missing.parquet");

    let uri = mock_server.uri();
    let result = run_blocking(move || {
        let client = connect(&uri, 1024);
        client
            .datasets()
            .add(&file_path, [("k", "v")])
            .map(|u| u.path)
    })
    .await;

    assert!(matches!(result, Err(MsxError::Io(_))));
}

#[tokio::test]
async fn test_dataset_upload_error_envelope() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(413).set_body_json(json!({"error": "quota exceeded"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_dataset(&dir, "train.JSON", "[{\"a\": 1}]");

    let uri = mock_server.uri();
    let result = run_blocking(move || {
        let client = connect(&uri, 1024);
        client
            .datasets()
            .add(&file_path, [("k", "v")])
            .map(|u| u.path)
    })
    .await;

    match result {
        Err(MsxError::ApiResponse(err)) => assert_eq!(err.error, "quota exceeded"),
        other => panic!("expected ApiResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dataset_upload_from_reader_spools_to_temp_dir() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .and(header("X-Org-Id", "O1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"path": "O1/datasets/export.csv"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let spool_dir = tempfile::tempdir().unwrap();
    let spool_path = spool_dir.path().to_path_buf();

    let uri = mock_server.uri();
    run_blocking(move || {
        let config = Configuration {
            base_url: uri,
            temp_dir: spool_path.clone(),
            ..Default::default()
        };
        let client =
            MsxClient::with_config(Identity::from_credentials("a@b.com", "x"), config).unwrap();
        let upload = client
            .datasets()
            .add_reader(
                "export.csv",
                std::io::Cursor::new(CSV.as_bytes()),
                [("source", "stdin")],
            )
            .unwrap();
        assert_eq!(upload.path, "O1/datasets/export.csv");

        // The scratch copy is gone once the upload returns
        assert_eq!(std::fs::read_dir(&spool_path).unwrap().count(), 0);
    })
    .await;

    let requests = mock_server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/datasets")
        .unwrap();
    let body = String::from_utf8_lossy(&upload.body);
    assert!(body.contains("filename=\"export.csv\""));
    assert!(body.contains("name=\"source\""));
    assert!(body.contains("hello world,1"));
}

#[tokio::test]
async fn test_dataset_upload_from_reader_rejects_disallowed_extension() {
    let mock_server = connected_server().await;
    let spool_dir = tempfile::tempdir().unwrap();
    let spool_path = spool_dir.path().to_path_buf();

    let uri = mock_server.uri();
    let result = run_blocking(move || {
        let config = Configuration {
            base_url: uri,
            temp_dir: spool_path.clone(),
            ..Default::default()
        };
        let client =
            MsxClient::with_config(Identity::from_credentials("a@b.com", "x"), config).unwrap();
        let result = client.datasets().add_reader(
            "notes.txt",
            std::io::Cursor::new(b"not a dataset".to_vec()),
            Vec::<(String, String)>::new(),
        );
        // Rejected before anything is spooled
        assert_eq!(std::fs::read_dir(&spool_path).unwrap().count(), 0);
        result.map(|u| u.path)
    })
    .await;

    assert!(matches!(result, Err(MsxError::UnsupportedFile(_))));
}

// ============================================================================
// Command Tests
// ============================================================================

#[tokio::test]
async fn test_run_command() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/commands"))
        .and(header("Authorization", "Bearer T1"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Org-Id", "O1"))
        .and(body_json(json!({
            "command": "metastore",
            "args": ["list", "-b", "default"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stdout": "table_a\ntable_b\n",
            "stderr": ""
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    run_blocking(move || {
        let client = connect(&uri, 1024);
        let output = client
            .commands()
            .run("metastore", ["list", "-b", "default"])
            .unwrap();
        assert_eq!(output.stdout, "table_a\ntable_b\n");
        assert_eq!(output.stderr, "");
    })
    .await;
}

#[tokio::test]
async fn test_run_command_unauthorized() {
    let mock_server = connected_server().await;

    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": UNAUTHORIZED_PHRASE})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = run_blocking(move || {
        let client = connect(&uri, 1024);
        client
            .commands()
            .run("metastore", Vec::<String>::new())
            .map(|o| o.stdout)
    })
    .await;

    assert!(matches!(result, Err(MsxError::InvalidToken)));
}
