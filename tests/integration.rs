use std::env;
use std::sync::Arc;
use std::time::Duration;

use all_asserts::{assert_false, assert_true};
use mockito::{Matcher, ServerGuard};
use serial_test::serial;

use image_uploader::client::UploadClient;
use image_uploader::config::UploaderConfig;
use image_uploader::error::UploaderError;
use image_uploader::file::SelectedFile;
use image_uploader::widget::{UploadState, UploadWidget};

/// These tests drive the widget end to end against a mock upload API.  The last
/// test runs against a real endpoint and is ignored by default.  To run it, set
/// IMAGE_UPLOADER_TEST_ENDPOINT (and optionally IMAGE_UPLOADER_TEST_STORAGE_URL).

const STORAGE_BASE: &str = "https://catalog.example.net/storage-images";

fn create_widget(server: &ServerGuard) -> UploadWidget {
    let config = UploaderConfig {
        upload_endpoint: server.url(),
        storage_base_url: STORAGE_BASE.to_string(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    UploadWidget::new(config.clone(), Arc::new(UploadClient::new(&config)))
}

fn small_file() -> SelectedFile {
    SelectedFile::new("sunset.jpg", "pretend these are jpeg bytes")
}

#[tokio::test]
async fn test_upload_and_link() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .match_body(Matcher::Regex(
            r#"name="file"; filename="sunset.jpg""#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"62ef3b70c6997747ea7dc961"}"#)
        .expect(1)
        .create_async()
        .await;

    let widget = create_widget(&server);
    widget.select_file(small_file());

    let state = widget.submit().await.unwrap();

    assert_eq!(state, UploadState::Done);
    assert_eq!(
        widget.result_link().unwrap(),
        format!("{}/62ef3b70c6997747ea7dc961", STORAGE_BASE)
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_oversize_file_never_reaches_the_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .expect(0)
        .create_async()
        .await;

    let widget = create_widget(&server);
    widget.select_file(SelectedFile::new("huge.bin", vec![0_u8; 2_097_153]));

    assert_true!(widget.oversize_warning());
    let err = widget.submit().await.unwrap_err();
    assert_true!(matches!(err, UploaderError::NoFileSelected));
    assert_eq!(widget.state(), UploadState::Idle);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_then_recovery() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("POST", "/")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let widget = create_widget(&server);
    widget.select_file(small_file());

    let state = widget.submit().await.unwrap();

    assert_eq!(state, UploadState::Failed);
    assert_true!(widget.result_link().is_none());
    let view = widget.render();
    assert_true!(view.error_message.unwrap().contains("503"));
    assert_true!(view.submit_enabled);
    failing.assert_async().await;
    failing.remove_async().await;

    let working = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"id":"second-try"}"#)
        .create_async()
        .await;

    let state = widget.submit().await.unwrap();

    assert_eq!(state, UploadState::Done);
    assert_eq!(
        widget.result_link().unwrap(),
        format!("{}/second-try", STORAGE_BASE)
    );
    assert_false!(widget.render().error_message.is_some());
    working.assert_async().await;
}

#[tokio::test]
async fn test_missing_id_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"url":"somewhere"}"#)
        .create_async()
        .await;

    let widget = create_widget(&server);
    widget.select_file(small_file());

    let state = widget.submit().await.unwrap();

    assert_eq!(state, UploadState::Failed);
    assert_true!(widget.failure().unwrap().contains("id"));
    assert_true!(widget.receipt().is_none());
    mock.assert_async().await;
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_real_endpoint() {
    let endpoint = env::var("IMAGE_UPLOADER_TEST_ENDPOINT").unwrap();
    let config = UploaderConfig {
        upload_endpoint: endpoint,
        storage_base_url: env::var("IMAGE_UPLOADER_TEST_STORAGE_URL")
            .unwrap_or_else(|_| UploaderConfig::default().storage_base_url),
        ..Default::default()
    };
    let widget = UploadWidget::new(config.clone(), Arc::new(UploadClient::new(&config)));
    widget.select_file(SelectedFile::new(
        "image_uploader_integration.txt",
        "some content",
    ));

    let state = widget.submit().await.unwrap();

    assert_eq!(state, UploadState::Done);
    assert_true!(widget
        .result_link()
        .unwrap()
        .starts_with(&config.storage_base_url));
}
