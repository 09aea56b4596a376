//! Integration tests for the bounded downloader using wiremock.

use std::time::Duration;

use station_core::{DownloadError, Downloader};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn downloader() -> Downloader {
    Downloader::new(Duration::from_secs(5), false).unwrap()
}

async fn serve(body: Vec<u8>) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payload"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_download_success_terminates_buffer() {
    let mock_server = serve(b"{\"ok\":true}".to_vec()).await;
    let mut buffer = vec![0xAAu8; 64];

    let written = downloader()
        .download(&format!("{}/payload", mock_server.uri()), &mut buffer)
        .await
        .unwrap();

    assert_eq!(written, 11);
    assert_eq!(&buffer[..written], b"{\"ok\":true}");
    assert_eq!(buffer[written], 0);
}

#[tokio::test]
async fn test_download_truncates_at_capacity_minus_one() {
    let mock_server = serve(vec![b'x'; 100]).await;
    let mut buffer = vec![0u8; 16];

    let err = downloader()
        .download(&format!("{}/payload", mock_server.uri()), &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Truncated { written: 15 }));
    assert!(buffer[..15].iter().all(|b| *b == b'x'));
    assert_eq!(buffer[15], 0);
}

#[tokio::test]
async fn test_download_exact_fit_is_not_truncated() {
    let mock_server = serve(vec![b'y'; 15]).await;
    let mut buffer = vec![0xFFu8; 16];

    let written = downloader()
        .download(&format!("{}/payload", mock_server.uri()), &mut buffer)
        .await
        .unwrap();

    assert_eq!(written, 15);
    assert_eq!(buffer[15], 0);
}

#[tokio::test]
async fn test_download_empty_body() {
    let mock_server = serve(Vec::new()).await;
    let mut buffer = vec![0xFFu8; 8];

    let written = downloader()
        .download(&format!("{}/payload", mock_server.uri()), &mut buffer)
        .await
        .unwrap();

    assert_eq!(written, 0);
    assert_eq!(buffer[0], 0);
}

#[tokio::test]
async fn test_download_http_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let mut buffer = vec![0u8; 64];
    let err = downloader()
        .download(&format!("{}/missing", mock_server.uri()), &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::HttpStatus(404)));
}

#[tokio::test]
async fn test_download_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let downloader = Downloader::new(Duration::from_millis(50), false).unwrap();
    let mut buffer = vec![0u8; 64];
    let err = downloader
        .download(&format!("{}/slow?appid=SECRET", mock_server.uri()), &mut buffer)
        .await
        .unwrap_err();

    assert!(!err.to_string().contains("SECRET"));
    match err {
        DownloadError::Network(e) => assert!(e.is_timeout()),
        other => panic!("expected a network timeout, got {other:?}"),
    }
}
