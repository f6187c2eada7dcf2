//! HTTP transport against a local mock server.

use std::time::{Duration, Instant};
use texcache::{HttpTransport, TransferHandle, Transport};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes
}

fn wait_until_done(handle: &dyn TransferHandle) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_done() {
        assert!(Instant::now() < deadline, "transfer did not finish in time");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_download_reports_bytes_and_dimensions() {
    let mut server = mockito::Server::new();
    let body = png_bytes(64, 32);
    let _mock = server
        .mock("GET", "/img.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(body.clone())
        .create();

    let transport = HttpTransport::new().unwrap();
    let handle = transport.begin(&format!("{}/img.png", server.url()));
    wait_until_done(handle.as_ref());

    assert!(handle.error().is_none());
    assert_eq!(handle.bytes().as_ref(), body.as_slice());
    assert_eq!(handle.decoded_size(), (64, 32));
    assert_eq!(handle.progress(), 1.0);
}

#[test]
fn test_http_error_status_surfaces_as_failure() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/missing.png")
        .with_status(404)
        .create();

    let transport = HttpTransport::new().unwrap();
    let handle = transport.begin(&format!("{}/missing.png", server.url()));
    wait_until_done(handle.as_ref());

    assert!(handle.error().is_some());
    assert_eq!(handle.bytes().len(), 0);
    assert_eq!(handle.decoded_size(), (0, 0));
}

#[test]
fn test_non_image_body_has_unknown_dimensions() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_body("just some text")
        .create();

    let transport = HttpTransport::new().unwrap();
    let handle = transport.begin(&format!("{}/notes.txt", server.url()));
    wait_until_done(handle.as_ref());

    assert!(handle.error().is_none());
    assert_eq!(handle.bytes().as_ref(), b"just some text");
    assert_eq!(handle.decoded_size(), (0, 0));
}
