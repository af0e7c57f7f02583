//! Loading command files into the editor

use std::fs;
use std::path::PathBuf;

use cmdpad_engine::{ContentType, IngestStart, SessionError, Severity};
use wiremock::MockServer;

use crate::common::{app_for, mount_results, type_text};

#[tokio::test]
async fn text_file_replaces_input_and_submits() {
    let server = MockServer::start().await;
    mount_results(&server, &["ok"], 1).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("script.txt");
    fs::write(&file, "mkdisk -size=3\nfdisk -size=1\nmount\n").unwrap();

    let mut app = app_for(&server);
    type_text(&mut app, "old text");
    assert_eq!(app.load_file(file), IngestStart::Started);
    app.wait_for_settlement().await;

    assert_eq!(app.input_text(), "mkdisk -size=3\nfdisk -size=1\nmount\n");
    assert_eq!(app.line_sync().index().count(), 4);
    assert_eq!(app.notification().unwrap().text(), "File loaded successfully");

    app.submit();
    app.wait_for_settlement().await;
    assert_eq!(app.output_text(), "ok");
}

#[tokio::test]
async fn png_never_mutates_input() {
    let server = MockServer::start().await;
    let mut app = app_for(&server);
    type_text(&mut app, "keep");

    let outcome = app.load_file(PathBuf::from("screenshot.png"));
    assert_eq!(
        outcome,
        IngestStart::Rejected(SessionError::UnsupportedFileType(ContentType::Png))
    );
    app.wait_for_settlement().await;

    assert_eq!(app.input_text(), "keep");
    let notification = app.notification().unwrap();
    assert_eq!(notification.text(), "Please select a text file (.txt)");
    assert_eq!(notification.severity(), Severity::Error);
}

#[tokio::test]
async fn unreadable_file_keeps_input() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let mut app = app_for(&server);
    type_text(&mut app, "keep");
    assert_eq!(
        app.load_file(dir.path().join("missing.txt")),
        IngestStart::Started
    );
    app.wait_for_settlement().await;

    assert_eq!(app.input_text(), "keep");
    assert_eq!(app.notification().unwrap().text(), "Error reading file");
}
