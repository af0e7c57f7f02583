//! Submitting commands against a mocked analysis service

use std::time::Duration;

use cmdpad_engine::{Phase, Severity, SubmitOutcome};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{app_for, mount_results, mount_status, type_text};

#[tokio::test]
async fn results_are_joined_into_output() {
    let server = MockServer::start().await;
    mount_results(&server, &["a", "b"], 1).await;

    let mut app = app_for(&server);
    type_text(&mut app, "mkdisk -size=5 -unit=M");
    assert_eq!(app.submit(), SubmitOutcome::Started);
    assert_eq!(app.phase(), Phase::Loading);

    app.wait_for_settlement().await;
    assert_eq!(app.output_text(), "a\nb");
    assert_eq!(app.phase(), Phase::Succeeded);

    let notification = app.notification().unwrap();
    assert_eq!(notification.text(), "Execution completed successfully");
    assert_eq!(notification.severity(), Severity::Success);
}

#[tokio::test]
async fn raw_input_is_sent_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(serde_json::json!({ "command": "  login -user=root\n\n" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_text(&mut app, "  login -user=root\n\n");
    app.submit();
    app.wait_for_settlement().await;
    assert_eq!(app.phase(), Phase::Succeeded);
    assert_eq!(app.output_text(), "");
}

#[tokio::test]
async fn blank_input_makes_no_request() {
    let server = MockServer::start().await;
    mount_results(&server, &["never"], 0).await;

    let mut app = app_for(&server);
    type_text(&mut app, "   \n\t");
    assert_eq!(app.submit(), SubmitOutcome::EmptyInput);
    assert_eq!(app.phase(), Phase::Idle);

    let notification = app.notification().unwrap();
    assert_eq!(
        notification.text(),
        "The text area is empty. Please enter a command or load a file."
    );
    assert_eq!(notification.severity(), Severity::Error);
}

#[tokio::test]
async fn server_error_is_reported_in_output() {
    let server = MockServer::start().await;
    mount_status(&server, 500).await;

    let mut app = app_for(&server);
    type_text(&mut app, "rep -id=A1");
    app.submit();
    app.wait_for_settlement().await;

    assert_eq!(app.phase(), Phase::Failed);
    assert!(app.output_text().starts_with("Error: "));
    assert_eq!(app.output_text(), "Error: network or server response error");
    assert_eq!(
        app.notification().unwrap().text(),
        "Execution failed: network or server response error"
    );
}

#[tokio::test]
async fn malformed_success_body_is_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_text(&mut app, "rep");
    app.submit();
    app.wait_for_settlement().await;

    assert_eq!(app.phase(), Phase::Failed);
    assert_eq!(app.output_text(), "Error: unknown error");
}

#[tokio::test]
async fn second_submit_while_loading_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "results": ["once"] }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_text(&mut app, "mount");
    assert_eq!(app.submit(), SubmitOutcome::Started);
    assert_eq!(app.submit(), SubmitOutcome::Busy);
    assert!(!app.reset());

    app.wait_for_settlement().await;
    assert_eq!(app.output_text(), "once");
}

#[tokio::test]
async fn resubmit_after_failure_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_results(&server, &["recovered"], 1).await;

    let mut app = app_for(&server);
    type_text(&mut app, "rep");
    app.submit();
    app.wait_for_settlement().await;
    assert_eq!(app.phase(), Phase::Failed);

    app.submit();
    app.wait_for_settlement().await;
    assert_eq!(app.phase(), Phase::Succeeded);
    assert_eq!(app.output_text(), "recovered");
}

#[tokio::test]
async fn reset_after_success_clears_everything() {
    let server = MockServer::start().await;
    mount_results(&server, &["x", "y", "z"], 1).await;

    let mut app = app_for(&server);
    type_text(&mut app, "a\nb\nc");
    app.submit();
    app.wait_for_settlement().await;

    assert!(app.reset());
    assert_eq!(app.input_text(), "");
    assert_eq!(app.output_text(), "");
    assert_eq!(app.phase(), Phase::Idle);
    assert_eq!(app.line_sync().index().count(), 1);

    let notification = app.notification().unwrap();
    assert_eq!(notification.text(), "Fields cleared successfully");
    assert_eq!(notification.severity(), Severity::Info);
}
