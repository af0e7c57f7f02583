//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::time::Duration;

use cmdpad_engine::{App, Settings};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings pointing at `server`'s `/analyze` endpoint.
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        endpoint: Url::parse(&format!("{}/analyze", server.uri())).unwrap(),
        timeout: Duration::from_secs(5),
        ..Settings::default()
    }
}

pub fn app_for(server: &MockServer) -> App {
    App::new(&settings_for(server)).unwrap()
}

/// Type `text` into the editor the way a user would.
pub fn type_text(app: &mut App, text: &str) {
    app.enter_insert_mode();
    let token = app.insert_token().expect("editor should accept input");
    app.insert_mode(token).enter_text(text);
    app.enter_normal_mode();
}

/// Mount a successful analyze response returning `lines`.
pub async fn mount_results(server: &MockServer, lines: &[&str], expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": lines })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount an error status response.
pub async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(status).set_body_string("internal failure"))
        .expect(1)
        .mount(server)
        .await;
}
