#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keyward::auth::{MemoryCredentialStore, TokenAuthenticator};
use keyward::config::KeywardConfig;
use keyward::guard::Notifier;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROBE: &str = "/login/test_auth_endpoint";
pub const REFRESH: &str = "/login/token/refresh";
pub const LOGIN: &str = "/login/token";

pub fn config_for(server: &MockServer) -> KeywardConfig {
    KeywardConfig::default()
        .with_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(2))
}

pub fn authenticator(
    store: Arc<MemoryCredentialStore>,
    server: &MockServer,
) -> TokenAuthenticator {
    TokenAuthenticator::new(store, &config_for(server))
}

pub async fn probe_responds(server: &MockServer, token: &str, status: u16, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(PROBE))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn refresh_responds(
    server: &MockServer,
    refresh_token: &str,
    response: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_string(format!("refresh_token={refresh_token}")))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}

/// Notifier that records every message it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .expect("notifier lock poisoned")
            .push(message.to_string());
    }
}
