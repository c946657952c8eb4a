mod auth_support;

use std::sync::Arc;

use keyward::auth::{
    AuthCheck, AuthService, CredentialStore, FileCredentialStore, HttpProfileFetcher,
    MemoryCredentialStore, Navigation, SessionStatus, TokenAuthenticator,
};
use keyward::error::KeywardError;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{config_for, probe_responds, request_count, PROBE};

fn service(store: Arc<dyn CredentialStore>, server: &MockServer) -> AuthService {
    let config = config_for(server);
    let auth = Arc::new(TokenAuthenticator::new(store.clone(), &config));
    let profile = Arc::new(HttpProfileFetcher::new(store, &config));
    AuthService::new(auth, profile)
}

#[tokio::test]
async fn logout_clears_both_slots_and_reloads_root() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::with_credentials("abc", "r-1"));
    let svc = service(store.clone(), &server);

    assert_eq!(
        svc.logout().unwrap(),
        Navigation::FullReload {
            path: "/".to_string()
        }
    );
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn status_without_token_is_logged_out() {
    let server = MockServer::start().await;
    let svc = service(Arc::new(MemoryCredentialStore::new()), &server);

    assert_eq!(svc.status().await.unwrap(), SessionStatus::LoggedOut);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn status_reports_the_backend_verdict() {
    let server = MockServer::start().await;
    probe_responds(&server, "abc", 200, 1).await;
    let svc = service(
        Arc::new(MemoryCredentialStore::with_credentials("abc", "r-1")),
        &server,
    );

    assert_eq!(
        svc.status().await.unwrap(),
        SessionStatus::Checked(AuthCheck::Valid)
    );
}

#[tokio::test]
async fn current_profile_reads_the_role() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_user": {
                "role": "manager",
                "email": "m@example.com",
                "first_name": "Mara"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let svc = service(
        Arc::new(MemoryCredentialStore::with_credentials("abc", "r-1")),
        &server,
    );

    let profile = svc.current_profile().await.unwrap();
    assert_eq!(profile.role(), "manager");
    assert_eq!(profile.current_user.email.as_deref(), Some("m@example.com"));
    assert_eq!(profile.current_user.extra["first_name"], json!("Mara"));
}

#[tokio::test]
async fn current_profile_requires_a_token() {
    let server = MockServer::start().await;
    let svc = service(Arc::new(MemoryCredentialStore::new()), &server);

    assert!(matches!(
        svc.current_profile().await,
        Err(KeywardError::Authentication(_))
    ));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn file_store_keeps_session_across_instances() {
    let server = MockServer::start().await;
    probe_responds(&server, "abc", 200, 1).await;
    let dir = TempDir::new().unwrap();

    let first = Arc::new(FileCredentialStore::new(dir.path().to_path_buf()));
    first.set_access_token("abc").unwrap();
    first.set_refresh_token("r-1").unwrap();
    drop(first);

    let second = Arc::new(FileCredentialStore::new(dir.path().to_path_buf()));
    assert_eq!(second.refresh_token().unwrap().as_deref(), Some("r-1"));
    let svc = service(second.clone(), &server);
    assert_eq!(
        svc.status().await.unwrap(),
        SessionStatus::Checked(AuthCheck::Valid)
    );

    svc.logout().unwrap();
    let third = FileCredentialStore::new(dir.path().to_path_buf());
    assert_eq!(third.access_token().unwrap(), None);
    assert_eq!(third.refresh_token().unwrap(), None);
}
