//! Engine tests against a mock repository host.

use std::collections::BTreeMap;
use strings_sync_core::{
    CredentialStore, KeyAndValue, Language, LoadError, LoadingState, LoginError,
    MemoryCredentialStore, Platform, RequestError, ReqwestClient, SettingsStore, StringEditError,
    SyncEngine, SyncSettings,
};
use tempfile::tempdir;
use uuid::Uuid;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPO: &str = "/2.0/repositories/pillboxer/henry-test-repo";
const AUTH: &str = "Basic dXNlcjpwYXNz";

fn commits_body(hash: &str, message: &str) -> String {
    format!(r#"{{"values":[{{"hash":"{hash}","rendered":{{"message":{{"raw":"{message}"}}}}}}]}}"#)
}

async fn mount_commits(server: &MockServer, hash: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .and(header("Authorization", AUTH))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_string(commits_body(hash, "Update strings")))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_file(server: &MockServer, hash: &str, platform: Platform, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/{}", platform.platform_path(hash))))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn engine(
    server: &MockServer,
    platform: Platform,
) -> SyncEngine<ReqwestClient, MemoryCredentialStore> {
    let settings = SyncSettings::default()
        .with_platform(platform)
        .with_api_base(server.uri());
    SyncEngine::new(
        ReqwestClient::new(),
        MemoryCredentialStore::preloaded("user", "pass"),
        SettingsStore::in_memory(settings),
    )
}

#[tokio::test]
async fn test_load_pulls_file_at_latest_commit() {
    let server = MockServer::start().await;
    let key = format!("key_{}", Uuid::new_v4().simple());
    mount_commits(&server, "f00d", 1).await;
    mount_file(
        &server,
        "f00d",
        Platform::Ios,
        &format!(r#"{{"strings":{{"{key}":"value"}}}}"#),
    )
    .await;

    let mut engine = engine(&server, Platform::Ios);
    engine.load().await.unwrap();

    assert_eq!(engine.pinned_hash(), Some("f00d"));
    assert_eq!(engine.latest_message(), Some("Update strings"));
    assert_eq!(
        engine.latest_strings().unwrap().display_entries(),
        vec![KeyAndValue::new(key, "value")]
    );
    assert_eq!(engine.state(), &LoadingState::Complete);
}

#[tokio::test]
async fn test_add_to_strings_commits_form_body() {
    let server = MockServer::start().await;
    let key = format!("key_{}", Uuid::new_v4().simple());
    mount_commits(&server, "beef", 1).await;
    mount_file(&server, "beef", Platform::Ios, r#"{"strings":{"hello":"world"}}"#).await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/src")))
        .and(header("Authorization", AUTH))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("&message=Add%20key&branch=develop"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine(&server, Platform::Ios);
    engine
        .add_to_strings(&[KeyAndValue::new(&key, "v")], &BTreeMap::new(), "Add key")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let push = requests.last().unwrap();
    let body = String::from_utf8(push.body.clone()).unwrap();
    assert!(body.starts_with("/ios/strings/v1/ios-strings-base.json=%7B"));
    assert!(body.contains(&format!("%22{key}%22%3A%20%22v%22")));
    assert_eq!(engine.state(), &LoadingState::Complete);
}

#[tokio::test]
async fn test_rejected_login_leaves_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let settings = SyncSettings::default().with_api_base(server.uri());
    let mut engine = SyncEngine::new(
        ReqwestClient::new(),
        MemoryCredentialStore::new(),
        SettingsStore::in_memory(settings),
    );

    let result = engine.check_credentials("user", "wrong").await;
    assert_eq!(result, Err(LoginError::BadCredentials));
    assert!(engine.credential_store().credentials().is_none());
    assert_eq!(engine.state(), &LoadingState::Error(LoadError::BadCredentials));
}

#[tokio::test]
async fn test_change_platform_skips_commit_fetch() {
    let server = MockServer::start().await;
    mount_commits(&server, "c0ffee", 1).await;
    mount_file(&server, "c0ffee", Platform::Ios, r#"{"strings":{}}"#).await;
    mount_file(
        &server,
        "c0ffee",
        Platform::Android,
        r#"{"content_version":5,"translation_dictionaries":[{"lang":"de","map":{"hallo":"welt"}}]}"#,
    )
    .await;

    let mut engine = engine(&server, Platform::Ios);
    engine.load().await.unwrap();
    engine.change_platform(Platform::Android).await.unwrap();

    let strings = engine.latest_strings().unwrap();
    assert_eq!(strings.platform(), Platform::Android);
    let entries = strings.display_entries();
    assert_eq!(entries[0], KeyAndValue::content_version("5"));
    assert!(entries.contains(&KeyAndValue::new("hallo", "welt").with_language(Language::De)));
    assert_eq!(engine.pinned_hash(), Some("c0ffee"));
}

#[tokio::test]
async fn test_platform_choice_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/commits")))
        .respond_with(ResponseTemplate::new(200).set_body_string(commits_body("abc", "m")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let settings_path = dir.path().join("settings.json");
    let settings = SyncSettings::default().with_api_base(server.uri());
    settings.save_to(&settings_path).unwrap();

    let mut engine = SyncEngine::new(
        ReqwestClient::new(),
        MemoryCredentialStore::preloaded("user", "pass"),
        SettingsStore::open(&settings_path).unwrap(),
    );
    // No commit pinned yet, so the re-pull fails but the choice still sticks.
    assert!(engine.change_platform(Platform::Android).await.is_err());

    let reopened = SettingsStore::open(&settings_path).unwrap();
    assert_eq!(reopened.platform(), Platform::Android);
    assert_eq!(reopened.settings().api_base.as_deref(), Some(server.uri().as_str()));
}

#[tokio::test]
async fn test_server_errors_surface_status_code() {
    let server = MockServer::start().await;
    mount_commits(&server, "dead", 1).await;
    Mock::given(method("GET"))
        .and(path(format!("{REPO}/{}", Platform::Ios.platform_path("dead"))))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut engine = engine(&server, Platform::Ios);
    let err = engine.load().await.unwrap_err();

    assert_eq!(err, LoadError::Request(RequestError::BadResponseCode(503)));
    assert!(engine.latest_strings().is_none());
    assert!(engine.credential_store().credentials().is_some());
}

#[tokio::test]
async fn test_rejected_push_forgets_credentials() {
    let server = MockServer::start().await;
    mount_commits(&server, "cafe", 1).await;
    mount_file(&server, "cafe", Platform::Ios, r#"{"strings":{}}"#).await;
    Mock::given(method("POST"))
        .and(path(format!("{REPO}/src")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    let settings = SyncSettings::default().with_api_base(server.uri());
    let mut engine = SyncEngine::new(
        ReqwestClient::with_client(client),
        MemoryCredentialStore::preloaded("user", "pass"),
        SettingsStore::in_memory(settings),
    );

    let err = engine
        .add_to_strings(&[KeyAndValue::new("fresh", "v")], &BTreeMap::new(), "Add fresh")
        .await
        .unwrap_err();

    assert_eq!(err, StringEditError::Request(RequestError::BadCredentials));
    assert!(engine.credential_store().credentials().is_none());
    assert_eq!(engine.state(), &LoadingState::Error(LoadError::BadCredentials));
    assert_eq!(engine.pinned_hash(), Some("cafe"));
}
