//! update-creds tests

use mavensmate::client::CommandRequest;
use mavensmate::commands::update_creds::CREDENTIALS_UPDATED;
use std::collections::BTreeMap;

use mavensmate::commands::{CommandName, UI_SUCCESS};
use mavensmate::payload::CommandPayload;
use mavensmate::project::Project;
use mavensmate::sfdc::StoredSession;
use serde_json::{json, Map, Value};

use crate::support::{
    existing_project, message, payload, EditorEvent, Harness, RecordingEditors, RecordingEngine,
    StubAuthenticator, INVALID_LOGIN, ISSUED_TOKEN, STORED_TOKEN,
};

fn stored_token(project_path: &std::path::Path) -> String {
    let raw = std::fs::read_to_string(project_path.join("config/.session")).unwrap();
    serde_json::from_str::<StoredSession>(&raw).unwrap().access_token
}

fn update(body: CommandPayload) -> CommandRequest {
    CommandRequest {
        name: CommandName::UpdateCreds,
        body,
        editor: None,
    }
}

#[tokio::test]
async fn test_update_creds_persists_new_username() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    let h = Harness::simple(ws.path(), Some(project));

    let output = h
        .client
        .execute_command(update(payload(json!({"username": "new@example.com", "password": "s3cret"}))))
        .await
        .unwrap();

    assert_eq!(message(&output), CREDENTIALS_UPDATED);

    // Falls back to the project's login URL
    let attempts = h.auth.attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].username, "new@example.com");
    assert_eq!(attempts[0].login_url.as_deref(), Some("https://test.salesforce.com"));

    let reloaded = Project::load(&path).await.unwrap();
    assert_eq!(reloaded.settings().username, "new@example.com");
    assert_eq!(reloaded.settings().login_url.as_deref(), Some("https://test.salesforce.com"));
    assert_eq!(h.client.get_project().await.unwrap().settings().username, "new@example.com");
}

#[tokio::test]
async fn test_update_creds_rewrites_session_file() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    assert_eq!(stored_token(&path), STORED_TOKEN);
    let h = Harness::simple(ws.path(), Some(project));

    h.client
        .execute_command(update(payload(json!({"username": "dev@example.com", "password": "s3cret"}))))
        .await
        .unwrap();

    assert_eq!(stored_token(&path), ISSUED_TOKEN);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path.join("config/.session")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn test_update_creds_ui_only_launches_editor() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let pid = project.settings().id.clone();
    let h = Harness::simple(ws.path(), Some(project));

    let output = h
        .client
        .execute_command(update(CommandPayload::ui(Map::new())))
        .await
        .unwrap();

    assert_eq!(message(&output), UI_SUCCESS);
    assert!(h.auth.attempts().is_empty());
    assert_eq!(
        h.editors.events(),
        vec![EditorEvent::LaunchUi {
            editor: None,
            command: "update-creds".to_string(),
            context: BTreeMap::from([("pid".to_string(), pid)]),
        }]
    );
}

#[tokio::test]
async fn test_update_creds_explicit_login_url_wins() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    let h = Harness::simple(ws.path(), Some(project));

    let body = payload(json!({
        "username": "dev@example.com",
        "password": "s3cret",
        "loginUrl": "https://login.salesforce.com",
    }));
    h.client.execute_command(update(body)).await.unwrap();

    assert_eq!(
        h.auth.attempts()[0].login_url.as_deref(),
        Some("https://login.salesforce.com")
    );
    let reloaded = Project::load(&path).await.unwrap();
    assert_eq!(reloaded.settings().login_url.as_deref(), Some("https://login.salesforce.com"));
}

#[tokio::test]
async fn test_rejected_login_leaves_project_untouched() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::rejecting(INVALID_LOGIN),
        RecordingEngine::answering(Value::Null),
        RecordingEditors::new(),
        Some(project),
    );

    let err = h
        .client
        .execute_command(update(payload(json!({"username": "new@example.com", "password": "bad"}))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "authentication");
    assert!(err.to_string().contains(INVALID_LOGIN));
    let reloaded = Project::load(&path).await.unwrap();
    assert_eq!(reloaded.settings().username, "dev@example.com");
    assert_eq!(stored_token(&path), STORED_TOKEN);
}

#[tokio::test]
async fn test_update_creds_requires_password() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let h = Harness::simple(ws.path(), Some(project));

    let err = h
        .client
        .execute_command(update(payload(json!({"username": "dev@example.com"}))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert!(h.auth.attempts().is_empty());
}
