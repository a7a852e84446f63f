//! new-project-from-existing-directory tests

use std::collections::BTreeMap;

use mavensmate::client::CommandRequest;
use mavensmate::commands::new_project::PROJECT_CREATED;
use mavensmate::commands::{CommandName, UI_SUCCESS};
use mavensmate::editor::EditorKind;
use mavensmate::payload::CommandPayload;
use serde_json::{json, Map, Value};

use crate::support::{
    message, payload, EditorEvent, Harness, RecordingEditors, RecordingEngine, StubAuthenticator,
    INVALID_LOGIN,
};

fn request(body: CommandPayload, editor: Option<EditorKind>) -> CommandRequest {
    CommandRequest {
        name: CommandName::NewProjectFromExistingDirectory,
        body,
        editor,
    }
}

fn create_body() -> CommandPayload {
    payload(json!({"username": "dev@example.com", "password": "hunter2", "name": "foo"}))
}

#[tokio::test]
async fn test_missing_fields_reject_without_login() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    let bodies = [
        json!({"password": "hunter2", "name": "foo"}),
        json!({"username": "dev@example.com", "name": "foo"}),
        json!({"username": "dev@example.com", "password": "hunter2"}),
        json!({"username": "", "password": "hunter2", "name": "foo"}),
    ];
    for body in bodies {
        let err = h
            .client
            .execute_command(request(payload(body), None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.to_string(), "Please specify username, password, and project name");
    }

    assert!(h.auth.attempts().is_empty());
    assert!(std::fs::read_dir(ws.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_invalid_project_name_rejects_without_login() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    for name in ["../escape", "nested/name", "..", "."] {
        let body = payload(json!({"username": "dev@example.com", "password": "hunter2", "name": name}));
        let err = h.client.execute_command(request(body, None)).await.unwrap_err();
        assert_eq!(err.kind(), "validation", "name {:?}", name);
    }

    assert!(h.auth.attempts().is_empty());
    assert!(std::fs::read_dir(ws.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_ui_launch_carries_only_directory() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    let mut flags = Map::new();
    flags.insert("directory".to_string(), Value::from("/src/legacy"));
    let output = h
        .client
        .execute_command(request(CommandPayload::ui(flags), Some(EditorKind::Sublime)))
        .await
        .unwrap();

    assert_eq!(message(&output), UI_SUCCESS);
    let expected = BTreeMap::from([("directory".to_string(), "/src/legacy".to_string())]);
    assert_eq!(
        h.editors.events(),
        vec![EditorEvent::LaunchUi {
            editor: Some(EditorKind::Sublime),
            command: "new-project-from-existing-directory".to_string(),
            context: expected,
        }]
    );
    assert!(h.auth.attempts().is_empty());
    assert!(h.client.get_project().await.is_none());
}

#[tokio::test]
async fn test_ui_launch_without_directory_has_empty_context() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    h.client
        .execute_command(request(CommandPayload::ui(Map::new()), None))
        .await
        .unwrap();

    match h.editors.events().as_slice() {
        [EditorEvent::LaunchUi { context, .. }] => assert!(context.is_empty()),
        other => panic!("unexpected editor events: {:?}", other),
    }
}

#[tokio::test]
async fn test_login_failure_is_passed_through() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::rejecting(INVALID_LOGIN),
        RecordingEngine::answering(Value::Null),
        RecordingEditors::new(),
        None,
    );

    let err = h
        .client
        .execute_command(request(create_body(), Some(EditorKind::Vscode)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "authentication");
    assert!(err.to_string().contains(INVALID_LOGIN));
    assert_eq!(h.auth.attempts().len(), 1);
    assert!(!ws.path().join("foo").exists());
    assert!(h.editors.events().is_empty());
    assert!(h.client.get_project().await.is_none());
}

#[tokio::test]
async fn test_headless_create_resolves_with_message() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    let output = h.client.execute_command(request(create_body(), None)).await.unwrap();

    assert_eq!(message(&output), PROJECT_CREATED);
    assert_eq!(output.to_json(), json!({"message": "MavensMate project created successfully"}));
    assert!(h.editors.events().is_empty());
    assert_eq!(h.auth.attempts()[0].username, "dev@example.com");

    let project = h.client.get_project().await.expect("project should be active");
    assert_eq!(project.settings().project_name, "foo");
    assert_eq!(project.path(), ws.path().join("foo"));
    assert!(ws.path().join("foo/config/.settings").exists());
    assert!(ws.path().join("foo/src").is_dir());
}

#[tokio::test]
async fn test_editor_open_completes_before_resolution() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    let output = h
        .client
        .execute_command(request(create_body(), Some(EditorKind::Atom)))
        .await
        .unwrap();

    assert_eq!(message(&output), PROJECT_CREATED);
    assert_eq!(
        h.editors.events(),
        vec![EditorEvent::Opened {
            editor: Some(EditorKind::Atom),
            path: ws.path().join("foo"),
        }]
    );
}

#[tokio::test]
async fn test_editor_failure_rejects_and_keeps_files() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::accepting(),
        RecordingEngine::answering(Value::Null),
        RecordingEditors::failing_open(),
        None,
    );

    let err = h
        .client
        .execute_command(request(create_body(), Some(EditorKind::Sublime)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "delegation");
    assert!(ws.path().join("foo/config/.settings").exists());
    assert!(h.client.get_project().await.is_none());
}

#[tokio::test]
async fn test_imports_existing_directory() {
    let ws = tempfile::tempdir().unwrap();
    let origin = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(origin.path().join("classes")).unwrap();
    std::fs::write(origin.path().join("classes/Foo.cls"), "public class Foo {}").unwrap();
    std::fs::create_dir_all(origin.path().join(".git")).unwrap();
    std::fs::write(origin.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();

    let h = Harness::simple(ws.path(), None);
    let body = payload(json!({
        "username": "dev@example.com",
        "password": "hunter2",
        "name": "legacy",
        "directory": origin.path(),
    }));

    h.client.execute_command(request(body, None)).await.unwrap();

    let src = ws.path().join("legacy/src");
    assert_eq!(
        std::fs::read_to_string(src.join("classes/Foo.cls")).unwrap(),
        "public class Foo {}"
    );
    assert!(!src.join(".git").exists());
}

#[tokio::test]
async fn test_unwritable_workspace_is_initialization_error() {
    let ws = tempfile::tempdir().unwrap();
    let blocked = ws.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();

    let h = Harness::simple(&blocked, None);
    let err = h.client.execute_command(request(create_body(), None)).await.unwrap_err();

    assert_eq!(err.kind(), "initialization");
    assert_eq!(h.auth.attempts().len(), 1);
    assert!(h.client.get_project().await.is_none());
}
