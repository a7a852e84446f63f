//! edit-project tests

use std::collections::BTreeMap;

use mavensmate::client::CommandRequest;
use mavensmate::commands::{CommandName, CommandOutput, UI_SUCCESS};
use mavensmate::payload::CommandPayload;
use mavensmate::project::Project;
use mm_api::{PackageDescriptor, PackageMembers};
use serde_json::{json, Map, Value};

use crate::support::{
    existing_project, message, payload, EditorEvent, Harness, RecordingEditors, RecordingEngine,
    StubAuthenticator,
};

fn edit(body: CommandPayload) -> CommandRequest {
    CommandRequest {
        name: CommandName::EditProject,
        body,
        editor: None,
    }
}

#[tokio::test]
async fn test_edit_project_updates_subscription_and_retrieves() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    let answer = json!({"id": "09S000000000001", "state": "Queued", "done": false});
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::accepting(),
        RecordingEngine::answering(answer.clone()),
        RecordingEditors::new(),
        Some(project),
    );

    let output = h
        .client
        .execute_command(edit(payload(json!({"package": {"ApexClass": ["Foo", "Bar"]}}))))
        .await
        .unwrap();

    assert_eq!(output, CommandOutput::Data(answer));

    let expected = PackageDescriptor(BTreeMap::from([(
        "ApexClass".to_string(),
        PackageMembers::Many(vec!["Foo".to_string(), "Bar".to_string()]),
    )]));
    assert_eq!(h.engine.retrieves(), vec![expected.clone()]);
    assert!(h.engine.deploys().is_empty());

    let package_xml = std::fs::read_to_string(path.join("src/package.xml")).unwrap();
    assert!(package_xml.contains("<name>ApexClass</name>"));
    assert!(package_xml.contains("<members>Foo</members>"));

    let reloaded = Project::load(&path).await.unwrap();
    assert_eq!(reloaded.settings().package, Some(expected));
}

#[tokio::test]
async fn test_failed_retrieve_keeps_previous_subscription() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let path = project.path().to_path_buf();
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::accepting(),
        RecordingEngine::failing("INVALID_CROSS_REFERENCE_KEY", json!({"faultcode": "sf:INVALID_CROSS_REFERENCE_KEY"})),
        RecordingEditors::new(),
        Some(project),
    );

    let err = h
        .client
        .execute_command(edit(payload(json!({"package": {"ApexClass": "Foo"}}))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "remote_operation");
    assert_eq!(h.engine.retrieves().len(), 1);

    let reloaded = Project::load(&path).await.unwrap();
    assert_eq!(reloaded.settings().package, None);
    assert!(!path.join("src/package.xml").exists());
    assert_eq!(h.client.get_project().await.unwrap().settings().package, None);
}

#[tokio::test]
async fn test_edit_project_requires_package() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let h = Harness::simple(ws.path(), Some(project));

    let err = h.client.execute_command(edit(payload(json!({})))).await.unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert!(h.engine.retrieves().is_empty());
}

#[tokio::test]
async fn test_edit_project_ui_carries_project_id() {
    let ws = tempfile::tempdir().unwrap();
    let project = existing_project(ws.path(), "foo").await;
    let pid = project.settings().id.clone();
    let h = Harness::new(
        ws.path(),
        StubAuthenticator::accepting(),
        RecordingEngine::answering(Value::Null),
        RecordingEditors::new(),
        Some(project),
    );

    let output = h
        .client
        .execute_command(edit(CommandPayload::ui(Map::new())))
        .await
        .unwrap();

    assert_eq!(message(&output), UI_SUCCESS);
    assert_eq!(
        h.editors.events(),
        vec![EditorEvent::LaunchUi {
            editor: None,
            command: "edit-project".to_string(),
            context: BTreeMap::from([("pid".to_string(), pid)]),
        }]
    );
}
