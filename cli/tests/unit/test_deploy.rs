//! deploy tests

use std::collections::BTreeMap;

use mavensmate::client::CommandRequest;
use mavensmate::commands::{CommandName, CommandOutput, UI_SUCCESS};
use mavensmate::payload::CommandPayload;
use mm_api::{DeployOptions, PackageDescriptor, PackageMembers};
use serde_json::{json, Map, Value};

use crate::support::{
    existing_project, message, payload, EditorEvent, Harness, RecordingEditors, RecordingEngine,
    StubAuthenticator,
};

fn deploy(body: CommandPayload) -> CommandRequest {
    CommandRequest {
        name: CommandName::Deploy,
        body,
        editor: None,
    }
}

fn account_package() -> PackageDescriptor {
    PackageDescriptor(BTreeMap::from([(
        "CustomObject".to_string(),
        PackageMembers::One("Account".to_string()),
    )]))
}

async fn harness_with_engine(ws: &std::path::Path, engine: std::sync::Arc<RecordingEngine>) -> Harness {
    let project = existing_project(ws, "foo").await;
    Harness::new(
        ws,
        StubAuthenticator::accepting(),
        engine,
        RecordingEditors::new(),
        Some(project),
    )
}

#[tokio::test]
async fn test_deploy_without_options_passes_none() {
    let ws = tempfile::tempdir().unwrap();
    let answer = json!({"id": "0Af000000000001", "state": "Queued", "done": false});
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(answer.clone())).await;

    let output = h
        .client
        .execute_command(deploy(payload(json!({"package": {"CustomObject": "Account"}}))))
        .await
        .unwrap();

    assert_eq!(output, CommandOutput::Data(answer));
    let calls = h.engine.deploys();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].package, account_package());
    assert_eq!(calls[0].deploy_options, None);

    let project = h.client.get_project().await.unwrap();
    assert_eq!(calls[0].project_id, project.settings().id);
}

#[tokio::test]
async fn test_deploy_forwards_options() {
    let ws = tempfile::tempdir().unwrap();
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(Value::Null)).await;

    let body = payload(json!({
        "package": {"ApexClass": ["Foo", "Bar"]},
        "deployOptions": {"checkOnly": true, "runTests": ["FooTest"], "customFlag": 3},
    }));
    h.client.execute_command(deploy(body)).await.unwrap();

    let options = h.engine.deploys()[0].deploy_options.clone().expect("options were given");
    assert_eq!(
        options,
        DeployOptions {
            check_only: Some(true),
            run_tests: vec!["FooTest".to_string()],
            extra: BTreeMap::from([("customFlag".to_string(), json!(3))]),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_null_options_count_as_absent() {
    let ws = tempfile::tempdir().unwrap();
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(Value::Null)).await;

    let body = payload(json!({"package": {"CustomObject": "Account"}, "deployOptions": null}));
    h.client.execute_command(deploy(body)).await.unwrap();

    assert_eq!(h.engine.deploys()[0].deploy_options, None);
}

#[tokio::test]
async fn test_each_invocation_calls_engine_once() {
    let ws = tempfile::tempdir().unwrap();
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(json!({"done": true}))).await;
    let body = payload(json!({"package": {"CustomObject": "Account"}}));

    h.client.execute_command(deploy(body.clone())).await.unwrap();
    h.client.execute_command(deploy(body)).await.unwrap();

    assert_eq!(h.engine.deploys().len(), 2);
}

#[tokio::test]
async fn test_engine_error_is_passed_through() {
    let ws = tempfile::tempdir().unwrap();
    let details = json!({"faultcode": "sf:INVALID_SESSION_ID"});
    let h = harness_with_engine(
        ws.path(),
        RecordingEngine::failing("Session expired or invalid", details.clone()),
    )
    .await;

    let err = h
        .client
        .execute_command(deploy(payload(json!({"package": {"CustomObject": "Account"}}))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "remote_operation");
    assert_eq!(err.to_string(), "Session expired or invalid");
    match err {
        mavensmate::errors::CommandError::RemoteOperation { details: Some(d), .. } => assert_eq!(d, details),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.engine.deploys().len(), 1);
}

#[tokio::test]
async fn test_deploy_requires_package() {
    let ws = tempfile::tempdir().unwrap();
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(Value::Null)).await;

    for body in [json!({}), json!({"package": {}}), json!({"package": "Account"})] {
        let err = h.client.execute_command(deploy(payload(body))).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
    assert!(h.engine.deploys().is_empty());
}

#[tokio::test]
async fn test_deploy_requires_active_project() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    let err = h
        .client
        .execute_command(deploy(payload(json!({"package": {"CustomObject": "Account"}}))))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert!(h.engine.deploys().is_empty());
}

#[tokio::test]
async fn test_deploy_ui_carries_project_id() {
    let ws = tempfile::tempdir().unwrap();
    let h = harness_with_engine(ws.path(), RecordingEngine::answering(Value::Null)).await;
    let pid = h.client.get_project().await.unwrap().settings().id.clone();

    let output = h
        .client
        .execute_command(deploy(CommandPayload::ui(Map::new())))
        .await
        .unwrap();

    assert_eq!(message(&output), UI_SUCCESS);
    assert!(h.engine.deploys().is_empty());
    assert_eq!(
        h.editors.events(),
        vec![EditorEvent::LaunchUi {
            editor: None,
            command: "deploy".to_string(),
            context: BTreeMap::from([("pid".to_string(), pid)]),
        }]
    );
}

#[tokio::test]
async fn test_ui_without_active_project_is_rejected() {
    let ws = tempfile::tempdir().unwrap();
    let h = Harness::simple(ws.path(), None);

    for name in [CommandName::Deploy, CommandName::EditProject, CommandName::UpdateCreds] {
        let err = h
            .client
            .execute_command(CommandRequest {
                name,
                body: CommandPayload::ui(Map::new()),
                editor: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation", "{}", name);
    }

    assert!(h.editors.events().is_empty());
    assert!(h.engine.deploys().is_empty());
    assert!(h.auth.attempts().is_empty());
}
