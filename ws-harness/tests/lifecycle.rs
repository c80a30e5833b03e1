mod common;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use common::{fixture, Harness, FIXTURE_NAME};
use futures::FutureExt;
use ws_core::{ValidationError, WorkspacePatch};
use ws_harness::{
    ExpectedWorkspace, HarnessConfig, HarnessError, HttpWorkspaceApi, Scenario, ScenarioOutcome,
    StateAssertionEngine, WorkspaceApi, WorkspaceState,
};

#[tokio::test]
async fn create_update_delete_walks_the_state_machine() {
    let h = Harness::start().await;
    let m = &h.manager;

    let id = m.create(fixture(FIXTURE_NAME)).await.unwrap();
    assert_eq!(m.state(&id), WorkspaceState::Created);

    let patch = WorkspacePatch {
        description: Some("first".into()),
        ..Default::default()
    };
    let ack = m.update(&id, &patch).await.unwrap();
    assert_eq!(ack.status, 200);
    assert_eq!(m.state(&id), WorkspaceState::Updated);

    let ack = m.delete(&id).await.unwrap();
    assert!(ack.is_success());
    assert_eq!(m.state(&id), WorkspaceState::Deleted);

    // Gone on the server, and a second delete is tolerated.
    assert!(m.find_by_name(FIXTURE_NAME).await.unwrap().is_empty());
    assert!(m.delete(&id).await.is_ok());
}

#[tokio::test]
async fn update_after_delete_is_not_found_without_a_request() {
    let h = Harness::start().await;
    let m = &h.manager;

    let id = m.create(fixture(FIXTURE_NAME)).await.unwrap();
    m.delete(&id).await.unwrap();

    let sent = m.requests_issued();
    let err = m
        .update(&id, &WorkspacePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::NotFound(_)));
    assert_eq!(m.requests_issued(), sent);
}

#[tokio::test]
async fn delete_of_a_workspace_deleted_elsewhere_is_tolerated() {
    let h = Harness::start().await;
    let id = h.manager.create(fixture(FIXTURE_NAME)).await.unwrap();

    // A second client removes it behind the manager's back.
    let other = HttpWorkspaceApi::new(&h.config).unwrap();
    other.delete(&id).await.unwrap();

    let ack = h.manager.delete(&id).await.unwrap();
    assert_eq!(ack.status, 404);
    assert_eq!(h.manager.state(&id), WorkspaceState::Deleted);
}

#[tokio::test]
async fn same_update_twice_yields_the_same_state() {
    let h = Harness::start().await;
    let m = &h.manager;
    let id = m.create(fixture(FIXTURE_NAME)).await.unwrap();

    let patch = WorkspacePatch {
        description: Some("test_workspace_description.+~!".into()),
        color: Some("#D36086".into()),
        ..Default::default()
    };

    let first = m.update(&id, &patch).await.unwrap().workspace.unwrap();
    let second = m.update(&id, &patch).await.unwrap().workspace.unwrap();

    assert_eq!(first.revision, second.revision);
    assert_eq!(first.description, second.description);
    assert_eq!(first.color, second.color);
    assert_eq!(first.permissions, second.permissions);

    let engine = StateAssertionEngine::new(Arc::clone(&h.manager));
    let expected = ExpectedWorkspace::new()
        .description("test_workspace_description.+~!")
        .color("#D36086");
    let stored = engine.assert_matches(&id, &expected).await.unwrap();
    assert_eq!(stored.revision, second.revision);

    m.delete(&id).await.unwrap();
}

#[tokio::test]
async fn duplicate_name_is_rejected_by_pre_check_and_by_server() {
    let h = Harness::start().await;
    let id = h.manager.create(fixture(FIXTURE_NAME)).await.unwrap();

    let err = h.manager.create(fixture(FIXTURE_NAME)).await.unwrap_err();
    assert!(matches!(err, HarnessError::DuplicateName(ref n) if n == FIXTURE_NAME));

    // Skipping the pre-check, as a racing creator would, hits the server's 409.
    let raw = HttpWorkspaceApi::new(&h.config).unwrap();
    let err = raw.create(&fixture(FIXTURE_NAME)).await.unwrap_err();
    assert!(matches!(err, HarnessError::DuplicateName(_)));

    h.manager.delete(&id).await.unwrap();
}

#[tokio::test]
async fn server_validation_is_decoded_into_violations() {
    let h = Harness::start().await;
    let raw = HttpWorkspaceApi::new(&h.config).unwrap();

    let mut bad = fixture("./+");
    bad.features.retain(|f| !f.starts_with("use-case-"));

    match raw.create(&bad).await.unwrap_err() {
        HarnessError::Validation(v) => {
            assert!(v.contains(&ValidationError::NameInvalid));
            assert!(v.contains(&ValidationError::UseCaseRequired));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn setup_removes_leftovers_with_the_fixture_name() {
    let h = Harness::start().await;
    let stale = h.manager.create(fixture(FIXTURE_NAME)).await.unwrap();

    let fresh = h
        .scenario("cleanup", FIXTURE_NAME)
        .run(|ctx| async move { Ok::<_, HarnessError>(ctx.workspace_id) })
        .await
        .unwrap()
        .ran()
        .unwrap();

    assert_ne!(stale, fresh);
    assert_eq!(h.manager.state(&stale), WorkspaceState::Deleted);
    assert_eq!(h.manager.state(&fresh), WorkspaceState::Deleted);
}

#[tokio::test]
async fn teardown_runs_when_the_body_panics() {
    let h = Harness::start().await;
    let scenario = h.scenario("panics", FIXTURE_NAME);

    let result = AssertUnwindSafe(scenario.run(|_ctx| async move {
        if true {
            panic!("body blew up");
        }
        Ok::<_, HarnessError>(())
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err());
    assert!(h.manager.find_by_name(FIXTURE_NAME).await.unwrap().is_empty());
}

#[tokio::test]
async fn disabled_gates_skip_without_touching_the_server() {
    let h = Harness::start().await;

    let off = HarnessConfig {
        workspace_enabled: false,
        ..h.config.clone()
    };
    let outcome = Scenario::new("gated", off, Arc::clone(&h.manager), fixture(FIXTURE_NAME))
        .run(|_ctx| async move { Ok::<_, HarnessError>(()) })
        .await
        .unwrap();
    assert_eq!(outcome, ScenarioOutcome::Skipped("workspace feature disabled"));

    let no_permissions = HarnessConfig {
        permissions_enabled: false,
        ..h.config.clone()
    };
    let outcome = Scenario::new("gated", no_permissions, Arc::clone(&h.manager), fixture(FIXTURE_NAME))
        .requires_permissions()
        .run(|_ctx| async move { Ok::<_, HarnessError>(()) })
        .await
        .unwrap();
    assert_eq!(outcome, ScenarioOutcome::Skipped("permission checks disabled"));

    assert_eq!(h.manager.requests_issued(), 0);
}
