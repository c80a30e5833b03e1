mod common;

use common::{Harness, ADMIN, FIXTURE_NAME, USE_CASE};
use ws_core::model::{FEATURE_OVERVIEW, FEATURE_UPDATE};
use ws_core::{FormField, Role, ValidationError};
use ws_harness::{
    ExpectedWorkspace, FormDriver, HarnessError, OwnerGrantMode, Stage, StateAssertionEngine,
    Submission,
};

const USER: &str = "test_user_Fnxs972xC";
const DESCRIPTION: &str = "test_workspace_description.+~!";
const COLOR: &str = "#D36086";

async fn blocked_by(field_edit: impl FnOnce(&mut ws_harness::WorkspaceUpdateForm), expected: ValidationError) {
    let h = Harness::start().await;

    h.scenario("blocked submission", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            field_edit(&mut form);

            let sent_before = ctx.manager.requests_issued();
            let submission = form.click_update().await?;

            assert_eq!(submission, Submission::Blocked(vec![expected]));
            assert_eq!(form.visible_errors(), vec![expected.message().to_string()]);
            assert_eq!(ctx.manager.requests_issued(), sent_before);
            assert!(!form.is_pending());
            Ok::<_, HarnessError>(())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_name_is_rejected_before_any_request() {
    blocked_by(|form| form.clear(FormField::Name), ValidationError::NameRequired).await;
}

#[tokio::test]
async fn punctuation_name_is_rejected_before_any_request() {
    blocked_by(
        |form| form.fill(FormField::Name, "./+"),
        ValidationError::NameInvalid,
    )
    .await;
}

#[tokio::test]
async fn missing_use_case_is_rejected_before_any_request() {
    blocked_by(|form| form.clear(FormField::UseCase), ValidationError::UseCaseRequired).await;
}

#[tokio::test]
async fn blocked_submission_fails_the_submit_stage() {
    let h = Harness::start().await;

    let err = h
        .scenario("pipeline submit", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.clear(FormField::Name);
            ctx.pipeline()
                .run(&mut form, &ctx.workspace_id, &ExpectedWorkspace::new())
                .await
        })
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Submit));
    assert!(matches!(
        err.root(),
        HarnessError::Validation(v) if v == &vec![ValidationError::NameRequired]
    ));
}

#[tokio::test]
async fn description_and_color_update_is_persisted() {
    let h = Harness::start().await;

    let outcome = h
        .scenario("update description and color", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.fill(FormField::Description, DESCRIPTION);
            form.fill(FormField::Color, COLOR);

            let expected = ExpectedWorkspace::new()
                .name(FIXTURE_NAME)
                .description(DESCRIPTION)
                .color(COLOR)
                .features([FEATURE_OVERVIEW, FEATURE_UPDATE, USE_CASE]);

            let outcome = ctx.pipeline().run(&mut form, &ctx.workspace_id, &expected).await?;
            assert_eq!(
                outcome.location,
                format!("/w/{}/app/workspace_overview", ctx.workspace_id)
            );
            Ok::<_, HarnessError>(outcome)
        })
        .await
        .unwrap()
        .ran()
        .unwrap();

    assert_eq!(outcome.ack.status, 200);
    assert_eq!(outcome.sent.description.as_deref(), Some(DESCRIPTION));
    assert_eq!(outcome.sent.name, None);
    assert_eq!(outcome.workspace.revision, 2);
}

#[tokio::test]
async fn added_user_gets_read_access_and_owner_keeps_write() {
    let h = Harness::start().await;

    h.scenario("add user", FIXTURE_NAME)
        .requires_permissions()
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.add_user(USER);

            let expected = ExpectedWorkspace::new()
                .role(Role::Read, [USER])
                .role(Role::LibraryRead, [USER])
                .role(Role::Write, [ctx.owner.as_str()])
                .role(Role::LibraryWrite, [ctx.owner.as_str()]);

            ctx.pipeline().run(&mut form, &ctx.workspace_id, &expected).await
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn owner_superset_mode_tolerates_implicit_owner_grants() {
    let h = Harness::start().await;
    let engine = StateAssertionEngine::new(h.manager.clone()).with_mode(OwnerGrantMode::AllowOwnerSuperset);

    h.scenario("add user, lenient", FIXTURE_NAME)
        .with_engine(engine)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.add_user(USER);

            // The owner's write grants are left implicit.
            let expected = ExpectedWorkspace::new()
                .role(Role::Read, [USER])
                .role(Role::LibraryRead, [USER]);

            ctx.pipeline().run(&mut form, &ctx.workspace_id, &expected).await
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn name_description_and_use_case_round_trip() {
    let h = Harness::start().await;
    let renamed = ws_harness::unique_workspace_name("renamed");

    let stored = h
        .scenario("round trip", &ws_harness::unique_workspace_name("rt"))
        .run(|ctx| {
            let renamed = renamed.clone();
            async move {
                let mut form = ctx.open_form().await?;
                form.fill(FormField::Name, &renamed);
                form.fill(FormField::Description, "round trip");
                form.set_use_case("analytics");

                let expected = ExpectedWorkspace::new()
                    .name(renamed.as_str())
                    .description("round trip")
                    .features([FEATURE_OVERVIEW, FEATURE_UPDATE, "use-case-analytics"]);

                let outcome = ctx.pipeline().run(&mut form, &ctx.workspace_id, &expected).await?;
                assert_eq!(outcome.workspace.id, ctx.workspace_id);
                Ok::<_, HarnessError>(outcome.workspace)
            }
        })
        .await
        .unwrap()
        .ran()
        .unwrap();

    assert_eq!(stored.owner, ADMIN);
    assert!(stored.permissions.has(Role::Write, ADMIN));
}

#[tokio::test]
async fn wrong_expectation_fails_the_assert_stage_with_every_mismatch() {
    let h = Harness::start().await;

    let err = h
        .scenario("mismatch", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.fill(FormField::Description, DESCRIPTION);

            let expected = ExpectedWorkspace::new().description("something else").color("#000000");
            ctx.pipeline().run(&mut form, &ctx.workspace_id, &expected).await
        })
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Assert));
    match err.root() {
        HarnessError::Assertion(report) => assert_eq!(report.fields(), vec!["description", "color"]),
        other => panic!("expected assertion failure, got {other:?}"),
    }

    // Teardown ran even though the body failed.
    assert!(h.manager.find_by_name(FIXTURE_NAME).await.unwrap().is_empty());
}

#[tokio::test]
async fn second_click_while_an_update_is_in_flight_is_refused() {
    let h = Harness::start().await;

    h.scenario("double click", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            let sent_before = ctx.manager.requests_issued();

            form.fill(FormField::Description, "first");
            assert!(matches!(form.click_update().await?, Submission::Sent(_)));

            form.fill(FormField::Description, "second");
            let err = form.click_update().await.unwrap_err();
            assert!(matches!(err, HarnessError::UpdateInFlight));
            assert!(form.is_pending());

            let ack = form.wait_for_update(ctx.config.request_timeout).await?;
            assert_eq!(ack.status, 200);
            assert_eq!(ack.workspace.map(|w| w.description).as_deref(), Some("first"));
            assert_eq!(ctx.manager.requests_issued(), sent_before + 1);

            let err = form.wait_for_update(ctx.config.request_timeout).await.unwrap_err();
            assert!(matches!(err, HarnessError::NothingPending));
            Ok::<_, HarnessError>(())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn clearing_the_color_restores_the_stored_one() {
    let h = Harness::start().await;

    h.scenario("clear color", FIXTURE_NAME)
        .run(|ctx| async move {
            let mut form = ctx.open_form().await?;
            form.fill(FormField::Color, COLOR);
            ctx.pipeline()
                .run(&mut form, &ctx.workspace_id, &ExpectedWorkspace::new().color(COLOR))
                .await?;

            form.fill(FormField::Color, "#000000");
            form.clear(FormField::Color);
            assert_eq!(form.fields().color.as_deref(), Some(COLOR));
            assert_eq!(form.build_patch().color, None);
            Ok::<_, HarnessError>(())
        })
        .await
        .unwrap();
}
