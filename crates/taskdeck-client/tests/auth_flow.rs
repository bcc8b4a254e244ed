mod support;

use std::time::Duration;

use futures_util::future::join_all;
use httpmock::prelude::*;
use serde_json::json;
use support::{FAR_FUTURE, Harness, LONG_AGO, session_entries};
use taskdeck_client::{
    ApiError, AuthStrategy, CancellationToken, ErrorKind, KeyValueStore, LOGIN_ROUTE,
    LoginPayload, RegisterPayload, TaskPayload, TaskQuery,
};
use taskdeck_state::User;

#[tokio::test]
async fn valid_token_is_attached_without_regeneration() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(200);
        })
        .await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/user/me")
                .header("authorization", "Bearer access-1");
            then.status(200)
                .json_body(json!({"_id": "u1", "username": "ada"}));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));

    let user = harness.client.get_user().await?;

    profile.assert_async().await;
    regenerate.assert_hits_async(0).await;
    assert_eq!(user.username.as_deref(), Some("ada"));
    Ok(())
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/user")
                .json_body(json!({"username": "ada", "password": "pw"}));
            then.status(201).json_body(json!({"_id": "u1", "username": "ada"}));
        })
        .await;
    let harness = Harness::new(&server, &[]);

    let user = harness
        .client
        .register_user(&RegisterPayload {
            username: "ada".to_string(),
            password: "pw".to_string(),
        })
        .await?;

    register.assert_async().await;
    assert_eq!(user.and_then(|user| user.id).as_deref(), Some("u1"));
    let recorded = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/me").header_exists("authorization");
            then.status(200).json_body(json!({}));
        })
        .await;
    let _ = harness.client.get_user().await;
    recorded.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn expired_token_is_regenerated_before_sending() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/user/regenerate-access-token")
                .query_param("refreshToken", "refresh-1")
                .query_param("token", "access-1");
            then.status(200).json_body(json!({
                "token": "access-2",
                "refreshToken": "refresh-2",
                "expiresIn": FAR_FUTURE,
            }));
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tasks")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", LONG_AGO));

    let page = harness
        .client
        .fetch_tasks(&TaskQuery::new(false), None)
        .await?;

    assert!(page.is_empty());
    regenerate.assert_async().await;
    tasks.assert_async().await;
    assert_eq!(harness.store.get("token").as_deref(), Some("access-2"));
    assert_eq!(harness.store.get("refreshToken").as_deref(), Some("refresh-2"));
    assert_eq!(harness.store.get("expiresIn").as_deref(), Some(FAR_FUTURE));
    assert_eq!(harness.state.token.get().as_deref(), Some("access-2"));
    assert!(harness.navigator.visits().is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_regeneration() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(200)
                .delay(Duration::from_millis(200))
                .json_body(json!({
                    "token": "access-2",
                    "refreshToken": "refresh-2",
                    "expiresIn": 4_102_444_800_i64,
                }));
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tasks")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", LONG_AGO));

    let query = TaskQuery::new(true);
    let calls = (0..5).map(|_| harness.client.fetch_tasks(&query, None));
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    regenerate.assert_hits_async(1).await;
    tasks.assert_hits_async(5).await;
    Ok(())
}

#[tokio::test]
async fn fractional_expiry_in_the_past_is_regenerated() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(200).json_body(json!({
                "token": "access-2",
                "refreshToken": "refresh-2",
                "expiresIn": 4_102_444_800.5_f64,
            }));
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tasks")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", "1000.5"));

    harness
        .client
        .fetch_tasks(&TaskQuery::new(false), None)
        .await?;

    regenerate.assert_async().await;
    tasks.assert_async().await;
    assert_eq!(harness.store.get("token").as_deref(), Some("access-2"));
    Ok(())
}

#[tokio::test]
async fn concurrent_requests_share_one_failed_regeneration() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(401).delay(Duration::from_millis(200));
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", LONG_AGO));
    harness.state.user.set(Some(User::named("ada")));

    let query = TaskQuery::new(false);
    let calls = (0..5).map(|_| harness.client.fetch_tasks(&query, None));
    let results = join_all(calls).await;

    regenerate.assert_hits_async(1).await;
    tasks.assert_hits_async(0).await;
    let errors: Vec<ApiError> = results.into_iter().filter_map(Result::err).collect();
    assert_eq!(errors.len(), 5);
    let refresh_failures = errors
        .iter()
        .filter(|err| matches!(err, ApiError::TokenRefresh { .. }))
        .count();
    let expired = errors
        .iter()
        .filter(|err| matches!(err, ApiError::SessionExpired))
        .count();
    assert_eq!((refresh_failures, expired), (1, 4));
    assert_eq!(harness.store.len(), 0);
    assert_eq!(harness.state.user.get(), None);
    assert_eq!(
        harness.navigator.visits(),
        vec![(LOGIN_ROUTE.to_string(), true)]
    );
    Ok(())
}

#[tokio::test]
async fn failed_regeneration_tears_down_and_fails_the_request() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(401);
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", LONG_AGO));
    harness.state.user.set(Some(User::named("ada")));

    let err = harness
        .client
        .fetch_tasks(&TaskQuery::new(false), None)
        .await
        .expect_err("refresh failure must propagate");

    assert!(matches!(err, ApiError::TokenRefresh { .. }));
    regenerate.assert_async().await;
    tasks.assert_hits_async(0).await;
    assert_eq!(harness.store.len(), 0);
    assert_eq!(harness.state.user.get(), None);
    assert_eq!(harness.state.token.get(), None);
    assert_eq!(
        harness.navigator.visits(),
        vec![(LOGIN_ROUTE.to_string(), true)]
    );
    Ok(())
}

#[tokio::test]
async fn unauthorized_response_clears_session_once() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/user/me");
            then.status(401).json_body(json!({"message": "jwt expired"}));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));
    harness.state.user.set(Some(User::named("ada")));

    let err = harness.client.get_user().await.expect_err("401");

    assert_eq!(err.status().map(|status| status.as_u16()), Some(401));
    assert_eq!(harness.store.len(), 0);
    assert_eq!(harness.state.user.get(), None);
    assert_eq!(
        harness.navigator.visits(),
        vec![(LOGIN_ROUTE.to_string(), true)]
    );
    Ok(())
}

#[tokio::test]
async fn forbidden_response_on_task_call_clears_session() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/task/t1");
            then.status(403);
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));

    let err = harness.client.remove_task("t1").await.expect_err("403");

    assert!(err.is_auth_failure());
    assert_eq!(harness.store.len(), 0);
    assert_eq!(harness.navigator.visits().len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_login_leaves_state_alone() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/user/login");
            then.status(401).json_body(json!({"message": "bad credentials"}));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));

    let err = harness
        .client
        .login_user(&LoginPayload {
            username: "ada".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .expect_err("401");

    assert!(err.is_auth_failure());
    assert_eq!(harness.store.len(), 3);
    assert!(harness.navigator.visits().is_empty());
    Ok(())
}

#[tokio::test]
async fn server_errors_do_not_touch_the_session() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/task");
            then.status(500);
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));

    let err = harness
        .client
        .add_task(&TaskPayload {
            description: "write docs".to_string(),
        })
        .await
        .expect_err("500");

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(harness.store.len(), 3);
    assert!(harness.navigator.visits().is_empty());
    Ok(())
}

#[tokio::test]
async fn stored_token_strategy_never_regenerates() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let regenerate = server
        .mock_async(|when, then| {
            when.method(GET).path("/user/regenerate-access-token");
            then.status(200);
        })
        .await;
    let tasks = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tasks")
                .header("authorization", "Bearer access-1");
            then.status(200).json_body(json!([]));
        })
        .await;
    let harness = Harness::with_strategy(
        &server,
        &session_entries("access-1", LONG_AGO),
        AuthStrategy::StoredToken,
    );

    harness
        .client
        .fetch_tasks(&TaskQuery::new(false), None)
        .await?;

    tasks.assert_async().await;
    regenerate.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn cancelling_an_in_flight_fetch_reports_cancellation() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(json!([]));
        })
        .await;
    let harness = Harness::new(&server, &session_entries("access-1", FAR_FUTURE));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = harness
        .client
        .fetch_tasks(&TaskQuery::new(false), Some(&cancel))
        .await
        .expect_err("cancelled");

    assert!(err.is_cancelled());
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(harness.navigator.visits().is_empty());
    Ok(())
}
