//! End-to-end coverage of the typed client against a live server:
//! the authenticated request pipeline, the single-flight refresh, and
//! session teardown when recovery is impossible.

use crate::e2e::helpers::TestContext;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_context::test_context;

use verdant_backend::client::{ApiClient, ClientError, SessionStore};
use verdant_backend::domain::auth::dto::RegisterRequest;

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Ada".to_string(),
        email: email.to_string(),
        password: "Abc123!!".to_string(),
        confirm_password: "Abc123!!".to_string(),
        image: None,
    }
}

fn client_for(ctx: &TestContext) -> ApiClient {
    ApiClient::new(ctx.base_url.clone(), Arc::new(SessionStore::new()))
        .expect("client construction")
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_register_and_use_the_session(ctx: &TestContext) {
    let client = client_for(ctx);

    let auth = client.register(&register_request("a@x.com")).await.unwrap();
    assert_eq!(auth.user.email, "a@x.com");
    assert!(client.access_token().is_some());

    let state = client.session().state();
    assert!(state.is_authenticated);
    assert_eq!(state.user.unwrap().email, "a@x.com");

    let profile = client.fetch_profile().await.unwrap();
    assert_eq!(profile.email, "a@x.com");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refresh_once_for_concurrent_failures(ctx: &TestContext) {
    let client = Arc::new(client_for(ctx));
    client.register(&register_request("a@x.com")).await.unwrap();

    // Poison the access token; the refresh cookie in the jar stays valid
    client.set_access_token("stale-access-token");

    let results =
        futures::future::join_all((0..3).map(|_| client.fetch_profile())).await;
    for result in results {
        assert_eq!(result.unwrap().email, "a@x.com");
    }

    // Every 401 recovered through a single refresh
    assert_eq!(client.refresh_count(), 1);
    assert_ne!(client.access_token().as_deref(), Some("stale-access-token"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_recover_then_refresh_again_after_the_next_expiry(ctx: &TestContext) {
    let client = client_for(ctx);
    client.register(&register_request("a@x.com")).await.unwrap();

    client.set_access_token("stale-one");
    client.fetch_profile().await.unwrap();
    assert_eq!(client.refresh_count(), 1);

    // A later expiry is a new failure and warrants its own refresh
    client.set_access_token("stale-two");
    client.fetch_profile().await.unwrap();
    assert_eq!(client.refresh_count(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_tear_down_the_session_when_refresh_fails(ctx: &TestContext) {
    let expired_calls = Arc::new(AtomicUsize::new(0));
    let calls = expired_calls.clone();

    // Fresh client: no refresh cookie in the jar, so recovery must fail
    let client = ApiClient::new(ctx.base_url.clone(), Arc::new(SessionStore::new()))
        .expect("client construction")
        .on_session_expired(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    client.set_access_token("stale-access-token");

    let result = client.fetch_profile().await;
    assert!(matches!(result, Err(ClientError::SessionExpired)));

    assert_eq!(expired_calls.load(Ordering::SeqCst), 1);
    assert!(client.access_token().is_none());
    let state = client.session().state();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_surface_login_errors_in_session_state(ctx: &TestContext) {
    let client = client_for(ctx);
    client.register(&register_request("a@x.com")).await.unwrap();
    client.logout().await;

    let result = client.login("a@x.com", "wrong-password").await;
    assert!(result.is_err());

    let state = client.session().state();
    assert!(!state.is_authenticated);
    assert!(!state.is_loading);
    let error = state.error.expect("login failure must set the session error");
    assert!(error.contains("Password is incorrect"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clear_local_state_on_logout(ctx: &TestContext) {
    let client = client_for(ctx);
    client.register(&register_request("a@x.com")).await.unwrap();

    client.logout().await;

    assert!(client.access_token().is_none());
    let state = client.session().state();
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());

    // Further authenticated calls fail cleanly instead of reusing anything
    assert!(client.fetch_profile().await.is_err());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_initialize_an_anonymous_session(ctx: &TestContext) {
    let client = client_for(ctx);

    client.initialize().await;

    let state = client.session().state();
    assert!(state.is_initialized);
    assert!(!state.is_authenticated);
    assert!(!state.is_loading);
}
