use crate::e2e::helpers::TestContext;

use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_liveness(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(String::from_utf8_lossy(&response.body_bytes), "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_readiness_with_database_status(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(
        body.get("database").and_then(|v| v.as_str()),
        Some("connected")
    );
}
