//! Retry bound and the ignorable server error
use anyhow::Result;

use crate::integration::test_harness::TestEnvironment;
use graph_upload::{GraphError, HttpMethod, RequestSpec};

#[tokio::test]
async fn test_server_errors_exhaust_three_attempts() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let api = env
        .server
        .mock("DELETE", "/v1.0/me/drive/items/01ABC")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let mut client = env.client(Some("tok"))?;
    let err = client
        .request(&RequestSpec::delete("me/drive/items/01ABC"))
        .await
        .unwrap_err();

    api.assert_async().await;
    match err {
        GraphError::MaxRetriesExceeded {
            method, attempts, ..
        } => {
            assert_eq!(method, HttpMethod::DELETE);
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_ignorable_payload_error_returns_none() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let api = env
        .server
        .mock("POST", "/v1.0/me/drive/root/children")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"code":"generalException","message":"IO error during request payload read."}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let mut client = env.client(Some("tok"))?;
    let result = client
        .request(
            &RequestSpec::post("me/drive/root/children")
                .with_json(serde_json::json!({"name": "New Folder", "folder": {}})),
        )
        .await?;

    assert!(result.is_none());
    api.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_retried() -> Result<()> {
    let env = TestEnvironment::new().await;
    let mut config = env.config(Some("tok"));
    // nothing listens on port 9 of the loopback interface
    config.api_url = "http://127.0.0.1:9/v1.0/".to_string();
    config.timeout_seconds = 2;

    let mut client = graph_upload::GraphClient::new(config)?;
    let err = client.request(&RequestSpec::get("me")).await.unwrap_err();

    assert!(err.is_max_retries_exceeded());
    Ok(())
}
