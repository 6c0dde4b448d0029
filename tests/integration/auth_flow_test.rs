//! Sign-in and token refresh over real HTTP
use anyhow::Result;
use mockito::Matcher;
use serde_json::json;

use crate::integration::test_harness::{form, TestEnvironment, TOKEN_PATH};
use graph_upload::{RequestSpec, StaticPrompt};

#[tokio::test]
async fn test_code_exchange_stores_tokens() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let token = env
        .mock_token_grant(
            Matcher::AllOf(vec![
                form("grant_type", "authorization_code"),
                form("code", "abc"),
                form("client_id", "integration-client"),
                form("client_secret", "integration-secret"),
            ]),
            "a1",
            "r1",
        )
        .await;

    let client = env.signed_in_client("abc").await?;

    token.assert_async().await;
    assert_eq!(client.token_state().access_token(), Some("a1"));
    assert_eq!(client.token_state().refresh_token(), Some("r1"));
    assert!(client.token_state().expires_at().is_some());
    Ok(())
}

#[tokio::test]
async fn test_rejected_code_is_authorization_error() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let _token = env
        .server
        .mock("POST", TOKEN_PATH)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"error": "invalid_grant", "error_description": "AADSTS70008: expired"}).to_string(),
        )
        .create_async()
        .await;

    let mut client = env.client(None)?;
    let err = client
        .authenticate_interactive(&StaticPrompt("old-code".to_string()))
        .await
        .unwrap_err();

    assert!(err.is_authorization());
    assert!(err.to_string().contains("invalid_grant"));
    assert!(!client.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn test_presupplied_token_is_probed() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let me = env
        .server
        .mock("GET", "/v1.0/me")
        .match_header("authorization", "Bearer given")
        .with_status(200)
        .with_body(r#"{"displayName":"Adele Vance"}"#)
        .expect(1)
        .create_async()
        .await;
    let token = env
        .server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;

    let mut client = env.client(Some("given"))?;
    client
        .authenticate_interactive(&StaticPrompt(String::new()))
        .await?;

    me.assert_async().await;
    token.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let _code = env
        .mock_token_grant(form("grant_type", "authorization_code"), "a1", "r1")
        .await;
    let refresh = env
        .mock_token_grant(
            Matcher::AllOf(vec![
                form("grant_type", "refresh_token"),
                form("refresh_token", "r1"),
            ]),
            "a2",
            "r2",
        )
        .await;

    let stale = env
        .server
        .mock("GET", "/v1.0/me/drive/root/children")
        .match_header("authorization", "Bearer a1")
        .with_status(401)
        .with_body(r#"{"error":{"code":"InvalidAuthenticationToken","message":"Access token has expired."}}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh = env
        .server
        .mock("GET", "/v1.0/me/drive/root/children")
        .match_header("authorization", "Bearer a2")
        .with_status(200)
        .with_body(r#"{"value":[]}"#)
        .expect(1)
        .create_async()
        .await;

    let mut client = env.signed_in_client("abc").await?;
    let response = client
        .request(&RequestSpec::get("me/drive/root/children"))
        .await?
        .expect("response");

    assert_eq!(response.status(), 200);
    refresh.assert_async().await;
    stale.assert_async().await;
    fresh.assert_async().await;
    assert_eq!(client.token_state().refresh_token(), Some("r2"));
    Ok(())
}

#[tokio::test]
async fn test_persistent_unauthorized_stops_after_one_refresh() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let _code = env
        .mock_token_grant(form("grant_type", "authorization_code"), "a1", "r1")
        .await;
    let refresh = env
        .server
        .mock("POST", TOKEN_PATH)
        .match_body(form("grant_type", "refresh_token"))
        .with_status(200)
        .with_body(json!({"access_token": "a2", "refresh_token": "r2"}).to_string())
        .expect(1)
        .create_async()
        .await;
    let api = env
        .server
        .mock("GET", "/v1.0/me")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let mut client = env.signed_in_client("abc").await?;
    let err = client.request(&RequestSpec::get("me")).await.unwrap_err();

    assert!(err.is_authorization());
    refresh.assert_async().await;
    api.assert_async().await;
    Ok(())
}
