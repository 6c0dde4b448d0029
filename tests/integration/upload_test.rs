//! File uploads from a real directory
use anyhow::Result;
use mockito::Matcher;

use crate::integration::test_harness::TestEnvironment;
use graph_upload::{ConflictBehavior, GraphError};

const NOTES_PATH: &str = r"^/v1\.0/me/drive/root:/Reports/2024/QandA(%20| )notes\.txt:/content";

#[tokio::test]
async fn test_upload_puts_file_under_normalized_name() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    env.write_file("Q&A notes.txt", b"minutes of the meeting")?;

    let put = env
        .server
        .mock("PUT", Matcher::Regex(NOTES_PATH.to_string()))
        .match_query(Matcher::UrlEncoded(
            "@microsoft.graph.conflictBehavior".to_string(),
            "rename".to_string(),
        ))
        .match_header("authorization", "Bearer tok")
        .match_header("content-type", "application/octet-stream")
        .match_body("minutes of the meeting")
        .with_status(201)
        .with_body(r#"{"id":"01XYZ","name":"QandA notes.txt"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut client = env.client(Some("tok"))?;
    let response = client
        .upload_file(
            env.local_dir(),
            "Reports/2024",
            "Q&A notes.txt",
            Some(ConflictBehavior::Rename),
        )
        .await?
        .expect("upload response");

    put.assert_async().await;
    assert_eq!(response.status(), 201);
    assert_eq!(
        client.display_url("Reports/2024", "Q&A notes.txt"),
        "https://contoso.sharepoint.com/Shared%20Documents/Reports/2024/QandA%20notes.txt"
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_local_file_uploads_nothing() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    let put = env
        .server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut client = env.client(Some("tok"))?;
    let result = client
        .upload_file(env.local_dir(), "Reports", "absent.pdf", None)
        .await?;

    assert!(result.is_none());
    put.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_directory_is_not_uploaded() -> Result<()> {
    let env = TestEnvironment::new().await;
    std::fs::create_dir(env.local_dir().join("subdir"))?;

    let mut client = env.client(Some("tok"))?;
    let result = client
        .upload_file(env.local_dir(), "Reports", "subdir", None)
        .await?;

    assert!(result.is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_upload_reports_remote_path() -> Result<()> {
    let mut env = TestEnvironment::new().await;
    env.write_file("Q&A notes.txt", b"x")?;
    let put = env
        .server
        .mock("PUT", Matcher::Regex(NOTES_PATH.to_string()))
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let mut client = env.client(Some("tok"))?;
    let err = client
        .upload_file(env.local_dir(), "Reports/2024", "Q&A notes.txt", None)
        .await
        .unwrap_err();

    put.assert_async().await;
    match err {
        GraphError::Upload { path, source } => {
            assert_eq!(path, "me/drive/root:/Reports/2024/QandA%20notes.txt:/content");
            assert!(source.to_string().starts_with("Max retries (3) exceeded for PUT"));
        }
        other => panic!("unexpected error: {}", other),
    }
    Ok(())
}
