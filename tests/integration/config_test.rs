//! Configuration files on disk
use anyhow::Result;
use std::io::Write;

use graph_upload::ClientConfig;

#[tokio::test]
async fn test_load_file_fills_defaults() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{"domain": "contoso", "client_id": "id", "client_secret": "secret", "debug": true}}"#
    )?;

    let config = ClientConfig::load_file(file.path()).await?;

    assert_eq!(config.domain, "contoso");
    assert!(config.debug);
    assert_eq!(config.base_folder, "me/drive/root");
    assert_eq!(config.token_url(), "https://login.microsoftonline.com/common/oauth2/v2.0/token");
    assert_eq!(
        config.api_endpoint("me/drive/root/children"),
        "https://graph.microsoft.com/v1.0/me/drive/root/children"
    );
    Ok(())
}

#[tokio::test]
async fn test_load_file_without_secret_is_rejected() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"client_id": "id"}}"#)?;

    let err = ClientConfig::load_file(file.path()).await.unwrap_err();

    assert!(err.is_configuration());
    Ok(())
}

#[tokio::test]
async fn test_load_missing_file_is_configuration_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = ClientConfig::load_file(&dir.path().join("absent.json"))
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    Ok(())
}
