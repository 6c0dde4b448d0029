//! Shared setup: a mockito server standing in for both the token endpoint
//! and the Graph API, plus a scratch directory for local files

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

use graph_upload::{ClientConfig, GraphClient, ReqwestHttpClient, StaticPrompt};

/// Path of the token endpoint on the mock server
pub const TOKEN_PATH: &str = "/common/oauth2/v2.0/token";

pub struct TestEnvironment {
    /// Mock server for every outgoing request
    pub server: ServerGuard,
    /// Local directory uploads read from
    pub dir: TempDir,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        Self {
            server: mockito::Server::new_async().await,
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Configuration pointing every endpoint at the mock server
    pub fn config(&self, access_token: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig::new("integration-client", "integration-secret");
        config.domain = "contoso".to_string();
        config.api_url = format!("{}/v1.0/", self.server.url());
        config.authority_url = format!("{}/common/oauth2/v2.0/", self.server.url());
        config.access_token = access_token.map(str::to_string);
        config
    }

    /// Client using reqwest against the mock server
    pub fn client(&self, access_token: Option<&str>) -> Result<GraphClient> {
        let http = Arc::new(ReqwestHttpClient::new());
        Ok(GraphClient::with_http_client(self.config(access_token), http)?)
    }

    /// Client that went through the code flow with `code`
    pub async fn signed_in_client(&self, code: &str) -> Result<GraphClient> {
        let mut client = self.client(None)?;
        client
            .authenticate_interactive(&StaticPrompt(code.to_string()))
            .await?;
        Ok(client)
    }

    /// Write a file into the scratch directory
    pub fn write_file(&self, name: &str, content: &[u8]) -> Result<()> {
        std::fs::write(self.dir.path().join(name), content)?;
        Ok(())
    }

    pub fn local_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Token endpoint answering one grant type with the given tokens
    pub async fn mock_token_grant(
        &mut self,
        grant: Matcher,
        access_token: &str,
        refresh_token: &str,
    ) -> Mock {
        self.server
            .mock("POST", TOKEN_PATH)
            .match_body(grant)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "token_type": "Bearer",
                    "access_token": access_token,
                    "refresh_token": refresh_token,
                    "expires_in": 3600
                })
                .to_string(),
            )
            .create_async()
            .await
    }
}

/// Body matcher for a form field
pub fn form(key: &str, value: &str) -> Matcher {
    Matcher::UrlEncoded(key.to_string(), value.to_string())
}
