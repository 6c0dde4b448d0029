use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{GraphError, GraphResult};

// Default configuration values
pub const DEFAULT_API_URL: &str = "https://graph.microsoft.com/v1.0/";
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/";
pub const DEFAULT_REDIRECT_URI: &str = "https://login.microsoftonline.com/common/oauth2/nativeclient";
pub const DEFAULT_SCOPES: &str = "offline_access User.Read Files.ReadWrite.All Sites.ReadWrite.All";
pub const DEFAULT_BASE_FOLDER: &str = "me/drive/root";
pub const DEFAULT_DISPLAY_FOLDER_PREFIX: &str = "Shared Documents/";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

// Environment variable names
pub const ENV_DOMAIN: &str = "GRAPH_DOMAIN";
pub const ENV_CLIENT_ID: &str = "GRAPH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GRAPH_CLIENT_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "GRAPH_ACCESS_TOKEN";
pub const ENV_BASE_FOLDER: &str = "GRAPH_BASE_FOLDER";
pub const ENV_DISPLAY_FOLDER: &str = "GRAPH_DISPLAY_FOLDER";
pub const ENV_DEBUG: &str = "GRAPH_DEBUG";
pub const ENV_LOG_TOKENS: &str = "GRAPH_LOG_TOKENS";
pub const ENV_API_URL: &str = "GRAPH_API_URL";
pub const ENV_AUTHORITY_URL: &str = "GRAPH_AUTHORITY_URL";
pub const ENV_REDIRECT_URI: &str = "GRAPH_REDIRECT_URI";
pub const ENV_SCOPES: &str = "GRAPH_SCOPES";
pub const ENV_TIMEOUT_SECONDS: &str = "GRAPH_TIMEOUT_SECONDS";

/// Settings for a [`GraphClient`](crate::client::GraphClient)
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// SharePoint tenant name, as in `<domain>.sharepoint.com`
    #[serde(default)]
    pub domain: String,
    /// Application (client) ID of the app registration
    #[serde(default)]
    pub client_id: String,
    /// Client secret of the app registration
    #[serde(default)]
    pub client_secret: String,
    /// Pre-supplied access token; skips interactive sign-in
    #[serde(default)]
    pub access_token: Option<String>,
    /// Drive item every upload path is relative to
    #[serde(default = "default_base_folder")]
    pub base_folder: String,
    /// Library path prefix used for browser links
    #[serde(default = "default_display_folder_prefix")]
    pub display_folder_prefix: String,
    /// Verbose diagnostics
    #[serde(default)]
    pub debug: bool,
    /// Include token values in diagnostics
    #[serde(default)]
    pub log_tokens: bool,
    /// Graph API root
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// OAuth2 authority; `authorize` and `token` are resolved against it
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
    /// Redirect URI registered for the app
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    /// Space-separated scopes requested at sign-in
    #[serde(default = "default_scopes")]
    pub scopes: String,
    /// Transport timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

// Default functions
fn default_base_folder() -> String {
    DEFAULT_BASE_FOLDER.to_string()
}

fn default_display_folder_prefix() -> String {
    DEFAULT_DISPLAY_FOLDER_PREFIX.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            access_token: None,
            base_folder: default_base_folder(),
            display_folder_prefix: default_display_folder_prefix(),
            debug: false,
            log_tokens: false,
            api_url: default_api_url(),
            authority_url: default_authority_url(),
            redirect_uri: default_redirect_uri(),
            scopes: default_scopes(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("base_folder", &self.base_folder)
            .field("display_folder_prefix", &self.display_folder_prefix)
            .field("debug", &self.debug)
            .field("log_tokens", &self.log_tokens)
            .field("api_url", &self.api_url)
            .field("authority_url", &self.authority_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl ClientConfig {
    /// Minimal configuration from credentials
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    /// Load a `.env` file if present, then read the process environment
    pub fn from_env() -> GraphResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, applying defaults for
    /// unset keys
    pub fn from_lookup<F>(lookup: F) -> GraphResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| {
            get(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        let timeout_seconds = match get(ENV_TIMEOUT_SECONDS) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                GraphError::configuration(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECONDS, raw))
            })?,
            None => default_timeout(),
        };

        let config = Self {
            domain: get(ENV_DOMAIN).unwrap_or_default(),
            client_id: get(ENV_CLIENT_ID).unwrap_or_default(),
            client_secret: get(ENV_CLIENT_SECRET).unwrap_or_default(),
            access_token: get(ENV_ACCESS_TOKEN),
            base_folder: get(ENV_BASE_FOLDER).unwrap_or_else(default_base_folder),
            display_folder_prefix: get(ENV_DISPLAY_FOLDER).unwrap_or_else(default_display_folder_prefix),
            debug: flag(ENV_DEBUG),
            log_tokens: flag(ENV_LOG_TOKENS),
            api_url: get(ENV_API_URL).unwrap_or_else(default_api_url),
            authority_url: get(ENV_AUTHORITY_URL).unwrap_or_else(default_authority_url),
            redirect_uri: get(ENV_REDIRECT_URI).unwrap_or_else(default_redirect_uri),
            scopes: get(ENV_SCOPES).unwrap_or_else(default_scopes),
            timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub async fn load_file(path: &Path) -> GraphResult<Self> {
        let config_str = tokio::fs::read_to_string(path).await.map_err(|e| {
            GraphError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&config_str).map_err(|e| {
            GraphError::configuration(format!("invalid configuration in {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the client cannot work with
    pub fn validate(&self) -> GraphResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(GraphError::configuration("client_id is required"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(GraphError::configuration("client_secret is required"));
        }
        if self.timeout_seconds == 0 {
            return Err(GraphError::configuration("timeout_seconds must be greater than zero"));
        }
        Ok(())
    }

    /// Transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Token endpoint shared by code exchange and refresh
    pub fn token_url(&self) -> String {
        format!("{}/token", self.authority_url.trim_end_matches('/'))
    }

    /// Authorization endpoint the user is sent to
    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.authority_url.trim_end_matches('/'))
    }

    /// Absolute URL for a path relative to the API root
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
