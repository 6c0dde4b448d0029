use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

use crate::error::{GraphError, GraphResult};

/// App registration credentials
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    access_token: Option<String>,
}

impl Credentials {
    /// Create credentials; both identifiers are required
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: Option<String>,
    ) -> GraphResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(GraphError::configuration("client_id is required"));
        }
        if client_secret.trim().is_empty() {
            return Err(GraphError::configuration("client_secret is required"));
        }

        Ok(Self {
            client_id,
            client_secret,
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    /// Application (client) ID
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Access token supplied up front, if any
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Tokens issued by the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token for API calls
    pub access_token: String,
    /// Token used to obtain the next grant
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds, if reported
    pub expires_in: Option<i64>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token_len", &self.access_token.len())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Token endpoint response body, success or error
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Turn the response into a grant, failing on an error payload
    pub fn into_grant(self) -> GraphResult<TokenGrant> {
        if let Some(error) = self.error {
            let message = match self.error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error,
            };
            return Err(GraphError::authorization(message));
        }

        match self.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(TokenGrant {
                access_token,
                refresh_token: self.refresh_token,
                expires_in: self.expires_in,
            }),
            _ => Err(GraphError::authorization(
                "token response did not contain an access token",
            )),
        }
    }
}

/// Tokens held by a client.
///
/// Fields are written only through sign-in, refresh and logout.
#[derive(Clone, Default)]
pub struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    pending_code: Option<String>,
    obtained_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    /// State seeded with a pre-supplied access token
    pub fn with_access_token(access_token: Option<&str>) -> Self {
        Self {
            access_token: access_token.map(str::to_string),
            ..Self::default()
        }
    }

    /// Current access token
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Current refresh token
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Authorization code awaiting exchange
    pub fn pending_code(&self) -> Option<&str> {
        self.pending_code.as_deref()
    }

    /// When the current tokens were issued
    pub fn obtained_at(&self) -> Option<DateTime<Utc>> {
        self.obtained_at
    }

    /// When the access token expires, if the server said
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether an access token is present
    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Check if the access token is known to be expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |exp| exp <= Utc::now())
    }

    pub(crate) fn set_pending_code(&mut self, code: impl Into<String>) {
        self.pending_code = Some(code.into());
    }

    /// Store a new grant. A grant without a refresh token keeps the old one.
    pub(crate) fn apply(&mut self, grant: TokenGrant) {
        let now = Utc::now();
        self.access_token = Some(grant.access_token);
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
        self.pending_code = None;
        self.obtained_at = Some(now);
        self.expires_at = grant.expires_in.map(|secs| now + Duration::seconds(secs));
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token_len", &self.access_token.as_ref().map(String::len))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("has_pending_code", &self.pending_code.is_some())
            .field("obtained_at", &self.obtained_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
