//! Token-gated Graph client
//!
//! `GraphClient` owns the app credentials and the current tokens. Every API
//! call goes through [`GraphClient::request`], which refreshes the access
//! token once on a 401 and retries other failures a fixed number of times.

mod request;
mod upload;


use std::sync::Arc;
use tracing::{debug, error, info};

use crate::auth::oauth;
use crate::auth::{AuthPrompt, Credentials, TokenGrant, TokenState};
use crate::config::ClientConfig;
use crate::error::{GraphError, GraphResult};
use crate::http_client::{HttpClient, HttpMethod, ReqwestHttpClient, RequestBody};
use crate::naming::NameNormalizer;

pub use request::{ConflictBehavior, RequestSpec, IGNORABLE_ERROR_PATTERN, MAX_ATTEMPTS};
pub use upload::{FileReader, TokioFileReader};

/// Path of the identity probe used to validate a pre-supplied token
const IDENTITY_PROBE_PATH: &str = "me";

/// Client for a bearer-token protected Graph API
pub struct GraphClient {
    config: ClientConfig,
    credentials: Credentials,
    tokens: TokenState,
    http_client: Arc<dyn HttpClient>,
    files: Arc<dyn FileReader>,
    normalizer: NameNormalizer,
}

impl GraphClient {
    /// Create a client using reqwest for transport
    pub fn new(config: ClientConfig) -> GraphResult<Self> {
        let http_client = ReqwestHttpClient::with_timeout(config.timeout())?;
        Self::with_http_client(config, Arc::new(http_client))
    }

    /// Create a client with a custom HTTP client
    pub fn with_http_client(config: ClientConfig, http_client: Arc<dyn HttpClient>) -> GraphResult<Self> {
        config.validate()?;
        let credentials = Credentials::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.access_token.clone(),
        )?;
        let tokens = TokenState::with_access_token(credentials.access_token());

        debug!(
            client_id = %credentials.client_id(),
            has_access_token = tokens.has_access_token(),
            base_folder = %config.base_folder,
            "Created Graph client"
        );

        Ok(Self {
            config,
            credentials,
            tokens,
            http_client,
            files: Arc::new(TokioFileReader),
            normalizer: NameNormalizer::default(),
        })
    }

    /// Replace the filesystem reader used by uploads
    pub fn with_file_reader(mut self, files: Arc<dyn FileReader>) -> Self {
        self.files = files;
        self
    }

    /// Replace the name normalizer used by uploads
    pub fn with_normalizer(mut self, normalizer: NameNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Read-only view of the current tokens
    pub fn token_state(&self) -> &TokenState {
        &self.tokens
    }

    /// Whether an access token is held
    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_access_token()
    }

    /// Sign-in URL with a fresh `state` value
    pub fn authorization_url(&self) -> GraphResult<String> {
        let state = uuid::Uuid::new_v4().to_string();
        oauth::authorization_url(&self.config, &self.credentials, &state)
    }

    /// Make sure the client holds a usable access token.
    ///
    /// A token that is already present is checked with an identity probe.
    /// Otherwise the user is sent to the sign-in page and asked for the
    /// authorization code, which is exchanged for tokens.
    pub async fn authenticate_interactive(&mut self, prompt: &dyn AuthPrompt) -> GraphResult<()> {
        if self.tokens.has_access_token() {
            debug!(operation = "authenticate", "Validating existing access token");
            self.request(&RequestSpec::get(IDENTITY_PROBE_PATH)).await?;
            info!(operation = "authenticate", "Existing access token accepted");
            return Ok(());
        }

        let url = self.authorization_url()?;
        let message = format!(
            "Open this URL in a browser and sign in:\n\n{}\n\nPaste the code (or the full redirect URL)",
            url
        );
        let answer = prompt.ask(&message).map_err(|e| GraphError::Authorization {
            message: "could not read authorization code".to_string(),
            source: Some(e.into()),
        })?;
        let code = oauth::extract_code(&answer)
            .ok_or_else(|| GraphError::authorization("no authorization code was entered"))?;

        self.exchange_code(&code).await
    }

    /// Exchange an authorization code for an access and refresh token
    pub async fn exchange_code(&mut self, code: &str) -> GraphResult<()> {
        self.tokens.set_pending_code(code);
        let form = oauth::code_exchange_form(&self.config, &self.credentials, code);

        let grant = self.post_token_form("authorize", form).await?;
        self.log_grant("authorize", &grant);
        self.tokens.apply(grant);

        info!(operation = "authorize", "Signed in");
        Ok(())
    }

    /// Exchange the stored refresh token for a new token pair
    pub async fn refresh(&mut self) -> GraphResult<()> {
        let refresh_token = match self.tokens.refresh_token() {
            Some(token) => token.to_string(),
            None => {
                error!(operation = "refresh", "No refresh token available");
                return Err(GraphError::authorization(
                    "no refresh token available; sign in again",
                ));
            }
        };

        let form = oauth::refresh_form(&self.config, &self.credentials, &refresh_token);
        let grant = self.post_token_form("refresh", form).await?;
        self.log_grant("refresh", &grant);
        self.tokens.apply(grant);

        info!(operation = "refresh", "Access token refreshed");
        Ok(())
    }

    /// Forget all tokens and any pending authorization code
    pub fn logout(&mut self) {
        self.tokens.clear();
        info!(operation = "logout", "Tokens cleared");
    }

    async fn post_token_form(&self, operation: &str, form: Vec<(String, String)>) -> GraphResult<TokenGrant> {
        let token_url = self.config.token_url();
        debug!(operation = %operation, url = %token_url, "Calling token endpoint");

        let response = self
            .http_client
            .send(
                HttpMethod::POST,
                &token_url,
                Default::default(),
                Some(RequestBody::Form(form)),
            )
            .await
            .map_err(|e| {
                error!(operation = %operation, error = %e, "Token endpoint unreachable");
                GraphError::authorization_with_source("token endpoint unreachable", e)
            })?;

        oauth::parse_token_response(&response).map_err(|e| {
            error!(operation = %operation, status = response.status(), error = %e, "Token request rejected");
            e
        })
    }

    fn log_grant(&self, operation: &str, grant: &TokenGrant) {
        if self.config.log_tokens {
            debug!(
                operation = %operation,
                access_token = %grant.access_token,
                refresh_token = ?grant.refresh_token,
                expires_in = ?grant.expires_in,
                "Token grant received"
            );
        } else {
            debug!(
                operation = %operation,
                access_token_len = grant.access_token.len(),
                has_refresh_token = grant.refresh_token.is_some(),
                expires_in = ?grant.expires_in,
                "Token grant received"
            );
        }
    }
}
