//! Authorization-code flow against the Microsoft identity platform
//!
//! Builds the authorize URL and the token-endpoint forms. Code exchange
//! and refresh share the token endpoint and differ only in `grant_type`.

use url::Url;

use super::token::{Credentials, TokenGrant, TokenResponse};
use crate::config::ClientConfig;
use crate::error::{GraphError, GraphResult};
use crate::http_client::HttpResponse;

/// `grant_type` for exchanging an authorization code
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
/// `grant_type` for exchanging a refresh token
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// URL the user opens to sign in and consent
pub fn authorization_url(config: &ClientConfig, credentials: &Credentials, state: &str) -> GraphResult<String> {
    let url = Url::parse_with_params(
        &config.authorize_url(),
        &[
            ("client_id", credentials.client_id()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_mode", "query"),
            ("scope", config.scopes.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| GraphError::configuration(format!("invalid authority URL '{}': {}", config.authority_url, e)))?;

    Ok(url.into())
}

fn base_form(config: &ClientConfig, credentials: &Credentials, grant_type: &str) -> Vec<(String, String)> {
    vec![
        ("client_id".to_string(), credentials.client_id().to_string()),
        ("client_secret".to_string(), credentials.client_secret().to_string()),
        ("redirect_uri".to_string(), config.redirect_uri.clone()),
        ("scope".to_string(), config.scopes.clone()),
        ("grant_type".to_string(), grant_type.to_string()),
    ]
}

/// Token-endpoint form for an authorization code
pub fn code_exchange_form(config: &ClientConfig, credentials: &Credentials, code: &str) -> Vec<(String, String)> {
    let mut form = base_form(config, credentials, GRANT_AUTHORIZATION_CODE);
    form.push(("code".to_string(), code.to_string()));
    form
}

/// Token-endpoint form for a refresh token
pub fn refresh_form(config: &ClientConfig, credentials: &Credentials, refresh_token: &str) -> Vec<(String, String)> {
    let mut form = base_form(config, credentials, GRANT_REFRESH_TOKEN);
    form.push(("refresh_token".to_string(), refresh_token.to_string()));
    form
}

/// Read a token-endpoint response. Error payloads and non-JSON bodies are
/// authorization failures.
pub fn parse_token_response(response: &HttpResponse) -> GraphResult<TokenGrant> {
    let parsed: TokenResponse = serde_json::from_str(response.body()).map_err(|e| {
        GraphError::authorization_with_source(
            format!(
                "token endpoint returned {} {} with an unreadable body",
                response.status(),
                response.status_text()
            ),
            e,
        )
    })?;

    parsed.into_grant()
}

/// Accept either a bare code or the whole redirect URL the browser landed on
pub fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned())
            .filter(|code| !code.is_empty()),
        Err(_) => Some(input.to_string()),
    }
}
