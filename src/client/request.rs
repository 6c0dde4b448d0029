use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use super::GraphClient;
use crate::config::ClientConfig;
use crate::error::{GraphError, GraphResult};
use crate::http_client::{HttpMethod, HttpResponse, RequestBody};

/// Total attempts per request, including the first
pub const MAX_ATTEMPTS: u32 = 3;

/// Server-side error message treated as an empty success
pub const IGNORABLE_ERROR_PATTERN: &str = "IO error during request payload read";

const CONFLICT_BEHAVIOR_PARAM: &str = "@microsoft.graph.conflictBehavior";

/// What the server should do when the target item already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictBehavior {
    Rename,
    Replace,
    Fail,
}

impl ConflictBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictBehavior::Rename => "rename",
            ConflictBehavior::Replace => "replace",
            ConflictBehavior::Fail => "fail",
        }
    }
}

impl fmt::Display for ConflictBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" => Ok(ConflictBehavior::Rename),
            "replace" => Ok(ConflictBehavior::Replace),
            "fail" => Ok(ConflictBehavior::Fail),
            other => Err(format!(
                "unknown conflict behavior '{}' (expected rename, replace or fail)",
                other
            )),
        }
    }
}

/// One API call, relative to the API root
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP verb
    pub method: HttpMethod,
    /// Path relative to the API root, e.g. `me/drive/root/children`
    pub path: String,
    /// Optional payload
    pub body: Option<RequestBody>,
    /// Extra headers
    pub headers: HashMap<String, String>,
    /// Conflict policy, sent as a query parameter
    pub conflict: Option<ConflictBehavior>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HashMap::new(),
            conflict: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::DELETE, path)
    }

    pub fn with_json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Bytes(bytes));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_conflict(mut self, conflict: Option<ConflictBehavior>) -> Self {
        self.conflict = conflict;
        self
    }

    /// Absolute URL for this request
    pub fn url(&self, config: &ClientConfig) -> String {
        let mut url = config.api_endpoint(&self.path);
        if let Some(conflict) = self.conflict {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str(CONFLICT_BEHAVIOR_PARAM);
            url.push('=');
            url.push_str(conflict.as_str());
        }
        url
    }
}

/// Outcome of one round trip
#[derive(Debug)]
pub(crate) enum Attempt {
    Success(HttpResponse),
    Unauthorized,
    Ignored(String),
    Failed(GraphError),
}

/// `error` object of a Graph error payload
fn application_error(response: &HttpResponse) -> Option<(String, String)> {
    let body = response.json_value()?;
    let error = body.get("error")?.as_object()?;
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}

/// Decide what a response means for the retry loop
pub(crate) fn classify(response: HttpResponse) -> Attempt {
    if response.is_unauthorized() {
        return Attempt::Unauthorized;
    }

    if let Some((code, message)) = application_error(&response) {
        if message.contains(IGNORABLE_ERROR_PATTERN) {
            return Attempt::Ignored(message);
        }
        return Attempt::Failed(GraphError::transient_with_status(
            format!("{} {}: {}", response.status(), code, message),
            response.status(),
        ));
    }

    if !response.is_success() {
        return Attempt::Failed(GraphError::transient_with_status(
            format!("{} {} from {}", response.status(), response.status_text(), response.url()),
            response.status(),
        ));
    }

    Attempt::Success(response)
}

impl GraphClient {
    /// Perform an authenticated request.
    ///
    /// - a 401 triggers one token refresh and an immediate re-send; a second
    ///   401 is an authorization error
    /// - an error payload matching [`IGNORABLE_ERROR_PATTERN`] yields `Ok(None)`
    /// - any other failure is retried immediately, up to [`MAX_ATTEMPTS`]
    ///   attempts, then reported as `MaxRetriesExceeded`
    pub async fn request(&mut self, spec: &RequestSpec) -> GraphResult<Option<HttpResponse>> {
        if !self.tokens.has_access_token() {
            return Err(GraphError::authorization(
                "not signed in; run interactive sign-in first",
            ));
        }

        let url = spec.url(&self.config);
        let mut refreshed = false;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < MAX_ATTEMPTS {
            attempt += 1;

            let mut outcome = self.attempt(spec, &url, attempt).await;

            if matches!(outcome, Attempt::Unauthorized) && !refreshed {
                info!(
                    operation = "request",
                    method = %spec.method,
                    path = %spec.path,
                    "Access token rejected, refreshing"
                );
                self.refresh().await?;
                refreshed = true;
                outcome = self.attempt(spec, &url, attempt).await;
            }

            match outcome {
                Attempt::Success(response) => {
                    if attempt > 1 {
                        info!(
                            operation = "request",
                            method = %spec.method,
                            path = %spec.path,
                            attempts = attempt,
                            "Request succeeded after retries"
                        );
                    }
                    return Ok(Some(response));
                }
                Attempt::Ignored(message) => {
                    warn!(
                        operation = "request",
                        method = %spec.method,
                        path = %spec.path,
                        message = %message,
                        "Ignoring known server-side payload read error"
                    );
                    return Ok(None);
                }
                Attempt::Unauthorized => {
                    error!(
                        operation = "request",
                        method = %spec.method,
                        path = %spec.path,
                        "Still unauthorized after token refresh"
                    );
                    return Err(GraphError::authorization(format!(
                        "{} {} unauthorized after token refresh",
                        spec.method, spec.path
                    )));
                }
                Attempt::Failed(err) => {
                    warn!(
                        operation = "request",
                        method = %spec.method,
                        path = %spec.path,
                        attempt = attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %err,
                        "Request attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        error!(
            operation = "request",
            method = %spec.method,
            path = %spec.path,
            attempts = attempt,
            "Request failed after maximum attempts"
        );
        Err(GraphError::MaxRetriesExceeded {
            method: spec.method,
            path: spec.path.clone(),
            attempts: attempt,
            last_error: last_error.map(Box::new),
        })
    }

    async fn attempt(&self, spec: &RequestSpec, url: &str, attempt: u32) -> Attempt {
        let mut headers = spec.headers.clone();
        if let Some(token) = self.tokens.access_token() {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
            .entry("Accept".to_string())
            .or_insert_with(|| "application/json".to_string());

        debug!(
            operation = "request",
            method = %spec.method,
            url = %url,
            attempt = attempt,
            "Sending request"
        );

        match self
            .http_client
            .send(spec.method, url, headers, spec.body.clone())
            .await
        {
            Ok(response) => classify(response),
            Err(err) => Attempt::Failed(err),
        }
    }
}
