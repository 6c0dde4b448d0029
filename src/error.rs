//! Error types for the Graph client
//!
//! `GraphError` is the single error type surfaced by the library. The
//! `Transient` variant is what a failed attempt produces inside the retry
//! loop; callers only see it wrapped in `MaxRetriesExceeded`.

use thiserror::Error;

use crate::http_client::HttpMethod;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for client operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// A required setting is missing or invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Token exchange or refresh failed, or the API kept rejecting the token
    #[error("Authorization error: {message}")]
    Authorization {
        /// Error message
        message: String,
        /// Optional context
        #[source]
        source: Option<BoxedSource>,
    },

    /// A single attempt failed; absorbed by the retry loop
    #[error("Request failed: {message}")]
    Transient {
        /// Error message
        message: String,
        /// Status code if available
        status: Option<u16>,
        /// Optional context
        #[source]
        source: Option<BoxedSource>,
    },

    /// Every attempt of a request failed
    #[error("Max retries ({attempts}) exceeded for {method} {path}")]
    MaxRetriesExceeded {
        /// Verb of the failed request
        method: HttpMethod,
        /// Path of the failed request, relative to the API root
        path: String,
        /// Number of attempts made
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last_error: Option<Box<GraphError>>,
    },

    /// Uploading a file failed
    #[error("Upload to '{path}' failed: {source}")]
    Upload {
        /// Remote path the upload targeted
        path: String,
        /// What went wrong
        #[source]
        source: BoxedSource,
    },
}

impl GraphError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new authorization error with source
    pub fn authorization_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Authorization {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Create a new transient error carrying the HTTP status
    pub fn transient_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Transient {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Create a new transient error with source
    pub fn transient_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transient {
            message: message.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Wrap any failure of the upload sequence
    pub fn upload<E>(path: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxedSource>,
    {
        Self::Upload {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Check if this is a transient error
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Check if the retry bound was exhausted
    pub fn is_max_retries_exceeded(&self) -> bool {
        matches!(self, Self::MaxRetriesExceeded { .. })
    }

    /// Check if this is an upload error
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload { .. })
    }

    /// HTTP status attached to a transient failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result alias used throughout the crate
pub type GraphResult<T> = Result<T, GraphError>;
