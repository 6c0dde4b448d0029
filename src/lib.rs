//! Client for a bearer-token protected Microsoft Graph API.
//!
//! The crate covers three concerns:
//!
//! - [`naming`] turns arbitrary text into SharePoint-safe, URL-encoded names
//! - [`client::GraphClient`] signs in with the OAuth2 authorization-code
//!   flow, refreshes tokens on 401 and retries failed calls
//! - [`client::GraphClient::upload_file`] puts a local file into a drive
//!   folder under a normalized name

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod naming;

pub use auth::{AuthPrompt, DialoguerPrompt, StaticPrompt, TokenState};
pub use client::{ConflictBehavior, FileReader, GraphClient, RequestSpec, TokioFileReader};
pub use config::ClientConfig;
pub use error::{GraphError, GraphResult};
pub use http_client::{HttpClient, HttpMethod, HttpResponse, ReqwestHttpClient, RequestBody};
pub use naming::{NameNormalizer, RandomSuffix, SeededSuffix, SuffixSource};
