pub mod oauth;
pub mod prompt;
pub mod token;

pub use prompt::{AuthPrompt, DialoguerPrompt, StaticPrompt};
pub use token::{Credentials, TokenGrant, TokenResponse, TokenState};
