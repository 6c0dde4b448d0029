use anyhow::{Context, Result};
use dialoguer::Input;

/// Asks the user for input during interactive sign-in
pub trait AuthPrompt: Send + Sync {
    /// Show `message` and return what the user typed
    fn ask(&self, message: &str) -> Result<String>;
}

/// Terminal prompt backed by `dialoguer`
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

impl AuthPrompt for DialoguerPrompt {
    fn ask(&self, message: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(message)
            .interact_text()
            .context("Failed to read authorization code from terminal")?;
        Ok(answer)
    }
}

/// Prompt that always answers with a preset value, for codes obtained
/// out of band
#[derive(Debug, Clone)]
pub struct StaticPrompt(pub String);

impl AuthPrompt for StaticPrompt {
    fn ask(&self, _message: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
