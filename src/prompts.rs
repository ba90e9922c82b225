use anyhow::{Context, Result};
use inquire::{validator::Validation, Password, PasswordDisplayMode};
use std::error::Error;

/// Prompt for an access token without echoing it
pub fn prompt_token() -> Result<String> {
    let token_validator = |input: &str| -> Result<Validation, Box<dyn Error + Send + Sync>> {
        if input.trim().is_empty() {
            return Ok(Validation::Invalid("Access token cannot be empty".into()));
        }
        if input.chars().any(char::is_whitespace) {
            return Ok(Validation::Invalid(
                "Access token cannot contain whitespace".into(),
            ));
        }
        Ok(Validation::Valid)
    };

    Password::new("Access token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Create one at https://dev.are.na/oauth/applications")
        .with_validator(token_validator)
        .prompt()
        .context("Failed to read access token")
}
