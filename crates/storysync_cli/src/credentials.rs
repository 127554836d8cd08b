//! Taiga credentials for the CLI.
//!
//! The username comes from config or a prompt. The password comes from
//! `STORYSYNC_TAIGA_PASSWORD` or a masked prompt, never from a config file.

use console::Term;
use storysync::AuthenticationError;
use storysync::auth::{CredentialProvider, Credentials};

/// Environment variable holding the Taiga password.
pub const PASSWORD_ENV: &str = "STORYSYNC_TAIGA_PASSWORD";

/// Credentials resolved from config and environment, prompting for the rest
/// when attached to a terminal.
pub struct PromptCredentials {
    username: Option<String>,
    password: Option<String>,
    interactive: bool,
}

impl PromptCredentials {
    pub fn new(username: Option<String>) -> Self {
        Self {
            username: non_empty(username),
            password: non_empty(std::env::var(PASSWORD_ENV).ok()),
            interactive: Term::stdout().is_term(),
        }
    }

    fn prompt_username(&self) -> Result<String, AuthenticationError> {
        let term = Term::stderr();
        term.write_str("Taiga username: ")
            .and_then(|_| term.read_line())
            .map(|line| line.trim().to_string())
            .map_err(|e| AuthenticationError::Credentials(format!("reading username: {}", e)))
    }

    fn prompt_password(&self) -> Result<String, AuthenticationError> {
        rpassword::prompt_password("Enter Taiga password: ")
            .map_err(|e| AuthenticationError::Credentials(format!("reading password: {}", e)))
    }
}

impl CredentialProvider for PromptCredentials {
    fn obtain(&self) -> Result<Credentials, AuthenticationError> {
        let username = match &self.username {
            Some(username) => username.clone(),
            None if self.interactive => self.prompt_username()?,
            None => {
                return Err(AuthenticationError::Credentials(
                    "No Taiga username. Set taiga.username or STORYSYNC__TAIGA__USERNAME.".into(),
                ));
            }
        };

        let password = match &self.password {
            Some(password) => password.clone(),
            None if self.interactive => self.prompt_password()?,
            None => {
                return Err(AuthenticationError::Credentials(format!(
                    "No Taiga password. Set {}.",
                    PASSWORD_ENV
                )));
            }
        };

        if username.is_empty() || password.is_empty() {
            return Err(AuthenticationError::Credentials(
                "Empty username or password provided".into(),
            ));
        }

        Ok(Credentials::new(username, password))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(username: Option<&str>, password: Option<&str>) -> PromptCredentials {
        PromptCredentials {
            username: non_empty(username.map(String::from)),
            password: non_empty(password.map(String::from)),
            interactive: false,
        }
    }

    #[test]
    fn test_configured_credentials_are_used() {
        let credentials = provider(Some("sync-bot"), Some("hunter2")).obtain().unwrap();
        assert_eq!(credentials, Credentials::new("sync-bot", "hunter2"));
    }

    #[test]
    fn test_missing_password_without_terminal_names_env_var() {
        let err = provider(Some("sync-bot"), None).obtain().unwrap_err();
        match err {
            AuthenticationError::Credentials(msg) => assert!(msg.contains(PASSWORD_ENV)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_username_without_terminal_fails() {
        let err = provider(None, Some("hunter2")).obtain().unwrap_err();
        assert!(matches!(err, AuthenticationError::Credentials(_)));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let err = provider(Some("  "), Some("hunter2")).obtain().unwrap_err();
        assert!(matches!(err, AuthenticationError::Credentials(_)));
    }
}
