//! Output and prompting utilities.
//!
//! Status messages go to stderr; stdout is reserved for PEM output.

use std::io::{BufRead, Write};

use colored::Colorize;
use ecp_client::{CredentialSource, Credentials, EcpError, EcpResult};

/// Prints a success message.
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Prompts for a line of input on the terminal.
pub fn prompt_line(prompt: &str) -> std::io::Result<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompts for password input (hidden).
pub fn prompt_password(prompt: &str) -> std::io::Result<String> {
    rpassword::prompt_password(prompt)
}

/// Credentials from arguments, with the missing parts asked for.
#[derive(Clone, Default)]
pub struct PromptingCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for PromptingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptingCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PromptingCredentials {
    /// Creates a source with whatever is already known.
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }
}

impl CredentialSource for PromptingCredentials {
    fn credentials(&self, principal_hint: Option<&str>) -> EcpResult<Credentials> {
        let username = match self.username.as_deref().or(principal_hint) {
            Some(name) => name.to_string(),
            None => prompt_line("Username: ")
                .map_err(|e| EcpError::Config(format!("cannot read username: {e}")))?,
        };
        if username.is_empty() {
            return Err(EcpError::Config("no username given".to_string()));
        }
        let password = match &self.password {
            Some(password) => password.clone(),
            None => prompt_password(&format!("Password for {username}: "))
                .map_err(|e| EcpError::Config(format!("cannot read password: {e}")))?,
        };
        Ok(Credentials::new(username, password))
    }
}
