//! Configuration resolution from CLI args

use crate::cli::{Args, Command};
use crate::error::CliError;
use alliant_client::{AlliantClient, Credentials};
use std::time::Duration;
use zeroize::Zeroizing;

/// Resolved runtime configuration
pub struct Config {
    /// Server base URL as given
    pub base_url: String,
    /// Login credentials, only resolved for commands that need a session
    pub credentials: Option<Credentials>,
    /// Request timeout
    pub timeout: Duration,
    /// Quiet mode
    pub quiet: bool,
    pub command: Command,
}

impl Config {
    /// Build config from CLI args, prompting for the password when needed
    pub fn from_args(args: Args) -> Result<Self, CliError> {
        let credentials = if args.command.needs_session() {
            Some(resolve_credentials(
                args.user,
                args.application_layer,
                args.system_layer,
                std::env::var("ALLIANT_PASSWORD").ok(),
                prompt_password,
            )?)
        } else {
            None
        };

        Ok(Config {
            base_url: args.base_url,
            credentials,
            timeout: args.timeout,
            quiet: args.quiet,
            command: args.command,
        })
    }

    /// Client for the configured server
    ///
    /// Moves the resolved credentials into the client.
    pub fn client(&mut self) -> Result<AlliantClient, CliError> {
        let mut builder = AlliantClient::builder()
            .base_url(self.base_url.as_str())?
            .client_builder(
                reqwest::blocking::Client::builder()
                    .use_rustls_tls()
                    .timeout(self.timeout),
            );
        if let Some(credentials) = self.credentials.take() {
            builder = builder.credentials(credentials);
        }
        Ok(builder.build()?)
    }
}

/// Prompt the user for their password
fn prompt_password(user: &str) -> Result<Zeroizing<String>, CliError> {
    let password = rpassword::prompt_password(format!("Password for {}: ", user))
        .map_err(|e| CliError::Config(format!("Failed to read password: {}", e)))?;
    Ok(Zeroizing::new(password))
}

/// Resolve login credentials from flags, the environment and the prompt
fn resolve_credentials<P>(
    user: Option<String>,
    application_layer: Option<String>,
    system_layer: String,
    env_password: Option<String>,
    prompt: P,
) -> Result<Credentials, CliError>
where
    P: FnOnce(&str) -> Result<Zeroizing<String>, CliError>,
{
    let user = user
        .filter(|u| !u.is_empty())
        .ok_or_else(|| CliError::Config("User ID is required (--user or ALLIANT_USER).".into()))?;
    let application_layer = application_layer.filter(|a| !a.is_empty()).ok_or_else(|| {
        CliError::Config(
            "Application layer is required (--application-layer or ALLIANT_APPLICATION_LAYER)."
                .into(),
        )
    })?;

    let mut password = match env_password {
        Some(p) if !p.is_empty() => Zeroizing::new(p),
        _ => prompt(&user)?,
    };
    if password.is_empty() {
        return Err(CliError::Config("Password is required.".to_string()));
    }

    Ok(Credentials::new(
        user,
        std::mem::take(&mut *password),
        system_layer,
        application_layer,
    ))
}
