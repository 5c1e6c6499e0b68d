//! Authenticated session handles and credential providers.
//!
//! A [`PortalSession`] exists only after a successful login. Callers pass it
//! explicitly to every extractor; nothing is stashed in process-wide state.
//! Re-authentication goes through a [`CredentialProvider`].

use std::fmt;

use crate::config::PortalConfig;
use crate::http_client::PortalClient;
use crate::types::{ScrapeError, ScrapeResult};

pub const ENV_USERNAME: &str = "ACADEMY_USERNAME";
pub const ENV_PASSWORD: &str = "ACADEMY_PASSWORD";

/// Portal login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of credentials for (re-)authentication.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> ScrapeResult<Credentials>;
}

/// Fixed credentials held in memory.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> ScrapeResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials read from environment variables on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    username_var: String,
    password_var: String,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(ENV_USERNAME, ENV_PASSWORD)
    }
}

impl EnvCredentials {
    pub fn new(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    fn read(var: &str) -> ScrapeResult<String> {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(ScrapeError::Config(format!("environment variable {var} is not set"))),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> ScrapeResult<Credentials> {
        Ok(Credentials {
            username: Self::read(&self.username_var)?,
            password: Self::read(&self.password_var)?,
        })
    }
}

/// A logged-in portal session.
///
/// Owns the cookie jar. Clones share it, so independent extractors can run
/// concurrently against the same login; none of them mutate session state.
#[derive(Clone)]
pub struct PortalSession {
    client: PortalClient,
    config: PortalConfig,
    username: String,
}

impl PortalSession {
    pub(crate) fn new(client: PortalClient, config: PortalConfig, username: String) -> Self {
        Self {
            client,
            config,
            username,
        }
    }

    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Username the session was opened with.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// End the session. The portal has no logout call in this flow, so this
    /// just drops the cookie jar.
    pub fn logout(self) {
        tracing::debug!("Dropping portal session for {}", self.username);
    }
}

impl fmt::Debug for PortalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalSession")
            .field("base_url", &self.config.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
