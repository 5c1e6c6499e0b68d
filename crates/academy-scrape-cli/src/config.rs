//! Configuration loading and resolution.
//!
//! Every value resolves as: explicit CLI flag, then environment variable,
//! then built-in default.

use academy_scrape::session::{ENV_PASSWORD, ENV_USERNAME};
use academy_scrape::{EnvCredentials, PortalConfig, ScrapeResult};

/// Flag values as parsed, before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Resolve the portal config from flags, `ACADEMY_*` variables, and defaults.
pub fn resolve_portal_config(overrides: &ConfigOverrides) -> ScrapeResult<PortalConfig> {
    let mut config = PortalConfig::from_env()?;

    if let Some(base) = &overrides.base_url {
        config.base_url = base.clone();
    }
    if let Some(timeout) = overrides.timeout_ms {
        config.timeout_ms = timeout;
    }
    if let Some(ua) = &overrides.user_agent {
        config.user_agent = ua.clone();
    }

    config.validate()?;
    tracing::debug!("Portal {} (timeout {} ms)", config.base_url, config.timeout_ms);
    Ok(config)
}

/// Credential provider reading the named variables, or the defaults
/// `ACADEMY_USERNAME` / `ACADEMY_PASSWORD`.
pub fn resolve_credentials(username_var: Option<&str>, password_var: Option<&str>) -> EnvCredentials {
    EnvCredentials::new(
        username_var.unwrap_or(ENV_USERNAME),
        password_var.unwrap_or(ENV_PASSWORD),
    )
}
