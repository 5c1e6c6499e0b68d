//! Portal location, timeouts, and the endpoint layout derived from them.

use crate::types::{ScrapeError, ScrapeResult};

/// Production portal root.
pub const DEFAULT_BASE_URL: &str = "https://www.pesuacademy.com/Academy";

/// The portal has no SLA; requests that hang past this are abandoned.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

pub const ENV_BASE_URL: &str = "ACADEMY_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "ACADEMY_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "ACADEMY_USER_AGENT";

/// Controller parameters the portal uses to route admin-page requests.
pub mod controller {
    pub const ATTENDANCE_MENU_ID: &str = "660";
    pub const ATTENDANCE_CONTROLLER_MODE: &str = "6407";
    pub const ATTENDANCE_ACTION_TYPE: &str = "8";

    pub const CALENDAR_QUERY: &str = "menuId=668&controllerMode=6413&actionType=5";
    pub const TIMETABLE_QUERY: &str = "menuId=669&controllerMode=6415&actionType=5";
}

/// Where and how to reach the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PortalConfig {
    /// Config for a portal rooted at `base_url`, other values defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read overrides from `ACADEMY_BASE_URL`, `ACADEMY_TIMEOUT_MS`, and
    /// `ACADEMY_USER_AGENT`, falling back to defaults.
    pub fn from_env() -> ScrapeResult<Self> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var(ENV_BASE_URL) {
            config.base_url = base;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            config.timeout_ms = raw.trim().parse().map_err(|_| {
                ScrapeError::Config(format!("{ENV_TIMEOUT_MS} must be an integer, got '{raw}'"))
            })?;
        }
        if let Ok(ua) = std::env::var(ENV_USER_AGENT) {
            config.user_agent = ua;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScrapeResult<()> {
        if self.timeout_ms == 0 {
            return Err(ScrapeError::Config("timeout must be greater than zero".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ScrapeError::Config(format!(
                "base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Landing page: serves the login form and, once signed in, the dashboard.
    pub fn login_page_url(&self) -> String {
        format!("{}/", self.base())
    }

    pub fn auth_url(&self) -> String {
        format!("{}/j_spring_security_check", self.base())
    }

    pub fn semesters_url(&self) -> String {
        format!("{}/a/studentProfilePESU/getStudentSemestersPESU", self.base())
    }

    /// Admin controller endpoint; attendance is POSTed here.
    pub fn admin_url(&self) -> String {
        format!("{}/s/studentProfilePESUAdmin", self.base())
    }

    pub fn calendar_url(&self) -> String {
        format!("{}?{}", self.admin_url(), controller::CALENDAR_QUERY)
    }

    pub fn timetable_url(&self) -> String {
        format!("{}?{}", self.admin_url(), controller::TIMETABLE_QUERY)
    }

    /// Referer that makes privileged calls look like in-app navigation.
    pub fn referer_url(&self) -> String {
        format!("{}/s/studentProfilePESU", self.base())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = PortalConfig::default();
        assert_eq!(
            config.auth_url(),
            "https://www.pesuacademy.com/Academy/j_spring_security_check"
        );
        assert_eq!(config.login_page_url(), "https://www.pesuacademy.com/Academy/");
        assert_eq!(
            config.calendar_url(),
            "https://www.pesuacademy.com/Academy/s/studentProfilePESUAdmin?menuId=668&controllerMode=6413&actionType=5"
        );
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let config = PortalConfig::with_base_url("http://localhost:8080/Academy/");
        assert_eq!(config.referer_url(), "http://localhost:8080/Academy/s/studentProfilePESU");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = PortalConfig {
            timeout_ms: 0,
            ..PortalConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_base() {
        let config = PortalConfig::with_base_url("ftp://portal");
        assert!(config.validate().is_err());
    }
}
