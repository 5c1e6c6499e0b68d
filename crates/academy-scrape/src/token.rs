//! Anti-forgery token and display-name resolution from the dashboard.
//!
//! The dashboard is fetched again after login instead of reusing the login
//! page: the login POST consumes the token that page carried.

use std::fmt;

use scraper::{Html, Selector};

use crate::http_client::PortalClient;
use crate::markup;
use crate::semesters;
use crate::session::PortalSession;
use crate::types::{ScrapeError, ScrapeResult, SemesterRecord};

/// Class of the inline element holding the signed-in student's name.
pub const DISPLAY_NAME_CLASS: &str = "app-name-font";

/// Per-fetch anti-forgery token sent as `x-csrf-token`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken(String);

impl SecurityToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityToken(<{} chars>)", self.0.len())
    }
}

/// Who is signed in, and the token their privileged calls need.
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: SecurityToken,
    pub display_name: String,
}

/// Identity plus the semesters listed for it.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub semesters: Vec<SemesterRecord>,
    pub display_name: String,
    pub token: SecurityToken,
}

/// Find the anti-forgery token in dashboard markup.
///
/// Tried in order: `<input name="csrf">`, `<input name="_csrf">`,
/// `<meta name="csrf-token">`. Empty values are treated as absent.
pub fn extract_csrf_token(document: &Html) -> ScrapeResult<SecurityToken> {
    let candidates = [
        markup::input_value(document, "csrf"),
        markup::input_value(document, "_csrf"),
        markup::meta_content(document, "csrf-token"),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .map(SecurityToken)
        .ok_or(ScrapeError::CsrfNotFound)
}

/// Student name from the dashboard header, title-cased.
///
/// Falls back to `fallback` unchanged when the element is missing or empty.
pub fn extract_display_name(document: &Html, fallback: &str) -> String {
    let sel = Selector::parse(&format!("span.{DISPLAY_NAME_CLASS}")).expect("name selector is valid");
    document
        .select(&sel)
        .next()
        .map(|el| markup::element_text(&el))
        .filter(|name| !name.is_empty())
        .map(|name| markup::title_case(&name))
        .unwrap_or_else(|| fallback.to_string())
}

/// Parse token and display name from dashboard HTML.
pub fn parse_identity(html: &str, fallback_name: &str) -> ScrapeResult<Identity> {
    let document = Html::parse_document(html);
    let token = extract_csrf_token(&document)?;
    let display_name = extract_display_name(&document, fallback_name);
    Ok(Identity {
        token,
        display_name,
    })
}

async fn fetch_dashboard(client: &PortalClient, url: &str) -> ScrapeResult<String> {
    Ok(client.get(url, &[]).await?.error_for_status()?.body)
}

/// Re-fetch the dashboard and resolve token and display name.
pub async fn resolve_identity(session: &PortalSession, username: &str) -> ScrapeResult<Identity> {
    let url = session.config().login_page_url();
    let html = fetch_dashboard(session.client(), &url).await?;
    let identity = parse_identity(&html, username)?;
    tracing::debug!("Resolved identity for {}", identity.display_name);
    Ok(identity)
}

/// Resolve identity, then list semesters with the fresh token.
pub async fn resolve_identity_and_semesters(
    session: &PortalSession,
    username: &str,
) -> ScrapeResult<ResolvedIdentity> {
    let Identity {
        token,
        display_name,
    } = resolve_identity(session, username).await?;
    let semesters = semesters::fetch_semesters(session, &token).await?;
    Ok(ResolvedIdentity {
        semesters,
        display_name,
        token,
    })
}
