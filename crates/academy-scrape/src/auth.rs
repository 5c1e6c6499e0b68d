//! Form-based login against the portal's Spring Security endpoint.
//!
//! Two round trips: fetch the login page for its `_csrf` field, then POST the
//! credentials. Every call builds a fresh client, so concurrent logins never
//! share cookies.

use scraper::Html;

use crate::config::PortalConfig;
use crate::http_client::PortalClient;
use crate::markup;
use crate::session::{CredentialProvider, PortalSession};
use crate::types::{ScrapeError, ScrapeResult};

/// Login form field carrying the anti-forgery token.
pub const LOGIN_CSRF_FIELD: &str = "_csrf";

/// Substring of the response body when the portal rejects credentials.
pub const BAD_CREDENTIALS_MARKER: &str = "Bad credentials";

/// Extract the login form's anti-forgery token.
pub fn extract_login_token(html: &str) -> ScrapeResult<String> {
    let document = Html::parse_document(html);
    markup::input_value(&document, LOGIN_CSRF_FIELD).ok_or(ScrapeError::LoginTokenNotFound)
}

/// Whether a login response body reports rejected credentials.
pub fn is_bad_credentials(body: &str) -> bool {
    body.contains(BAD_CREDENTIALS_MARKER)
}

/// Log in and return a live session.
///
/// Fails with [`ScrapeError::InvalidCredentials`] when the portal answers with
/// its bad-credentials page, or a transport error on any non-2xx status.
pub async fn authenticate(
    config: &PortalConfig,
    username: &str,
    password: &str,
) -> ScrapeResult<PortalSession> {
    let client = PortalClient::new(config)?;

    let login_page = client
        .get(&config.login_page_url(), &[])
        .await?
        .error_for_status()?;
    let token = extract_login_token(&login_page.body)?;

    let form = [
        ("j_username", username),
        ("j_password", password),
        (LOGIN_CSRF_FIELD, token.as_str()),
    ];
    let response = client
        .post_form(&config.auth_url(), &form, &[])
        .await?
        .error_for_status()?;

    if is_bad_credentials(&response.body) {
        tracing::info!("Portal rejected credentials for {username}");
        return Err(ScrapeError::InvalidCredentials);
    }

    tracing::info!("Authenticated {username}");
    Ok(PortalSession::new(client, config.clone(), username.to_string()))
}

/// Log in with whatever the provider currently supplies.
pub async fn authenticate_with(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<PortalSession> {
    let creds = provider.credentials()?;
    authenticate(config, &creds.username, &creds.password).await
}
