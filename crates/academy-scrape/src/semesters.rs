//! Semester listing.
//!
//! The semesters endpoint answers with bare `<option>` markup rather than
//! JSON, sometimes with the attribute quotes escaped as if the markup had
//! been pulled out of a JSON string.

use scraper::{Html, Selector};

use crate::http_client::CSRF_HEADER;
use crate::markup;
use crate::session::PortalSession;
use crate::token::SecurityToken;
use crate::types::{ScrapeResult, SemesterRecord};

/// Strip whitespace plus any backslash or quote characters from an option value.
pub fn sanitize_semester_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '\\' | '"' | '\''))
        .collect()
}

/// Parse `<option>` elements into semester records, in document order.
///
/// Options without both a value and visible text are skipped.
pub fn parse_semester_options(html: &str) -> Vec<SemesterRecord> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("option").expect("option selector is valid");

    document
        .select(&sel)
        .filter_map(|opt| {
            let id = sanitize_semester_id(opt.value().attr("value").unwrap_or(""));
            let name = markup::element_text(&opt);
            if id.is_empty() || name.is_empty() {
                return None;
            }
            Some(SemesterRecord { id, name })
        })
        .collect()
}

/// Fetch and parse the semester list. An empty list is a valid answer.
pub async fn fetch_semesters(
    session: &PortalSession,
    token: &SecurityToken,
) -> ScrapeResult<Vec<SemesterRecord>> {
    let url = session.config().semesters_url();
    let response = session
        .client()
        .get(&url, &[(CSRF_HEADER, token.as_str())])
        .await?
        .error_for_status()?;

    let semesters = parse_semester_options(&response.body);
    tracing::debug!("Found {} semesters", semesters.len());
    Ok(semesters)
}
