//! Calendar extraction from a JSON literal embedded in page script.
//!
//! The calendar page normally carries `var obj = JSON.parse(<literal>);`.
//! When that assignment is missing, a best-effort fallback grabs the first
//! bracket- or brace-delimited span in the page. The fallback is lazy and can
//! stop at a nested closing bracket; it is kept as a separate strategy so it
//! can be switched off.
//!
//! The decoded value is returned as-is; entry shape is not validated.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::http_client::CSRF_HEADER;
use crate::session::PortalSession;
use crate::token::SecurityToken;
use crate::types::{preview, ScrapeError, ScrapeResult};

/// A way of locating the calendar JSON span in page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarStrategy {
    /// `var obj = JSON.parse(<literal>);`
    JsonParseAssignment,
    /// First `[...]` or `{...}` span anywhere in the text.
    BracketSpan,
}

impl CalendarStrategy {
    /// The captured span, untrimmed, if this strategy matches.
    pub fn locate<'a>(&self, text: &'a str) -> Option<&'a str> {
        let re = match self {
            CalendarStrategy::JsonParseAssignment => assignment_regex(),
            CalendarStrategy::BracketSpan => bracket_regex(),
        };
        re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
    }
}

fn assignment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)var obj = JSON\.parse\((.*?)\);").expect("calendar assignment regex is valid")
    })
}

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)(\[.*?\]|\{.*?\})").expect("bracket span regex is valid"))
}

/// Ordered list of strategies tried against the calendar page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarExtractor {
    strategies: Vec<CalendarStrategy>,
}

impl Default for CalendarExtractor {
    fn default() -> Self {
        Self {
            strategies: vec![
                CalendarStrategy::JsonParseAssignment,
                CalendarStrategy::BracketSpan,
            ],
        }
    }
}

impl CalendarExtractor {
    pub fn new(strategies: Vec<CalendarStrategy>) -> Self {
        Self { strategies }
    }

    /// Assignment pattern only; no bracket fallback.
    pub fn strict() -> Self {
        Self::new(vec![CalendarStrategy::JsonParseAssignment])
    }

    pub fn strategies(&self) -> &[CalendarStrategy] {
        &self.strategies
    }

    /// Locate the JSON span and decode it.
    pub fn extract(&self, text: &str) -> ScrapeResult<Value> {
        let span = self
            .strategies
            .iter()
            .find_map(|strategy| {
                let span = strategy.locate(text)?;
                tracing::debug!("Calendar span located by {strategy:?}");
                Some(span)
            })
            .ok_or_else(|| ScrapeError::CalendarNotFound {
                preview: preview(text),
            })?;

        let span = span.trim();
        if span.is_empty() {
            return Err(ScrapeError::CalendarEmpty);
        }
        decode_calendar_json(span)
    }
}

/// Decode a calendar span, unwrapping one level of string encoding.
///
/// A `JSON.parse("...")` argument is a string literal whose contents are the
/// real document, so a span that decodes to a JSON string is decoded again.
pub fn decode_calendar_json(span: &str) -> ScrapeResult<Value> {
    match serde_json::from_str::<Value>(span) {
        Ok(Value::String(inner)) => serde_json::from_str(&inner).map_err(|e| ScrapeError::CalendarDecode {
            error: e.to_string(),
            preview: preview(&inner),
        }),
        Ok(value) => Ok(value),
        Err(e) => {
            if span.len() >= 2 && span.starts_with('"') && span.ends_with('"') {
                if let Some(value) = serde_json::from_str::<String>(span)
                    .ok()
                    .and_then(|inner| serde_json::from_str(&inner).ok())
                {
                    return Ok(value);
                }
            }
            Err(ScrapeError::CalendarDecode {
                error: e.to_string(),
                preview: preview(span),
            })
        }
    }
}

/// Extract with the default strategy order.
pub fn parse_calendar(text: &str) -> ScrapeResult<Value> {
    CalendarExtractor::default().extract(text)
}

/// Fetch the calendar page and extract its JSON payload.
pub async fn fetch_calendar(session: &PortalSession, token: &SecurityToken) -> ScrapeResult<Value> {
    fetch_calendar_with(session, token, &CalendarExtractor::default()).await
}

pub async fn fetch_calendar_with(
    session: &PortalSession,
    token: &SecurityToken,
    extractor: &CalendarExtractor,
) -> ScrapeResult<Value> {
    let config = session.config();
    let referer = config.referer_url();
    let response = session
        .client()
        .get(
            &config.calendar_url(),
            &[(CSRF_HEADER, token.as_str()), ("referer", referer.as_str())],
        )
        .await?
        .error_for_status()?;

    let calendar = extractor.extract(&response.body)?;
    tracing::info!("Extracted calendar payload");
    Ok(calendar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignment_with_raw_json() {
        let page = r#"<script>
            var obj = JSON.parse([{"date":"2024-08-15","event":"Independence Day"}]);
            render(obj);
        </script>"#;
        assert_eq!(
            parse_calendar(page).unwrap(),
            json!([{"date": "2024-08-15", "event": "Independence Day"}])
        );
    }

    #[test]
    fn test_double_encoded_matches_single_encoded() {
        let double = r#"<script>var obj = JSON.parse("[{\"a\":1}]");</script>"#;
        let single = r#"<script>var obj = JSON.parse([{"a":1}]);</script>"#;
        assert_eq!(parse_calendar(double).unwrap(), parse_calendar(single).unwrap());
        assert_eq!(parse_calendar(double).unwrap(), json!([{"a": 1}]));
    }

    #[test]
    fn test_decode_is_stable_under_reencoding() {
        let page = r#"var obj = JSON.parse("{\"events\":[{\"d\":\"2024-01-26\"}]}");"#;
        let first = parse_calendar(page).unwrap();
        let reencoded = format!("var obj = JSON.parse({});", serde_json::to_string(&first).unwrap());
        assert_eq!(parse_calendar(&reencoded).unwrap(), first);
    }

    #[test]
    fn test_bracket_fallback() {
        let page = r#"<div>calendar: {"holiday":"Diwali"} trailing</div>"#;
        assert_eq!(parse_calendar(page).unwrap(), json!({"holiday": "Diwali"}));
    }

    #[test]
    fn test_strict_extractor_skips_bracket_fallback() {
        let page = r#"<div>{"holiday":"Diwali"}</div>"#;
        let err = CalendarExtractor::strict().extract(page).unwrap_err();
        assert!(matches!(err, ScrapeError::CalendarNotFound { .. }));
    }

    #[test]
    fn test_no_span_reports_preview() {
        let page = "plain text without any structure";
        match parse_calendar(page) {
            Err(ScrapeError::CalendarNotFound { preview }) => assert_eq!(preview, page),
            other => panic!("expected CalendarNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_assignment() {
        let page = "var obj = JSON.parse(  );";
        assert!(matches!(parse_calendar(page), Err(ScrapeError::CalendarEmpty)));
    }

    #[test]
    fn test_undecodable_span() {
        let page = "var obj = JSON.parse(someVariable);";
        match parse_calendar(page) {
            Err(ScrapeError::CalendarDecode { preview, .. }) => assert_eq!(preview, "someVariable"),
            other => panic!("expected CalendarDecode, got {other:?}"),
        }
    }

    #[test]
    fn test_quoted_non_json_string_is_decode_error() {
        let page = r#"var obj = JSON.parse("not json at all");"#;
        assert!(matches!(
            parse_calendar(page),
            Err(ScrapeError::CalendarDecode { .. })
        ));
    }

    #[test]
    fn test_strategy_locate() {
        assert_eq!(
            CalendarStrategy::JsonParseAssignment.locate("var obj = JSON.parse([1]);"),
            Some("[1]")
        );
        assert_eq!(CalendarStrategy::BracketSpan.locate("x [1,2] y"), Some("[1,2]"));
        assert_eq!(CalendarStrategy::BracketSpan.locate("nothing"), None);
    }
}
