//! Tagged parse results for endpoints whose response format shifts.

use serde::{Deserialize, Serialize};

/// Which representation a response was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Json,
    Html,
}

/// Result of parsing a response that may arrive as JSON or as HTML.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    /// Decoded from a JSON body.
    Json(T),
    /// Decoded from an HTML body after JSON decoding failed.
    Html(T),
    /// Neither representation yielded a value.
    Failure(String),
}

impl<T> ParseOutcome<T> {
    pub fn is_failure(&self) -> bool {
        matches!(self, ParseOutcome::Failure(_))
    }

    pub fn source(&self) -> Option<SourceFormat> {
        match self {
            ParseOutcome::Json(_) => Some(SourceFormat::Json),
            ParseOutcome::Html(_) => Some(SourceFormat::Html),
            ParseOutcome::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Json(v) => ParseOutcome::Json(f(v)),
            ParseOutcome::Html(v) => ParseOutcome::Html(f(v)),
            ParseOutcome::Failure(reason) => ParseOutcome::Failure(reason),
        }
    }

    /// Drop the source tag, keeping the failure reason as the error.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            ParseOutcome::Json(v) | ParseOutcome::Html(v) => Ok(v),
            ParseOutcome::Failure(reason) => Err(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags() {
        assert_eq!(ParseOutcome::Json(1).source(), Some(SourceFormat::Json));
        assert_eq!(ParseOutcome::Html(1).source(), Some(SourceFormat::Html));
        assert_eq!(ParseOutcome::<u8>::Failure("x".into()).source(), None);
    }

    #[test]
    fn test_map_keeps_tag() {
        let outcome = ParseOutcome::Html(vec![1, 2, 3]).map(|v| v.len());
        assert_eq!(outcome, ParseOutcome::Html(3));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ParseOutcome::Json(5).into_result(), Ok(5));
        let failure: ParseOutcome<u8> = ParseOutcome::Failure("no table".into());
        assert!(failure.is_failure());
        assert_eq!(failure.into_result(), Err("no table".to_string()));
    }
}
