//! Core data types for extracted portal records and the error taxonomy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum number of characters of upstream content carried in an error.
pub const PREVIEW_CHARS: usize = 300;

/// An enrollment term as listed by the semesters endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterRecord {
    pub id: String,
    pub name: String,
}

/// Attendance for one course.
///
/// `attended <= total` is not checked: the portal occasionally reports more
/// attended classes than held ones and the values are passed through as-is.
/// `percentage` comes from the portal, not from `attended / total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub code: String,
    pub name: String,
    pub attended: u32,
    pub total: u32,
    pub percentage: u8,
}

/// Teaching days recognised by the timetable. Sunday never appears upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Map the portal's 1-based day index. Anything outside 1..=6 is `None`.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Weekday::Monday),
            2 => Some(Weekday::Tuesday),
            3 => Some(Weekday::Wednesday),
            4 => Some(Weekday::Thursday),
            5 => Some(Weekday::Friday),
            6 => Some(Weekday::Saturday),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weekly schedule for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubjectSchedule {
    pub name: String,
    /// Day → time ranges (`"09:00 - 09:50"`). Days iterate Monday first;
    /// each day's ranges keep the order they were encountered.
    pub schedule: BTreeMap<Weekday, Vec<String>>,
}

/// Subject code → weekly schedule, sorted by code so output is stable
/// regardless of how the portal orders its cells.
pub type Timetable = BTreeMap<String, SubjectSchedule>;

/// Coarse classification of a [`ScrapeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure or non-success HTTP status.
    Transport,
    /// The portal rejected the credentials.
    Authentication,
    /// Expected token, JSON literal, or table structure was missing.
    Parse,
    /// Local configuration or credential lookup failed.
    Config,
}

/// All errors that can occur while talking to the portal.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login token not found on page")]
    LoginTokenNotFound,

    #[error("CSRF token not found on page")]
    CsrfNotFound,

    #[error("Could not parse calendar data. Response preview: {preview}")]
    CalendarNotFound { preview: String },

    #[error("Calendar JSON is empty. Match found but content is blank.")]
    CalendarEmpty,

    #[error("Calendar JSON decode error: {error}. Content preview: {preview}")]
    CalendarDecode { error: String, preview: String },

    #[error("Could not parse timetable data.")]
    TimetableNotFound,

    #[error("Timetable JSON decode error: {0}")]
    TimetableDecode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Http(_) | ScrapeError::Status { .. } => ErrorKind::Transport,
            ScrapeError::InvalidCredentials => ErrorKind::Authentication,
            ScrapeError::LoginTokenNotFound
            | ScrapeError::CsrfNotFound
            | ScrapeError::CalendarNotFound { .. }
            | ScrapeError::CalendarEmpty
            | ScrapeError::CalendarDecode { .. }
            | ScrapeError::TimetableNotFound
            | ScrapeError::TimetableDecode(_) => ErrorKind::Parse,
            ScrapeError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Convenience result type.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// First [`PREVIEW_CHARS`] characters of `text`, cut on a char boundary.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_from_index() {
        assert_eq!(Weekday::from_index(1), Some(Weekday::Monday));
        assert_eq!(Weekday::from_index(6), Some(Weekday::Saturday));
        assert_eq!(Weekday::from_index(0), None);
        assert_eq!(Weekday::from_index(7), None);
    }

    #[test]
    fn test_weekday_serializes_as_map_key() {
        let mut schedule = BTreeMap::new();
        schedule.insert(Weekday::Friday, vec!["10:00 - 10:50".to_string()]);
        schedule.insert(Weekday::Monday, vec!["09:00 - 09:50".to_string()]);
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(
            json,
            r#"{"Monday":["09:00 - 09:50"],"Friday":["10:00 - 10:50"]}"#
        );
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ScrapeError::InvalidCredentials.kind(), ErrorKind::Authentication);
        assert_eq!(ScrapeError::TimetableNotFound.kind(), ErrorKind::Parse);
        assert_eq!(
            ScrapeError::Status {
                status: 500,
                url: "https://example.com".into()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ScrapeError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }
}
