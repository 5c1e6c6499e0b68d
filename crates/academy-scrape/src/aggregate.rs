//! The "fetch everything" operation behind the dashboard.
//!
//! Login and identity failures abort the whole fetch, as do semester and
//! attendance failures. Calendar and timetable are fetched concurrently and
//! isolated: a failure in either is reported next to a `None` result while
//! the rest of the snapshot is still returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attendance;
use crate::auth;
use crate::calendar;
use crate::config::PortalConfig;
use crate::session::{CredentialProvider, PortalSession};
use crate::timetable;
use crate::token;
use crate::types::{AttendanceRecord, ScrapeError, ScrapeResult, SemesterRecord, Timetable};

/// Everything one dashboard load shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSnapshot {
    pub student_name: String,
    pub semesters: Vec<SemesterRecord>,
    /// Semester whose attendance was fetched: the first one listed.
    pub selected_batch_id: Option<String>,
    pub attendance: Vec<AttendanceRecord>,
    pub calendar: Option<Value>,
    pub timetable: Option<Timetable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_error: Option<String>,
}

impl PortalSnapshot {
    /// Response body with the `success` flag the dashboard expects.
    pub fn to_response_json(&self) -> ScrapeResult<Value> {
        let value = serde_json::to_value(self)
            .map_err(|e| ScrapeError::Config(format!("snapshot is not serializable: {e}")))?;
        match value {
            Value::Object(fields) => {
                let mut body = serde_json::Map::with_capacity(fields.len() + 1);
                body.insert("success".to_string(), Value::Bool(true));
                body.extend(fields);
                Ok(Value::Object(body))
            }
            other => Ok(other),
        }
    }
}

/// The generic failure body. Every error collapses to its message here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

impl From<&ScrapeError> for ErrorEnvelope {
    fn from(e: &ScrapeError) -> Self {
        Self {
            success: false,
            error: e.to_string(),
        }
    }
}

fn isolate<T>(source: &str, result: ScrapeResult<T>) -> (Option<T>, Option<String>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(e) => {
            tracing::warn!("{source} extraction failed: {e}");
            (None, Some(e.to_string()))
        }
    }
}

/// Run every extractor against an already authenticated session.
pub async fn fetch_snapshot(session: &PortalSession) -> ScrapeResult<PortalSnapshot> {
    let resolved = token::resolve_identity_and_semesters(session, session.username()).await?;
    let selected_batch_id = resolved.semesters.first().map(|s| s.id.clone());

    let attendance =
        attendance::fetch_attendance(session, selected_batch_id.as_deref(), &resolved.token).await?;

    let (calendar_result, timetable_result) = tokio::join!(
        calendar::fetch_calendar(session, &resolved.token),
        timetable::fetch_timetable(session, &resolved.token),
    );
    let (calendar, calendar_error) = isolate("Calendar", calendar_result);
    let (timetable, timetable_error) = isolate("Timetable", timetable_result);

    Ok(PortalSnapshot {
        student_name: resolved.display_name,
        semesters: resolved.semesters,
        selected_batch_id,
        attendance,
        calendar,
        timetable,
        calendar_error,
        timetable_error,
    })
}

/// Log in with the provider's credentials and fetch a full snapshot.
///
/// The session lives only for this call.
pub async fn fetch_all(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<PortalSnapshot> {
    let session = auth::authenticate_with(config, provider).await?;
    let snapshot = fetch_snapshot(&session).await;
    session.logout();
    snapshot
}
