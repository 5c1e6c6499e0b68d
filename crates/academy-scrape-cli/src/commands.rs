//! Single-source commands. Each one logs in, resolves the page token, runs
//! one extractor, and drops the session.

use serde::Serialize;
use serde_json::Value;

use academy_scrape::analytics::{self, AttendanceSummary, Projection};
use academy_scrape::token::{self, Identity};
use academy_scrape::{
    attendance, auth, calendar, semesters, timetable, AttendanceRecord, CredentialProvider,
    PortalConfig, PortalSession, ScrapeError, ScrapeResult, SemesterRecord, Timetable,
};

/// What `login` reports once the portal accepts the credentials.
#[derive(Debug, Clone, Serialize)]
pub struct LoginReport {
    pub success: bool,
    pub student_name: String,
    pub semesters: Vec<SemesterRecord>,
}

/// Attendance for one semester plus its summary numbers.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub success: bool,
    pub batch_id: Option<String>,
    pub attendance: Vec<AttendanceRecord>,
    pub summary: AttendanceSummary,
    /// What-if projections, present only when a plan was requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projections: Vec<CourseProjection>,
}

/// Sessions to attend and to miss for a what-if projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionPlan {
    pub attend: u32,
    pub skip: u32,
}

/// One course's attendance after following a [`SessionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProjection {
    pub code: String,
    pub name: String,
    #[serde(flatten)]
    pub projection: Projection,
}

/// Apply `plan` to every course, in the order given.
pub fn project_records(records: &[AttendanceRecord], plan: SessionPlan) -> Vec<CourseProjection> {
    records
        .iter()
        .map(|r| CourseProjection {
            code: r.code.clone(),
            name: r.name.clone(),
            projection: analytics::project(r.attended, r.total, plan.attend, plan.skip),
        })
        .collect()
}

async fn open(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<(PortalSession, Identity)> {
    let session = auth::authenticate_with(config, provider).await?;
    let identity = token::resolve_identity(&session, session.username()).await?;
    Ok((session, identity))
}

pub async fn login(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<LoginReport> {
    let (session, identity) = open(config, provider).await?;
    let semesters = semesters::fetch_semesters(&session, &identity.token).await;
    session.logout();
    Ok(LoginReport {
        success: true,
        student_name: identity.display_name,
        semesters: semesters?,
    })
}

pub async fn list_semesters(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<Vec<SemesterRecord>> {
    let (session, identity) = open(config, provider).await?;
    let semesters = semesters::fetch_semesters(&session, &identity.token).await;
    session.logout();
    semesters
}

/// Attendance for `batch_id`, or for the first listed semester when absent,
/// projected through `plan` when one is given.
pub async fn attendance(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
    batch_id: Option<String>,
    plan: Option<SessionPlan>,
) -> ScrapeResult<AttendanceReport> {
    let (session, identity) = open(config, provider).await?;
    let result = async {
        let batch_id = match batch_id {
            Some(id) => Some(id),
            None => semesters::fetch_semesters(&session, &identity.token)
                .await?
                .into_iter()
                .next()
                .map(|s| s.id),
        };
        let records =
            attendance::fetch_attendance(&session, batch_id.as_deref(), &identity.token).await?;
        Ok::<_, ScrapeError>(AttendanceReport {
            success: true,
            summary: AttendanceSummary::from_records(&records),
            projections: plan
                .map(|plan| project_records(&records, plan))
                .unwrap_or_default(),
            batch_id,
            attendance: records,
        })
    }
    .await;
    session.logout();
    result
}

pub async fn calendar(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
    strict: bool,
) -> ScrapeResult<Value> {
    let (session, identity) = open(config, provider).await?;
    let extractor = if strict {
        calendar::CalendarExtractor::strict()
    } else {
        calendar::CalendarExtractor::default()
    };
    let result = calendar::fetch_calendar_with(&session, &identity.token, &extractor).await;
    session.logout();
    result
}

pub async fn timetable(
    config: &PortalConfig,
    provider: &dyn CredentialProvider,
) -> ScrapeResult<Timetable> {
    let (session, identity) = open(config, provider).await?;
    let result = timetable::fetch_timetable(&session, &identity.token).await;
    session.logout();
    result
}
