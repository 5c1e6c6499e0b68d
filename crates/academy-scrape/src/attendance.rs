//! Attendance extraction.
//!
//! The attendance endpoint has answered with a JSON array on some days and an
//! HTML table on others, with nothing in the request to pick one. Parsing is
//! two-tiered: JSON first, then the table. Malformed records are dropped one
//! by one; a record is never half-built.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::config::controller;
use crate::http_client::CSRF_HEADER;
use crate::markup;
use crate::outcome::ParseOutcome;
use crate::session::PortalSession;
use crate::token::SecurityToken;
use crate::types::{AttendanceRecord, ScrapeResult};

const CODE_KEYS: (&str, &str) = ("subjectCode", "courseCode");
const NAME_KEYS: (&str, &str) = ("subjectName", "courseName");
const ATTENDED_KEYS: (&str, &str) = ("presentClasses", "attended");
const TOTAL_KEYS: (&str, &str) = ("totalClasses", "total");
const PERCENTAGE_KEYS: (&str, &str) = ("attendancePercentage", "percentage");

/// Parse an attendance response body, JSON first, then HTML.
pub fn parse_attendance(body: &str) -> ParseOutcome<Vec<AttendanceRecord>> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => ParseOutcome::Json(parse_json_records(&value)),
        Err(_) => parse_html_table(body),
    }
}

// ── JSON tier ───────────────────────────────────────────────────────────────

/// Records from a decoded JSON body. Anything but an array yields nothing.
pub fn parse_json_records(value: &Value) -> Vec<AttendanceRecord> {
    let Some(items) = value.as_array() else {
        tracing::debug!("Attendance JSON is not an array; no records");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let record = item.as_object().and_then(json_record);
            if record.is_none() {
                tracing::debug!("Skipping malformed attendance object");
            }
            record
        })
        .collect()
}

fn json_record(obj: &Map<String, Value>) -> Option<AttendanceRecord> {
    Some(AttendanceRecord {
        code: as_text(pick(obj, CODE_KEYS)?)?,
        name: as_text(pick(obj, NAME_KEYS)?)?,
        attended: as_count(pick(obj, ATTENDED_KEYS)?)?,
        total: as_count(pick(obj, TOTAL_KEYS)?)?,
        percentage: as_percentage(pick(obj, PERCENTAGE_KEYS)?)?,
    })
}

/// The primary key's value unless it is null or an empty string, else the
/// alternate key's value.
fn pick<'a>(obj: &'a Map<String, Value>, (primary, alternate): (&str, &str)) -> Option<&'a Value> {
    let usable = |v: &&Value| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    };
    obj.get(primary)
        .filter(usable)
        .or_else(|| obj.get(alternate).filter(usable))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => u32::try_from(v).ok(),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f.trunc() as u32),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_percentage(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.trunc().clamp(0.0, 100.0) as u8)
}

// ── HTML tier ───────────────────────────────────────────────────────────────

/// Records from table rows: code, name, `attended/total`, percentage.
///
/// The endpoint may answer with bare `<tr>`/`<td>` fragments. HTML5 parsing
/// drops table-row tags outside a `<table>`, so such fragments are wrapped
/// in one first.
pub fn parse_html_table(body: &str) -> ParseOutcome<Vec<AttendanceRecord>> {
    let document = if body.to_ascii_lowercase().contains("<table") {
        Html::parse_document(body)
    } else {
        Html::parse_document(&format!("<table>{body}</table>"))
    };
    let row_sel = Selector::parse("tr").expect("row selector is valid");
    let cell_sel = Selector::parse("td").expect("cell selector is valid");

    let mut saw_row = false;
    let mut records = Vec::new();
    for row in document.select(&row_sel) {
        saw_row = true;
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        match html_record(&cells) {
            Some(record) => records.push(record),
            None => tracing::debug!("Skipping attendance row with {} cells", cells.len()),
        }
    }

    if !saw_row {
        return ParseOutcome::Failure("response is neither JSON nor an attendance table".into());
    }
    ParseOutcome::Html(records)
}

fn html_record(cells: &[ElementRef<'_>]) -> Option<AttendanceRecord> {
    if cells.len() < 4 {
        return None;
    }
    let (attended, total) = split_fraction(&markup::element_text(&cells[2]))?;

    Some(AttendanceRecord {
        code: markup::element_text(&cells[0]),
        name: markup::element_text(&cells[1]),
        attended,
        total,
        percentage: percentage_cell(&markup::element_text(&cells[3])),
    })
}

/// `"40/45"` → `(40, 45)`. Exactly one slash, both sides integers.
fn split_fraction(text: &str) -> Option<(u32, u32)> {
    let (left, right) = text.split_once('/')?;
    if right.contains('/') {
        return None;
    }
    Some((left.trim().parse().ok()?, right.trim().parse().ok()?))
}

/// `"88%"` → 88. Anything that is not plain digits after dropping `%` is 0.
fn percentage_cell(text: &str) -> u8 {
    let digits = text.replace('%', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    digits.parse::<u32>().map(|p| p.min(100) as u8).unwrap_or(100)
}

// ── Fetch ───────────────────────────────────────────────────────────────────

/// Fetch attendance for one batch/term.
///
/// No batch id means no attendance: returns empty without touching the
/// network.
pub async fn fetch_attendance(
    session: &PortalSession,
    batch_id: Option<&str>,
    token: &SecurityToken,
) -> ScrapeResult<Vec<AttendanceRecord>> {
    let Some(batch_id) = batch_id.filter(|id| !id.trim().is_empty()) else {
        tracing::debug!("No batch id; skipping attendance fetch");
        return Ok(Vec::new());
    };

    let config = session.config();
    let form = [
        ("menuId", controller::ATTENDANCE_MENU_ID),
        ("controllerMode", controller::ATTENDANCE_CONTROLLER_MODE),
        ("actionType", controller::ATTENDANCE_ACTION_TYPE),
        ("batchClassId", batch_id),
    ];
    let referer = config.referer_url();
    let headers = [(CSRF_HEADER, token.as_str()), ("referer", referer.as_str())];

    let response = session
        .client()
        .post_form(&config.admin_url(), &form, &headers)
        .await?
        .error_for_status()?;

    let outcome = parse_attendance(&response.body);
    let source = outcome.source();
    let records = match outcome.into_result() {
        Ok(records) => records,
        Err(reason) => {
            tracing::warn!("Attendance response unusable: {reason}");
            Vec::new()
        }
    };
    tracing::info!("Extracted {} attendance records ({source:?})", records.len());
    Ok(records)
}
