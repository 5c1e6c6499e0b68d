//! Weekly timetable extraction.
//!
//! The timetable page embeds two script assignments:
//!
//! - `timeTableTemplateDetailsJson`: slot definitions
//!   (`orderedBy`, `startTime`, `endTime`)
//! - `timeTableJson`: a sparse map from `ttDivText_<day>_<slot>` to
//!   `["ttSubject&&<code>-<name>", ...]`
//!
//! Both must be present; a partial timetable is never returned. Individual
//! cells that do not fit the pattern are skipped.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::http_client::CSRF_HEADER;
use crate::session::PortalSession;
use crate::token::SecurityToken;
use crate::types::{ScrapeError, ScrapeResult, SubjectSchedule, Timetable, Weekday};

pub const SLOTS_VAR: &str = "timeTableTemplateDetailsJson";
pub const SCHEDULE_VAR: &str = "timeTableJson";
pub const CELL_KEY_PREFIX: &str = "ttDivText_";
pub const SUBJECT_PREFIX: &str = "ttSubject&&";

fn slots_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?s)var {SLOTS_VAR}\s*=\s*(.*?);")).expect("slots regex is valid")
    })
}

fn schedule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?s)var {SCHEDULE_VAR}\s*=\s*(.*?);")).expect("schedule regex is valid")
    })
}

/// Slot index → `"HH:MM - HH:MM"`. Definitions missing a field are skipped.
pub fn slot_times(slots: &[Value]) -> HashMap<u32, String> {
    slots
        .iter()
        .filter_map(|slot| {
            let index = match slot.get("orderedBy")? {
                Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            let start = slot.get("startTime")?.as_str()?;
            let end = slot.get("endTime")?.as_str()?;
            Some((index, format!("{start} - {end}")))
        })
        .collect()
}

/// `ttDivText_<day>_<slot>` → `(day, slot)`. Exactly three parts.
pub fn parse_cell_key(key: &str) -> Option<(u32, u32)> {
    let rest = key.strip_prefix(CELL_KEY_PREFIX)?;
    let (day, slot) = rest.split_once('_')?;
    if slot.contains('_') {
        return None;
    }
    Some((day.parse().ok()?, slot.parse().ok()?))
}

/// `"ttSubject&&CS101-Data Structures"` → `("CS101", "Data Structures")`.
///
/// Splits on the first hyphen; the name keeps any later hyphens.
pub fn parse_subject(cell: &str) -> Option<(String, String)> {
    let info = cell.strip_prefix(SUBJECT_PREFIX).unwrap_or(cell);
    let (code, name) = info.split_once('-').unwrap_or((info, ""));
    let code = code.trim();
    if code.is_empty() {
        return None;
    }
    Some((code.to_string(), name.trim().to_string()))
}

/// Reshape slot definitions and the sparse day×slot map into per-subject
/// weekly schedules.
pub fn build_timetable(slots: &[Value], schedule: &Map<String, Value>) -> Timetable {
    let times = slot_times(slots);
    let mut timetable = Timetable::new();

    for (key, value) in schedule {
        if !key.starts_with(CELL_KEY_PREFIX) {
            continue;
        }
        let Some((day_index, slot_index)) = parse_cell_key(key) else {
            tracing::debug!("Skipping timetable key {key}");
            continue;
        };
        let Some(day) = Weekday::from_index(day_index) else {
            continue;
        };
        let Some(time) = times.get(&slot_index) else {
            continue;
        };
        let Some((code, name)) = value
            .as_array()
            .and_then(|cells| cells.first())
            .and_then(Value::as_str)
            .and_then(parse_subject)
        else {
            tracing::debug!("Skipping timetable cell {key} with unexpected value");
            continue;
        };

        timetable
            .entry(code)
            .or_insert_with(|| SubjectSchedule {
                name,
                ..SubjectSchedule::default()
            })
            .schedule
            .entry(day)
            .or_default()
            .push(time.clone());
    }

    timetable
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Extract both script literals from page text and build the timetable.
pub fn parse_timetable(text: &str) -> ScrapeResult<Timetable> {
    let (Some(slots_src), Some(schedule_src)) =
        (capture(slots_regex(), text), capture(schedule_regex(), text))
    else {
        return Err(ScrapeError::TimetableNotFound);
    };

    let slots: Vec<Value> = serde_json::from_str(slots_src)
        .map_err(|e| ScrapeError::TimetableDecode(format!("{SLOTS_VAR}: {e}")))?;
    let schedule: Map<String, Value> = serde_json::from_str(schedule_src)
        .map_err(|e| ScrapeError::TimetableDecode(format!("{SCHEDULE_VAR}: {e}")))?;

    Ok(build_timetable(&slots, &schedule))
}

/// Fetch the timetable page and build the per-subject schedule.
pub async fn fetch_timetable(session: &PortalSession, token: &SecurityToken) -> ScrapeResult<Timetable> {
    let config = session.config();
    let referer = config.referer_url();
    let response = session
        .client()
        .get(
            &config.timetable_url(),
            &[(CSRF_HEADER, token.as_str()), ("referer", referer.as_str())],
        )
        .await?
        .error_for_status()?;

    let timetable = parse_timetable(&response.body)?;
    tracing::info!("Extracted timetable for {} subjects", timetable.len());
    Ok(timetable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(slots: &str, schedule: &str) -> String {
        format!(
            "<script>\nvar {SLOTS_VAR}={slots};\nvar {SCHEDULE_VAR}={schedule};\n</script>"
        )
    }

    #[test]
    fn test_single_cell() {
        let text = page(
            r#"[{"orderedBy":1,"startTime":"09:00","endTime":"09:50"}]"#,
            r#"{"ttDivText_1_1":["ttSubject&&CS101-Data Structures"]}"#,
        );
        let timetable = parse_timetable(&text).unwrap();
        assert_eq!(
            serde_json::to_value(&timetable).unwrap(),
            json!({"CS101": {"name": "Data Structures", "schedule": {"Monday": ["09:00 - 09:50"]}}})
        );
    }

    #[test]
    fn test_subject_across_days_and_slots() {
        let text = page(
            r#"[{"orderedBy":1,"startTime":"09:00","endTime":"09:50"},
                {"orderedBy":2,"startTime":"10:00","endTime":"10:50"}]"#,
            r#"{"ttDivText_1_1":["ttSubject&&CS101-Data Structures"],
                "ttDivText_1_2":["ttSubject&&CS101-Data Structures"],
                "ttDivText_3_2":["ttSubject&&CS101-Data Structures"],
                "ttDivText_2_1":["ttSubject&&MA201-Linear-Algebra II"]}"#,
        );
        let timetable = parse_timetable(&text).unwrap();

        let cs = &timetable["CS101"];
        assert_eq!(
            cs.schedule[&Weekday::Monday],
            vec!["09:00 - 09:50", "10:00 - 10:50"]
        );
        assert_eq!(cs.schedule[&Weekday::Wednesday], vec!["10:00 - 10:50"]);

        let ma = &timetable["MA201"];
        assert_eq!(ma.name, "Linear-Algebra II");
        assert_eq!(ma.schedule[&Weekday::Tuesday], vec!["09:00 - 09:50"]);
    }

    #[test]
    fn test_output_is_sorted_by_code_and_weekday() {
        let text = page(
            r#"[{"orderedBy":1,"startTime":"09:00","endTime":"09:50"}]"#,
            r#"{"ttDivText_3_1":["ttSubject&&ZZ9-Zoology"],
                "ttDivText_5_1":["ttSubject&&AA1-Algebra"],
                "ttDivText_1_1":["ttSubject&&AA1-Algebra"]}"#,
        );
        let timetable = parse_timetable(&text).unwrap();

        let codes: Vec<&str> = timetable.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["AA1", "ZZ9"]);
        let days: Vec<Weekday> = timetable["AA1"].schedule.keys().copied().collect();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Friday]);

        let rendered = serde_json::to_string(&timetable).unwrap();
        assert!(rendered.find("AA1").unwrap() < rendered.find("ZZ9").unwrap());
    }

    #[test]
    fn test_out_of_range_and_malformed_keys_are_skipped() {
        let text = page(
            r#"[{"orderedBy":1,"startTime":"09:00","endTime":"09:50"}]"#,
            r#"{"ttDivText_9_1":["ttSubject&&CS101-DS"],
                "ttDivText_0_1":["ttSubject&&CS101-DS"],
                "ttDivText_1_7":["ttSubject&&CS101-DS"],
                "ttDivText_x_1":["ttSubject&&CS101-DS"],
                "ttDivText_1":["ttSubject&&CS101-DS"],
                "ttDivText_1_1_extra":["ttSubject&&CS101-DS"],
                "ttDivText_1_1":[],
                "otherKey":["ttSubject&&CS101-DS"]}"#,
        );
        assert!(parse_timetable(&text).unwrap().is_empty());
    }

    #[test]
    fn test_missing_schedule_literal() {
        let text = format!("var {SLOTS_VAR}=[];");
        assert!(matches!(
            parse_timetable(&text),
            Err(ScrapeError::TimetableNotFound)
        ));
    }

    #[test]
    fn test_invalid_literal_is_decode_error() {
        let text = page("[{orderedBy:1}]", "{}");
        assert!(matches!(
            parse_timetable(&text),
            Err(ScrapeError::TimetableDecode(_))
        ));
    }

    #[test]
    fn test_parse_cell_key() {
        assert_eq!(parse_cell_key("ttDivText_2_5"), Some((2, 5)));
        assert_eq!(parse_cell_key("ttDivText_2"), None);
        assert_eq!(parse_cell_key("ttDivText_a_5"), None);
        assert_eq!(parse_cell_key("ttDivText_2_5_6"), None);
    }

    #[test]
    fn test_parse_subject() {
        assert_eq!(
            parse_subject("ttSubject&&UE20CS301-Database-Management"),
            Some(("UE20CS301".to_string(), "Database-Management".to_string()))
        );
        assert_eq!(parse_subject("ttSubject&&LAB"), Some(("LAB".to_string(), String::new())));
        assert_eq!(parse_subject("ttSubject&&-Orphan"), None);
    }

    #[test]
    fn test_slot_times_accepts_string_order() {
        let slots = vec![
            json!({"orderedBy": "3", "startTime": "11:00", "endTime": "11:50"}),
            json!({"orderedBy": 4, "startTime": "12:00"}),
        ];
        let times = slot_times(&slots);
        assert_eq!(times.get(&3).map(String::as_str), Some("11:00 - 11:50"));
        assert!(!times.contains_key(&4));
    }
}
