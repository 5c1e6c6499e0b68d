//! Plain-text rendering of extracted data for the terminal.

use std::fmt::Write;

use academy_scrape::analytics::{self, AttendanceStatus, AttendanceSummary, ATTENDANCE_THRESHOLD};
use academy_scrape::{AttendanceRecord, PortalSnapshot, SemesterRecord, Timetable};

use crate::commands::{CourseProjection, SessionPlan};

const NAME_WIDTH: usize = 32;

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn status_line(status: AttendanceStatus) -> String {
    match status {
        AttendanceStatus::NeedsClasses(u32::MAX) => "cannot reach target".to_string(),
        AttendanceStatus::NeedsClasses(n) => format!("attend {n} more session{}", plural(n)),
        AttendanceStatus::CanSkip(n) => format!("can skip {n} session{}", plural(n)),
        AttendanceStatus::OnTrack => "on track, no slack".to_string(),
    }
}

pub fn render_semesters(semesters: &[SemesterRecord]) -> String {
    if semesters.is_empty() {
        return "No semesters listed.\n".to_string();
    }
    let mut out = String::new();
    for s in semesters {
        let _ = writeln!(out, "{:>8}  {}", s.id, s.name);
    }
    out
}

/// Attendance table, lowest percentage first, followed by the summary.
pub fn render_attendance(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return "No attendance data available.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<NAME_WIDTH$} {:>9} {:>5}  {}",
        "Code", "Course", "Attended", "%", "Status"
    );
    for r in analytics::sorted_by_percentage(records) {
        let status = AttendanceStatus::for_record(&r, ATTENDANCE_THRESHOLD);
        let _ = writeln!(
            out,
            "{:<12} {:<NAME_WIDTH$} {:>9} {:>4}%  {}",
            r.code,
            truncate(&r.name, NAME_WIDTH),
            format!("{}/{}", r.attended, r.total),
            r.percentage,
            status_line(status)
        );
    }

    let summary = AttendanceSummary::from_records(records);
    let _ = writeln!(
        out,
        "\n{} courses, average {}%, {} at or above {ATTENDANCE_THRESHOLD}%, {} below",
        summary.total_courses, summary.average_percentage, summary.good_courses, summary.low_courses
    );
    out
}

/// Per-course outcome of attending `plan.attend` and missing `plan.skip`.
pub fn render_projections(projections: &[CourseProjection], plan: SessionPlan) -> String {
    if projections.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nAfter attending {} and missing {} session{}:",
        plan.attend,
        plan.skip,
        plural(plan.skip)
    );
    for p in projections {
        let flag = if p.projection.below_threshold { "  below target" } else { "" };
        let _ = writeln!(
            out,
            "{:<12} {:>9} {:>6.1}% ({:+.1}){flag}",
            p.code,
            format!("{}/{}", p.projection.attended, p.projection.total),
            p.projection.percentage,
            p.projection.change
        );
    }
    out
}

pub fn render_timetable(timetable: &Timetable) -> String {
    if timetable.is_empty() {
        return "No timetable entries.\n".to_string();
    }
    let mut out = String::new();
    for (code, subject) in timetable {
        let _ = writeln!(out, "{code}  {}", subject.name);
        for (day, times) in &subject.schedule {
            let _ = writeln!(out, "    {:<10} {}", day.name(), times.join(", "));
        }
    }
    out
}

/// Everything in a snapshot, with per-source errors inline.
pub fn render_snapshot(snapshot: &PortalSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Student: {}", snapshot.student_name);
    if let Some(batch) = &snapshot.selected_batch_id {
        let _ = writeln!(out, "Semester: {batch}");
    }

    out.push_str("\n== Attendance ==\n");
    out.push_str(&render_attendance(&snapshot.attendance));

    out.push_str("\n== Timetable ==\n");
    match (&snapshot.timetable, &snapshot.timetable_error) {
        (Some(t), _) => out.push_str(&render_timetable(t)),
        (None, Some(e)) => {
            let _ = writeln!(out, "unavailable: {e}");
        }
        (None, None) => out.push_str("unavailable\n"),
    }

    out.push_str("\n== Calendar ==\n");
    match (&snapshot.calendar, &snapshot.calendar_error) {
        (Some(c), _) => {
            let entries = c.as_array().map(Vec::len).unwrap_or(1);
            let _ = writeln!(out, "{entries} entries (use --json for details)");
        }
        (None, Some(e)) => {
            let _ = writeln!(out, "unavailable: {e}");
        }
        (None, None) => out.push_str("unavailable\n"),
    }
    out
}
