//! Attendance arithmetic against the minimum-attendance threshold.
//!
//! Everything here works on the counts the portal reported. The portal's own
//! `percentage` is used for classification; projections recompute from
//! `attended / total`.

use serde::{Deserialize, Serialize};

use crate::types::AttendanceRecord;

/// Minimum attendance percentage the institution requires.
pub const ATTENDANCE_THRESHOLD: u8 = 75;

/// Dashboard-level numbers over a set of courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_courses: usize,
    /// Rounded mean of the per-course percentages; 0 with no courses.
    pub average_percentage: u8,
    /// Courses at or above the threshold.
    pub good_courses: usize,
    /// Courses below the threshold.
    pub low_courses: usize,
}

impl AttendanceSummary {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        Self::with_threshold(records, ATTENDANCE_THRESHOLD)
    }

    pub fn with_threshold(records: &[AttendanceRecord], threshold: u8) -> Self {
        let total_courses = records.len();
        if total_courses == 0 {
            return Self::default();
        }
        let sum: u32 = records.iter().map(|r| u32::from(r.percentage)).sum();
        let average = (f64::from(sum) / total_courses as f64).round();
        let good_courses = records.iter().filter(|r| r.percentage >= threshold).count();

        Self {
            total_courses,
            average_percentage: average.clamp(0.0, 100.0) as u8,
            good_courses,
            low_courses: total_courses - good_courses,
        }
    }
}

/// Where a course stands relative to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "sessions", rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Below target: this many consecutive sessions must be attended.
    NeedsClasses(u32),
    /// Above target: this many sessions can be missed.
    CanSkip(u32),
    /// At or above target with no slack.
    OnTrack,
}

impl AttendanceStatus {
    pub fn for_record(record: &AttendanceRecord, target: u8) -> Self {
        if record.percentage < target {
            AttendanceStatus::NeedsClasses(classes_to_reach(record.attended, record.total, target))
        } else {
            match classes_can_skip(record.attended, record.total, target) {
                0 => AttendanceStatus::OnTrack,
                n => AttendanceStatus::CanSkip(n),
            }
        }
    }
}

/// Consecutive sessions needed to reach `target` percent:
/// `ceil((t·T − A) / (1 − t))` with `t = target / 100`.
///
/// 0 when already at target. A target of 100 is unreachable once a session
/// has been missed, which saturates to `u32::MAX`.
pub fn classes_to_reach(attended: u32, total: u32, target: u8) -> u32 {
    let t = f64::from(target.min(100)) / 100.0;
    let needed = t * f64::from(total) - f64::from(attended);
    if needed <= 0.0 {
        return 0;
    }
    if t >= 1.0 {
        return u32::MAX;
    }
    let x = (needed / (1.0 - t)).ceil();
    if x >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        x as u32
    }
}

/// Sessions that can be missed while staying at or above `target` percent:
/// `floor(A / t − T)`, never negative.
pub fn classes_can_skip(attended: u32, total: u32, target: u8) -> u32 {
    if target == 0 {
        return u32::MAX;
    }
    let t = f64::from(target.min(100)) / 100.0;
    let x = (f64::from(attended) / t - f64::from(total)).floor();
    if x <= 0.0 {
        0
    } else {
        x.min(f64::from(u32::MAX)) as u32
    }
}

/// Projected attendance after attending and missing some sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub attended: u32,
    pub total: u32,
    pub percentage: f64,
    /// `percentage` minus the current percentage.
    pub change: f64,
    pub below_threshold: bool,
}

fn ratio_percent(attended: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(attended) / f64::from(total) * 100.0
    }
}

/// `(A + x) / (T + x + y) · 100` after attending `attend` and skipping `skip`.
pub fn project(attended: u32, total: u32, attend: u32, skip: u32) -> Projection {
    let new_attended = attended.saturating_add(attend);
    let new_total = total.saturating_add(attend).saturating_add(skip);
    let percentage = ratio_percent(new_attended, new_total);

    Projection {
        attended: new_attended,
        total: new_total,
        percentage,
        change: percentage - ratio_percent(attended, total),
        below_threshold: percentage < f64::from(ATTENDANCE_THRESHOLD),
    }
}

/// Copy of `records` sorted lowest percentage first.
pub fn sorted_by_percentage(records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.percentage);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(code: &str, attended: u32, total: u32, percentage: u8) -> AttendanceRecord {
        AttendanceRecord {
            code: code.into(),
            name: format!("{code} course"),
            attended,
            total,
            percentage,
        }
    }

    #[test]
    fn test_summary() {
        let records = vec![rec("A", 40, 45, 88), rec("B", 20, 40, 50), rec("C", 30, 40, 75)];
        let summary = AttendanceSummary::from_records(&records);
        assert_eq!(
            summary,
            AttendanceSummary {
                total_courses: 3,
                average_percentage: 71,
                good_courses: 2,
                low_courses: 1,
            }
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(AttendanceSummary::from_records(&[]), AttendanceSummary::default());
    }

    #[test]
    fn test_classes_to_reach() {
        // 20/40 → need x with (20+x)/(40+x) >= 0.75 → x = 40
        assert_eq!(classes_to_reach(20, 40, 75), 40);
        assert_eq!(classes_to_reach(30, 40, 75), 0);
        assert_eq!(classes_to_reach(29, 40, 75), 4);
        assert_eq!(classes_to_reach(9, 10, 100), u32::MAX);
    }

    #[test]
    fn test_classes_can_skip() {
        // 40/45 → floor(40/0.75 − 45) = 8
        assert_eq!(classes_can_skip(40, 45, 75), 8);
        assert_eq!(classes_can_skip(30, 40, 75), 0);
        assert_eq!(classes_can_skip(10, 40, 75), 0);
    }

    #[test]
    fn test_status_for_record() {
        assert_eq!(
            AttendanceStatus::for_record(&rec("A", 40, 45, 88), 75),
            AttendanceStatus::CanSkip(8)
        );
        assert_eq!(
            AttendanceStatus::for_record(&rec("B", 30, 40, 75), 75),
            AttendanceStatus::OnTrack
        );
        assert_eq!(
            AttendanceStatus::for_record(&rec("C", 20, 40, 50), 75),
            AttendanceStatus::NeedsClasses(40)
        );
    }

    #[test]
    fn test_project() {
        let p = project(30, 40, 10, 0);
        assert_eq!((p.attended, p.total), (40, 50));
        assert!((p.percentage - 80.0).abs() < 1e-9);
        assert!((p.change - 5.0).abs() < 1e-9);
        assert!(!p.below_threshold);

        let p = project(30, 40, 0, 5);
        assert!((p.percentage - 66.666_666_666).abs() < 1e-6);
        assert!(p.below_threshold);
    }

    #[test]
    fn test_project_zero_total() {
        let p = project(0, 0, 0, 0);
        assert_eq!(p.percentage, 0.0);
        assert_eq!(p.change, 0.0);
    }

    #[test]
    fn test_sorted_by_percentage() {
        let records = vec![rec("A", 1, 1, 90), rec("B", 1, 1, 40), rec("C", 1, 1, 75)];
        let codes: Vec<_> = sorted_by_percentage(&records)
            .into_iter()
            .map(|r| r.code)
            .collect();
        assert_eq!(codes, vec!["B", "C", "A"]);
    }
}
