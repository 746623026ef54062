use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::MonthKey;
use crate::model::{AttendanceStatus, Student};

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub fn round_percent(part: usize, whole: usize) -> i64 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCount {
    pub session: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademyStats {
    pub total_students: usize,
    pub attendance_rate: i64,
    pub total_present: usize,
    pub total_attendance_records: usize,
    pub current_month: String,
    pub current_fee_collection: i64,
    pub paid_current: usize,
    pub last_month: String,
    pub last_month_fee_collection: i64,
    pub paid_last: usize,
    pub session_counts: Vec<SessionCount>,
}

fn paid_count(students: &[Student], month: MonthKey) -> usize {
    let (m, y) = (month.month_str(), month.year_str());
    students
        .iter()
        .filter(|s| s.fee_history.iter().any(|f| f.is_paid_for(&m, &y)))
        .count()
}

/// Academy-wide rates for a student list. Pure; call again whenever the list changes.
pub fn academy_stats(students: &[Student], session_names: &[String], today: NaiveDate) -> AcademyStats {
    let total_students = students.len();

    let mut total_present = 0usize;
    let mut total_attendance_records = 0usize;
    for s in students {
        total_attendance_records += s.attendance_history.len();
        total_present += s
            .attendance_history
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count();
    }

    let current = MonthKey::of(today);
    let last = current.prev();
    let paid_current = paid_count(students, current);
    let paid_last = paid_count(students, last);

    let session_counts = session_names
        .iter()
        .map(|name| SessionCount {
            session: name.clone(),
            count: students.iter().filter(|s| &s.session == name).count(),
        })
        .collect();

    AcademyStats {
        total_students,
        attendance_rate: round_percent(total_present, total_attendance_records),
        total_present,
        total_attendance_records,
        current_month: current.key(),
        current_fee_collection: round_percent(paid_current, total_students),
        paid_current,
        last_month: last.key(),
        last_month_fee_collection: round_percent(paid_last, total_students),
        paid_last,
        session_counts,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub recent_students: Vec<Student>,
}

pub const DASHBOARD_RECENT_LIMIT: usize = 10;

/// Student count plus the first ten by name, descending.
pub fn dashboard_summary(mut students: Vec<Student>) -> DashboardSummary {
    let total_students = students.len();
    students.sort_by(|a, b| b.full_name.cmp(&a.full_name));
    students.truncate(DASHBOARD_RECENT_LIMIT);
    DashboardSummary {
        total_students,
        recent_students: students,
    }
}
