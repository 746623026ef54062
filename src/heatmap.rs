//! Attendance heatmap: a trailing twelve-month calendar grid for one student.
//!
//! Every day in the window gets exactly one [`DayStatus`]. Days before the
//! student joined and days after "today" are always `NoData`, whatever the
//! history says, so the grid never counts pre-enrollment or future days as
//! absences. All comparisons are done on `YYYY-MM-DD` strings.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::dates::{self, MonthKey};
use crate::model::{AttendanceRecord, AttendanceStatus};

pub const WINDOW_MONTHS: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayStatus {
    Present,
    Absent,
    NoData,
}

impl DayStatus {
    /// Register cell code used by the spreadsheet exports.
    pub fn register_code(self) -> &'static str {
        match self {
            DayStatus::Present => "P",
            DayStatus::Absent => "A",
            DayStatus::NoData => "-",
        }
    }
}

impl From<AttendanceStatus> for DayStatus {
    fn from(s: AttendanceStatus) -> Self {
        match s {
            AttendanceStatus::Present => DayStatus::Present,
            AttendanceStatus::Absent => DayStatus::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub date: String,
    pub day_of_week: u32,
    pub status: DayStatus,
}

/// One rendered column. `slots[w]` is the day falling on weekday `w`
/// (0 = Sunday), or `None` where the column crosses a month edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekColumn {
    pub slots: [Option<HeatmapDay>; 7],
}

impl WeekColumn {
    fn empty() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapMonth {
    pub label: &'static str,
    pub year: i32,
    pub month: u32,
    pub days: Vec<HeatmapDay>,
    pub weeks: Vec<WeekColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapStats {
    pub present_days: usize,
    pub absent_days: usize,
    pub active_days: usize,
    pub eligible_days: usize,
    pub attendance_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub today: String,
    pub joining_date: String,
    pub months: Vec<HeatmapMonth>,
    pub stats: HeatmapStats,
}

/// True when `date` lies inside `[joining_date, today]`, both inclusive.
pub fn is_eligible(date: &str, joining_date: &str, today: &str) -> bool {
    date <= today && date >= dates::normalize_date_key(joining_date)
}

/// The record that counts for `date`, if the day is eligible at all.
/// Duplicate records for one date resolve to the first in history order.
pub fn record_for_day<'a>(
    history: &'a [AttendanceRecord],
    date: &str,
    joining_date: &str,
    today: &str,
) -> Option<&'a AttendanceRecord> {
    if !is_eligible(date, joining_date, today) {
        return None;
    }
    history
        .iter()
        .find(|r| dates::normalize_date_key(&r.date) == date)
}

pub fn classify_day(
    history: &[AttendanceRecord],
    date: &str,
    joining_date: &str,
    today: &str,
) -> DayStatus {
    record_for_day(history, date, joining_date, today)
        .map(|r| DayStatus::from(r.status))
        .unwrap_or(DayStatus::NoData)
}

fn week_columns(days: &[HeatmapDay]) -> Vec<WeekColumn> {
    let mut weeks = Vec::new();
    let mut current = WeekColumn::empty();
    for day in days {
        if day.day_of_week == 0 && !current.is_empty() {
            weeks.push(std::mem::replace(&mut current, WeekColumn::empty()));
        }
        current.slots[day.day_of_week as usize] = Some(day.clone());
    }
    if !current.is_empty() {
        weeks.push(current);
    }
    weeks
}

pub fn build_heatmap(
    history: &[AttendanceRecord],
    joining_date: &str,
    today: NaiveDate,
) -> Heatmap {
    let today_key = dates::date_key(today);
    let joining_key = dates::normalize_date_key(joining_date).to_string();
    let current = MonthKey::of(today);

    let mut months = Vec::with_capacity(WINDOW_MONTHS as usize);
    let mut stats = HeatmapStats {
        present_days: 0,
        absent_days: 0,
        active_days: 0,
        eligible_days: 0,
        attendance_rate: 0,
    };

    for offset in (0..WINDOW_MONTHS).rev() {
        let mk = current.offset(-offset);
        let Some(first) = mk.first_day() else {
            continue;
        };
        let first_weekday = first.weekday().num_days_from_sunday();

        let days: Vec<HeatmapDay> = (1..=mk.days())
            .map(|day| {
                let date = mk.day_key(day);
                let status = classify_day(history, &date, &joining_key, &today_key);
                if is_eligible(&date, &joining_key, &today_key) {
                    stats.eligible_days += 1;
                }
                match status {
                    DayStatus::Present => stats.present_days += 1,
                    DayStatus::Absent => stats.absent_days += 1,
                    DayStatus::NoData => {}
                }
                HeatmapDay {
                    date,
                    day_of_week: (first_weekday + day - 1) % 7,
                    status,
                }
            })
            .collect();

        let weeks = week_columns(&days);
        months.push(HeatmapMonth {
            label: mk.abbrev(),
            year: mk.year,
            month: mk.month,
            days,
            weeks,
        });
    }

    stats.active_days = stats.present_days + stats.absent_days;
    stats.attendance_rate = crate::calc::round_percent(stats.present_days, stats.active_days);

    Heatmap {
        today: today_key,
        joining_date: joining_key,
        months,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            date: date.to_string(),
            status,
            marked_by: "coach-1".to_string(),
            marked_by_name: None,
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn day<'a>(h: &'a Heatmap, date: &str) -> &'a HeatmapDay {
        h.months
            .iter()
            .flat_map(|m| m.days.iter())
            .find(|d| d.date == date)
            .expect("day in window")
    }

    #[test]
    fn window_is_twelve_months_ending_with_current() {
        let h = build_heatmap(&[], "2020-01-01", ymd(2024, 3, 10));
        assert_eq!(h.months.len(), 12);
        assert_eq!((h.months[0].year, h.months[0].month), (2023, 4));
        assert_eq!((h.months[11].year, h.months[11].month), (2024, 3));
        assert_eq!(h.months[11].label, "Mar");
        // 2024 is a leap year.
        assert_eq!(h.months[10].days.len(), 29);
    }

    #[test]
    fn join_and_today_boundaries_are_inclusive() {
        let history = vec![rec("2024-06-16", AttendanceStatus::Present)];
        let h = build_heatmap(&history, "2024-06-15", ymd(2024, 6, 17));
        assert_eq!(day(&h, "2024-06-14").status, DayStatus::NoData);
        assert_eq!(day(&h, "2024-06-15").status, DayStatus::NoData);
        assert_eq!(day(&h, "2024-06-16").status, DayStatus::Present);
        assert_eq!(day(&h, "2024-06-17").status, DayStatus::NoData);
        assert_eq!(h.stats.eligible_days, 3);
        assert_eq!(h.stats.active_days, 1);
        assert_eq!(h.stats.attendance_rate, 100);
    }

    #[test]
    fn joining_today_gives_one_eligible_day() {
        let today = ymd(2024, 6, 17);
        let h = build_heatmap(&[], "2024-06-17", today);
        assert_eq!(h.stats.eligible_days, 1);
        assert_eq!(h.stats.active_days, 0);

        let history = vec![rec("2024-06-17", AttendanceStatus::Absent)];
        let h = build_heatmap(&history, "2024-06-17T09:30:00.000Z", today);
        assert_eq!(h.stats.active_days, 1);
        assert_eq!(h.stats.attendance_rate, 0);
    }

    #[test]
    fn records_before_joining_or_after_today_never_leak() {
        let history = vec![
            rec("2024-05-01", AttendanceStatus::Present),
            rec("2024-06-20", AttendanceStatus::Present),
            rec("2024-06-10", AttendanceStatus::Absent),
        ];
        let h = build_heatmap(&history, "2024-06-01", ymd(2024, 6, 17));
        assert_eq!(day(&h, "2024-05-01").status, DayStatus::NoData);
        assert_eq!(day(&h, "2024-06-20").status, DayStatus::NoData);
        assert_eq!(day(&h, "2024-06-10").status, DayStatus::Absent);
        assert_eq!(h.stats.present_days, 0);
        assert_eq!(h.stats.absent_days, 1);
    }

    #[test]
    fn duplicate_dates_resolve_to_first_record() {
        let history = vec![
            rec("2024-06-10", AttendanceStatus::Absent),
            rec("2024-06-10T18:00:00Z", AttendanceStatus::Present),
        ];
        assert_eq!(
            classify_day(&history, "2024-06-10", "2024-01-01", "2024-06-17"),
            DayStatus::Absent
        );
    }

    #[test]
    fn week_columns_split_on_sunday() {
        // June 2024 starts on a Saturday and ends on a Sunday.
        let h = build_heatmap(&[], "2024-01-01", ymd(2024, 6, 30));
        let june = &h.months[11];
        assert_eq!(june.days[0].day_of_week, 6);
        assert_eq!(june.days[29].day_of_week, 0);
        assert_eq!(june.weeks.len(), 6);

        let first = &june.weeks[0];
        assert!(first.slots[..6].iter().all(Option::is_none));
        assert_eq!(first.slots[6].as_ref().map(|d| d.date.as_str()), Some("2024-06-01"));

        let last = &june.weeks[5];
        assert_eq!(last.slots[0].as_ref().map(|d| d.date.as_str()), Some("2024-06-30"));
        assert!(last.slots[1..].iter().all(Option::is_none));

        let placed: usize = june
            .weeks
            .iter()
            .map(|w| w.slots.iter().filter(|s| s.is_some()).count())
            .sum();
        assert_eq!(placed, 30);
    }

    #[test]
    fn rate_moves_with_added_records() {
        let today = ymd(2024, 6, 30);
        let mut history = vec![
            rec("2024-06-01", AttendanceStatus::Present),
            rec("2024-06-02", AttendanceStatus::Absent),
        ];
        let base = build_heatmap(&history, "2024-01-01", today).stats.attendance_rate;

        history.push(rec("2024-06-03", AttendanceStatus::Present));
        let more_present = build_heatmap(&history, "2024-01-01", today).stats.attendance_rate;
        assert!(more_present >= base);

        history.push(rec("2024-06-04", AttendanceStatus::Absent));
        history.push(rec("2024-06-05", AttendanceStatus::Absent));
        let more_absent = build_heatmap(&history, "2024-01-01", today).stats.attendance_rate;
        assert!(more_absent <= more_present);
    }

    #[test]
    fn building_twice_is_identical() {
        let history = vec![
            rec("2024-02-29", AttendanceStatus::Present),
            rec("2024-03-01", AttendanceStatus::Absent),
        ];
        let a = build_heatmap(&history, "2023-11-20", ymd(2024, 3, 15));
        let b = build_heatmap(&history, "2023-11-20", ymd(2024, 3, 15));
        assert_eq!(a, b);
    }
}
