use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Canonical `YYYY-MM-DD` key for a calendar date.
pub fn date_key(d: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
}

/// Strips any time suffix (`2024-06-15T08:00:00Z` -> `2024-06-15`).
pub fn normalize_date_key(raw: &str) -> &str {
    raw.split('T').next().unwrap_or("").trim()
}

/// Exactly `YYYY-MM-DD`, naming a day that exists.
pub fn is_date_key(raw: &str) -> bool {
    let b = raw.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
        && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 30,
    }
}

/// A calendar month, used for fee keys (`MM` + `YYYY`) and report windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
        }
    }

    /// Accepts exactly `YYYY-MM` or a valid `YYYY-MM-DD`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.len() {
            7 => {
                let (year, month) = raw.split_once('-')?;
                if month.len() != 2 {
                    return None;
                }
                Self::from_parts(month, year)
            }
            10 if is_date_key(raw) => Self::from_parts(&raw[5..7], &raw[..4]),
            _ => None,
        }
    }

    /// A fee key: one or two digit month, four digit year.
    pub fn from_parts(month: &str, year: &str) -> Option<Self> {
        let (month, year) = (month.trim(), year.trim());
        if !all_digits(month) || month.len() > 2 || !all_digits(year) || year.len() != 4 {
            return None;
        }
        let month = month.parse::<u32>().ok()?;
        let year = year.parse::<i32>().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    pub fn offset(self, months: i32) -> Self {
        let idx = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: idx.div_euclid(12),
            month: idx.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn month_str(self) -> String {
        format!("{:02}", self.month)
    }

    pub fn year_str(self) -> String {
        format!("{:04}", self.year)
    }

    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    pub fn abbrev(self) -> &'static str {
        MONTH_ABBREVS[(self.month - 1) as usize]
    }

    pub fn day_key(self, day: u32) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, day)
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prev_month_rolls_back_over_new_year() {
        let jan = MonthKey {
            year: 2025,
            month: 1,
        };
        assert_eq!(
            jan.prev(),
            MonthKey {
                year: 2024,
                month: 12
            }
        );
        assert_eq!(jan.offset(-11).key(), "2024-02");
        assert_eq!(jan.offset(13).key(), "2026-02");
    }

    #[test]
    fn parse_accepts_month_and_day_keys() {
        assert_eq!(MonthKey::parse("2024-06").map(|m| m.key()).as_deref(), Some("2024-06"));
        assert_eq!(
            MonthKey::parse("2024-06-17").map(|m| m.key()).as_deref(),
            Some("2024-06")
        );
        assert!(MonthKey::parse("2024").is_none());
        assert!(MonthKey::parse("2024-13").is_none());
        assert!(MonthKey::parse("2024-06-junk").is_none());
        assert!(MonthKey::parse("2024-6").is_none());
        assert!(MonthKey::parse("2024-06-17T10:00").is_none());
        assert!(MonthKey::from_parts("06", "2024-07").is_none());
        assert!(MonthKey::from_parts("+6", "2024").is_none());
        assert!(MonthKey::from_parts("006", "2024").is_none());
        assert_eq!(MonthKey::from_parts("6", "2024").map(|m| m.key()).as_deref(), Some("2024-06"));
        assert_eq!(
            MonthKey::from_parts("02", "2024").map(|m| m.days()),
            Some(29)
        );
    }

    #[test]
    fn date_keys_are_zero_padded_and_time_stripped() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");
        assert_eq!(date_key(d), "2024-03-05");
        assert_eq!(normalize_date_key("2024-03-05T23:59:59.000Z"), "2024-03-05");
        assert!(is_date_key("2024-03-05"));
        assert!(!is_date_key("2024-3-5"));
        assert!(!is_date_key("2024/03/05"));
        assert!(!is_date_key("2024-02-30"));
        assert!(!is_date_key("2024-13-45"));
        assert!(is_date_key("2024-02-29"));
    }
}
