//! Spreadsheet exports.
//!
//! Reports are first shaped into a [`WorkbookModel`] (plain rows of cells),
//! which the IPC layer can hand back as JSON, and only then written to an
//! `.xlsx` file. Attendance registers classify each day with the same rules as
//! the heatmap, so an exported register and the in-app grid always agree.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::calc;
use crate::dates::{self, MonthKey};
use crate::heatmap;
use crate::model::{FeeRecord, Student};

pub const MAX_SHEET_NAME: usize = 31;
const MASTER_SHEET: &str = "All Students Master";
const FEE_HISTORY_SHEET: &str = "All Fee Payments History";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid date key {0:?}, expected YYYY-MM or YYYY-MM-DD")]
    InvalidDateKey(String),
    #[error("unknown report mode {0:?}")]
    UnknownMode(String),
    #[error("no student data found to export")]
    NoStudents,
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::InvalidDateKey(_) | ReportError::UnknownMode(_) => "bad_params",
            ReportError::NoStudents => "no_data",
            ReportError::Xlsx(_) | ReportError::Io(_) => "export_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    Attendance,
    Fees,
    Roster,
    AnalyticsSummary,
}

impl ReportMode {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        match raw {
            "attendance" => Ok(ReportMode::Attendance),
            "fees" => Ok(ReportMode::Fees),
            "roster" | "students" => Ok(ReportMode::Roster),
            "analytics-summary" | "analytics" => Ok(ReportMode::AnalyticsSummary),
            other => Err(ReportError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetModel {
    pub name: String,
    pub headers: Vec<String>,
    /// An empty row is a spacer.
    pub rows: Vec<Vec<Cell>>,
    pub widths: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookModel {
    pub file_name: String,
    pub sheets: Vec<SheetModel>,
}

/// What a context export needs besides the students themselves.
#[derive(Debug, Clone)]
pub struct ContextExport<'a> {
    pub mode: ReportMode,
    pub context: &'a str,
    pub date_key: &'a str,
    pub today: NaiveDate,
    pub session_names: &'a [String],
}

fn safe_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn day_headers(month: MonthKey) -> Vec<String> {
    (1..=month.days()).map(|d| format!("{:02}", d)).collect()
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

fn fee_amount(record: Option<&FeeRecord>, student: &Student) -> f64 {
    match record {
        Some(r) if r.amount != 0.0 => r.amount,
        _ => student.session_fee,
    }
}

fn payment_date(record: Option<&FeeRecord>) -> String {
    record
        .and_then(|r| r.settlement.paid_date())
        .map(|d| dates::normalize_date_key(d).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Register cell for one student-day: `P`/`A`/`-`, plus the marking coach
/// when one is recorded.
pub fn register_cell(student: &Student, date: &str, today: &str) -> String {
    match heatmap::record_for_day(
        &student.attendance_history,
        date,
        &student.joining_date,
        today,
    ) {
        Some(r) => {
            let code = heatmap::DayStatus::from(r.status).register_code();
            match r.marked_by_name.as_deref() {
                Some(name) if !name.is_empty() => format!("{} ({})", code, name),
                _ => code.to_string(),
            }
        }
        None => heatmap::DayStatus::NoData.register_code().to_string(),
    }
}

fn attendance_sheet(students: &[Student], month: MonthKey, today: &str) -> SheetModel {
    let days = day_headers(month);
    let mut hdr = headers(&["Student Name", "Phone Number"]);
    hdr.extend(days.iter().cloned());

    let rows: Vec<Vec<Cell>> = students
        .iter()
        .map(|s| {
            let mut row: Vec<Cell> = vec![or_dash(&s.full_name).into(), or_dash(&s.phone_number).into()];
            row.extend((1..=month.days()).map(|d| Cell::from(register_cell(s, &month.day_key(d), today))));
            row
        })
        .collect();

    let mut widths = vec![25.0, 15.0];
    widths.extend(days.iter().map(|_| 4.0));
    SheetModel {
        name: "Attendance Register".to_string(),
        headers: hdr,
        rows,
        widths,
    }
}

fn fees_sheet(students: &[Student], month: MonthKey) -> SheetModel {
    let (m, y) = (month.month_str(), month.year_str());
    let rows: Vec<Vec<Cell>> = students
        .iter()
        .map(|s| {
            let record = s.fee_for(&m, &y);
            vec![
                or_dash(&s.full_name).into(),
                or_dash(&s.phone_number).into(),
                month.name().into(),
                y.clone().into(),
                fee_amount(record, s).into(),
                record
                    .map(|r| r.settlement.status().as_str())
                    .unwrap_or("Pending")
                    .into(),
                payment_date(record).into(),
                record
                    .and_then(|r| r.marked_by_name.clone())
                    .unwrap_or_else(|| "-".to_string())
                    .into(),
            ]
        })
        .collect();
    SheetModel {
        name: "Fee Payments".to_string(),
        headers: headers(&[
            "Student Name",
            "Phone Number",
            "Month",
            "Year",
            "Amount (₹)",
            "Status",
            "Payment Date",
            "Processed By",
        ]),
        rows,
        widths: vec![25.0, 15.0, 12.0, 8.0, 12.0, 12.0, 15.0, 20.0],
    }
}

fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect::<String>().to_uppercase()
}

fn roster_sheet(students: &[Student]) -> SheetModel {
    let rows: Vec<Vec<Cell>> = students
        .iter()
        .map(|s| {
            vec![
                short_id(&s.id).into(),
                s.full_name.as_str().into(),
                s.phone_number.as_str().into(),
                s.session_timings.as_str().into(),
                s.session_fee.into(),
                dates::normalize_date_key(&s.joining_date).into(),
                s.address.as_str().into(),
            ]
        })
        .collect();
    SheetModel {
        name: "Student Roster".to_string(),
        headers: headers(&[
            "ID",
            "Student Name",
            "Phone Number",
            "Timings",
            "Monthly Fee (₹)",
            "Joining Date",
            "Address",
        ]),
        rows,
        widths: vec![10.0, 25.0, 15.0, 20.0, 15.0, 15.0, 30.0],
    }
}

fn summary_sheet(
    students: &[Student],
    context: &str,
    today: NaiveDate,
    session_names: &[String],
) -> SheetModel {
    let stats = calc::academy_stats(students, session_names, today);
    let pct = |n: i64| Cell::Number(n as f64);
    let mut rows: Vec<Vec<Cell>> = vec![
        vec!["Total Students".into(), (stats.total_students as f64).into()],
        vec!["Batch Context".into(), context.into()],
        vec!["Report Date".into(), dates::date_key(today).into()],
        Vec::new(),
        vec!["REPORTS SUMMARY".into(), Cell::Blank],
        vec!["Overall Attendance Rate (%)".into(), pct(stats.attendance_rate)],
        vec![
            "Attendance Records (Present / Total)".into(),
            format!("{} / {}", stats.total_present, stats.total_attendance_records).into(),
        ],
        vec![
            format!("Current Month Collection (%) {}", stats.current_month).into(),
            pct(stats.current_fee_collection),
        ],
        vec![
            format!("Last Month Collection (%) {}", stats.last_month).into(),
            pct(stats.last_month_fee_collection),
        ],
    ];
    for sc in &stats.session_counts {
        rows.push(vec![
            format!("Students in {}", sc.session).into(),
            (sc.count as f64).into(),
        ]);
    }
    SheetModel {
        name: "Summary".to_string(),
        headers: headers(&["Metric", "Value"]),
        rows,
        widths: vec![30.0, 20.0],
    }
}

fn parse_month(date_key: &str) -> Result<MonthKey, ReportError> {
    MonthKey::parse(date_key).ok_or_else(|| ReportError::InvalidDateKey(date_key.to_string()))
}

/// Shapes one screen's records into a single-sheet workbook.
pub fn build_context_workbook(
    req: &ContextExport<'_>,
    students: &[Student],
) -> Result<WorkbookModel, ReportError> {
    let today = dates::date_key(req.today);
    let (title, sheet) = match req.mode {
        ReportMode::Attendance => {
            let month = parse_month(req.date_key)?;
            (
                format!("Attendance_{}_{}_{}", req.context, month.name(), month.year_str()),
                attendance_sheet(students, month, &today),
            )
        }
        ReportMode::Fees => {
            let month = parse_month(req.date_key)?;
            (
                format!("Fees_{}_{}_{}", req.context, month.name(), month.year_str()),
                fees_sheet(students, month),
            )
        }
        ReportMode::Roster => (
            format!("Roster_{}", req.context).replace(' ', "_"),
            roster_sheet(students),
        ),
        ReportMode::AnalyticsSummary => (
            format!("Analytics_{}", req.context).replace(' ', "_"),
            summary_sheet(students, req.context, req.today, req.session_names),
        ),
    };
    Ok(WorkbookModel {
        file_name: format!("{}.xlsx", safe_file_stem(&title)),
        sheets: vec![sheet],
    })
}

/// Makes a sheet name Excel accepts and that is not yet taken
/// (case-insensitively), recording it in `used`.
pub fn unique_sheet_name(base: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    // Excel also refuses names that start or end with an apostrophe.
    let truncate = |s: &str, n: usize| {
        s.chars()
            .take(n)
            .collect::<String>()
            .trim_matches(|c: char| c.is_whitespace() || c == '\'')
            .to_string()
    };

    let cleaned = if truncate(&cleaned, MAX_SHEET_NAME).is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    };

    let mut name = truncate(&cleaned, MAX_SHEET_NAME);
    let mut counter = 1;
    while used.contains(&name.to_lowercase()) {
        counter += 1;
        let suffix = format!(" ({})", counter);
        name = format!(
            "{}{}",
            truncate(&cleaned, MAX_SHEET_NAME - suffix.chars().count()),
            suffix
        );
    }
    used.insert(name.to_lowercase());
    name
}

fn sort_for_master(students: &[Student]) -> Vec<&Student> {
    let mut sorted: Vec<&Student> = students.iter().collect();
    sorted.sort_by(|a, b| {
        a.branch
            .cmp(&b.branch)
            .then_with(|| a.session.cmp(&b.session))
            .then_with(|| a.session_timings.cmp(&b.session_timings))
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    sorted
}

fn master_sheet(students: &[&Student]) -> SheetModel {
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut last: Option<(&str, &str)> = None;
    for s in students {
        if let Some((branch, timings)) = last {
            if branch != s.branch {
                rows.push(Vec::new());
                rows.push(Vec::new());
            } else if timings != s.session_timings {
                rows.push(Vec::new());
            }
        }
        rows.push(vec![
            s.branch.as_str().into(),
            s.session.as_str().into(),
            s.session_timings.as_str().into(),
            s.full_name.as_str().into(),
            s.phone_number.as_str().into(),
            s.session_fee.into(),
            dates::normalize_date_key(&s.joining_date).into(),
            s.address.as_str().into(),
        ]);
        last = Some((s.branch.as_str(), s.session_timings.as_str()));
    }
    SheetModel {
        name: MASTER_SHEET.to_string(),
        headers: headers(&[
            "Stadium",
            "Batch",
            "Timings",
            "Student Name",
            "Phone Number",
            "Monthly Fee (₹)",
            "Joining Date",
            "Address",
        ]),
        rows,
        widths: vec![25.0, 15.0, 20.0, 25.0, 15.0, 12.0, 15.0, 30.0],
    }
}

fn fee_history_sheet(students: &[&Student]) -> Option<SheetModel> {
    let months: BTreeSet<MonthKey> = students
        .iter()
        .flat_map(|s| s.fee_history.iter())
        .filter_map(|f| MonthKey::from_parts(&f.month, &f.year))
        .collect();
    if months.is_empty() {
        return None;
    }

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for month in months.iter().rev() {
        let (m, y) = (month.month_str(), month.year_str());
        for s in students {
            let record = s.fee_for(&m, &y);
            rows.push(vec![
                s.branch.as_str().into(),
                s.full_name.as_str().into(),
                month.name().into(),
                y.clone().into(),
                fee_amount(record, s).into(),
                record
                    .map(|r| r.settlement.status().as_str())
                    .unwrap_or("ABSENT")
                    .into(),
                payment_date(record).into(),
            ]);
        }
        if !students.is_empty() {
            rows.push(Vec::new());
        }
    }
    Some(SheetModel {
        name: FEE_HISTORY_SHEET.to_string(),
        headers: headers(&[
            "Stadium",
            "Student Name",
            "Month",
            "Year",
            "Amount (₹)",
            "Status",
            "Payment Date",
        ]),
        rows,
        widths: vec![20.0, 25.0, 12.0, 8.0, 12.0, 12.0, 15.0],
    })
}

fn batch_sheet(key: &str, students: &[&Student], today: NaiveDate, name: String) -> SheetModel {
    let month = MonthKey::of(today);
    let today_key = dates::date_key(today);
    let (m, y) = (month.month_str(), month.year_str());
    let fee_col = format!("Fees ({})", month.name());

    let mut hdr = vec![
        "Student Name".to_string(),
        "Phone Number".to_string(),
        fee_col,
        "Fee Processed By".to_string(),
    ];
    hdr.extend(day_headers(month));

    let mut rows: Vec<Vec<Cell>> = vec![
        vec![format!("BATCH REGISTER: {} ({} {})", key, month.name(), y).into()],
        Vec::new(),
    ];
    for s in students {
        let fee = s.fee_for(&m, &y);
        let paid = fee.map(|f| f.is_paid_for(&m, &y)).unwrap_or(false);
        let mut row: Vec<Cell> = vec![
            s.full_name.as_str().into(),
            s.phone_number.as_str().into(),
            (if paid { "PAID" } else { "PENDING" }).into(),
            fee.and_then(|f| f.marked_by_name.clone())
                .unwrap_or_else(|| "-".to_string())
                .into(),
        ];
        row.extend(
            (1..=month.days()).map(|d| Cell::from(register_cell(s, &month.day_key(d), &today_key))),
        );
        rows.push(row);
    }

    let mut widths = vec![25.0, 15.0, 15.0, 20.0];
    widths.extend((1..=month.days()).map(|_| 12.0));
    SheetModel {
        name,
        headers: hdr,
        rows,
        widths,
    }
}

/// The academy-wide workbook: roster, fee history, and one register per batch
/// for the current month.
pub fn build_master_workbook(
    students: &[Student],
    today: NaiveDate,
) -> Result<WorkbookModel, ReportError> {
    if students.is_empty() {
        return Err(ReportError::NoStudents);
    }
    let sorted = sort_for_master(students);
    let mut used: HashSet<String> = HashSet::new();
    used.insert(MASTER_SHEET.to_lowercase());
    used.insert(FEE_HISTORY_SHEET.to_lowercase());

    let mut sheets = vec![master_sheet(&sorted)];
    if let Some(fees) = fee_history_sheet(&sorted) {
        sheets.push(fees);
    }

    let mut batches: Vec<(String, Vec<&Student>)> = Vec::new();
    for s in sorted.iter().copied() {
        let key = format!("{} - {}", s.branch, s.session);
        match batches.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(s),
            None => batches.push((key, vec![s])),
        }
    }
    for (key, members) in &batches {
        let name = unique_sheet_name(&format!("Log - {}", key), &mut used);
        sheets.push(batch_sheet(key, members, today, name));
    }

    Ok(WorkbookModel {
        file_name: format!("Academy_Master_Report_{}.xlsx", dates::date_key(today)),
        sheets,
    })
}

/// Writes the workbook into `out_dir` and returns the file path.
pub fn write_workbook(model: &WorkbookModel, out_dir: &Path) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(&model.file_name);

    let header_format = Format::new().set_bold();
    let mut workbook = Workbook::new();
    for sheet in &model.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        for (idx, row) in sheet.rows.iter().enumerate() {
            let r = (idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, col as u16, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, col as u16, *n)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
        for (col, width) in sheet.widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
        worksheet.set_freeze_panes(1, 0)?;
    }
    workbook.save(&path)?;

    info!(path = %path.display(), sheets = model.sheets.len(), "workbook written");
    Ok(path)
}
