//! Typed query and mutation wrappers over the academy document store.
//!
//! Writes follow last-write-wins per key: an attendance save for
//! (student, date) or a fee save for (student, month, year) drops the
//! existing entry and appends a new one. There is no version check, so two
//! coaches saving the same key concurrently silently overwrite each other.

use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{
    AttendanceRecord, AttendanceStatus, AttendanceUpdate, Branch, BranchDraft, FeeRecord,
    FeeSettlement, FeeStatus, FeeUpdate, Session, SessionDraft, StaffProfile, Student,
    StudentDraft, StudentScope, UserRole,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::Corrupt(_) => "corrupt_record",
            StoreError::Db(_) => "db_query_failed",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

const STUDENT_COLUMNS: &str = "id, full_name, phone_number, address, aadhaar_front_url,
     aadhaar_back_url, branch, session, session_timings, session_fee, created_at, joining_date";

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        full_name: r.get(1)?,
        phone_number: r.get(2)?,
        address: r.get(3)?,
        aadhaar_front_url: r.get(4)?,
        aadhaar_back_url: r.get(5)?,
        branch: r.get(6)?,
        session: r.get(7)?,
        session_timings: r.get(8)?,
        session_fee: r.get(9)?,
        attendance_history: Vec::new(),
        fee_history: Vec::new(),
        created_at: r.get(10)?,
        joining_date: r.get(11)?,
    })
}

fn load_attendance(conn: &Connection, student_id: &str) -> StoreResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT date, status, marked_by, marked_by_name
         FROM attendance_records
         WHERE student_id = ?
         ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, Option<String>>(3)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;

    rows.into_iter()
        .map(|(date, status, marked_by, marked_by_name)| {
            let status = AttendanceStatus::parse(&status).ok_or_else(|| {
                StoreError::Corrupt(format!("attendance status {:?} for {}", status, student_id))
            })?;
            Ok(AttendanceRecord {
                date,
                status,
                marked_by,
                marked_by_name,
            })
        })
        .collect()
}

fn load_fees(conn: &Connection, student_id: &str) -> StoreResult<Vec<FeeRecord>> {
    let mut stmt = conn.prepare(
        "SELECT month, year, amount, status, paid_date, transaction_id, marked_by, marked_by_name
         FROM fee_records
         WHERE student_id = ?
         ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, f64>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, Option<String>>(4)?,
                r.get::<_, Option<String>>(5)?,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<String>>(7)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;

    rows.into_iter()
        .map(
            |(month, year, amount, status, paid_date, transaction_id, marked_by, marked_by_name)| {
                let settlement = match (FeeStatus::parse(&status), paid_date, transaction_id) {
                    (Some(FeeStatus::Paid), Some(paid_date), Some(transaction_id)) => {
                        FeeSettlement::Paid {
                            paid_date,
                            transaction_id,
                        }
                    }
                    (Some(FeeStatus::Pending), _, _) => FeeSettlement::Pending,
                    _ => {
                        return Err(StoreError::Corrupt(format!(
                            "fee record {}-{} for {}",
                            year, month, student_id
                        )))
                    }
                };
                Ok(FeeRecord {
                    month,
                    year,
                    amount,
                    settlement,
                    marked_by,
                    marked_by_name,
                })
            },
        )
        .collect()
}

fn with_histories(conn: &Connection, mut students: Vec<Student>) -> StoreResult<Vec<Student>> {
    for s in students.iter_mut() {
        s.attendance_history = load_attendance(conn, &s.id)?;
        s.fee_history = load_fees(conn, &s.id)?;
    }
    Ok(students)
}

fn query_students(
    conn: &Connection,
    filter: &str,
    args: Vec<String>,
) -> StoreResult<Vec<Student>> {
    let sql = format!(
        "SELECT {} FROM students {} ORDER BY full_name, id",
        STUDENT_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let students = stmt
        .query_map(params_from_iter(args.iter()), student_from_row)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    with_histories(conn, students)
}

pub fn list_students(conn: &Connection, scope: &StudentScope) -> StoreResult<Vec<Student>> {
    match scope {
        StudentScope::All => query_students(conn, "", Vec::new()),
        StudentScope::Branch(branch) => {
            query_students(conn, "WHERE branch = ?", vec![branch.clone()])
        }
        StudentScope::Batch { branch, session } => query_students(
            conn,
            "WHERE branch = ? AND session = ?",
            vec![branch.clone(), session.clone()],
        ),
        StudentScope::Branches { branches, session } => {
            let mut out = Vec::new();
            for branch in branches {
                out.extend(query_students(
                    conn,
                    "WHERE branch = ? AND session = ?",
                    vec![branch.clone(), session.clone()],
                )?);
            }
            Ok(out)
        }
    }
}

pub fn get_student(conn: &Connection, id: &str) -> StoreResult<Option<Student>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
    let student = conn
        .query_row(&sql, [id], student_from_row)
        .optional()?;
    match student {
        Some(s) => Ok(with_histories(conn, vec![s])?.pop()),
        None => Ok(None),
    }
}

/// Case-insensitive match on name, plain substring on phone number.
pub fn search_students(conn: &Connection, query: &str) -> StoreResult<Vec<Student>> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return Ok(Vec::new());
    }
    let all = list_students(conn, &StudentScope::All)?;
    Ok(all
        .into_iter()
        .filter(|s| s.full_name.to_lowercase().contains(&term) || s.phone_number.contains(&term))
        .collect())
}

pub fn create_student(conn: &Connection, draft: &StudentDraft, now: &str) -> StoreResult<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(
           id, full_name, phone_number, address, aadhaar_front_url, aadhaar_back_url,
           branch, session, session_timings, session_fee, joining_date, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            id,
            draft.full_name.trim(),
            draft.phone_number.trim(),
            draft.address.trim(),
            draft.aadhaar_front_url,
            draft.aadhaar_back_url,
            draft.branch,
            draft.session,
            draft.session_timings.trim(),
            draft.session_fee,
            draft.joining_date,
            now,
        ],
    )?;
    info!(student_id = %id, branch = %draft.branch, session = %draft.session, "student created");
    Ok(id)
}

pub fn update_student(
    conn: &Connection,
    id: &str,
    draft: &StudentDraft,
    now: &str,
) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE students SET
           full_name = ?, phone_number = ?, address = ?, aadhaar_front_url = ?,
           aadhaar_back_url = ?, branch = ?, session = ?, session_timings = ?,
           session_fee = ?, joining_date = ?, updated_at = ?
         WHERE id = ?",
        rusqlite::params![
            draft.full_name.trim(),
            draft.phone_number.trim(),
            draft.address.trim(),
            draft.aadhaar_front_url,
            draft.aadhaar_back_url,
            draft.branch,
            draft.session,
            draft.session_timings.trim(),
            draft.session_fee,
            draft.joining_date,
            now,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("student"));
    }
    Ok(())
}

pub fn delete_student(conn: &Connection, id: &str) -> StoreResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance_records WHERE student_id = ?", [id])?;
    tx.execute("DELETE FROM fee_records WHERE student_id = ?", [id])?;
    let removed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
    if removed == 0 {
        return Err(StoreError::NotFound("student"));
    }
    tx.commit()?;
    info!(student_id = %id, "student deleted");
    Ok(())
}

fn student_exists(conn: &Connection, id: &str) -> StoreResult<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some())
}

fn next_seq(conn: &Connection, table: &str, student_id: &str) -> StoreResult<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM {} WHERE student_id = ?",
        table
    );
    Ok(conn.query_row(&sql, [student_id], |r| r.get(0))?)
}

/// Applies attendance updates one at a time. Each record commits on its own,
/// so a failure mid-batch leaves earlier records written. Unknown students are
/// skipped. Returns how many records were written.
pub fn save_attendance(conn: &Connection, updates: &[AttendanceUpdate]) -> StoreResult<usize> {
    let mut written = 0usize;
    for u in updates {
        if !student_exists(conn, &u.student_id)? {
            warn!(student_id = %u.student_id, "attendance update for unknown student skipped");
            continue;
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM attendance_records WHERE student_id = ? AND date = ?",
            (&u.student_id, &u.date),
        )?;
        let seq = next_seq(&tx, "attendance_records", &u.student_id)?;
        tx.execute(
            "INSERT INTO attendance_records(student_id, seq, date, status, marked_by, marked_by_name)
             VALUES(?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                u.student_id,
                seq,
                u.date,
                u.status.as_str(),
                u.marked_by,
                u.marked_by_name
            ],
        )?;
        tx.execute(
            "UPDATE students SET last_attendance_date = ? WHERE id = ?",
            (&u.date, &u.student_id),
        )?;
        tx.commit()?;
        debug!(student_id = %u.student_id, date = %u.date, status = u.status.as_str(), "attendance written");
        written += 1;
    }
    Ok(written)
}

/// Applies fee updates one at a time, same batch semantics as [`save_attendance`].
/// Paid records are stamped with `now` and a transaction id.
pub fn save_fee_payments(
    conn: &Connection,
    updates: &[FeeUpdate],
    now: DateTime<Utc>,
) -> StoreResult<usize> {
    let mut written = 0usize;
    for u in updates {
        let session_fee: Option<f64> = conn
            .query_row(
                "SELECT session_fee FROM students WHERE id = ?",
                [&u.student_id],
                |r| r.get(0),
            )
            .optional()?;
        let Some(session_fee) = session_fee else {
            warn!(student_id = %u.student_id, "fee update for unknown student skipped");
            continue;
        };

        let amount = u.amount.unwrap_or(session_fee);
        let (paid_date, transaction_id) = match u.status {
            FeeStatus::Paid => {
                let prefix: String = u.student_id.chars().take(4).collect();
                (
                    Some(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
                    Some(format!("TXN-{}-{}", now.timestamp_millis(), prefix)),
                )
            }
            FeeStatus::Pending => (None, None),
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM fee_records WHERE student_id = ? AND month = ? AND year = ?",
            (&u.student_id, &u.month, &u.year),
        )?;
        let seq = next_seq(&tx, "fee_records", &u.student_id)?;
        tx.execute(
            "INSERT INTO fee_records(
               student_id, seq, month, year, amount, status, paid_date, transaction_id,
               marked_by, marked_by_name
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                u.student_id,
                seq,
                u.month,
                u.year,
                amount,
                u.status.as_str(),
                paid_date,
                transaction_id,
                u.marked_by,
                u.marked_by_name
            ],
        )?;
        tx.execute(
            "UPDATE students SET last_fee_update = ? WHERE id = ?",
            (format!("{}-{}", u.year, u.month), &u.student_id),
        )?;
        tx.commit()?;
        debug!(student_id = %u.student_id, month = %u.month, year = %u.year, status = u.status.as_str(), "fee record written");
        written += 1;
    }
    Ok(written)
}

pub fn list_branches(conn: &Connection) -> StoreResult<Vec<Branch>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, address, contact_number FROM branches ORDER BY name, id",
    )?;
    let branches = stmt
        .query_map([], |r| {
            Ok(Branch {
                id: r.get(0)?,
                name: r.get(1)?,
                address: r.get(2)?,
                contact_number: r.get(3)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(branches)
}

/// Inserts when `id` is `None`, otherwise updates in place.
pub fn save_branch(conn: &Connection, draft: &BranchDraft, id: Option<&str>) -> StoreResult<String> {
    match id {
        Some(id) => {
            let changed = conn.execute(
                "UPDATE branches SET name = ?, address = ?, contact_number = ? WHERE id = ?",
                (&draft.name, &draft.address, &draft.contact_number, id),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("branch"));
            }
            Ok(id.to_string())
        }
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO branches(id, name, address, contact_number) VALUES(?, ?, ?, ?)",
                (&id, &draft.name, &draft.address, &draft.contact_number),
            )?;
            Ok(id)
        }
    }
}

pub fn delete_branch(conn: &Connection, id: &str) -> StoreResult<()> {
    if conn.execute("DELETE FROM branches WHERE id = ?", [id])? == 0 {
        return Err(StoreError::NotFound("branch"));
    }
    Ok(())
}

/// Sessions ordered by start time (missing counts as midnight), then by
/// creation time with undated sessions first.
pub fn list_sessions(conn: &Connection, branch_id: Option<&str>) -> StoreResult<Vec<Session>> {
    let (sql, args): (&str, Vec<&str>) = match branch_id {
        Some(b) => (
            "SELECT id, branch_id, name, timings, fee, start_time, created_at
             FROM sessions WHERE branch_id = ?",
            vec![b],
        ),
        None => (
            "SELECT id, branch_id, name, timings, fee, start_time, created_at FROM sessions",
            Vec::new(),
        ),
    };
    let mut stmt = conn.prepare(sql)?;
    let mut sessions = stmt
        .query_map(params_from_iter(args.iter()), |r| {
            Ok(Session {
                id: r.get(0)?,
                branch_id: r.get(1)?,
                name: r.get(2)?,
                timings: r.get(3)?,
                fee: r.get(4)?,
                start_time: r.get(5)?,
                created_at: r.get(6)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    sessions.sort_by(|a, b| {
        a.start_time
            .unwrap_or(0)
            .cmp(&b.start_time.unwrap_or(0))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    Ok(sessions)
}

pub fn save_session(
    conn: &Connection,
    draft: &SessionDraft,
    id: Option<&str>,
    now: &str,
) -> StoreResult<String> {
    match id {
        Some(id) => {
            let changed = conn.execute(
                "UPDATE sessions SET branch_id = ?, name = ?, timings = ?, fee = ?, start_time = ?
                 WHERE id = ?",
                rusqlite::params![
                    draft.branch_id,
                    draft.name,
                    draft.timings,
                    draft.fee,
                    draft.start_time,
                    id
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("session"));
            }
            Ok(id.to_string())
        }
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO sessions(id, branch_id, name, timings, fee, start_time, created_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    id,
                    draft.branch_id,
                    draft.name,
                    draft.timings,
                    draft.fee,
                    draft.start_time,
                    now
                ],
            )?;
            Ok(id)
        }
    }
}

pub fn delete_session(conn: &Connection, id: &str) -> StoreResult<()> {
    if conn.execute("DELETE FROM sessions WHERE id = ?", [id])? == 0 {
        return Err(StoreError::NotFound("session"));
    }
    Ok(())
}

type StaffRaw = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
);

fn staff_raw(r: &Row<'_>) -> rusqlite::Result<StaffRaw> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
    ))
}

fn staff_from_raw(raw: StaffRaw) -> StoreResult<StaffProfile> {
    let (uid, email, role, name, phone_number, academy_name, branch_ids, profile_url) = raw;
    let role = UserRole::parse(&role)
        .ok_or_else(|| StoreError::Corrupt(format!("staff role {:?} for {}", role, uid)))?;
    let branch_ids: Vec<String> = serde_json::from_str(&branch_ids)
        .map_err(|e| StoreError::Corrupt(format!("staff branch ids for {}: {}", uid, e)))?;
    Ok(StaffProfile {
        uid,
        email,
        role,
        name,
        phone_number,
        academy_name,
        branch_ids,
        profile_url,
    })
}

const STAFF_COLUMNS: &str =
    "uid, email, role, name, phone_number, academy_name, branch_ids, profile_url";

pub fn get_staff(conn: &Connection, uid: &str) -> StoreResult<Option<StaffProfile>> {
    let sql = format!("SELECT {} FROM staff WHERE uid = ?", STAFF_COLUMNS);
    conn.query_row(&sql, [uid], staff_raw)
        .optional()?
        .map(staff_from_raw)
        .transpose()
}

/// Coaches and assistant coaches, by name.
pub fn list_staff(conn: &Connection) -> StoreResult<Vec<StaffProfile>> {
    let sql = format!(
        "SELECT {} FROM staff WHERE role IN ('Coach', 'AssistantCoach') ORDER BY name, uid",
        STAFF_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], staff_raw)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    rows.into_iter().map(staff_from_raw).collect()
}

pub fn insert_staff(conn: &Connection, profile: &StaffProfile, now: &str) -> StoreResult<()> {
    let branch_ids = serde_json::to_string(&profile.branch_ids)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
    conn.execute(
        "INSERT INTO staff(uid, email, role, name, phone_number, academy_name, branch_ids, profile_url, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
        rusqlite::params![
            profile.uid,
            profile.email,
            profile.role.as_str(),
            profile.name,
            profile.phone_number,
            profile.academy_name,
            branch_ids,
            profile.profile_url,
            now
        ],
    )?;
    Ok(())
}

pub fn delete_staff(conn: &Connection, uid: &str) -> StoreResult<()> {
    if conn.execute("DELETE FROM staff WHERE uid = ?", [uid])? == 0 {
        return Err(StoreError::NotFound("staff member"));
    }
    Ok(())
}

/// Profile fields a staff member may edit about themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    AcademyName,
    ProfileUrl,
}

impl ProfileField {
    fn column(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::AcademyName => "academy_name",
            ProfileField::ProfileUrl => "profile_url",
        }
    }
}

pub fn update_staff_field(
    conn: &Connection,
    uid: &str,
    field: ProfileField,
    value: &str,
) -> StoreResult<()> {
    let sql = format!("UPDATE staff SET {} = ? WHERE uid = ?", field.column());
    if conn.execute(&sql, (value, uid))? == 0 {
        return Err(StoreError::NotFound("staff member"));
    }
    Ok(())
}

pub const DEFAULT_ACADEMY_NAME: &str = "ABC Badminton Academy";

const DEFAULT_BRANCHES: [(&str, &str, &str); 2] = [
    ("Epic Badminton Stadium", "Plot 12, Sports Hub", "9988776655"),
    ("Village Sports Stadium", "Sector 4, Green Valley", "9944556677"),
];

const DEFAULT_SESSIONS: [(&str, &str, f64); 2] = [
    ("Morning", "6:00 AM - 10:00 AM", 1500.0),
    ("Evening", "4:00 PM - 8:00 PM", 1500.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub branches_created: usize,
    pub sessions_created: usize,
}

fn seed_sessions_for(conn: &Connection, branch_id: &str, now: &str) -> StoreResult<usize> {
    for (name, timings, fee) in DEFAULT_SESSIONS {
        let draft = SessionDraft {
            branch_id: branch_id.to_string(),
            name: name.to_string(),
            timings: timings.to_string(),
            fee,
            start_time: None,
        };
        save_session(conn, &draft, None, now)?;
    }
    Ok(DEFAULT_SESSIONS.len())
}

/// Seeds the default stadiums and batches into an empty academy.
pub fn seed_defaults(conn: &Connection, now: &str) -> StoreResult<SeedSummary> {
    let branch_count: i64 = conn.query_row("SELECT COUNT(*) FROM branches", [], |r| r.get(0))?;
    let session_count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |r| r.get(0))?;
    let mut summary = SeedSummary::default();

    if branch_count == 0 {
        for (name, address, contact) in DEFAULT_BRANCHES {
            let draft = BranchDraft {
                name: name.to_string(),
                address: address.to_string(),
                contact_number: contact.to_string(),
            };
            let id = save_branch(conn, &draft, None)?;
            summary.branches_created += 1;
            if session_count == 0 {
                summary.sessions_created += seed_sessions_for(conn, &id, now)?;
            }
        }
    } else if session_count == 0 {
        if let Some(first) = list_branches(conn)?.first() {
            summary.sessions_created += seed_sessions_for(conn, &first.id, now)?;
        }
    }

    if summary != SeedSummary::default() {
        info!(
            branches = summary.branches_created,
            sessions = summary.sessions_created,
            "seeded default academy data"
        );
    }
    Ok(summary)
}
