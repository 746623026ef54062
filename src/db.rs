use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE: &str = "academy.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS branches(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL,
            contact_number TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions(
            id TEXT PRIMARY KEY,
            branch_id TEXT NOT NULL,
            name TEXT NOT NULL,
            timings TEXT NOT NULL,
            fee REAL NOT NULL,
            start_time INTEGER,
            created_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_branch ON sessions(branch_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS staff(
            uid TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            name TEXT NOT NULL,
            phone_number TEXT,
            academy_name TEXT,
            branch_ids TEXT NOT NULL DEFAULT '[]',
            profile_url TEXT,
            created_at TEXT
        )",
        [],
    )?;

    // Branch and session are stored by name, as the app shows and filters them.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            address TEXT NOT NULL,
            aadhaar_front_url TEXT NOT NULL,
            aadhaar_back_url TEXT NOT NULL,
            branch TEXT NOT NULL,
            session TEXT NOT NULL,
            session_timings TEXT NOT NULL,
            session_fee REAL NOT NULL,
            joining_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            last_attendance_date TEXT,
            last_fee_update TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_batch ON students(branch, session)",
        [],
    )?;

    // History rows keep insertion order through `seq`; rewriting a key deletes
    // the old row and appends a new one.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_records(
            student_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            date TEXT NOT NULL,
            status TEXT NOT NULL,
            marked_by TEXT NOT NULL,
            marked_by_name TEXT,
            PRIMARY KEY(student_id, seq),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student_date ON attendance_records(student_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fee_records(
            student_id TEXT NOT NULL,
            seq INTEGER NOT NULL,
            month TEXT NOT NULL,
            year TEXT NOT NULL,
            amount REAL NOT NULL,
            status TEXT NOT NULL,
            paid_date TEXT,
            transaction_id TEXT,
            marked_by TEXT,
            marked_by_name TEXT,
            PRIMARY KEY(student_id, seq),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fee_student_month ON fee_records(student_id, year, month)",
        [],
    )?;

    Ok(conn)
}
