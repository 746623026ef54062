mod test_support;

use serde_json::json;
use test_support::{create_student, open_and_attach, request_err, request_ok, spawn_sidecar, student_params, temp_dir};

#[test]
fn context_models_match_exported_workbooks() {
    let workspace = temp_dir("academyd-reports-context");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_and_attach(&mut stdin, &mut reader, &workspace);

    let asha = create_student(
        &mut stdin,
        &mut reader,
        "2",
        student_params("Asha Rao", "Epic Badminton Stadium", "Morning", "2024-06-05"),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.save",
        json!({ "records": [
            { "studentId": asha, "status": "Present", "date": "2024-06-03" },
            { "studentId": asha, "status": "Absent", "date": "2024-06-10" }
        ]}),
    );

    let model = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "reports.contextModel",
        json!({
            "mode": "attendance",
            "dateKey": "2024-06",
            "branch": "Epic Badminton Stadium",
            "session": "Morning",
            "context": "Epic Morning"
        }),
    );
    let workbook = &model["workbook"];
    assert_eq!(workbook["fileName"], "Attendance_Epic_Morning_June_2024.xlsx");
    let sheet = &workbook["sheets"][0];
    assert_eq!(sheet["name"], "Attendance Register");
    assert_eq!(sheet["headers"].as_array().map(|h| h.len()), Some(32));
    let row = &sheet["rows"][0];
    assert_eq!(row[0], "Asha Rao");
    // Marked before joining, so the register shows no data.
    assert_eq!(row[2 + 2], "-");
    assert_eq!(row[2 + 9], "A (Ravi)");

    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "reports.contextModel",
        json!({ "mode": "fees", "dateKey": "June" }),
    );
    assert_eq!(code, "bad_params");
    let (code, _) = request_err(&mut stdin, &mut reader, "6", "reports.contextModel", json!({ "mode": "payroll" }));
    assert_eq!(code, "bad_params");

    let out_dir = workspace.join("out");
    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "reports.exportContext",
        json!({ "mode": "roster", "context": "Epic Badminton Stadium", "outDir": out_dir.to_string_lossy() }),
    );
    assert_eq!(exported["fileName"], "Roster_Epic_Badminton_Stadium.xlsx");
    assert_eq!(exported["sheets"], json!(["Student Roster"]));
    assert_eq!(exported["rows"], 1);
    let path = std::path::PathBuf::from(exported["path"].as_str().expect("path"));
    assert!(path.starts_with(&out_dir));
    assert!(path.is_file());

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "reports.exportContext",
        json!({ "mode": "analytics-summary" }),
    );
    let summary_path = std::path::PathBuf::from(summary["path"].as_str().expect("path"));
    assert!(summary_path.starts_with(workspace.join("exports")));
    assert!(summary_path.is_file());
}

#[test]
fn master_report_needs_students_and_groups_batches() {
    let workspace = temp_dir("academyd-reports-master");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_and_attach(&mut stdin, &mut reader, &workspace);

    let (code, error) = request_err(&mut stdin, &mut reader, "2", "reports.exportMaster", json!({}));
    assert_eq!(code, "no_data");
    assert_eq!(error["message"], "No student data found to export.");

    let asha = create_student(
        &mut stdin,
        &mut reader,
        "3",
        student_params("Asha Rao", "Epic Badminton Stadium", "Morning", "2024-01-01"),
    );
    let _ = create_student(
        &mut stdin,
        &mut reader,
        "4",
        student_params("Bala Iyer", "Village Sports Stadium", "Evening", "2024-01-01"),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "fees.save",
        json!({ "records": [{ "studentId": asha, "status": "Paid", "month": "06", "year": "2024" }] }),
    );

    let model = request_ok(&mut stdin, &mut reader, "6", "reports.masterModel", json!({}));
    let workbook = &model["workbook"];
    assert_eq!(workbook["fileName"], "Academy_Master_Report_2024-06-17.xlsx");
    let names: Vec<&str> = workbook["sheets"]
        .as_array()
        .expect("sheets")
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "All Students Master",
            "All Fee Payments History",
            "Log - Epic Badminton Stadium -",
            "Log - Village Sports Stadium -"
        ]
    );

    let fee_rows = &workbook["sheets"][1]["rows"];
    assert_eq!(fee_rows[0][5], "Paid");
    assert_eq!(fee_rows[1][5], "ABSENT");

    let epic_log = &workbook["sheets"][2]["rows"];
    assert_eq!(epic_log[0][0], "BATCH REGISTER: Epic Badminton Stadium - Morning (June 2024)");
    assert_eq!(epic_log[2][2], "PAID");

    let exported = request_ok(&mut stdin, &mut reader, "7", "reports.exportMaster", json!({}));
    assert_eq!(exported["sheets"].as_array().map(|s| s.len()), Some(4));
    let path = std::path::PathBuf::from(exported["path"].as_str().expect("path"));
    assert!(path.is_file());
}
