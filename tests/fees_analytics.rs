mod test_support;

use serde_json::json;
use test_support::{create_student, open_and_attach, request_err, request_ok, spawn_sidecar, student_params, temp_dir};

#[test]
fn fee_payments_and_attendance_feed_academy_stats() {
    let workspace = temp_dir("academyd-fees-analytics");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_and_attach(&mut stdin, &mut reader, &workspace);

    let asha = create_student(
        &mut stdin,
        &mut reader,
        "2",
        student_params("Asha Rao", "Epic Badminton Stadium", "Morning", "2024-01-01"),
    );
    let bala = create_student(
        &mut stdin,
        &mut reader,
        "3",
        student_params("Bala Iyer", "Epic Badminton Stadium", "Evening", "2024-01-01"),
    );

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "fees.save",
        json!({ "records": [
            { "studentId": asha, "status": "Paid", "month": "06", "year": "2024" },
            { "studentId": asha, "status": "Paid", "month": "5", "year": "2024", "amount": 1200 },
            { "studentId": bala, "status": "Paid", "month": "05", "year": "2024" },
            { "studentId": bala, "status": "Pending", "month": "06", "year": "2024" }
        ]}),
    );
    assert_eq!(saved["written"], 4);

    let student = request_ok(&mut stdin, &mut reader, "5", "students.get", json!({ "id": asha }));
    let fees = student["student"]["feeHistory"].as_array().expect("fees");
    let june = fees.iter().find(|f| f["month"] == "06").expect("june fee");
    assert_eq!(june["status"], "Paid");
    assert_eq!(june["amount"], 1500.0);
    assert!(june["transactionId"].as_str().unwrap_or("").starts_with("TXN-"));
    assert!(june["paidDate"].as_str().unwrap_or("").starts_with("2024-06-17T"));
    let may = fees.iter().find(|f| f["month"] == "05").expect("may fee");
    assert_eq!(may["amount"], 1200.0);

    let days: Vec<String> = (1..=10).map(|d| format!("2024-05-{:02}", d)).collect();
    let records: Vec<serde_json::Value> = days
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let status = if i < 7 { "Present" } else { "Absent" };
            json!({ "studentId": asha, "status": status, "date": date })
        })
        .collect();
    let _ = request_ok(&mut stdin, &mut reader, "6", "attendance.save", json!({ "records": records }));

    let summary = request_ok(&mut stdin, &mut reader, "7", "analytics.summary", json!({}));
    let stats = &summary["stats"];
    assert_eq!(stats["totalStudents"], 2);
    assert_eq!(stats["totalAttendanceRecords"], 10);
    assert_eq!(stats["attendanceRate"], 70);
    assert_eq!(stats["currentMonth"], "2024-06");
    assert_eq!(stats["currentFeeCollection"], 50);
    assert_eq!(stats["lastMonth"], "2024-05");
    assert_eq!(stats["lastMonthFeeCollection"], 100);
    let counts = stats["sessionCounts"].as_array().expect("session counts");
    let morning = counts.iter().find(|c| c["session"] == "Morning").expect("morning");
    assert_eq!(morning["count"], 1);

    let batch = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "analytics.summary",
        json!({ "branch": "Epic Badminton Stadium", "session": "Evening" }),
    );
    assert_eq!(batch["stats"]["totalStudents"], 1);
    assert_eq!(batch["stats"]["currentFeeCollection"], 0);
    assert_eq!(batch["stats"]["attendanceRate"], 0);

    let dashboard = request_ok(&mut stdin, &mut reader, "9", "analytics.dashboard", json!({}));
    assert_eq!(dashboard["dashboard"]["totalStudents"], 2);
    assert_eq!(dashboard["dashboard"]["recentStudents"][0]["fullName"], "Bala Iyer");
}

#[test]
fn fee_rows_with_bad_months_are_rejected() {
    let workspace = temp_dir("academyd-fees-bad-month");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_and_attach(&mut stdin, &mut reader, &workspace);
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "fees.save",
        json!({ "records": [{ "studentId": "x", "status": "Paid", "month": "13", "year": "2024" }] }),
    );
    assert_eq!(code, "bad_params");
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "fees.save",
        json!({ "records": [{ "studentId": "x", "status": "Overdue", "month": "06", "year": "2024" }] }),
    );
    assert_eq!(code, "bad_params");
}
