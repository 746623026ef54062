mod test_support;

use serde_json::json;
use test_support::{create_student, request_err, request_ok, spawn_sidecar, student_params, temp_dir};

#[test]
fn students_create_update_search_and_delete() {
    let workspace = temp_dir("academyd-students-crud");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let asha = create_student(
        &mut stdin,
        &mut reader,
        "2",
        student_params("Asha Rao", "Epic Badminton Stadium", "Morning", "2024-06-01"),
    );
    let _bala = create_student(
        &mut stdin,
        &mut reader,
        "3",
        student_params("Bala Iyer", "Epic Badminton Stadium", "Evening", "2024-05-01"),
    );
    let _chitra = create_student(
        &mut stdin,
        &mut reader,
        "4",
        student_params("Chitra Das", "Village Sports Stadium", "Morning", "2024-04-01"),
    );

    let all = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(all["scope"], "All Branches");
    let names: Vec<&str> = all["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["fullName"].as_str())
        .collect();
    assert_eq!(names, vec!["Asha Rao", "Bala Iyer", "Chitra Das"]);

    let batch = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.list",
        json!({ "branch": "Epic Badminton Stadium", "session": "Morning" }),
    );
    assert_eq!(batch["students"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(batch["scope"], "Epic Badminton Stadium - Morning");

    let together = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "branches": ["Epic Badminton Stadium", "Village Sports Stadium"], "session": "Morning" }),
    );
    assert_eq!(together["students"].as_array().map(|a| a.len()), Some(2));

    let mut updated = student_params("Asha R Rao", "Epic Badminton Stadium", "Evening", "2024-06-01");
    updated["sessionFee"] = json!(1800);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.update",
        json!({ "id": asha, "student": updated }),
    );
    let got = request_ok(&mut stdin, &mut reader, "9", "students.get", json!({ "id": asha }));
    assert_eq!(got["student"]["fullName"], "Asha R Rao");
    assert_eq!(got["student"]["session"], "Evening");
    assert_eq!(got["student"]["sessionFee"], 1800.0);
    assert_eq!(got["student"]["attendanceHistory"], json!([]));

    let found = request_ok(&mut stdin, &mut reader, "10", "students.search", json!({ "query": "CHITRA" }));
    assert_eq!(found["students"].as_array().map(|a| a.len()), Some(1));
    let by_phone = request_ok(&mut stdin, &mut reader, "11", "students.search", json!({ "query": "98765" }));
    assert_eq!(by_phone["students"].as_array().map(|a| a.len()), Some(3));

    let _ = request_ok(&mut stdin, &mut reader, "12", "students.delete", json!({ "id": asha }));
    let (code, _) = request_err(&mut stdin, &mut reader, "13", "students.get", json!({ "id": asha }));
    assert_eq!(code, "not_found");
    let (code, _) = request_err(&mut stdin, &mut reader, "14", "students.delete", json!({ "id": asha }));
    assert_eq!(code, "not_found");
}

#[test]
fn invalid_student_forms_report_every_field_and_write_nothing() {
    let workspace = temp_dir("academyd-students-validation");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let mut bad = student_params("A1", "Epic Badminton Stadium", "Morning", "17/06/2024");
    bad["phoneNumber"] = json!("12345");
    bad["sessionFee"] = json!(-10);
    bad["aadhaarBackUrl"] = json!("");
    let (code, error) = request_err(&mut stdin, &mut reader, "2", "students.create", json!({ "student": bad }));
    assert_eq!(code, "validation_failed");
    let fields = &error["details"]["fields"];
    assert_eq!(fields["fullName"], "Name must be at least 3 characters");
    assert_eq!(fields["phoneNumber"], "Phone number must be exactly 10 digits");
    assert_eq!(fields["sessionFee"], "Enter a valid positive amount");
    assert_eq!(fields["joiningDate"], "Use YYYY-MM-DD format");
    assert_eq!(fields["aadhaarBack"], "Back image required");
    assert!(fields.get("address").is_none());

    // Partially filled records never reach the store.
    let (code, _) = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({ "student": { "fullName": "Asha Rao" } }),
    );
    assert_eq!(code, "bad_params");

    let all = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    assert_eq!(all["students"], json!([]));
}
