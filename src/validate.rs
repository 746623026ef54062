use std::collections::BTreeMap;

use crate::dates;
use crate::model::StudentDraft;

/// Field name (as the form knows it) to message.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn validate_student(d: &StudentDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name = d.full_name.trim();
    if name.is_empty() {
        errors.insert("fullName", "Full Name is required");
    } else if name.chars().count() < 3 {
        errors.insert("fullName", "Name must be at least 3 characters");
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        errors.insert("fullName", "Name should only contain letters");
    }

    let phone = d.phone_number.trim();
    if phone.is_empty() {
        errors.insert("phoneNumber", "Phone Number is required");
    } else if phone.chars().count() != 10 {
        errors.insert("phoneNumber", "Phone number must be exactly 10 digits");
    } else if !phone.chars().all(|c| c.is_ascii_digit()) {
        errors.insert("phoneNumber", "Enter a valid 10-digit number");
    }

    if !d.session_fee.is_finite() || d.session_fee <= 0.0 {
        errors.insert("sessionFee", "Enter a valid positive amount");
    }

    let address = d.address.trim();
    if address.is_empty() {
        errors.insert("address", "Address is required");
    } else if address.chars().count() < 5 {
        errors.insert("address", "Please enter a complete address");
    }

    if blank(&d.session_timings) {
        errors.insert("sessionTimings", "Session timings are required");
    }

    if blank(&d.joining_date) {
        errors.insert("joiningDate", "Joining Date is required");
    } else if !dates::is_date_key(&d.joining_date) {
        errors.insert("joiningDate", "Use YYYY-MM-DD format");
    }

    if blank(&d.aadhaar_front_url) {
        errors.insert("aadhaarFront", "Front image required");
    }
    if blank(&d.aadhaar_back_url) {
        errors.insert("aadhaarBack", "Back image required");
    }
    if blank(&d.branch) {
        errors.insert("branch", "Branch is required");
    }
    if blank(&d.session) {
        errors.insert("session", "Session is required");
    }

    errors
}
