use serde_json::json;
use tracing::error;

use crate::report::ReportError;
use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// User-facing text for codes whose underlying cause must not reach the host.
pub fn friendly_message(code: &str) -> &'static str {
    match code {
        "db_query_failed" => "Something went wrong while loading or saving data. Please try again.",
        "corrupt_record" => "Some stored records could not be read.",
        "export_failed" => "The report could not be generated. Please try again.",
        "no_data" => "No student data found to export.",
        "no_workspace" => "Select a workspace first.",
        "not_signed_in" => "Sign in before making changes.",
        "permission_denied" => "You don't have permission to do this.",
        _ => "Something went wrong.",
    }
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn friendly(code: &'static str) -> Self {
        Self::new(code, friendly_message(code))
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => HandlerErr::new("not_found", format!("{} not found", what)),
            other => {
                error!(code = other.code(), "storage failure: {other}");
                HandlerErr::friendly(other.code())
            }
        }
    }
}

impl From<ReportError> for HandlerErr {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::InvalidDateKey(_) | ReportError::UnknownMode(_) => {
                HandlerErr::bad_params(e.to_string())
            }
            ReportError::NoStudents => HandlerErr::friendly("no_data"),
            other => {
                error!(code = other.code(), "report export failed: {other}");
                HandlerErr::friendly(other.code())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_hide_backend_detail() {
        let e: HandlerErr = StoreError::Db(rusqlite::Error::InvalidQuery).into();
        assert_eq!(e.code, "db_query_failed");
        assert!(!e.message.contains("query"));
        let resp = e.response("7");
        assert_eq!(resp["ok"], false);
        assert_eq!(resp["id"], "7");
        assert_eq!(resp["error"]["code"], "db_query_failed");
    }

    #[test]
    fn friendly_messages_are_sentences() {
        for code in [
            "db_query_failed",
            "corrupt_record",
            "export_failed",
            "no_data",
            "no_workspace",
            "not_signed_in",
            "permission_denied",
            "anything_else",
        ] {
            let msg = friendly_message(code);
            assert!(msg.starts_with(char::is_uppercase), "{}: {}", code, msg);
            assert!(msg.ends_with('.'), "{}: {}", code, msg);
        }
    }

    #[test]
    fn not_found_names_the_record() {
        let e: HandlerErr = StoreError::NotFound("student").into();
        assert_eq!(e.code, "not_found");
        assert_eq!(e.message, "student not found");
    }
}
