use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: String,
    pub status: AttendanceStatus,
    pub marked_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_by_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    Paid,
    Pending,
}

impl FeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FeeStatus::Paid => "Paid",
            FeeStatus::Pending => "Pending",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Paid" => Some(FeeStatus::Paid),
            "Pending" => Some(FeeStatus::Pending),
            _ => None,
        }
    }
}

/// A paid month always carries its payment stamp; a pending one never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum FeeSettlement {
    Paid {
        #[serde(rename = "paidDate")]
        paid_date: String,
        #[serde(rename = "transactionId")]
        transaction_id: String,
    },
    Pending,
}

impl FeeSettlement {
    pub fn status(&self) -> FeeStatus {
        match self {
            FeeSettlement::Paid { .. } => FeeStatus::Paid,
            FeeSettlement::Pending => FeeStatus::Pending,
        }
    }

    pub fn paid_date(&self) -> Option<&str> {
        match self {
            FeeSettlement::Paid { paid_date, .. } => Some(paid_date),
            FeeSettlement::Pending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub month: String,
    pub year: String,
    pub amount: f64,
    #[serde(flatten)]
    pub settlement: FeeSettlement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_by_name: Option<String>,
}

impl FeeRecord {
    pub fn is_paid_for(&self, month: &str, year: &str) -> bool {
        self.month == month && self.year == year && self.settlement.status() == FeeStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub aadhaar_front_url: String,
    pub aadhaar_back_url: String,
    pub branch: String,
    pub session: String,
    pub session_timings: String,
    pub session_fee: f64,
    pub attendance_history: Vec<AttendanceRecord>,
    pub fee_history: Vec<FeeRecord>,
    pub created_at: String,
    pub joining_date: String,
}

impl Student {
    pub fn fee_for(&self, month: &str, year: &str) -> Option<&FeeRecord> {
        self.fee_history
            .iter()
            .find(|f| f.month == month && f.year == year)
    }
}

/// Everything a coach fills in on the student form. All fields are required;
/// a draft missing any of them never reaches the store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentDraft {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub aadhaar_front_url: String,
    pub aadhaar_back_url: String,
    pub branch: String,
    pub session: String,
    pub session_timings: String,
    pub session_fee: f64,
    pub joining_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub contact_number: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDraft {
    pub name: String,
    pub address: String,
    pub contact_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub branch_id: String,
    pub name: String,
    pub timings: String,
    pub fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    pub branch_id: String,
    pub name: String,
    pub timings: String,
    pub fee: f64,
    #[serde(default)]
    pub start_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    SuperAdmin,
    Coach,
    AssistantCoach,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "SuperAdmin",
            UserRole::Coach => "Coach",
            UserRole::AssistantCoach => "AssistantCoach",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "SuperAdmin" => Some(UserRole::SuperAdmin),
            "Coach" => Some(UserRole::Coach),
            "AssistantCoach" => Some(UserRole::AssistantCoach),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub uid: String,
    pub email: String,
    pub role: UserRole,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academy_name: Option<String>,
    #[serde(default)]
    pub branch_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
}

impl StaffProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDraft {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub academy_name: Option<String>,
    #[serde(default)]
    pub branch_ids: Vec<String>,
}

/// One line of an attendance save, already stamped with the marking coach.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceUpdate {
    pub student_id: String,
    pub status: AttendanceStatus,
    pub date: String,
    pub marked_by: String,
    pub marked_by_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeUpdate {
    pub student_id: String,
    pub status: FeeStatus,
    pub month: String,
    pub year: String,
    pub amount: Option<f64>,
    pub marked_by: Option<String>,
    pub marked_by_name: Option<String>,
}

/// Which students a query covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StudentScope {
    #[default]
    All,
    Branch(String),
    Batch {
        branch: String,
        session: String,
    },
    /// The "Together" view: one session name across several branches.
    Branches {
        branches: Vec<String>,
        session: String,
    },
}

impl StudentScope {
    pub fn label(&self) -> String {
        match self {
            StudentScope::All => "All Branches".to_string(),
            StudentScope::Branch(b) => b.clone(),
            StudentScope::Batch { branch, session } => format!("{} - {}", branch, session),
            StudentScope::Branches { session, .. } => format!("Together - {}", session),
        }
    }
}
