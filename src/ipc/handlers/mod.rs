pub mod academy;
pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod core;
pub mod fees;
pub mod reports;
pub mod students;
