use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::model::StaffProfile;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: Config,
    /// The staff member this session acts as; stamped onto attendance and fee writes.
    pub actor: Option<StaffProfile>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            workspace: None,
            db: None,
            config,
            actor: None,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.config
            .today
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Wall-clock instant, moved onto the pinned date when the clock is pinned.
    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.config.today {
            Some(day) => day.and_time(now.time()).and_utc(),
            None => now,
        }
    }

    pub fn now_rfc3339(&self) -> String {
        self.now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
