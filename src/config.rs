use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    /// Opened at startup when set, as if `workspace.select` had been called.
    pub workspace: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub log_filter: String,
    /// Pins the daemon's clock. Reports and heatmaps use this date as "today".
    pub today: Option<NaiveDate>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let today = match non_empty_var("ACADEMYD_TODAY") {
            Some(raw) => {
                if !crate::dates::is_date_key(raw.trim()) {
                    bail!("ACADEMYD_TODAY must be YYYY-MM-DD, got {:?}", raw);
                }
                Some(
                    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                        .with_context(|| format!("ACADEMYD_TODAY is not a real date: {}", raw))?,
                )
            }
            None => None,
        };

        Ok(Self {
            workspace: non_empty_var("ACADEMYD_WORKSPACE").map(PathBuf::from),
            export_dir: non_empty_var("ACADEMYD_EXPORT_DIR").map(PathBuf::from),
            log_filter: non_empty_var("ACADEMYD_LOG").unwrap_or_else(|| "info".to_string()),
            today,
        })
    }
}
