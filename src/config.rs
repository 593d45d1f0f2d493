// ⚙️ Configuration - environment driven, `.env` loaded by the binary first

use crate::ledger::DEFAULT_LEDGER_FILE;
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub const LEDGER_PATH_VAR: &str = "CARDSYNTH_LEDGER_PATH";
pub const LOG_FILTER_VAR: &str = "CARDSYNTH_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ledger_path: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Read settings from the process environment; unset variables use defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading through `lookup` instead of the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let ledger_path = match lookup(LEDGER_PATH_VAR) {
            Some(value) => PathBuf::from(non_empty(LEDGER_PATH_VAR, value)?),
            None => defaults.ledger_path,
        };

        let log_filter = match lookup(LOG_FILTER_VAR) {
            Some(value) => non_empty(LOG_FILTER_VAR, value)?,
            None => defaults.log_filter,
        };

        Ok(Config {
            ledger_path,
            log_filter,
        })
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{key} is set but empty"));
    }
    Ok(trimmed.to_string())
}
