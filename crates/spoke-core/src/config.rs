use crate::error::{Result, SpokeError};
use std::path::PathBuf;

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

pub const DEFAULT_DATA_FILE: &str = "inspections.csv";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bot API access token. Required; resolution fails without it.
    pub token: String,
    /// CSV file backing the record store.
    pub data_file: PathBuf,
    /// Long-poll window in seconds.
    pub poll_timeout: u64,
}

impl Config {
    /// Resolve the config at startup. The token comes from the
    /// environment only; a missing token is fatal with an instructional
    /// message, before anything else starts.
    pub fn from_env(data_file: PathBuf, poll_timeout: u64) -> Result<Self> {
        Self::with_token(std::env::var(TOKEN_ENV).ok(), data_file, poll_timeout)
    }

    /// Token resolution separated from the environment read, so it can be
    /// exercised without mutating process-global state. An unset or empty
    /// token is rejected.
    pub fn with_token(
        token: Option<String>,
        data_file: PathBuf,
        poll_timeout: u64,
    ) -> Result<Self> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(SpokeError::MissingToken)?;
        Ok(Self {
            token,
            data_file,
            poll_timeout,
        })
    }
}
