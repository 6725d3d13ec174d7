//! Settings read from the environment (and an optional `.env` file).

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::storage::sheets::ServiceAccountKey;

const DEFAULT_QUIZ_INTERVAL_SECS: u64 = 15;
const DEFAULT_SNAPSHOT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Settings {
    pub bot_token: String,
    pub sheet_id: String,
    pub sheet_url: Url,
    pub credentials: ServiceAccountKey,
    pub quiz_interval: Duration,
    pub snapshot_limit: usize,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bot_token", &"***")
            .field("sheet_id", &self.sheet_id)
            .field("sheet_url", &self.sheet_url.as_str())
            .field("credentials", &self.credentials)
            .field("quiz_interval", &self.quiz_interval)
            .field("snapshot_limit", &self.snapshot_limit)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let bot_token = required("BOT_TOKEN")?;
        let sheet_id = required("SHEET_ID")?;
        let sheet_url = Url::parse(&required("SHEET_URL")?).map_err(|e| ConfigError::Invalid {
            var: "SHEET_URL",
            reason: e.to_string(),
        })?;
        let credentials =
            ServiceAccountKey::from_json(&required("GOOGLE_CREDENTIALS")?).map_err(|e| {
                ConfigError::Invalid {
                    var: "GOOGLE_CREDENTIALS",
                    reason: e.to_string(),
                }
            })?;

        let interval_secs = positive(&lookup, "QUIZ_INTERVAL_SECS", DEFAULT_QUIZ_INTERVAL_SECS)?;
        let snapshot_limit = positive(&lookup, "QUIZ_SNAPSHOT_LIMIT", DEFAULT_SNAPSHOT_LIMIT as u64)?;

        Ok(Self {
            bot_token,
            sheet_id,
            sheet_url,
            credentials,
            quiz_interval: Duration::from_secs(interval_secs),
            snapshot_limit: snapshot_limit as usize,
        })
    }
}

fn positive<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}
