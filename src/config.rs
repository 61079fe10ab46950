use std::time::Duration;

use crate::frame::FrameManifest;
use crate::quiz::{DEFAULT_ADVANCE_DELAY, PROJECT_DESCRIPTION, PROJECT_TITLE};

const DEFAULT_DB_PATH: &str = "db.sqlite";
const DEFAULT_HOME_URL: &str = "https://photo-quiz-frame.example.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number of milliseconds, got {value:?}")]
    InvalidDelay { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub db_path: String,
    pub advance_delay: Duration,
    pub manifest: FrameManifest,
}

impl FrameConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let advance_delay = match lookup("FRAME_ADVANCE_DELAY_MS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDelay {
                    name: "FRAME_ADVANCE_DELAY_MS",
                    value,
                })?,
            None => DEFAULT_ADVANCE_DELAY,
        };

        Ok(Self {
            db_path: lookup("FRAME_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            advance_delay,
            manifest: FrameManifest {
                name: lookup("FRAME_NAME").unwrap_or_else(|| PROJECT_TITLE.to_string()),
                description: PROJECT_DESCRIPTION.to_string(),
                home_url: lookup("FRAME_HOME_URL").unwrap_or_else(|| DEFAULT_HOME_URL.to_string()),
                icon_url: lookup("FRAME_ICON_URL"),
            },
        })
    }
}
