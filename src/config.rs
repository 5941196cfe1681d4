//! Client configuration.

use std::env;
use std::time::Duration;

use crate::error::Error;

const URL_VAR: &str = "AGRODRONE_URL";
const API_KEY_VAR: &str = "AGRODRONE_API_KEY";

/// Configuration for the platform client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend.
    pub url: String,

    /// Anonymous API key for the project.
    pub api_key: String,

    /// Poll interval for live query watchers.
    pub poll_interval: Duration,
}

impl Config {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Read the configuration from `AGRODRONE_URL` and `AGRODRONE_API_KEY`.
    pub fn from_env() -> Result<Self, Error> {
        let url = env::var(URL_VAR).map_err(|_| Error::config(format!("{} is not set", URL_VAR)))?;
        let api_key = env::var(API_KEY_VAR)
            .map_err(|_| Error::config(format!("{} is not set", API_KEY_VAR)))?;
        Ok(Self::new(&url, &api_key))
    }

    /// Override the watcher poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
