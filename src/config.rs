//! read session configuration from a file or the environment

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::Error;
use crate::token::AutoRefreshPolicy;

pub const AUTO_REFRESH_LEAD_ENV: &str = "TOKEN_SESSION_AUTO_REFRESH_LEAD_SECS";

pub enum ConfigLocation {
    File(PathBuf),
    Env,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds before token expiry at which a proactive refresh runs. 0 disables it.
    pub auto_refresh_lead_secs: f64,
}

impl SessionConfig {
    pub fn load(loc: ConfigLocation) -> Result<Self, Error> {
        let config = match loc {
            ConfigLocation::File(path) => Self::from_file(path)?,
            ConfigLocation::Env => Self::from_env()?,
        };
        config.auto_refresh_policy()?;
        Ok(config)
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path.into())?;
        let config: SessionConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// A missing variable means auto-refresh stays disabled.
    pub fn from_env() -> Result<Self, Error> {
        let auto_refresh_lead_secs = match std::env::var(AUTO_REFRESH_LEAD_ENV) {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|e| {
                Error::Config(format!("Invalid {AUTO_REFRESH_LEAD_ENV} '{raw}': {e}"))
            })?,
            Err(std::env::VarError::NotPresent) => 0.0,
            Err(e) => {
                return Err(Error::Config(format!(
                    "Unreadable {AUTO_REFRESH_LEAD_ENV} env var: {e}"
                )));
            }
        };
        Ok(Self {
            auto_refresh_lead_secs,
        })
    }

    pub fn auto_refresh_policy(&self) -> Result<AutoRefreshPolicy, Error> {
        AutoRefreshPolicy::from_secs_f64(self.auto_refresh_lead_secs)
    }
}
