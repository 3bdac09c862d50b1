//! Runtime settings from the environment (and `.env`, if present).

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::engine::{DEFAULT_MAX_COMPETITORS, DEFAULT_REQUEST_DELAY};
use crate::analysis::AnalysisConfig;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone)]
pub struct Settings {
    pub dataforseo_login: Option<String>,
    pub dataforseo_password: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub model: String,
    pub db_path: PathBuf,
    pub request_delay: Duration,
}

impl Settings {
    /// Load `.env` from the working directory, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_delay = match get("SEO_BRIEF_REQUEST_DELAY_MS") {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("SEO_BRIEF_REQUEST_DELAY_MS is not a number: {}", raw))?,
            ),
            None => DEFAULT_REQUEST_DELAY,
        };

        Ok(Self {
            dataforseo_login: get("DATAFORSEO_LOGIN"),
            dataforseo_password: get("DATAFORSEO_PASSWORD"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            model: get("SEO_BRIEF_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            db_path: get("SEO_BRIEF_DB")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            request_delay,
        })
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            request_delay: self.request_delay,
            max_competitors: DEFAULT_MAX_COMPETITORS,
        }
    }

    /// DataForSEO login and password, or an error naming what is missing
    pub fn dataforseo_credentials(&self) -> Result<(String, String)> {
        match (&self.dataforseo_login, &self.dataforseo_password) {
            (Some(login), Some(password)) => Ok((login.clone(), password.clone())),
            _ => anyhow::bail!("DATAFORSEO_LOGIN and DATAFORSEO_PASSWORD must be set"),
        }
    }

    pub fn anthropic_key(&self) -> Result<String> {
        self.anthropic_api_key
            .clone()
            .context("ANTHROPIC_API_KEY must be set")
    }
}

/// Session database under the platform data directory
pub fn default_db_path() -> PathBuf {
    use directories::ProjectDirs;

    if let Some(proj_dirs) = ProjectDirs::from("com", "seo-brief", "seo-brief") {
        proj_dirs.data_dir().join("sessions.db")
    } else {
        PathBuf::from(".seo-brief-sessions.db")
    }
}
