use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context};
use client_core::{PageOptions, StaleResponsePolicy};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "evaluation.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout_ms: Option<u64>,
    pub status_clear_delay_ms: u64,
    pub stale_response_policy: StaleResponsePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            request_timeout_ms: None,
            status_clear_delay_ms: 3000,
            stale_response_policy: StaleResponsePolicy::LastResolvedWins,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            stale_response_policy: self.stale_response_policy,
            status_clear_delay: Duration::from_millis(self.status_clear_delay_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    status_clear_delay_ms: Option<u64>,
    stale_response_policy: Option<StaleResponsePolicy>,
}

/// Defaults, then the config file, then environment overrides.
///
/// Without an explicit path a missing `evaluation.toml` is not an error.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file.base_url {
        settings.base_url = v;
    }
    if let Some(v) = file.request_timeout_ms {
        settings.request_timeout_ms = Some(v);
    }
    if let Some(v) = file.status_clear_delay_ms {
        settings.status_clear_delay_ms = v;
    }
    if let Some(v) = file.stale_response_policy {
        settings.stale_response_policy = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("EVALUATION_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = lookup("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout_ms = Some(parse_millis("APP__REQUEST_TIMEOUT_MS", &v)?);
    }
    if let Some(v) = lookup("APP__STATUS_CLEAR_DELAY_MS") {
        settings.status_clear_delay_ms = parse_millis("APP__STATUS_CLEAR_DELAY_MS", &v)?;
    }

    if let Some(v) = lookup("APP__STALE_RESPONSE_POLICY") {
        settings.stale_response_policy = parse_policy(&v)?;
    }

    Ok(())
}

fn parse_millis(key: &str, raw: &str) -> anyhow::Result<u64> {
    raw.trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of milliseconds, got '{raw}'"))
}

fn parse_policy(raw: &str) -> anyhow::Result<StaleResponsePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "last_resolved_wins" => Ok(StaleResponsePolicy::LastResolvedWins),
        "drop_stale" => Ok(StaleResponsePolicy::DropStale),
        other => Err(anyhow!(
            "unknown stale response policy '{other}' (expected last_resolved_wins or drop_stale)"
        )),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
