use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001";
pub const SETTINGS_FILE: &str = "studio.toml";
/// Generation fans out to the model once per angle, so the default is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Validated http(s) url without a trailing slash.
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

pub fn load_settings() -> anyhow::Result<ClientSettings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    let mut raw_base_url = None;

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                raw_base_url = file_cfg.api_base_url;
                if let Some(secs) = file_cfg.request_timeout_secs {
                    settings.request_timeout = Duration::from_secs(secs);
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring malformed settings file"),
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        raw_base_url = Some(v);
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        raw_base_url = Some(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) => settings.request_timeout = Duration::from_secs(secs),
            Err(_) => warn!(value = %v, "ignoring non-numeric APP__REQUEST_TIMEOUT_SECS"),
        }
    }

    if let Some(raw) = raw_base_url {
        settings.api_base_url = parse_base_url(&raw)?;
    }
    if settings.request_timeout.is_zero() {
        bail!("request timeout must be at least one second");
    }

    Ok(settings)
}

pub fn parse_base_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(ClientSettings::default().api_base_url);
    }

    let url = Url::parse(raw).with_context(|| format!("invalid API base url '{raw}'"))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        bail!("API base url '{raw}' must be an http(s) url");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
