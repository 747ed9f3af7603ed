use std::{fs, path::Path, time::Duration};

use client_core::SortOrder;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "summaries.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    /// `None` disables the HTTP request timeout.
    pub request_timeout_secs: Option<u64>,
    pub default_sort: SortOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".into(),
            auth_token: None,
            request_timeout_secs: Some(30),
            default_sort: SortOrder::default(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    request_timeout_secs: Option<u64>,
    sort: Option<String>,
}

pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// File values override defaults; environment overrides the file.
pub(crate) fn load_settings_with<F>(path: &Path, env: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring malformed settings file")
            }
        }
    }

    if let Some(v) = env("SUMMARIES_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("SUMMARIES_TOKEN") {
        settings.auth_token = non_empty(v);
    }
    if let Some(v) = env("APP__AUTH_TOKEN") {
        settings.auth_token = non_empty(v);
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = timeout_from_secs(parsed);
        }
    }

    if let Some(v) = env("APP__SORT") {
        if let Ok(order) = v.parse() {
            settings.default_sort = order;
        }
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.auth_token {
        settings.auth_token = non_empty(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = timeout_from_secs(v);
    }
    if let Some(v) = file_cfg.sort {
        match v.parse() {
            Ok(order) => settings.default_sort = order,
            Err(error) => warn!(%error, "ignoring invalid sort in settings file"),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn timeout_from_secs(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
