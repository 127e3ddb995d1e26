use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use analysis_client::{
    config::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT},
    ClientConfig,
};
use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "insights.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub default_group: String,
    pub default_category: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            default_group: "People with disabilities".into(),
            default_category: "Accessibility".into(),
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        ClientConfig::parse(
            &self.api_base_url,
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    default_group: Option<String>,
    default_category: Option<String>,
}

pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then environment variables. An explicit
/// `config_path` must exist; the implicit `insights.toml` may be absent.
pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            if let Some(v) = file_cfg.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = v;
            }
            if let Some(v) = file_cfg.default_group {
                settings.default_group = v;
            }
            if let Some(v) = file_cfg.default_category {
                settings.default_category = v;
            }
        }
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    if let Some(v) = env("INSIGHTS_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__DEFAULT_GROUP") {
        settings.default_group = v;
    }
    if let Some(v) = env("APP__DEFAULT_CATEGORY") {
        settings.default_category = v;
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
